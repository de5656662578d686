use std::path::PathBuf;

#[derive(Debug)]
pub enum FormatError {
    Json(String),
    /// `row` is 1-based, counting the header.
    MissingColumns {
        row: usize,
        found: usize,
    },
    InvalidCoordinate {
        row: usize,
        value: String,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Json(e) => write!(f, "invalid json: {e}"),
            FormatError::MissingColumns { row, found } => {
                write!(f, "row {row}: expected at least 3 columns, found {found}")
            }
            FormatError::InvalidCoordinate { row, value } => {
                write!(f, "row {row}: invalid coordinate {value:?}")
            }
            FormatError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        FormatError::Json(e.to_string())
    }
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, FormatError> {
    std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}
