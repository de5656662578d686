use serde::{Deserialize, Serialize};

/// Identifier shared by an annotated image point and its GPS reference.
///
/// Matching is by exact string equality; no case folding or trimming is
/// applied after construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    pub fn new(id: impl Into<String>) -> Self {
        PointId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        PointId(s.to_string())
    }
}

impl From<String> for PointId {
    fn from(s: String) -> Self {
        PointId(s)
    }
}
