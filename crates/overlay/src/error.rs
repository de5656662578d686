#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
    InvalidImage { width: u32, height: u32 },
    ImageNotLoaded,
    InvalidCenter { lat: f64, lng: f64 },
    InvalidResolution { lat: f64, zoom: u32 },
    DegenerateResize,
    InvalidScale(f64),
    InvalidOpacity(f64),
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayError::InvalidImage { width, height } => {
                write!(f, "invalid image dimensions {width}x{height}")
            }
            OverlayError::ImageNotLoaded => write!(f, "no image is loaded"),
            OverlayError::InvalidCenter { lat, lng } => {
                write!(f, "invalid center coordinate ({lat}, {lng})")
            }
            OverlayError::InvalidResolution { lat, zoom } => {
                write!(f, "no ground resolution at latitude {lat}, zoom {zoom}")
            }
            OverlayError::DegenerateResize => write!(f, "resize produced degenerate bounds"),
            OverlayError::InvalidScale(v) => write!(f, "invalid scale: {v}"),
            OverlayError::InvalidOpacity(v) => write!(f, "invalid opacity: {v}"),
        }
    }
}

impl std::error::Error for OverlayError {}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerError {
    InsufficientMatches { found: usize },
    OptimizationFailed { reason: String },
    InvalidImage { width: u32, height: u32 },
    ImageNotLoaded,
    Cancelled,
}

impl OptimizerError {
    pub(crate) fn failed(reason: impl Into<String>) -> Self {
        OptimizerError::OptimizationFailed {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerError::InsufficientMatches { found } => {
                write!(f, "at least 2 matched points are required (found {found})")
            }
            OptimizerError::OptimizationFailed { reason } => {
                write!(f, "optimization failed: {reason}")
            }
            OptimizerError::InvalidImage { width, height } => {
                write!(f, "invalid image dimensions {width}x{height}")
            }
            OptimizerError::ImageNotLoaded => write!(f, "no image is loaded"),
            OptimizerError::Cancelled => write!(f, "optimization cancelled"),
        }
    }
}

impl std::error::Error for OptimizerError {}

impl From<OverlayError> for OptimizerError {
    fn from(e: OverlayError) -> Self {
        match e {
            OverlayError::InvalidImage { width, height } => {
                OptimizerError::InvalidImage { width, height }
            }
            OverlayError::ImageNotLoaded => OptimizerError::ImageNotLoaded,
            other => OptimizerError::failed(other.to_string()),
        }
    }
}
