use std::path::PathBuf;

/// Invalid setting found while building a [`Config`](crate::Config)
///
/// Every variant carries the dotted path of the offending field, e.g. `dm1.gain`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
    #[error("`{field}` must be {constraint}, found {value}")]
    Range {
        field: String,
        constraint: String,
        value: String,
    },
    #[error("`{field}` has shape {found:?}, expected {expected:?}")]
    Shape {
        field: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("`{field}` ({value}) does not match `{other}` ({other_value}): {reason}")]
    Mismatch {
        field: String,
        value: String,
        other: String,
        other_value: String,
        reason: String,
    },
    #[error("unknown field `{0}`")]
    Unknown(String),
}
impl ValidationError {
    /// Dotted path of the field that failed validation
    pub fn field(&self) -> &str {
        match self {
            Self::Invalid { field, .. }
            | Self::Range { field, .. }
            | Self::Shape { field, .. }
            | Self::Mismatch { field, .. } => field,
            Self::Unknown(field) => field,
        }
    }
}

/// Failure to read a calibration file
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("calibration file {0} does not exist")]
    Missing(PathBuf),
    #[error("cannot access calibration file {1}")]
    Access(#[source] std::io::Error, PathBuf),
    #[error("cannot read calibration file {1}")]
    Fits(#[source] fitsio::errors::Error, PathBuf),
    #[error("calibration file {0} primary HDU is not a 2D image")]
    NotAnImage(PathBuf),
    #[error("calibration file {path} has shape {found:?}, expected {expected:?}")]
    Shape {
        path: PathBuf,
        expected: (usize, usize),
        found: Vec<usize>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot build `::coronagraph_config::Config`")]
    Validation(#[from] ValidationError),
    #[error("cannot load `::coronagraph_config::Config` calibration data")]
    Resource(#[from] ResourceError),
}
impl ConfigError {
    /// Returns the validation error if that is what failed
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}
