use std::path::PathBuf;

use thiserror::Error;

use crate::Real;

#[derive(Debug, Error)]
pub enum MocapError {
    #[error("rigid body '{name}' not found in capture (available: {})", available.join(", "))]
    MissingBody { name: String, available: Vec<String> },

    #[error("missing calibration parameter '{0}'")]
    MissingParameter(String),

    #[error("malformed file {}: {reason}", path.display())]
    MalformedFile { path: PathBuf, reason: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("quaternion cannot be normalized (norm {norm})")]
    DegenerateQuaternion { norm: Real },

    #[error("rigid body '{0}' has no tracked samples")]
    EmptyTrack(String),

    #[error("subsampling rate must be at least 1, got {0}")]
    InvalidRate(usize),

    #[error("timestamps must be strictly increasing ({previous} followed by {next})")]
    NonMonotonicTime { previous: Real, next: Real },
}

impl MocapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MocapError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MocapError::MalformedFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MocapError>;
