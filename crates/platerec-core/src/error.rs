use std::path::PathBuf;

use thiserror::Error;

use crate::rotation::PlateId;
use crate::version::Version;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {}:{line}: {msg}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("engine version {found} is older than required {required}")]
    VersionTooOld { found: Version, required: Version },

    #[error("rotation hierarchy cycle through plate {plate} at {time} Ma")]
    RotationCycle { plate: PlateId, time: f64 },

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io { path: path.into(), source }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        EngineError::Parse {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }
}
