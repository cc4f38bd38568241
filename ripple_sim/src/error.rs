use std::path::PathBuf;

use thiserror::Error;

/// Error conditions raised while configuring the simulation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("viewport must be at least 1x1 (got {width}x{height})")]
    EmptyViewport { width: u32, height: u32 },
    #[error("invalid tuning: {field} {reason}")]
    InvalidTuning {
        field: &'static str,
        reason: String,
    },
    #[error("reading tuning file {path}: {source}")]
    TuningIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing tuning file {path}: {source}")]
    TuningParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn tuning(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidTuning {
            field,
            reason: reason.into(),
        }
    }
}
