use std::io;
use thiserror::Error;

/// Failures surfaced by the sampling backends.
///
/// A process that exits between enumeration and detail-read is not an error;
/// collectors express that as `Option` and skip the pid.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("external tool error: {0}")]
    ExternalTool(String),
}

pub type Result<T> = std::result::Result<T, CollectError>;

impl CollectError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        CollectError::Parse(msg.into())
    }

    pub fn external_tool<S: Into<String>>(msg: S) -> Self {
        CollectError::ExternalTool(msg.into())
    }
}
