use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vrm_core::{FormatError, LoadError, ValidationError};

/// Errors raised while reading an avatar file.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ReadError {
    /// The validation failure behind this error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ReadError::Load(LoadError::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<FormatError> for ReadError {
    fn from(err: FormatError) -> Self {
        ReadError::Load(err.into())
    }
}

impl From<ValidationError> for ReadError {
    fn from(err: ValidationError) -> Self {
        ReadError::Load(err.into())
    }
}

pub type Result<T> = std::result::Result<T, ReadError>;
