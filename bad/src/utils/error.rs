//! # Error Handling
//!
//! A single error type for the library and the `badc` driver. Compile-time
//! problems found in B sources are *not* errors of this kind; they are
//! collected as [`Diagnostic`](crate::core::diagnostic::Diagnostic)s and only
//! surface here as [`Error::Compilation`] once a command decides to fail.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::diagnostic::ErrorCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{msg}")]
    Generic {
        msg: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An input file could not be found or read.
    #[error("{code}: {}", path.display())]
    File {
        code: ErrorCode,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more sources had errors.
    #[error("could not compile {path}: {errors} error(s) emitted")]
    Compilation { path: String, errors: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),

    #[error("configuration lock poisoned: {0}")]
    Poisoned(String),
}

impl Error {
    pub fn new(msg: &str) -> Self {
        Error::Generic {
            msg: msg.to_string(),
            source: None,
        }
    }

    pub fn with_source(msg: &str, source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::Generic {
            msg: msg.to_string(),
            source: Some(source),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::Poisoned(err.to_string())
    }
}
