//! Error handling and custom error types
//!
//! Provides unified error handling across the publisher using thiserror.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File error for {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store error: {0}")]
    RemoteStore(String),

    #[error("Invalidation error: {0}")]
    Invalidation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Whether this error ends a legacy-order publish.
    ///
    /// Object store failures are reported but let the invalidation proceed;
    /// everything else halts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RemoteStore(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_store_errors_are_not_fatal() {
        assert!(!Error::RemoteStore("AccessDenied".to_string()).is_fatal());
        assert!(Error::Invalidation("NoSuchDistribution".to_string()).is_fatal());
        assert!(Error::file_read(
            "missing.png",
            std::io::Error::from(std::io::ErrorKind::NotFound)
        )
        .is_fatal());
    }

    #[test]
    fn test_file_read_message_names_path() {
        let err = Error::file_read(
            "assets/logo.png",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().contains("assets/logo.png"));
    }
}
