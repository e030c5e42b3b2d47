//! Crate-wide error types
//!
//! Only the server shell has a fallible surface (binding the listener,
//! creating the pipe). Ingestion and delivery failures are recovered
//! locally and never reach this type.

use std::path::PathBuf;

/// Error type for server operations
#[derive(Debug)]
pub enum Error {
    /// I/O failure while starting or running the listener
    Io(std::io::Error),
    /// Could not create the pipe rendezvous point
    PipeCreate {
        /// Path that was being created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::PipeCreate { path, source } => {
                write!(f, "Failed to create pipe at {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::PipeCreate { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
