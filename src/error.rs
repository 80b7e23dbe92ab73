//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = LexsegError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration or persistence.
///
/// Lookups of strings that were never observed are not errors; they score as zero.
#[derive(Debug, Error)]
pub enum LexsegError {
    /// A configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// A persisted model or encoder file could not be parsed.
    #[error("malformed file {path:?} at line {line}: {message}")]
    Malformed {
        /// File being loaded.
        path: PathBuf,
        /// 1-based number of the offending line.
        line: usize,
        /// Description of what was expected.
        message: String,
    },
    /// Catch-all variant for invariants that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LexsegError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Helper constructor for parse failures at a given 1-based line.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
