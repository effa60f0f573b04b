//! Error types for indexer operations.
//!
//! All fallible public operations return [`Result<T>`] with context-rich
//! error messages. Per the error taxonomy, most failure modes (unparseable
//! sources, unresolved references, missing class definitions) are *not*
//! represented here — they are non-fatal outcomes recorded on nodes instead
//! of propagated as errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for indexer operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while building or mutating the search-path engine.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A search-path entry was not a valid directory path.
    #[error("invalid search-path argument: {message}")]
    InvalidArgument {
        /// Description of what was wrong with the argument.
        message: String,
    },

    /// I/O error while walking a directory or reading a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed when the error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The external built-in reference file could not be read or parsed.
    #[error("failed to load built-in reference file {path}: {message}")]
    BuiltinReference {
        /// Path to the reference file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

impl IndexError {
    /// Create an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        IndexError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an `Io` error from a path and `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `BuiltinReference` error.
    pub fn builtin_reference(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IndexError::BuiltinReference {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the attribute decoder (`crate::attributes`).
///
/// An unknown key is *not* an error (it is accepted and stored as a boolean
/// `true`); only a recognized key whose declared shape the decoder cannot
/// handle raises.
#[derive(Error, Debug)]
pub enum AttributeError {
    /// A recognized attribute key declared a value shape the decoder does
    /// not implement (e.g. `list[str]`): a grammar-drift indicator worth
    /// loud failure rather than a silent skip.
    #[error("attribute '{key}' has unsupported value shape: {value}")]
    UnsupportedShape {
        /// The attribute key.
        key: String,
        /// The raw textual value that could not be decoded.
        value: String,
    },
}
