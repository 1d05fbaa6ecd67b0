//! Error types for dropfs.
//!
//! [`FsError`] is the taxonomy every sandbox and shell operation reports.
//! None of its variants are fatal: callers turn them into an
//! [`OperationFailure`] or a shell error line and keep going.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for dropfs.
#[derive(Error, Debug)]
pub enum Error {
    /// Sandbox or shell operation failed
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Failure of a single filesystem or command operation.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("path escapes root: {0}")]
    PathEscape(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("too large: {size} bytes, limit {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("not valid UTF-8: {0}")]
    Encoding(String),

    #[error("unsupported command: {0}")]
    UnknownCommand(String),

    #[error("{verb} expects {expected}, got {got}")]
    BadArgCount {
        verb: String,
        expected: String,
        got: usize,
    },

    #[error("no command provided")]
    EmptyCommand,

    #[error("io failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error, keeping kinds the taxonomy names as their own variant.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            std::io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            std::io::ErrorKind::IsADirectory => Self::IsADirectory(path),
            _ => Self::Io { path, source },
        }
    }

    /// Discriminant of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathEscape(_) => ErrorKind::PathEscape,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::IsADirectory(_) => ErrorKind::IsADirectory,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::Encoding(_) => ErrorKind::EncodingError,
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Self::BadArgCount { .. } => ErrorKind::BadArgCount,
            Self::EmptyCommand => ErrorKind::EmptyCommand,
            Self::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Serializable discriminant of [`FsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PathEscape,
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    TooLarge,
    EncodingError,
    UnknownCommand,
    BadArgCount,
    EmptyCommand,
    IoFailure,
}

impl ErrorKind {
    /// Stable `snake_case` name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PathEscape => "path_escape",
            Self::NotFound => "not_found",
            Self::NotADirectory => "not_a_directory",
            Self::IsADirectory => "is_a_directory",
            Self::AlreadyExists => "already_exists",
            Self::TooLarge => "too_large",
            Self::EncodingError => "encoding_error",
            Self::UnknownCommand => "unknown_command",
            Self::BadArgCount => "bad_arg_count",
            Self::EmptyCommand => "empty_command",
            Self::IoFailure => "io_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure arm of an operation result, as handed to the outer layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FsError> for OperationFailure {
    fn from(err: &FsError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<FsError> for OperationFailure {
    fn from(err: FsError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result type alias for dropfs operations.
pub type Result<T> = std::result::Result<T, Error>;
