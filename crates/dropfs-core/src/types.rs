//! Core types for dropfs.
//!
//! ## Filesystem values
//! - [`FileEntry`]: one child of a listed directory
//! - [`TextPayload`]: UTF-8 content bounded by [`Limits`]
//! - [`WriteSummary`], [`RemoveSummary`], [`RenameSummary`], [`TouchSummary`],
//!   [`UploadSummary`]: success arms of the mutating operations
//!
//! ## Commands
//! - [`Verb`]: the whitelisted command table
//! - [`CommandInvocation`]: a parsed command line
//! - [`CommandOutput`]: what one command produced
//!
//! Every value here is built fresh per call and never cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{ErrorKind, FsError};

/// Default text limit: 512 KiB.
pub const DEFAULT_MAX_TEXT_BYTES: u64 = 524_288;

// ============================================================================
// Limits
// ============================================================================

/// Size limits shared by reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Largest text file that may be read or written, in bytes
    pub max_text_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }
}

impl Limits {
    /// Fail with `TooLarge` when `size` exceeds the text limit.
    pub fn check_text_size(&self, size: u64) -> Result<(), FsError> {
        if size > self.max_text_bytes {
            return Err(FsError::TooLarge {
                size,
                limit: self.max_text_bytes,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Filesystem values
// ============================================================================

/// A child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the root, `/`-separated
    pub path: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// File size; `None` for directories
    pub size_bytes: Option<u64>,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

impl FileEntry {
    /// Final component of [`FileEntry::path`].
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Text content of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    /// UTF-8 file contents
    #[serde(default)]
    pub content: String,
}

impl TextPayload {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Decode raw bytes, failing with `EncodingError` if they are not UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FsError> {
        String::from_utf8(bytes)
            .map(Self::new)
            .map_err(|e| FsError::Encoding(e.utf8_error().to_string()))
    }

    /// Encoded length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check the payload against `limits` before anything touches disk.
    pub fn validate(&self, limits: &Limits) -> Result<(), FsError> {
        limits.check_text_size(self.len())
    }
}

/// Result of a text write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub path: String,
    pub bytes_written: u64,
}

/// Result of a file removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSummary {
    pub path: String,
    pub removed: bool,
    /// Size of the file that was removed
    pub size_bytes: u64,
}

/// Result of a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSummary {
    pub from: String,
    pub to: String,
    pub renamed: bool,
}

/// Result of a touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchSummary {
    pub path: String,
    /// `true` if the file did not exist and was created empty
    pub created: bool,
}

/// Result of storing an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Name the bytes were stored under, relative to the root
    pub filename: String,
    pub bytes_written: u64,
}

// ============================================================================
// Commands
// ============================================================================

/// Whitelisted command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Ls,
    Cat,
    Rm,
    Touch,
    Mv,
}

impl Verb {
    /// All verbs, in help order.
    pub const ALL: [Self; 5] = [Self::Ls, Self::Cat, Self::Rm, Self::Touch, Self::Mv];

    /// Look up a verb. Matching is case-sensitive: only lowercase is accepted.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|verb| verb.as_str() == token)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ls => "ls",
            Self::Cat => "cat",
            Self::Rm => "rm",
            Self::Touch => "touch",
            Self::Mv => "mv",
        }
    }

    /// Accepted argument counts.
    #[must_use]
    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            Self::Ls => 0..=1,
            Self::Cat | Self::Rm | Self::Touch => 1..=1,
            Self::Mv => 2..=2,
        }
    }

    /// Human-readable arity, used in `BadArgCount` messages.
    #[must_use]
    pub fn expected_args(self) -> &'static str {
        match self {
            Self::Ls => "at most 1 argument",
            Self::Cat | Self::Rm | Self::Touch => "1 argument",
            Self::Mv => "2 arguments",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    /// The command as received
    pub raw: String,
    pub verb: Verb,
    /// Positional arguments, in order
    pub args: Vec<String>,
}

impl CommandInvocation {
    /// Argument at `index`, or `""` if absent.
    #[must_use]
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map_or("", String::as_str)
    }
}

/// Outcome class of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// Command ran and succeeded
    Ok,
    /// Command was understood but failed
    Error,
    /// Verb is not in the whitelist
    Unknown,
    /// Nothing to run
    Noop,
}

/// What one command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// The command as received
    pub command: String,
    /// Output lines; empty on failure
    pub output: Vec<String>,
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl CommandOutput {
    /// Create a successful command output.
    #[must_use]
    pub fn success(command: &str, output: Vec<String>) -> Self {
        Self {
            command: command.to_string(),
            output,
            status: CommandStatus::Ok,
            error: None,
            error_kind: None,
        }
    }

    /// Create a failed command output from `err`.
    #[must_use]
    pub fn failure(command: &str, err: &FsError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::UnknownCommand => CommandStatus::Unknown,
            ErrorKind::EmptyCommand => CommandStatus::Noop,
            _ => CommandStatus::Error,
        };
        Self {
            command: command.to_string(),
            output: Vec::new(),
            status,
            error: Some(err.to_string()),
            error_kind: Some(kind),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == CommandStatus::Ok
    }
}
