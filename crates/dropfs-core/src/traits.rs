//! Core traits for dropfs.
//!
//! [`FileStore`] is the seam between the sandbox and its callers: the
//! command dispatcher and the binary's REST-style subcommands both talk to a
//! `dyn FileStore`, so the sandbox can be swapped for a mock in tests.

use async_trait::async_trait;

use crate::error::FsError;
use crate::types::{
    FileEntry, RemoveSummary, RenameSummary, TextPayload, TouchSummary, WriteSummary,
};

/// Root-confined file operations addressed by client-supplied relative paths.
///
/// Implementations must validate every path argument before touching the
/// filesystem and must report every failure as an [`FsError`].
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List the direct children of a directory. `""` lists the root.
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, FsError>;

    /// Read a UTF-8 text file.
    async fn read_text(&self, path: &str) -> Result<TextPayload, FsError>;

    /// Atomically replace (or create) a text file.
    async fn write_text(&self, path: &str, payload: &TextPayload)
    -> Result<WriteSummary, FsError>;

    /// Remove a single file.
    async fn remove(&self, path: &str) -> Result<RemoveSummary, FsError>;

    /// Rename a file without overwriting the destination.
    async fn rename(&self, src: &str, dst: &str) -> Result<RenameSummary, FsError>;

    /// Create an empty file, or bump the modification time of an existing one.
    async fn touch(&self, path: &str) -> Result<TouchSummary, FsError>;
}
