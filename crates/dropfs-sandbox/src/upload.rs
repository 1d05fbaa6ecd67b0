//! Uploaded-file storage.
//!
//! Uploads land at the top level of the root under a sanitized name. A name
//! that is already taken gets a numeric suffix before its extension
//! (`report.txt`, `report-1.txt`, `report-2.txt`, ...).

use chrono::{DateTime, Utc};
use dropfs_core::{FsError, UploadSummary};
use tokio::fs;
use tracing::{debug, info};

use crate::engine::FsEngine;

/// Longest stored file name, in characters.
const MAX_NAME_CHARS: usize = 200;

/// Reduce a client-supplied file name to a safe single path segment.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`, strips leading dots and
/// truncates to 200 characters. Falls back to `upload-<timestamp>` when
/// nothing survives.
#[must_use]
pub fn sanitize_filename(raw: &str, now: DateTime<Utc>) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let cleaned = kept.trim_start_matches('.');

    if cleaned.is_empty() {
        return format!("upload-{}", now.format("%Y%m%d%H%M%S"));
    }
    cleaned.chars().take(MAX_NAME_CHARS).collect()
}

/// The `attempt`-th candidate name for `name`; attempt 0 is the name itself.
fn candidate_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{attempt}.{ext}"),
        _ => format!("{name}-{attempt}"),
    }
}

impl FsEngine {
    /// Store `bytes` under a sanitized, unused name at the top of the root.
    pub async fn store_upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadSummary, FsError> {
        let sanitized = sanitize_filename(filename, Utc::now());
        debug!("engine::store_upload {:?} -> {:?}", filename, sanitized);

        let mut attempt = 0;
        let target = loop {
            let candidate = self.resolver().resolve(&candidate_name(&sanitized, attempt))?;
            if fs::symlink_metadata(candidate.as_path()).await.is_err() {
                break candidate;
            }
            attempt += 1;
        };

        let bytes_written = self.write_atomic(&target, bytes).await?;
        info!("Stored upload {:?} ({} bytes)", target.as_path(), bytes_written);

        Ok(UploadSummary {
            filename: target.relative().to_string(),
            bytes_written,
        })
    }
}
