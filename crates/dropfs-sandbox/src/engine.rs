//! Filesystem operations on resolved paths.
//!
//! Every method takes [`ResolvedPath`]s, so the containment check has already
//! run. Mutations validate first and act second: nothing is written, removed
//! or renamed until every precondition has been checked.

use chrono::{DateTime, Utc};
use dropfs_core::{
    FileEntry, FsError, Limits, RemoveSummary, RenameSummary, TextPayload, TouchSummary,
    WriteSummary,
};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::resolver::{PathResolver, ResolvedPath};

/// Suffix of in-flight atomic write files.
const TEMP_SUFFIX: &str = ".dropfs-tmp";

/// Filesystem operations engine.
#[derive(Debug, Clone)]
pub struct FsEngine {
    /// Resolver for paths discovered while listing (symlinked children)
    resolver: PathResolver,
    limits: Limits,
}

impl FsEngine {
    #[must_use]
    pub fn new(resolver: PathResolver, limits: Limits) -> Self {
        Self { resolver, limits }
    }

    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// List the direct children of `dir`, sorted case-insensitively by name.
    pub async fn list(&self, dir: &ResolvedPath) -> Result<Vec<FileEntry>, FsError> {
        debug!("engine::list {:?}", dir.as_path());

        let meta = fs::metadata(dir.as_path())
            .await
            .map_err(|e| FsError::io(dir.display_name(), e))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(dir.display_name().to_string()));
        }

        let mut reader = fs::read_dir(dir.as_path())
            .await
            .map_err(|e| FsError::io(dir.display_name(), e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::io(dir.display_name(), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_temp_file(&name) {
                continue;
            }

            let path = if dir.is_root() {
                name
            } else {
                format!("{}/{name}", dir.relative())
            };

            // Entries can vanish between readdir and stat
            let Ok(link_meta) = entry.metadata().await else {
                debug!("Skipping vanished entry {:?}", path);
                continue;
            };
            let meta = self.follow_if_contained(&path, link_meta).await;
            let is_dir = meta.is_dir();

            entries.push(FileEntry {
                path,
                is_dir,
                size_bytes: (!is_dir).then(|| meta.len()),
                modified_at: modified_at(&meta),
            });
        }

        entries.sort_by_cached_key(|e| e.name().to_lowercase());
        Ok(entries)
    }

    /// Stat a listed symlink's target, but only if it stays inside the root.
    async fn follow_if_contained(&self, path: &str, link_meta: Metadata) -> Metadata {
        if !link_meta.file_type().is_symlink() {
            return link_meta;
        }
        match self.resolver.resolve(path) {
            Ok(target) => fs::metadata(target.as_path()).await.unwrap_or(link_meta),
            Err(_) => link_meta,
        }
    }

    /// Read a text file, enforcing the size limit before reading content.
    pub async fn read_text(&self, path: &ResolvedPath) -> Result<TextPayload, FsError> {
        debug!("engine::read_text {:?}", path.as_path());
        let name = path.display_name();

        let meta = fs::metadata(path.as_path())
            .await
            .map_err(|e| FsError::io(name, e))?;
        if meta.is_dir() {
            return Err(FsError::NotADirectory(name.to_string()));
        }
        self.limits.check_text_size(meta.len())?;

        let file = fs::File::open(path.as_path())
            .await
            .map_err(|e| FsError::io(name, e))?;

        // The file may grow after the stat; never buffer more than limit + 1
        let mut buf = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0));
        file.take(self.limits.max_text_bytes.saturating_add(1))
            .read_to_end(&mut buf)
            .await
            .map_err(|e| FsError::io(name, e))?;
        self.limits.check_text_size(buf.len() as u64)?;

        TextPayload::from_bytes(buf).map_err(|e| match e {
            FsError::Encoding(detail) => FsError::Encoding(format!("{name}: {detail}")),
            other => other,
        })
    }

    /// Atomically replace `path` with `payload`, creating parent directories.
    pub async fn write_text(
        &self,
        path: &ResolvedPath,
        payload: &TextPayload,
    ) -> Result<WriteSummary, FsError> {
        debug!("engine::write_text {:?} ({} bytes)", path.as_path(), payload.len());

        payload.validate(&self.limits)?;
        self.ensure_not_dir(path).await?;
        self.ensure_parent(path).await?;

        let bytes_written = self.write_atomic(path, payload.content.as_bytes()).await?;
        info!("Wrote {} bytes to {:?}", bytes_written, path.as_path());

        Ok(WriteSummary {
            path: path.relative().to_string(),
            bytes_written,
        })
    }

    /// Remove a single file. Directories are refused.
    pub async fn remove(&self, path: &ResolvedPath) -> Result<RemoveSummary, FsError> {
        debug!("engine::remove {:?}", path.as_path());
        let name = path.display_name();

        let meta = fs::metadata(path.as_path())
            .await
            .map_err(|e| FsError::io(name, e))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory(name.to_string()));
        }

        fs::remove_file(path.as_path())
            .await
            .map_err(|e| FsError::io(name, e))?;
        info!("Removed {:?}", path.as_path());

        Ok(RemoveSummary {
            path: path.relative().to_string(),
            removed: true,
            size_bytes: meta.len(),
        })
    }

    /// Rename a file. Never overwrites the destination, even one created concurrently.
    pub async fn rename(
        &self,
        src: &ResolvedPath,
        dst: &ResolvedPath,
    ) -> Result<RenameSummary, FsError> {
        debug!("engine::rename {:?} -> {:?}", src.as_path(), dst.as_path());

        let meta = fs::metadata(src.as_path())
            .await
            .map_err(|e| FsError::io(src.display_name(), e))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory(src.display_name().to_string()));
        }
        if fs::symlink_metadata(dst.as_path()).await.is_ok() {
            return Err(FsError::AlreadyExists(dst.display_name().to_string()));
        }
        self.ensure_parent(dst).await?;

        move_no_replace(src.as_path(), dst.as_path())
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    FsError::AlreadyExists(dst.display_name().to_string())
                }
                _ => FsError::io(src.display_name(), e),
            })?;
        info!("Renamed {:?} -> {:?}", src.as_path(), dst.as_path());

        Ok(RenameSummary {
            from: src.relative().to_string(),
            to: dst.relative().to_string(),
            renamed: true,
        })
    }

    /// Create an empty file, or bump the modification time of an existing
    /// one. Existing content is never rewritten.
    pub async fn touch(&self, path: &ResolvedPath) -> Result<TouchSummary, FsError> {
        debug!("engine::touch {:?}", path.as_path());
        let name = path.display_name();

        self.ensure_not_dir(path).await?;
        self.ensure_parent(path).await?;

        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_path())
            .await;

        let created = match created {
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let file = fs::OpenOptions::new()
                    .append(true)
                    .open(path.as_path())
                    .await
                    .map_err(|e| FsError::io(name, e))?;
                file.into_std()
                    .await
                    .set_modified(SystemTime::now())
                    .map_err(|e| FsError::io(name, e))?;
                false
            }
            Err(e) => return Err(FsError::io(name, e)),
        };

        if created {
            info!("Created empty file {:?}", path.as_path());
        }

        Ok(TouchSummary {
            path: path.relative().to_string(),
            created,
        })
    }

    /// Write `bytes` to a temporary sibling and rename it over `path`.
    ///
    /// The temp file is removed if any step fails.
    pub(crate) async fn write_atomic(
        &self,
        path: &ResolvedPath,
        bytes: &[u8],
    ) -> Result<u64, FsError> {
        let temp = temp_sibling(path.as_path());

        let result: io::Result<()> = async {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp, path.as_path()).await
        }
        .await;

        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&temp).await
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                warn!("Failed to remove temp file {:?}: {cleanup}", temp);
            }
            return Err(FsError::io(path.display_name(), e));
        }

        Ok(bytes.len() as u64)
    }

    async fn ensure_not_dir(&self, path: &ResolvedPath) -> Result<(), FsError> {
        if path.is_root() {
            return Err(FsError::IsADirectory(path.display_name().to_string()));
        }
        match fs::metadata(path.as_path()).await {
            Ok(meta) if meta.is_dir() => {
                Err(FsError::IsADirectory(path.display_name().to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_parent(&self, path: &ResolvedPath) -> Result<(), FsError> {
        if let Some(parent) = path.as_path().parent()
            && self.resolver.root().contains(parent)
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::io(path.display_name(), e))?;
        }
        Ok(())
    }
}

/// Move `src` to `dst`, failing with `AlreadyExists` if `dst` exists.
///
/// The link step is atomic, so a destination created after any earlier
/// check is still never replaced.
async fn move_no_replace(src: &Path, dst: &Path) -> io::Result<()> {
    fs::hard_link(src, dst).await?;
    if let Err(e) = fs::remove_file(src).await {
        if let Err(undo) = fs::remove_file(dst).await {
            warn!("Failed to undo link {:?}: {undo}", dst);
        }
        return Err(e);
    }
    Ok(())
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}{TEMP_SUFFIX}", Uuid::new_v4().simple()))
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

fn modified_at(meta: &Metadata) -> DateTime<Utc> {
    DateTime::<Utc>::from(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH))
}
