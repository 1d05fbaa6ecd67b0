//! [`FileStore`] implementation over a real directory.

use async_trait::async_trait;
use dropfs_core::{
    FileEntry, FileStore, FsError, Limits, RemoveSummary, RenameSummary, TextPayload,
    TouchSummary, UploadSummary, WriteSummary,
};
use std::path::Path;
use tracing::debug;

use crate::engine::FsEngine;
use crate::resolver::{PathResolver, Root};

/// Sandboxed file store rooted at one directory.
///
/// Every path argument is resolved and containment-checked before the
/// engine sees it.
#[derive(Debug, Clone)]
pub struct SandboxFs {
    engine: FsEngine,
}

impl SandboxFs {
    /// Create a store over an already validated root.
    #[must_use]
    pub fn new(root: Root, limits: Limits) -> Self {
        Self {
            engine: FsEngine::new(PathResolver::new(root), limits),
        }
    }

    /// Open `path` as the root of a new store.
    pub fn open(path: impl AsRef<Path>, limits: Limits) -> dropfs_core::Result<Self> {
        Ok(Self::new(Root::open(path)?, limits))
    }

    #[must_use]
    pub fn root(&self) -> &Root {
        self.engine.resolver().root()
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        self.engine.limits()
    }

    #[must_use]
    pub fn engine(&self) -> &FsEngine {
        &self.engine
    }

    /// Store an uploaded file at the top of the root under a sanitized name.
    pub async fn store_upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadSummary, FsError> {
        self.engine.store_upload(filename, bytes).await
    }
}

#[async_trait]
impl FileStore for SandboxFs {
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, FsError> {
        debug!("list {:?}", path);
        let dir = self.engine.resolver().resolve(path)?;
        self.engine.list(&dir).await
    }

    async fn read_text(&self, path: &str) -> Result<TextPayload, FsError> {
        debug!("read_text {:?}", path);
        let file = self.engine.resolver().resolve(path)?;
        self.engine.read_text(&file).await
    }

    async fn write_text(
        &self,
        path: &str,
        payload: &TextPayload,
    ) -> Result<WriteSummary, FsError> {
        debug!("write_text {:?}", path);
        let file = self.engine.resolver().resolve(path)?;
        self.engine.write_text(&file, payload).await
    }

    async fn remove(&self, path: &str) -> Result<RemoveSummary, FsError> {
        debug!("remove {:?}", path);
        let file = self.engine.resolver().resolve(path)?;
        self.engine.remove(&file).await
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<RenameSummary, FsError> {
        debug!("rename {:?} -> {:?}", src, dst);
        let resolver = self.engine.resolver();
        let from = resolver.resolve(src)?;
        let to = resolver.resolve(dst)?;
        self.engine.rename(&from, &to).await
    }

    async fn touch(&self, path: &str) -> Result<TouchSummary, FsError> {
        debug!("touch {:?}", path);
        let file = self.engine.resolver().resolve(path)?;
        self.engine.touch(&file).await
    }
}
