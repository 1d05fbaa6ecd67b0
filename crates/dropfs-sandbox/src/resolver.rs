//! Root-confined path resolution.
//!
//! Client paths are resolved in two passes:
//!
//! 1. **Lexical**: null bytes, absolute markers and drive letters are
//!    rejected, `.` segments dropped and `..` applied. A `..` that would climb
//!    above the root fails here, before any filesystem call.
//! 2. **Physical**: the remaining names are joined to the canonical root one
//!    at a time, following symlinks (including dangling ones) the way the
//!    kernel would. Once a component does not exist, the rest is appended
//!    as-is.
//!
//! The containment check runs on the fully resolved result, so a symlink
//! planted inside the root that points outside it is rejected.

use dropfs_core::{Error, FsError};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Symlinks followed while resolving one path before giving up.
const MAX_SYMLINK_HOPS: usize = 40;

/// The directory every operation is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Canonical absolute path
    path: PathBuf,
}

impl Root {
    /// Canonicalize `path` and require it to be an existing directory.
    pub fn open(path: impl AsRef<Path>) -> dropfs_core::Result<Self> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path).map_err(|e| {
            Error::Config(format!("root {} is not accessible: {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(Error::Config(format!(
                "root {} is not a directory",
                canonical.display()
            )));
        }

        Ok(Self { path: canonical })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `candidate` is the root or lies beneath it.
    ///
    /// `Path::starts_with` compares whole components, so `/data2` is not
    /// inside `/data`.
    #[must_use]
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.path)
    }
}

/// A path proven to lie inside the root.
///
/// Only [`PathResolver::resolve`] creates these, so holding one is proof the
/// containment check ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    absolute: PathBuf,
    relative: String,
}

impl ResolvedPath {
    /// Absolute location on the host filesystem.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    /// Location relative to the root, `/`-separated; `""` for the root itself.
    #[must_use]
    pub fn relative(&self) -> &str {
        &self.relative
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Name to show in messages; the root is shown as `.`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.is_root() { "." } else { &self.relative }
    }
}

/// Resolves client paths against a [`Root`].
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: Root,
}

impl PathResolver {
    #[must_use]
    pub fn new(root: Root) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Resolve a client-supplied relative path.
    ///
    /// Fails with `PathEscape` for any input that is malformed or lands
    /// outside the root. Never clamps.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedPath, FsError> {
        let names = lexical_components(raw)?;
        let absolute = self.follow(names, raw)?;

        if !self.root.contains(&absolute) {
            warn!("Rejected path escape: {:?} -> {:?}", raw, absolute);
            return Err(FsError::PathEscape(raw.to_string()));
        }

        let relative = relative_to(&absolute, self.root.path());
        debug!("resolve {:?} -> {:?}", raw, absolute);
        Ok(ResolvedPath { absolute, relative })
    }

    /// Physical pass: walk `names` from the root, expanding symlinks.
    fn follow(&self, names: Vec<String>, raw: &str) -> Result<PathBuf, FsError> {
        let mut resolved = self.root.path().to_path_buf();
        let mut pending: VecDeque<OsString> = names.into_iter().map(OsString::from).collect();
        let mut exists = true;
        let mut hops = 0;

        while let Some(name) = pending.pop_front() {
            if name == ".." {
                resolved.pop();
                continue;
            }

            let candidate = resolved.join(&name);
            if !exists {
                resolved = candidate;
                continue;
            }

            match fs::symlink_metadata(&candidate) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(FsError::io(
                            raw,
                            io::Error::other("too many levels of symbolic links"),
                        ));
                    }

                    let target = fs::read_link(&candidate).map_err(|e| FsError::io(raw, e))?;
                    let (base, segments) = split_link_target(&target);
                    if let Some(base) = base {
                        resolved = base;
                    }
                    for segment in segments.into_iter().rev() {
                        pending.push_front(segment);
                    }
                }
                Ok(_) => resolved = candidate,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                    ) =>
                {
                    exists = false;
                    resolved = candidate;
                }
                Err(e) => return Err(FsError::io(raw, e)),
            }
        }

        Ok(resolved)
    }
}

/// Lexical pass: validate `raw` and normalize it to plain names.
///
/// Both `/` and `\` separate segments. Performs no I/O.
pub fn lexical_components(raw: &str) -> Result<Vec<String>, FsError> {
    let escape = || FsError::PathEscape(raw.to_string());

    if raw.contains('\0') || raw.starts_with(['/', '\\']) || has_drive_prefix(raw) {
        return Err(escape());
    }

    let mut names: Vec<String> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                names.pop().ok_or_else(escape)?;
            }
            name => names.push(name.to_string()),
        }
    }
    Ok(names)
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Split a symlink target into an optional absolute base and the segments to
/// walk from there.
fn split_link_target(target: &Path) -> (Option<PathBuf>, Vec<OsString>) {
    let mut base: Option<PathBuf> = None;
    let mut segments = Vec::new();

    for component in target.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                base.get_or_insert_with(PathBuf::new)
                    .push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => segments.push(OsString::from("..")),
            Component::Normal(name) => segments.push(name.to_os_string()),
        }
    }

    (base, segments)
}

fn relative_to(absolute: &Path, root: &Path) -> String {
    absolute
        .strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
