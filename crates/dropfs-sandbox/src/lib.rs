//! Root-confined path resolution and filesystem operations for dropfs.
//!
//! Client paths go through [`PathResolver`] first, which turns them into
//! [`ResolvedPath`]s that are guaranteed to sit inside the [`Root`]. The
//! [`FsEngine`] only accepts resolved paths. [`SandboxFs`] ties the two
//! together behind the [`FileStore`](dropfs_core::FileStore) trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use dropfs_core::{FileStore, Limits, TextPayload};
//! use dropfs_sandbox::SandboxFs;
//!
//! let store = SandboxFs::open("/srv/drop", Limits::default())?;
//! store.write_text("notes/today.md", &TextPayload::new("hello")).await?;
//! let entries = store.list("notes").await?;
//! ```

pub mod engine;
pub mod resolver;
pub mod store;
pub mod upload;

pub use engine::FsEngine;
pub use resolver::{PathResolver, ResolvedPath, Root};
pub use store::SandboxFs;
pub use upload::sanitize_filename;
