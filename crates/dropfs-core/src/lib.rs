//! # dropfs-core
//!
//! Core types, errors and traits for dropfs, a file-drop tree confined to a
//! single root directory and driven either through REST-style operations or a
//! whitelisted command shell.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FileEntry`] | One child of a listed directory |
//! | [`TextPayload`] | UTF-8 content bounded by [`Limits`] |
//! | [`CommandInvocation`] | A parsed `ls`/`cat`/`rm`/`touch`/`mv` line |
//! | [`CommandOutput`] | Output lines or an error for one command |
//! | [`FsError`] | Failure taxonomy shared by every operation |
//! | [`OperationFailure`] | Serializable `{kind, message}` failure |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`FileStore`] | Root-confined list/read/write/remove/rename/touch |
//!
//! ## Related Crates
//!
//! - `dropfs-sandbox`: path resolution and the filesystem engine
//! - `dropfs-shell`: command parsing and dispatch

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, FsError, OperationFailure, Result};
pub use traits::*;
pub use types::*;
