//! Whitelisted command shell for dropfs.
//!
//! A command line is parsed by [`CommandParser`] into a
//! [`CommandInvocation`](dropfs_core::CommandInvocation) and run by
//! [`CommandDispatcher`] against any [`FileStore`](dropfs_core::FileStore).
//!
//! | Command | Effect | Output |
//! |---------|--------|--------|
//! | `ls [dir]` | list a directory | `name\tdir\|size\tmodified` per entry |
//! | `cat <file>` | read a text file | one line per content line |
//! | `rm <file>` | remove a file | `removed <file>` |
//! | `touch <file>` | create or bump a file | `created <file>` / `touched <file>` |
//! | `mv <src> <dest>` | rename a file | `renamed <src> -> <dest>` |

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{CommandDispatcher, EMPTY_LISTING, format_entry};
pub use parser::CommandParser;
