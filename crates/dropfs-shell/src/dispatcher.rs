//! Command dispatch.
//!
//! Maps each parsed verb onto one [`FileStore`] call and renders the result
//! as output lines. Failures never escape: they come back as a
//! [`CommandOutput`] with the error set and the session carries on.

use chrono::SecondsFormat;
use dropfs_core::{CommandInvocation, CommandOutput, FileEntry, FileStore, FsError, Verb};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::parser::CommandParser;

/// Line emitted by `ls` for an empty directory.
pub const EMPTY_LISTING: &str = "(empty)";

/// Runs whitelisted commands against a [`FileStore`].
pub struct CommandDispatcher {
    store: Arc<dyn FileStore>,
    parser: CommandParser,
}

impl CommandDispatcher {
    #[must_use]
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            parser: CommandParser::new(),
        }
    }

    /// Parse and execute one raw command line.
    pub async fn run(&self, raw: &str) -> CommandOutput {
        match self.parser.parse(raw) {
            Ok(invocation) => self.execute(&invocation).await,
            Err(e) => {
                debug!("Rejected command {:?}: {}", raw, e);
                CommandOutput::failure(raw.trim(), &e)
            }
        }
    }

    /// Execute exactly one parsed command.
    pub async fn execute(&self, invocation: &CommandInvocation) -> CommandOutput {
        debug!("Executing command: {}", invocation.raw);

        match self.dispatch(invocation).await {
            Ok(lines) => CommandOutput::success(&invocation.raw, lines),
            Err(e) => {
                warn!("Command {:?} failed: {}", invocation.raw, e);
                CommandOutput::failure(&invocation.raw, &e)
            }
        }
    }

    async fn dispatch(&self, invocation: &CommandInvocation) -> Result<Vec<String>, FsError> {
        let verb = invocation.verb;
        if !verb.arity().contains(&invocation.args.len()) {
            return Err(FsError::BadArgCount {
                verb: verb.to_string(),
                expected: verb.expected_args().to_string(),
                got: invocation.args.len(),
            });
        }

        match verb {
            Verb::Ls => {
                let entries = self.store.list(invocation.arg(0)).await?;
                if entries.is_empty() {
                    return Ok(vec![EMPTY_LISTING.to_string()]);
                }
                Ok(entries.iter().map(format_entry).collect())
            }
            Verb::Cat => {
                let payload = self.store.read_text(invocation.arg(0)).await?;
                if payload.is_empty() {
                    return Ok(vec![String::new()]);
                }
                Ok(payload.content.lines().map(str::to_string).collect())
            }
            Verb::Rm => {
                let file = invocation.arg(0);
                self.store.remove(file).await?;
                Ok(vec![format!("removed {file}")])
            }
            Verb::Touch => {
                let file = invocation.arg(0);
                let summary = self.store.touch(file).await?;
                let action = if summary.created { "created" } else { "touched" };
                Ok(vec![format!("{action} {file}")])
            }
            Verb::Mv => {
                let (src, dst) = (invocation.arg(0), invocation.arg(1));
                self.store.rename(src, dst).await?;
                Ok(vec![format!("renamed {src} -> {dst}")])
            }
        }
    }
}

/// Render one listing entry as `name<TAB>dir|size<TAB>modified`.
#[must_use]
pub fn format_entry(entry: &FileEntry) -> String {
    let size = match entry.size_bytes {
        Some(bytes) if !entry.is_dir => bytes.to_string(),
        _ => "dir".to_string(),
    };
    format!(
        "{}\t{}\t{}",
        entry.name(),
        size,
        entry.modified_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
