//! # dropfs CLI
//!
//! Command-line interface for dropfs, a file-drop tree confined to one root
//! directory.
//!
//! ## Commands
//!
//! - `dropfs ls [PATH]` - List a directory
//! - `dropfs cat <PATH>` - Print a text file
//! - `dropfs write <PATH> [--content TEXT]` - Atomically write a text file
//! - `dropfs rm <PATH>` / `dropfs mv <SRC> <DST>` / `dropfs touch <PATH>`
//! - `dropfs upload <FILE>...` - Copy local files into the root
//! - `dropfs exec "<COMMAND>"` - Run one whitelisted shell command
//! - `dropfs shell` - Run whitelisted commands read from stdin, one per line
//! - `dropfs config show|init|path` - Inspect configuration
//!
//! ## Examples
//!
//! ```bash
//! # Write a note from stdin and read it back
//! echo "hello" | dropfs --root /srv/drop write notes/today.md
//! dropfs --root /srv/drop cat notes/today.md
//!
//! # Run shell commands and get JSON output
//! dropfs --root /srv/drop exec "mv notes/today.md notes/old.md" --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dropfs_core::{
    CommandOutput, FileStore, FsError, Limits, OperationFailure, TextPayload, UploadSummary,
};
use dropfs_sandbox::SandboxFs;
use dropfs_shell::{CommandDispatcher, EMPTY_LISTING, format_entry};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "dropfs")]
#[command(about = "A sandboxed file-drop tree with a whitelisted command shell")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/dropfs/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Root directory (overrides config and DROPFS_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory (the root by default)
    Ls {
        /// Directory, relative to the root
        path: Option<String>,
    },

    /// Print a text file
    Cat {
        /// File, relative to the root
        path: String,
    },

    /// Atomically write a text file, creating parent directories
    Write {
        /// File, relative to the root
        path: String,

        /// Content to write (read from stdin when omitted)
        #[arg(long)]
        content: Option<String>,
    },

    /// Remove a file
    Rm {
        /// File, relative to the root
        path: String,
    },

    /// Rename a file without overwriting the destination
    Mv {
        /// Source, relative to the root
        src: String,

        /// Destination, relative to the root
        dst: String,
    },

    /// Create an empty file or bump its modification time
    Touch {
        /// File, relative to the root
        path: String,
    },

    /// Copy local files to the top of the root under sanitized names
    Upload {
        /// Local files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Run one whitelisted command (ls, cat, rm, touch, mv)
    Exec {
        /// The command line, e.g. "mv a.txt b.txt"
        command: String,
    },

    /// Run whitelisted commands from stdin, one per line
    Shell,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    init_logging(cli.verbose, &config.logging)?;

    match cli.command {
        Commands::Config { action } => {
            show_config(action, &config, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let store = open_store(cli.root, &config)?;
            run(command, store, cli.format).await
        }
    }
}

/// Install the global tracing subscriber. Logs never go to stdout.
fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        logging
            .level
            .parse::<Level>()
            .with_context(|| format!("Invalid log level {:?}", logging.level))?
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);

    if let Some(ref path) = logging.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        let subscriber = builder.with_ansi(false).with_writer(Mutex::new(file)).finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("Failed to set tracing subscriber")?;
    } else {
        let subscriber = builder.with_writer(std::io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("Failed to set tracing subscriber")?;
    }

    Ok(())
}

/// Open the sandbox, refusing to start without a usable root.
fn open_store(cli_root: Option<PathBuf>, config: &Config) -> Result<SandboxFs> {
    let root = cli_root.or_else(|| config.sandbox.root.clone()).context(
        "No root directory configured: pass --root, set DROPFS_ROOT or [sandbox] root",
    )?;

    let store = SandboxFs::open(&root, config.limits())
        .with_context(|| format!("Cannot use {} as root", root.display()))?;
    debug!("Opened root {:?}", store.root().path());
    Ok(store)
}

async fn run(command: Commands, store: SandboxFs, format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Ls { path } => {
            let result = store.list(path.as_deref().unwrap_or("")).await;
            emit(format, result, |entries| {
                if entries.is_empty() {
                    println!("{EMPTY_LISTING}");
                }
                for entry in entries {
                    println!("{}", format_entry(entry));
                }
            })
        }

        Commands::Cat { path } => {
            let result = store.read_text(&path).await;
            emit(format, result, |payload| print!("{}", payload.content))
        }

        Commands::Write { path, content } => {
            let result = match read_payload(content, store.limits()).await? {
                Ok(payload) => store.write_text(&path, &payload).await,
                Err(e) => Err(e),
            };
            emit(format, result, |summary| {
                println!("wrote {} bytes to {}", summary.bytes_written, summary.path);
            })
        }

        Commands::Rm { path } => {
            let result = store.remove(&path).await;
            emit(format, result, |summary| {
                println!("removed {} ({} bytes)", summary.path, summary.size_bytes);
            })
        }

        Commands::Mv { src, dst } => {
            let result = store.rename(&src, &dst).await;
            emit(format, result, |summary| {
                println!("renamed {} -> {}", summary.from, summary.to);
            })
        }

        Commands::Touch { path } => {
            let result = store.touch(&path).await;
            emit(format, result, |summary| {
                let action = if summary.created { "created" } else { "touched" };
                println!("{action} {}", summary.path);
            })
        }

        Commands::Upload { files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for file in &files {
                let bytes = tokio::fs::read(file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                uploads.push((name, bytes));
            }

            let result: Result<Vec<UploadSummary>, FsError> = async {
                let mut stored = Vec::with_capacity(uploads.len());
                for (name, bytes) in &uploads {
                    stored.push(store.store_upload(name, bytes).await?);
                }
                Ok(stored)
            }
            .await;

            emit(format, result, |stored| {
                for summary in stored {
                    println!("stored {} ({} bytes)", summary.filename, summary.bytes_written);
                }
            })
        }

        Commands::Exec { command } => {
            let dispatcher = CommandDispatcher::new(Arc::new(store));
            let output = dispatcher.run(&command).await;
            print_command_output(format, &output, true)?;
            Ok(if output.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Shell => {
            let dispatcher = CommandDispatcher::new(Arc::new(store));
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
                if line.trim().is_empty() {
                    continue;
                }
                let output = dispatcher.run(&line).await;
                print_command_output(format, &output, false)?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Text to write: `--content` if given, else stdin up to the text limit.
async fn read_payload(
    content: Option<String>,
    limits: &Limits,
) -> Result<Result<TextPayload, FsError>> {
    match content {
        Some(content) => Ok(Ok(TextPayload::new(content))),
        None => read_limited(tokio::io::stdin(), limits)
            .await
            .context("Failed to read stdin"),
    }
}

/// Read at most one byte past the limit. Longer input fails with
/// `TooLarge` without being buffered whole.
async fn read_limited<R: AsyncRead + Unpin>(
    reader: R,
    limits: &Limits,
) -> std::io::Result<Result<TextPayload, FsError>> {
    let mut buf = Vec::new();
    reader
        .take(limits.max_text_bytes.saturating_add(1))
        .read_to_end(&mut buf)
        .await?;
    Ok(limits
        .check_text_size(buf.len() as u64)
        .and_then(|()| TextPayload::from_bytes(buf)))
}

/// Print a REST-style result. Failures become `kind: message` and exit 1.
fn emit<T: Serialize>(
    format: OutputFormat,
    result: Result<T, FsError>,
    text: impl FnOnce(&T),
) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
                OutputFormat::Text => text(&value),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let failure = OperationFailure::from(&e);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&failure)?),
                OutputFormat::Text => eprintln!("{failure}"),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print one shell command's output. JSON is one object per line unless `pretty`.
fn print_command_output(format: OutputFormat, output: &CommandOutput, pretty: bool) -> Result<()> {
    match format {
        OutputFormat::Json if pretty => println!("{}", serde_json::to_string_pretty(output)?),
        OutputFormat::Json => println!("{}", serde_json::to_string(output)?),
        OutputFormat::Text => {
            for line in &output.output {
                println!("{line}");
            }
            if let Some(ref error) = output.error {
                println!("error: {error}");
            }
        }
    }
    Ok(())
}

fn show_config(action: ConfigAction, config: &Config, format: OutputFormat) -> Result<()> {
    match action {
        ConfigAction::Show => match format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(config).context("Failed to serialize config")?
                );
            }
            OutputFormat::Text => {
                println!(
                    "{}",
                    toml::to_string_pretty(config).context("Failed to serialize config")?
                );
            }
        },
        ConfigAction::Init => {
            println!("{}", Config::sample_toml());
        }
        ConfigAction::Path => {
            if let Some(path) = Config::config_path() {
                println!("{}", path.display());
            } else {
                println!("Could not determine config directory");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropfs_core::ErrorKind;

    // ========== Stdin payloads ==========

    #[tokio::test]
    async fn test_read_limited_within_limit() {
        let limits = Limits { max_text_bytes: 5 };
        let payload = read_limited(&b"hello"[..], &limits).await.unwrap().unwrap();
        assert_eq!(payload.content, "hello");
    }

    #[tokio::test]
    async fn test_read_limited_stops_past_limit() {
        let limits = Limits { max_text_bytes: 4 };
        let input = vec![b'x'; 1 << 20];

        let err = read_limited(&input[..], &limits).await.unwrap().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TooLarge);
        assert!(matches!(err, FsError::TooLarge { size: 5, limit: 4 }));
    }

    #[tokio::test]
    async fn test_read_limited_rejects_invalid_utf8() {
        let limits = Limits::default();
        let err = read_limited(&b"f\xff"[..], &limits)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingError);
    }

    #[tokio::test]
    async fn test_content_flag_skips_stdin() {
        let limits = Limits { max_text_bytes: 1 };
        let payload = read_payload(Some("inline".to_string()), &limits)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.content, "inline");
    }
}
