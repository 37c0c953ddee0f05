//! Command-line host for the blockpad core.
//!
//! # Responsibility
//! - Inspect, migrate and move documents without the Flutter shell.
//! - Drive the same `Session` the FFI layer uses, with a host-ready editor.

use anyhow::{Context, Result};
use blockpad_core::{
    count, init_logging, normalize_document, BufferedEditor, MemoryKvStore, PersistenceGateway,
    Session, SessionConfig, SqliteKvStore, Theme,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "blockpad", version, about, long_about = None)]
struct Cli {
    /// SQLite file holding the saved document
    #[arg(long, value_name = "PATH", default_value = "blockpad.sqlite3")]
    db: PathBuf,

    /// Write rolling logs to this absolute directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// Log level used with --log-dir
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info
    Ping,
    /// Count visible characters in an export file
    Count {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print an export file with legacy raw blocks converted to paragraphs
    Normalize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Summarize the saved document
    Show,
    /// Replace the saved document with an export file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Write the saved document to a timestamped export file
    Export {
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
    /// Read or set the persisted theme
    Theme {
        /// `light` or `dark`; omit to print the current theme
        value: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(cli.log_level.as_str(), log_dir)
            .map_err(anyhow::Error::msg)
            .context("failed to initialize logging")?;
    }

    match cli.command {
        Command::Ping => {
            println!("blockpad_core ping={}", blockpad_core::ping());
            println!("blockpad_core version={}", blockpad_core::core_version());
        }
        Command::Count { file } => {
            let document = read_export_file(&file)?;
            println!("{}", count(&document));
        }
        Command::Normalize { file } => {
            let document = normalize_document(&read_export_file(&file)?);
            let text = blockpad_core::gateway::encode_snapshot_pretty(&document)
                .context("failed to encode document")?;
            println!("{text}");
        }
        Command::Show => {
            let mut session = open_session(&cli.db)?;
            report_notices(&mut session);
            let document = session.document();
            println!("title={}", document.title);
            println!("blocks={}", document.block_count());
            println!("chars={}", session.char_count());
            println!("theme={}", session.theme().as_str());
        }
        Command::Import { file } => {
            let bytes = fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mut session = open_session(&cli.db)?;
            session
                .import(&bytes)
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            session
                .save()
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            println!(
                "imported blocks={} chars={}",
                session.document().block_count(),
                session.char_count()
            );
        }
        Command::Export { out_dir } => {
            let mut session = open_session(&cli.db)?;
            report_notices(&mut session);
            let file = session
                .export()
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            let path = out_dir.join(&file.file_name);
            fs::write(&path, &file.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Theme { value } => {
            let mut session = open_session(&cli.db)?;
            match value {
                Some(raw) => {
                    let theme = Theme::parse(raw.as_str())
                        .with_context(|| format!("unknown theme `{raw}`, expected light or dark"))?;
                    session
                        .set_theme(theme)
                        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
                    println!("{}", theme.as_str());
                }
                None => println!("{}", session.theme().as_str()),
            }
        }
    }

    Ok(())
}

fn open_session(db: &Path) -> Result<Session<BufferedEditor, SqliteKvStore>> {
    let store = SqliteKvStore::open(db)
        .with_context(|| format!("failed to open {}", db.display()))?;
    let mut editor = BufferedEditor::new();
    editor.mark_ready();
    Ok(Session::start(editor, store, SessionConfig::default()))
}

fn read_export_file(path: &Path) -> Result<blockpad_core::Document> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    PersistenceGateway::new(MemoryKvStore::new())
        .import_from_file(&bytes)
        .with_context(|| format!("{} is not a valid export file", path.display()))
}

fn report_notices(session: &mut Session<BufferedEditor, SqliteKvStore>) {
    for notice in session.take_notices() {
        eprintln!("{}: {}", notice.level.as_str(), notice.message);
    }
}
