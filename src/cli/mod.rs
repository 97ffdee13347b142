use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::NotesApp;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::render::CommonMarkRenderer;
use crate::storage::StorageHandle;

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, ListArgs, NewArgs, SearchArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "marknotes",
    version,
    about = "Markdown notes kept in a local SQLite store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over MARKNOTES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over MARKNOTES_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a note; content may be piped on stdin
    New(NewArgs),
    /// List notes, newest first (default)
    List(ListArgs),
    /// Print a single note
    Show(ShowArgs),
    /// Change the title and/or content of a note
    Edit(EditArgs),
    /// Delete a note
    Delete(DeleteArgs),
    /// Case-insensitive search over titles and content
    Search(SearchArgs),
    /// Show where notes are stored and whether they are in sync
    Status,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    let mut app = NotesApp::new(StorageHandle::new(&config.storage), &config.notes);
    if app.sync_status().is_degraded() {
        eprintln!("warning: note store {}", app.sync_status());
    }

    let command = cli
        .command
        .unwrap_or_else(|| Commands::List(ListArgs::default()));
    let output = match command {
        Commands::New(args) => {
            let piped = if args.content.is_none() {
                commands::read_stdin()?
            } else {
                None
            };
            commands::new_note(&mut app, args, piped)?
        }
        Commands::List(args) => commands::list_notes(&app, &config, args),
        Commands::Show(args) => {
            let renderer = CommonMarkRenderer::new(&config.render);
            commands::show_note(&mut app, &renderer, args)?
        }
        Commands::Edit(args) => {
            let piped = if args.content.as_deref() == Some("-") {
                commands::read_stdin()?
            } else {
                None
            };
            commands::edit_note(&mut app, args, piped)?
        }
        Commands::Delete(args) => commands::delete_note(&mut app, args, commands::confirm_delete)?,
        Commands::Search(args) => commands::search_notes(&app, &config, args),
        Commands::Status => commands::show_status(&app),
    };
    print!("{output}");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))
    })
    .map(|_| ())
}
