//! Command-line interface for tasktable
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;

mod list;
mod tui;

/// tasktable - sortable, filterable task table
///
/// Loads a task list once and lets you filter, sort, page or scroll
/// through it, and add, edit, complete or delete tasks in memory.
#[derive(Parser, Debug)]
#[command(name = "tasktable")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON file holding the task list (overrides source.path)
    #[arg(long, global = true, env = "TASKTABLE_SOURCE")]
    pub source: Option<PathBuf>,

    /// Configuration file (defaults to ./.tasktable.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive task table (default)
    Tui,

    /// Print one derived page of the task table
    List {
        /// Case-insensitive substring filter on content
        #[arg(short, long)]
        filter: Option<String>,

        /// Sort column: id, content, done, done-time
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Page to print (1-based)
        #[arg(short, long)]
        page: Option<usize>,

        /// Print every match instead of one page
        #[arg(long, conflicts_with = "page")]
        all: bool,
    },
}

/// Configuration and source path shared by every command.
pub(crate) struct Context {
    pub(crate) config: Config,
    pub(crate) source: PathBuf,
}

impl Cli {
    /// Name reported in the output envelope.
    pub fn command_name(&self) -> &'static str {
        match self.command {
            Some(Commands::List { .. }) => "list",
            Some(Commands::Tui) | None => "tui",
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = load_context(self.config.as_deref(), self.source)?;
        match self.command.unwrap_or(Commands::Tui) {
            Commands::Tui => tui::run(tui::TuiOptions {
                ctx,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List {
                filter,
                sort,
                desc,
                page,
                all,
            } => list::run(list::ListOptions {
                ctx,
                filter,
                sort,
                desc,
                page,
                all,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}

fn load_context(config_path: Option<&Path>, source: Option<PathBuf>) -> Result<Context> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Config::load_from_dir(&cwd)
        }
    };
    let source = source.unwrap_or_else(|| config.source.path.clone());
    tracing::debug!(source = %source.display(), "resolved task source");
    Ok(Context { config, source })
}
