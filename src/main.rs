//! tasktable - Task Table CLI
//!
//! Filter, sort, page and edit a task list from the terminal.

use clap::Parser;
use tasktable::cli::Cli;
use tasktable::output::emit_error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();
    let command = cli.command_name();

    // Tracing is opt-in via RUST_LOG (or -v).
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let default_filter = if cli.verbose { "tasktable=debug" } else { "off" };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(command, &err, json);
        std::process::exit(err.exit_code());
    }
}
