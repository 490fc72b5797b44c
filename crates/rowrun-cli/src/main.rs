//! rowrun - record processing CLI
//!
//! The `rowrun` command loads spreadsheet records and runs a sequential
//! processing pass over them.
//!
//! ## Commands
//!
//! - `show`: Print the first sheet of an xlsx workbook
//! - `text`: Print a text file with `{{placeholders}}` highlighted
//! - `select`: Pick a choice, confirming the sensitive one
//! - `process`: Run the processing pass with progress and a run log

use anyhow::Result;
use clap::Parser;
use tracing::Level;

mod commands;
mod config;
mod output;

use commands::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    rowrun_core::init_tracing(cli.json, level);

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Show(args) => commands::show::run(&args),
        Commands::Text(args) => commands::text::run(&args),
        Commands::Select(args) => commands::select::run(&args, &config),
        Commands::Process(args) => commands::process::run(&args, &config).await,
    }
}
