//! CLI command definitions and handlers.

pub mod process;
pub mod select;
pub mod show;
pub mod text;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "rowrun")]
#[command(author = "rowrun contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Process spreadsheet records with progress, counters and a run log", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file applied over the XDG and project configs
    #[arg(long, global = true, env = "ROWRUN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the first sheet of an xlsx workbook
    Show(show::ShowArgs),

    /// Print a text file with {{placeholders}} highlighted
    Text(text::TextArgs),

    /// Pick one of the configured choices
    Select(select::SelectArgs),

    /// Run the processing pass over the loaded records
    Process(process::ProcessArgs),
}

/// Shape of command output on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
