//! `rowrun show`: print a workbook's first sheet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rowrun_source::read_xlsx;

use super::OutputFormat;
use crate::output::render_table;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Workbook to read (.xlsx)
    pub path: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: &ShowArgs) -> Result<()> {
    let table = read_xlsx(&args.path)
        .with_context(|| format!("Failed to load {}", args.path.display()))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Text => {
            print!("{}", render_table(&table));
            println!("{} record(s)", table.len());
        }
    }
    Ok(())
}
