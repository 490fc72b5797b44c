//! `rowrun text`: print a text document with highlighted placeholders.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rowrun_source::{read_text, segments};

use crate::output::render_segments;

#[derive(Debug, Args)]
pub struct TextArgs {
    /// Text file to display
    pub path: PathBuf,

    /// Never colour placeholders
    #[arg(long)]
    pub plain: bool,

    /// Colour placeholders even when stdout is not a terminal
    #[arg(long, conflicts_with = "plain")]
    pub color: bool,
}

pub fn run(args: &TextArgs) -> Result<()> {
    let content = read_text(&args.path)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;
    let color = !args.plain && (args.color || std::io::stdout().is_terminal());

    let rendered = render_segments(&segments(&content), color);
    print!("{rendered}");
    if !rendered.is_empty() && !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}
