//! `rowrun select`: choice dialog with confirmation for the sensitive choice.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Args;
use rowrun_core::{AcceptOutcome, SelectionDialog};
use tracing::info;

use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Choice number to accept (1-based); prompts when omitted
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub choice: Option<u64>,

    /// Confirm the sensitive choice without asking
    #[arg(long, conflicts_with = "no")]
    pub yes: bool,

    /// Decline the sensitive choice without asking
    #[arg(long)]
    pub no: bool,
}

impl SelectArgs {
    fn answer(&self) -> Option<bool> {
        match (self.yes, self.no) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub fn run(args: &SelectArgs, config: &AppConfig) -> Result<()> {
    let mut dialog = config.dialog()?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let selected = run_dialog(
        &mut dialog,
        args.choice,
        args.answer(),
        &mut stdin.lock(),
        &mut stdout.lock(),
    )?;

    match selected {
        Some(choice) => {
            info!(choice = %choice, "selection committed");
            println!("Selected: {choice}");
        }
        None => println!("Selection cancelled"),
    }
    Ok(())
}

/// Drive `dialog` to a decision.
///
/// With `choice` given the dialog runs once and a declined confirmation
/// yields `None`. Without it, choices are prompted on `input` until one
/// is committed; declining returns to the prompt.
pub fn run_dialog(
    dialog: &mut SelectionDialog,
    choice: Option<u64>,
    answer: Option<bool>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<String>> {
    if let Some(number) = choice {
        let Some(offset) = number.checked_sub(1) else {
            bail!("Choice numbers start at 1");
        };
        let index = usize::try_from(offset).context("Choice number too large")?;
        return match dialog.accept(index)? {
            AcceptOutcome::Committed(choice) => Ok(Some(choice)),
            AcceptOutcome::NeedsConfirmation { prompt } => {
                let approved = match answer {
                    Some(approved) => approved,
                    None => ask_yes_no(&prompt, input, out)?,
                };
                Ok(dialog.confirm(approved)?)
            }
        };
    }

    loop {
        for (i, name) in dialog.choices().iter().enumerate() {
            writeln!(out, "  {}) {name}", i + 1)?;
        }
        write!(out, "Select an option: ")?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            bail!("No selection made");
        };
        let index = match line.trim().parse::<usize>() {
            Ok(n) if n >= 1 => n - 1,
            _ => {
                writeln!(out, "Please enter a number between 1 and {}", dialog.choices().len())?;
                continue;
            }
        };

        match dialog.accept(index) {
            Ok(AcceptOutcome::Committed(choice)) => return Ok(Some(choice)),
            Ok(AcceptOutcome::NeedsConfirmation { prompt }) => {
                let approved = match answer {
                    Some(approved) => approved,
                    None => ask_yes_no(&prompt, input, out)?,
                };
                if let Some(choice) = dialog.confirm(approved)? {
                    return Ok(Some(choice));
                }
            }
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

fn ask_yes_no(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;
    let line = read_line(input)?.unwrap_or_default();
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read stdin")?;
    Ok((read > 0).then_some(line))
}
