//! `rowrun process`: run the processing pass with a live progress view.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use rowrun_core::{
    ChannelSink, Classifier, FileLogStore, Processor, RandomClassifier, RecordSource,
    RunConfig, RunReport, RunState, RunStatus, DEFAULT_LOG_FILE,
};
use rowrun_source::{read_xlsx, TableSlot};
use tracing::{debug, info};

use super::OutputFormat;
use crate::config::AppConfig;
use crate::output::ProgressView;

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Workbook whose data rows are the records
    #[arg(conflicts_with = "count")]
    pub path: Option<PathBuf>,

    /// Process this many synthetic records instead of a workbook
    #[arg(long)]
    pub count: Option<u64>,

    /// Delay before each record, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Run log location
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Echo the run log while processing
    #[arg(long)]
    pub show_log: bool,

    /// Do not draw the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Seed the classifier for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format for the summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Effective settings after applying CLI flags over the config.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSettings {
    pub delay: Duration,
    pub log_file: PathBuf,
    pub show_log: bool,
    pub progress: bool,
}

impl ProcessSettings {
    pub fn resolve(args: &ProcessArgs, config: &AppConfig) -> Self {
        let delay = args
            .delay_ms
            .or(config.run.delay_ms)
            .map(Duration::from_millis)
            .unwrap_or_else(|| RunConfig::default().record_delay);
        let log_file = args
            .log_file
            .clone()
            .or_else(|| config.run.log_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Self {
            delay,
            log_file,
            show_log: args.show_log || config.output.show_log.unwrap_or(false),
            progress: !args.no_progress && config.output.progress.unwrap_or(true),
        }
    }
}

pub async fn run(args: &ProcessArgs, config: &AppConfig) -> Result<()> {
    let settings = ProcessSettings::resolve(args, config);
    debug!(?settings, "resolved process settings");

    let mut slot = TableSlot::new();
    if let Some(path) = &args.path {
        slot.replace_with(read_xlsx(path))
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }
    let total = args.count.unwrap_or_else(|| slot.count());

    let classifier: Arc<dyn Classifier> = match args.seed {
        Some(seed) => Arc::new(RandomClassifier::seeded(seed)),
        None => Arc::new(RandomClassifier::new()),
    };

    let log = FileLogStore::new(&settings.log_file);
    let tail = settings.show_log.then(|| log.tail());
    let processor = Processor::new(
        RunConfig::default().with_record_delay(settings.delay),
        Arc::new(log),
    );

    let (sink, mut rx) = ChannelSink::new();
    let handle = processor.start(total, classifier, Arc::new(sink))?;
    let cancel = handle.cancel_token();
    info!(run_id = %handle.run_id(), total, "processing started");

    let mut view = ProgressView::new(total, settings.progress, tail);
    let mut interrupted = false;
    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => {
                    if view.handle(message).is_some() {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                debug!("Keyboard interrupt");
                interrupted = true;
                cancel.cancel();
            }
        }
    }

    let report = handle.wait().await?;
    print_report(&report, args.format)?;
    Ok(())
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{}", summary(&report.state)),
    }
    Ok(())
}

/// Counter block shown when a run ends.
pub fn summary(state: &RunState) -> String {
    let verdict = match state.status {
        RunStatus::Cancelled => "Processing cancelled",
        _ => "Processing complete!",
    };
    format!(
        "Total Records: {}\nOK Records: {}\nFailed Records: {}\n{verdict}\n",
        state.total_records, state.ok_count, state.failed_count
    )
}
