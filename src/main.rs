//! tracktidy - batch-renames music files from arbitrated metadata.
//!
//! Usage:
//!   tracktidy [PATH]             Rename files under PATH
//!   tracktidy --dry-run [PATH]   Preview without touching disk
//!   tracktidy --help             Show help

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, eyre};

use tracktidy_core::{DEFAULT_TEMPLATE, RenameJob};
use tracktidy_ops::{
    DEFAULT_WORKERS, OperationManager, OperationRecord, OperationStatus, OutcomeKind,
};

#[derive(Parser)]
#[command(
    name = "tracktidy",
    version,
    about = "Batch-renames music files from arbitrated metadata",
    long_about = "tracktidy reads each file's tags, optionally cross-checks them \
                  against a remote lookup and local audio analysis, then renames \
                  the file from a template like \"{artist} - {title}\".\n\n\
                  Run with --dry-run first to preview the plan."
)]
struct Cli {
    /// Directory of music files to rename (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Compute every rename but change nothing on disk
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Naming template; placeholders: {artist} {title} {album} {genre}
    /// {year} {track_number} {bpm} {key}
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Number of files processed in parallel
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Run local audio analysis as a third metadata source
    #[arg(long)]
    analyze: bool,

    /// Trust analysis over tags when the tagged BPM looks wrong
    #[arg(long)]
    verify_bpm: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let job = RenameJob::builder()
        .root(&cli.path)
        .recursive(cli.recursive)
        .dry_run(cli.dry_run)
        .template(cli.template.clone())
        .workers(cli.workers)
        .analyze(cli.analyze)
        .verify_bpm(cli.verify_bpm)
        .build()
        .map_err(|e| eyre!("invalid job: {e}"))?;

    let manager = OperationManager::new();
    let id = manager.start(job);

    // Poll for progress until the run reaches a terminal state.
    let record = loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let Some(record) = manager.poll(id) else {
            return Err(eyre!("operation disappeared while running"));
        };
        if record.status.is_terminal() {
            break record;
        }
        if matches!(cli.format, OutputFormat::Text) && record.total > 0 {
            eprint!(
                "\r {}/{} ({:.0}%)  {:<50}",
                record.progress,
                record.total,
                record.percentage(),
                record.current.as_deref().unwrap_or(""),
            );
        }
    };
    if matches!(cli.format, OutputFormat::Text) {
        eprintln!();
    }

    match cli.format {
        OutputFormat::Text => print_report(&record, cli.dry_run),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }

    match record.status {
        OperationStatus::Completed if record.summary().is_clean() => Ok(()),
        OperationStatus::Completed => Err(eyre!(
            "{} file(s) could not be renamed",
            record.summary().errored
        )),
        OperationStatus::Failed => Err(eyre!(
            "{}",
            record.error.unwrap_or_else(|| "operation failed".into())
        )),
        OperationStatus::Cancelled => Err(eyre!("operation was cancelled")),
        OperationStatus::Running => unreachable!("polled to a terminal state"),
    }
}

fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let default_filter = match verbosity {
        0 => return,
        1 => "tracktidy=info",
        2 => "tracktidy=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the per-file plan and a one-line summary.
fn print_report(record: &OperationRecord, dry_run: bool) {
    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} Report",
        if dry_run { "Dry Run" } else { "Rename" }
    );
    println!("{}", "─".repeat(70));
    println!();

    for outcome in &record.results {
        let name = outcome
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| outcome.source.display().to_string());
        match outcome.kind {
            OutcomeKind::Renamed => {
                let dest = outcome
                    .destination
                    .as_ref()
                    .and_then(|d| d.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("   {name}");
                println!("     -> {dest}");
            }
            OutcomeKind::Skipped => {
                println!("   {name}");
                println!(
                    "     skipped: {}",
                    outcome.reason.as_deref().unwrap_or("skipped")
                );
            }
            OutcomeKind::Errored => {
                println!("   {name}");
                println!(
                    "     error: {}",
                    outcome.reason.as_deref().unwrap_or("unknown error")
                );
            }
        }
        for conflict in outcome.resolved.conflicts() {
            println!("     conflict: {conflict}");
        }
    }

    let summary = record.summary();
    println!();
    println!(
        " {} renamed, {} skipped, {} errored ({} total)",
        summary.renamed,
        summary.skipped,
        summary.errored,
        summary.total()
    );
    if let Some(end) = record.finished_at {
        let elapsed = (end - record.started_at).num_milliseconds() as f64 / 1000.0;
        println!(" Finished in {elapsed:.2}s");
    }
    println!();
}
