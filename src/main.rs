//! Thumbnailer CLI - Parallel Batch Thumbnail Generator
//!
//! Resizes every image under an input path into a flat output directory
//! and writes `summary_report.txt` next to the thumbnails.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use thumbnailer::{
    check_memory_for, init, run_batch, BatchOutcome, Config, ConfigOverrides, RunSummary,
};

/// Thumbnailer - Parallel Batch Thumbnail Generator
#[derive(Parser)]
#[command(
    name = "thumbnailer",
    version,
    about = "Resize a tree of images into thumbnails with bounded parallelism",
    long_about = "Thumbnailer walks an input file or directory, resizes every image it can \
                  decode and writes the results into a single output directory, followed by \
                  a summary report. Per-image failures are retried and counted, never fatal."
)]
struct Cli {
    /// Input file or directory
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output directory (created if missing)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JPEG compression level (1-100) [default: 75]
    #[arg(short, long, value_name = "LEVEL")]
    compression: Option<u8>,

    /// Maximum width in pixels (0 = unconstrained)
    #[arg(short, long, value_name = "PIXELS")]
    width: Option<u32>,

    /// Maximum height in pixels (0 = unconstrained)
    #[arg(short = 'H', long, value_name = "PIXELS")]
    height: Option<u32>,

    /// Output format: jpeg, png, gif or bmp [default: jpeg]
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Configuration file (.json, .toml or .yaml)
    #[arg(short = 'C', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Images processed at once [default: number of CPUs]
    #[arg(short, long, value_name = "COUNT")]
    parallelism: Option<usize>,

    /// Attempts per image before it counts as failed [default: 1]
    #[arg(long, value_name = "COUNT")]
    retries: Option<u32>,

    /// Log file, appended to [default: processing.log]
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let log_level = if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        };

        ConfigOverrides {
            input: self.input.clone(),
            output: self.output.clone(),
            compression: self.compression,
            width: self.width,
            height: self.height,
            format: self.format.clone(),
            parallelism: self.parallelism,
            retries: self.retries,
            log_level,
            log_file: self.log_file.clone(),
        }
    }

    fn show_progress(&self) -> bool {
        !(self.no_progress || self.json || self.quiet)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", style("Error").red().bold(), e);
        process::exit(1);
    }
}

/// Build the configuration, run the batch and print the summary.
///
/// Only setup and report-write failures surface here; images that fail
/// are part of a successful run.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => Config::default(),
    };
    config = config.with_overrides(cli.overrides());
    if cli.json {
        config.logging.console = false;
    }

    init(&config.logging).context("Failed to initialize logging")?;
    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {:?}", path);
    }

    config.validate()?;
    check_memory_for(config.concurrency_limit()?);

    let progress = cli.show_progress().then(progress_bar).transpose()?;
    let outcome = run_batch(&config, progress).await?;

    if cli.json {
        let report = Some(outcome.report_path.clone());
        let summary = RunSummary::new(&outcome.stats, outcome.elapsed, report);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&outcome);
    }

    Ok(())
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                 {pos}/{len} ({per_sec}, {eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

/// Print processing summary
fn print_summary(outcome: &BatchOutcome) {
    let stats = &outcome.stats;

    println!();
    println!("{}", style("Processing Summary:").bold());
    println!("  {}: {}", style("Processed").green(), stats.success_count);
    if stats.error_count > 0 {
        println!("  {}: {}", style("Failed").red(), stats.error_count);
        for (path, error) in &stats.failures {
            println!("    {} {}", style(path.display()).dim(), error);
        }
    }
    println!("  {}: {:.2}s", style("Duration").blue(), outcome.elapsed.as_secs_f64());

    if let Some(average) = stats.average_duration() {
        println!("  {}: {:?} per image", style("Average").cyan(), average);
        let secs = outcome.elapsed.max(Duration::from_millis(1)).as_secs_f64();
        let rate = stats.success_count as f64 / secs;
        println!("  {}: {:.1} images/sec", style("Speed").cyan(), rate);
    }

    println!("  {}: {}", style("Report").cyan(), outcome.report_path.display());
}
