//! Thumbnailer - Parallel Batch Thumbnail Generator
//!
//! Walks an input tree, resizes every file it can decode and writes the
//! results into one flat output directory, followed by a plain-text
//! summary report.
//!
//! # Features
//!
//! - **Bounded Parallelism**: a fixed number of images in flight, one tokio task per file
//! - **Retries**: every file gets the same number of attempts, back to back
//! - **Resize Modes**: fit within a box, or scale to an exact width or height
//! - **Output Formats**: JPEG (with compression level), PNG, GIF, BMP
//! - **Raw Sources**: `.cr3` files are converted through `exiftool` first
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use thumbnailer::{batch, Config};
//!
//! # async fn example() -> thumbnailer::Result<()> {
//! let config = Config {
//!     input: Some(PathBuf::from("photos")),
//!     output: Some(PathBuf::from("thumbs")),
//!     width: 320,
//!     ..Config::default()
//! };
//!
//! let outcome = batch::run_batch(&config, None).await?;
//! println!("{} of {} images resized", outcome.stats.success_count, outcome.stats.total);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod parallel;
pub mod processing;
pub mod report;

// Re-export commonly used types
pub use batch::{run_batch, BatchOutcome, BatchRunner};
pub use config::{Config, ConfigOverrides, ImageFormat, LoggingConfig, ResizeMode, TransformOptions};
pub use error::{Result, ThumbnailerError};
pub use parallel::{ConcurrencyController, ConcurrencyLimit, Job, JobOutcome, RetryPolicy, RunStats};
pub use processing::{ImagePipeline, Transform};
pub use report::{RunSummary, SummaryReport};

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rough working set of one in-flight decode + resize
const MEMORY_PER_JOB_MB: u64 = 64;

/// Install the global tracing subscriber and log the host's resources.
///
/// Output goes to stdout and, when configured, is appended to the log
/// file as well; `console: false` keeps stdout free for machine output.
/// Only the first call installs a subscriber; later calls leave the
/// existing one in place.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&logging.level).map_err(|e| {
        ThumbnailerError::config(format!("Invalid log level '{}': {}", logging.level, e))
    })?;

    let file = match &logging.file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    let writer = match (file, logging.console) {
        (Some(file), true) => BoxMakeWriter::new(std::io::stdout.and(Mutex::new(file))),
        (Some(file), false) => BoxMakeWriter::new(Mutex::new(file)),
        (None, true) => BoxMakeWriter::new(std::io::stdout),
        (None, false) => BoxMakeWriter::new(std::io::sink),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false);

    let installed = if logging.json_format {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        tracing::subscriber::set_global_default(builder.finish()).is_ok()
    };

    if installed {
        info!("Thumbnailer v{} initialized", VERSION);
        log_system_resources();
    }

    Ok(())
}

fn log_system_resources() {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();
    system.refresh_cpu();

    info!(
        "Detected {} CPUs ({} physical cores)",
        system.cpus().len(),
        system.physical_core_count().unwrap_or(1)
    );
    info!(
        "Available memory: {}MB of {}MB",
        system.available_memory() / (1024 * 1024),
        system.total_memory() / (1024 * 1024)
    );
}

/// Warn when available memory looks too small for `limit` concurrent images
pub fn check_memory_for(limit: ConcurrencyLimit) -> bool {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();

    let available_mb = system.available_memory() / (1024 * 1024);
    let recommended_mb = (limit.get() as u64).saturating_mul(MEMORY_PER_JOB_MB);

    if available_mb < recommended_mb {
        warn!(
            "Low available memory: {}MB for {} concurrent images (recommended: >{}MB)",
            available_mb,
            limit.get(),
            recommended_mb
        );
        return false;
    }
    true
}
