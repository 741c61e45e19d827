//! Batch driver: enumerate inputs, run them through the worker pool,
//! write the summary report

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tracing::info;

use crate::config::{Config, TransformOptions};
use crate::discovery::discover_files;
use crate::error::{Result, ThumbnailerError};
use crate::parallel::{ConcurrencyController, ConcurrencyLimit, Job, RetryPolicy, RunStats};
use crate::processing::{ImagePipeline, Transform};
use crate::report::SummaryReport;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub stats: RunStats,
    /// Wall-clock time of the controller run
    pub elapsed: Duration,
    pub report_path: PathBuf,
}

/// Runs one batch of jobs against a [`Transform`]
pub struct BatchRunner {
    transform: Arc<dyn Transform>,
    options: Arc<TransformOptions>,
    limit: ConcurrencyLimit,
    retry: RetryPolicy,
    progress: Option<ProgressBar>,
}

impl BatchRunner {
    pub fn new(
        transform: Arc<dyn Transform>,
        options: TransformOptions,
        limit: ConcurrencyLimit,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transform,
            options: Arc::new(options),
            limit,
            retry,
            progress: None,
        }
    }

    /// Runner backed by an [`ImagePipeline`] writing into the configured output directory
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            Arc::new(ImagePipeline::new(config.output_dir()?)),
            config.transform_options()?,
            config.concurrency_limit()?,
            config.retry_policy()?,
        ))
    }

    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// One job per file, all sharing this run's options
    pub fn jobs(&self, files: Vec<PathBuf>) -> Vec<Job> {
        files
            .into_iter()
            .enumerate()
            .map(|(id, path)| Job::new(id, path, Arc::clone(&self.options)))
            .collect()
    }

    /// Process every file and return the aggregate with the run's wall-clock time
    pub async fn run(&self, files: Vec<PathBuf>) -> (RunStats, Duration) {
        let jobs = self.jobs(files);

        let mut controller = ConcurrencyController::new(self.limit);
        if let Some(bar) = &self.progress {
            bar.set_length(jobs.len() as u64);
            controller = controller.with_progress(bar.clone());
        }

        let transform = Arc::clone(&self.transform);
        let retry = self.retry;

        let start = Instant::now();
        let stats = controller
            .run(jobs, move |job: Job| {
                let transform = Arc::clone(&transform);
                async move {
                    retry
                        .execute(&job, |job: &Job| {
                            timed_attempt(Arc::clone(&transform), job.clone())
                        })
                        .await
                }
            })
            .await;
        let elapsed = start.elapsed();

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        info!("Finished processing images in {:?}", elapsed);
        info!(
            "Successfully processed {} images, encountered {} errors",
            stats.success_count, stats.error_count
        );

        (stats, elapsed)
    }
}

/// One transform attempt on the blocking pool, timed around the transform itself
async fn timed_attempt(transform: Arc<dyn Transform>, job: Job) -> Result<Duration> {
    tokio::task::spawn_blocking(move || {
        info!("Starting processing of image {:?}", job.path());
        let start = Instant::now();
        transform.transform(job.path(), job.options())?;
        Ok(start.elapsed())
    })
    .await
    .map_err(|e| ThumbnailerError::task(format!("Task join error: {}", e)))?
}

/// Full run for a validated configuration.
///
/// Setup problems (bad config, unreadable input, uncreatable output
/// directory) fail before any job starts; per-file failures only show up
/// in the returned stats; a report that cannot be written is an error.
pub async fn run_batch(config: &Config, progress: Option<ProgressBar>) -> Result<BatchOutcome> {
    let mut runner = BatchRunner::from_config(config)?;
    let input = config.input_path()?;
    let output_dir = config.output_dir()?;

    std::fs::create_dir_all(output_dir).map_err(|e| {
        ThumbnailerError::config(format!("Error creating output directory {:?}: {}", output_dir, e))
    })?;

    let files = discover_files(input)?;
    info!("Found {} files under {:?}", files.len(), input);

    if let Some(bar) = progress {
        runner = runner.with_progress(bar);
    }

    let (stats, elapsed) = runner.run(files).await;
    let report_path = SummaryReport::new(&stats, elapsed).write_to(output_dir)?;

    Ok(BatchOutcome {
        stats,
        elapsed,
        report_path,
    })
}
