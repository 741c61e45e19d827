//! Bounded parallel execution of independent jobs
//!
//! [`ConcurrencyController::run`] spawns one task per [`Job`], admits at most
//! [`ConcurrencyLimit`] of them at a time through a semaphore, and returns
//! only after every job has produced a [`JobOutcome`] that the
//! [`ResultAggregator`] has recorded. Completion order is not defined, and
//! a started run cannot be cancelled or given a deadline.

use std::future::Future;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::TransformOptions;
use crate::error::{Result, ThumbnailerError};

pub mod retry;
pub mod stats;

pub use retry::*;
pub use stats::*;

/// Maximum number of jobs executing at once; always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    pub fn new(limit: usize) -> Result<Self> {
        if limit > Semaphore::MAX_PERMITS {
            return Err(ThumbnailerError::config(format!(
                "Parallelism must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        NonZeroUsize::new(limit)
            .map(Self)
            .ok_or_else(|| ThumbnailerError::config("Parallelism must be at least 1"))
    }

    /// One slot per logical CPU
    pub fn available() -> Self {
        Self(NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// One file's worth of work, immutable once built
#[derive(Debug, Clone)]
pub struct Job {
    id: usize,
    path: PathBuf,
    options: Arc<TransformOptions>,
}

impl Job {
    pub fn new(id: usize, path: PathBuf, options: Arc<TransformOptions>) -> Self {
        Self { id, path, options }
    }

    /// Position in the enumerated job list
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }
}

/// Terminal result of a job's whole retry sequence
#[derive(Debug)]
pub enum JobOutcome {
    Success {
        path: PathBuf,
        /// Duration of the attempt that succeeded
        elapsed: Duration,
        attempts: u32,
    },
    Failure {
        path: PathBuf,
        /// Error of the last attempt
        error: ThumbnailerError,
        attempts: u32,
    },
}

impl JobOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Success { path, .. } | Self::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Success { elapsed, .. } => Some(*elapsed),
            Self::Failure { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }
}

/// Bounded worker pool with a fork-join barrier
pub struct ConcurrencyController {
    limit: ConcurrencyLimit,
    progress: Option<ProgressBar>,
}

impl ConcurrencyController {
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self {
            limit,
            progress: None,
        }
    }

    /// Tick `bar` once per recorded outcome
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    /// Run `process` once for every job, never more than `limit` at a time.
    ///
    /// A failing or panicking job is recorded as a failure; it never stops
    /// the others. The returned stats cover every job in `jobs`.
    pub async fn run<F, Fut>(&self, jobs: Vec<Job>, process: F) -> RunStats
    where
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JobOutcome> + Send + 'static,
    {
        let total = jobs.len();
        info!(
            "Starting processing of {} images with {} concurrent workers",
            total,
            self.limit.get()
        );

        let aggregator = Arc::new(ResultAggregator::new(total));
        let semaphore = Arc::new(Semaphore::new(self.limit.get()));
        let process = Arc::new(process);

        let mut paths = Vec::with_capacity(total);
        let mut tasks = Vec::with_capacity(total);

        for job in jobs {
            paths.push(job.path().to_path_buf());

            let semaphore = Arc::clone(&semaphore);
            let aggregator = Arc::clone(&aggregator);
            let process = Arc::clone(&process);
            let progress = self.progress.clone();

            tasks.push(tokio::spawn(async move {
                // Held until the retry sequence is over, dropped on every exit path
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ThumbnailerError::task(format!("admission gate closed: {}", e)))?;

                debug!("Job {} admitted: {:?}", job.id(), job.path());
                let outcome = process(job).await;
                aggregator.record(&outcome);

                if let Some(bar) = progress {
                    bar.inc(1);
                }
                Ok::<(), ThumbnailerError>(())
            }));
        }

        let results = futures::future::join_all(tasks).await;

        // Workers that died before recording still count as failures
        for (result, path) in results.into_iter().zip(paths) {
            let error = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => ThumbnailerError::task(format!("Task join error: {}", e)),
            };
            error!("Error processing image {:?}: {}", path, error);
            aggregator.record(&JobOutcome::Failure {
                path,
                error,
                attempts: 0,
            });
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        aggregator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jobs(count: usize) -> Vec<Job> {
        let options = Arc::new(TransformOptions::new(200, 0, "jpeg", 75).unwrap());
        (0..count)
            .map(|i| Job::new(i, PathBuf::from(format!("img_{i}.png")), Arc::clone(&options)))
            .collect()
    }

    type BoxedOutcome = std::pin::Pin<Box<dyn Future<Output = JobOutcome> + Send>>;

    /// Tracks the number of concurrently running jobs and the peak seen
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn sleepy_process(
        tracker: Arc<InFlight>,
        fail_every: usize,
    ) -> impl Fn(Job) -> BoxedOutcome + Send + Sync + 'static {
        move |job: Job| {
            let tracker = Arc::clone(&tracker);
            Box::pin(async move {
                tracker.enter();
                tokio::time::sleep(Duration::from_millis(10)).await;
                tracker.exit();

                let path = job.path().to_path_buf();
                if fail_every > 0 && job.id() % fail_every == 0 {
                    JobOutcome::Failure {
                        path,
                        error: ThumbnailerError::decode("corrupt", job.path()),
                        attempts: 1,
                    }
                } else {
                    JobOutcome::Success {
                        path,
                        elapsed: Duration::from_millis(10),
                        attempts: 1,
                    }
                }
            })
        }
    }

    #[test]
    fn test_concurrency_limit() {
        assert!(ConcurrencyLimit::new(0).unwrap_err().is_setup());
        assert_eq!(ConcurrencyLimit::new(3).unwrap().get(), 3);
        assert!(ConcurrencyLimit::available().get() >= 1);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_setup_error() {
        assert!(ConcurrencyLimit::new(usize::MAX).unwrap_err().is_setup());
        assert!(ConcurrencyLimit::new(Semaphore::MAX_PERMITS + 1).unwrap_err().is_setup());

        let limit = ConcurrencyLimit::new(Semaphore::MAX_PERMITS).unwrap();
        let stats = ConcurrencyController::new(limit)
            .run(jobs(2), sleepy_process(Arc::new(InFlight::default()), 0))
            .await;
        assert_eq!(stats.success_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_never_exceeds_limit() {
        let tracker = Arc::new(InFlight::default());
        let controller = ConcurrencyController::new(ConcurrencyLimit::new(3).unwrap());

        let stats = controller.run(jobs(20), sleepy_process(Arc::clone(&tracker), 0)).await;

        assert_eq!(stats.total, 20);
        assert_eq!(stats.success_count, 20);
        assert_eq!(tracker.started.load(Ordering::SeqCst), 20);
        assert!(tracker.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(tracker.current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_limit_one_is_sequential() {
        let tracker = Arc::new(InFlight::default());
        let controller = ConcurrencyController::new(ConcurrencyLimit::new(1).unwrap());

        let stats = controller.run(jobs(10), sleepy_process(Arc::clone(&tracker), 0)).await;

        assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
        assert_eq!(stats.success_count + stats.error_count, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failures_do_not_abort() {
        let tracker = Arc::new(InFlight::default());
        let controller = ConcurrencyController::new(ConcurrencyLimit::new(4).unwrap());

        // ids 0, 3, 6, 9 fail
        let stats = controller.run(jobs(12), sleepy_process(Arc::clone(&tracker), 3)).await;

        assert_eq!(stats.success_count, 8);
        assert_eq!(stats.error_count, 4);
        assert_eq!(stats.durations.len(), 8);
        assert_eq!(stats.failures.len(), 4);
        assert!(stats.is_complete());
    }

    #[tokio::test]
    async fn test_empty_job_list() {
        let controller = ConcurrencyController::new(ConcurrencyLimit::new(2).unwrap());
        let stats = controller
            .run(Vec::new(), sleepy_process(Arc::new(InFlight::default()), 0))
            .await;

        assert_eq!(stats, RunStats::default());
        assert!(stats.is_complete());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_job_counts_as_failure() {
        let controller = ConcurrencyController::new(ConcurrencyLimit::new(2).unwrap());
        let stats = controller
            .run(jobs(4), |job: Job| async move {
                if job.id() == 2 {
                    panic!("decoder blew up");
                }
                JobOutcome::Success {
                    path: job.path().to_path_buf(),
                    elapsed: Duration::from_millis(1),
                    attempts: 1,
                }
            })
            .await;

        assert_eq!(stats.total, 4);
        assert_eq!(stats.success_count, 3);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.failures[0].0, PathBuf::from("img_2.png"));
    }

    #[tokio::test]
    async fn test_progress_bar_ticks_per_job() {
        let bar = ProgressBar::hidden();
        bar.set_length(5);
        let controller = ConcurrencyController::new(ConcurrencyLimit::new(2).unwrap())
            .with_progress(bar.clone());

        controller
            .run(jobs(5), sleepy_process(Arc::new(InFlight::default()), 2))
            .await;

        assert_eq!(bar.position(), 5);
    }
}
