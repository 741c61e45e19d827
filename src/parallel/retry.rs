//! Fixed-count retry policy for job attempts

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use super::{Job, JobOutcome};
use crate::error::{Result, ThumbnailerError};

/// How many times a job is attempted before it counts as failed.
///
/// Attempts run back to back: no delay, no backoff, no jitter. The
/// error kind is never consulted, so deterministic failures are retried
/// like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    /// A single attempt
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(ThumbnailerError::config("Retry attempts must be at least 1"));
        }
        Ok(Self { max_attempts })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `attempt` until it succeeds or the attempts are used up.
    ///
    /// `attempt` returns the duration of that single try. On success the
    /// outcome carries only the succeeding attempt's duration; on
    /// exhaustion it carries the last error. Earlier errors are logged.
    pub async fn execute<F, Fut>(&self, job: &Job, mut attempt: F) -> JobOutcome
    where
        F: FnMut(&Job) -> Fut,
        Fut: Future<Output = Result<Duration>>,
    {
        let mut attempt_no = 1;
        loop {
            match attempt(job).await {
                Ok(elapsed) => {
                    info!("Finished processing image {:?} in {:?}", job.path(), elapsed);
                    return JobOutcome::Success {
                        path: job.path().to_path_buf(),
                        elapsed,
                        attempts: attempt_no,
                    };
                }
                Err(err) if attempt_no >= self.max_attempts => {
                    error!(
                        "Error processing image {:?} (giving up after {} attempt(s)): {}",
                        job.path(),
                        attempt_no,
                        err
                    );
                    return JobOutcome::Failure {
                        path: job.path().to_path_buf(),
                        error: err,
                        attempts: attempt_no,
                    };
                }
                Err(err) => {
                    warn!(
                        "Error processing image {:?} (attempt {}/{}{}): {}",
                        job.path(),
                        attempt_no,
                        self.max_attempts,
                        if err.is_retryable() { "" } else { ", will fail again" },
                        err
                    );
                    attempt_no += 1;
                }
            }
        }
    }
}
