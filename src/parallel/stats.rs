//! Thread-safe aggregation of job outcomes

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::JobOutcome;

/// Aggregate results of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Number of jobs submitted
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Durations of successful jobs, in the order they were recorded
    pub durations: Vec<Duration>,
    /// Failed paths with their final error, in the order they were recorded
    pub failures: Vec<(PathBuf, String)>,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Number of outcomes recorded so far
    pub fn recorded(&self) -> usize {
        self.success_count + self.error_count
    }

    /// Every submitted job has an outcome
    pub fn is_complete(&self) -> bool {
        self.recorded() == self.total
    }

    /// Sum of successful job durations
    pub fn busy_time(&self) -> Duration {
        self.durations.iter().sum()
    }

    pub fn average_duration(&self) -> Option<Duration> {
        if self.durations.is_empty() {
            return None;
        }
        Some(self.busy_time() / self.durations.len() as u32)
    }

    fn apply(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Success { elapsed, .. } => {
                self.success_count += 1;
                self.durations.push(*elapsed);
            }
            JobOutcome::Failure { path, error, .. } => {
                self.error_count += 1;
                self.failures.push((path.clone(), error.to_string()));
            }
        }
    }
}

/// Accumulates outcomes from concurrently finishing workers.
///
/// The lock is held only for the in-memory update inside [`record`](Self::record).
pub struct ResultAggregator {
    stats: Mutex<RunStats>,
}

impl ResultAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            stats: Mutex::new(RunStats::new(total)),
        }
    }

    /// Record one job's outcome; counters and durations move together
    pub fn record(&self, outcome: &JobOutcome) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.apply(outcome);
        debug!(
            "Recorded {:?} (success: {}, {}/{} done)",
            outcome.path(),
            outcome.is_success(),
            stats.recorded(),
            stats.total
        );
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RunStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Take the final state, leaving an empty one behind
    pub fn finish(&self) -> RunStats {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let total = stats.total;
        std::mem::replace(&mut *stats, RunStats::new(total))
    }
}
