//! Summary report written at the end of a run

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::{Result, ThumbnailerError};
use crate::parallel::RunStats;

/// File name of the report inside the output directory
pub const REPORT_FILE_NAME: &str = "summary_report.txt";

/// Text summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub total: usize,
    pub successful: usize,
    pub errors: usize,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
    /// Successful job durations in completion order
    pub durations: Vec<Duration>,
}

impl SummaryReport {
    pub fn new(stats: &RunStats, elapsed: Duration) -> Self {
        Self {
            total: stats.total,
            successful: stats.success_count,
            errors: stats.error_count,
            elapsed,
            durations: stats.durations.clone(),
        }
    }

    /// Render the report body.
    ///
    /// The numbered lines follow completion order among successful jobs
    /// only, so "Image N" is not the N-th input file.
    pub fn render(&self) -> String {
        let mut report = format!(
            "Summary Report:\n\
             Total images processed: {}\n\
             Successfully processed: {}\n\
             Errors encountered: {}\n\
             Total time taken: {:?}\n",
            self.total, self.successful, self.errors, self.elapsed
        );

        for (i, duration) in self.durations.iter().enumerate() {
            // Writing into a String cannot fail
            let _ = writeln!(report, "Image {} processing time: {:?}", i + 1, duration);
        }

        report
    }

    /// Write the report to `<output_dir>/summary_report.txt`, replacing any previous one
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(REPORT_FILE_NAME);
        std::fs::write(&path, self.render())
            .map_err(|e| ThumbnailerError::report_write(path.clone(), e))?;

        info!("Summary report saved to {:?}", path);
        Ok(path)
    }
}

/// Machine-readable summary for `--json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub errors: usize,
    pub elapsed_secs: f64,
    pub durations_secs: Vec<f64>,
    pub failures: Vec<FailedJob>,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub path: PathBuf,
    pub error: String,
}

impl RunSummary {
    pub fn new(stats: &RunStats, elapsed: Duration, report: Option<PathBuf>) -> Self {
        Self {
            total: stats.total,
            successful: stats.success_count,
            errors: stats.error_count,
            elapsed_secs: elapsed.as_secs_f64(),
            durations_secs: stats.durations.iter().map(Duration::as_secs_f64).collect(),
            failures: stats
                .failures
                .iter()
                .map(|(path, error)| FailedJob {
                    path: path.clone(),
                    error: error.clone(),
                })
                .collect(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats() -> RunStats {
        RunStats {
            total: 3,
            success_count: 2,
            error_count: 1,
            durations: vec![Duration::from_millis(12), Duration::from_micros(1500)],
            failures: vec![(PathBuf::from("broken.jpg"), "Error decoding".to_string())],
        }
    }

    #[test]
    fn test_render_layout() {
        let report = SummaryReport::new(&stats(), Duration::from_millis(1500));
        assert_eq!(
            report.render(),
            "Summary Report:\n\
             Total images processed: 3\n\
             Successfully processed: 2\n\
             Errors encountered: 1\n\
             Total time taken: 1.5s\n\
             Image 1 processing time: 12ms\n\
             Image 2 processing time: 1.5ms\n"
        );
    }

    #[test]
    fn test_failed_files_are_not_listed() {
        let rendered = SummaryReport::new(&stats(), Duration::from_secs(1)).render();
        assert!(!rendered.contains("broken.jpg"));
    }

    #[test]
    fn test_empty_run() {
        let report = SummaryReport::new(&RunStats::default(), Duration::ZERO);
        assert_eq!(
            report.render(),
            "Summary Report:\n\
             Total images processed: 0\n\
             Successfully processed: 0\n\
             Errors encountered: 0\n\
             Total time taken: 0ns\n"
        );
    }

    #[test]
    fn test_write_to() {
        let dir = TempDir::new().unwrap();
        let report = SummaryReport::new(&stats(), Duration::from_secs(2));

        let path = report.write_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("summary_report.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.render());
    }

    #[test]
    fn test_write_failure_is_report_error() {
        let dir = TempDir::new().unwrap();
        let report = SummaryReport::new(&stats(), Duration::from_secs(2));
        let err = report.write_to(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ThumbnailerError::ReportWrite { .. }));
    }

    #[test]
    fn test_json_summary() {
        let summary = RunSummary::new(&stats(), Duration::from_millis(250), None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["errors"], 1);
        assert_eq!(json["elapsed_secs"], 0.25);
        assert_eq!(json["failures"][0]["path"], "broken.jpg");
        assert_eq!(json["durations_secs"].as_array().unwrap().len(), 2);
    }
}
