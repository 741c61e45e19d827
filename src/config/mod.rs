//! Run configuration for Thumbnailer
//!
//! A [`Config`] is assembled once per run (defaults, then an optional
//! config file, then explicit command-line overrides), validated, and then
//! handed out immutably to the batch runner and transform pipeline.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ThumbnailerError};
use crate::parallel::{ConcurrencyLimit, RetryPolicy};

pub mod options;
pub use options::*;

/// Default JPEG compression level
pub const DEFAULT_COMPRESSION: u8 = 75;

/// Default output format
pub const DEFAULT_FORMAT: &str = "jpeg";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input file or directory tree
    pub input: Option<PathBuf>,

    /// Flat output directory for thumbnails and the summary report
    pub output: Option<PathBuf>,

    /// Compression level (1-100), lossy formats only
    pub compression: u8,

    /// Maximum width (0 = unconstrained)
    pub width: u32,

    /// Maximum height (0 = unconstrained)
    pub height: u32,

    /// Output format name
    pub format: String,

    /// Number of jobs allowed in flight at once
    pub parallelism: usize,

    /// Attempts per job before it is counted as failed
    pub retries: u32,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            compression: DEFAULT_COMPRESSION,
            width: 0,
            height: 0,
            format: DEFAULT_FORMAT.to_string(),
            parallelism: num_cpus::get(),
            retries: RetryPolicy::default().max_attempts(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,

    /// Log file appended to alongside stdout (None = stdout only)
    pub file: Option<PathBuf>,

    /// Also write log lines to stdout
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: Some(PathBuf::from("processing.log")),
            console: true,
        }
    }
}

/// Values given explicitly on the command line; each one wins over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub compression: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub parallelism: Option<usize>,
    pub retries: Option<u32>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a `.json`, `.toml` or `.yaml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| {
                ThumbnailerError::config(format!(
                    "Failed to read config file {:?}: {}",
                    path.as_ref(),
                    e
                ))
            })?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content).map_err(Into::into),
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ThumbnailerError::config(
                "Unsupported config file format. Use .json, .toml or .yaml"
            )),
        }
    }

    /// Apply command-line values on top of this configuration
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if overrides.input.is_some() {
            self.input = overrides.input;
        }
        if overrides.output.is_some() {
            self.output = overrides.output;
        }
        if let Some(compression) = overrides.compression {
            self.compression = compression;
        }
        if let Some(width) = overrides.width {
            self.width = width;
        }
        if let Some(height) = overrides.height {
            self.height = height;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(parallelism) = overrides.parallelism {
            self.parallelism = parallelism;
        }
        if let Some(retries) = overrides.retries {
            self.retries = retries;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.log_file.is_some() {
            self.logging.file = overrides.log_file;
        }
        self
    }

    /// Validate configuration; every error here is fatal before any job runs
    pub fn validate(&self) -> Result<()> {
        self.input_path()?;
        self.output_dir()?;
        self.transform_options()?;
        self.concurrency_limit()?;
        self.retry_policy()?;

        if self.format.parse::<ImageFormat>().is_err() {
            warn!(
                "Output format '{}' is not one of jpeg, png, gif, bmp; every image will fail",
                self.format
            );
        }

        Ok(())
    }

    pub fn input_path(&self) -> Result<&Path> {
        self.input
            .as_deref()
            .ok_or_else(|| ThumbnailerError::config("Input path is required"))
    }

    pub fn output_dir(&self) -> Result<&Path> {
        self.output
            .as_deref()
            .ok_or_else(|| ThumbnailerError::config("Output path is required"))
    }

    pub fn transform_options(&self) -> Result<TransformOptions> {
        TransformOptions::new(self.width, self.height, self.format.clone(), self.compression)
    }

    pub fn concurrency_limit(&self) -> Result<ConcurrencyLimit> {
        ConcurrencyLimit::new(self.parallelism)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(self.retries)
    }
}
