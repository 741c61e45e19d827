//! Error types and handling for Thumbnailer

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for Thumbnailer operations
pub type Result<T> = std::result::Result<T, ThumbnailerError>;

/// Main error type for Thumbnailer operations
#[derive(Debug, Error)]
pub enum ThumbnailerError {
    /// I/O related errors (missing source, unwritable output, ...)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Errors raised by the image crate outside of decode/encode
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Invalid run configuration
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// External conversion of a non-native source encoding failed
    #[error("Preprocessing failed: {message} (file: {file:?})")]
    Preprocessing { message: String, file: PathBuf },

    /// Source could not be decoded
    #[error("Error decoding image file {file:?}: {message}")]
    Decode { message: String, file: PathBuf },

    /// Output could not be encoded or saved
    #[error("Error saving image {file:?}: {message}")]
    Encode { message: String, file: PathBuf },

    /// Output format is not one of the supported set
    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    /// Invalid resize parameters
    #[error("Invalid resize parameters: {message}")]
    InvalidParameters { message: String },

    /// The summary report could not be written
    #[error("Error writing summary report {file:?}: {source}")]
    ReportWrite {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker task died before reporting an outcome
    #[error("Worker task failed: {message}")]
    Task { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),
}

impl ThumbnailerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn preprocessing<S: Into<String>>(message: S, file: &Path) -> Self {
        Self::Preprocessing {
            message: message.into(),
            file: file.to_path_buf(),
        }
    }

    pub fn decode<S: Into<String>>(message: S, file: &Path) -> Self {
        Self::Decode {
            message: message.into(),
            file: file.to_path_buf(),
        }
    }

    pub fn encode<S: Into<String>>(message: S, file: &Path) -> Self {
        Self::Encode {
            message: message.into(),
            file: file.to_path_buf(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    pub fn report_write(file: PathBuf, source: std::io::Error) -> Self {
        Self::ReportWrite { file, source }
    }

    pub fn task<S: Into<String>>(message: S) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Setup errors abort the run before any job starts
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::ConfigError { .. } | Self::SerdeError(_))
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Only used to word log lines: the retry policy counts attempts and
    /// never skips one based on the error kind.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UnsupportedFormat { .. }
            | Self::InvalidParameters { .. }
            | Self::ConfigError { .. }
            | Self::SerdeError(_) => false,

            Self::IoError(_)
            | Self::ImageError(_)
            | Self::Preprocessing { .. }
            | Self::Decode { .. }
            | Self::Encode { .. }
            | Self::ReportWrite { .. }
            | Self::Task { .. } => true,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Preprocessing { file, .. }
            | Self::Decode { file, .. }
            | Self::Encode { file, .. }
            | Self::ReportWrite { file, .. } => Some(file),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ThumbnailerError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ThumbnailerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

impl From<serde_json::Error> for ThumbnailerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeError(format!("JSON parsing error: {}", err))
    }
}
