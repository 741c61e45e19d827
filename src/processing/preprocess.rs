//! Preprocessing stage for source encodings the decoder cannot read
//!
//! A [`Preprocessor`] claims certain inputs and materializes a decodable
//! intermediate file for them. Intermediates are left next to the source
//! and are not cleaned up, even when the external tool fails halfway.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Result, ThumbnailerError};

/// Converts a source file into something the standard decode path accepts
pub trait Preprocessor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this preprocessor must run for `path`
    fn handles(&self, path: &Path) -> bool;

    /// Produce the intermediate file and return its path
    fn prepare(&self, path: &Path) -> Result<PathBuf>;
}

/// Extracts the embedded full-size JPEG from camera raw files with `exiftool`
pub struct ExiftoolPreprocessor {
    program: PathBuf,
    extensions: Vec<String>,
}

impl ExiftoolPreprocessor {
    /// Handle Canon CR3 files using `exiftool` from `PATH`
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("exiftool"),
            extensions: vec!["cr3".to_string()],
        }
    }

    /// Use a specific exiftool binary
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Intermediate written by `-w jpg`: same directory and stem, `.jpg` extension
    pub fn intermediate_path(path: &Path) -> PathBuf {
        path.with_extension("jpg")
    }
}

impl Default for ExiftoolPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for ExiftoolPreprocessor {
    fn name(&self) -> &str {
        "exiftool"
    }

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn prepare(&self, path: &Path) -> Result<PathBuf> {
        debug!("Extracting embedded JPEG from {:?} with {:?}", path, self.program);

        let output = Command::new(&self.program)
            .args(["-b", "-JpgFromRaw", "-w", "jpg"])
            .arg(path)
            .output()
            .map_err(|e| {
                ThumbnailerError::preprocessing(
                    format!("failed to run {:?}: {}", self.program, e),
                    path,
                )
            })?;

        if !output.status.success() {
            return Err(ThumbnailerError::preprocessing(
                format!(
                    "{:?} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                path,
            ));
        }

        let intermediate = Self::intermediate_path(path);
        if !intermediate.is_file() {
            return Err(ThumbnailerError::preprocessing(
                format!("no embedded JPEG written to {:?}", intermediate),
                path,
            ));
        }

        Ok(intermediate)
    }
}
