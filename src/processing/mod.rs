//! Core image processing functionality
//!
//! [`Transform`] is the seam the batch engine drives: one call turns one
//! source path into one output file or an error. [`ImagePipeline`] is the
//! production implementation (preprocess, decode, resize, encode).

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::TransformOptions;
use crate::error::{Result, ThumbnailerError};

pub mod formats;
pub mod preprocess;
pub mod resize;

pub use formats::*;
pub use preprocess::*;
pub use resize::*;

/// A single-file conversion. Implementations are called from many worker
/// threads at once and must not share mutable state between calls.
pub trait Transform: Send + Sync {
    /// Convert `path` under `options`, returning the written output path
    fn transform(&self, path: &Path, options: &TransformOptions) -> Result<PathBuf>;
}

/// Decode, resize and re-encode into a flat output directory
pub struct ImagePipeline {
    output_dir: PathBuf,
    resizer: ImageResizer,
    preprocessors: Vec<Box<dyn Preprocessor>>,
}

impl ImagePipeline {
    /// Create a pipeline writing into `output_dir`, with raw-file support
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            resizer: ImageResizer::new(),
            preprocessors: vec![Box::new(ExiftoolPreprocessor::new())],
        }
    }

    /// Register an additional preprocessing stage
    pub fn with_preprocessor<P: Preprocessor + 'static>(mut self, preprocessor: P) -> Self {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Drop every preprocessing stage
    pub fn without_preprocessors(mut self) -> Self {
        self.preprocessors.clear();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn preprocess(&self, path: &Path) -> Result<PathBuf> {
        match self.preprocessors.iter().find(|p| p.handles(path)) {
            Some(preprocessor) => {
                debug!("Preprocessing {:?} with {}", path, preprocessor.name());
                preprocessor.prepare(path)
            }
            None => Ok(path.to_path_buf()),
        }
    }

    fn decode(path: &Path) -> Result<image::DynamicImage> {
        let reader = image::io::Reader::open(path)?.with_guessed_format()?;
        reader
            .decode()
            .map_err(|e| ThumbnailerError::decode(e.to_string(), path))
    }
}

impl Transform for ImagePipeline {
    fn transform(&self, path: &Path, options: &TransformOptions) -> Result<PathBuf> {
        let format = options.output_format()?;
        let source = self.preprocess(path)?;

        let image = Self::decode(&source)?;
        debug!("Decoded {:?}: {}x{}", source, image.width(), image.height());

        let resized = self.resizer.resize(&image, &options.mode)?;

        let output_path = output_path_for(&source, &self.output_dir, &options.format)?;
        encode_image(&resized, &output_path, format, options.quality)?;

        debug!(
            "Wrote {:?} ({}x{})",
            output_path,
            resized.width(),
            resized.height()
        );
        Ok(output_path)
    }
}
