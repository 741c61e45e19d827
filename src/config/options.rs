//! Per-run transform options: resize mode, output format and quality

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use crate::error::{Result, ThumbnailerError};

/// How a source image is scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResizeMode {
    /// Fit within both bounds, keeping aspect ratio
    #[serde(rename = "fit")]
    Fit { width: u32, height: u32 },

    /// Resize to an exact width, height follows the aspect ratio
    #[serde(rename = "width")]
    Width { width: u32 },

    /// Resize to an exact height, width follows the aspect ratio
    #[serde(rename = "height")]
    Height { height: u32 },
}

impl ResizeMode {
    /// Pick the mode from the configured maximum dimensions.
    ///
    /// A zero dimension means "unconstrained"; at least one must be positive.
    pub fn from_bounds(max_width: u32, max_height: u32) -> Result<Self> {
        match (max_width, max_height) {
            (0, 0) => Err(ThumbnailerError::config(
                "Either max width or max height must be specified",
            )),
            (width, 0) => Ok(Self::Width { width }),
            (0, height) => Ok(Self::Height { height }),
            (width, height) => Ok(Self::Fit { width, height }),
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [Self::Jpeg, Self::Png, Self::Gif, Self::Bmp];

    /// Name as accepted on the command line and used as file extension
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// Whether the quality setting has any effect
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = ThumbnailerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| ThumbnailerError::unsupported_format(s))
    }
}

/// Transform options shared by every job of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub mode: ResizeMode,
    /// Output format as configured; resolved per job so an unknown
    /// value fails each job rather than the run
    pub format: String,
    /// Quality 1-100, only used by lossy encoders
    pub quality: u8,
}

impl TransformOptions {
    pub fn new<S: Into<String>>(
        max_width: u32,
        max_height: u32,
        format: S,
        quality: u8,
    ) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(ThumbnailerError::config(format!(
                "Compression level must be between 1 and 100, got {}",
                quality
            )));
        }

        Ok(Self {
            max_width,
            max_height,
            mode: ResizeMode::from_bounds(max_width, max_height)?,
            format: format.into(),
            quality,
        })
    }

    /// Resolve the configured format string
    pub fn output_format(&self) -> Result<ImageFormat> {
        self.format.parse()
    }
}
