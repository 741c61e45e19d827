//! Resampling and target-size calculation

use image::DynamicImage;
use crate::config::ResizeMode;
use crate::error::{Result, ThumbnailerError};
use tracing::debug;

/// Resizer applying a [`ResizeMode`] with a fixed resampling filter
pub struct ImageResizer {
    filter: FilterType,
}

/// Available resize filters
#[derive(Debug, Clone, Copy, Default)]
pub enum FilterType {
    /// Nearest neighbor (fastest, lowest quality)
    Nearest,
    /// Triangle (linear interpolation)
    Triangle,
    /// Lanczos with radius 3
    #[default]
    Lanczos3,
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl ImageResizer {
    /// Create a new resizer using Lanczos3
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    /// Create a resizer with custom filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Resize an image according to the specified mode
    pub fn resize(&self, image: &DynamicImage, mode: &ResizeMode) -> Result<DynamicImage> {
        let (target_width, target_height) =
            calculate_dimensions(image.width(), image.height(), mode)?;

        if target_width == image.width() && target_height == image.height() {
            debug!("No resize needed, {}x{} already matches target", target_width, target_height);
            return Ok(image.clone());
        }

        debug!(
            "Resizing {}x{} -> {}x{} using {:?}",
            image.width(),
            image.height(),
            target_width,
            target_height,
            self.filter
        );

        Ok(image.resize_exact(target_width, target_height, self.filter.into()))
    }
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Output size for a `original_width` x `original_height` source under `mode`
///
/// `Fit` never enlarges an image that already fits inside the bounds;
/// `Width` and `Height` always hit the requested side exactly.
pub fn calculate_dimensions(
    original_width: u32,
    original_height: u32,
    mode: &ResizeMode,
) -> Result<(u32, u32)> {
    if original_width == 0 || original_height == 0 {
        return Err(ThumbnailerError::invalid_parameters(
            "Source image has a zero dimension"
        ));
    }

    match mode {
        ResizeMode::Width { width } => {
            if *width == 0 {
                return Err(ThumbnailerError::invalid_parameters(
                    "Target width is zero"
                ));
            }
            let aspect_ratio = original_height as f64 / original_width as f64;
            let height = (*width as f64 * aspect_ratio).round() as u32;
            Ok((*width, height.max(1)))
        }

        ResizeMode::Height { height } => {
            if *height == 0 {
                return Err(ThumbnailerError::invalid_parameters(
                    "Target height is zero"
                ));
            }
            let aspect_ratio = original_width as f64 / original_height as f64;
            let width = (*height as f64 * aspect_ratio).round() as u32;
            Ok((width.max(1), *height))
        }

        ResizeMode::Fit { width, height } => {
            if *width == 0 || *height == 0 {
                return Err(ThumbnailerError::invalid_parameters(
                    "Fit bounds must both be non-zero"
                ));
            }

            if original_width <= *width && original_height <= *height {
                return Ok((original_width, original_height));
            }

            let original_aspect = original_width as f64 / original_height as f64;
            let target_aspect = *width as f64 / *height as f64;

            if original_aspect > target_aspect {
                // Wider than the box: width is the binding side
                let new_height = (*width as f64 / original_aspect).round() as u32;
                Ok((*width, new_height.max(1)))
            } else {
                let new_width = (*height as f64 * original_aspect).round() as u32;
                Ok((new_width.max(1), *height))
            }
        }
    }
}
