//! Output format handling: naming and encoding

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageOutputFormat};
use tracing::debug;

use crate::config::ImageFormat;
use crate::error::{Result, ThumbnailerError};

/// Output location for a source file: `<output_dir>/<stem>.<format>`
///
/// The extension is the configured format name verbatim, so `jpeg`
/// produces `photo.jpeg`.
pub fn output_path_for(source: &Path, output_dir: &Path, format: &str) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .ok_or_else(|| {
            ThumbnailerError::invalid_parameters(format!(
                "Cannot derive output name from {:?}",
                source
            ))
        })?;

    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(format);
    Ok(output_dir.join(file_name))
}

/// Map our format to the image crate's encoder selection
pub fn encoder_format(format: ImageFormat, quality: u8) -> ImageOutputFormat {
    match format {
        ImageFormat::Jpeg => ImageOutputFormat::Jpeg(quality.clamp(1, 100)),
        ImageFormat::Png => ImageOutputFormat::Png,
        ImageFormat::Gif => ImageOutputFormat::Gif,
        ImageFormat::Bmp => ImageOutputFormat::Bmp,
    }
}

/// Encode `image` into `output_path`
pub fn encode_image(
    image: &DynamicImage,
    output_path: &Path,
    format: ImageFormat,
    quality: u8,
) -> Result<()> {
    debug!("Encoding {:?} as {} (quality {})", output_path, format, quality);

    // JPEG has no alpha channel
    let flattened;
    let image = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        flattened = DynamicImage::ImageRgb8(image.to_rgb8());
        &flattened
    } else {
        image
    };

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, encoder_format(format, quality))
        .map_err(|e| ThumbnailerError::encode(e.to_string(), output_path))?;

    Ok(())
}
