//! # Convert Module
//!
//! Archival TIFF conversion.
//!
//! The primary path decodes by content (field archives are full of
//! mislabeled extensions), normalizes to RGB, and encodes TIFF. When the
//! standard decode fails for a JPEG source, one repair retry decodes
//! leniently with zune-jpeg, which tolerates truncated scans and junk
//! trailers, then re-encodes. A second failure is the record's
//! conversion error.

use crate::error::ProcessError;
use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader, Rgb};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Converts one source image into an archival TIFF at `target`.
///
/// The trait is the pipeline's seam: tests substitute a fake to exercise
/// failure handling without needing broken images on disk.
pub trait ImageConverter: Send + Sync {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ProcessError>;
}

/// Production converter built on the image crate with a zune-jpeg repair
/// retry.
pub struct TiffConverter;

impl TiffConverter {
    pub fn new() -> Self {
        Self
    }

    fn decode(source: &Path) -> Result<DynamicImage, ProcessError> {
        let reader = ImageReader::open(source)
            .map_err(|e| ProcessError::Io {
                path: source.to_path_buf(),
                source: e,
            })?
            .with_guessed_format()
            .map_err(|e| ProcessError::Io {
                path: source.to_path_buf(),
                source: e,
            })?;

        reader.decode().map_err(|e| ProcessError::Conversion {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Lenient JPEG decode for damaged sources.
    fn repair_decode(source: &Path) -> Result<DynamicImage, ProcessError> {
        let bytes = fs::read(source).map_err(|e| ProcessError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&bytes, options);

        let pixels = decoder.decode().map_err(|e| ProcessError::Conversion {
            path: source.to_path_buf(),
            reason: format!("lenient decode failed: {e:?}"),
        })?;

        let info = decoder.info().ok_or_else(|| ProcessError::Conversion {
            path: source.to_path_buf(),
            reason: "lenient decode produced no image info".to_string(),
        })?;

        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(info.width as u32, info.height as u32, pixels).ok_or_else(
                || ProcessError::Conversion {
                    path: source.to_path_buf(),
                    reason: "lenient decode produced a short pixel buffer".to_string(),
                },
            )?;

        Ok(DynamicImage::ImageRgb8(buffer))
    }

    fn is_jpeg(source: &Path) -> bool {
        matches!(
            source
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .as_deref(),
            Some("jpg" | "jpeg")
        )
    }
}

impl Default for TiffConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageConverter for TiffConverter {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ProcessError> {
        let image = match Self::decode(source) {
            Ok(image) => image,
            Err(first) if Self::is_jpeg(source) => {
                warn!(
                    source = %source.display(),
                    "standard decode failed ({first}), retrying leniently"
                );
                Self::repair_decode(source)?
            }
            Err(first) => return Err(first),
        };

        // TIFF encoding wants a plain RGB8 buffer
        let rgb = image.to_rgb8();
        rgb.save_with_format(target, ImageFormat::Tiff)
            .map_err(|e| ProcessError::Conversion {
                path: source.to_path_buf(),
                reason: format!("TIFF encode failed: {e}"),
            })?;

        debug!(source = %source.display(), target = %target.display(), "converted to TIFF");
        Ok(())
    }
}
