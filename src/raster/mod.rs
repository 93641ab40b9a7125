//! Decoded pixel buffers and the lossy JPEG encoder
//!
//! Every image is flattened to 8-bit RGB on the way in, so palette, alpha,
//! grayscale and 16-bit inputs all go through the same encoder path.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::error::CompressError;

/// Decoded RGB pixel buffer owned by a single search
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
}

impl RasterImage {
    /// Decode any supported raster format (JPG, PNG, WEBP)
    pub fn decode(bytes: &[u8]) -> Result<Self, CompressError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| CompressError::DecodeFailure(e.to_string()))?;
        Ok(Self::from_dynamic(decoded))
    }

    /// Flatten a decoded image to three channels
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let pixels = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
        Self { pixels }
    }

    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Encode as baseline JPEG at the given quality (1-100)
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CompressError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(CompressError::EncodeFailure(format!(
                "cannot encode a {}x{} image",
                self.width(),
                self.height()
            )));
        }

        let mut out = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            encoder
                .encode_image(&self.pixels)
                .map_err(|e| CompressError::EncodeFailure(e.to_string()))?;
        }
        Ok(out)
    }

    /// Resample to exact dimensions with a Lanczos filter
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let pixels = image::imageops::resize(&self.pixels, width, height, FilterType::Lanczos3);
        Self { pixels }
    }

    /// Scale both dimensions by `factor`, flooring and clamping at `min_dimension`
    pub fn scaled_dimensions(&self, factor: f64, min_dimension: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * factor).floor() as u32).max(min_dimension);
        (scale(self.width()), scale(self.height()))
    }
}
