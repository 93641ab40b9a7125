//! Raster quality search
//!
//! Bisects the JPEG quality of a single image toward the target size, then
//! falls back to downscaling when even the lowest quality is too large.

use crate::config::SearchSettings;
use crate::error::CompressError;
use crate::model::EncodedCandidate;
use crate::raster::RasterImage;

use super::bisect::bisect;

/// Size search for single raster images
pub struct ImageSearch<'a> {
    settings: &'a SearchSettings,
}

impl<'a> ImageSearch<'a> {
    pub fn new(settings: &'a SearchSettings) -> Self {
        Self { settings }
    }

    /// Shrink encoded image bytes to at most `target` bytes.
    ///
    /// Input that already fits is returned untouched without being decoded.
    pub fn run(&self, input: &[u8], target: u64) -> Result<EncodedCandidate, CompressError> {
        if input.len() as u64 <= target {
            log::info!(
                "Image is already {} bytes (target {}), keeping original",
                input.len(),
                target
            );
            return Ok(EncodedCandidate::original(input.to_vec()));
        }

        let image = RasterImage::decode(input)?;
        log::info!(
            "Decoded {}x{} image, {} bytes over target",
            image.width(),
            image.height(),
            input.len() as u64 - target
        );
        self.search(&image, target)
    }

    /// Find the highest-fidelity JPEG encoding of `image` within `target` bytes
    pub fn search(
        &self,
        image: &RasterImage,
        target: u64,
    ) -> Result<EncodedCandidate, CompressError> {
        let s = self.settings;

        let bisection = bisect(
            s.min_quality as u32,
            s.max_quality as u32,
            s.quality_probes,
            target,
            |quality| Ok(EncodedCandidate::new(image.encode_jpeg(quality as u8)?, quality)),
        )?;

        let candidate = match bisection.best {
            Some(best) => {
                log::info!(
                    "Quality search settled on q={} ({} bytes) after {} probes",
                    best.quality_param,
                    best.size_bytes,
                    bisection.probes
                );
                return Ok(best);
            }
            None => EncodedCandidate::new(
                image.encode_jpeg(s.min_quality)?,
                s.min_quality as u32,
            ),
        };

        log::info!(
            "Lowest quality still gives {} bytes (target {}), downscaling",
            candidate.size_bytes,
            target
        );
        self.downscale(image, candidate, target)
    }

    /// Resize toward the target, then shrink repeatedly at low quality.
    ///
    /// Fails with `SizeUnreachable` once the image is at the minimum dimension
    /// and still too large.
    fn downscale(
        &self,
        image: &RasterImage,
        mut candidate: EncodedCandidate,
        target: u64,
    ) -> Result<EncodedCandidate, CompressError> {
        let s = self.settings;
        let quality = candidate.quality_param as u8;

        let factor = (target as f64 / candidate.size_bytes as f64).sqrt() * s.downscale_margin;
        let width = (image.width() as f64 * factor).floor() as u32;
        let height = (image.height() as f64 * factor).floor() as u32;

        let mut working = if width > 0 && height > 0 {
            let resized = image.resized(width, height);
            candidate = EncodedCandidate::new(resized.encode_jpeg(quality)?, quality as u32);
            log::debug!(
                "Downscaled to {}x{} -> {} bytes",
                width,
                height,
                candidate.size_bytes
            );
            resized
        } else {
            image.clone()
        };

        while !candidate.fits(target) {
            let (width, height) = working.scaled_dimensions(s.shrink_factor, s.min_dimension);
            if (width, height) == (working.width(), working.height()) {
                log::warn!(
                    "Image is at {}x{} and still {} bytes, target {} is unreachable",
                    width,
                    height,
                    candidate.size_bytes,
                    target
                );
                return Err(CompressError::SizeUnreachable {
                    target,
                    smallest: candidate.size_bytes,
                });
            }

            working = working.resized(width, height);
            candidate = EncodedCandidate::new(
                working.encode_jpeg(s.shrink_quality)?,
                s.shrink_quality as u32,
            );
            log::debug!(
                "Shrunk to {}x{} at q={} -> {} bytes",
                width,
                height,
                s.shrink_quality,
                candidate.size_bytes
            );
        }

        log::info!(
            "Fallback produced {}x{} at q={} ({} bytes)",
            working.width(),
            working.height(),
            candidate.quality_param,
            candidate.size_bytes
        );
        Ok(candidate)
    }
}
