//! Document rasterization search
//!
//! Vector content has no single size knob, so every page is rasterized and
//! re-encoded as JPEG. Output size then becomes a function of one parameter,
//! the rendering DPI, which is bisected toward the target.

use crate::config::SearchSettings;
use crate::error::CompressError;
use crate::model::EncodedCandidate;
use crate::pdf::{assemble_pdf, PageImage, PageRasterizer, SourceDocument};

use super::bisect::bisect;

/// Size search for PDF documents
pub struct DocumentSearch<'a> {
    settings: &'a SearchSettings,
    rasterizer: &'a dyn PageRasterizer,
}

impl<'a> DocumentSearch<'a> {
    pub fn new(settings: &'a SearchSettings, rasterizer: &'a dyn PageRasterizer) -> Self {
        Self {
            settings,
            rasterizer,
        }
    }

    /// Shrink PDF bytes to at most `target` bytes.
    ///
    /// Input that already fits is returned untouched without being parsed.
    pub fn run(&self, input: &[u8], target: u64) -> Result<EncodedCandidate, CompressError> {
        if input.len() as u64 <= target {
            log::info!(
                "Document is already {} bytes (target {}), keeping original",
                input.len(),
                target
            );
            return Ok(EncodedCandidate::original(input.to_vec()));
        }

        let source = SourceDocument::load(input)?;
        log::info!(
            "Rasterizing {}-page document, {} bytes over target",
            source.page_count(),
            input.len() as u64 - target
        );
        self.search(&source, target)
    }

    /// Find the highest DPI whose rebuilt document fits in `target` bytes
    pub fn search(
        &self,
        source: &SourceDocument,
        target: u64,
    ) -> Result<EncodedCandidate, CompressError> {
        let s = self.settings;

        let bisection = bisect(s.min_dpi, s.max_dpi, s.dpi_probes, target, |dpi| {
            self.rebuild(source, dpi)
        })?;

        let mut candidate = match bisection.best {
            Some(best) => {
                log::info!(
                    "DPI search settled on {} dpi ({} bytes) after {} probes",
                    best.quality_param,
                    best.size_bytes,
                    bisection.probes
                );
                return Ok(best);
            }
            None => self.rebuild(source, s.min_dpi)?,
        };

        log::info!(
            "{} dpi still gives {} bytes (target {}), lowering DPI",
            candidate.quality_param,
            candidate.size_bytes,
            target
        );

        let mut dpi = candidate.quality_param;
        while !candidate.fits(target) && dpi > s.dpi_floor {
            dpi = ((dpi as f64 * s.dpi_shrink_factor).floor() as u32).max(s.dpi_floor);
            candidate = self.rebuild(source, dpi)?;
        }

        if !candidate.fits(target) {
            log::warn!(
                "Document is {} bytes at the {} dpi floor, target {} is unreachable",
                candidate.size_bytes,
                dpi,
                target
            );
            return Err(CompressError::SizeUnreachable {
                target,
                smallest: candidate.size_bytes,
            });
        }

        Ok(candidate)
    }

    /// Rasterize every page at `dpi` and reassemble an image-only PDF
    pub fn rebuild(
        &self,
        source: &SourceDocument,
        dpi: u32,
    ) -> Result<EncodedCandidate, CompressError> {
        let rasters = self.rasterizer.rasterize(source, dpi)?;
        if rasters.len() != source.page_count() {
            return Err(CompressError::DecodeFailure(format!(
                "rasterizer produced {} pages for a {}-page document",
                rasters.len(),
                source.page_count()
            )));
        }

        let pages = rasters
            .iter()
            .zip(source.pages())
            .map(|(raster, page)| {
                let (width_pt, height_pt) = page.display_size();
                Ok(PageImage {
                    jpeg: raster.encode_jpeg(self.settings.page_quality)?,
                    width_px: raster.width(),
                    height_px: raster.height(),
                    width_pt,
                    height_pt,
                })
            })
            .collect::<Result<Vec<_>, CompressError>>()?;

        let bytes = assemble_pdf(&pages)?;
        log::debug!(
            "Rebuilt {} pages at {} dpi -> {} bytes",
            pages.len(),
            dpi,
            bytes.len()
        );
        Ok(EncodedCandidate::new(bytes, dpi))
    }
}
