//! Page rasterizer backends

pub mod embedded;
pub mod pdfium;

pub use embedded::EmbeddedRasterizer;
pub use pdfium::PdfiumRasterizer;

use crate::cli::Backend;
use crate::error::CompressError;
use crate::raster::RasterImage;

use super::SourceDocument;

/// Renders every page of a document to pixels
pub trait PageRasterizer {
    /// Rasterize all pages, in order, at `dpi`.
    ///
    /// Each raster is sized by [`SourcePage::pixel_size`](super::SourcePage::pixel_size),
    /// so very large pages come back at a reduced resolution.
    fn rasterize(
        &self,
        document: &SourceDocument,
        dpi: u32,
    ) -> Result<Vec<RasterImage>, CompressError>;
}

/// Create the rasterizer for a backend choice
pub fn rasterizer_for(backend: Backend) -> Result<Box<dyn PageRasterizer>, CompressError> {
    match backend {
        Backend::Embedded => Ok(Box::new(EmbeddedRasterizer::new())),
        Backend::Pdfium => Ok(Box::new(PdfiumRasterizer::new()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_always_available() {
        assert!(rasterizer_for(Backend::Embedded).is_ok());
    }

    #[test]
    fn test_pdfium_loads_or_reports_unavailable() {
        match rasterizer_for(Backend::Pdfium) {
            Ok(_) | Err(CompressError::BackendUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
