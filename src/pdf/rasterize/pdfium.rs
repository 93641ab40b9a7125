//! PDFium-backed rasterizer
//!
//! Renders text, vector art and images exactly as a viewer would. PDFium is
//! bound at runtime, from the directory named by `PDFIUM_DYNAMIC_LIB_PATH` or
//! else from the system library path.

use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;

use crate::error::CompressError;
use crate::pdf::SourceDocument;
use crate::raster::RasterImage;

use super::PageRasterizer;

/// Directory holding the PDFium shared library
const LIBRARY_DIR_VAR: &str = "PDFIUM_DYNAMIC_LIB_PATH";

pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind to the PDFium library
    pub fn new() -> Result<Self, CompressError> {
        let bindings = match std::env::var_os(LIBRARY_DIR_VAR) {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| {
            CompressError::BackendUnavailable(format!(
                "PDFium library not found ({}); install it or set {}",
                e, LIBRARY_DIR_VAR
            ))
        })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        document: &SourceDocument,
        dpi: u32,
    ) -> Result<Vec<RasterImage>, CompressError> {
        let pdf = self
            .pdfium
            .load_pdf_from_byte_slice(document.bytes(), None)
            .map_err(|e| CompressError::DecodeFailure(format!("PDFium: {}", e)))?;

        let mut rendered = Vec::with_capacity(document.page_count());
        for (page, source_page) in pdf.pages().iter().zip(document.pages()) {
            // PDFium sizes pages in default user units and applies /Rotate itself
            let scale = source_page.render_scale(dpi) * source_page.user_unit;
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);

            let bitmap = page.render_with_config(&config).map_err(|e| {
                CompressError::DecodeFailure(format!("PDFium page {}: {}", source_page.number, e))
            })?;
            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
                CompressError::DecodeFailure(format!(
                    "PDFium page {} returned a short bitmap",
                    source_page.number
                ))
            })?;
            rendered.push(RasterImage::from_dynamic(DynamicImage::ImageRgba8(rgba)));
        }

        log::debug!("PDFium rendered {} pages at {} dpi", rendered.len(), dpi);
        Ok(rendered)
    }
}
