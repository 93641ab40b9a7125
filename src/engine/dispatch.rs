use crate::config::SearchSettings;
use crate::error::CompressError;
use crate::model::{CompressionRequest, CompressionResult, EncodedCandidate, MediaType};
use crate::pdf::{rasterizer_for, PageRasterizer};

use super::document_search::DocumentSearch;
use super::image_search::ImageSearch;
use super::pad::pad_to_size;

/// Routes a request to the matching search and pads the result.
///
/// Holds only immutable settings, so one instance can serve concurrent
/// requests from several threads.
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    settings: SearchSettings,
}

impl Compressor {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    /// Shrink (or pad) the request's input to exactly its target size
    pub fn compress(
        &self,
        request: &CompressionRequest,
    ) -> Result<CompressionResult, CompressError> {
        // Inputs that already fit never touch the rasterizer backend
        let oversized = request.input_bytes().len() as u64 > request.target_size_bytes();
        match request.media_type() {
            MediaType::Document if oversized => {
                let rasterizer = rasterizer_for(self.settings.backend)?;
                self.compress_with(request, Some(rasterizer.as_ref()))
            }
            _ => self.compress_with(request, None),
        }
    }

    /// Like [`compress`](Self::compress), with a caller-supplied page rasterizer
    pub fn compress_with(
        &self,
        request: &CompressionRequest,
        rasterizer: Option<&dyn PageRasterizer>,
    ) -> Result<CompressionResult, CompressError> {
        let target = request.target_size_bytes();
        let input = request.input_bytes();

        log::info!(
            "Compressing {} bytes of {} input to exactly {} bytes",
            input.len(),
            request.media_type(),
            target
        );

        let candidate = match request.media_type() {
            MediaType::Image => ImageSearch::new(&self.settings).run(input, target)?,
            MediaType::Document => match rasterizer {
                Some(rasterizer) => {
                    DocumentSearch::new(&self.settings, rasterizer).run(input, target)?
                }
                None if input.len() as u64 <= target => EncodedCandidate::original(input.to_vec()),
                None => {
                    return Err(CompressError::BackendUnavailable(
                        "no page rasterizer supplied".to_string(),
                    ))
                }
            },
        };

        finish(candidate, target)
    }
}

/// Pad a fitting candidate; an oversized one means the search failed
fn finish(candidate: EncodedCandidate, target: u64) -> Result<CompressionResult, CompressError> {
    if !candidate.fits(target) {
        return Err(CompressError::SizeUnreachable {
            target,
            smallest: candidate.size_bytes,
        });
    }

    let padding_bytes = target - candidate.size_bytes;
    let output_bytes = pad_to_size(candidate.bytes, target);

    Ok(CompressionResult {
        final_size_bytes: output_bytes.len() as u64,
        output_bytes,
        padding_bytes,
        quality_param: candidate.quality_param,
        passthrough: candidate.passthrough,
    })
}
