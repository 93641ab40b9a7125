pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod pdf;
pub mod raster;

pub use cli::Backend;
pub use config::SearchSettings;
pub use engine::{pad_to_size, Compressor};
pub use error::{CompressError, ConfigError};
pub use model::{CompressionRequest, CompressionResult, EncodedCandidate, MediaType};
pub use raster::RasterImage;

/// High-level API: shrink (or pad) a file to exactly `target_size_bytes`.
///
/// This is the recommended entry point for library consumers. Images are
/// re-encoded as JPEG at the highest quality that fits; PDFs are rasterized
/// page by page at the highest DPI that fits. The result is zero-padded to
/// the exact target.
///
/// PDFs are rendered with PDFium, which must be loadable at runtime; use
/// [`Compressor`] with [`Backend::Embedded`] for image-only documents on
/// systems without it.
///
/// # Arguments
///
/// * `input` - Raw file contents
/// * `media_type` - Usually from [`MediaType::from_extension`] or
///   [`MediaType::from_content_type`]
/// * `target_size_bytes` - Exact output length, at least one byte
///
/// # Returns
///
/// Output bytes whose length is exactly `target_size_bytes`, or a
/// [`CompressError`] telling bad input apart from an infeasible target.
///
/// # Example
///
/// ```no_run
/// use sizefit::{compress_to_size, MediaType};
///
/// let input = std::fs::read("scan.pdf").unwrap();
/// let output = compress_to_size(input, MediaType::from_extension("pdf").unwrap(), 150 * 1024)
///     .unwrap();
///
/// assert_eq!(output.len(), 150 * 1024);
/// std::fs::write("scan_compressed.pdf", output).unwrap();
/// ```
pub fn compress_to_size(
    input: Vec<u8>,
    media_type: MediaType,
    target_size_bytes: u64,
) -> Result<Vec<u8>, CompressError> {
    let request = CompressionRequest::new(input, media_type, target_size_bytes)?;
    let result = Compressor::default().compress(&request)?;
    Ok(result.output_bytes)
}
