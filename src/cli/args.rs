use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::model::MediaType;

#[derive(Parser, Debug)]
#[command(name = "sizefit")]
#[command(
    author,
    version,
    about = "Shrink or pad an image or PDF so the output is exactly the requested size"
)]
pub struct Args {
    /// Input file path (PDF, JPG, PNG, or WEBP)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Target size: bytes, or a number with a K/KB/KiB or M/MB/MiB suffix
    #[arg(short, long, value_parser = parse_size)]
    pub target: u64,

    /// Output file path (defaults to <input>_compressed.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Treat the input as this media type instead of detecting it from the extension
    #[arg(short = 'm', long, value_enum)]
    pub media_type: Option<MediaTypeArg>,

    /// Page rasterizer used for PDF input
    #[arg(short = 'b', long, value_enum)]
    pub backend: Option<Backend>,

    /// Lowest DPI probed when rasterizing PDF pages
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1200))]
    pub min_dpi: Option<u32>,

    /// Highest DPI probed when rasterizing PDF pages
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1200))]
    pub max_dpi: Option<u32>,

    /// JPEG quality of rasterized PDF pages (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub page_quality: Option<u8>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Media type override
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MediaTypeArg {
    /// Single raster image
    Image,
    /// Multi-page PDF document
    Document,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Image => MediaType::Image,
            MediaTypeArg::Document => MediaType::Document,
        }
    }
}

/// Page rasterizer backend
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Built-in renderer for image-only (scanned) documents; refuses pages with text or vector art
    Embedded,
    /// PDFium renderer (needs a PDFium library, see PDFIUM_DYNAMIC_LIB_PATH)
    #[default]
    Pdfium,
}

impl Args {
    /// Get the output path, defaulting to `<stem>_compressed.<ext>` next to the input
    pub fn output_path(&self) -> PathBuf {
        if let Some(ref output) = self.output {
            return output.clone();
        }

        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let name = match self.input.extension() {
            Some(ext) => format!("{}_compressed.{}", stem, ext.to_string_lossy()),
            None => format!("{}_compressed", stem),
        };
        self.input.with_file_name(name)
    }
}

/// Parse a size specification such as "102400", "100KB", "1.5M" or "2MiB".
///
/// Suffixes are 1024-based and case-insensitive. The result must be at least
/// one byte.
pub fn parse_size(spec: &str) -> Result<u64, ConfigError> {
    let spec = spec.trim();
    let split = spec
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(spec.len());
    let (number, suffix) = spec.split_at(split);

    let multiplier: u64 = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        other => {
            return Err(ConfigError::InvalidSize(format!(
                "unknown unit '{}' in '{}'",
                other, spec
            )))
        }
    };

    let value: f64 = number
        .parse()
        .map_err(|_| ConfigError::InvalidSize(format!("invalid number in '{}'", spec)))?;

    let bytes = (value * multiplier as f64).floor();
    if !bytes.is_finite() || bytes < 1.0 {
        return Err(ConfigError::InvalidSize(format!(
            "'{}' must be at least one byte",
            spec
        )));
    }

    Ok(bytes as u64)
}
