//! Debug tool to see how output size responds to the search knob
//! Run with: cargo run --bin size_probe -- <INPUT> [STEP] [BACKEND]
//!
//! Images print the JPEG size at every quality step; PDFs print the size of
//! the rebuilt document at every DPI step.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::fs;
use std::path::PathBuf;

use sizefit::cli::Backend;
use sizefit::config::{defaults, SearchSettings};
use sizefit::engine::DocumentSearch;
use sizefit::model::MediaType;
use sizefit::pdf::{rasterizer_for, SourceDocument};
use sizefit::raster::RasterImage;

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!("usage: size_probe <INPUT> [STEP] [embedded|pdfium]");
    };
    let step: usize = match args.next() {
        Some(step) => step.parse().context("STEP must be a positive integer")?,
        None => 10,
    };
    if step == 0 {
        bail!("STEP must be a positive integer");
    }
    let backend = match args.next() {
        Some(name) => Backend::from_str(&name, true).map_err(anyhow::Error::msg)?,
        None => Backend::default(),
    };

    let bytes =
        fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    println!("{}: {} bytes", input.display(), bytes.len());

    match MediaType::from_path(&input)? {
        MediaType::Image => {
            let image = RasterImage::decode(&bytes)?;
            println!("{}x{} pixels", image.width(), image.height());
            println!("{:>8} {:>12}", "quality", "bytes");
            for quality in (defaults::MIN_QUALITY..=defaults::MAX_QUALITY).step_by(step) {
                let jpeg = image.encode_jpeg(quality)?;
                println!("{:>8} {:>12}", quality, jpeg.len());
            }
        }
        MediaType::Document => {
            let settings = SearchSettings::default().with_backend(backend);
            let rasterizer = rasterizer_for(settings.backend)?;
            let search = DocumentSearch::new(&settings, rasterizer.as_ref());
            let source = SourceDocument::load(&bytes)?;
            println!("{} pages", source.page_count());
            println!("{:>8} {:>12}", "dpi", "bytes");
            for dpi in (defaults::DPI_FLOOR..=defaults::MAX_DPI).step_by(step) {
                let candidate = search.rebuild(&source, dpi)?;
                println!("{:>8} {:>12}", dpi, candidate.size_bytes);
            }
        }
    }

    Ok(())
}
