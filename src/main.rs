use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::Path;

use sizefit::cli::Args;
use sizefit::config::SearchSettings;
use sizefit::engine::Compressor;
use sizefit::model::{CompressionRequest, MediaType};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let media_type = match args.media_type {
        Some(media_type) => MediaType::from(media_type),
        None => MediaType::from_path(&args.input)?,
    };

    // Build settings from CLI args
    let settings = SearchSettings::from_args(&args);
    settings.validate().context("Invalid search settings")?;

    // Read input file
    let input = fs::read(&args.input)
        .with_context(|| format!("Failed to read input file: {}", args.input.display()))?;

    log::info!(
        "Read {} bytes from {} ({})",
        input.len(),
        args.input.display(),
        media_type
    );

    let request = CompressionRequest::new(input, media_type, args.target)?;
    let result = Compressor::new(settings)
        .compress(&request)
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    // Write output
    let output_path = args.output_path();
    write_atomically(&output_path, &result.output_bytes)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;

    let knob = if result.passthrough {
        "original kept".to_string()
    } else {
        match media_type {
            MediaType::Image => format!("JPEG quality {}", result.quality_param),
            MediaType::Document => format!("{} dpi", result.quality_param),
        }
    };
    println!(
        "Wrote {} bytes to {} ({}, {} padding bytes)",
        result.final_size_bytes,
        output_path.display(),
        knob,
        result.padding_bytes
    );

    Ok(())
}

/// Write through a uniquely named temp file in the destination directory, then rename
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}
