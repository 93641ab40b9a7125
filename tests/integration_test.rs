use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use image::{ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use sizefit::pdf::rasterizer_for;
use sizefit::{
    compress_to_size, Backend, CompressError, CompressionRequest, Compressor, MediaType,
    SearchSettings,
};

fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out.into_inner()
}

fn solid_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(&RgbImage::from_pixel(width, height, Rgb([40, 120, 200])))
}

/// Photo-like noise that PNG cannot compress much
fn noisy_png(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed | 1;
    png_bytes(&RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    }))
}

/// Single Letter page of uncompressed text, larger than `min_len` bytes
fn text_pdf(min_len: usize) -> Vec<u8> {
    let mut content = String::new();
    let mut line = 0;
    while content.len() < min_len {
        content.push_str(&format!(
            "BT /F1 10 Tf 36 {} Td (Line {} of a long report that only exists to be large) Tj ET\n",
            760 - (line % 70) * 10,
            line
        ));
        line += 1;
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1_i64,
            "Kids" => vec![Object::Reference(page_id)],
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("Failed to save PDF fixture");
    out
}

/// Cut the zero padding after the last end-of-file marker.
///
/// Viewers ignore bytes after `%%EOF`, but lopdf only searches the tail of the
/// file for `startxref`, so padded output has to be trimmed before lopdf can
/// parse it. The padded length itself is checked separately.
fn strip_pdf_padding(bytes: &[u8]) -> &[u8] {
    let marker = b"%%EOF";
    let end = bytes
        .windows(marker.len())
        .rposition(|w| w == marker)
        .expect("PDF has no %%EOF marker");
    &bytes[..end + marker.len()]
}

#[test]
fn test_solid_image_hits_exact_target() {
    let input = solid_png(1000, 1000);
    let target = 100 * 1024;

    let output = compress_to_size(input, MediaType::Image, target).expect("Failed to compress");

    assert_eq!(output.len() as u64, target);
}

#[test]
fn test_noisy_image_is_reencoded_as_jpeg() {
    let input = noisy_png(400, 400, 7);
    let target = 60 * 1024;
    assert!(input.len() as u64 > target);

    let request = CompressionRequest::new(input, MediaType::Image, target).unwrap();
    let result = Compressor::default().compress(&request).expect("Failed to compress");

    assert!(!result.passthrough);
    assert_eq!(result.output_bytes.len() as u64, target);
    assert_eq!(result.final_size_bytes, target);
    assert!(result.quality_param >= 1 && result.quality_param <= 100);
    assert_eq!(&result.output_bytes[..2], &[0xFF_u8, 0xD8]);

    // Padding is all zeros and never overlaps the encoded image
    let encoded_len = (target - result.padding_bytes) as usize;
    assert!(result.output_bytes[encoded_len..].iter().all(|&b| b == 0));
    assert_eq!(
        image::guess_format(&result.output_bytes[..encoded_len]).unwrap(),
        ImageFormat::Jpeg
    );
}

/// The default backend needs a PDFium library at runtime
fn pdfium_available() -> bool {
    match rasterizer_for(Backend::Pdfium) {
        Ok(_) => true,
        Err(err) => {
            eprintln!("skipping: {}", err);
            false
        }
    }
}

#[test]
fn test_text_pdf_becomes_single_image_page() {
    if !pdfium_available() {
        return;
    }
    let input = text_pdf(200 * 1024);
    let target = 150 * 1024;
    assert!(input.len() as u64 > target);

    let output =
        compress_to_size(input, MediaType::Document, target).expect("Failed to compress PDF");
    assert_eq!(output.len() as u64, target);
    assert!(output.starts_with(b"%PDF"));

    let doc = Document::load_mem(strip_pdf_padding(&output)).expect("Output is not a PDF");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);

    let page_id = pages[&1];
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    assert!(resources.get(b"Font").is_err());

    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    assert_eq!(xobjects.len(), 1);
    let (_, image_ref) = xobjects.iter().next().unwrap();
    let image = doc
        .get_object(image_ref.as_reference().unwrap())
        .unwrap()
        .as_stream()
        .unwrap();
    assert_eq!(
        image.dict.get(b"Subtype").unwrap().as_name().unwrap(),
        b"Image"
    );
    assert_eq!(
        image.dict.get(b"Filter").unwrap().as_name().unwrap(),
        b"DCTDecode"
    );

    // The text must actually show up in the page image
    let pixels = image::load_from_memory_with_format(&image.content, ImageFormat::Jpeg)
        .expect("Page image is not a JPEG")
        .to_rgb8();
    let darkest = pixels.pixels().flat_map(|p| p.0).min().unwrap();
    assert!(darkest < 128, "page rendered without visible text");
}

#[test]
fn test_embedded_backend_refuses_text_pdf() {
    let input = text_pdf(200 * 1024);
    let request = CompressionRequest::new(input, MediaType::Document, 150 * 1024).unwrap();
    let settings = SearchSettings::default().with_backend(Backend::Embedded);

    let result = Compressor::new(settings).compress(&request);
    assert!(matches!(
        result,
        Err(CompressError::UnrenderableContent { page: 1, .. })
    ));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let result = MediaType::from_path(Path::new("animation.gif"));
    assert!(matches!(result, Err(CompressError::UnsupportedMediaType(_))));
    assert!(result.unwrap_err().is_input_error());
}

#[test]
fn test_tiny_target_is_unreachable() {
    let input = noisy_png(200, 200, 3);

    let result = compress_to_size(input, MediaType::Image, 100);
    match result {
        Err(err @ CompressError::SizeUnreachable { .. }) => assert!(!err.is_input_error()),
        other => panic!("expected SizeUnreachable, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn test_undecodable_image_is_input_error() {
    let result = compress_to_size(vec![0xAB; 4096], MediaType::Image, 1024);
    assert!(matches!(result, Err(CompressError::DecodeFailure(_))));
}

#[test]
fn test_compression_is_deterministic() {
    let input = noisy_png(300, 300, 11);
    let target = 40 * 1024;

    let first = compress_to_size(input.clone(), MediaType::Image, target).unwrap();
    let second = compress_to_size(input, MediaType::Image, target).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_requests_are_independent() {
    let compressor = Compressor::default();
    let requests: Vec<_> = (0..4)
        .map(|i| {
            let target = (30 + i * 10) * 1024;
            CompressionRequest::new(noisy_png(300, 300, i as u32 + 1), MediaType::Image, target)
                .unwrap()
        })
        .collect();

    let compressor = &compressor;
    let sizes: Vec<u64> = std::thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| scope.spawn(move || compressor.compress(request).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().final_size_bytes)
            .collect()
    });

    for (request, size) in requests.iter().zip(sizes) {
        assert_eq!(size, request.target_size_bytes());
    }
}

#[test]
fn test_cli_writes_exact_size_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    fs::write(&input, noisy_png(300, 300, 5)).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sizefit"))
        .arg(&input)
        .args(["--target", "50K"])
        .output()
        .expect("Failed to run sizefit");
    assert!(
        output.status.success(),
        "sizefit failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = dir.path().join("photo_compressed.png");
    assert_eq!(fs::metadata(&written).unwrap().len(), 50 * 1024);
    assert!(String::from_utf8_lossy(&output.stdout).contains("51200 bytes"));
}

#[test]
fn test_cli_rejects_unsupported_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("animation.gif");
    fs::write(&input, b"GIF89a").unwrap();
    let out_path = dir.path().join("out.gif");

    let status = Command::new(env!("CARGO_BIN_EXE_sizefit"))
        .arg(&input)
        .args(["--target", "1K", "-o"])
        .arg(&out_path)
        .status()
        .expect("Failed to run sizefit");

    assert!(!status.success());
    assert!(!out_path.exists());
}
