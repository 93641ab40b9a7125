//! Pure-Rust page rasterizer
//!
//! Walks each page's content stream, tracking the `q`/`Q`/`cm` transformation
//! stack, and composites every image XObject it paints (including those inside
//! form XObjects) onto a white canvas. Scanned documents and image-only PDFs,
//! including ones with an invisible OCR text layer, render faithfully. Pages
//! that paint visible text or vector art are refused with
//! `UnrenderableContent` rather than rendered blank.

use image::imageops::FilterType;
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::CompressError;
use crate::pdf::source::{as_dict, number, resolve, SourcePage};
use crate::pdf::SourceDocument;
use crate::raster::RasterImage;

use super::PageRasterizer;

/// Form XObjects nested deeper than this are skipped
const MAX_FORM_DEPTH: usize = 12;

/// Operators that show text
const TEXT_OPERATORS: &[&str] = &["Tj", "TJ", "'", "\""];

/// Operators that paint paths, shadings or inline images
const VECTOR_OPERATORS: &[&str] = &[
    "f", "F", "f*", "B", "B*", "b", "b*", "S", "s", "sh", "BI",
];

/// Text rendering mode that paints nothing (`3 Tr`)
const INVISIBLE_TEXT: i64 = 3;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Affine transform `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let v: Vec<f32> = operands.iter().filter_map(number).collect();
        if v.len() != 6 {
            return None;
        }
        Some(Matrix {
            a: v[0],
            b: v[1],
            c: v[2],
            d: v[3],
            e: v[4],
            f: v[5],
        })
    }

    /// `self` applied first, then `other`
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// User space of `page` to canvas pixels (y down), honoring `/Rotate`
    fn device(page: &SourcePage, scale: f32) -> Matrix {
        let s = scale * page.user_unit;
        let pb = page.page_box;
        let to_origin = Matrix {
            a: s,
            d: s,
            e: -pb.x0 * s,
            f: -pb.y0 * s,
            ..Matrix::IDENTITY
        };
        let (w, h) = (pb.width() * s, pb.height() * s);
        let (a, b, c, d, e, f) = match page.rotation {
            90 => (0.0, 1.0, 1.0, 0.0, 0.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0, w, 0.0),
            270 => (0.0, -1.0, -1.0, 0.0, h, w),
            _ => (1.0, 0.0, 0.0, -1.0, 0.0, h),
        };
        to_origin.then(&Matrix { a, b, c, d, e, f })
    }

    /// Map a point back into the unit square, if the transform is invertible
    fn invert_point(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let (x, y) = (x - self.e, y - self.f);
        Some(((x * self.d - y * self.c) / det, (y * self.a - x * self.b) / det))
    }
}

/// Rasterizer that composites embedded images only
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedRasterizer;

impl EmbeddedRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn render_page(
        &self,
        source: &SourceDocument,
        page: &SourcePage,
        dpi: u32,
    ) -> Result<RasterImage, CompressError> {
        let doc = source.document();
        let content = doc.get_page_content(page.id).map_err(|e| {
            CompressError::DecodeFailure(format!("Page {} content: {}", page.number, e))
        })?;

        let (width, height) = page.pixel_size(dpi);
        let mut canvas = PageCanvas {
            doc,
            pixels: RgbImage::from_pixel(width, height, WHITE),
            unrendered: 0,
            images: 0,
        };

        let empty = Dictionary::new();
        let resources = source.page_resources(page).unwrap_or(&empty);
        let device = Matrix::device(page, page.render_scale(dpi));
        canvas.run(&content, resources, device, 0);

        if canvas.unrendered > 0 {
            return Err(CompressError::UnrenderableContent {
                page: page.number,
                operations: canvas.unrendered,
            });
        }
        log::debug!(
            "Page {}: {}x{} px at {} dpi, {} images composited",
            page.number,
            width,
            height,
            dpi,
            canvas.images
        );

        Ok(RasterImage::from_rgb(canvas.pixels))
    }
}

impl PageRasterizer for EmbeddedRasterizer {
    fn rasterize(
        &self,
        document: &SourceDocument,
        dpi: u32,
    ) -> Result<Vec<RasterImage>, CompressError> {
        document
            .pages()
            .iter()
            .map(|page| self.render_page(document, page, dpi))
            .collect()
    }
}

struct PageCanvas<'a> {
    doc: &'a Document,
    pixels: RgbImage,
    /// Visible text or vector painting operations seen
    unrendered: usize,
    images: usize,
}

impl<'a> PageCanvas<'a> {
    /// Interpret one content stream under `base`, which maps its user space to pixels
    fn run(&mut self, content: &[u8], resources: &'a Dictionary, base: Matrix, depth: usize) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping undecodable content stream: {}", e);
                return;
            }
        };

        let mut ctm = base;
        let mut text_mode = 0;
        let mut stack = Vec::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "q" => stack.push((ctm, text_mode)),
                "Q" => (ctm, text_mode) = stack.pop().unwrap_or((base, 0)),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "Tr" => {
                    if let Some(mode) = op.operands.first().and_then(number) {
                        text_mode = mode as i64;
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        self.paint_xobject(name, resources, ctm, depth);
                    }
                }
                other if TEXT_OPERATORS.contains(&other) => {
                    if text_mode != INVISIBLE_TEXT {
                        self.unrendered += 1;
                    }
                }
                other if VECTOR_OPERATORS.contains(&other) => self.unrendered += 1,
                _ => {}
            }
        }
    }

    fn paint_xobject(&mut self, name: &[u8], resources: &'a Dictionary, ctm: Matrix, depth: usize) {
        let doc = self.doc;
        let stream = match resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| as_dict(doc, obj))
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|obj| resolve(doc, obj))
        {
            Some(Object::Stream(stream)) => stream,
            _ => {
                log::debug!("XObject /{} not found", String::from_utf8_lossy(name));
                return;
            }
        };

        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(subtype)) if subtype == b"Image" => match decode_image(doc, stream) {
                Some(image) => {
                    self.composite(&image, ctm);
                    self.images += 1;
                }
                None => log::debug!(
                    "Image /{} uses an unsupported encoding",
                    String::from_utf8_lossy(name)
                ),
            },
            Ok(Object::Name(subtype)) if subtype == b"Form" => {
                if depth >= MAX_FORM_DEPTH {
                    log::debug!("Form XObject nesting too deep, skipping");
                    return;
                }
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|obj| match resolve(doc, obj) {
                        Some(Object::Array(values)) => Matrix::from_operands(values),
                        _ => None,
                    })
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|obj| as_dict(doc, obj))
                    .unwrap_or(resources);
                let content = stream_bytes(stream);
                self.run(&content, form_resources, matrix.then(&ctm), depth + 1);
            }
            _ => {}
        }
    }

    /// Draw `image` over the unit square mapped by `ctm`, sampling by inverse mapping
    fn composite(&mut self, image: &RgbImage, ctm: Matrix) {
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(u, v)| ctm.apply(u, v));
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_x = corners
            .iter()
            .map(|c| c.0)
            .fold(f32::NEG_INFINITY, f32::max)
            .ceil()
            .min(self.pixels.width() as f32);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_y = corners
            .iter()
            .map(|c| c.1)
            .fold(f32::NEG_INFINITY, f32::max)
            .ceil()
            .min(self.pixels.height() as f32);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        // Pre-shrink large sources to roughly their drawn size so nearest
        // sampling below does not alias.
        let side = |(x0, y0): (f32, f32), (x1, y1): (f32, f32)| ((x1 - x0).hypot(y1 - y0)).ceil() as u32;
        let drawn_w = side(corners[0], corners[1]).max(1);
        let drawn_h = side(corners[0], corners[2]).max(1);
        let shrunk;
        let source = if image.width() > drawn_w * 2 || image.height() > drawn_h * 2 {
            shrunk = image::imageops::resize(
                image,
                drawn_w.min(image.width()),
                drawn_h.min(image.height()),
                FilterType::Triangle,
            );
            &shrunk
        } else {
            image
        };
        let (src_w, src_h) = (source.width(), source.height());

        for py in min_y as u32..max_y as u32 {
            for px in min_x as u32..max_x as u32 {
                let Some((u, v)) = ctm.invert_point(px as f32 + 0.5, py as f32 + 0.5) else {
                    return;
                };
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                // Image row 0 sits at the top of the unit square (v = 1)
                let sx = ((u * src_w as f32) as u32).min(src_w - 1);
                let sy = (((1.0 - v) * src_h as f32) as u32).min(src_h - 1);
                self.pixels.put_pixel(px, py, *source.get_pixel(sx, sy));
            }
        }
    }
}

/// Stream payload with any generic filters removed
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())
    } else {
        stream.content.clone()
    }
}

/// Color model of raw image samples
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorSpace>, lookup: Vec<u8> },
}

impl ColorSpace {
    fn parse(doc: &Document, object: &Object) -> Option<Self> {
        match resolve(doc, object)? {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => Some(ColorSpace::Gray),
                b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorSpace::Rgb),
                b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
                _ => None,
            },
            Object::Array(items) => {
                let family = match items.first().and_then(|o| resolve(doc, o)) {
                    Some(Object::Name(n)) => n.as_slice(),
                    _ => return None,
                };
                match family {
                    b"ICCBased" => {
                        let components = items
                            .get(1)
                            .and_then(|o| as_dict(doc, o))
                            .and_then(|d| d.get(b"N").ok())
                            .and_then(number)? as u32;
                        match components {
                            1 => Some(ColorSpace::Gray),
                            3 => Some(ColorSpace::Rgb),
                            4 => Some(ColorSpace::Cmyk),
                            _ => None,
                        }
                    }
                    b"Indexed" | b"I" => {
                        let base = ColorSpace::parse(doc, items.get(1)?)?;
                        let lookup = match resolve(doc, items.get(3)?)? {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(stream) => stream_bytes(stream),
                            _ => return None,
                        };
                        Some(ColorSpace::Indexed {
                            base: Box::new(base),
                            lookup,
                        })
                    }
                    b"CalGray" => Some(ColorSpace::Gray),
                    b"CalRGB" => Some(ColorSpace::Rgb),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    /// Convert one sample group to RGB
    fn to_rgb(&self, sample: &[u8]) -> [u8; 3] {
        match self {
            ColorSpace::Gray => [sample[0]; 3],
            ColorSpace::Rgb => [sample[0], sample[1], sample[2]],
            ColorSpace::Cmyk => {
                let k = 255 - sample[3] as u32;
                let channel = |c: u8| ((255 - c as u32) * k / 255) as u8;
                [channel(sample[0]), channel(sample[1]), channel(sample[2])]
            }
            ColorSpace::Indexed { base, lookup } => {
                let n = base.components();
                let start = sample[0] as usize * n;
                match lookup.get(start..start + n) {
                    Some(entry) => base.to_rgb(entry),
                    None => [0, 0, 0],
                }
            }
        }
    }
}

/// Decode an image XObject to RGB, or `None` when the encoding is unsupported
fn decode_image(doc: &Document, stream: &Stream) -> Option<RgbImage> {
    let dict = &stream.dict;
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return None;
    }

    let filters: Vec<&[u8]> = match dict.get(b"Filter").ok().and_then(|f| resolve(doc, f)) {
        Some(Object::Name(name)) => vec![name.as_slice()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match resolve(doc, item) {
                Some(Object::Name(name)) => Some(name.as_slice()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    match filters.as_slice() {
        [b"DCTDecode"] | [b"DCT"] => {
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .ok()
                .map(|img| img.to_rgb8());
        }
        [] => {}
        [b"FlateDecode"] | [b"Fl"] | [b"LZWDecode"] | [b"LZW"] => {}
        _ => return None,
    }

    let width = dict.get(b"Width").ok().and_then(number)? as u32;
    let height = dict.get(b"Height").ok().and_then(number)? as u32;
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(number)
        .unwrap_or(8.0) as u32;
    if width == 0 || height == 0 || bits != 8 {
        return None;
    }
    let color_space = ColorSpace::parse(doc, dict.get(b"ColorSpace").ok()?)?;

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content().ok()?
    };

    let n = color_space.components();
    let needed = width as usize * height as usize * n;
    if samples.len() < needed {
        return None;
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for sample in samples[..needed].chunks_exact(n) {
        rgb.extend_from_slice(&color_space.to_rgb(sample));
    }
    RgbImage::from_raw(width, height, rgb)
}
