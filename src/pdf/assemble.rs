//! Image-only PDF assembly
//!
//! Every rasterized page becomes a one-page document body: a single JPEG
//! image XObject stretched over a MediaBox of the page's physical size.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::CompressError;

/// Resource name of the page image
const PAGE_IMAGE_NAME: &str = "Im0";

/// One encoded page ready for assembly
#[derive(Debug, Clone)]
pub struct PageImage {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    /// Displayed size of the source page in points, kept regardless of resolution
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Build a PDF holding one page per image, with compressed streams.
pub fn assemble_pdf(pages: &[PageImage]) -> Result<Vec<u8>, CompressError> {
    if pages.is_empty() {
        return Err(CompressError::EncodeFailure(
            "cannot assemble a PDF without pages".to_string(),
        ));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let (width_pt, height_pt) = (page.width_pt, page.height_pt);

        let mut image_dict = Dictionary::new();
        image_dict.set("Type", Object::Name(b"XObject".to_vec()));
        image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
        image_dict.set("Width", Object::Integer(page.width_px as i64));
        image_dict.set("Height", Object::Integer(page.height_px as i64));
        image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image_dict.set("BitsPerComponent", Object::Integer(8));
        image_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        image_dict.set("Length", Object::Integer(page.jpeg.len() as i64));
        // Already DCT-compressed; Flate on top only adds bytes
        let image_id =
            doc.add_object(Stream::new(image_dict, page.jpeg.clone()).with_compression(false));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width_pt.into()),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(height_pt.into()),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(PAGE_IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| CompressError::EncodeFailure(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

        let mut xobjects = Dictionary::new();
        xobjects.set(PAGE_IMAGE_NAME, Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pt.into()),
                Object::Real(height_pt.into()),
            ]),
        );
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Reference(content_id));
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    save_compacted(&mut doc)
}

/// Drop unreachable objects, compress streams, and serialize.
pub fn save_compacted(doc: &mut Document) -> Result<Vec<u8>, CompressError> {
    doc.prune_objects();
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| CompressError::EncodeFailure(format!("Failed to save PDF: {}", e)))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterImage;
    use image::{Rgb, RgbImage};

    fn page_image(width: u32, height: u32, dpi: u32) -> PageImage {
        let raster = RasterImage::from_rgb(RgbImage::from_pixel(width, height, Rgb([30, 60, 90])));
        let to_points = |px: u32| px as f32 * 72.0 / dpi as f32;
        PageImage {
            jpeg: raster.encode_jpeg(80).unwrap(),
            width_px: width,
            height_px: height,
            width_pt: to_points(width),
            height_pt: to_points(height),
        }
    }

    #[test]
    fn test_media_box_keeps_physical_size() {
        let page = page_image(306, 396, 36);
        let bytes = assemble_pdf(std::slice::from_ref(&page)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let media_box = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        let size: Vec<f32> = media_box.iter().map(|v| v.as_float().unwrap()).collect();
        assert_eq!(size.len(), 4);
        assert!((size[2] - 612.0).abs() < 0.01);
        assert!((size[3] - 792.0).abs() < 0.01);
    }

    #[test]
    fn test_assembled_pdf_has_one_image_per_page() {
        let pages = vec![page_image(40, 50, 72), page_image(50, 40, 72)];
        let bytes = assemble_pdf(&pages).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);

        let images = doc
            .objects
            .values()
            .filter(|obj| match obj {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .map(|s| matches!(s, Object::Name(n) if n == b"Image"))
                    .unwrap_or(false),
                _ => false,
            })
            .count();
        assert_eq!(images, 2);
    }

    #[test]
    fn test_jpeg_bytes_are_embedded_verbatim() {
        let page = page_image(20, 20, 72);
        let bytes = assemble_pdf(std::slice::from_ref(&page)).unwrap();
        let found = bytes
            .windows(page.jpeg.len())
            .any(|window| window == page.jpeg.as_slice());
        assert!(found);
    }

    #[test]
    fn test_empty_page_list_fails() {
        assert!(matches!(
            assemble_pdf(&[]),
            Err(CompressError::EncodeFailure(_))
        ));
    }
}
