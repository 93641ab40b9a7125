//! Parsed input documents
//!
//! Wraps a `lopdf::Document` together with the raw bytes (some rasterizer
//! backends load the file themselves) and the visible box of every page.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::config::defaults::{MAX_PAGE_PIXELS, POINTS_PER_INCH};
use crate::error::CompressError;

/// Longest chain of references or `/Parent` links followed before giving up
const MAX_LINK_DEPTH: usize = 32;

/// US Letter, used when a page carries no usable box
const FALLBACK_BOX: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Visible page rectangle in PDF user-space units (points)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    fn from_array(values: &[Object]) -> Option<Self> {
        if values.len() != 4 {
            return None;
        }
        let nums: Vec<f32> = values.iter().filter_map(number).collect();
        if nums.len() != 4 {
            return None;
        }
        let page_box = PageBox {
            x0: nums[0].min(nums[2]),
            y0: nums[1].min(nums[3]),
            x1: nums[0].max(nums[2]),
            y1: nums[1].max(nums[3]),
        };
        (page_box.width() > 0.0 && page_box.height() > 0.0).then_some(page_box)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// One page of the source document
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// 1-based page number
    pub number: u32,
    pub id: ObjectId,
    pub page_box: PageBox,
    /// Clockwise display rotation in degrees: 0, 90, 180 or 270
    pub rotation: u32,
    /// Length of one user-space unit in points (`/UserUnit`, normally 1)
    pub user_unit: f32,
}

impl SourcePage {
    /// Displayed page size in points, after `/UserUnit` and `/Rotate`
    pub fn display_size(&self) -> (f32, f32) {
        let width = self.page_box.width() * self.user_unit;
        let height = self.page_box.height() * self.user_unit;
        if self.rotation % 180 == 90 {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Pixels per point at `dpi`, lowered so the page stays within `MAX_PAGE_PIXELS`
    pub fn render_scale(&self, dpi: u32) -> f32 {
        let scale = dpi as f32 / POINTS_PER_INCH;
        let (width, height) = self.display_size();
        let area = width as f64 * height as f64;
        let pixels = area * (scale as f64).powi(2);
        if pixels <= MAX_PAGE_PIXELS as f64 {
            return scale;
        }

        let capped = (MAX_PAGE_PIXELS as f64 / area).sqrt() as f32;
        log::debug!(
            "Page {} is {}x{} pt, rendering at {:.1} dpi instead of {}",
            self.number,
            width,
            height,
            capped * POINTS_PER_INCH,
            dpi
        );
        capped
    }

    /// Canvas size in pixels at `dpi`, at least 1x1 and at most `MAX_PAGE_PIXELS`
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let scale = self.render_scale(dpi);
        let (width, height) = self.display_size();
        let round = |v: f32| ((v * scale).round() as u32).max(1);
        let (w, h) = (round(width), round(height));
        if w as u64 * h as u64 <= MAX_PAGE_PIXELS {
            return (w, h);
        }
        let floor = |v: f32| ((v * scale).floor() as u32).max(1);
        (floor(width), floor(height))
    }
}

/// Input PDF, parsed once per request
pub struct SourceDocument {
    bytes: Vec<u8>,
    document: Document,
    pages: Vec<SourcePage>,
}

impl SourceDocument {
    /// Parse a PDF, failing with `DecodeFailure` when it is unreadable or has no pages
    pub fn load(bytes: &[u8]) -> Result<Self, CompressError> {
        let document = Document::load_mem(bytes)
            .map_err(|e| CompressError::DecodeFailure(format!("Failed to parse PDF: {}", e)))?;

        let mut pages = Vec::new();
        for (number, id) in document.get_pages() {
            let page_dict = document.get_dictionary(id).map_err(|e| {
                CompressError::DecodeFailure(format!("Page {} is not a dictionary: {}", number, e))
            })?;

            let page_box = [b"CropBox".as_slice(), b"MediaBox".as_slice()]
                .iter()
                .find_map(|key| match inherited_attribute(&document, page_dict, key) {
                    Some(Object::Array(values)) => PageBox::from_array(values),
                    _ => None,
                })
                .unwrap_or_else(|| {
                    log::warn!("Page {} has no usable MediaBox, assuming Letter", number);
                    FALLBACK_BOX
                });

            let rotation = match inherited_attribute(&document, page_dict, b"Rotate")
                .and_then(self::number)
            {
                Some(degrees) if degrees as i64 % 90 == 0 => (degrees as i64).rem_euclid(360) as u32,
                Some(degrees) => {
                    log::warn!("Page {} has invalid /Rotate {}, ignoring", number, degrees);
                    0
                }
                None => 0,
            };
            let user_unit = page_dict
                .get(b"UserUnit")
                .ok()
                .and_then(|obj| resolve(&document, obj))
                .and_then(self::number)
                .filter(|unit| *unit > 0.0)
                .unwrap_or(1.0);

            pages.push(SourcePage {
                number,
                id,
                page_box,
                rotation,
                user_unit,
            });
        }

        if pages.is_empty() {
            return Err(CompressError::DecodeFailure(
                "PDF contains no pages".to_string(),
            ));
        }

        log::debug!("Loaded PDF with {} pages", pages.len());

        Ok(Self {
            bytes: bytes.to_vec(),
            document,
            pages,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn pages(&self) -> &[SourcePage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Resource dictionary of a page, following inheritance through the page tree
    pub fn page_resources(&self, page: &SourcePage) -> Option<&Dictionary> {
        let page_dict = self.document.get_dictionary(page.id).ok()?;
        inherited_attribute(&self.document, page_dict, b"Resources")
            .and_then(|obj| as_dict(&self.document, obj))
    }
}

/// Follow indirect references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_LINK_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Resolve to a dictionary, accepting a stream's dictionary too
pub(crate) fn as_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Numeric value of an integer or real object
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Look up a page attribute, walking `/Parent` links for inheritable keys
fn inherited_attribute<'a>(
    doc: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_LINK_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        node = as_dict(doc, node.get(b"Parent").ok()?)?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// Two-page document whose MediaBox and Rotate live on the page tree root
    fn inherited_box_pdf(rotate: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..2 {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(300),
                    Object::Integer(144),
                ],
                "Resources" => Dictionary::new(),
                "Rotate" => rotate,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_load_reads_inherited_media_box() {
        let source = SourceDocument::load(&inherited_box_pdf(0)).unwrap();
        assert_eq!(source.page_count(), 2);
        let page = &source.pages()[1];
        assert_eq!(page.number, 2);
        assert_eq!(page.page_box.width(), 300.0);
        assert_eq!(page.page_box.height(), 144.0);
        assert_eq!(page.rotation, 0);
        assert_eq!(page.user_unit, 1.0);
        assert!(source.page_resources(page).is_some());
    }

    #[test]
    fn test_inherited_rotation_swaps_display_size() {
        let source = SourceDocument::load(&inherited_box_pdf(90)).unwrap();
        let page = &source.pages()[0];
        assert_eq!(page.rotation, 90);
        assert_eq!(page.display_size(), (144.0, 300.0));
        assert_eq!(page.pixel_size(72), (144, 300));

        let source = SourceDocument::load(&inherited_box_pdf(-90)).unwrap();
        assert_eq!(source.pages()[0].rotation, 270);
        assert_eq!(source.pages()[0].display_size(), (144.0, 300.0));
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            SourceDocument::load(b"this is not a pdf"),
            Err(CompressError::DecodeFailure(_))
        ));
    }

    fn page_of(width: f32, height: f32) -> SourcePage {
        SourcePage {
            number: 1,
            id: (1, 0),
            page_box: PageBox {
                x0: 0.0,
                y0: 0.0,
                x1: width,
                y1: height,
            },
            rotation: 0,
            user_unit: 1.0,
        }
    }

    #[test]
    fn test_pixel_size() {
        let page = page_of(612.0, 792.0);
        assert_eq!(page.pixel_size(72), (612, 792));
        assert_eq!(page.pixel_size(36), (306, 396));
        assert_eq!(page.pixel_size(0), (1, 1));
    }

    #[test]
    fn test_user_unit_scales_page() {
        let page = SourcePage {
            user_unit: 2.0,
            ..page_of(100.0, 50.0)
        };
        assert_eq!(page.display_size(), (200.0, 100.0));
        assert_eq!(page.pixel_size(72), (200, 100));
    }

    #[test]
    fn test_huge_page_is_capped() {
        // Largest MediaBox a PDF allows
        let page = page_of(14400.0, 14400.0);
        let (w, h) = page.pixel_size(150);
        assert!(w as u64 * h as u64 <= MAX_PAGE_PIXELS);
        assert_eq!(w, h);
        assert!(w > 6000);
        assert!(page.render_scale(150) < 150.0 / POINTS_PER_INCH);

        // Ordinary pages keep the requested resolution
        assert_eq!(page_of(612.0, 792.0).render_scale(150), 150.0 / POINTS_PER_INCH);
    }

    #[test]
    fn test_box_normalizes_corners() {
        let values = vec![100.into(), 200.into(), 0.into(), Object::Real(0.0)];
        let page_box = PageBox::from_array(&values).unwrap();
        assert_eq!((page_box.x0, page_box.y0), (0.0, 0.0));
        assert_eq!((page_box.width(), page_box.height()), (100.0, 200.0));
        assert!(PageBox::from_array(&[0.into(), 0.into(), 0.into(), 0.into()]).is_none());
    }
}
