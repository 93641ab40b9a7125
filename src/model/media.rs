use std::fmt;
use std::path::Path;

use crate::error::CompressError;

/// Kind of input the engine knows how to shrink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Single raster image (JPG, PNG, WEBP)
    Image,
    /// Page-description document (PDF)
    Document,
}

impl MediaType {
    /// Map a file extension (with or without the leading dot) to a media type
    pub fn from_extension(ext: &str) -> Result<Self, CompressError> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "webp" => Ok(MediaType::Image),
            "pdf" => Ok(MediaType::Document),
            _ => Err(CompressError::UnsupportedMediaType(if ext.is_empty() {
                "(no extension)".to_string()
            } else {
                ext
            })),
        }
    }

    /// Map a MIME content type such as `image/png; charset=binary`
    pub fn from_content_type(content_type: &str) -> Result<Self, CompressError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/png" | "image/webp" => Ok(MediaType::Image),
            "application/pdf" => Ok(MediaType::Document),
            _ => Err(CompressError::UnsupportedMediaType(essence)),
        }
    }

    /// Detect the media type from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, CompressError> {
        match path.extension() {
            Some(ext) => Self::from_extension(&ext.to_string_lossy()),
            None => Err(CompressError::UnsupportedMediaType(format!(
                "{} has no extension",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Document => write!(f, "document"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_image_extensions() {
        for ext in ["jpg", "JPEG", ".png", "webp"] {
            assert_eq!(MediaType::from_extension(ext).unwrap(), MediaType::Image);
        }
    }

    #[test]
    fn test_document_extension() {
        assert_eq!(MediaType::from_extension("PDF").unwrap(), MediaType::Document);
    }

    #[test]
    fn test_gif_is_unsupported() {
        assert!(matches!(
            MediaType::from_extension("gif"),
            Err(CompressError::UnsupportedMediaType(ref e)) if e == "gif"
        ));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            MediaType::from_content_type("image/webp").unwrap(),
            MediaType::Image
        );
        assert_eq!(
            MediaType::from_content_type("Application/PDF; name=x.pdf").unwrap(),
            MediaType::Document
        );
        assert!(MediaType::from_content_type("image/gif").is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            MediaType::from_path(&PathBuf::from("scan.final.PDF")).unwrap(),
            MediaType::Document
        );
        assert!(MediaType::from_path(&PathBuf::from("README")).is_err());
    }
}
