use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Unsupported media type: {0} (expected PDF, JPG, PNG, or WEBP)")]
    UnsupportedMediaType(String),

    #[error("Invalid target size: {0}")]
    InvalidTarget(String),

    #[error("Failed to decode input: {0}")]
    DecodeFailure(String),

    #[error("Failed to encode output: {0}")]
    EncodeFailure(String),

    #[error("Target size of {target} bytes is unreachable (smallest attainable output is {smallest} bytes)")]
    SizeUnreachable { target: u64, smallest: u64 },

    #[error("Rasterizer backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Page {page} has {operations} text or vector operations the embedded rasterizer cannot draw (use the pdfium backend)")]
    UnrenderableContent { page: u32, operations: usize },
}

impl CompressError {
    /// True when the failure is caused by the input itself rather than by
    /// the requested size being infeasible.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CompressError::UnsupportedMediaType(_)
                | CompressError::InvalidTarget(_)
                | CompressError::DecodeFailure(_)
        )
    }
}

impl From<image::ImageError> for CompressError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                CompressError::DecodeFailure(err.to_string())
            }
            _ => CompressError::EncodeFailure(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid range {name}: {min}..={max}")]
    InvalidRange { name: &'static str, min: u32, max: u32 },

    #[error("Invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },
}
