use crate::error::CompressError;

use super::MediaType;

/// One "make this file exactly N bytes" job
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    input_bytes: Vec<u8>,
    media_type: MediaType,
    target_size_bytes: u64,
}

impl CompressionRequest {
    /// Build a request, rejecting a zero target
    pub fn new(
        input_bytes: Vec<u8>,
        media_type: MediaType,
        target_size_bytes: u64,
    ) -> Result<Self, CompressError> {
        if target_size_bytes == 0 {
            return Err(CompressError::InvalidTarget(
                "target size must be at least one byte".to_string(),
            ));
        }
        Ok(Self {
            input_bytes,
            media_type,
            target_size_bytes,
        })
    }

    pub fn input_bytes(&self) -> &[u8] {
        &self.input_bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn target_size_bytes(&self) -> u64 {
        self.target_size_bytes
    }
}

/// Padded output of a successful request
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub output_bytes: Vec<u8>,
    /// Always equal to the requested target
    pub final_size_bytes: u64,
    /// Zero bytes appended by the padder
    pub padding_bytes: u64,
    /// JPEG quality (images) or DPI (documents) of the chosen candidate
    pub quality_param: u32,
    /// The input already fit and was returned without re-encoding
    pub passthrough: bool,
}
