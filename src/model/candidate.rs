/// One trial output and the knob value that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCandidate {
    pub bytes: Vec<u8>,
    pub size_bytes: u64,
    /// JPEG quality for images, DPI for documents
    pub quality_param: u32,
    /// Unmodified input returned because it already fit
    pub passthrough: bool,
}

impl EncodedCandidate {
    pub fn new(bytes: Vec<u8>, quality_param: u32) -> Self {
        Self {
            size_bytes: bytes.len() as u64,
            bytes,
            quality_param,
            passthrough: false,
        }
    }

    /// Wrap the original input untouched
    pub fn original(bytes: Vec<u8>) -> Self {
        Self {
            size_bytes: bytes.len() as u64,
            bytes,
            quality_param: 0,
            passthrough: true,
        }
    }

    /// Whether this candidate is at or under the target
    pub fn fits(&self, target: u64) -> bool {
        self.size_bytes <= target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        let candidate = EncodedCandidate::new(vec![0; 100], 50);
        assert!(candidate.fits(100));
        assert!(candidate.fits(101));
        assert!(!candidate.fits(99));
        assert!(!candidate.passthrough);
    }

    #[test]
    fn test_original_is_passthrough() {
        let candidate = EncodedCandidate::original(vec![7; 3]);
        assert_eq!(candidate.size_bytes, 3);
        assert!(candidate.passthrough);
    }
}
