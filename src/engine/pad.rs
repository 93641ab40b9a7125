//! Exact-size padding
//!
//! JPEG and PDF readers stop at their terminal marker (`EOI` / `%%EOF`), so
//! zero bytes appended after it are ignored as trailing garbage.

/// Append zero bytes until `bytes` is exactly `target` long.
///
/// Never truncates: an input already at or above the target is returned
/// unchanged.
pub fn pad_to_size(mut bytes: Vec<u8>, target: u64) -> Vec<u8> {
    let len = bytes.len() as u64;
    if len < target {
        log::debug!("Padding {} bytes with {} zero bytes", len, target - len);
        bytes.resize(target as usize, 0);
    }
    bytes
}
