//! Size-constrained compression engine
//!
//! The [`Compressor`] dispatches on media type to the image quality search or
//! the document rasterization search, then pads the winning candidate to the
//! exact target length.

pub mod bisect;
pub mod dispatch;
pub mod document_search;
pub mod image_search;
pub mod pad;

pub use bisect::{bisect, Bisection};
pub use dispatch::Compressor;
pub use document_search::DocumentSearch;
pub use image_search::ImageSearch;
pub use pad::pad_to_size;
