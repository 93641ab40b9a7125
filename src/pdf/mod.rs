//! PDF input parsing, page rasterization and image-only reassembly

pub mod assemble;
pub mod rasterize;
pub mod source;

pub use assemble::{assemble_pdf, save_compacted, PageImage};
pub use rasterize::{rasterizer_for, EmbeddedRasterizer, PageRasterizer, PdfiumRasterizer};
pub use source::{PageBox, SourceDocument, SourcePage};
