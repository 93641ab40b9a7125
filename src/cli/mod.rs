//! Command-line argument handling

pub mod args;

pub use args::{parse_size, Args, Backend, MediaTypeArg};
