pub mod candidate;
pub mod media;
pub mod request;

pub use candidate::EncodedCandidate;
pub use media::MediaType;
pub use request::{CompressionRequest, CompressionResult};
