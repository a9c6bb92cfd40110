pub mod embeddings;
pub mod geocoding;

pub use embeddings::*;
pub use geocoding::*;
