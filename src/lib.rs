pub mod config;
pub mod gallery;
pub mod matcher;
pub mod session;

// Re-export vision types for convenience
pub use facegallery_vision::{decode, face, hash, synthetic, DetectedFace, Embedding, Pipeline};
pub use gallery::{Gallery, ImageItem, ImageSource, Listing};
pub use session::{Notice, SearchState, Session};
