pub mod decode;
pub mod detector;
pub mod error;
pub mod face;
pub mod hash;
pub mod pipeline;
pub mod synthetic;

// Re-export commonly used types
pub use decode::DecodedImage;
pub use detector::{FaceDetector, FaceEmbedder, FaceRegion};
pub use face::{DetectedFace, Embedding, SimilarityMapping};
pub use pipeline::Pipeline;
