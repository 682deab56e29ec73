use anyhow::Result;

use crate::decode::DecodedImage;
use crate::face::{BoundingBox, Embedding};

/// A face location reported by a detector, before it is embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRegion {
    /// Position of this face among the detector's results for the image.
    pub index: u32,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// Finds faces in a decoded image.
///
/// Implement this trait to plug a real detector into [`crate::Pipeline`];
/// the gallery and search code only ever see the pipeline.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &DecodedImage) -> Result<Vec<FaceRegion>>;
}

/// Turns a detected face into a fixed-length, unit-length embedding.
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, image: &DecodedImage, region: &FaceRegion) -> Result<Embedding>;
}
