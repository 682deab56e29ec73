use anyhow::{Context, Result};

use crate::decode::{self, DecodedImage};
use crate::detector::{FaceDetector, FaceEmbedder};
use crate::face::DetectedFace;
use crate::synthetic::{SyntheticDetector, SyntheticEmbedder};

/// Full pipeline: decode → detect faces → embed each face
pub struct Pipeline {
    pub detector: Box<dyn FaceDetector>,
    pub embedder: Box<dyn FaceEmbedder>,
}

impl Pipeline {
    pub fn new(detector: Box<dyn FaceDetector>, embedder: Box<dyn FaceEmbedder>) -> Self {
        Self { detector, embedder }
    }

    /// Pipeline backed by the placeholder detector and embedder.
    pub fn synthetic(sample_stride: usize, max_faces: u32) -> Self {
        Self::new(
            Box::new(SyntheticDetector {
                sample_stride,
                max_faces,
            }),
            Box::new(SyntheticEmbedder { sample_stride }),
        )
    }

    /// Detect and embed every face in an already decoded image.
    pub fn process_image(&self, img: &DecodedImage) -> Result<Vec<DetectedFace>> {
        let regions = self.detector.detect(img).context("detecting faces")?;

        regions
            .into_iter()
            .map(|region| -> Result<DetectedFace> {
                let embedding = self
                    .embedder
                    .embed(img, &region)
                    .with_context(|| format!("embedding face {}", region.index))?;
                Ok(DetectedFace {
                    id: uuid::Uuid::new_v4().to_string(),
                    bbox: region.bbox,
                    confidence: region.confidence,
                    embedding,
                })
            })
            .collect()
    }

    /// Decode raw image bytes and process them.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<Vec<DetectedFace>> {
        let img = decode::decode_rgba(bytes).context("decoding image")?;
        self.process_image(&img)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            Box::new(SyntheticDetector::default()),
            Box::new(SyntheticEmbedder::default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undecodable_bytes_fail() {
        let pipeline = Pipeline::default();
        let err = pipeline.process_bytes(b"not an image").unwrap_err();
        assert!(format!("{:#}", err).contains("decoding image"));
    }
}
