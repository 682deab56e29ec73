//! Placeholder detector and embedder.
//!
//! Nothing here looks at faces. The number of "faces", their boxes and their
//! embeddings are all derived from the pixel [`fingerprint`] so that the same
//! image always produces the same annotations:
//!
//! - face count: `min(fingerprint % 4 + 1, 3)`
//! - face `i` embedding: 128 draws from an LCG seeded with
//!   `fingerprint + i * 1000`, each mapped to `[-1, 1)`, then L2-normalized
//! - face `i` box and confidence: fixed offsets of `i`

use anyhow::Result;

use crate::decode::DecodedImage;
use crate::detector::{FaceDetector, FaceEmbedder, FaceRegion};
use crate::face::{BoundingBox, Embedding, EMBEDDING_DIM};
use crate::hash::{fingerprint, Fingerprint, DEFAULT_SAMPLE_STRIDE};

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
const LCG_MODULUS: u64 = 1 << 31;

/// Seed offset between consecutive faces of one image.
const FACE_SEED_STEP: u64 = 1000;

pub const MAX_SYNTHETIC_FACES: u32 = 3;

/// Linear-congruential generator over `mod 2^31`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        // 2^31 divides 2^64, so wrapping arithmetic leaves the residue intact
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// Number of faces the placeholder detector reports for an image, capped at `max`.
pub fn face_count(fp: Fingerprint, max: u32) -> u32 {
    (fp % 4 + 1).min(max.clamp(1, MAX_SYNTHETIC_FACES))
}

/// Deterministic unit-length embedding for face `face_index` of an image.
pub fn synthesize_embedding(fp: Fingerprint, face_index: u32) -> Embedding {
    let seed = fp as u64 + face_index as u64 * FACE_SEED_STEP;
    let mut rng = Lcg::new(seed);
    let values = (0..EMBEDDING_DIM)
        .map(|_| ((rng.next_unit() - 0.5) * 2.0) as f32)
        .collect();
    Embedding::normalized(values)
}

/// Box and confidence for face `index`; carries no detection meaning.
pub fn synthetic_region(index: u32, width: u32, height: u32) -> FaceRegion {
    let i = index as f32;
    let span_x = width.saturating_sub(100).max(1);
    let span_y = height.saturating_sub(100).max(1);
    FaceRegion {
        index,
        bbox: BoundingBox {
            x: ((index * 30) % span_x) as f32,
            y: ((index * 20) % span_y) as f32,
            width: 80.0 + i * 20.0,
            height: 80.0 + i * 20.0,
        },
        confidence: 0.8 + i * 0.05,
    }
}

/// Detector that reports between one and three faces per image, chosen by fingerprint.
#[derive(Debug, Clone)]
pub struct SyntheticDetector {
    pub sample_stride: usize,
    pub max_faces: u32,
}

impl Default for SyntheticDetector {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            max_faces: MAX_SYNTHETIC_FACES,
        }
    }
}

impl FaceDetector for SyntheticDetector {
    fn detect(&self, image: &DecodedImage) -> Result<Vec<FaceRegion>> {
        let fp = fingerprint(&image.rgba, self.sample_stride);
        let count = face_count(fp, self.max_faces);
        log::debug!("fingerprint {} -> {} synthetic face(s)", fp, count);
        Ok((0..count)
            .map(|i| synthetic_region(i, image.width, image.height))
            .collect())
    }
}

/// Embedder that seeds an LCG from the image fingerprint and face index.
#[derive(Debug, Clone)]
pub struct SyntheticEmbedder {
    pub sample_stride: usize,
}

impl Default for SyntheticEmbedder {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
        }
    }
}

impl FaceEmbedder for SyntheticEmbedder {
    fn embed(&self, image: &DecodedImage, region: &FaceRegion) -> Result<Embedding> {
        let fp = fingerprint(&image.rgba, self.sample_stride);
        Ok(synthesize_embedding(fp, region.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_first_steps() {
        let mut rng = Lcg::new(0);
        assert_eq!(rng.next_unit(), 12345.0 / 2147483648.0);
        // (12345 * 1103515245 + 12345) mod 2^31
        let expected = (12345u64 * 1103515245 + 12345) % (1 << 31);
        rng.next_unit();
        assert_eq!(rng.state, expected);
    }

    #[test]
    fn test_lcg_large_seed_matches_exact_arithmetic() {
        let seed = u32::MAX as u64 + 2000;
        let mut rng = Lcg::new(seed);
        rng.next_unit();
        let exact = ((seed as u128 * 1103515245 + 12345) % (1u128 << 31)) as u64;
        assert_eq!(rng.state, exact);
    }

    #[test]
    fn test_face_count_policy() {
        assert_eq!(face_count(0, 3), 1);
        assert_eq!(face_count(1, 3), 2);
        assert_eq!(face_count(2, 3), 3);
        assert_eq!(face_count(3, 3), 3);
        assert_eq!(face_count(7, 3), 3);
        assert_eq!(face_count(6, 2), 2);
        assert_eq!(face_count(6, 0), 1);
    }

    #[test]
    fn test_embedding_unit_and_bounded() {
        let e = synthesize_embedding(123_456, 2);
        assert_eq!(e.len(), EMBEDDING_DIM);
        assert!((e.norm() - 1.0).abs() < 1e-5);
        assert!(e.vector.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_faces_of_one_image_differ() {
        assert_ne!(synthesize_embedding(42, 0), synthesize_embedding(42, 1));
    }

    #[test]
    fn test_seed_collision_across_images() {
        // fingerprint 1000, face 0 shares a seed with fingerprint 0, face 1
        assert_eq!(synthesize_embedding(1000, 0), synthesize_embedding(0, 1));
    }

    #[test]
    fn test_synthetic_region() {
        let r = synthetic_region(2, 640, 480);
        assert_eq!(r.bbox.x, 60.0);
        assert_eq!(r.bbox.y, 40.0);
        assert_eq!(r.bbox.width, 120.0);
        assert_eq!(r.bbox.height, 120.0);
        assert!((r.confidence - 0.9).abs() < 1e-6);

        // tiny images still get a box
        let small = synthetic_region(1, 50, 50);
        assert_eq!(small.bbox.x, 0.0);
    }
}
