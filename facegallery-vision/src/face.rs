use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Length of every face embedding.
pub const EMBEDDING_DIM: usize = 128;

/// Face bounding box in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Face embedding, L2-normalized when produced by an embedder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedding {
    pub vector: Array1<f32>,
}

impl Embedding {
    /// Build an embedding from raw components, scaling it to unit length.
    /// A zero vector is kept as is.
    pub fn normalized(values: Vec<f32>) -> Self {
        let mut vector = Array1::from_vec(values);
        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector.mapv_inplace(|x| x / norm);
        }
        Self { vector }
    }

    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.vector.dot(&self.vector).sqrt()
    }

    /// Normalized mean of several embeddings of equal length.
    pub fn mean<'a>(embeddings: impl IntoIterator<Item = &'a Embedding>) -> Option<Self> {
        let mut iter = embeddings.into_iter();
        let mut sum = iter.next()?.vector.clone();
        for e in iter {
            if e.len() != sum.len() {
                return None;
            }
            sum += &e.vector;
        }
        Some(Self::normalized(sum.to_vec()))
    }
}

/// A face found in an image.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedFace {
    pub id: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub embedding: Embedding,
}

/// How a cosine in [-1, 1] is brought into [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMapping {
    /// `(cos + 1) / 2`; opposite vectors score 0, orthogonal ones 0.5.
    #[default]
    Shifted,
    /// `max(0, cos)`; everything at or past orthogonal scores 0.
    Clamped,
}

impl SimilarityMapping {
    pub fn apply(self, cosine: f32) -> f32 {
        let mapped = match self {
            SimilarityMapping::Shifted => (cosine + 1.0) / 2.0,
            SimilarityMapping::Clamped => cosine.max(0.0),
        };
        mapped.clamp(0.0, 1.0)
    }
}

/// Cosine similarity of two embeddings, or `None` when the lengths differ
/// or either vector is zero.
pub fn cosine(a: &Embedding, b: &Embedding) -> Option<f32> {
    if a.len() != b.len() {
        log::debug!("embedding length mismatch: {} vs {}", a.len(), b.len());
        return None;
    }

    let denom = a.norm() * b.norm();
    if denom <= 0.0 {
        return None;
    }

    Some((a.vector.dot(&b.vector) / denom).clamp(-1.0, 1.0))
}

/// Similarity score in [0, 1]. An absent or degenerate embedding on either
/// side scores 0 under every mapping.
pub fn similarity(a: Option<&Embedding>, b: Option<&Embedding>, mapping: SimilarityMapping) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => cosine(a, b).map_or(0.0, |c| mapping.apply(c)),
        _ => 0.0,
    }
}

/// Score two faces against each other.
pub fn match_faces(a: &DetectedFace, b: &DetectedFace, mapping: SimilarityMapping) -> f32 {
    similarity(Some(&a.embedding), Some(&b.embedding), mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::normalized(v.to_vec())
    }

    #[test]
    fn test_normalized_unit_length() {
        let e = emb(&[3.0, 4.0]);
        assert!((e.norm() - 1.0).abs() < 1e-6);
        assert!((e.vector[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_kept() {
        let e = emb(&[0.0, 0.0, 0.0]);
        assert_eq!(e.norm(), 0.0);
    }

    #[test]
    fn test_mappings_disagree_on_negative_cosine() {
        let a = emb(&[1.0, 0.0]);
        let b = emb(&[-1.0, 0.0]);
        let c = emb(&[0.0, 1.0]);

        assert!(similarity(Some(&a), Some(&b), SimilarityMapping::Shifted).abs() < 1e-6);
        assert_eq!(similarity(Some(&a), Some(&b), SimilarityMapping::Clamped), 0.0);

        assert!((similarity(Some(&a), Some(&c), SimilarityMapping::Shifted) - 0.5).abs() < 1e-6);
        assert_eq!(similarity(Some(&a), Some(&c), SimilarityMapping::Clamped), 0.0);

        let d = emb(&[1.0, 1.0]);
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((similarity(Some(&a), Some(&d), SimilarityMapping::Clamped) - expected).abs() < 1e-6);
        assert!(
            (similarity(Some(&a), Some(&d), SimilarityMapping::Shifted) - (expected + 1.0) / 2.0)
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_self_similarity() {
        let a = emb(&[0.2, -0.7, 0.1, 0.9]);
        for mapping in [SimilarityMapping::Shifted, SimilarityMapping::Clamped] {
            assert!((similarity(Some(&a), Some(&a), mapping) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_absent_or_degenerate() {
        let a = emb(&[1.0, 0.0]);
        let zero = emb(&[0.0, 0.0]);
        let long = emb(&[1.0, 0.0, 0.0]);
        let m = SimilarityMapping::Shifted;

        assert_eq!(similarity(None, Some(&a), m), 0.0);
        assert_eq!(similarity(Some(&a), None, m), 0.0);
        assert_eq!(similarity(None, None, m), 0.0);
        assert_eq!(similarity(Some(&a), Some(&zero), m), 0.0);
        assert_eq!(similarity(Some(&a), Some(&long), m), 0.0);
    }

    #[test]
    fn test_cosine_flags_degenerate_input() {
        let a = emb(&[1.0, 0.0]);
        assert_eq!(cosine(&a, &emb(&[0.0, 0.0])), None);
        assert_eq!(cosine(&a, &emb(&[1.0, 0.0, 0.0])), None);
        assert!((cosine(&a, &emb(&[0.0, -2.0])).unwrap()).abs() < 1e-6);
        assert!((cosine(&a, &emb(&[-3.0, 0.0])).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean() {
        let a = emb(&[1.0, 0.0]);
        let b = emb(&[0.0, 1.0]);
        let m = Embedding::mean([&a, &b]).unwrap();
        assert!((m.vector[0] - m.vector[1]).abs() < 1e-6);
        assert!((m.norm() - 1.0).abs() < 1e-6);

        assert!(Embedding::mean(std::iter::empty::<&Embedding>()).is_none());
        assert!(Embedding::mean([&a, &emb(&[1.0, 0.0, 0.0])]).is_none());
    }
}
