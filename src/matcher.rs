use std::collections::HashSet;
use std::sync::Arc;

use facegallery_vision::face::match_faces;
use facegallery_vision::{DetectedFace, SimilarityMapping};
use log::debug;

use crate::gallery::ImageItem;

/// A gallery item together with its best face similarity to the reference.
#[derive(Debug, Clone)]
pub struct Match {
    pub item: Arc<ImageItem>,
    pub score: f32,
}

/// Highest similarity over all reference-face × item-face pairs.
pub fn best_score(
    reference: &[DetectedFace],
    faces: &[DetectedFace],
    mapping: SimilarityMapping,
) -> Option<f32> {
    reference
        .iter()
        .flat_map(|r| faces.iter().map(move |f| match_faces(r, f, mapping)))
        .fold(None, |acc, s| match acc {
            Some(best) if best >= s => Some(best),
            _ => Some(s),
        })
}

/// Items whose best score exceeds `threshold`, best first.
///
/// Items without faces never match. Each item appears at most once; equal
/// scores keep gallery order.
pub fn find_matches(
    reference: &[DetectedFace],
    items: &[Arc<ImageItem>],
    threshold: f32,
    mapping: SimilarityMapping,
) -> Vec<Match> {
    let mut seen = HashSet::new();
    let mut matches: Vec<Match> = items
        .iter()
        .filter(|item| seen.insert(item.id.clone()))
        .filter_map(|item| {
            let score = best_score(reference, item.faces(), mapping)?;
            debug!("photo {} similarity: {:.3}", item.id, score);
            (score > threshold).then(|| Match {
                item: item.clone(),
                score,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}
