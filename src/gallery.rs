use std::sync::Arc;

use facegallery_vision::{DetectedFace, Embedding};
use image::ImageFormat;
use serde::Serialize;

use crate::matcher::Match;

/// Uploaded file contents plus the metadata shown in the listing.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// One photo in the gallery. Faces are filled in once, at upload.
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub id: String,
    pub source: ImageSource,
    /// Sniffed when the upload was accepted.
    pub format: ImageFormat,
    pub faces: Option<Vec<DetectedFace>>,
    pub embedding: Option<Embedding>,
}

impl ImageItem {
    pub fn new(source: ImageSource, format: ImageFormat) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            format,
            faces: None,
            embedding: None,
        }
    }

    /// Attach detection results; the aggregate embedding is their normalized mean.
    pub fn annotated(mut self, faces: Vec<DetectedFace>) -> Self {
        self.embedding = Embedding::mean(faces.iter().map(|f| &f.embedding));
        self.faces = Some(faces);
        self
    }

    pub fn faces(&self) -> &[DetectedFace] {
        self.faces.as_deref().unwrap_or(&[])
    }

    pub fn face_count(&self) -> usize {
        self.faces().len()
    }
}

#[derive(Debug, Clone, Default)]
enum View {
    #[default]
    All,
    Search(Vec<Match>),
}

/// All uploaded items plus what is currently displayed.
#[derive(Debug, Default)]
pub struct Gallery {
    items: Vec<Arc<ImageItem>>,
    view: View,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch in the given order and leave search mode, so the new
    /// photos are visible.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = ImageItem>) {
        self.items.extend(batch.into_iter().map(Arc::new));
        self.view = View::All;
    }

    pub fn items(&self) -> &[Arc<ImageItem>] {
        &self.items
    }

    pub fn in_search_mode(&self) -> bool {
        matches!(self.view, View::Search(_))
    }

    pub fn show_results(&mut self, matches: Vec<Match>) {
        self.view = View::Search(matches);
    }

    pub fn clear_search(&mut self) {
        self.view = View::All;
    }

    /// Items currently displayed, in display order.
    pub fn displayed(&self) -> Vec<Arc<ImageItem>> {
        match &self.view {
            View::All => self.items.clone(),
            View::Search(matches) => matches.iter().map(|m| m.item.clone()).collect(),
        }
    }

    pub fn listing(&self) -> Listing {
        let scores: Vec<Option<f32>> = match &self.view {
            View::All => vec![None; self.items.len()],
            View::Search(matches) => matches.iter().map(|m| Some(m.score)).collect(),
        };

        let entries = self
            .displayed()
            .iter()
            .zip(scores)
            .map(|(item, score)| ListingEntry {
                id: item.id.clone(),
                name: item.source.name.clone(),
                size_bytes: item.source.size(),
                faces: item.face_count(),
                score,
            })
            .collect();

        Listing {
            search_mode: self.in_search_mode(),
            total: self.items.len(),
            entries,
        }
    }
}

/// What the grid shows for one item.
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub id: String,
    pub name: String,
    pub size_bytes: usize,
    pub faces: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ListingEntry {
    /// Size in megabytes with one decimal, e.g. `"2.4 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub search_mode: bool,
    pub total: usize,
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    /// `"N photos"`, or `"N of M photos"` while showing search results.
    pub fn header(&self) -> String {
        if self.search_mode {
            format!("{} of {} photos", self.entries.len(), self.total)
        } else {
            format!("{} photos", self.entries.len())
        }
    }

    pub fn empty_state(&self) -> Option<&'static str> {
        if !self.entries.is_empty() {
            return None;
        }
        Some(if self.search_mode {
            "No similar faces found"
        } else {
            "No photos yet"
        })
    }
}
