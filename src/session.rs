//! Upload, search and clear, as driven by the user.
//!
//! Every operation reports a [`Notice`] instead of failing. Uploads in a
//! format other than JPEG, PNG, GIF or WebP are skipped, accepted files that
//! fail to decode get an empty face list, and anything else is logged and
//! surfaced as a failure notice while the gallery stays usable.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use facegallery_vision::decode;
use facegallery_vision::{DetectedFace, Pipeline};
use log::{error, info, warn};
use rayon::prelude::*;

use crate::config::Config;
use crate::gallery::{Gallery, ImageItem, ImageSource, Listing};
use crate::matcher::{self, Match};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
}

/// Admits one search at a time. Requests made while a search runs are
/// rejected, not queued.
#[derive(Debug, Default)]
pub struct SearchGate {
    searching: AtomicBool,
}

impl SearchGate {
    pub fn state(&self) -> SearchState {
        if self.searching.load(Ordering::Acquire) {
            SearchState::Searching
        } else {
            SearchState::Idle
        }
    }

    /// Move Idle → Searching. The gate returns to Idle when the ticket drops.
    pub fn try_begin(&self) -> Option<SearchTicket<'_>> {
        self.searching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SearchTicket { gate: self })
    }
}

#[must_use]
pub struct SearchTicket<'a> {
    gate: &'a SearchGate,
}

impl Drop for SearchTicket<'_> {
    fn drop(&mut self) {
        self.gate.searching.store(false, Ordering::Release);
    }
}

/// User-facing, non-fatal outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Uploaded { photos: usize, faces: usize },
    UploadFailed,
    NoFacesInReference,
    Found { photos: usize },
    NoSimilarFaces,
    SearchBusy,
    SearchFailed,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::UploadFailed | Notice::NoFacesInReference | Notice::SearchFailed
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Uploaded { photos, faces } => write!(
                f,
                "{} photos uploaded and {} faces detected!",
                photos, faces
            ),
            Notice::UploadFailed => f.write_str("Error processing photos"),
            Notice::NoFacesInReference => f.write_str("No faces detected in the search image"),
            Notice::Found { photos } => write!(f, "Found {} similar photos", photos),
            Notice::NoSimilarFaces => f.write_str("No similar faces found"),
            Notice::SearchBusy => f.write_str("A search is already running"),
            Notice::SearchFailed => f.write_str("Error during search"),
        }
    }
}

/// A single user's gallery for the lifetime of the process.
pub struct Session {
    config: Config,
    pipeline: Pipeline,
    gallery: RwLock<Gallery>,
    search: SearchGate,
}

impl Session {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline,
            gallery: RwLock::new(Gallery::new()),
            search: SearchGate::default(),
        }
    }

    /// Session using the placeholder detector tuned by `config`.
    pub fn with_config(config: Config) -> Self {
        let pipeline = Pipeline::synthetic(config.sample_stride, config.max_faces);
        Self::new(config, pipeline)
    }

    pub fn search_state(&self) -> SearchState {
        self.search.state()
    }

    fn read(&self) -> RwLockReadGuard<'_, Gallery> {
        self.gallery.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Gallery> {
        self.gallery.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn items(&self) -> Vec<Arc<ImageItem>> {
        self.read().items().to_vec()
    }

    pub fn displayed(&self) -> Vec<Arc<ImageItem>> {
        self.read().displayed()
    }

    pub fn listing(&self) -> Listing {
        self.read().listing()
    }

    pub fn in_search_mode(&self) -> bool {
        self.read().in_search_mode()
    }

    /// Annotate a batch of uploads in parallel, then append them in order.
    ///
    /// Files that are not an accepted image format are left out of the batch
    /// and the photo count. Uploading while search results are shown returns
    /// to the full listing.
    pub fn upload(&self, sources: Vec<ImageSource>) -> Notice {
        let accepted: Vec<ImageItem> = sources
            .into_iter()
            .filter_map(|source| match decode::sniff_format(&source.bytes) {
                Ok(format) => Some(ImageItem::new(source, format)),
                Err(e) => {
                    warn!("skipping {}: {}", source.name, e);
                    None
                }
            })
            .collect();

        if accepted.is_empty() {
            return Notice::Uploaded {
                photos: 0,
                faces: 0,
            };
        }

        let photos = accepted.len();
        let annotated: Vec<(ImageItem, bool)> = accepted
            .into_par_iter()
            .map(|item| self.annotate(item))
            .collect();

        let all_failed = annotated.iter().all(|(_, ok)| !ok);
        let batch: Vec<ImageItem> = annotated.into_iter().map(|(item, _)| item).collect();
        let faces: usize = batch.iter().map(ImageItem::face_count).sum();
        self.write().extend(batch);

        if all_failed {
            error!("face detection failed for all {} photos", photos);
            return Notice::UploadFailed;
        }

        info!("{} photos uploaded and {} faces detected", photos, faces);
        Notice::Uploaded { photos, faces }
    }

    /// Run detection on a fresh item. On error the item is kept unannotated.
    fn annotate(&self, item: ImageItem) -> (ImageItem, bool) {
        match self.detect(&item.source) {
            Ok(faces) => (item.annotated(faces), true),
            Err(e) => {
                warn!("error processing photo {}: {:#}", item.source.name, e);
                (item, false)
            }
        }
    }

    /// Faces in `source`; an image that cannot be decoded has none.
    fn detect(&self, source: &ImageSource) -> Result<Vec<DetectedFace>> {
        let img = match decode::decode_rgba(&source.bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!("could not decode {}: {}", source.name, e);
                return Ok(Vec::new());
            }
        };
        self.pipeline
            .process_image(&img)
            .with_context(|| format!("detecting faces in {}", source.name))
    }

    /// Show the photos that share a face with `reference`.
    ///
    /// Dropped with [`Notice::SearchBusy`] if another search is running.
    pub fn search(&self, reference: &ImageSource) -> Notice {
        let Some(_ticket) = self.search.try_begin() else {
            info!("search already in progress, dropping request for {}", reference.name);
            return Notice::SearchBusy;
        };

        match self.run_search(reference) {
            Ok(notice) => notice,
            Err(e) => {
                error!("search error: {:#}", e);
                Notice::SearchFailed
            }
        }
    }

    fn run_search(&self, reference: &ImageSource) -> Result<Notice> {
        let reference_faces = self.detect(reference)?;
        if reference_faces.is_empty() {
            return Ok(Notice::NoFacesInReference);
        }
        info!("Found {} faces in search image", reference_faces.len());

        let items = self.items();
        let matches: Vec<Match> = matcher::find_matches(
            &reference_faces,
            &items,
            self.config.threshold,
            self.config.mapping,
        );

        let photos = matches.len();
        self.write().show_results(matches);

        info!("Found {} similar photos", photos);
        Ok(if photos == 0 {
            Notice::NoSimilarFaces
        } else {
            Notice::Found { photos }
        })
    }

    /// Back to showing every upload, in upload order.
    pub fn clear_search(&self) {
        self.write().clear_search();
    }
}
