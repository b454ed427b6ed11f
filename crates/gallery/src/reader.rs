//! Gallery fetch and mapping
//!
//! [`GalleryReader::fetch`] resolves to `Empty`, `Loaded` or `Failed`.
//! `Loading` is never returned by a fetch: it is the placeholder a client
//! shows while `/api/v1/records` is still in flight.

use crate::{GalleryErrorPolicy, EMPTY_MESSAGE, FAILED_MESSAGE, LOADING_MESSAGE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use storage::{Document, DocumentStore};
use tracing::{error, info, warn};

/// One uploaded session as shown in the gallery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryEntry {
    pub session_id: String,
    pub view1: Option<String>,
    pub view2: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl GalleryEntry {
    /// Map a stored document. Returns `None` for documents that are not
    /// objects. A missing session id falls back to the document id.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let data = doc.data.as_object()?;
        let text = |key: &str| data.get(key).and_then(|v| v.as_str()).map(str::to_string);

        Some(Self {
            session_id: text("sessionId").unwrap_or_else(|| doc.id.clone()),
            view1: text("view1"),
            view2: text("view2"),
            created_at: text("createdAt")
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
    }
}

/// Gallery page state. `Loading` exists for clients only, see the module docs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum GalleryState {
    Loading,
    Empty,
    Loaded(Vec<GalleryEntry>),
    Failed(String),
}

impl GalleryState {
    /// Placeholder text for states without entries
    pub fn message(&self) -> Option<&'static str> {
        match self {
            GalleryState::Loading => Some(LOADING_MESSAGE),
            GalleryState::Empty => Some(EMPTY_MESSAGE),
            GalleryState::Failed(_) => Some(FAILED_MESSAGE),
            GalleryState::Loaded(_) => None,
        }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        match self {
            GalleryState::Loaded(entries) => entries,
            _ => &[],
        }
    }
}

/// Reads the upload collection
pub struct GalleryReader {
    store: Arc<dyn DocumentStore>,
    collection: String,
    error_policy: GalleryErrorPolicy,
}

impl GalleryReader {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        error_policy: GalleryErrorPolicy,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            error_policy,
        }
    }

    /// Fetch every record and map it for display
    pub async fn fetch(&self) -> GalleryState {
        let docs = match self.store.list_records(&self.collection).await {
            Ok(docs) => docs,
            Err(e) => {
                error!("Error fetching images: {}", e);
                return match self.error_policy {
                    GalleryErrorPolicy::Silent => GalleryState::Empty,
                    GalleryErrorPolicy::Surface => GalleryState::Failed(e.to_string()),
                };
            }
        };

        let entries: Vec<_> = docs
            .iter()
            .filter_map(|doc| {
                let entry = GalleryEntry::from_document(doc);
                if entry.is_none() {
                    warn!("Skipping malformed document {}", doc.id);
                }
                entry
            })
            .collect();

        info!("Gallery loaded {} sessions", entries.len());
        if entries.is_empty() {
            GalleryState::Empty
        } else {
            GalleryState::Loaded(entries)
        }
    }
}
