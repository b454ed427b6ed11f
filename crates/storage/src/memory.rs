//! In-memory document store

use crate::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Store backed by a map of collections (in-process, lost on restart)
pub struct MemoryStore {
    /// Documents by collection, in insertion order
    collections: Mutex<HashMap<String, Vec<Document>>>,
    /// When false every call fails, to simulate an outage
    available: AtomicBool,
    /// Number of create calls received
    creates: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory document store");
        Self {
            collections: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            creates: AtomicUsize::new(0),
        }
    }

    /// Toggle simulated availability
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `create_record` calls, successful or not
    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of documents in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store offline".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_record(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<String, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut collections = self
            .collections
            .lock()
            .map_err(|e| StoreError::DatabaseError(format!("Lock error: {}", e)))?;

        let id = Uuid::new_v4().to_string();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                data: record,
            });
        debug!("Inserted document {} into {}", id, collection);

        Ok(id)
    }

    async fn list_records(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;

        let collections = self
            .collections
            .lock()
            .map_err(|e| StoreError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}
