//! Storage Layer
//!
//! Document store consumed by the capture and gallery screens. Callers only
//! create records and list a whole collection; there is no querying.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Collection holding uploaded capture sessions
pub const DEFAULT_COLLECTION: &str = "captured_images";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}

/// A stored record and the id the store assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

/// Document store service
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `record` into `collection` in one atomic write, returning its id
    async fn create_record(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<String, StoreError>;

    /// Every record of `collection`, in insertion order
    async fn list_records(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}

/// Which store implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite connection URL
    pub url: String,
    /// Collection capture sessions are written to
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "sqlite://captures.db".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

/// Open the configured store. Called once at startup; the handle is shared.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteStore::connect(&config.url).await?),
    };
    info!("Document store ready ({:?})", config.backend);
    Ok(store)
}
