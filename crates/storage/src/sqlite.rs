//! SQLite document store

use crate::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS documents (
        seq        INTEGER PRIMARY KEY AUTOINCREMENT,
        id         TEXT    NOT NULL UNIQUE,
        collection TEXT    NOT NULL,
        body       TEXT    NOT NULL,
        created_at TEXT    NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection, seq)",
];

/// Store persisting documents as JSON text in SQLite
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url`
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Opening SQLite document store at {}", url);
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database. A single connection is kept open for the
    /// lifetime of the pool, otherwise the data would vanish.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create_record(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(&record)?;

        sqlx::query(
            "INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection)
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Inserted document {} into {}", id, collection);
        Ok(id)
    }

    async fn list_records(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY seq")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Document, StoreError> {
                let id: String = row.try_get("id")?;
                let body: String = row.try_get("body")?;
                Ok(Document {
                    id,
                    data: serde_json::from_str(&body)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_preserves_body() {
        let store = SqliteStore::in_memory().await.unwrap();
        let record = json!({
            "sessionId": "session_1700000000000",
            "view1": "data:image/jpeg;base64,AAAA",
            "view2": null,
            "imageCount": 1,
        });

        let id = store.create_record("captured_images", record.clone()).await.unwrap();
        let docs = store.list_records("captured_images").await.unwrap();

        assert_eq!(docs, vec![Document { id, data: record }]);
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let store = SqliteStore::in_memory().await.unwrap();
        for i in 0..5 {
            store.create_record("c", json!({ "n": i })).await.unwrap();
        }
        store.create_record("other", json!({ "n": -1 })).await.unwrap();

        let docs = store.list_records("c").await.unwrap();
        let order: Vec<_> = docs.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.list_records("captured_images").await.unwrap().is_empty());
    }
}
