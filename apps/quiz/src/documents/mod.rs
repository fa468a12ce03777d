//! Document-store collaborator: append-only JSON records grouped by a
//! slash-separated collection path (e.g. `users/<uid>/quizResponses`).

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::create_pool;
use crate::models::user::UserId;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid collection path: '{0}'")]
    InvalidCollection(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Appends `record` to `collection`, returning the new document id.
    async fn add_document(&self, collection: &str, record: Value) -> Result<Uuid, DocumentError>;

    /// All records in `collection`, oldest first.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>, DocumentError>;
}

/// Collection holding the full quiz submissions of one user.
pub fn quiz_responses_collection(uid: &UserId) -> String {
    format!("users/{uid}/quizResponses")
}

fn validate_collection(collection: &str) -> Result<(), DocumentError> {
    if collection.is_empty() || collection.split('/').any(|segment| segment.trim().is_empty()) {
        return Err(DocumentError::InvalidCollection(collection.to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add_document(&self, collection: &str, record: Value) -> Result<Uuid, DocumentError> {
        validate_collection(collection)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(record);
        Ok(Uuid::new_v4())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>, DocumentError> {
        validate_collection(collection)?;
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq        BIGSERIAL PRIMARY KEY,
    id         UUID NOT NULL UNIQUE,
    collection TEXT NOT NULL,
    body       JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_COLLECTION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents (collection, seq)";

/// JSONB rows in a single `documents` table. Append-only: rows are never updated.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        sqlx::query(CREATE_DOCUMENTS_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_COLLECTION_INDEX).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn add_document(&self, collection: &str, record: Value) -> Result<Uuid, DocumentError> {
        validate_collection(collection)?;
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(collection)
            .bind(record)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>, DocumentError> {
        validate_collection(collection)?;
        Ok(sqlx::query_scalar::<_, Value>(
            "SELECT body FROM documents WHERE collection = $1 ORDER BY seq ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?)
    }
}
