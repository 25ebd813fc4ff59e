use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{ContentHash, EmbeddingVector, ModelTag};

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
    #[error("Model mismatch in collection '{collection}': stored {expected}, got {actual}")]
    ModelMismatch {
        collection: String,
        expected: String,
        actual: String,
    },
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl VectorStoreError {
    /// Misconfiguration errors are fatal to a run and never retried.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            VectorStoreError::CollectionNotFound(_)
                | VectorStoreError::DimensionMismatch { .. }
                | VectorStoreError::ModelMismatch { .. }
        )
    }
}

/// A record as the store sees it: id, vector and an opaque JSON payload.
/// Typed entities convert to and from this at the store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPoint {
    pub id: Uuid,
    pub content_hash: ContentHash,
    pub vector: EmbeddingVector,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl StoredPoint {
    pub fn new(content_hash: ContentHash, vector: EmbeddingVector, payload: serde_json::Value) -> Self {
        Self {
            id: content_hash.point_id(),
            content_hash,
            vector,
            payload,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub point: StoredPoint,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: usize,
    pub model: ModelTag,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection if absent. Safe to race: exactly one caller
    /// observes `Created`, the others `AlreadyExists`. An existing collection
    /// with a different dimension or model is an error.
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
        model: &ModelTag,
    ) -> Result<CollectionStatus, VectorStoreError>;

    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Idempotent write keyed by content hash; the collection is created
    /// lazily from the first point's dimension.
    async fn upsert(&self, collection: &str, point: StoredPoint) -> Result<(), VectorStoreError> {
        self.upsert_batch(collection, vec![point]).await
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        points: Vec<StoredPoint>,
    ) -> Result<(), VectorStoreError>;

    async fn exists(&self, collection: &str, hash: &ContentHash) -> Result<bool, VectorStoreError>;

    async fn get(
        &self,
        collection: &str,
        hash: &ContentHash,
    ) -> Result<Option<StoredPoint>, VectorStoreError>;

    /// Top-`limit` points by cosine similarity, descending, ties in
    /// insertion order.
    async fn search(
        &self,
        collection: &str,
        query: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorStoreError>;

    async fn count(&self, collection: &str) -> Result<usize, VectorStoreError>;
}

/// Shared validation of a point batch against a collection's shape.
pub fn check_point_shape(
    collection: &str,
    info: &CollectionInfo,
    vector: &EmbeddingVector,
) -> Result<(), VectorStoreError> {
    if vector.dimension() != info.dimension {
        return Err(VectorStoreError::DimensionMismatch {
            collection: collection.to_string(),
            expected: info.dimension,
            actual: vector.dimension(),
        });
    }
    if vector.model() != &info.model {
        return Err(VectorStoreError::ModelMismatch {
            collection: collection.to_string(),
            expected: info.model.to_string(),
            actual: vector.model().to_string(),
        });
    }
    Ok(())
}
