use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::repositories::{StoredPoint, VectorStoreError};
use crate::domain::value_objects::{ContentHash, EmbeddingVector};

#[derive(Debug, Serialize, Deserialize)]
struct ResumePayload {
    hash: ContentHash,
    #[serde(default)]
    stored_at: Option<DateTime<Utc>>,
}

/// A résumé's cached embedding, keyed by the hash of its normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeRecord {
    id: ContentHash,
    embedding: EmbeddingVector,
    stored_at: DateTime<Utc>,
}

impl ResumeRecord {
    pub fn new(id: ContentHash, embedding: EmbeddingVector) -> Self {
        Self {
            id,
            embedding,
            stored_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &ContentHash {
        &self.id
    }

    pub fn embedding(&self) -> &EmbeddingVector {
        &self.embedding
    }

    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    pub fn to_point(&self) -> StoredPoint {
        let payload = ResumePayload {
            hash: self.id.clone(),
            stored_at: Some(self.stored_at),
        };
        StoredPoint::new(
            self.id.clone(),
            self.embedding.clone(),
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }
}

impl TryFrom<StoredPoint> for ResumeRecord {
    type Error = VectorStoreError;

    fn try_from(point: StoredPoint) -> Result<Self, Self::Error> {
        let payload: ResumePayload = serde_json::from_value(point.payload)
            .map_err(|e| VectorStoreError::InvalidPayload(format!("resume {}: {}", point.id, e)))?;

        if !payload.hash.matches(&point.content_hash) {
            return Err(VectorStoreError::InvalidPayload(format!(
                "resume {}: payload hash does not match point hash",
                point.id
            )));
        }

        Ok(Self {
            id: point.content_hash,
            embedding: point.vector,
            stored_at: payload.stored_at.unwrap_or(point.updated_at),
        })
    }
}
