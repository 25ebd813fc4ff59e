use async_trait::async_trait;
use thiserror::Error;

use crate::domain::value_objects::{EmbeddingVector, ModelTag};

#[derive(Debug, Error)]
pub enum EmbeddingProviderError {
    #[error("Cannot embed empty or whitespace-only text")]
    EmptyInput,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl EmbeddingProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbeddingProviderError::NetworkError(_) | EmbeddingProviderError::ServiceUnavailable(_)
        )
    }
}

/// Maps text to a fixed-dimension vector. Implementations must be
/// deterministic for a fixed model and text, and must reject blank text
/// with `EmptyInput`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingProviderError>;

    /// Embeds many texts; output order matches input order.
    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingProviderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    fn model(&self) -> &ModelTag;

    fn embedding_dimension(&self) -> usize;
}

pub fn ensure_not_blank(text: &str) -> Result<(), EmbeddingProviderError> {
    if text.trim().is_empty() {
        Err(EmbeddingProviderError::EmptyInput)
    } else {
        Ok(())
    }
}
