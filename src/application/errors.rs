use std::time::Duration;

use thiserror::Error;

use crate::application::ports::embedding_provider::EmbeddingProviderError;
use crate::application::ports::text_extractor::ExtractionError;
use crate::application::services::skill_gap::SkillGapError;
use crate::domain::repositories::VectorStoreError;

/// Failure of one recommendation run. A failed run writes nothing to the
/// store.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not parse résumé: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("No text could be extracted from the document")]
    EmptyInput,
    #[error("Embedding failed: {0}")]
    Embedding(EmbeddingProviderError),
    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),
    #[error("Skill gap analysis failed: {0}")]
    SkillGap(#[from] SkillGapError),
    #[error("Pipeline timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<EmbeddingProviderError> for PipelineError {
    fn from(error: EmbeddingProviderError) -> Self {
        match error {
            EmbeddingProviderError::EmptyInput => PipelineError::EmptyInput,
            other => PipelineError::Embedding(other),
        }
    }
}

impl PipelineError {
    /// True when re-running the whole pipeline may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Timeout(_) => true,
            PipelineError::Embedding(e) => e.is_transient(),
            PipelineError::SkillGap(SkillGapError::Embedding(e)) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_embedding_input_maps_to_empty_input() {
        let error: PipelineError = EmbeddingProviderError::EmptyInput.into();
        assert!(matches!(error, PipelineError::EmptyInput));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PipelineError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(PipelineError::from(EmbeddingProviderError::NetworkError("reset".into())).is_retryable());
        assert!(!PipelineError::from(EmbeddingProviderError::ApiError("400".into())).is_retryable());
        assert!(!PipelineError::Store(VectorStoreError::CollectionNotFound("jds1".into())).is_retryable());
    }
}
