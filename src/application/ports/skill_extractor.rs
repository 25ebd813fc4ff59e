use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::application::ports::embedding_provider::EmbeddingProviderError;
use crate::domain::value_objects::{SimilarityError, SkillSet};

#[derive(Debug, Error)]
pub enum SkillExtractionError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingProviderError),
    #[error("Similarity failed: {0}")]
    Similarity(#[from] SimilarityError),
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStrategy {
    #[default]
    Dictionary,
    Keyphrase,
}

impl FromStr for SkillStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dictionary" | "keyword" => Ok(SkillStrategy::Dictionary),
            "keyphrase" | "keybert" | "statistical" => Ok(SkillStrategy::Keyphrase),
            other => Err(format!("Invalid skill strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for SkillStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillStrategy::Dictionary => write!(f, "dictionary"),
            SkillStrategy::Keyphrase => write!(f, "keyphrase"),
        }
    }
}

#[async_trait]
pub trait SkillExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<SkillSet, SkillExtractionError>;

    fn strategy(&self) -> SkillStrategy;
}

/// Runs an extractor, degrading to an empty set on failure.
pub async fn extract_or_empty(extractor: &dyn SkillExtractor, text: &str) -> SkillSet {
    match extractor.extract(text).await {
        Ok(skills) => skills,
        Err(e) => {
            warn!(
                "{} skill extraction failed, continuing with no skills: {}",
                extractor.strategy(),
                e
            );
            SkillSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("dictionary".parse::<SkillStrategy>(), Ok(SkillStrategy::Dictionary));
        assert_eq!(" KeyPhrase ".parse::<SkillStrategy>(), Ok(SkillStrategy::Keyphrase));
        assert!("regex".parse::<SkillStrategy>().is_err());
    }
}
