//! Semantic skills-gap analysis: which target skills have no close
//! counterpart (by embedding cosine) among the source skills.

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::EmbeddingProvider;
use crate::application::ports::embedding_provider::EmbeddingProviderError;
use crate::application::services::matcher::{MatchStrategy, similarity_matrix};
use crate::domain::value_objects::{EmbeddingVector, SimilarityError, SkillSet};

pub const DEFAULT_SKILL_THRESHOLD: f32 = 0.75;

#[derive(Debug, Error)]
pub enum SkillGapError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingProviderError),
    #[error("Similarity failed: {0}")]
    Similarity(#[from] SimilarityError),
}

/// A skill set paired with one embedding per skill, in the set's order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSkills {
    skills: Vec<String>,
    vectors: Vec<EmbeddingVector>,
}

impl EmbeddedSkills {
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn vectors(&self) -> &[EmbeddingVector] {
        &self.vectors
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

pub struct SkillGapAnalyzer {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    strategy: MatchStrategy,
}

impl SkillGapAnalyzer {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedding_provider,
            strategy: MatchStrategy::Batched,
        }
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub async fn embed_skills(&self, skills: &SkillSet) -> Result<EmbeddedSkills, SkillGapError> {
        if skills.is_empty() {
            return Ok(EmbeddedSkills::default());
        }
        let skills = skills.to_vec();
        let vectors = self.embedding_provider.embed_batch(&skills).await?;
        Ok(EmbeddedSkills { skills, vectors })
    }

    /// Target skills whose best similarity to any source skill is strictly
    /// below `threshold`.
    pub async fn missing(
        &self,
        target: &SkillSet,
        source: &SkillSet,
        threshold: f32,
    ) -> Result<SkillSet, SkillGapError> {
        if target.is_empty() {
            return Ok(SkillSet::new());
        }
        if source.is_empty() {
            return Ok(target.clone());
        }

        let (target, source) = futures::try_join!(self.embed_skills(target), self.embed_skills(source))?;
        Ok(missing_from_embeddings(&target, &source, threshold, self.strategy)?)
    }

    /// Same as `missing`, reusing already-embedded source skills.
    pub async fn missing_against(
        &self,
        target: &SkillSet,
        source: &EmbeddedSkills,
        threshold: f32,
    ) -> Result<SkillSet, SkillGapError> {
        if target.is_empty() {
            return Ok(SkillSet::new());
        }
        if source.is_empty() {
            return Ok(target.clone());
        }

        let target = self.embed_skills(target).await?;
        Ok(missing_from_embeddings(&target, source, threshold, self.strategy)?)
    }
}

pub fn missing_from_embeddings(
    target: &EmbeddedSkills,
    source: &EmbeddedSkills,
    threshold: f32,
    strategy: MatchStrategy,
) -> Result<SkillSet, SimilarityError> {
    if target.is_empty() {
        return Ok(SkillSet::new());
    }
    if source.is_empty() {
        return Ok(target.skills.iter().collect());
    }

    let best = match strategy {
        MatchStrategy::Naive => max_similarities_looped(&target.vectors, &source.vectors)?,
        MatchStrategy::Batched => max_similarities_batched(&target.vectors, &source.vectors)?,
    };

    Ok(target
        .skills
        .iter()
        .zip(best)
        .filter(|(_, score)| *score < threshold)
        .map(|(skill, _)| skill)
        .collect())
}

fn max_similarities_looped(
    target: &[EmbeddingVector],
    source: &[EmbeddingVector],
) -> Result<Vec<f32>, SimilarityError> {
    let mut best = Vec::with_capacity(target.len());
    for t in target {
        let mut max = f32::NEG_INFINITY;
        for s in source {
            max = max.max(t.cosine_similarity(s)?);
        }
        best.push(max);
    }
    Ok(best)
}

fn max_similarities_batched(
    target: &[EmbeddingVector],
    source: &[EmbeddingVector],
) -> Result<Vec<f32>, SimilarityError> {
    let reference = &target[0];
    for v in target.iter().chain(source.iter()) {
        reference.ensure_comparable(v)?;
    }

    let dimension = reference.dimension();
    if dimension == 0 {
        return Ok(vec![0.0; target.len()]);
    }
    let rows: Vec<f32> = target.iter().flat_map(|v| v.values().iter().copied()).collect();
    let cols: Vec<f32> = source.iter().flat_map(|v| v.values().iter().copied()).collect();
    let matrix = similarity_matrix(&rows, &cols, dimension);

    Ok(matrix
        .chunks(source.len())
        .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
        .collect())
}
