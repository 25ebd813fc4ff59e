use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies the model (and its version) that produced a vector.
/// Vectors are only comparable when their tags are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTag {
    name: String,
    version: String,
}

impl ModelTag {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parses the `name@version` form written by `Display`.
    pub fn parse(tag: &str) -> Option<Self> {
        let (name, version) = tag.rsplit_once('@')?;
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(name, version))
    }
}

impl std::fmt::Display for ModelTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimilarityError {
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
    #[error("Model mismatch: {left} vs {right}")]
    ModelMismatch { left: String, right: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    model: ModelTag,
    values: Vec<f32>,
}

impl EmbeddingVector {
    pub fn new(model: ModelTag, values: Vec<f32>) -> Self {
        Self { model, values }
    }

    pub fn model(&self) -> &ModelTag {
        &self.model
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn norm(&self) -> f32 {
        norm(&self.values)
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn ensure_comparable(&self, other: &EmbeddingVector) -> Result<(), SimilarityError> {
        if self.model != other.model {
            return Err(SimilarityError::ModelMismatch {
                left: self.model.to_string(),
                right: other.model.to_string(),
            });
        }
        if self.dimension() != other.dimension() {
            return Err(SimilarityError::DimensionMismatch {
                left: self.dimension(),
                right: other.dimension(),
            });
        }
        Ok(())
    }

    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> Result<f32, SimilarityError> {
        self.ensure_comparable(other)?;
        Ok(cosine(&self.values, &other.values))
    }
}

// The naive and batched matchers both go through `dot` and `norm` so their
// scores agree bit for bit.

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f32]) -> f32 {
    a.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine from a precomputed pair of norms. Zero vectors score 0.0.
pub fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, norm(a), b, norm(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag() -> ModelTag {
        ModelTag::new("test-model", "1")
    }

    #[test]
    fn test_cosine_bounds() {
        let a = EmbeddingVector::new(tag(), vec![1.0, 0.0]);
        let b = EmbeddingVector::new(tag(), vec![-1.0, 0.0]);
        let c = EmbeddingVector::new(tag(), vec![0.0, 2.0]);

        assert!((a.cosine_similarity(&a).unwrap() - 1.0).abs() < 1e-6);
        assert!((a.cosine_similarity(&b).unwrap() + 1.0).abs() < 1e-6);
        assert!(a.cosine_similarity(&c).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let a = EmbeddingVector::new(tag(), vec![0.0, 0.0]);
        let b = EmbeddingVector::new(tag(), vec![1.0, 1.0]);
        assert!(a.is_zero());
        assert_eq!(a.cosine_similarity(&b).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let a = EmbeddingVector::new(tag(), vec![1.0, 0.0]);
        let b = EmbeddingVector::new(tag(), vec![1.0, 0.0, 0.0]);
        assert_eq!(
            a.cosine_similarity(&b),
            Err(SimilarityError::DimensionMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_model_mismatch_rejected() {
        let a = EmbeddingVector::new(tag(), vec![1.0, 0.0]);
        let b = EmbeddingVector::new(ModelTag::new("test-model", "2"), vec![1.0, 0.0]);
        assert!(matches!(
            a.cosine_similarity(&b),
            Err(SimilarityError::ModelMismatch { .. })
        ));
    }

    #[test]
    fn test_model_tag_round_trips_display() {
        let tag = ModelTag::new("all-mpnet-base-v2", "1");
        assert_eq!(tag.to_string(), "all-mpnet-base-v2@1");
        assert_eq!(ModelTag::parse("all-mpnet-base-v2@1"), Some(tag));
        assert_eq!(ModelTag::parse("no-version"), None);
    }
}
