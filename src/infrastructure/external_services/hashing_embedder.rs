//! Offline embedding provider based on signed feature hashing.
//!
//! Features are lowercase word unigrams (weight 1.0), word bigrams (0.5) and
//! character trigrams of each word padded with spaces (0.5). Each feature is
//! hashed with 64-bit FNV-1a; the hash modulo the dimension picks a bucket and the top bit the
//! sign. The result is L2-normalised, so identical text always yields the
//! identical vector and texts sharing vocabulary land close together.

use async_trait::async_trait;

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, ensure_not_blank,
};
use crate::domain::value_objects::{EmbeddingVector, ModelTag};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

pub const HASHING_MODEL_NAME: &str = "feature-hashing";

pub struct HashingEmbeddingProvider {
    model: ModelTag,
    dimension: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            model: ModelTag::new(HASHING_MODEL_NAME, format!("{}d", dimension)),
            dimension,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.model = ModelTag::new(HASHING_MODEL_NAME, format!("{}d-{}", self.dimension, version));
        self
    }

    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dimension];
        let words: Vec<String> = text
            .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
            .map(|w| w.trim_matches('.').to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        for word in &words {
            self.add(&mut values, word.as_bytes(), 1.0);

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add(&mut values, gram.as_bytes(), 0.5);
            }
        }
        for pair in words.windows(2) {
            let bigram = format!("{}\u{1f}{}", pair[0], pair[1]);
            self.add(&mut values, bigram.as_bytes(), 0.5);
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        values
    }

    fn add(&self, values: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        values[bucket] += sign * weight;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingProviderError> {
        ensure_not_blank(text)?;
        Ok(EmbeddingVector::new(self.model.clone(), self.vectorize(text)))
    }

    fn model(&self) -> &ModelTag {
        &self.model
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}
