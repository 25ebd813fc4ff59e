//! Embedding-ranked keyphrase extraction.
//!
//! Candidates are the 1- and 2-token n-grams of the text once stop words are
//! removed. Each candidate is embedded and scored by cosine similarity to the
//! embedding of the whole document; the best `top_n` become the skill set.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::EmbeddingProvider;
use crate::application::ports::skill_extractor::{
    SkillExtractionError, SkillExtractor, SkillStrategy,
};
use crate::application::services::Matcher;
use crate::domain::value_objects::{EmbeddingVector, SkillSet};

pub const DEFAULT_TOP_N: usize = 10;

const EMBED_BATCH_SIZE: usize = 100;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
    "ever", "every", "few", "for", "from", "further", "get", "had", "has", "have", "having",
    "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in",
    "into", "is", "it", "its", "itself", "just", "least", "less", "may", "me", "might", "more",
    "most", "must", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "one", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "per",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "within",
    "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

pub struct KeyphraseSkillExtractor {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    top_n: usize,
    matcher: Matcher,
}

impl KeyphraseSkillExtractor {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>, top_n: usize) -> Self {
        Self {
            embedding_provider,
            top_n,
            matcher: Matcher::default(),
        }
    }

    async fn embed_candidates(
        &self,
        candidates: &[String],
    ) -> Result<Vec<EmbeddingVector>, SkillExtractionError> {
        let mut vectors = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(EMBED_BATCH_SIZE) {
            vectors.extend(self.embedding_provider.embed_batch(batch).await?);
        }
        Ok(vectors)
    }
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|token| token.trim_matches('.').to_lowercase())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !token.chars().all(|c| c.is_numeric()))
        .collect()
}

/// Unigrams and bigrams over the stop-word-free token stream, deduplicated
/// in order of first occurrence.
pub fn candidate_phrases(text: &str) -> Vec<String> {
    let tokens: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|token| !is_stop_word(token))
        .collect();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if seen.insert(token.clone()) {
            candidates.push(token.clone());
        }
        if let Some(next) = tokens.get(i + 1) {
            let bigram = format!("{} {}", token, next);
            if seen.insert(bigram.clone()) {
                candidates.push(bigram);
            }
        }
    }
    candidates
}

#[async_trait]
impl SkillExtractor for KeyphraseSkillExtractor {
    async fn extract(&self, text: &str) -> Result<SkillSet, SkillExtractionError> {
        let candidates = candidate_phrases(text);
        if candidates.is_empty() || self.top_n == 0 {
            return Ok(SkillSet::new());
        }

        let document = self.embedding_provider.embed(text).await?;
        let vectors = self.embed_candidates(&candidates).await?;
        let refs: Vec<&EmbeddingVector> = vectors.iter().collect();
        let ranked = self.matcher.top_k(&document, &refs, self.top_n)?;

        debug!(
            "Kept {} of {} keyphrase candidate(s)",
            ranked.len(),
            candidates.len()
        );
        Ok(ranked
            .into_iter()
            .map(|r| candidates[r.index].as_str())
            .collect())
    }

    fn strategy(&self) -> SkillStrategy {
        SkillStrategy::Keyphrase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::external_services::HashingEmbeddingProvider;

    #[test]
    fn test_candidates_skip_stop_words_and_repeat() {
        let candidates = candidate_phrases("Build the data pipelines. Build data pipelines!");
        assert_eq!(
            candidates,
            vec!["build", "build data", "data", "data pipelines", "pipelines", "pipelines build"]
        );
    }

    #[test]
    fn test_symbols_survive_tokenizing() {
        let candidates = candidate_phrases("C++ and C# on 2 servers");
        assert!(candidates.contains(&"c++".to_string()));
        assert!(candidates.contains(&"c#".to_string()));
        assert!(!candidates.contains(&"2".to_string()));
    }

    #[tokio::test]
    async fn test_extracts_at_most_top_n() {
        let extractor = KeyphraseSkillExtractor::new(Arc::new(HashingEmbeddingProvider::new(256)), 3);
        let skills = extractor
            .extract("We need a data engineer with python, spark and airflow experience building pipelines")
            .await
            .unwrap();
        assert!(!skills.is_empty());
        assert!(skills.len() <= 3);
    }

    #[tokio::test]
    async fn test_stop_words_only_is_empty() {
        let extractor = KeyphraseSkillExtractor::new(Arc::new(HashingEmbeddingProvider::new(16)), 5);
        assert!(extractor.extract("and the of with").await.unwrap().is_empty());
        assert!(extractor.extract("   ").await.unwrap().is_empty());
    }
}
