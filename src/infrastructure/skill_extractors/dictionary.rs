use async_trait::async_trait;
use regex::{RegexSet, RegexSetBuilder};
use tracing::debug;

use super::vocabulary::SkillVocabulary;
use crate::application::ports::skill_extractor::{
    SkillExtractionError, SkillExtractor, SkillStrategy,
};
use crate::domain::value_objects::SkillSet;

// `+`, `#` and `.` count as word characters so that `c++`, `c#` and `node.js`
// are whole tokens. A trailing `.` may still end a match (end of sentence).
const LEADING_BOUNDARY: &str = r"(?:^|[^\w+#.])";
const TRAILING_BOUNDARY: &str = r"(?:$|[^\w+#])";

const SET_SIZE_LIMIT: usize = 256 * 1024 * 1024;

/// Finds whole-phrase occurrences of vocabulary entries.
pub struct DictionarySkillExtractor {
    vocabulary: SkillVocabulary,
    patterns: RegexSet,
}

impl DictionarySkillExtractor {
    pub fn new(vocabulary: SkillVocabulary) -> Result<Self, SkillExtractionError> {
        let patterns = RegexSetBuilder::new(vocabulary.phrases().iter().map(|p| phrase_pattern(p)))
            .size_limit(SET_SIZE_LIMIT)
            .dfa_size_limit(SET_SIZE_LIMIT)
            .build()
            .map_err(|e| SkillExtractionError::Vocabulary(e.to_string()))?;

        Ok(Self {
            vocabulary,
            patterns,
        })
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn find(&self, text: &str) -> SkillSet {
        let text = text.to_lowercase();
        self.patterns
            .matches(&text)
            .into_iter()
            .map(|index| self.vocabulary.phrases()[index].as_str())
            .collect()
    }
}

fn phrase_pattern(phrase: &str) -> String {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!("{}{}{}", LEADING_BOUNDARY, body, TRAILING_BOUNDARY)
}

#[async_trait]
impl SkillExtractor for DictionarySkillExtractor {
    async fn extract(&self, text: &str) -> Result<SkillSet, SkillExtractionError> {
        let skills = self.find(text);
        debug!("Dictionary matched {} skill(s)", skills.len());
        Ok(skills)
    }

    fn strategy(&self) -> SkillStrategy {
        SkillStrategy::Dictionary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(phrases: &[&str]) -> DictionarySkillExtractor {
        DictionarySkillExtractor::new(SkillVocabulary::from_phrases(phrases)).unwrap()
    }

    #[test]
    fn test_java_does_not_match_inside_javascript() {
        let e = extractor(&["java", "javascript"]);
        let found = e.find("Experienced JavaScript developer");
        assert!(!found.contains("java"));
        assert!(found.contains("javascript"));

        let found = e.find("java developer");
        assert!(found.contains("java"));
        assert!(!found.contains("javascript"));
    }

    #[test]
    fn test_symbol_skills_are_whole_tokens() {
        let e = extractor(&["c", "c++", "c#", ".net", "node.js"]);
        let found = e.find("Wrote C++ and C# services on .NET, plus Node.js.");
        assert_eq!(found, ["c++", "c#", ".net", "node.js"].iter().collect::<SkillSet>());
    }

    #[test]
    fn test_multi_word_phrases_span_whitespace() {
        let e = extractor(&["machine learning", "learning"]);
        let found = e.find("Applied Machine\n  Learning at scale");
        assert!(found.contains("machine learning"));
        assert!(found.contains("learning"));
    }

    #[test]
    fn test_punctuation_delimits_tokens() {
        let e = extractor(&["python", "sql"]);
        let found = e.find("Skills: Python,SQL.");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_set() {
        let e = extractor(&["rust"]);
        assert!(e.extract("trust the process").await.unwrap().is_empty());
    }
}
