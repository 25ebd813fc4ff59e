use std::collections::BTreeSet;
use std::path::Path;

use crate::application::ports::skill_extractor::SkillExtractionError;
use crate::domain::value_objects::SkillSet;

const BUILTIN_SKILLS: &[&str] = &[
    // languages
    "python", "java", "javascript", "typescript", "c", "c++", "c#", "go", "golang", "rust",
    "ruby", "php", "swift", "kotlin", "scala", "r", "matlab", "perl", "bash", "shell",
    "powershell", "sql", "html", "css", "graphql", "dart",
    // frameworks and libraries
    "react", "angular", "vue", "node.js", "next.js", "django", "flask", "fastapi", "spring",
    "spring boot", "ruby on rails", "laravel", ".net", "asp.net", "tensorflow", "pytorch",
    "keras", "scikit-learn", "pandas", "numpy", "spark", "hadoop", "kafka", "airflow",
    "tableau", "power bi", "excel",
    // platforms and tools
    "aws", "azure", "gcp", "google cloud", "docker", "kubernetes", "k8s", "terraform",
    "ansible", "jenkins", "git", "github", "gitlab", "linux", "nginx", "redis",
    "elasticsearch", "mysql", "postgresql", "postgres", "mongodb", "cassandra", "dynamodb",
    "oracle", "sql server", "snowflake", "jira", "figma", "selenium", "jest", "pytest",
    // practices
    "machine learning", "deep learning", "natural language processing", "nlp",
    "computer vision", "data science", "data analysis", "data engineering", "etl",
    "data visualization", "statistics", "microservices", "rest", "ci/cd", "devops",
    "agile", "scrum", "project management", "communication", "leadership",
];

/// Curated list of known skill phrases, normalized and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    phrases: Vec<String>,
}

impl SkillVocabulary {
    pub fn builtin() -> Self {
        Self::from_phrases(BUILTIN_SKILLS.iter())
    }

    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases: BTreeSet<String> = phrases
            .into_iter()
            .filter_map(|p| SkillSet::normalize(p.as_ref()))
            .collect();
        Self {
            phrases: phrases.into_iter().collect(),
        }
    }

    /// Parses a JSON array of strings, the format the corpus tooling writes.
    pub fn from_json_str(json: &str) -> Result<Self, SkillExtractionError> {
        let phrases: Vec<String> = serde_json::from_str(json)
            .map_err(|e| SkillExtractionError::Vocabulary(e.to_string()))?;
        let vocabulary = Self::from_phrases(phrases);
        if vocabulary.is_empty() {
            return Err(SkillExtractionError::Vocabulary(
                "vocabulary contains no skills".to_string(),
            ));
        }
        Ok(vocabulary)
    }

    pub fn load(path: &Path) -> Result<Self, SkillExtractionError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SkillExtractionError::Vocabulary(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_phrases_are_normalized_and_deduplicated() {
        let vocabulary = SkillVocabulary::from_phrases(["Python", " python ", "Machine   Learning", ""]);
        assert_eq!(vocabulary.phrases(), &["machine learning", "python"]);
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["SQL", "Power BI", "sql"]"#).unwrap();

        let vocabulary = SkillVocabulary::load(file.path()).unwrap();
        assert_eq!(vocabulary.len(), 2);
    }

    #[test]
    fn test_malformed_json_is_vocabulary_error() {
        assert!(matches!(
            SkillVocabulary::from_json_str("{\"skills\": 1}"),
            Err(SkillExtractionError::Vocabulary(_))
        ));
        assert!(SkillVocabulary::from_json_str("[]").is_err());
    }

    #[test]
    fn test_builtin_is_not_empty() {
        assert!(SkillVocabulary::builtin().phrases().iter().any(|p| p == "java"));
    }
}
