use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::ports::skill_extractor::SkillStrategy;
use crate::application::services::MatchStrategy;
use crate::application::services::skill_gap::DEFAULT_SKILL_THRESHOLD;
use crate::application::use_cases::recommend_jobs::{DEFAULT_TOP_K, MAX_TOP_K};
use crate::infrastructure::skill_extractors::keyphrase::DEFAULT_TOP_N;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Remote inference endpoint; the local hashing embedder is used when unset.
    pub service_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub model_version: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub dpi: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub vector_store_url: Option<String>,
    pub vector_store_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub jobs_collection: String,
    pub resumes_collection: String,
    pub skills_vocabulary_path: Option<PathBuf>,
    pub resume_skill_strategy: SkillStrategy,
    pub keyphrase_top_n: usize,
    pub match_strategy: MatchStrategy,
    pub pipeline_timeout: Duration,
    pub ocr: OcrConfig,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let similarity_threshold = parse_or(&var, "SIMILARITY_THRESHOLD", DEFAULT_SKILL_THRESHOLD)?;
        if !(-1.0..=1.0).contains(&similarity_threshold) {
            return Err(ConfigError::invalid("SIMILARITY_THRESHOLD", "must lie in [-1, 1]"));
        }

        let top_k = parse_or(&var, "TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(ConfigError::invalid(
                "TOP_K",
                format!("must be between 1 and {}", MAX_TOP_K),
            ));
        }

        let dimension = parse_or(&var, "EMBEDDING_DIMENSION", 768usize)?;
        if dimension == 0 {
            return Err(ConfigError::invalid("EMBEDDING_DIMENSION", "must be positive"));
        }

        Ok(Self {
            vector_store_url: var("VECTOR_STORE_URL"),
            vector_store_path: var("VECTOR_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./local_store")),
            embedding: EmbeddingConfig {
                service_url: var("EMBEDDING_SERVICE_URL"),
                api_key: var("EMBEDDING_API_KEY"),
                model: var("EMBEDDING_MODEL").unwrap_or_else(|| "all-mpnet-base-v2".to_string()),
                model_version: var("EMBEDDING_MODEL_VERSION").unwrap_or_else(|| "1".to_string()),
                dimension,
                timeout_secs: parse_or(&var, "EMBEDDING_TIMEOUT_SECS", 30)?,
                max_retries: parse_or(&var, "EMBEDDING_MAX_RETRIES", 3)?,
            },
            similarity_threshold,
            top_k,
            jobs_collection: var("JOBS_COLLECTION").unwrap_or_else(|| "jds1".to_string()),
            resumes_collection: var("RESUMES_COLLECTION").unwrap_or_else(|| "resumes".to_string()),
            skills_vocabulary_path: var("SKILLS_VOCABULARY_PATH").map(PathBuf::from),
            resume_skill_strategy: parse_or(&var, "RESUME_SKILL_STRATEGY", SkillStrategy::Dictionary)?,
            keyphrase_top_n: parse_or(&var, "KEYPHRASE_TOP_N", DEFAULT_TOP_N)?,
            match_strategy: parse_or(&var, "MATCH_STRATEGY", MatchStrategy::Batched)?,
            pipeline_timeout: Duration::from_secs(parse_or(&var, "PIPELINE_TIMEOUT_SECS", 120)?),
            ocr: OcrConfig {
                tesseract_path: var("TESSERACT_PATH").unwrap_or_else(|| "tesseract".to_string()),
                pdftoppm_path: var("PDFTOPPM_PATH").unwrap_or_else(|| "pdftoppm".to_string()),
                dpi: parse_or(&var, "OCR_DPI", 300)?,
            },
        })
    }
}

fn parse_or<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
        None => Ok(default),
    }
}
