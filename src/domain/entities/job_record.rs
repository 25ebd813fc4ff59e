use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::repositories::{StoredPoint, VectorStoreError};
use crate::domain::value_objects::{ContentHash, EmbeddingVector, SkillSet};

/// A raw job posting as delivered by the offline scraping step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default, alias = "jdUrl")]
    pub source_url: Option<String>,
}

impl JobPosting {
    /// Identity of a posting: hash of (title, skills, description).
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::from_fields(&[&self.title, &self.skills, &self.description])
    }

    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title.trim(),
            self.skills.trim(),
            self.description.trim()
        )
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }
}

/// Payload layout stored alongside each job vector. Older corpora wrote the
/// formatted description as `fjd` and the link as `jdUrl`.
#[derive(Debug, Serialize, Deserialize)]
struct JobPayload {
    title: String,
    #[serde(alias = "fjd")]
    description: String,
    skills: String,
    hash: ContentHash,
    #[serde(default, alias = "jdUrl")]
    source_url: Option<String>,
    #[serde(default)]
    ingested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    id: ContentHash,
    title: String,
    description: String,
    required_skills: String,
    skills: SkillSet,
    embedding: EmbeddingVector,
    source_url: Option<Url>,
    ingested_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn from_posting(posting: &JobPosting, embedding: EmbeddingVector) -> Result<Self, String> {
        let source_url = parse_url(posting.source_url.as_deref())?;

        Ok(Self {
            id: posting.content_hash(),
            title: posting.title.trim().to_string(),
            description: posting.description.trim().to_string(),
            required_skills: posting.skills.trim().to_string(),
            skills: SkillSet::from_comma_separated(&posting.skills),
            embedding,
            source_url,
            ingested_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &ContentHash {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The skills field exactly as published, for display.
    pub fn required_skills(&self) -> &str {
        &self.required_skills
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    pub fn embedding(&self) -> &EmbeddingVector {
        &self.embedding
    }

    pub fn source_url(&self) -> Option<&Url> {
        self.source_url.as_ref()
    }

    pub fn ingested_at(&self) -> DateTime<Utc> {
        self.ingested_at
    }

    pub fn to_point(&self) -> StoredPoint {
        let payload = JobPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            skills: self.required_skills.clone(),
            hash: self.id.clone(),
            source_url: self.source_url.as_ref().map(Url::to_string),
            ingested_at: Some(self.ingested_at),
        };

        StoredPoint::new(
            self.id.clone(),
            self.embedding.clone(),
            // JobPayload has only string/option fields; serialization cannot fail.
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }
}

impl TryFrom<StoredPoint> for JobRecord {
    type Error = VectorStoreError;

    fn try_from(point: StoredPoint) -> Result<Self, Self::Error> {
        let payload: JobPayload = serde_json::from_value(point.payload)
            .map_err(|e| VectorStoreError::InvalidPayload(format!("job {}: {}", point.id, e)))?;

        if !payload.hash.matches(&point.content_hash) {
            return Err(VectorStoreError::InvalidPayload(format!(
                "job {}: payload hash {} does not match point hash {}",
                point.id, payload.hash, point.content_hash
            )));
        }

        let source_url = parse_url(payload.source_url.as_deref())
            .map_err(|e| VectorStoreError::InvalidPayload(format!("job {}: {}", point.id, e)))?;

        Ok(Self {
            id: point.content_hash,
            skills: SkillSet::from_comma_separated(&payload.skills),
            title: payload.title,
            description: payload.description,
            required_skills: payload.skills,
            embedding: point.vector,
            source_url,
            ingested_at: payload.ingested_at.unwrap_or(point.updated_at),
        })
    }
}

fn parse_url(raw: Option<&str>) -> Result<Option<Url>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Url::parse(value)
            .map(Some)
            .map_err(|e| format!("invalid source url '{}': {}", value, e)),
    }
}
