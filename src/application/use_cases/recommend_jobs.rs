use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::application::deadline::Deadline;
use crate::application::errors::PipelineError;
use crate::application::ports::skill_extractor::extract_or_empty;
use crate::application::ports::text_extractor::{Document, ExtractionStrategy};
use crate::application::ports::{SkillExtractor, TextExtractor};
use crate::application::services::resume_service::{ResumeService, StoreOutcome};
use crate::application::services::skill_gap::{DEFAULT_SKILL_THRESHOLD, SkillGapAnalyzer};
use crate::domain::entities::{JobRecord, MatchResult};
use crate::domain::repositories::VectorStore;
use crate::domain::value_objects::{ContentHash, SkillSet};

pub const DEFAULT_TOP_K: usize = 5;
pub const MAX_TOP_K: usize = 100;

#[derive(Debug, Clone)]
pub struct RecommendJobsRequest {
    pub document: Document,
    pub top_k: Option<usize>,
    pub threshold: Option<f32>,
    pub timeout: Option<Duration>,
}

impl RecommendJobsRequest {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            top_k: None,
            threshold: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recommendations {
    pub resume_id: ContentHash,
    pub outcome: StoreOutcome,
    pub extraction: Option<ExtractionStrategy>,
    pub resume_skills: SkillSet,
    pub matches: Vec<MatchResult>,
    pub elapsed_ms: u64,
}

impl Recommendations {
    pub fn is_duplicate(&self) -> bool {
        self.outcome.is_duplicate()
    }
}

/// Defaults applied when a request leaves a knob unset.
#[derive(Debug, Clone)]
pub struct RecommendSettings {
    pub jobs_collection: String,
    pub top_k: usize,
    pub threshold: f32,
    pub timeout: Option<Duration>,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            jobs_collection: "jds1".to_string(),
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_SKILL_THRESHOLD,
            timeout: None,
        }
    }
}

/// Résumé in, ranked jobs with missing-skill annotations out.
///
/// Stages run strictly in order: extract, resolve the résumé vector (dedup
/// check, embed), search the jobs collection, skills and gap per match. The
/// résumé is stored only after every stage has succeeded.
pub struct RecommendJobsUseCase {
    text_extractor: Arc<dyn TextExtractor>,
    resume_service: Arc<ResumeService>,
    vector_store: Arc<dyn VectorStore>,
    resume_skills: Arc<dyn SkillExtractor>,
    job_skills_fallback: Arc<dyn SkillExtractor>,
    skill_gap: Arc<SkillGapAnalyzer>,
    settings: RecommendSettings,
}

impl RecommendJobsUseCase {
    pub fn new(
        text_extractor: Arc<dyn TextExtractor>,
        resume_service: Arc<ResumeService>,
        vector_store: Arc<dyn VectorStore>,
        resume_skills: Arc<dyn SkillExtractor>,
        job_skills_fallback: Arc<dyn SkillExtractor>,
        skill_gap: Arc<SkillGapAnalyzer>,
        settings: RecommendSettings,
    ) -> Self {
        Self {
            text_extractor,
            resume_service,
            vector_store,
            resume_skills,
            job_skills_fallback,
            skill_gap,
            settings,
        }
    }

    pub async fn execute(
        &self,
        request: RecommendJobsRequest,
    ) -> Result<Recommendations, PipelineError> {
        let start_time = std::time::Instant::now();
        let (top_k, threshold) = self.validate(request.top_k, request.threshold)?;
        let deadline = Deadline::from_option(request.timeout.or(self.settings.timeout));

        let extracted = deadline
            .run(self.text_extractor.extract(&request.document))
            .await?;
        info!(
            "Extracted {} chars from {} page(s) via {}",
            extracted.text.len(),
            extracted.page_count,
            extracted.strategy
        );
        if extracted.is_blank() {
            return Err(PipelineError::EmptyInput);
        }

        let mut recommendations = self
            .run(&extracted.text, top_k, threshold, &deadline)
            .await?;
        recommendations.extraction = Some(extracted.strategy);
        recommendations.elapsed_ms = start_time.elapsed().as_millis() as u64;
        Ok(recommendations)
    }

    /// Same pipeline starting from already-extracted résumé text.
    pub async fn recommend_for_text(
        &self,
        text: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
    ) -> Result<Recommendations, PipelineError> {
        let start_time = std::time::Instant::now();
        let (top_k, threshold) = self.validate(top_k, threshold)?;
        let deadline = Deadline::from_option(self.settings.timeout);

        let mut recommendations = self.run(text, top_k, threshold, &deadline).await?;
        recommendations.elapsed_ms = start_time.elapsed().as_millis() as u64;
        Ok(recommendations)
    }

    fn validate(
        &self,
        top_k: Option<usize>,
        threshold: Option<f32>,
    ) -> Result<(usize, f32), PipelineError> {
        let top_k = top_k.unwrap_or(self.settings.top_k);
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(PipelineError::InvalidRequest(format!(
                "top_k must be between 1 and {}",
                MAX_TOP_K
            )));
        }

        let threshold = threshold.unwrap_or(self.settings.threshold);
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidRequest(
                "threshold must lie in [-1, 1]".to_string(),
            ));
        }

        Ok((top_k, threshold))
    }

    async fn run(
        &self,
        text: &str,
        top_k: usize,
        threshold: f32,
        deadline: &Deadline,
    ) -> Result<Recommendations, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let (resume, outcome) = self.resume_service.resolve(text, deadline).await?;

        let hits = self
            .vector_store
            .search(&self.settings.jobs_collection, resume.embedding(), top_k)
            .await
            .inspect_err(|e| {
                if e.is_misconfiguration() {
                    error!("Job collection '{}' is misconfigured: {}", self.settings.jobs_collection, e);
                }
            })?;
        debug!("Search returned {} job(s)", hits.len());

        let jobs = hits
            .into_iter()
            .map(|hit| JobRecord::try_from(hit.point).map(|job| (job, hit.score)))
            .collect::<Result<Vec<_>, _>>()?;

        let resume_skills = self
            .skills_within(self.resume_skills.as_ref(), text, deadline)
            .await?;
        let resume_embedded = deadline.run(self.skill_gap.embed_skills(&resume_skills)).await?;

        let mut matches = Vec::with_capacity(jobs.len());
        for (job, score) in jobs {
            let required = self.job_skills(&job, deadline).await?;
            let missing_skills = deadline
                .run(self.skill_gap.missing_against(&required, &resume_embedded, threshold))
                .await?;
            matches.push(MatchResult {
                job,
                score,
                missing_skills,
            });
        }

        self.resume_service.commit(&resume, outcome).await?;

        Ok(Recommendations {
            resume_id: resume.id().clone(),
            outcome,
            extraction: None,
            resume_skills,
            matches,
            elapsed_ms: 0,
        })
    }

    async fn job_skills(
        &self,
        job: &JobRecord,
        deadline: &Deadline,
    ) -> Result<SkillSet, PipelineError> {
        if !job.skills().is_empty() {
            return Ok(job.skills().clone());
        }
        debug!("Job '{}' has no stored skills, extracting from description", job.title());
        self.skills_within(self.job_skills_fallback.as_ref(), job.description(), deadline)
            .await
    }

    /// Extraction failures degrade to no skills; running out of time does not.
    async fn skills_within(
        &self,
        extractor: &dyn SkillExtractor,
        text: &str,
        deadline: &Deadline,
    ) -> Result<SkillSet, PipelineError> {
        deadline
            .run(async { Ok::<_, PipelineError>(extract_or_empty(extractor, text).await) })
            .await
    }
}
