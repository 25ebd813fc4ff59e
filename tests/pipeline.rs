use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use jobmatch::application::PipelineError;
use jobmatch::application::ports::EmbeddingProvider;
use jobmatch::application::ports::embedding_provider::EmbeddingProviderError;
use jobmatch::application::ports::text_extractor::Document;
use jobmatch::application::services::{ResumeService, SkillGapAnalyzer, StoreOutcome};
use jobmatch::application::use_cases::{
    IngestJobsUseCase, RecommendJobsRequest, RecommendJobsUseCase, RecommendSettings,
};
use jobmatch::domain::entities::JobPosting;
use jobmatch::domain::repositories::VectorStore;
use jobmatch::domain::value_objects::{EmbeddingVector, ModelTag};
use jobmatch::infrastructure::external_services::document_extractors::PdfTextExtractor;
use jobmatch::infrastructure::skill_extractors::{
    DictionarySkillExtractor, KeyphraseSkillExtractor, SkillVocabulary,
};
use jobmatch::infrastructure::vector_store::LocalVectorStore;

const DIM: usize = 10;
const RESUME: &str = "Jane Doe. Analyst with Python and SQL.";

/// Returns fixed vectors for known texts. Documents live on axes 0-1, each
/// skill on its own axis, anything else on the last axis.
struct ScriptedProvider {
    table: HashMap<String, Vec<f32>>,
    model: ModelTag,
}

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    v
}

fn at_cosine(c: f32) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[0] = c;
    v[1] = (1.0 - c * c).sqrt();
    v
}

fn postings() -> Vec<JobPosting> {
    vec![
        JobPosting {
            title: "data engineer".to_string(),
            description: "Build pipelines".to_string(),
            skills: "python, aws".to_string(),
            source_url: Some("https://jobs.example.com/jd1".to_string()),
        },
        JobPosting {
            title: "backend developer".to_string(),
            description: "Ship services".to_string(),
            skills: "java, docker".to_string(),
            source_url: None,
        },
        JobPosting {
            title: "bi analyst".to_string(),
            description: "Dashboards".to_string(),
            skills: "sql, excel".to_string(),
            source_url: None,
        },
    ]
}

impl ScriptedProvider {
    fn new() -> Self {
        let jobs = postings();
        let mut table = HashMap::new();
        table.insert(RESUME.to_string(), at_cosine(1.0));
        table.insert(jobs[0].embedding_text(), at_cosine(0.9));
        table.insert(jobs[1].embedding_text(), at_cosine(0.3));
        table.insert(jobs[2].embedding_text(), at_cosine(0.7));
        for (i, skill) in ["python", "sql", "aws", "excel", "java", "docker"].iter().enumerate() {
            table.insert(skill.to_string(), axis(2 + i));
        }
        Self {
            table,
            model: ModelTag::new("scripted", "1"),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingProviderError> {
        if text.trim().is_empty() {
            return Err(EmbeddingProviderError::EmptyInput);
        }
        let values = self
            .table
            .get(text.trim())
            .cloned()
            .unwrap_or_else(|| axis(DIM - 1));
        Ok(EmbeddingVector::new(self.model.clone(), values))
    }

    fn model(&self) -> &ModelTag {
        &self.model
    }

    fn embedding_dimension(&self) -> usize {
        DIM
    }
}

/// Takes ten seconds per text.
struct SlowProvider(ScriptedProvider);

#[async_trait]
impl EmbeddingProvider for SlowProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingProviderError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        self.0.embed(text).await
    }

    fn model(&self) -> &ModelTag {
        self.0.model()
    }

    fn embedding_dimension(&self) -> usize {
        DIM
    }
}

struct Pipeline {
    store: Arc<LocalVectorStore>,
    recommend: RecommendJobsUseCase,
    dir: tempfile::TempDir,
}

async fn pipeline() -> Pipeline {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalVectorStore::open(dir.path()).await.unwrap());
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(ScriptedProvider::new());

    let summary = IngestJobsUseCase::new(provider.clone(), store.clone(), "jds1")
        .execute(postings())
        .await
        .unwrap();
    assert_eq!(summary.upserted, 3);

    let vocabulary = SkillVocabulary::from_phrases(["python", "sql", "aws", "excel", "java", "docker"]);
    let recommend = RecommendJobsUseCase::new(
        Arc::new(PdfTextExtractor::new()),
        Arc::new(ResumeService::new(provider.clone(), store.clone(), "resumes")),
        store.clone(),
        Arc::new(DictionarySkillExtractor::new(vocabulary).unwrap()),
        Arc::new(KeyphraseSkillExtractor::new(provider.clone(), 5)),
        Arc::new(SkillGapAnalyzer::new(provider)),
        RecommendSettings {
            top_k: 2,
            ..Default::default()
        },
    );

    Pipeline {
        store,
        recommend,
        dir,
    }
}

#[tokio::test]
async fn test_ranks_jobs_and_reports_missing_skills() {
    let p = pipeline().await;
    let result = p.recommend.recommend_for_text(RESUME, None, None).await.unwrap();

    assert_eq!(result.outcome, StoreOutcome::Stored);
    assert_eq!(result.resume_skills.to_vec(), vec!["python", "sql"]);

    let titles: Vec<&str> = result.matches.iter().map(|m| m.job.title()).collect();
    assert_eq!(titles, vec!["data engineer", "bi analyst"]);
    assert!((result.matches[0].score - 0.9).abs() < 1e-4);
    assert!((result.matches[1].score - 0.7).abs() < 1e-4);
    assert_eq!(result.matches[0].missing_skills.to_vec(), vec!["aws"]);
    assert_eq!(result.matches[1].missing_skills.to_vec(), vec!["excel"]);
}

#[tokio::test]
async fn test_second_submission_is_duplicate() {
    let p = pipeline().await;
    let first = p.recommend.recommend_for_text(RESUME, None, None).await.unwrap();
    let second = p.recommend.recommend_for_text(RESUME, None, None).await.unwrap();

    assert!(!first.is_duplicate());
    assert!(second.is_duplicate());
    assert_eq!(first.resume_id, second.resume_id);
    assert_eq!(p.store.count("resumes").await.unwrap(), 1);

    let titles = |r: &jobmatch::application::use_cases::Recommendations| {
        r.matches.iter().map(|m| m.job.id().clone()).collect::<Vec<_>>()
    };
    assert_eq!(titles(&first), titles(&second));
}

#[tokio::test]
async fn test_threshold_zero_reports_nothing_missing() {
    let p = pipeline().await;
    // Orthogonal skills score 0.0, which is not below a threshold of 0.
    let result = p
        .recommend
        .recommend_for_text(RESUME, Some(3), Some(0.0))
        .await
        .unwrap();
    assert_eq!(result.matches.len(), 3);
    assert!(result.matches.iter().all(|m| m.missing_skills.is_empty()));
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_work() {
    let p = pipeline().await;
    assert!(matches!(
        p.recommend.recommend_for_text(RESUME, Some(0), None).await,
        Err(PipelineError::InvalidRequest(_))
    ));
    assert!(matches!(
        p.recommend.recommend_for_text(RESUME, None, Some(2.0)).await,
        Err(PipelineError::InvalidRequest(_))
    ));
    assert!(matches!(
        p.recommend.recommend_for_text("  \n", None, None).await,
        Err(PipelineError::EmptyInput)
    ));
    assert!(p.store.collection_info("resumes").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreadable_document_is_extraction_error() {
    let p = pipeline().await;
    let request = RecommendJobsRequest::new(Document::new(b"not a pdf".to_vec()));
    assert!(matches!(
        p.recommend.execute(request).await,
        Err(PipelineError::Extraction(_))
    ));
}

#[tokio::test]
async fn test_store_survives_reopen() {
    let p = pipeline().await;
    p.recommend.recommend_for_text(RESUME, None, None).await.unwrap();

    let reopened = LocalVectorStore::open(p.dir.path()).await.unwrap();
    assert_eq!(reopened.count("jds1").await.unwrap(), 3);
    assert_eq!(reopened.count("resumes").await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_keyphrase_extraction_hits_the_deadline() {
    let store = Arc::new(LocalVectorStore::in_memory());
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(ScriptedProvider::new());
    IngestJobsUseCase::new(provider.clone(), store.clone(), "jds1")
        .execute(postings())
        .await
        .unwrap();

    let slow: Arc<dyn EmbeddingProvider> = Arc::new(SlowProvider(ScriptedProvider::new()));
    let recommend = RecommendJobsUseCase::new(
        Arc::new(PdfTextExtractor::new()),
        Arc::new(ResumeService::new(provider.clone(), store.clone(), "resumes")),
        store.clone(),
        Arc::new(KeyphraseSkillExtractor::new(slow.clone(), 5)),
        Arc::new(KeyphraseSkillExtractor::new(slow, 5)),
        Arc::new(SkillGapAnalyzer::new(provider)),
        RecommendSettings {
            timeout: Some(Duration::from_secs(1)),
            ..Default::default()
        },
    );

    let started = tokio::time::Instant::now();
    let result = recommend.recommend_for_text(RESUME, None, None).await;

    assert!(matches!(result, Err(PipelineError::Timeout(d)) if d == Duration::from_secs(1)));
    assert!(started.elapsed() < Duration::from_secs(2));
    // The timed-out run leaves no cached résumé behind.
    assert!(store.collection_info("resumes").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_description_fallback_hits_the_deadline() {
    let store = Arc::new(LocalVectorStore::in_memory());
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(ScriptedProvider::new());
    let unskilled = JobPosting {
        title: "generalist".to_string(),
        description: "Kubernetes operator wanted".to_string(),
        skills: String::new(),
        source_url: None,
    };
    IngestJobsUseCase::new(provider.clone(), store.clone(), "jds1")
        .execute(vec![unskilled])
        .await
        .unwrap();

    let slow: Arc<dyn EmbeddingProvider> = Arc::new(SlowProvider(ScriptedProvider::new()));
    let vocabulary = SkillVocabulary::from_phrases(["python", "sql"]);
    let recommend = RecommendJobsUseCase::new(
        Arc::new(PdfTextExtractor::new()),
        Arc::new(ResumeService::new(provider.clone(), store.clone(), "resumes")),
        store.clone(),
        Arc::new(DictionarySkillExtractor::new(vocabulary).unwrap()),
        Arc::new(KeyphraseSkillExtractor::new(slow, 5)),
        Arc::new(SkillGapAnalyzer::new(provider)),
        RecommendSettings {
            timeout: Some(Duration::from_secs(1)),
            ..Default::default()
        },
    );

    let started = tokio::time::Instant::now();
    let result = recommend.recommend_for_text(RESUME, None, None).await;

    assert!(matches!(result, Err(PipelineError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(store.collection_info("resumes").await.unwrap().is_none());
}
