use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    application::{
        ports::{
            EmbeddingProvider, OcrEngine, SkillExtractor, TextExtractor,
            skill_extractor::{SkillExtractionError, SkillStrategy},
        },
        services::{ResumeService, SkillGapAnalyzer},
        use_cases::{IngestJobsUseCase, RecommendJobsUseCase, RecommendSettings},
    },
    config::Config,
    domain::{
        repositories::{VectorStore, VectorStoreError},
        value_objects::ModelTag,
    },
    infrastructure::{
        database::{
            connection::DatabaseError, create_connection_pool, repositories::PostgresVectorStore,
            run_migrations,
        },
        external_services::{
            HashingEmbeddingProvider, InferenceEmbeddingProvider,
            document_extractors::{
                FallbackTextExtractor, PdfTextExtractor, TesseractCliOcr, TesseractConfig,
            },
            inference_client::{EmbeddingsClientConfig, InferenceClient},
        },
        skill_extractors::{DictionarySkillExtractor, KeyphraseSkillExtractor, SkillVocabulary},
        vector_store::LocalVectorStore,
    },
};

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Database setup failed: {0}")]
    Database(#[from] DatabaseError),
    #[error("Vector store setup failed: {0}")]
    VectorStore(#[from] VectorStoreError),
    #[error("Embedding client setup failed: {0}")]
    EmbeddingClient(#[from] reqwest::Error),
    #[error("Skill extractor setup failed: {0}")]
    SkillExtractor(#[from] SkillExtractionError),
}

/// Owns every long-lived service object for the lifetime of the process.
pub struct AppContainer {
    pub vector_store: Arc<dyn VectorStore>,
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub text_extractor: Arc<dyn TextExtractor>,
    pub resume_skills: Arc<dyn SkillExtractor>,

    pub resume_service: Arc<ResumeService>,
    pub skill_gap: Arc<SkillGapAnalyzer>,

    pub recommend_jobs_use_case: Arc<RecommendJobsUseCase>,
    pub ingest_jobs_use_case: Arc<IngestJobsUseCase>,
}

impl AppContainer {
    pub async fn new(config: &Config) -> Result<Self, ContainerError> {
        let vector_store = build_vector_store(config).await?;
        let embedding_provider = build_embedding_provider(config)?;
        info!(
            "Embedding with {} ({} dims)",
            embedding_provider.model(),
            embedding_provider.embedding_dimension()
        );

        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractCliOcr::new(TesseractConfig {
            tesseract_path: config.ocr.tesseract_path.clone(),
            pdftoppm_path: config.ocr.pdftoppm_path.clone(),
            dpi: config.ocr.dpi,
            timeout: config.pipeline_timeout,
        }));
        let text_extractor: Arc<dyn TextExtractor> = Arc::new(FallbackTextExtractor::new(
            Arc::new(PdfTextExtractor::new()),
            ocr,
        ));

        let keyphrase: Arc<dyn SkillExtractor> = Arc::new(KeyphraseSkillExtractor::new(
            embedding_provider.clone(),
            config.keyphrase_top_n,
        ));
        let resume_skills: Arc<dyn SkillExtractor> = match config.resume_skill_strategy {
            SkillStrategy::Dictionary => {
                let vocabulary = match &config.skills_vocabulary_path {
                    Some(path) => SkillVocabulary::load(path)?,
                    None => SkillVocabulary::builtin(),
                };
                info!("Loaded skill vocabulary with {} phrase(s)", vocabulary.len());
                Arc::new(DictionarySkillExtractor::new(vocabulary)?)
            }
            SkillStrategy::Keyphrase => keyphrase.clone(),
        };

        let resume_service = Arc::new(ResumeService::new(
            embedding_provider.clone(),
            vector_store.clone(),
            config.resumes_collection.clone(),
        ));
        let skill_gap = Arc::new(
            SkillGapAnalyzer::new(embedding_provider.clone()).with_strategy(config.match_strategy),
        );

        let recommend_jobs_use_case = Arc::new(RecommendJobsUseCase::new(
            text_extractor.clone(),
            resume_service.clone(),
            vector_store.clone(),
            resume_skills.clone(),
            keyphrase,
            skill_gap.clone(),
            RecommendSettings {
                jobs_collection: config.jobs_collection.clone(),
                top_k: config.top_k,
                threshold: config.similarity_threshold,
                timeout: Some(config.pipeline_timeout),
            },
        ));
        let ingest_jobs_use_case = Arc::new(IngestJobsUseCase::new(
            embedding_provider.clone(),
            vector_store.clone(),
            config.jobs_collection.clone(),
        ));

        Ok(Self {
            vector_store,
            embedding_provider,
            text_extractor,
            resume_skills,
            resume_service,
            skill_gap,
            recommend_jobs_use_case,
            ingest_jobs_use_case,
        })
    }
}

async fn build_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>, ContainerError> {
    match &config.vector_store_url {
        Some(url) => {
            let pool = create_connection_pool(url)?;
            let migration_pool = pool.clone();
            tokio::task::spawn_blocking(move || run_migrations(&migration_pool))
                .await
                .map_err(|e| DatabaseError::MigrationError(format!("Task join error: {}", e)))??;
            info!("Using Postgres vector store");
            Ok(Arc::new(PostgresVectorStore::new(pool)))
        }
        None => {
            let store = LocalVectorStore::open(&config.vector_store_path)
                .await?
                .with_strategy(config.match_strategy);
            Ok(Arc::new(store))
        }
    }
}

fn build_embedding_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>, ContainerError> {
    let embedding = &config.embedding;
    match &embedding.service_url {
        Some(url) => {
            let client = InferenceClient::new(EmbeddingsClientConfig {
                api_key: embedding.api_key.clone(),
                max_retries: embedding.max_retries,
                timeout_secs: embedding.timeout_secs,
                ..EmbeddingsClientConfig::new(url.clone())
            })?;
            Ok(Arc::new(InferenceEmbeddingProvider::new(
                client,
                ModelTag::new(embedding.model.clone(), embedding.model_version.clone()),
                embedding.dimension,
            )))
        }
        None => Ok(Arc::new(HashingEmbeddingProvider::new(embedding.dimension))),
    }
}
