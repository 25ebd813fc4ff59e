use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::deadline::Deadline;
use crate::application::errors::PipelineError;
use crate::application::ports::EmbeddingProvider;
use crate::domain::entities::ResumeRecord;
use crate::domain::repositories::VectorStore;
use crate::domain::value_objects::ContentHash;

/// How a résumé's vector was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// First sighting; embedded and written.
    Stored,
    /// Seen before under the active model; cached vector reused, nothing written.
    Duplicate,
    /// Seen before under another model; re-embedded and overwritten.
    Refreshed,
    /// The cache collection belongs to another model; embedded, not written.
    Uncached,
}

impl StoreOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreOutcome::Duplicate)
    }

    pub fn needs_write(&self) -> bool {
        matches!(self, StoreOutcome::Stored | StoreOutcome::Refreshed)
    }
}

/// Content-addressed résumé embedding cache.
pub struct ResumeService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

impl ResumeService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedding_provider,
            vector_store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Looks the résumé up by content hash and embeds it when no usable
    /// cached vector exists. The embedding call is bounded by `deadline`.
    /// Nothing is written; hand the result to `commit` once the run succeeds.
    pub async fn resolve(
        &self,
        text: &str,
        deadline: &Deadline,
    ) -> Result<(ResumeRecord, StoreOutcome), PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let hash = ContentHash::from_text(text);
        let active_model = self.embedding_provider.model();

        let collection_model = self
            .vector_store
            .collection_info(&self.collection)
            .await?
            .map(|info| info.model);

        if let Some(model) = collection_model.as_ref().filter(|m| *m != active_model) {
            warn!(
                "Resume cache '{}' was built with {}, active model is {}; not caching",
                self.collection, model, active_model
            );
            let embedding = deadline.run(self.embedding_provider.embed(text)).await?;
            return Ok((ResumeRecord::new(hash, embedding), StoreOutcome::Uncached));
        }

        let cached = if collection_model.is_some() {
            self.vector_store.get(&self.collection, &hash).await?
        } else {
            None
        };

        let outcome = match cached {
            Some(point) if point.vector.model() == active_model => {
                info!("Duplicate resume {} detected, reusing cached embedding", hash);
                let record = ResumeRecord::try_from(point)?;
                return Ok((record, StoreOutcome::Duplicate));
            }
            Some(point) => {
                info!(
                    "Cached resume {} was embedded with {}, recomputing",
                    hash,
                    point.vector.model()
                );
                StoreOutcome::Refreshed
            }
            None => StoreOutcome::Stored,
        };

        let embedding = deadline.run(self.embedding_provider.embed(text)).await?;
        Ok((ResumeRecord::new(hash, embedding), outcome))
    }

    /// Writes a resolved résumé when its outcome calls for it.
    pub async fn commit(
        &self,
        record: &ResumeRecord,
        outcome: StoreOutcome,
    ) -> Result<(), PipelineError> {
        if !outcome.needs_write() {
            return Ok(());
        }
        self.vector_store
            .upsert(&self.collection, record.to_point())
            .await?;
        debug!("Resume {} written to '{}'", record.id(), self.collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::external_services::HashingEmbeddingProvider;
    use crate::infrastructure::vector_store::LocalVectorStore;
    use std::time::Duration;

    fn service(store: Arc<LocalVectorStore>, version: &str) -> ResumeService {
        let provider = Arc::new(HashingEmbeddingProvider::new(64).with_version(version));
        ResumeService::new(provider, store, "resumes")
    }

    #[tokio::test]
    async fn test_second_submission_is_duplicate() {
        let store = Arc::new(LocalVectorStore::in_memory());
        let svc = service(store.clone(), "1");
        let text = "Jane Doe\nRust, Python and SQL";

        let (first, outcome) = svc.resolve(text, &Deadline::unbounded()).await.unwrap();
        assert_eq!(outcome, StoreOutcome::Stored);
        svc.commit(&first, outcome).await.unwrap();

        let (second, outcome) = svc
            .resolve("  jane doe rust, python AND sql ", &Deadline::unbounded())
            .await
            .unwrap();
        assert_eq!(outcome, StoreOutcome::Duplicate);
        assert_eq!(first.id(), second.id());
        assert_eq!(first.embedding(), second.embedding());
        svc.commit(&second, outcome).await.unwrap();
        assert_eq!(store.count("resumes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_uncommitted_resolve_writes_nothing() {
        let store = Arc::new(LocalVectorStore::in_memory());
        let svc = service(store.clone(), "1");

        let (_, outcome) = svc.resolve("abandoned run", &Deadline::unbounded()).await.unwrap();
        assert_eq!(outcome, StoreOutcome::Stored);
        assert!(store.collection_info("resumes").await.unwrap().is_none());

        let (record, outcome) = svc.resolve("abandoned run", &Deadline::unbounded()).await.unwrap();
        assert_eq!(outcome, StoreOutcome::Stored);
        svc.commit(&record, outcome).await.unwrap();
        let (_, outcome) = svc.resolve("abandoned run", &Deadline::unbounded()).await.unwrap();
        assert_eq!(outcome, StoreOutcome::Duplicate);
    }

    #[tokio::test]
    async fn test_blank_text_is_empty_input() {
        let svc = service(Arc::new(LocalVectorStore::in_memory()), "1");
        let result = svc.resolve(" \n\t", &Deadline::unbounded()).await;
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_other_model_collection_is_not_written() {
        let store = Arc::new(LocalVectorStore::in_memory());
        let v1 = service(store.clone(), "1");
        let (record, outcome) = v1.resolve("resume one", &Deadline::unbounded()).await.unwrap();
        v1.commit(&record, outcome).await.unwrap();

        let v2 = service(store.clone(), "2");
        let (record, outcome) = v2.resolve("resume two", &Deadline::unbounded()).await.unwrap();
        assert_eq!(outcome, StoreOutcome::Uncached);
        v2.commit(&record, outcome).await.unwrap();
        assert_eq!(store.count("resumes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_deadline_writes_nothing() {
        let store = Arc::new(LocalVectorStore::in_memory());
        let svc = service(store.clone(), "1");
        let deadline = Deadline::after(Duration::ZERO);

        let result = svc.resolve("a fresh resume", &deadline).await;
        assert!(matches!(result, Err(PipelineError::Timeout(_))));
        assert!(store.collection_info("resumes").await.unwrap().is_none());
    }
}
