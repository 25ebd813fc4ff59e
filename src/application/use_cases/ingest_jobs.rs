use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::PipelineError;
use crate::application::ports::EmbeddingProvider;
use crate::domain::entities::{JobPosting, JobRecord};
use crate::domain::repositories::VectorStore;

pub const INGEST_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub received: usize,
    pub upserted: usize,
    /// Postings whose content hash was already stored (overwritten in place).
    pub already_present: usize,
    /// Repeats of an earlier posting in the same input.
    pub repeated: usize,
    pub skipped: usize,
}

/// Offline loader for the jobs collection. Identity is the content hash, so
/// re-ingesting the same corpus leaves the collection unchanged in size.
pub struct IngestJobsUseCase {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

impl IngestJobsUseCase {
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

    pub async fn execute(&self, postings: Vec<JobPosting>) -> Result<IngestSummary, PipelineError> {
        let mut summary = IngestSummary {
            received: postings.len(),
            ..Default::default()
        };

        let mut seen = HashSet::new();
        let mut pending = Vec::with_capacity(postings.len());
        for posting in postings {
            if posting.is_blank() {
                warn!("Skipping posting with empty title and description");
                summary.skipped += 1;
                continue;
            }
            if !seen.insert(posting.content_hash()) {
                summary.repeated += 1;
                continue;
            }
            pending.push(posting);
        }

        let collection_exists = self
            .vector_store
            .collection_info(&self.collection)
            .await?
            .is_some();

        for batch in pending.chunks(INGEST_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(JobPosting::embedding_text).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await?;

            let mut points = Vec::with_capacity(batch.len());
            for (posting, embedding) in batch.iter().zip(embeddings) {
                let record = match JobRecord::from_posting(posting, embedding) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Skipping posting '{}': {}", posting.title, e);
                        summary.skipped += 1;
                        continue;
                    }
                };
                if collection_exists && self.vector_store.exists(&self.collection, record.id()).await? {
                    summary.already_present += 1;
                }
                points.push(record.to_point());
            }

            let written = points.len();
            self.vector_store.upsert_batch(&self.collection, points).await?;
            summary.upserted += written;
            info!("Upserted {} job(s) into '{}'", written, self.collection);
        }

        Ok(summary)
    }
}
