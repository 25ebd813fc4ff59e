pub mod ingest_jobs;
pub mod recommend_jobs;

pub use ingest_jobs::{IngestJobsUseCase, IngestSummary};
pub use recommend_jobs::{
    RecommendJobsRequest, RecommendJobsUseCase, RecommendSettings, Recommendations,
};
