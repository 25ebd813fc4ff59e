pub mod document_extractors;
pub mod hashing_embedder;
pub mod inference_client;

pub use hashing_embedder::HashingEmbeddingProvider;
pub use inference_client::InferenceEmbeddingProvider;
