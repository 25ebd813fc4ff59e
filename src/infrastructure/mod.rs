pub mod container;
pub mod database;
pub mod external_services;
pub mod skill_extractors;
pub mod vector_store;

pub use container::{AppContainer, ContainerError};
pub use database::{DbPool, create_connection_pool};
pub use external_services::{HashingEmbeddingProvider, InferenceEmbeddingProvider};
pub use vector_store::LocalVectorStore;
