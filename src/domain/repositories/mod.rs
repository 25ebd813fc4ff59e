pub mod vector_store;

pub use vector_store::{
    CollectionInfo, CollectionStatus, ScoredPoint, StoredPoint, VectorStore, VectorStoreError,
};
