pub mod content_hash;
pub mod embedding_vector;
pub mod skill_set;

pub use content_hash::ContentHash;
pub use embedding_vector::{EmbeddingVector, ModelTag, SimilarityError};
pub use skill_set::SkillSet;
