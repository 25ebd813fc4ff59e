pub mod embedding_provider;
pub mod ocr_engine;
pub mod skill_extractor;
pub mod text_extractor;

pub use embedding_provider::EmbeddingProvider;
pub use ocr_engine::OcrEngine;
pub use skill_extractor::SkillExtractor;
pub use text_extractor::TextExtractor;
