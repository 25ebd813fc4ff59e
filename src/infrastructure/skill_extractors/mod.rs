pub mod dictionary;
pub mod keyphrase;
pub mod vocabulary;

pub use dictionary::DictionarySkillExtractor;
pub use keyphrase::KeyphraseSkillExtractor;
pub use vocabulary::SkillVocabulary;
