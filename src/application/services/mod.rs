pub mod matcher;
pub mod resume_service;
pub mod skill_gap;

pub use matcher::{MatchStrategy, Matcher};
pub use resume_service::{ResumeService, StoreOutcome};
pub use skill_gap::SkillGapAnalyzer;
