use crate::domain::entities::JobRecord;
use crate::domain::value_objects::SkillSet;

/// One ranked recommendation. Produced per query, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub job: JobRecord,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    pub missing_skills: SkillSet,
}

impl MatchResult {
    /// Score as a percentage rounded to two decimals, e.g. 0.87654 -> 87.65.
    pub fn score_percent(&self) -> f64 {
        (f64::from(self.score) * 10_000.0).round() / 100.0
    }
}
