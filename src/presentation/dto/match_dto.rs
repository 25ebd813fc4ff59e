use serde::Serialize;

use crate::application::use_cases::Recommendations;
use crate::domain::entities::MatchResult;
use crate::presentation::formatting::{format_job_description, missing_skills_line, title_case};

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub title: String,
    /// Similarity as a percentage, two decimals.
    pub score: f64,
    pub required_skills: String,
    pub missing_skills: Vec<String>,
    pub link: Option<String>,
    pub hash: String,
    pub description: String,
}

impl From<&MatchResult> for MatchView {
    fn from(result: &MatchResult) -> Self {
        Self {
            title: title_case(result.job.title()),
            score: result.score_percent(),
            required_skills: result.job.required_skills().to_string(),
            missing_skills: result.missing_skills.to_vec(),
            link: result.job.source_url().map(|url| url.to_string()),
            hash: result.job.id().to_string(),
            description: format_job_description(result.job.description()),
        }
    }
}

impl MatchView {
    pub fn to_markdown(&self) -> String {
        let heading = match &self.link {
            Some(link) => format!("**[{}]({})**", self.title, link),
            None => format!("**{}**", self.title),
        };
        let missing = missing_skills_line(self.missing_skills.iter().map(String::as_str));

        format!(
            "{}\n**Relevance Score**: `{}%`\n**Required Skills**: `{}`\n**Missing Skills**: `{}`\n**Hash**: `{}`\n\n{}\n",
            heading, self.score, self.required_skills, missing, self.hash, self.description
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsView {
    pub resume_id: String,
    pub duplicate: bool,
    pub extraction: Option<String>,
    pub resume_skills: Vec<String>,
    pub matches: Vec<MatchView>,
    pub elapsed_ms: u64,
}

impl From<&Recommendations> for RecommendationsView {
    fn from(recommendations: &Recommendations) -> Self {
        Self {
            resume_id: recommendations.resume_id.to_string(),
            duplicate: recommendations.is_duplicate(),
            extraction: recommendations.extraction.map(|s| s.to_string()),
            resume_skills: recommendations.resume_skills.to_vec(),
            matches: recommendations.matches.iter().map(MatchView::from).collect(),
            elapsed_ms: recommendations.elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{JobPosting, JobRecord};
    use crate::domain::value_objects::{EmbeddingVector, ModelTag, SkillSet};

    fn result(missing: &str) -> MatchResult {
        let posting = JobPosting {
            title: "senior data engineer".to_string(),
            description: "Build pipelines. Education: B.Tech".to_string(),
            skills: "Python, AWS".to_string(),
            source_url: Some("https://jobs.example.com/1".to_string()),
        };
        let job = JobRecord::from_posting(
            &posting,
            EmbeddingVector::new(ModelTag::new("m", "1"), vec![1.0]),
        )
        .unwrap();
        MatchResult {
            job,
            score: 0.876_54,
            missing_skills: SkillSet::from_comma_separated(missing),
        }
    }

    #[test]
    fn test_view_formats_fields() {
        let view = MatchView::from(&result("aws"));
        assert_eq!(view.title, "Senior Data Engineer");
        assert_eq!(view.score, 87.65);
        assert_eq!(view.required_skills, "Python, AWS");
        assert_eq!(view.missing_skills, vec!["aws"]);
        assert_eq!(view.link.as_deref(), Some("https://jobs.example.com/1"));
        assert_eq!(view.hash.len(), 64);
        assert!(view.description.starts_with("**Overview:**"));
    }

    #[test]
    fn test_markdown_reports_full_coverage() {
        let markdown = MatchView::from(&result("")).to_markdown();
        assert!(markdown.contains("None! All skills seem to match."));
        assert!(markdown.starts_with("**[Senior Data Engineer](https://jobs.example.com/1)**"));
    }

    #[test]
    fn test_view_serializes() {
        let json = serde_json::to_value(MatchView::from(&result("aws"))).unwrap();
        assert_eq!(json["missing_skills"][0], "aws");
        assert_eq!(json["score"], 87.65);
    }
}
