pub mod job_record;
pub mod match_result;
pub mod resume_record;

pub use job_record::{JobPosting, JobRecord};
pub use match_result::MatchResult;
pub use resume_record::ResumeRecord;
