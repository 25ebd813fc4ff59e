pub mod dto;
pub mod formatting;

pub use dto::{MatchView, RecommendationsView};
