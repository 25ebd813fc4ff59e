pub mod match_dto;

pub use match_dto::*;
