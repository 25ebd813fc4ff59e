pub mod collection_model;
pub mod point_model;

pub use collection_model::*;
pub use point_model::*;
