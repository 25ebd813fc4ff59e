pub mod deadline;
pub mod errors;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use deadline::Deadline;
pub use errors::PipelineError;
pub use use_cases::*;
