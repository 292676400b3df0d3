//! The analysis pipeline: one evaluation cycle end to end, from frame
//! acquisition through the throttled oracle call to signal emission.

pub mod frames;
pub mod pipeline;

pub use frames::DirFrameSource;
pub use pipeline::AnalysisPipeline;
