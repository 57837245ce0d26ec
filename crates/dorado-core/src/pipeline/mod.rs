pub mod config;
pub(crate) mod helpers;
mod types;

pub use types::{FrameFailure, NoOpReporter, PipelineStage, ProgressReporter, StageReport};
