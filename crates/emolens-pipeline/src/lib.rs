//! Affect analysis pipeline.
//!
//! Orchestrates the media layer and the inference adapters into the two
//! analysis operations: video uploads fan out into a face branch and a
//! voice branch whose results are fused deterministically, and WAV
//! uploads run the voice chain alone.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use aggregate::aggregate;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::Pipeline;
