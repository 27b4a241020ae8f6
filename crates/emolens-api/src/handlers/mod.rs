//! HTTP handlers.

pub mod analyze;
pub mod health;

pub use analyze::{analyze_audio, analyze_video};
pub use health::{health, ready, welcome};
