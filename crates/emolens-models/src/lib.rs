//! Shared data models for the EmoLens backend.
//!
//! This crate provides Serde-serializable types for:
//! - The closed emotion label set shared by the face and voice classifiers
//! - Per-frame and per-modality inference results
//! - The fused analysis reports returned by the API
//! - Request tokens that key request-scoped temporary storage

pub mod emotion;
pub mod report;
pub mod request;

// Re-export common types
pub use emotion::{EmotionLabel, UnknownLabelError, EMOTION_LABELS};
pub use report::{
    round2, AnalysisReport, AudioReport, FaceEmotionResult, Sentiment, VoiceAnalysisResult,
};
pub use request::RequestToken;
