//! Clients for the external inference services.
//!
//! The four scoring capabilities (face emotion, voice emotion,
//! speech-to-text, sentiment) are consumed as opaque HTTP services. This
//! crate owns the capability traits, the HTTP implementations and the
//! response-shape normalization at the boundary.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod traits;

pub use client::InferenceClient;
pub use config::MlClientConfig;
pub use error::{MlError, MlResult};
pub use traits::{
    AdapterRegistry, FaceEmotionClassifier, SentimentClassifier, TranscriptionService,
    VoiceEmotionClassifier,
};
