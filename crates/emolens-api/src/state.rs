//! Application state.

use std::sync::Arc;

use emolens_ml_client::{AdapterRegistry, InferenceClient, MlClientConfig};
use emolens_pipeline::{Pipeline, PipelineConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<Pipeline>,
    pub inference: InferenceClient,
}

impl AppState {
    /// Create new application state.
    ///
    /// All inference adapters are built once here; handlers only see the
    /// pipeline and the raw client used for readiness probes.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let ml_config = MlClientConfig::from_env();
        let inference = InferenceClient::new(ml_config.clone())?;
        let registry = AdapterRegistry::from_config(ml_config)?;
        let pipeline = Pipeline::new(PipelineConfig::from_env(), registry);

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            inference,
        })
    }

    /// Build state around an existing pipeline, for tests.
    #[cfg(test)]
    pub fn with_pipeline(config: ApiConfig, pipeline: Pipeline) -> Result<Self, Box<dyn std::error::Error>> {
        let inference = InferenceClient::new(MlClientConfig::default())?;
        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            inference,
        })
    }
}
