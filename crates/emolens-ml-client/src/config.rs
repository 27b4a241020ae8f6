//! Inference client configuration.

use std::time::Duration;

/// Configuration for the inference service clients.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the inference service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for retryable failures
    pub max_retries: u32,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 2);
    }
}
