//! Model backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration for the Ollama model backend
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model tag to run (e.g., "qwen2.5:7b")
    pub model: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Full request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cap on generated tokens per reply
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl ModelConfig {
    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate model configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.is_empty() {
            return Err(ValidationError::MissingRequired("MODEL__MODEL"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidModelEndpoint);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidModelTimeout);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            top_k: default_top_k(),
            top_p: default_top_p(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_ollama() {
        let config = ModelConfig::default();
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.max_output_tokens, 1024);
    }

    #[test]
    fn validation_requires_a_model_tag() {
        assert!(ModelConfig::default().validate().is_err());

        let config = ModelConfig {
            model: "qwen2.5:7b".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_endpoint() {
        let config = ModelConfig {
            model: "qwen2.5:7b".to_string(),
            endpoint: "localhost:11434".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_temperature() {
        let config = ModelConfig {
            model: "qwen2.5:7b".to_string(),
            temperature: 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
