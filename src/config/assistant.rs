//! Assistant tuning configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::assistant::{CharLengthEstimator, ContextWindow};

/// Knobs for the slot-filling assistant
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Most recent messages considered before token trimming
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,

    /// Estimated token budget for the history sent to the model
    #[serde(default = "default_history_token_budget")]
    pub history_token_budget: u32,

    /// Characters per token for the length-based estimator
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f32,

    /// Hours of inactivity before an active conversation is abandoned
    #[serde(default = "default_idle_threshold_hours")]
    pub idle_threshold_hours: i64,
}

impl AssistantConfig {
    /// Get the idle threshold as a chrono Duration
    pub fn idle_threshold(&self) -> chrono::Duration {
        chrono::Duration::hours(self.idle_threshold_hours)
    }

    /// Build the history trimmer from the configured limits
    pub fn context_window(&self) -> ContextWindow {
        ContextWindow::new(self.max_history_messages, self.history_token_budget)
    }

    /// Build the length-based token estimator from the configured divisor
    pub fn token_estimator(&self) -> CharLengthEstimator {
        CharLengthEstimator::new(self.chars_per_token)
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_history_messages == 0 {
            return Err(ValidationError::InvalidHistoryWindow);
        }
        if self.chars_per_token <= 0.0 {
            return Err(ValidationError::InvalidCharsPerToken);
        }
        if self.idle_threshold_hours <= 0 {
            return Err(ValidationError::InvalidIdleThreshold);
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_history_messages: default_max_history_messages(),
            history_token_budget: default_history_token_budget(),
            chars_per_token: default_chars_per_token(),
            idle_threshold_hours: default_idle_threshold_hours(),
        }
    }
}

fn default_max_history_messages() -> usize {
    10
}

fn default_history_token_budget() -> u32 {
    2048
}

fn default_chars_per_token() -> f32 {
    2.5
}

fn default_idle_threshold_hours() -> i64 {
    24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AssistantConfig::default();
        assert_eq!(config.max_history_messages, 10);
        assert_eq!(config.history_token_budget, 2048);
        assert_eq!(config.idle_threshold(), chrono::Duration::hours(24));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builds_window_and_estimator_from_the_configured_limits() {
        use crate::domain::assistant::{Message, TokenEstimator};
        use crate::domain::foundation::ConversationId;

        let config = AssistantConfig {
            max_history_messages: 1,
            history_token_budget: 100,
            chars_per_token: 2.5,
            ..Default::default()
        };

        assert_eq!(config.token_estimator().estimate("abcde"), 2);

        let id = ConversationId::new();
        let messages = vec![
            Message::user(id, "older".to_string(), 0),
            Message::user(id, "newest".to_string(), 0),
        ];
        let trimmed = config.context_window().trim(&messages, &config.token_estimator());
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].content, "newest");
    }

    #[test]
    fn validation_rejects_zero_window() {
        let config = AssistantConfig {
            max_history_messages: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_non_positive_estimator_divisor() {
        let config = AssistantConfig {
            chars_per_token: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_non_positive_idle_threshold() {
        let config = AssistantConfig {
            idle_threshold_hours: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
