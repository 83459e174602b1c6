use crate::error::{CoreError, Result};

/// Runtime configuration for topology mutation and task execution.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Ceiling on load/apply/save attempts for a single mutation.
    pub max_mutation_attempts: u32,
    /// Base delay applied when the backing store is unavailable.
    pub backoff_base_ms: u64,
    /// Cap on the backoff delay regardless of attempt count.
    pub backoff_max_ms: u64,
    /// Multiplier applied to the delay after each unavailable attempt.
    pub backoff_multiplier: f64,
    /// Channel capacity for lifecycle event publishing.
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_mutation_attempts: 10,
            backoff_base_ms: 50,
            backoff_max_ms: 5000,
            backoff_multiplier: 2.0,
            event_capacity: 1000,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(attempts) = std::env::var("UNIVERSE_MAX_MUTATION_ATTEMPTS") {
            config.max_mutation_attempts = attempts.parse().map_err(|e| {
                CoreError::ConfigurationError(format!("Invalid max_mutation_attempts: {e}"))
            })?;
        }

        if let Ok(base) = std::env::var("UNIVERSE_BACKOFF_BASE_MS") {
            config.backoff_base_ms = base.parse().map_err(|e| {
                CoreError::ConfigurationError(format!("Invalid backoff_base_ms: {e}"))
            })?;
        }

        if let Ok(max) = std::env::var("UNIVERSE_BACKOFF_MAX_MS") {
            config.backoff_max_ms = max.parse().map_err(|e| {
                CoreError::ConfigurationError(format!("Invalid backoff_max_ms: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("UNIVERSE_EVENT_CAPACITY") {
            config.event_capacity = capacity.parse().map_err(|e| {
                CoreError::ConfigurationError(format!("Invalid event_capacity: {e}"))
            })?;
        }

        Ok(config)
    }
}
