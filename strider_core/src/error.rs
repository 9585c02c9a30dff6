// strider_core/src/error.rs

use thiserror::Error;

/// Reasons an [`EngineConfig`](crate::config::EngineConfig) is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("`max_samples` must be at least 1")]
    ZeroCapacity,

    #[error("`max_samples` must be at most {max} (got {value})")]
    CapacityTooLarge { value: usize, max: usize },

    #[error("`sample_rate` x `forecast_seconds` must be at most {max} samples (got {samples})")]
    ForecastTooLong { samples: f64, max: usize },
}
