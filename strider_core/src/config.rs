// strider_core/src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::forecast::ForecastSettings;

/// Largest accepted `max_samples`.
pub const MAX_HISTORY_SAMPLES: usize = 100_000;

/// Largest accepted forecast length, `sample_rate × forecast_seconds`.
pub const MAX_FORECAST_SAMPLES: usize = 100_000;

/// Static, per-agent settings for a [`TrajectoryEngine`](crate::engine::TrajectoryEngine).
///
/// Maps to an `[engine]` table in a scenario file. Missing fields fall back to
/// [`Default`]; unknown fields are an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Record history and forecast the trajectory at all.
    pub trajectory_enabled: bool,
    /// Refresh stop/pivot predictions on every tick so readers never call the updates.
    pub precalculate_distance_matches: bool,
    /// Refresh the forecast on every tick.
    pub precalculate_future_trajectory: bool,
    /// Prepend recorded history to the precalculated forecast.
    pub forecast_includes_history: bool,
    /// Hard cap on stored history samples.
    pub max_samples: usize,
    /// How far back history is retained, in seconds.
    pub history_seconds: f64,
    /// Forecast samples per second.
    pub sample_rate: u32,
    /// Forecast horizon, in seconds.
    pub forecast_seconds: f64,
    /// How long a simulated proxy still counts as "having input" after it stops.
    pub input_grace_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trajectory_enabled: true,
            precalculate_distance_matches: true,
            precalculate_future_trajectory: true,
            forecast_includes_history: true,
            max_samples: 200,
            history_seconds: 2.0,
            sample_rate: 30,
            forecast_seconds: 1.0,
            input_grace_seconds: 0.01,
        }
    }
}

impl EngineConfig {
    /// Checks the durations, the history capacity and the forecast length against
    /// [`MAX_HISTORY_SAMPLES`] and [`MAX_FORECAST_SAMPLES`]. Called by the engine constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("history_seconds", self.history_seconds),
            ("forecast_seconds", self.forecast_seconds),
            ("input_grace_seconds", self.input_grace_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        if self.max_samples == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_samples > MAX_HISTORY_SAMPLES {
            return Err(ConfigError::CapacityTooLarge {
                value: self.max_samples,
                max: MAX_HISTORY_SAMPLES,
            });
        }

        let samples = f64::from(self.sample_rate) * self.forecast_seconds;
        if samples > MAX_FORECAST_SAMPLES as f64 {
            return Err(ConfigError::ForecastTooLong {
                samples,
                max: MAX_FORECAST_SAMPLES,
            });
        }
        Ok(())
    }

    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            sample_rate: self.sample_rate,
            duration_seconds: self.forecast_seconds,
        }
    }
}
