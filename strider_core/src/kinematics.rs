// strider_core/src/kinematics.rs

//! Acceleration and turn-rate estimation.
//!
//! Two estimators live here:
//! - [`estimate_acceleration_and_angular_velocity`] reads a trend out of the sample
//!   history, skipping neighbours that are too close in time to divide by safely.
//! - [`EffectiveAccelerationTracker`] differentiates velocity between consecutive
//!   simulation steps, for agents whose acceleration is not known directly.

use nalgebra::Vector3;

use crate::history::SampleHistoryBuffer;
use crate::math::vector_is_zero;

/// Minimum time separation between the two samples used for a trend.
pub const MIN_TREND_GAP_SECONDS: f64 = 0.01;

/// Acceleration and angular velocity read from recent history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicTrend {
    /// World-frame linear acceleration.
    pub acceleration: Vector3<f64>,
    /// World-frame angular velocity as a scaled axis (rad/s). `z` is the yaw rate.
    pub angular_velocity: Vector3<f64>,
}

/// Compares the newest recorded sample against the first older sample at least
/// [`MIN_TREND_GAP_SECONDS`] away. Returns a zero trend if none qualifies.
pub fn estimate_acceleration_and_angular_velocity(history: &SampleHistoryBuffer) -> KinematicTrend {
    let newest = history.last_sample();
    history
        .iter()
        .rev()
        .find(|sample| newest.accumulated_seconds - sample.accumulated_seconds >= MIN_TREND_GAP_SECONDS)
        .map(|older| KinematicTrend {
            acceleration: newest.acceleration_from(older),
            angular_velocity: newest.rotation_velocity_from(older),
        })
        .unwrap_or_default()
}

/// A discrete simulation step as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StepRecord {
    timestamp: f64,
    velocity: Vector3<f64>,
}

/// Real-time effective acceleration from the previous simulation step.
#[derive(Debug, Clone, Default)]
pub struct EffectiveAccelerationTracker {
    previous: Option<StepRecord>,
    steps: u64,
    current: Vector3<f64>,
}

impl EffectiveAccelerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the step at `timestamp` and refreshes the estimate.
    ///
    /// Zero velocity resets the estimate to zero. With fewer than two recorded steps,
    /// or a repeated timestamp, the previous estimate is kept.
    pub fn update(&mut self, timestamp: f64, velocity: Vector3<f64>) -> Vector3<f64> {
        if vector_is_zero(&velocity) {
            self.current = Vector3::zeros();
        } else if let Some(previous) = self.previous {
            let dt = timestamp - previous.timestamp;
            if dt > 0.0 {
                self.current = (velocity - previous.velocity) / dt;
            }
        }

        self.steps += 1;
        self.previous = Some(StepRecord { timestamp, velocity });
        self.current
    }

    /// The most recent estimate.
    pub fn current(&self) -> Vector3<f64> {
        self.current
    }

    /// Number of steps recorded so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
