// strider_core/src/forecast.rs

//! Short-horizon trajectory simulation.
//!
//! Starting from the current velocity and the acceleration/turn-rate trend, the
//! forecaster steps a simple ground-movement model forward at a fixed rate and emits
//! one [`MotionSample`] per step, all expressed relative to a caller-supplied origin.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::config::MAX_FORECAST_SAMPLES;
use crate::kinematics::KinematicTrend;
use crate::math::{
    clamp_to_max_size, rotation_from_scaled_axis, safe_normal, vector_is_nearly_zero, vector_is_zero,
    KINDA_SMALL_NUMBER,
};
use crate::sample::{MotionSample, MotionSampleCollection};

/// Largest integration step used while coasting to a stop.
pub const MAX_COAST_TIME_STEP: f64 = 1.0 / 33.0;

/// Geometric decay applied to the yaw rate on every forecast step.
pub const YAW_RATE_DECAY: f64 = 1.1;

/// Remaining time below which coasting sub-steps stop.
const MIN_REMAINING_TIME: f64 = 1.0e-6;

/// How densely and how far ahead to simulate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    /// Samples per second.
    pub sample_rate: u32,
    /// Horizon in seconds.
    pub duration_seconds: f64,
}

impl ForecastSettings {
    /// Seconds between consecutive forecast samples, or zero if the rate is zero.
    pub fn time_per_sample(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            1.0 / f64::from(self.sample_rate)
        }
    }

    /// Number of simulated samples, excluding history and "now".
    pub fn sample_count(&self) -> usize {
        if self.sample_rate == 0 || self.duration_seconds.is_nan() || self.duration_seconds <= 0.0 {
            return 0;
        }
        (f64::from(self.sample_rate) * self.duration_seconds).floor() as usize
    }
}

/// World constraints on the simulated movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementLimits {
    pub braking_deceleration: f64,
    pub friction: f64,
    pub max_speed: f64,
}

/// Everything the forecaster reads. Borrowed so a forecast never mutates its owner.
#[derive(Debug, Clone, Copy)]
pub struct ForecastInputs<'a> {
    /// Frame every output sample is expressed against; also the starting pose.
    pub origin: &'a Isometry3<f64>,
    /// History to prepend, oldest first.
    pub history: Option<&'a [MotionSample]>,
    /// The "now" sample.
    pub current: MotionSample,
    /// World-frame velocity to start from.
    pub velocity: Vector3<f64>,
    pub trend: KinematicTrend,
    pub limits: MovementLimits,
}

/// Simulates `settings.sample_count()` future samples.
///
/// The result is ordered history, then "now", then the forecast.
pub fn forecast(settings: &ForecastSettings, inputs: &ForecastInputs<'_>) -> MotionSampleCollection {
    let time_per_sample = settings.time_per_sample();
    let sample_count = settings.sample_count();
    let history_count = inputs.history.map_or(0, |h| h.len());

    let capacity = sample_count
        .min(MAX_FORECAST_SAMPLES)
        .saturating_add(1)
        .saturating_add(history_count);
    let mut predictions = MotionSampleCollection::with_capacity(capacity);
    if let Some(history) = inputs.history {
        predictions.extend(history.iter().copied());
    }
    predictions.push(inputs.current);

    let limits = inputs.limits;

    let mut predicted_acceleration = inputs.trend.acceleration;
    let mut rotation_per_sample = inputs.trend.angular_velocity * time_per_sample;

    let origin = inputs.origin;
    let mut current_location = origin.translation.vector;
    let mut current_rotation = origin.rotation;
    let mut current_velocity = inputs.velocity;

    for idx in 0..sample_count {
        if !vector_is_nearly_zero(&rotation_per_sample, KINDA_SMALL_NUMBER) {
            let step_rotation = rotation_from_scaled_axis(&rotation_per_sample);
            predicted_acceleration = step_rotation * predicted_acceleration;
            current_rotation = step_rotation * current_rotation;
            rotation_per_sample.z /= YAW_RATE_DECAY;
        }

        if vector_is_nearly_zero(&predicted_acceleration, KINDA_SMALL_NUMBER) {
            current_velocity = apply_braking(current_velocity, time_per_sample, &limits);
        } else {
            let acceleration_direction = safe_normal(&predicted_acceleration);
            let speed = current_velocity.norm();

            current_velocity -=
                (current_velocity - acceleration_direction * speed) * (limits.friction * time_per_sample);
            current_velocity += predicted_acceleration * time_per_sample;
            current_velocity = clamp_to_max_size(&current_velocity, limits.max_speed);
        }

        current_location += current_velocity * time_per_sample;

        let world_transform = Isometry3::from_parts(Translation3::from(current_location), current_rotation);
        predictions.push(MotionSample {
            world_transform,
            relative_transform: origin.inverse() * world_transform,
            world_linear_velocity: current_velocity,
            relative_linear_velocity: origin.rotation.inverse_transform_vector(&current_velocity),
            world_rotation: current_rotation,
            delta_rotation: UnitQuaternion::identity(),
            accumulated_seconds: time_per_sample * (idx + 1) as f64,
        });
    }

    predictions
}

/// Friction and braking decay over `time_step` with no driving acceleration.
///
/// Sub-steps at most [`MAX_COAST_TIME_STEP`] (unless friction is zero) and never
/// lets the velocity reverse direction.
pub fn apply_braking(velocity: Vector3<f64>, time_step: f64, limits: &MovementLimits) -> Vector3<f64> {
    if vector_is_nearly_zero(&velocity, KINDA_SMALL_NUMBER) {
        return Vector3::zeros();
    }

    let zero_friction = limits.friction == 0.0;
    let no_brakes = limits.braking_deceleration == 0.0;

    let initial_velocity = velocity;
    let mut current = velocity;
    let mut remaining = time_step;

    while remaining >= MIN_REMAINING_TIME && !vector_is_zero(&current) {
        let dt = if remaining > MAX_COAST_TIME_STEP && !zero_friction {
            MAX_COAST_TIME_STEP.min(remaining * 0.5)
        } else {
            remaining
        };
        remaining -= dt;

        let deceleration = if no_brakes {
            Vector3::zeros()
        } else {
            -limits.braking_deceleration * safe_normal(&current)
        };
        current += (-limits.friction * current + deceleration) * dt;

        // Overshooting through zero means we stopped inside this sub-step.
        if current.dot(&initial_velocity) < 0.0 {
            current = Vector3::zeros();
            break;
        }
    }

    if current.norm_squared() < KINDA_SMALL_NUMBER {
        Vector3::zeros()
    } else {
        current
    }
}
