// strider_core/src/prediction.rs

//! Closed-form stop and pivot prediction for distance matching.
//!
//! Both predictors are pure functions. They return an offset relative to the agent's
//! current location, or the zero vector when nothing is predicted.

use nalgebra::{UnitQuaternion, Vector3};

use crate::math::{direction_and_length, ground, safe_normal, vertical};

/// Input and velocity must differ by more than this (degrees) for a pivot.
pub const PIVOT_ANGLE_THRESHOLD_DEGREES: f64 = 90.0;

/// Where the agent will come to rest under constant braking, relative to its location.
///
/// Only the ground-plane part of `velocity` is used. Returns zero when the effective
/// deceleration (`braking_deceleration * friction`) is not positive.
pub fn predict_stop_offset(velocity: &Vector3<f64>, braking_deceleration: f64, friction: f64) -> Vector3<f64> {
    let grounded_velocity = ground(velocity);
    let grounded_direction = safe_normal(&grounded_velocity);

    let effective_deceleration = braking_deceleration * friction;
    if effective_deceleration > 0.0 {
        grounded_direction * (grounded_velocity.norm_squared() / (2.0 * effective_deceleration))
    } else {
        Vector3::zeros()
    }
}

/// Where the agent will finish reversing direction, relative to its location.
///
/// A pivot is only predicted while the agent is moving against its acceleration,
/// both in its local frame and along the ground-plane acceleration direction.
pub fn predict_pivot_offset(
    acceleration: &Vector3<f64>,
    velocity: &Vector3<f64>,
    rotation: &UnitQuaternion<f64>,
    friction: f64,
) -> Vector3<f64> {
    let grounded_velocity = ground(velocity);
    let local_velocity = rotation.inverse_transform_vector(&grounded_velocity);
    let local_acceleration = rotation.inverse_transform_vector(acceleration);

    let (acceleration_dir_2d, acceleration_size_2d) = direction_and_length(&ground(acceleration));

    let velocity_along_acceleration = grounded_velocity.dot(&acceleration_dir_2d);
    let local_dot = local_velocity.dot(&local_acceleration);

    if local_dot >= 0.0 || velocity_along_acceleration >= 0.0 {
        return Vector3::zeros();
    }

    let speed_along_acceleration = -velocity_along_acceleration;
    let divisor = acceleration_size_2d + 2.0 * speed_along_acceleration * friction;
    if divisor <= 0.0 {
        return Vector3::zeros();
    }
    let time_to_direction_change = speed_along_acceleration / divisor;

    let acceleration_force =
        acceleration - (grounded_velocity - acceleration_dir_2d * grounded_velocity.norm()) * friction;

    grounded_velocity * time_to_direction_change
        + 0.5 * acceleration_force * time_to_direction_change * time_to_direction_change
}

/// Angle in degrees between `a` and `b`. Zero-length inputs give 90°.
pub fn angle_difference(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let dot = safe_normal(a).dot(&safe_normal(b)).clamp(-1.0, 1.0);
    dot.acos().to_degrees()
}

/// Angle in degrees between `a` and `b` on the ground plane (the change in yaw).
pub fn angle_difference_xy(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    angle_difference(&ground(a), &ground(b))
}

/// Angle in degrees between the vertical components of `a` and `b`.
pub fn angle_difference_z(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    angle_difference(&vertical(a), &vertical(b))
}
