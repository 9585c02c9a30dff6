// strider_core/src/math.rs

//! Tolerances and small vector helpers shared by every module.
//!
//! World convention is Z-up: the ground plane is XY and "yaw" is rotation about +Z.

use nalgebra::{UnitQuaternion, Vector3};
use num_traits::Float;

/// Tolerance used for "is this effectively zero" checks on velocities and offsets.
pub const KINDA_SMALL_NUMBER: f64 = 1.0e-4;

/// Tolerance used to guard divisions by time deltas.
pub const SMALL_NUMBER: f64 = 1.0e-8;

/// Returns true when `value` lies within `tolerance` of zero.
pub fn is_nearly_zero<T: Float>(value: T, tolerance: T) -> bool {
    value.abs() <= tolerance
}

/// Component-wise near-zero test, matching how velocities are compared to rest.
pub fn vector_is_nearly_zero(v: &Vector3<f64>, tolerance: f64) -> bool {
    is_nearly_zero(v.x, tolerance) && is_nearly_zero(v.y, tolerance) && is_nearly_zero(v.z, tolerance)
}

/// Exact zero test.
pub fn vector_is_zero(v: &Vector3<f64>) -> bool {
    v.x == 0.0 && v.y == 0.0 && v.z == 0.0
}

/// Drops the vertical component.
pub fn ground(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.y, 0.0)
}

/// Keeps only the vertical component.
pub fn vertical(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(0.0, 0.0, v.z)
}

/// Unit vector in the direction of `v`, or zero if `v` is too short to normalise.
pub fn safe_normal(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(SMALL_NUMBER).unwrap_or_else(Vector3::zeros)
}

/// Splits `v` into a unit direction and its length. Short vectors give `(0, 0)`.
pub fn direction_and_length(v: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let length = v.norm();
    if length > SMALL_NUMBER {
        (v / length, length)
    } else {
        (Vector3::zeros(), 0.0)
    }
}

/// Scales `v` down so its length does not exceed `max_size`.
/// A non-positive `max_size` clamps to the zero vector.
pub fn clamp_to_max_size(v: &Vector3<f64>, max_size: f64) -> Vector3<f64> {
    if max_size < KINDA_SMALL_NUMBER {
        return Vector3::zeros();
    }
    let length_squared = v.norm_squared();
    if length_squared > max_size * max_size {
        v * (max_size / length_squared.sqrt())
    } else {
        *v
    }
}

/// Builds a rotation from an angular step expressed as a scaled axis (radians).
pub fn rotation_from_scaled_axis(step: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_scaled_axis(*step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ground_projection_drops_z() {
        let v = ground(&Vector3::new(3.0, -4.0, 12.0));
        assert_eq!(v, Vector3::new(3.0, -4.0, 0.0));
        assert_eq!(vertical(&Vector3::new(3.0, -4.0, 12.0)), Vector3::new(0.0, 0.0, 12.0));
    }

    #[test]
    fn safe_normal_of_zero_is_zero() {
        assert_eq!(safe_normal(&Vector3::zeros()), Vector3::zeros());
        let n = safe_normal(&Vector3::new(0.0, 10.0, 0.0));
        assert_abs_diff_eq!(n.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn clamp_respects_max_size() {
        let clamped = clamp_to_max_size(&Vector3::new(300.0, 400.0, 0.0), 100.0);
        assert_abs_diff_eq!(clamped.norm(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(clamped.x, 60.0, epsilon = 1e-9);

        let untouched = clamp_to_max_size(&Vector3::new(1.0, 0.0, 0.0), 100.0);
        assert_eq!(untouched, Vector3::new(1.0, 0.0, 0.0));

        assert_eq!(clamp_to_max_size(&Vector3::new(1.0, 0.0, 0.0), 0.0), Vector3::zeros());
    }

    #[test]
    fn nearly_zero_uses_tolerance() {
        assert!(vector_is_nearly_zero(&Vector3::new(5e-5, -5e-5, 0.0), KINDA_SMALL_NUMBER));
        assert!(!vector_is_nearly_zero(&Vector3::new(2e-4, 0.0, 0.0), KINDA_SMALL_NUMBER));
        assert!(is_nearly_zero(1e-9_f32, 1e-6));
    }
}
