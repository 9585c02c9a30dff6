// strider_core/src/sample.rs

use nalgebra::{Isometry3, UnitQuaternion, Vector3};

use crate::math::{vector_is_nearly_zero, KINDA_SMALL_NUMBER, SMALL_NUMBER};

/// One timestamped kinematic observation of an agent.
///
/// The `relative_*` fields are expressed in the reference frame that was "now" when
/// the sample was recorded. When that frame moves, the owner must call
/// [`MotionSample::prepend_relative_offset`] so the relative data stays anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Pose of the agent in the world frame.
    pub world_transform: Isometry3<f64>,
    /// Pose of the agent relative to the active reference frame.
    pub relative_transform: Isometry3<f64>,
    /// Linear velocity in the world frame.
    pub world_linear_velocity: Vector3<f64>,
    /// Linear velocity expressed in the active reference frame.
    pub relative_linear_velocity: Vector3<f64>,
    /// Orientation of the agent body in the world frame.
    pub world_rotation: UnitQuaternion<f64>,
    /// Rotation from the previous sample's orientation to this one.
    pub delta_rotation: UnitQuaternion<f64>,
    /// Signed time offset in seconds. 0 is "now", negative is history, positive is forecast.
    pub accumulated_seconds: f64,
}

impl Default for MotionSample {
    fn default() -> Self {
        Self {
            world_transform: Isometry3::identity(),
            relative_transform: Isometry3::identity(),
            world_linear_velocity: Vector3::zeros(),
            relative_linear_velocity: Vector3::zeros(),
            world_rotation: UnitQuaternion::identity(),
            delta_rotation: UnitQuaternion::identity(),
            accumulated_seconds: 0.0,
        }
    }
}

impl MotionSample {
    /// Creates a "now" sample anchored at its own pose.
    pub fn new(world_transform: Isometry3<f64>, world_linear_velocity: Vector3<f64>) -> Self {
        Self {
            world_transform,
            relative_transform: Isometry3::identity(),
            world_linear_velocity,
            relative_linear_velocity: world_transform
                .rotation
                .inverse_transform_vector(&world_linear_velocity),
            world_rotation: world_transform.rotation,
            delta_rotation: UnitQuaternion::identity(),
            accumulated_seconds: 0.0,
        }
    }

    /// World-space position of the sample.
    pub fn location(&self) -> Vector3<f64> {
        self.world_transform.translation.vector
    }

    /// Straight-line distance between the two samples' world positions.
    pub fn distance_from(&self, other: &MotionSample) -> f64 {
        (self.location() - other.location()).norm()
    }

    /// Re-expresses this sample against a new reference frame.
    ///
    /// `delta_transform` maps poses in the old reference frame into the new one and
    /// `delta_seconds` shifts the time offset (negative when "now" moved forward).
    pub fn prepend_relative_offset(&mut self, delta_transform: &Isometry3<f64>, delta_seconds: f64) {
        self.relative_transform = delta_transform * self.relative_transform;
        self.relative_linear_velocity = delta_transform
            .rotation
            .transform_vector(&self.relative_linear_velocity);
        self.accumulated_seconds += delta_seconds;
    }

    /// True when the sample sits at its reference origin with no velocity.
    pub fn is_zero_sample(&self) -> bool {
        vector_is_nearly_zero(&self.relative_transform.translation.vector, KINDA_SMALL_NUMBER)
            && vector_is_nearly_zero(&self.relative_linear_velocity, KINDA_SMALL_NUMBER)
    }

    /// Angular velocity from `older` to `self` as a world-frame scaled axis (rad/s).
    /// The z component is the yaw rate.
    pub fn rotation_velocity_from(&self, older: &MotionSample) -> Vector3<f64> {
        let dt = self.accumulated_seconds - older.accumulated_seconds;
        if dt.abs() < SMALL_NUMBER {
            return Vector3::zeros();
        }
        let delta = self.world_rotation * older.world_rotation.inverse();
        delta.scaled_axis() / dt
    }

    /// Average world-frame acceleration from `older` to `self`.
    pub fn acceleration_from(&self, older: &MotionSample) -> Vector3<f64> {
        let dt = self.accumulated_seconds - older.accumulated_seconds;
        if dt.abs() < SMALL_NUMBER {
            return Vector3::zeros();
        }
        (self.world_linear_velocity - older.world_linear_velocity) / dt
    }
}

/// Chronologically ordered samples (history, "now", then forecast).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionSampleCollection {
    pub samples: Vec<MotionSample>,
}

impl MotionSampleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: MotionSample) {
        self.samples.push(sample);
    }

    pub fn extend<I: IntoIterator<Item = MotionSample>>(&mut self, samples: I) {
        self.samples.extend(samples);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MotionSample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&MotionSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&MotionSample> {
        self.samples.last()
    }

    pub fn as_slice(&self) -> &[MotionSample] {
        &self.samples
    }

    /// Path length through consecutive world positions.
    pub fn total_distance(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|pair| pair[1].distance_from(&pair[0]))
            .sum()
    }

    /// Time span covered, from the first to the last sample.
    pub fn duration_seconds(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.accumulated_seconds - first.accumulated_seconds,
            _ => 0.0,
        }
    }
}

impl From<Vec<MotionSample>> for MotionSampleCollection {
    fn from(samples: Vec<MotionSample>) -> Self {
        Self { samples }
    }
}

impl<'a> IntoIterator for &'a MotionSampleCollection {
    type Item = &'a MotionSample;
    type IntoIter = std::slice::Iter<'a, MotionSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Translation3;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-9;

    fn pose(x: f64, y: f64, yaw: f64) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(x, y, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw),
        )
    }

    #[test]
    fn new_sample_expresses_velocity_in_own_frame() {
        // Facing +Y and moving +Y means "forward" in the body frame.
        let sample = MotionSample::new(pose(1.0, 2.0, FRAC_PI_2), Vector3::new(0.0, 100.0, 0.0));
        assert_abs_diff_eq!(sample.relative_linear_velocity.x, 100.0, epsilon = EPSILON);
        assert_abs_diff_eq!(sample.relative_linear_velocity.y, 0.0, epsilon = EPSILON);
        assert_eq!(sample.relative_transform, Isometry3::identity());
        assert_eq!(sample.accumulated_seconds, 0.0);
    }

    #[test]
    fn distance_uses_world_positions() {
        let a = MotionSample::new(pose(0.0, 0.0, 0.0), Vector3::zeros());
        let b = MotionSample::new(pose(3.0, 4.0, 1.0), Vector3::zeros());
        assert_abs_diff_eq!(a.distance_from(&b), 5.0, epsilon = EPSILON);
    }

    #[test]
    fn identity_rebase_is_a_no_op() {
        let mut sample = MotionSample::new(pose(5.0, -2.0, 0.3), Vector3::new(12.0, 3.0, 0.0));
        sample.prepend_relative_offset(&pose(1.0, 1.0, 0.2), -0.1);
        let before = sample;

        for _ in 0..5 {
            sample.prepend_relative_offset(&Isometry3::identity(), 0.0);
        }

        assert_abs_diff_eq!(
            (sample.relative_transform.translation.vector - before.relative_transform.translation.vector).norm(),
            0.0,
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(
            sample.relative_transform.rotation.angle_to(&before.relative_transform.rotation),
            0.0,
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(
            (sample.relative_linear_velocity - before.relative_linear_velocity).norm(),
            0.0,
            epsilon = EPSILON
        );
        assert_eq!(sample.accumulated_seconds, before.accumulated_seconds);
    }

    #[test]
    fn rebase_tracks_a_moving_reference_frame() {
        // Recorded at the origin, then the agent moves 10 units along +X.
        let old_pose = pose(0.0, 0.0, 0.0);
        let new_pose = pose(10.0, 0.0, 0.0);
        let mut sample = MotionSample::new(old_pose, Vector3::new(50.0, 0.0, 0.0));

        let delta = new_pose.inverse() * old_pose;
        sample.prepend_relative_offset(&delta, -0.2);

        assert_abs_diff_eq!(sample.relative_transform.translation.vector.x, -10.0, epsilon = EPSILON);
        assert_abs_diff_eq!(sample.accumulated_seconds, -0.2, epsilon = EPSILON);
        assert!(!sample.is_zero_sample());
    }

    #[test]
    fn zero_sample_requires_rest_at_origin() {
        assert!(MotionSample::new(pose(7.0, 7.0, 0.0), Vector3::zeros()).is_zero_sample());
        assert!(!MotionSample::new(pose(7.0, 7.0, 0.0), Vector3::new(1.0, 0.0, 0.0)).is_zero_sample());
    }

    #[test]
    fn derivatives_guard_zero_time_delta() {
        let a = MotionSample::new(pose(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0));
        let b = MotionSample::new(pose(0.0, 0.0, 1.0), Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(b.acceleration_from(&a), Vector3::zeros());
        assert_eq!(b.rotation_velocity_from(&a), Vector3::zeros());
    }

    #[test]
    fn derivatives_over_half_a_second() {
        let mut older = MotionSample::new(pose(0.0, 0.0, 0.0), Vector3::new(100.0, 0.0, 0.0));
        older.accumulated_seconds = -0.5;
        let newer = MotionSample::new(pose(0.0, 0.0, 0.25), Vector3::new(200.0, 0.0, 0.0));

        let acceleration = newer.acceleration_from(&older);
        assert_abs_diff_eq!(acceleration.x, 200.0, epsilon = EPSILON);

        let yaw_rate = newer.rotation_velocity_from(&older);
        assert_abs_diff_eq!(yaw_rate.z, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn collection_measures_path_and_span() {
        let mut collection = MotionSampleCollection::with_capacity(3);
        for (i, x) in [0.0, 3.0, 6.0].iter().enumerate() {
            let mut sample = MotionSample::new(pose(*x, 0.0, 0.0), Vector3::zeros());
            sample.accumulated_seconds = i as f64 * 0.5;
            collection.push(sample);
        }
        assert_eq!(collection.len(), 3);
        assert_abs_diff_eq!(collection.total_distance(), 6.0, epsilon = EPSILON);
        assert_abs_diff_eq!(collection.duration_seconds(), 1.0, epsilon = EPSILON);
        assert!(MotionSampleCollection::new().is_empty());
    }
}
