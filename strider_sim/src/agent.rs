// strider_sim/src/agent.rs

//! A scripted ground agent: the host side the engine observes each tick.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rand_distr::{Distribution, Normal};
use strider_core::engine::ReplicatedInputState;
use strider_core::forecast::{apply_braking, MovementLimits};
use strider_core::host::{AgentRole, KinematicSource};
use strider_core::math::{clamp_to_max_size, ground, safe_normal, vector_is_nearly_zero, vector_is_zero};
use strider_core::prediction::angle_difference_xy;

use crate::config::{AgentConfig, InputSegment};
use crate::error::SimError;
use crate::prng::SimulationRng;

/// Piecewise-constant input, one direction per segment.
#[derive(Debug, Clone, Default)]
pub struct InputTimeline {
    segments: Vec<InputSegment>,
}

impl InputTimeline {
    pub fn new(segments: &[InputSegment]) -> Self {
        let mut segments = segments.to_vec();
        segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
        Self { segments }
    }

    /// Unit ground-plane direction held at `time_seconds`, or zero.
    pub fn input_at(&self, time_seconds: f64) -> Vector3<f64> {
        // Tolerate accumulated tick rounding at segment boundaries.
        let time_seconds = time_seconds + 1.0e-9;
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.start_seconds <= time_seconds)
            .map_or_else(Vector3::zeros, |segment| safe_normal(&ground(&segment.direction)))
    }
}

/// Integrates walking-style movement: acceleration along the input, ground friction
/// turning the velocity toward the input, and braking when input is released.
pub struct ScriptedAgent {
    config: AgentConfig,
    timeline: InputTimeline,
    heading_noise: Option<Normal<f64>>,
    rng: SimulationRng,

    time_seconds: f64,
    transform: Isometry3<f64>,
    velocity: Vector3<f64>,
    input: Vector3<f64>,
    acceleration: Vector3<f64>,
}

impl ScriptedAgent {
    pub fn new(config: &AgentConfig, inputs: &[InputSegment], seed: Option<u64>) -> Result<Self, SimError> {
        let heading_noise = if config.input_jitter_degrees > 0.0 {
            let noise = Normal::new(0.0, config.input_jitter_degrees)
                .map_err(|e| SimError::InvalidScenario(format!("input_jitter_degrees: {e}")))?;
            Some(noise)
        } else {
            None
        };

        Ok(Self {
            config: config.clone(),
            timeline: InputTimeline::new(inputs),
            heading_noise,
            rng: SimulationRng::from_seed(seed),
            time_seconds: 0.0,
            transform: config.starting_pose.to_isometry(),
            velocity: Vector3::zeros(),
            input: Vector3::zeros(),
            acceleration: Vector3::zeros(),
        })
    }

    fn limits(&self) -> MovementLimits {
        MovementLimits {
            braking_deceleration: self.config.braking_deceleration,
            friction: self.config.ground_friction,
            max_speed: self.config.max_speed,
        }
    }

    /// Scripted input for the current time, with heading noise if configured.
    fn sample_input(&mut self) -> Vector3<f64> {
        let input = self.timeline.input_at(self.time_seconds);
        match &self.heading_noise {
            Some(noise) if !vector_is_zero(&input) => {
                let yaw = noise.sample(&mut self.rng.0).to_radians();
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw) * input
            }
            _ => input,
        }
    }

    /// Advances the agent by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.input = self.sample_input();
        let limits = self.limits();

        if vector_is_zero(&self.input) {
            self.acceleration = Vector3::zeros();
            self.velocity = apply_braking(self.velocity, dt, &limits);
        } else {
            self.acceleration = self.input * self.config.max_acceleration;
            let speed = self.velocity.norm();
            let turn = (limits.friction * dt).min(1.0);
            self.velocity -= (self.velocity - self.input * speed) * turn;
            self.velocity += self.acceleration * dt;
            self.velocity = clamp_to_max_size(&self.velocity, limits.max_speed);
        }

        let location = self.transform.translation.vector + self.velocity * dt;
        let mut rotation = self.transform.rotation;
        // Face the direction of travel.
        let planar = ground(&self.velocity);
        if !vector_is_nearly_zero(&planar, 1.0e-4) {
            rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, planar.y.atan2(planar.x));
        }
        self.transform = Isometry3::from_parts(Translation3::from(location), rotation);
        self.time_seconds += dt;
    }

    pub fn location(&self) -> Vector3<f64> {
        self.transform.translation.vector
    }

    pub fn is_at_rest(&self) -> bool {
        vector_is_zero(&self.velocity)
    }

    /// What the authority would replicate to a simulated proxy of this agent.
    pub fn replicated_input_state(&self) -> ReplicatedInputState {
        ReplicatedInputState {
            input_present: !vector_is_zero(&self.input),
            input_velocity_offset: angle_difference_xy(&self.input, &self.velocity),
        }
    }
}

impl KinematicSource for ScriptedAgent {
    fn time_seconds(&self) -> f64 {
        self.time_seconds
    }

    fn transform(&self) -> Isometry3<f64> {
        self.transform
    }

    fn lower_bound_location(&self) -> Vector3<f64> {
        self.location() - Vector3::z() * self.config.half_height
    }

    fn linear_velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    fn input_vector(&self) -> Vector3<f64> {
        self.input
    }

    fn transient_acceleration(&self) -> Vector3<f64> {
        self.acceleration
    }

    fn braking_deceleration(&self) -> f64 {
        self.config.braking_deceleration
    }

    fn ground_friction(&self) -> f64 {
        self.config.ground_friction
    }

    fn max_speed(&self) -> f64 {
        self.config.max_speed
    }

    fn role(&self) -> AgentRole {
        self.config.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const DT: f64 = 1.0 / 60.0;

    fn segment(start_seconds: f64, direction: [f64; 3]) -> InputSegment {
        InputSegment {
            start_seconds,
            direction: Vector3::from(direction),
        }
    }

    #[test]
    fn timeline_picks_latest_started_segment() {
        let timeline = InputTimeline::new(&[segment(1.0, [0.0, 0.0, 0.0]), segment(0.0, [3.0, 0.0, 1.0])]);
        assert_eq!(timeline.input_at(-0.5), Vector3::zeros());
        // Vertical input is dropped and the rest normalized.
        assert_relative_eq!(timeline.input_at(0.5), Vector3::x());
        assert_eq!(timeline.input_at(1.0), Vector3::zeros());
    }

    #[test]
    fn accelerates_to_max_speed_then_brakes_to_rest() {
        let mut agent = ScriptedAgent::new(
            &AgentConfig::default(),
            &[segment(0.0, [1.0, 0.0, 0.0]), segment(1.0, [0.0, 0.0, 0.0])],
            Some(3),
        )
        .unwrap();

        for _ in 0..60 {
            agent.step(DT);
        }
        assert_relative_eq!(agent.linear_velocity().x, 600.0, epsilon = 1e-9);
        assert_relative_eq!(agent.transient_acceleration().x, 2048.0);
        assert!(agent.location().x > 0.0);

        for _ in 0..60 {
            agent.step(DT);
        }
        assert!(agent.is_at_rest());
        assert_eq!(agent.transient_acceleration(), Vector3::zeros());
        assert!(!agent.replicated_input_state().input_present);
    }

    #[test]
    fn faces_the_direction_of_travel() {
        let mut agent = ScriptedAgent::new(&AgentConfig::default(), &[segment(0.0, [0.0, 1.0, 0.0])], None).unwrap();
        for _ in 0..10 {
            agent.step(DT);
        }
        let forward = agent.transform().rotation * Vector3::x();
        assert_relative_eq!(forward, Vector3::y(), epsilon = 1e-12);
        assert_abs_diff_eq!(agent.lower_bound_location().z, -88.0);
    }

    #[test]
    fn reversing_input_reports_a_large_offset() {
        let mut agent = ScriptedAgent::new(
            &AgentConfig::default(),
            &[segment(0.0, [1.0, 0.0, 0.0]), segment(0.5, [-1.0, 0.0, 0.0])],
            None,
        )
        .unwrap();
        for _ in 0..31 {
            agent.step(DT);
        }
        let state = agent.replicated_input_state();
        assert!(state.input_present);
        assert_relative_eq!(state.input_velocity_offset, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn seeded_jitter_is_repeatable() {
        let config = AgentConfig {
            input_jitter_degrees: 5.0,
            ..Default::default()
        };
        let inputs = [segment(0.0, [1.0, 0.0, 0.0])];
        let mut a = ScriptedAgent::new(&config, &inputs, Some(11)).unwrap();
        let mut b = ScriptedAgent::new(&config, &inputs, Some(11)).unwrap();
        for _ in 0..30 {
            a.step(DT);
            b.step(DT);
            assert_eq!(a.input_vector(), b.input_vector());
        }
        assert_eq!(a.location(), b.location());
        assert!(a.location().y.abs() > 0.0);
    }
}
