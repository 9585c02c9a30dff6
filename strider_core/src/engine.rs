// strider_core/src/engine.rs

//! The per-agent engine that ties history, estimation and prediction together.
//!
//! A host calls [`TrajectoryEngine::movement_update`] once per movement step and
//! [`TrajectoryEngine::tick`] once per frame. Simulated proxies additionally call
//! [`TrajectoryEngine::simulation_tick`] for every extrapolated step. Everything the
//! animation side needs is then available through `&self` accessors, or as a
//! [`PredictionState`] snapshot that can be handed to another thread.

use nalgebra::{Isometry3, Translation3, Vector3};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::forecast::{forecast, ForecastInputs, MovementLimits};
use crate::history::SampleHistoryBuffer;
use crate::host::{AgentRole, KinematicSource};
use crate::kinematics::{estimate_acceleration_and_angular_velocity, EffectiveAccelerationTracker, KinematicTrend};
use crate::math::{vector_is_zero, SMALL_NUMBER};
use crate::prediction::{angle_difference_xy, predict_pivot_offset, predict_stop_offset, PIVOT_ANGLE_THRESHOLD_DEGREES};
use crate::sample::{MotionSample, MotionSampleCollection};

/// Cached prediction results.
///
/// Zero-initialised; a field is only meaningful once its update has run (or the
/// matching precalculation flag is enabled in [`EngineConfig`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionState {
    /// Where the agent will stop, relative to its location.
    pub stop_point: Vector3<f64>,
    pub is_stopping: bool,
    /// Where the agent will finish a pivot, relative to its location.
    pub pivot_point: Vector3<f64>,
    pub is_pivoting: bool,
    /// The latest forecast: history, "now", then future samples.
    pub trajectory: MotionSampleCollection,
}

impl PredictionState {
    pub fn stop_prediction(&self) -> Option<Vector3<f64>> {
        self.is_stopping.then_some(self.stop_point)
    }

    pub fn pivot_prediction(&self) -> Option<Vector3<f64>> {
        self.is_pivoting.then_some(self.pivot_point)
    }
}

/// The input fields an authority shares with simulated proxies of the same agent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReplicatedInputState {
    pub input_present: bool,
    /// Degrees between input and velocity on the ground plane.
    pub input_velocity_offset: f64,
}

#[derive(Debug, Clone)]
pub struct TrajectoryEngine {
    config: EngineConfig,
    history: SampleHistoryBuffer,
    prediction: PredictionState,

    input_present: bool,
    input_velocity_offset: f64,
    effective_acceleration: Vector3<f64>,
    acceleration_tracker: EffectiveAccelerationTracker,

    had_input: bool,
    input_stopped_at: Option<f64>,
    clock_seconds: f64,
    role: AgentRole,
}

impl Default for TrajectoryEngine {
    fn default() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }
}

impl TrajectoryEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: EngineConfig) -> Self {
        Self {
            history: SampleHistoryBuffer::new(config.history_seconds, config.max_samples),
            config,
            prediction: PredictionState::default(),
            input_present: false,
            input_velocity_offset: 0.0,
            effective_acceleration: Vector3::zeros(),
            acceleration_tracker: EffectiveAccelerationTracker::new(),
            had_input: false,
            input_stopped_at: None,
            clock_seconds: 0.0,
            role: AgentRole::Authority,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drops all history, cached predictions and input tracking.
    pub fn reset(&mut self) {
        *self = Self::from_valid_config(self.config.clone());
    }

    fn observe(&mut self, host: &dyn KinematicSource) {
        self.clock_seconds = host.time_seconds();
        self.role = host.role();
    }

    // --- Per-step entry points ---

    /// Once per movement step. Agents with direct input read it from the host;
    /// simulated proxies estimate acceleration from their velocity instead.
    pub fn movement_update(&mut self, host: &dyn KinematicSource) {
        self.observe(host);

        if !self.role.is_simulated_proxy() {
            let input = host.input_vector();
            self.input_present = !vector_is_zero(&input);
            self.input_velocity_offset = angle_difference_xy(&input, &host.linear_velocity());
            self.effective_acceleration = host.transient_acceleration();
        } else {
            self.update_effective_acceleration(host);
        }
    }

    /// Once per extrapolated step on a simulated proxy.
    pub fn simulation_tick(&mut self, host: &dyn KinematicSource) {
        self.observe(host);
        self.update_effective_acceleration(host);
    }

    /// Once per frame: input edge tracking, then whichever precalculations are enabled.
    pub fn tick(&mut self, host: &dyn KinematicSource) {
        self.observe(host);

        let input_now = self.is_input_present(false);
        if self.had_input && !input_now {
            self.input_stopped_at = Some(self.clock_seconds);
        }
        self.had_input = input_now;

        if self.config.precalculate_distance_matches {
            self.update_stop_prediction(host);
            self.update_pivot_prediction(host);
        }

        if self.config.trajectory_enabled {
            self.update_movement_samples(host);
            if self.config.precalculate_future_trajectory {
                self.update_trajectory_prediction(host);
            }
        }
    }

    // --- Input state ---

    /// Whether movement input is applied. With `allow_grace`, a simulated proxy keeps
    /// reporting input for `input_grace_seconds` after it stopped.
    pub fn is_input_present(&self, allow_grace: bool) -> bool {
        if allow_grace && self.role.is_simulated_proxy() {
            let within_grace = self
                .input_stopped_at
                .is_some_and(|stopped| self.clock_seconds - stopped < self.config.input_grace_seconds);
            return self.input_present || within_grace;
        }
        self.input_present
    }

    /// True when input points far enough away from velocity that a pivot is likely.
    pub fn do_input_and_velocity_differ(&self) -> bool {
        self.input_velocity_offset.abs() > PIVOT_ANGLE_THRESHOLD_DEGREES
    }

    pub fn input_velocity_offset_angle(&self) -> f64 {
        self.input_velocity_offset
    }

    /// Acceleration derived from movement, as opposed to the raw input acceleration.
    pub fn current_effective_acceleration(&self) -> Vector3<f64> {
        self.effective_acceleration
    }

    pub fn replicated_input_state(&self) -> ReplicatedInputState {
        ReplicatedInputState {
            input_present: self.input_present,
            input_velocity_offset: self.input_velocity_offset,
        }
    }

    /// Applies input fields received from the authority (simulated proxies only
    /// learn about input this way).
    pub fn apply_replicated_input_state(&mut self, state: ReplicatedInputState) {
        self.input_present = state.input_present;
        self.input_velocity_offset = state.input_velocity_offset;
    }

    fn update_effective_acceleration(&mut self, host: &dyn KinematicSource) {
        self.effective_acceleration = self
            .acceleration_tracker
            .update(host.time_seconds(), host.linear_velocity());
    }

    // --- Stop / pivot ---

    pub fn update_stop_prediction(&mut self, host: &dyn KinematicSource) {
        let stop_point = predict_stop_offset(
            &host.linear_velocity(),
            host.braking_deceleration(),
            host.ground_friction(),
        );
        let is_stopping = !vector_is_zero(&stop_point) && !self.is_input_present(false);

        if is_stopping != self.prediction.is_stopping {
            debug!(is_stopping, distance = stop_point.norm(), "stop prediction changed");
        }
        self.prediction.stop_point = stop_point;
        self.prediction.is_stopping = is_stopping;
    }

    pub fn update_pivot_prediction(&mut self, host: &dyn KinematicSource) {
        let pivot_point = predict_pivot_offset(
            &self.effective_acceleration,
            &host.linear_velocity(),
            &host.transform().rotation,
            host.ground_friction(),
        );
        let is_pivoting = !vector_is_zero(&pivot_point)
            && self.is_input_present(true)
            && self.do_input_and_velocity_differ();

        if is_pivoting != self.prediction.is_pivoting {
            debug!(is_pivoting, distance = pivot_point.norm(), "pivot prediction changed");
        }
        self.prediction.pivot_point = pivot_point;
        self.prediction.is_pivoting = is_pivoting;
    }

    pub fn stop_prediction(&self) -> Option<Vector3<f64>> {
        self.prediction.stop_prediction()
    }

    pub fn pivot_prediction(&self) -> Option<Vector3<f64>> {
        self.prediction.pivot_prediction()
    }

    pub fn predicted_stop_point(&self) -> Vector3<f64> {
        self.prediction.stop_point
    }

    pub fn predicted_pivot_point(&self) -> Vector3<f64> {
        self.prediction.pivot_point
    }

    // --- History ---

    /// Records the current state, unless the host clock has not advanced.
    pub fn update_movement_samples(&mut self, host: &dyn KinematicSource) {
        let now = host.time_seconds();
        let advanced = self
            .history
            .last_update_seconds()
            .map_or(true, |last| now - last > SMALL_NUMBER);
        if advanced {
            let sample = self.movement_sample_from_current_state(host);
            self.add_movement_sample(sample, now);
        }
    }

    pub fn add_movement_sample(&mut self, sample: MotionSample, now_seconds: f64) {
        self.history.add_sample(sample, now_seconds);
    }

    /// A "now" sample anchored at the host's lower bound.
    pub fn movement_sample_from_current_state(&self, host: &dyn KinematicSource) -> MotionSample {
        let mut transform = host.transform();
        transform.translation = Translation3::from(host.lower_bound_location());

        let mut sample = MotionSample::new(transform, host.linear_velocity());
        let last = self.history.last_sample();
        if !last.is_zero_sample() {
            sample.delta_rotation = sample.world_rotation * last.world_rotation.inverse();
        }
        sample
    }

    pub fn movement_history(&self, omit_latest: bool) -> MotionSampleCollection {
        self.history.history(omit_latest)
    }

    pub fn history(&self) -> &SampleHistoryBuffer {
        &self.history
    }

    /// Acceleration and turn-rate trend read from history.
    pub fn kinematic_trend(&self) -> KinematicTrend {
        estimate_acceleration_and_angular_velocity(&self.history)
    }

    // --- Forecast ---

    /// Simulates the configured horizon from `origin` without touching cached state.
    pub fn predict_movement_future(
        &self,
        origin: &Isometry3<f64>,
        include_history: bool,
        host: &dyn KinematicSource,
    ) -> MotionSampleCollection {
        let history = include_history.then(|| self.history.history(false));
        let inputs = ForecastInputs {
            origin,
            history: history.as_ref().map(MotionSampleCollection::as_slice),
            current: self.movement_sample_from_current_state(host),
            velocity: host.linear_velocity(),
            trend: self.kinematic_trend(),
            limits: MovementLimits {
                braking_deceleration: host.braking_deceleration(),
                friction: host.ground_friction(),
                max_speed: host.max_speed(),
            },
        };
        forecast(&self.config.forecast_settings(), &inputs)
    }

    pub fn update_trajectory_prediction(&mut self, host: &dyn KinematicSource) {
        let trajectory =
            self.predict_movement_future(&host.transform(), self.config.forecast_includes_history, host);
        trace!(samples = trajectory.len(), "trajectory precalculated");
        self.prediction.trajectory = trajectory;
    }

    pub fn predicted_trajectory(&self) -> &MotionSampleCollection {
        &self.prediction.trajectory
    }

    pub fn prediction_state(&self) -> &PredictionState {
        &self.prediction
    }

    /// An owned copy of the cached predictions, safe to move to another thread.
    pub fn prediction_snapshot(&self) -> PredictionState {
        self.prediction.clone()
    }
}
