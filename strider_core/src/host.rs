// strider_core/src/host.rs

use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

/// How the host's copy of the agent relates to the authoritative simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AgentRole {
    /// Standalone or server-side agent; input and acceleration are known directly.
    #[default]
    Authority,
    /// Locally controlled agent on a client.
    AutonomousProxy,
    /// Remote agent whose state is extrapolated; acceleration must be estimated.
    SimulatedProxy,
}

impl AgentRole {
    pub fn is_simulated_proxy(self) -> bool {
        matches!(self, AgentRole::SimulatedProxy)
    }
}

// This is the contract between the engine and whatever owns the agent's body.
// A physics character, a replay, or a test fixture can all implement it.
pub trait KinematicSource {
    /// Host clock, in seconds.
    fn time_seconds(&self) -> f64;

    /// Pose of the agent in the world frame.
    fn transform(&self) -> Isometry3<f64>;

    /// Point samples are anchored to, typically the bottom of the collision shape.
    fn lower_bound_location(&self) -> Vector3<f64> {
        self.transform().translation.vector
    }

    /// World-frame linear velocity.
    fn linear_velocity(&self) -> Vector3<f64>;

    /// Processed movement input. Zero means no input is applied.
    fn input_vector(&self) -> Vector3<f64>;

    /// Acceleration the host applied this step, when known.
    fn transient_acceleration(&self) -> Vector3<f64>;

    fn braking_deceleration(&self) -> f64;

    fn ground_friction(&self) -> f64;

    fn max_speed(&self) -> f64;

    fn role(&self) -> AgentRole {
        AgentRole::Authority
    }
}

/// A plain-data [`KinematicSource`], for hosts that prefer to push a copy each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicSnapshot {
    pub time_seconds: f64,
    pub transform: Isometry3<f64>,
    pub lower_bound_location: Option<Vector3<f64>>,
    pub linear_velocity: Vector3<f64>,
    pub input_vector: Vector3<f64>,
    pub transient_acceleration: Vector3<f64>,
    pub braking_deceleration: f64,
    pub ground_friction: f64,
    pub max_speed: f64,
    pub role: AgentRole,
}

impl Default for KinematicSnapshot {
    fn default() -> Self {
        Self {
            time_seconds: 0.0,
            transform: Isometry3::identity(),
            lower_bound_location: None,
            linear_velocity: Vector3::zeros(),
            input_vector: Vector3::zeros(),
            transient_acceleration: Vector3::zeros(),
            braking_deceleration: 2048.0,
            ground_friction: 8.0,
            max_speed: 600.0,
            role: AgentRole::Authority,
        }
    }
}

impl KinematicSource for KinematicSnapshot {
    fn time_seconds(&self) -> f64 {
        self.time_seconds
    }

    fn transform(&self) -> Isometry3<f64> {
        self.transform
    }

    fn lower_bound_location(&self) -> Vector3<f64> {
        self.lower_bound_location
            .unwrap_or(self.transform.translation.vector)
    }

    fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_velocity
    }

    fn input_vector(&self) -> Vector3<f64> {
        self.input_vector
    }

    fn transient_acceleration(&self) -> Vector3<f64> {
        self.transient_acceleration
    }

    fn braking_deceleration(&self) -> f64 {
        self.braking_deceleration
    }

    fn ground_friction(&self) -> f64 {
        self.ground_friction
    }

    fn max_speed(&self) -> f64 {
        self.max_speed
    }

    fn role(&self) -> AgentRole {
        self.role
    }
}
