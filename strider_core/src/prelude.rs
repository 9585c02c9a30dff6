// strider_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::host::{AgentRole, KinematicSnapshot, KinematicSource};

// --- Core Data Structures ---
pub use crate::history::SampleHistoryBuffer;
pub use crate::sample::{MotionSample, MotionSampleCollection};

// --- Engine & Configuration ---
pub use crate::config::EngineConfig;
pub use crate::engine::{PredictionState, ReplicatedInputState, TrajectoryEngine};
pub use crate::error::ConfigError;

// --- Algorithms ---
pub use crate::forecast::{apply_braking, forecast, ForecastInputs, ForecastSettings, MovementLimits};
pub use crate::kinematics::{
    estimate_acceleration_and_angular_velocity, EffectiveAccelerationTracker, KinematicTrend,
};
pub use crate::prediction::{
    angle_difference, angle_difference_xy, angle_difference_z, predict_pivot_offset,
    predict_stop_offset,
};
