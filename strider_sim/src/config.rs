// strider_sim/src/config.rs

//! Scenario files: one scripted agent plus the engine settings to run it with.
//!
//! Files are loaded through figment, so any field can be overridden from the
//! environment with a `STRIDER_` prefix and `__` as the table separator
//! (e.g. `STRIDER_ENGINE__SAMPLE_RATE=60`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strider_core::config::EngineConfig;
use strider_core::host::AgentRole;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::SimError;
use crate::serde_helpers;

/// The root of a scenario TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    // `[[inputs]]` becomes a Vec of segments.
    #[serde(default)]
    pub inputs: Vec<InputSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Fixed ticks per second.
    pub tick_rate: f64,
    pub duration_seconds: f64,
    /// Optional seed for the input jitter PRNG.
    pub seed: Option<u64>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            duration_seconds: 5.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub starting_pose: Pose,
    pub role: AgentRole,
    pub max_speed: f64,
    /// Acceleration applied along the input direction.
    pub max_acceleration: f64,
    pub braking_deceleration: f64,
    pub ground_friction: f64,
    /// Distance from the agent's origin down to its feet.
    pub half_height: f64,
    /// Standard deviation of the heading noise added to every input, in degrees.
    pub input_jitter_degrees: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            starting_pose: Pose::default(),
            role: AgentRole::Authority,
            max_speed: 600.0,
            max_acceleration: 2048.0,
            braking_deceleration: 2048.0,
            ground_friction: 8.0,
            half_height: 88.0,
            input_jitter_degrees: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub translation: Vector3<f64>,

    #[serde(with = "serde_helpers::quat_from_euler_deg", default)]
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

/// Input held from `start_seconds` until the next segment starts.
///
/// A zero `direction` means no input; anything else is normalized on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSegment {
    pub start_seconds: f64,
    #[serde(with = "serde_helpers::vec3_from_array")]
    pub direction: Vector3<f64>,
}

impl ScenarioConfig {
    /// Reads a scenario file, applies `STRIDER_` environment overrides and validates it.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        if !path.is_file() {
            return Err(SimError::ScenarioNotFound(path.to_path_buf()));
        }
        info!("Loading scenario from: {:?}", path);

        let mut scenario: ScenarioConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("STRIDER_").split("__"))
            .extract()?;

        if scenario.name.is_empty() {
            scenario.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parses a scenario from a TOML string, without environment overrides.
    pub fn from_toml_str(source: &str) -> Result<Self, SimError> {
        let scenario: ScenarioConfig = Figment::new().merge(Toml::string(source)).extract()?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let sim = &self.simulation;
        if !sim.tick_rate.is_finite() || sim.tick_rate <= 0.0 {
            return Err(SimError::InvalidScenario(format!(
                "tick_rate must be positive (got {})",
                sim.tick_rate
            )));
        }
        if !sim.duration_seconds.is_finite() || sim.duration_seconds < 0.0 {
            return Err(SimError::InvalidScenario(format!(
                "duration_seconds must be non-negative (got {})",
                sim.duration_seconds
            )));
        }

        let agent = &self.agent;
        for (field, value) in [
            ("max_speed", agent.max_speed),
            ("max_acceleration", agent.max_acceleration),
            ("braking_deceleration", agent.braking_deceleration),
            ("ground_friction", agent.ground_friction),
            ("input_jitter_degrees", agent.input_jitter_degrees),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidScenario(format!(
                    "agent.{field} must be finite and non-negative (got {value})"
                )));
            }
        }

        if let Some(segment) = self.inputs.iter().find(|s| !s.start_seconds.is_finite()) {
            return Err(SimError::InvalidScenario(format!(
                "input segment start must be finite (got {})",
                segment.start_seconds
            )));
        }

        self.engine.validate()?;
        Ok(())
    }

    /// Ticks covered by `duration_seconds` at `tick_rate`.
    pub fn tick_count(&self) -> u64 {
        (self.simulation.duration_seconds * self.simulation.tick_rate).round() as u64
    }
}

/// Resolves `path` to scenario files: the file itself, or every `.toml` below a directory.
pub fn collect_scenario_paths(path: &Path) -> Result<Vec<PathBuf>, SimError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(SimError::ScenarioNotFound(path.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir() && e.path().extension().map_or(false, |ext| ext == "toml"))
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    debug!("Found {} scenario file(s) under {:?}", paths.len(), path);

    if paths.is_empty() {
        return Err(SimError::ScenarioNotFound(path.to_path_buf()));
    }
    Ok(paths)
}
