// strider_sim/src/prelude.rs

pub use crate::agent::{InputTimeline, ScriptedAgent};
pub use crate::cli::Cli;
pub use crate::config::{
    collect_scenario_paths, AgentConfig, InputSegment, Pose, ScenarioConfig, SimulationSection,
};
pub use crate::error::SimError;
pub use crate::prng::SimulationRng;
pub use crate::runner::{run_scenario, RunOptions, RunReport};
