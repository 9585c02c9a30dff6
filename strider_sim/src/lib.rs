// strider_sim/src/lib.rs

//! Headless scenario runner for the `strider_core` trajectory engine.
//!
//! A scenario file scripts the inputs of one ground agent; the runner integrates
//! the agent, feeds it to a [`TrajectoryEngine`](strider_core::engine::TrajectoryEngine)
//! every tick and reports how the engine's stop and pivot predictions played out.

// This prelude is for convenience for other files WITHIN the strider_sim crate.
pub mod prelude;

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod prng;
pub mod runner;
pub mod serde_helpers;
