// strider_sim/src/runner.rs

//! Drives one scenario: step the agent, feed the engine, watch its predictions.

use nalgebra::Vector3;
use serde::Serialize;
use strider_core::engine::TrajectoryEngine;
use strider_core::host::KinematicSource;
use strider_core::math::ground;
use tracing::{debug, info, info_span};

use crate::agent::ScriptedAgent;
use crate::config::ScenarioConfig;
use crate::error::SimError;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the tick count derived from the scenario duration.
    pub ticks: Option<u64>,
    /// Log every sample of the final forecast.
    pub log_forecast: bool,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub ticks: u64,
    pub simulated_seconds: f64,
    /// Times a stop prediction started.
    pub stop_events: usize,
    /// Times a pivot prediction started.
    pub pivot_events: usize,
    /// Ground distance between each predicted and actual rest point.
    pub stop_errors: Vec<f64>,
    pub history_len: usize,
    pub history_distance: f64,
    pub trajectory_len: usize,
    pub final_location: [f64; 3],
    pub final_speed: f64,
}

/// Runs `scenario` to completion on a fresh engine.
pub fn run_scenario(scenario: &ScenarioConfig, options: &RunOptions) -> Result<RunReport, SimError> {
    scenario.validate()?;
    let _span = info_span!("scenario", name = %scenario.name).entered();

    let mut engine = TrajectoryEngine::new(scenario.engine.clone())?;
    let mut agent = ScriptedAgent::new(&scenario.agent, &scenario.inputs, scenario.simulation.seed)?;

    let dt = 1.0 / scenario.simulation.tick_rate;
    let ticks = options.ticks.unwrap_or_else(|| scenario.tick_count());
    let is_proxy = agent.role().is_simulated_proxy();
    info!(ticks, dt, role = ?agent.role(), "starting run");

    let mut stop_events = 0;
    let mut pivot_events = 0;
    let mut stop_errors = Vec::new();
    let mut pending_stop: Option<Vector3<f64>> = None;
    let mut was_pivoting = false;

    for tick in 0..ticks {
        agent.step(dt);

        if is_proxy {
            // Proxies only see input through replication.
            engine.apply_replicated_input_state(agent.replicated_input_state());
            engine.simulation_tick(&agent);
        } else {
            engine.movement_update(&agent);
        }
        engine.tick(&agent);

        let location = agent.location();
        let stop = engine.stop_prediction();
        if let (Some(offset), None) = (stop, pending_stop) {
            stop_events += 1;
            let target = location + offset;
            debug!(tick, distance = offset.norm(), "stop predicted");
            pending_stop = Some(target);
        }

        if let Some(target) = pending_stop {
            if agent.is_at_rest() {
                let error = ground(&(location - target)).norm();
                info!(tick, error, "agent came to rest");
                stop_errors.push(error);
                pending_stop = None;
            } else if stop.is_none() {
                debug!(tick, "stop cancelled by new input");
                pending_stop = None;
            }
        }

        let is_pivoting = engine.pivot_prediction().is_some();
        if is_pivoting && !was_pivoting {
            pivot_events += 1;
            debug!(tick, distance = engine.predicted_pivot_point().norm(), "pivot predicted");
        }
        was_pivoting = is_pivoting;
    }

    if options.log_forecast {
        for sample in engine.predicted_trajectory() {
            let location = sample.location();
            info!(
                t = sample.accumulated_seconds,
                x = location.x,
                y = location.y,
                z = location.z,
                speed = sample.world_linear_velocity.norm(),
                "forecast"
            );
        }
    }

    let location = agent.location();
    let report = RunReport {
        scenario: scenario.name.clone(),
        ticks,
        simulated_seconds: agent.time_seconds(),
        stop_events,
        pivot_events,
        stop_errors,
        history_len: engine.history().len(),
        history_distance: engine.movement_history(false).total_distance(),
        trajectory_len: engine.predicted_trajectory().len(),
        final_location: [location.x, location.y, location.z],
        final_speed: agent.linear_velocity().norm(),
    };
    info!(
        stops = report.stop_events,
        pivots = report.pivot_events,
        history = report.history_len,
        "run complete"
    );
    Ok(report)
}
