// strider_core/tests/engine_scenarios.rs

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use strider_core::prelude::*;

const TICK: f64 = 1.0 / 60.0;

fn host(time: f64, location: Vector3<f64>, velocity: Vector3<f64>, input: Vector3<f64>) -> KinematicSnapshot {
    KinematicSnapshot {
        time_seconds: time,
        transform: Isometry3::from_parts(location.into(), UnitQuaternion::identity()),
        linear_velocity: velocity,
        input_vector: input,
        braking_deceleration: 2000.0,
        ground_friction: 8.0,
        max_speed: 600.0,
        ..Default::default()
    }
}

#[test]
fn agent_at_rest_predicts_no_stop() {
    let mut engine = TrajectoryEngine::default();
    let state = host(0.0, Vector3::zeros(), Vector3::zeros(), Vector3::zeros());
    engine.movement_update(&state);
    engine.tick(&state);

    assert_eq!(engine.predicted_stop_point(), Vector3::zeros());
    assert_eq!(engine.stop_prediction(), None);
}

#[test]
fn coasting_agent_predicts_stop_distance() {
    let mut engine = TrajectoryEngine::default();
    let state = host(0.0, Vector3::zeros(), Vector3::new(600.0, 0.0, 0.0), Vector3::zeros());
    engine.movement_update(&state);
    engine.tick(&state);

    let stop = engine.stop_prediction();
    assert!(stop.is_some());
    let stop = stop.unwrap_or_default();
    assert_relative_eq!(stop.norm(), 22.5, epsilon = 1e-9);
    assert_relative_eq!(stop.x, 22.5, epsilon = 1e-9);
}

#[test]
fn forecast_without_history_has_thirty_one_samples() {
    let config = EngineConfig {
        forecast_includes_history: false,
        ..Default::default()
    };
    let mut engine = TrajectoryEngine::new(config).unwrap();
    let state = host(0.0, Vector3::zeros(), Vector3::new(300.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    engine.movement_update(&state);
    engine.tick(&state);

    let trajectory = engine.predicted_trajectory();
    assert_eq!(trajectory.len(), 31);
    for (idx, sample) in trajectory.iter().enumerate() {
        assert_relative_eq!(sample.accumulated_seconds, idx as f64 / 30.0, epsilon = 1e-12);
    }
}

#[test]
fn forecast_is_repeatable_without_state_changes() {
    let mut engine = TrajectoryEngine::default();
    let mut location = Vector3::zeros();
    let mut time = 0.0;
    for step in 0..40 {
        let speed = 10.0 * step as f64;
        let state = host(time, location, Vector3::new(speed, speed * 0.25, 0.0), Vector3::new(1.0, 0.25, 0.0));
        engine.movement_update(&state);
        engine.tick(&state);
        location += Vector3::new(speed, speed * 0.25, 0.0) * TICK;
        time += TICK;
    }

    let state = host(time, location, Vector3::new(400.0, 100.0, 0.0), Vector3::new(1.0, 0.25, 0.0));
    let origin = state.transform;
    let first = engine.predict_movement_future(&origin, true, &state);
    let second = engine.predict_movement_future(&origin, true, &state);
    assert_eq!(first, second);
    assert_eq!(first.len(), engine.history().len() + 31);
}

#[test]
fn history_never_exceeds_its_window_while_moving() {
    let config = EngineConfig {
        history_seconds: 0.75,
        ..Default::default()
    };
    let mut engine = TrajectoryEngine::new(config).unwrap();
    let velocity = Vector3::new(250.0, 0.0, 0.0);
    let mut location = Vector3::zeros();
    for step in 0..300 {
        let state = host(step as f64 * TICK, location, velocity, Vector3::new(1.0, 0.0, 0.0));
        engine.tick(&state);
        location += velocity * TICK;

        let history = engine.movement_history(false);
        assert!(history.iter().all(|s| s.accumulated_seconds >= -0.75));
        assert!(history.iter().all(|s| s.accumulated_seconds <= 0.0));
    }
}

#[test]
fn stopping_keeps_history_above_the_horizon() {
    let mut engine = TrajectoryEngine::default();
    let velocity = Vector3::new(300.0, 0.0, 0.0);
    let mut location = Vector3::zeros();
    let mut time = 0.0;
    for _ in 0..30 {
        engine.tick(&host(time, location, velocity, Vector3::new(1.0, 0.0, 0.0)));
        location += velocity * TICK;
        time += TICK;
    }

    // The first still tick still covers the last bit of travel.
    engine.tick(&host(time, location, Vector3::zeros(), Vector3::zeros()));
    time += TICK;
    assert!(engine.history().time_domain_horizon().is_none());

    for _ in 0..120 {
        engine.tick(&host(time, location, Vector3::zeros(), Vector3::zeros()));
        time += TICK;

        let horizon = engine.history().time_domain_horizon();
        assert!(horizon.is_some());
        let horizon = horizon.unwrap_or_default();
        assert!(engine.history().iter().all(|s| s.accumulated_seconds >= horizon));
        assert!(engine.history().iter().filter(|s| s.is_zero_sample()).count() <= 1);
    }
}

#[test]
fn reversing_input_predicts_a_pivot() {
    let mut engine = TrajectoryEngine::default();
    let mut state = host(0.0, Vector3::zeros(), Vector3::new(400.0, 0.0, 0.0), Vector3::new(-1.0, 0.05, 0.0));
    state.transient_acceleration = Vector3::new(-2048.0, 100.0, 0.0);

    engine.movement_update(&state);
    engine.tick(&state);

    let pivot = engine.pivot_prediction();
    assert!(pivot.is_some());
    let pivot = pivot.unwrap_or_default();
    assert!(pivot.x > 0.0);
    assert_abs_diff_eq!(pivot.z, 0.0, epsilon = 1e-9);
    // Input is present, so no stop is reported at the same time.
    assert_eq!(engine.stop_prediction(), None);
}

#[test]
fn simulated_proxy_estimates_acceleration_from_steps() {
    let mut engine = TrajectoryEngine::default();
    let mut state = host(0.0, Vector3::zeros(), Vector3::new(400.0, 0.0, 0.0), Vector3::zeros());
    state.role = AgentRole::SimulatedProxy;
    engine.simulation_tick(&state);

    state.time_seconds = 0.1;
    state.linear_velocity = Vector3::new(200.0, 0.0, 0.0);
    engine.simulation_tick(&state);
    assert_relative_eq!(engine.current_effective_acceleration().x, -2000.0, epsilon = 1e-9);

    // The authority's input arrives through replication.
    engine.apply_replicated_input_state(ReplicatedInputState {
        input_present: true,
        input_velocity_offset: 178.0,
    });
    engine.tick(&state);
    assert!(engine.pivot_prediction().is_some());
}

#[test]
fn snapshot_can_be_read_from_another_thread() {
    let mut engine = TrajectoryEngine::default();
    let state = host(0.0, Vector3::zeros(), Vector3::new(600.0, 0.0, 0.0), Vector3::zeros());
    engine.movement_update(&state);
    engine.tick(&state);

    let snapshot = engine.prediction_snapshot();
    let handle = std::thread::spawn(move || snapshot.stop_prediction().map(|p| p.norm()));
    let distance = handle.join().ok().flatten().unwrap_or_default();
    assert_relative_eq!(distance, 22.5, epsilon = 1e-9);
}

#[test]
fn unbounded_configs_are_rejected_before_ticking() {
    let huge_forecast = EngineConfig {
        forecast_seconds: 1.0e30,
        ..Default::default()
    };
    assert!(matches!(
        TrajectoryEngine::new(huge_forecast),
        Err(ConfigError::ForecastTooLong { .. })
    ));

    let huge_history = EngineConfig {
        max_samples: usize::MAX,
        ..Default::default()
    };
    assert!(matches!(
        TrajectoryEngine::new(huge_history),
        Err(ConfigError::CapacityTooLarge { .. })
    ));
}
