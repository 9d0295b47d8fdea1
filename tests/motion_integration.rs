//! Motion planner integration tests

use std::f64::consts::PI;

use battleplan::motion::*;
use glam::DVec2;

fn turner() -> MobilityProfile {
    MobilityProfile::new(10.0, 5.0, PI / 2.0, PI / 4.0)
}

fn at_origin() -> MovementState {
    MovementState::at_rest(DVec2::ZERO, 0.0)
}

#[test]
fn test_half_turn_completes_early() {
    let trajectory = plan(&MoveCommand::rotate(PI), &turner(), &at_origin(), 10.0, 0.1)
        .expect("a half turn fits in 10 s");

    // Triangle: 2 s up to π/2 rad/s, 2 s down
    assert!((trajectory.duration() - 4.0).abs() < 1e-9);
    assert!(trajectory.duration() < 10.0);
    assert!((trajectory.final_state().rotation - PI).abs() < 1e-9);
    assert_eq!(trajectory.final_state().rot_velocity, 0.0);
    assert!(trajectory.is_time_monotonic());

    let last = trajectory.samples().last().unwrap();
    assert_eq!(last.state, *trajectory.final_state());
}

#[test]
fn test_long_turn_exceeds_short_budget() {
    let result = plan(&MoveCommand::rotate(3.0 * PI / 2.0), &turner(), &at_origin(), 0.5, 0.1);

    match result {
        Err(PlanError::BudgetExceeded {
            required,
            budget,
            partial,
        }) => {
            // Shortest way to 3π/2 is a quarter turn clockwise: 2√2 s
            assert!((required - 2.0 * 2f64.sqrt()).abs() < 1e-9);
            assert_eq!(budget, 0.5);
            assert!((partial.duration() - 0.5).abs() < 1e-9);
            assert!(partial.final_state().rot_velocity < 0.0);
        }
        other => panic!("expected BudgetExceeded, got {:?}", other),
    }
}

#[test]
fn test_planning_is_deterministic() {
    let command = MoveCommand::reposition(DVec2::new(12.5, -3.0), DVec2::new(-1.0, 1.0));
    let start = MovementState::at_rest(DVec2::new(4.0, 7.0), 0.3);

    for coupling in [CouplingPolicy::Sequential, CouplingPolicy::Simultaneous] {
        let a = plan_with_coupling(&command, &turner(), &start, 30.0, 0.04, coupling).unwrap();
        let b = plan_with_coupling(&command, &turner(), &start, 30.0, 0.04, coupling).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.samples().iter().zip(b.samples()) {
            assert_eq!(x.time.to_bits(), y.time.to_bits());
            assert_eq!(x.state.position.x.to_bits(), y.state.position.x.to_bits());
            assert_eq!(x.state.position.y.to_bits(), y.state.position.y.to_bits());
            assert_eq!(x.state.rotation.to_bits(), y.state.rotation.to_bits());
        }
    }
}

#[test]
fn test_simultaneous_reposition_is_faster() {
    let command = MoveCommand::reposition(DVec2::new(0.0, 20.0), DVec2::new(-1.0, 0.0));
    let sequential =
        plan_with_coupling(&command, &turner(), &at_origin(), 60.0, 0.05, CouplingPolicy::Sequential)
            .unwrap();
    let simultaneous = plan_with_coupling(
        &command,
        &turner(),
        &at_origin(),
        60.0,
        0.05,
        CouplingPolicy::Simultaneous,
    )
    .unwrap();

    assert!(simultaneous.duration() < sequential.duration());
    for trajectory in [&sequential, &simultaneous] {
        assert_eq!(trajectory.final_state().position, DVec2::new(0.0, 20.0));
        assert!((trajectory.final_state().rotation - PI).abs() < 1e-9);
    }
}

#[test]
fn test_queue_chains_mixed_commands() {
    let mut queue = CommandQueue::new(
        at_origin(),
        turner(),
        MotionPlanner::new(60.0, 0.1, CouplingPolicy::Sequential),
    );
    queue.append(MoveCommand::wheel(DVec2::new(0.0, 10.0)));
    queue.append(MoveCommand::translate(DVec2::new(5.0, 0.0)));
    queue.append(MoveCommand::rotate(0.0));

    let trajectory = queue.trajectory_preview().unwrap();
    assert!(trajectory.is_time_monotonic());
    assert_eq!(trajectory.final_state().position, DVec2::new(5.0, 10.0));
    assert!(trajectory.final_state().rotation.abs() < 1e-9);

    // Heading never jumps by more than the turn rate allows in one step
    for pair in trajectory.samples().windows(2) {
        let dt = pair[1].time - pair[0].time;
        let turned = shortest_angle_delta(pair[0].state.rotation, pair[1].state.rotation).abs();
        assert!(turned <= PI / 2.0 * dt + 1e-9);
    }
}

#[test]
fn test_trajectory_json_has_samples_and_final() {
    let trajectory = plan(&MoveCommand::rotate(1.0), &turner(), &at_origin(), 10.0, 0.5).unwrap();
    let json = serde_json::to_value(&trajectory).unwrap();
    assert!(json["samples"].as_array().unwrap().len() >= 2);
    assert!(json["final"]["rotation"].as_f64().unwrap() > 0.99);
}
