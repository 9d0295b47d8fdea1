use std::f64::consts::PI;

use battleplan::battle::{Battlefield, ZoneMap};
use battleplan::core::BattlefieldConfig;
use battleplan::motion::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use geo_types::MultiPolygon;
use glam::DVec2;

fn mobility() -> MobilityProfile {
    MobilityProfile::new(10.0, 5.0, PI / 2.0, PI / 4.0)
}

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![battleplan::battle::zones::polygon_from_vertices(&[
        [x0, y0],
        [x1, y0],
        [x1, y1],
        [x0, y1],
    ])])
}

fn bench_plan_commands(c: &mut Criterion) {
    let start = MovementState::at_rest(DVec2::new(3.0, -2.0), 0.4);
    let commands = [
        MoveCommand::translate(DVec2::new(40.0, 15.0)),
        MoveCommand::rotate(3.0),
        MoveCommand::wheel(DVec2::new(-20.0, 35.0)),
        MoveCommand::reposition(DVec2::new(25.0, 25.0), DVec2::new(0.0, -1.0)),
    ];

    let mut group = c.benchmark_group("plan");
    for command in &commands {
        group.bench_function(command.name(), |b| {
            b.iter(|| plan(black_box(command), &mobility(), &start, 60.0, 0.04))
        });
    }
    group.finish();
}

fn bench_queue_preview(c: &mut Criterion) {
    let mut queue = CommandQueue::new(
        MovementState::at_rest(DVec2::ZERO, 0.0),
        mobility(),
        MotionPlanner::new(60.0, 0.04, CouplingPolicy::Sequential),
    );
    for i in 0..8 {
        let offset = DVec2::from_angle(i as f64 * PI / 4.0) * 10.0;
        queue.append(MoveCommand::wheel(offset));
    }

    c.bench_function("queue_preview_8_wheels", |b| {
        b.iter(|| black_box(&queue).trajectory_preview())
    });
}

/// A moving-phase battlefield with `count` units, each holding two orders
fn ready_battlefield(count: usize) -> Battlefield {
    let zones = ZoneMap::new(
        square(0.0, 0.0, 1000.0, 100.0),
        square(0.0, 900.0, 1000.0, 1000.0),
        square(0.0, 0.0, 1000.0, 1000.0),
        MultiPolygon::new(vec![]),
        MultiPolygon::new(vec![]),
        vec![("lake".to_string(), square(450.0, 450.0, 550.0, 550.0))],
    )
    .expect("bench zones are valid");
    let mut battlefield =
        Battlefield::new(BattlefieldConfig::default(), zones).expect("default config is valid");

    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let id = battlefield
            .request_deploy("infantry")
            .expect("infantry is a default unit type");
        let x = 10.0 + (i % 100) as f64 * 9.5;
        let y = 10.0 + (i / 100) as f64 * 8.0;
        battlefield
            .drag_to(id, DVec2::new(x, y), PI / 2.0)
            .expect("unit is held");
        battlefield.place(id).expect("unit is held");
        ids.push(id);
    }
    battlefield.advance_to_move().expect("deployment is legal");

    for id in ids {
        battlefield
            .append_command(id, MoveCommand::translate(DVec2::new(0.0, 12.0)))
            .expect("unit is moving");
        battlefield
            .append_command(id, MoveCommand::rotate(0.0))
            .expect("unit is moving");
    }
    battlefield
}

fn bench_commit_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_turn");
    for count in [16, 256] {
        group.bench_function(format!("{}_units", count), |b| {
            b.iter_batched(
                || ready_battlefield(count),
                |mut battlefield| battlefield.commit_turn(),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan_commands, bench_queue_preview, bench_commit_turn);
criterion_main!(benches);
