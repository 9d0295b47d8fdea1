//! Motion Bench
//!
//! Plans a single command for one unit and prints every trajectory sample
//! as a pipe-separated row, ready for plotting.

use std::f64::consts::PI;

use battleplan::motion::{
    plan_with_coupling, CouplingPolicy, MobilityProfile, MoveCommand, MovementState, PlanError,
    Trajectory,
};
use clap::{Parser, Subcommand, ValueEnum};
use glam::DVec2;
use tracing_subscriber::EnvFilter;

/// Motion Bench - plan one command and dump its samples
#[derive(Parser, Debug)]
#[command(name = "motion_bench")]
#[command(about = "Plan one movement command and print time|position|rotation|velocity|rotational velocity rows")]
struct Args {
    #[command(subcommand)]
    command: BenchCommand,

    /// Maximum linear velocity
    #[arg(long, default_value_t = 10.0)]
    max_velocity: f64,

    /// Maximum linear acceleration
    #[arg(long, default_value_t = 5.0)]
    max_acceleration: f64,

    /// Maximum angular velocity (rad/s)
    #[arg(long, default_value_t = PI / 2.0)]
    max_angular_velocity: f64,

    /// Maximum angular acceleration (rad/s²)
    #[arg(long, default_value_t = PI / 4.0)]
    max_angular_acceleration: f64,

    /// Planning time budget in seconds
    #[arg(long, default_value_t = 10.0)]
    budget: f64,

    /// Sample step in seconds
    #[arg(long, default_value_t = 0.1)]
    delta: f64,

    /// Starting heading (rad)
    #[arg(long, default_value_t = 0.0)]
    rotation: f64,

    /// Wheel/Reposition coupling
    #[arg(long, value_enum, default_value_t = Coupling::Sequential)]
    coupling: Coupling,
}

#[derive(Subcommand, Debug)]
enum BenchCommand {
    /// Move by (x, y) keeping the heading
    Translate { x: f64, y: f64 },
    /// Turn in place to an absolute heading
    Rotate { target: f64 },
    /// Move by (x, y) and end facing the travel direction
    Wheel { x: f64, y: f64 },
    /// Move by (x, y) and end facing (dx, dy)
    Reposition { x: f64, y: f64, dx: f64, dy: f64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Coupling {
    Sequential,
    Simultaneous,
}

impl From<Coupling> for CouplingPolicy {
    fn from(coupling: Coupling) -> Self {
        match coupling {
            Coupling::Sequential => CouplingPolicy::Sequential,
            Coupling::Simultaneous => CouplingPolicy::Simultaneous,
        }
    }
}

impl BenchCommand {
    fn to_command(&self) -> MoveCommand {
        match *self {
            BenchCommand::Translate { x, y } => MoveCommand::translate(DVec2::new(x, y)),
            BenchCommand::Rotate { target } => MoveCommand::rotate(target),
            BenchCommand::Wheel { x, y } => MoveCommand::wheel(DVec2::new(x, y)),
            BenchCommand::Reposition { x, y, dx, dy } => {
                MoveCommand::reposition(DVec2::new(x, y), DVec2::new(dx, dy))
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("battleplan=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mobility = MobilityProfile::new(
        args.max_velocity,
        args.max_acceleration,
        args.max_angular_velocity,
        args.max_angular_acceleration,
    );
    let initial = MovementState::at_rest(DVec2::ZERO, args.rotation);
    let command = args.command.to_command();

    let trajectory = match plan_with_coupling(
        &command,
        &mobility,
        &initial,
        args.budget,
        args.delta,
        args.coupling.into(),
    ) {
        Ok(trajectory) => trajectory,
        Err(PlanError::BudgetExceeded {
            required,
            budget,
            partial,
        }) => {
            eprintln!(
                "Warning: {} needs {:.3}s, budget is {:.3}s; printing the partial trajectory",
                command.name(),
                required,
                budget
            );
            partial
        }
        Err(e) => {
            eprintln!("Planning failed: {}", e);
            std::process::exit(1);
        }
    };

    print_rows(&trajectory);
}

fn print_rows(trajectory: &Trajectory) {
    println!("time|position|rotation|velocity|rotational velocity");
    for sample in trajectory.samples() {
        let s = &sample.state;
        println!(
            "{:.4}|({:.4}, {:.4})|{:.6}|({:.4}, {:.4})|{:.6}",
            sample.time,
            s.position.x,
            s.position.y,
            s.rotation,
            s.velocity.x,
            s.velocity.y,
            s.rot_velocity
        );
    }
}
