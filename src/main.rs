//! Battleplan - headless scenario runner
//!
//! Loads a TOML scenario, deploys its units, plays every turn and prints
//! a report of planned paths, unit poses and validity.

use battleplan::battle::{Scenario, ScenarioReport};
use battleplan::core::error::BattleError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Run a battle scenario without a UI
#[derive(Parser, Debug)]
#[command(name = "battleplan")]
#[command(about = "Play a TOML battle scenario and print the result")]
struct Args {
    /// Scenario file
    #[arg(default_value = "data/scenarios/skirmish.toml")]
    scenario: String,

    /// Override the number of turns to play
    #[arg(long)]
    turns: Option<u32>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("battleplan=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Scenario failed: {}", e);
            std::process::exit(1);
        }
    };

    match args.format.as_str() {
        "json" => print_json(&report),
        "text" => print_text(&report),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            print_json(&report);
        }
    }
}

fn run(args: &Args) -> Result<ScenarioReport, BattleError> {
    let mut scenario = Scenario::load(&args.scenario)?;
    if args.turns.is_some() {
        scenario.turns = args.turns;
    }
    scenario.run()
}

fn print_json(report: &ScenarioReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize report: {}", e),
    }
}

fn print_text(report: &ScenarioReport) {
    println!("Scenario: {}", report.scenario);
    println!("=========={}", "=".repeat(report.scenario.len()));
    println!("Deployed {} units", report.deployment.len());

    for turn in &report.turns {
        println!();
        println!("Turn {} ({})", turn.turn, if turn.valid { "valid" } else { "INVALID" });
        for path in &turn.planned {
            print!(
                "  {} [{}] {:.2}s over {} samples",
                path.unit,
                path.commands.join(", "),
                path.duration,
                path.samples
            );
            if let Some((time, reason)) = &path.violation {
                print!(" - illegal at {:.2}s: {}", time, reason);
            }
            println!();
        }
        for unit in &turn.units {
            println!(
                "  {} {:<10} at ({:.2}, {:.2}) facing {:.3} rad{}",
                unit.id,
                unit.unit_type,
                unit.pose.position.x,
                unit.pose.position.y,
                unit.pose.rotation,
                if unit.valid { "" } else { " (invalid)" }
            );
        }
    }

    println!();
    println!("{} events", report.events.len());
}
