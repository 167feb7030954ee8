//! Adoption simulator CLI
//!
//! Loads a JSON scenario, runs it and prints adopter counts, event totals
//! and the final state digest.

use adoption_simulator_core_rs::{compute_state_digest, Orchestrator, SimulationConfig, TickResult};
use clap::Parser;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Discrete-event technology adoption simulator
#[derive(Parser, Debug)]
#[command(name = "adoption-sim")]
#[command(about = "Run a technology adoption scenario", long_about = None)]
struct Args {
    /// Scenario file (JSON)
    #[arg(short = 'S', long)]
    scenario: PathBuf,

    /// Override the scenario's number of ticks
    #[arg(short, long)]
    ticks: Option<usize>,

    /// Override the scenario's RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output
    #[arg(long)]
    json: bool,
}

struct Summary {
    ticks: usize,
    final_time: f64,
    events_processed: usize,
    events_scheduled: usize,
    adoptions: usize,
    expirations: usize,
    phase_failures: usize,
    adopters: BTreeMap<String, usize>,
    digest: String,
}

fn load_config(args: &Args) -> Result<SimulationConfig, String> {
    let raw = fs::read_to_string(&args.scenario)
        .map_err(|e| format!("cannot read {}: {}", args.scenario.display(), e))?;
    let mut config: SimulationConfig =
        serde_json::from_str(&raw).map_err(|e| format!("invalid scenario: {}", e))?;
    if let Some(ticks) = args.ticks {
        config.num_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    Ok(config)
}

fn run(config: SimulationConfig) -> Result<Summary, String> {
    let mut orchestrator = Orchestrator::new(config).map_err(|e| e.to_string())?;
    info!(run_id = %orchestrator.run_id(), "starting run");

    let results: Vec<TickResult> = orchestrator.run().map_err(|e| e.to_string())?;

    let state = orchestrator.state();
    let adopters = state
        .market()
        .products()
        .map(|p| (p.id.clone(), state.adopter_count(&p.id)))
        .collect();
    let digest = compute_state_digest(state).map_err(|e| e.to_string())?;

    Ok(Summary {
        ticks: results.len(),
        final_time: orchestrator.current_time(),
        events_processed: results.iter().map(|r| r.events_processed).sum(),
        events_scheduled: orchestrator.event_count(),
        adoptions: results.iter().map(|r| r.adoptions).sum(),
        expirations: results.iter().map(|r| r.expirations).sum(),
        phase_failures: results.iter().map(|r| r.phase_failures).sum(),
        adopters,
        digest,
    })
}

fn print_summary(summary: &Summary, as_json: bool) {
    if as_json {
        let output = json!({
            "ticks": summary.ticks,
            "final_time": summary.final_time,
            "events_processed": summary.events_processed,
            "events_scheduled": summary.events_scheduled,
            "adoptions": summary.adoptions,
            "expirations": summary.expirations,
            "phase_failures": summary.phase_failures,
            "adopters": summary.adopters,
            "digest": summary.digest,
        });
        println!("{}", output);
        return;
    }

    println!("Ticks run:         {}", summary.ticks);
    println!("Final time:        {}", summary.final_time);
    println!("Events processed:  {} ({} scheduled)", summary.events_processed, summary.events_scheduled);
    println!("Adoptions:         {}", summary.adoptions);
    println!("Expirations:       {}", summary.expirations);
    println!("Phase failures:    {}", summary.phase_failures);
    println!("Current adopters:");
    for (product, count) in &summary.adopters {
        println!("  {:<16} {}", product, count);
    }
    println!("State digest:      {}", summary.digest);
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match load_config(&args).and_then(run) {
        Ok(summary) => {
            print_summary(&summary, args.json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
