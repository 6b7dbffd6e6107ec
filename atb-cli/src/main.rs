//! Alpha Testbed CLI
//!
//! Repeatable evaluation of computational trust models.

mod experiment;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use atb_runtime::{EvaluationData, MetricRole, Runner, TickLogger};
use experiment::Experiment;

#[derive(Parser)]
#[command(name = "atb")]
#[command(author, version, about = "Alpha Testbed: evaluate trust models on synthetic agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

impl Format {
    fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment and write its readings
    Run {
        /// Experiment file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Number of ticks (overrides the experiment)
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Random seed (overrides the experiment)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Output file (default: <scenario>-<model>-<seed>-<timestamp>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate an experiment and show the evaluation mode
    Check {
        /// Experiment file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            format,
            output,
        } => run_experiment(&config, ticks, seed, format, output),
        Commands::Check { config } => check_experiment(&config),
    }
}

fn run_experiment(
    path: &Path,
    ticks: Option<u32>,
    seed: Option<u64>,
    format: Format,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("🧪 Alpha Testbed\n");

    let mut experiment = Experiment::load(path)?;
    if let Some(ticks) = ticks {
        experiment.ticks = ticks;
    }
    if let Some(seed) = seed {
        experiment.seed = seed;
    }

    let mut protocol = experiment.build()?;
    println!("📋 Experiment: {}", path.display());
    println!(
        "🤖 Model: {} | 🌐 Scenario: {}",
        protocol.trust_model_name(),
        protocol.scenario_name()
    );
    println!(
        "⚙️  Mode: {} | Ticks: {} | Seed: {}\n",
        protocol.mode(),
        experiment.ticks,
        experiment.seed
    );

    protocol.subscribe(TickLogger);

    let mut runner = Runner::new(protocol, experiment.seed);
    let data = runner
        .run(experiment.ticks)
        .with_context(|| format!("Evaluation of {} failed", path.display()))?;

    let output_path = output.unwrap_or_else(|| {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
        PathBuf::from(format!(
            "{}-{}.{}",
            data.file_stem(),
            timestamp,
            format.extension()
        ))
    });

    let contents = match format {
        Format::Json => data.to_json()?,
        Format::Csv => data.to_csv(),
    };
    fs::write(&output_path, contents)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("✅ Evaluation complete!");
    println!("📄 {} readings saved to: {}", data.readings.len(), output_path.display());
    print_final_scores(&data);

    Ok(())
}

fn print_final_scores(data: &EvaluationData) {
    println!("\n📊 Final scores:");
    for role in [MetricRole::Accuracy, MetricRole::Utility, MetricRole::OpinionCost] {
        let services: BTreeSet<_> = data
            .readings
            .iter()
            .filter(|r| r.role == role)
            .map(|r| r.service)
            .collect();

        for service in services {
            if let Some(last) = data.readings_for(role, service).last() {
                println!(
                    "   {} (service {}, tick {}): {:.4}",
                    last.metric, service, last.tick, last.value
                );
            }
        }
    }
}

fn check_experiment(path: &Path) -> Result<()> {
    let experiment = Experiment::load(path)?;
    let protocol = experiment.build()?;

    println!("✅ {} is valid", path.display());
    println!("   Model: {}", protocol.trust_model_name());
    println!("   Scenario: {}", protocol.scenario_name());
    println!("   Mode: {}", protocol.mode());
    for &role in protocol.mode().roles() {
        if let Some(name) = protocol.metric_name(role) {
            println!("   {}: {}", role, name);
        }
    }
    println!("   Ticks: {} | Seed: {}", experiment.ticks, experiment.seed);

    Ok(())
}
