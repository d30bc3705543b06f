//! galton - CLI Entry Point
//!
//! Sweeps λ, simulates lineages in parallel and reports survival statistics.

use clap::{Parser, Subcommand};
use galton::report::{export_json, export_trials_csv, Report};
use galton::{aggregate, benchmark, Config};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "galton")]
#[command(version)]
#[command(about = "Monte Carlo survival estimation for Galton-Watson lineages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a λ sweep and print survival statistics
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "galton.yaml")]
        config: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (defaults to available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Trials per λ
        #[arg(short, long)]
        repetitions: Option<usize>,

        /// Population cap counted as survival
        #[arg(long)]
        cap: Option<u64>,

        /// Confidence level for the survival interval
        #[arg(long)]
        confidence: Option<f64>,

        /// Write aggregate statistics as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write raw trial outcomes as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Time a single-λ experiment
    Benchmark {
        /// Mean offspring count
        #[arg(short, long, default_value = "1.5")]
        lambda: f64,

        /// Number of trials
        #[arg(short, long, default_value = "10000")]
        repetitions: usize,

        /// Population cap
        #[arg(long, default_value = "1000")]
        cap: u64,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "galton.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            workers,
            repetitions,
            cap,
            confidence,
            json,
            csv,
            quiet,
        } => {
            let mut config = load_config(&config)?;
            if seed.is_some() {
                config.parallel.seed = seed;
            }
            if workers.is_some() {
                config.parallel.workers = workers;
            }
            if let Some(r) = repetitions {
                config.trials.repetitions = r;
            }
            if let Some(c) = cap {
                config.trials.population_cap = c;
            }
            if let Some(c) = confidence {
                config.statistics.confidence_level = c;
            }
            init_logging(&config.logging.log_level);
            run_sweep(config, json, csv, quiet)
        }

        Commands::Benchmark {
            lambda,
            repetitions,
            cap,
        } => {
            init_logging("info");
            run_benchmark(lambda, repetitions, cap)
        }

        Commands::Init { output } => generate_config(output),
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        Ok(Config::default())
    }
}

fn run_sweep(
    config: Config,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let experiment = config.experiment()?;

    if !quiet {
        println!("Starting sweep");
        println!("  Lambdas: {:?}", experiment.lambdas());
        println!("  Repetitions: {}", experiment.repetitions());
        println!("  Population cap: {}", experiment.population_cap());
        println!();
    }

    let start = Instant::now();
    let results = experiment.run()?;
    let statistics = aggregate(&results, config.statistics.confidence_level)?;
    let elapsed = start.elapsed();

    let report = Report {
        total_trials: results.len(),
        seed: experiment.seed(),
        confidence_level: config.statistics.confidence_level,
        population_cap: experiment.population_cap(),
        elapsed,
        statistics,
    };

    if quiet {
        for stat in &report.statistics {
            println!("{}", stat.summary());
        }
    } else {
        println!("{}", report);
    }

    if let Some(path) = json {
        export_json(&report, &path)?;
        println!("Statistics: {:?}", path);
    }
    if let Some(path) = csv {
        export_trials_csv(&results, &path)?;
        println!("Trials: {:?}", path);
    }

    Ok(())
}

fn run_benchmark(lambda: f64, repetitions: usize, cap: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== galton Benchmark ===");
    println!("Lambda: {}", lambda);
    println!("Repetitions: {}", repetitions);
    println!();

    let result = benchmark(lambda, repetitions, cap)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
