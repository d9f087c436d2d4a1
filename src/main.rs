//! CLI Entry Point for iv-sweep
//!
//! Provides a command-line interface for:
//! - Running an IV-curve sweep against a selected HV supply driver
//! - Validating a settings file without touching hardware
//!
//! # Usage
//!
//! Run a sweep with the mock driver and the default settings:
//! ```bash
//! iv-sweep run
//! ```
//!
//! Run against a settings file and write the log elsewhere:
//! ```bash
//! iv-sweep run --config sweep.toml --output /tmp/ivCurve.log
//! ```
//!
//! Check a settings file:
//! ```bash
//! iv-sweep validate --config sweep.toml
//! ```

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use iv_sweep::config::Settings;
use iv_sweep::logging;
use iv_sweep::observer::SampleObserver;
use iv_sweep::recorder::SweepRecorder;
use iv_sweep::supply::{HvSupply, MockHvSupply, NullHvSupply};
use iv_sweep::sweep::{CancelToken, Sample, VoltageSweepController};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iv-sweep")]
#[command(about = "Stepped high-voltage IV-curve sweep controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one IV sweep and write the log file
    Run {
        /// Optional settings file (TOML)
        #[arg(long)]
        config: Option<String>,

        /// HV supply driver to use
        #[arg(long, value_enum, default_value = "mock")]
        driver: Driver,

        /// IV log path, overriding the settings file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also print the sweep result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a settings file without touching hardware
    Validate {
        /// Settings file (TOML)
        #[arg(long)]
        config: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Driver {
    /// Simulated supply with realistic readbacks
    Mock,
    /// Placeholder driver that fails every operation
    Null,
}

/// Prints each sample as it is recorded, one row per setpoint.
struct ConsoleObserver;

impl SampleObserver for ConsoleObserver {
    fn on_sample(&self, sample: &Sample) -> anyhow::Result<()> {
        println!(
            "   {:>7.1} V  meas {:+9.3} V  {:>10.3} uA  (reads: {})",
            sample.target_voltage,
            sample.measured_voltage,
            sample.current_micro_amps,
            sample.attempts
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            driver,
            output,
            json,
        } => run_sweep_once(config.as_deref(), driver, output, json).await,
        Commands::Validate { config } => validate_settings(config.as_deref()),
    }
}

async fn run_sweep_once(
    config: Option<&str>,
    driver: Driver,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let settings = load_settings(config)?;
    logging::init_from_settings(&settings.logging).map_err(|e| anyhow::anyhow!(e))?;

    println!("🔌 iv-sweep - IV-curve qualification");
    println!(
        "   Range: {} V to {} V in {} V steps, {} s settle delay",
        settings.sweep.voltage_min,
        settings.sweep.voltage_max,
        settings.sweep.voltage_step,
        settings.sweep.delay_sec
    );
    println!();

    let started_at = Local::now();
    let (cancel_tx, cancel) = CancelToken::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested, ending sweep");
            let _ = cancel_tx.send(true);
        }
    });

    let supply: Box<dyn HvSupply> = match driver {
        Driver::Mock => Box::new(MockHvSupply::new().with_noise(0.05)),
        Driver::Null => Box::new(NullHvSupply::new()),
    };

    println!("⚡ Sweeping on '{}' (Ctrl-C to stop)...", supply.name());
    let mut controller = VoltageSweepController::new();
    let result = controller
        .run_sweep(&settings.sweep, supply.as_ref(), &cancel, &ConsoleObserver)
        .await?;

    let log_path = output.unwrap_or_else(|| PathBuf::from(&settings.output.path));
    SweepRecorder::write_to_file(&log_path, &result, started_at)?;

    println!();
    if let Some(trip_voltage) = result.trip_voltage {
        println!("❌ HV supply tripped at {} V", trip_voltage);
    } else if result.cancelled {
        println!("⚠️  Sweep cancelled by operator");
    } else {
        println!("✅ Sweep complete");
    }
    println!("   Samples recorded: {}", result.samples.len());
    println!("   IV log: {}", log_path.display());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

fn validate_settings(config: Option<&str>) -> Result<()> {
    let settings = load_settings(config)?;
    settings.sweep.validate()?;

    println!("✅ Settings are valid");
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn load_settings(config: Option<&str>) -> Result<Settings> {
    match config {
        Some(path) => Ok(Settings::load(path)?),
        None => Ok(Settings::default()),
    }
}
