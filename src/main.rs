//! # sapflux-gen
//!
//! Generates a CRBasic program that polls Implexx SDI-12 sap flow sensors and
//! logs their derived values into one record table.
//!
//! # Usage
//!
//! ```bash
//! # Two sensors, every 15 minutes, printed to stdout
//! sapflux-gen --logger-type CR300 -n 2 -t 15
//!
//! # Write to a file, bus on C2
//! sapflux-gen --logger-type cr300 -n 8 -t 30 --sdi12-port C2 -o programs/sapflux.cr300
//!
//! # Accept an interval below the sensor's recommended minimum
//! sapflux-gen --logger-type CR300 -n 1 -t 5 --allow-short-interval
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use sapflux_gen::{Cr300Synthesizer, IntervalPolicy, LoggerType, ProgramSynthesizer, Sdi12Port};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Generate CRBasic code for Implexx sap flow sensors
#[derive(Parser, Debug)]
#[command(name = "sapflux-gen")]
#[command(version)]
#[command(about = "Generate CRBasic code for Implexx sap flow sensors")]
#[command(long_about = None)]
struct Args {
    /// Target datalogger type (CR300)
    #[arg(long, value_name = "TYPE")]
    logger_type: LoggerType,

    /// Number of sensors on the SDI-12 bus
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    num_sensors: i64,

    /// Measurement interval in minutes
    #[arg(short = 't', long, allow_negative_numbers = true)]
    measure_interval: i64,

    /// Write the program to this file instead of stdout
    #[arg(short, long, value_name = "FILENAME")]
    output: Option<PathBuf>,

    /// Control port the SDI-12 bus is wired to
    #[arg(long, default_value = "C1")]
    sdi12_port: Sdi12Port,

    /// Warn instead of failing when the interval is below the sensor's minimum
    #[arg(long)]
    allow_short_interval: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args) {
        error!("Code generation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let policy = if args.allow_short_interval {
        IntervalPolicy::Warn
    } else {
        IntervalPolicy::Reject
    };

    let program = match args.logger_type {
        LoggerType::Cr300 => Cr300Synthesizer::new()
            .with_port(args.sdi12_port)
            .with_interval_policy(policy)
            .generate(args.num_sensors, args.measure_interval)?,
    };
    info!(
        logger = %args.logger_type,
        sensors = args.num_sensors,
        interval_min = args.measure_interval,
        "Program generated"
    );

    match &args.output {
        Some(path) => {
            write_program(path, program.as_str())?;
            info!("CRBasic code generated and saved to '{}'", path.display());
        }
        None => print!("{program}"),
    }
    Ok(())
}

/// Writes the program, creating missing parent directories.
fn write_program(path: &Path, program: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, program)
}

/// Setup tracing subscriber based on CLI arguments. Logs go to stderr so
/// stdout carries only program text.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
