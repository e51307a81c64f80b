//! TeleSABRE command line front end.
//!
//! Takes any number of `.json`/`.qasm` files naming the device, config, and
//! circuit, plus any number of `--key value` config overrides, runs the
//! retry-best-of-N scheduling harness, and prints the result.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ts_cli::{run_with_retries, Inputs};

/// TeleSABRE - multi-core quantum circuit routing scheduler.
#[derive(Parser)]
#[command(name = "telesabre")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Device/config/circuit files (.json and/or .qasm) and `--key value`
    /// config overrides, interleaved in any order.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let (files, overrides) = split_args(&cli.args)?;

    let inputs = match Inputs::load(&files) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let (device, mut config, circuit) = match inputs.into_complete() {
        Ok(triple) => triple,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Usage: telesabre <config.json> <device.json> <circuit.qasm> [--key value ...]");
            return Ok(ExitCode::FAILURE);
        }
    };

    for (key, value) in &overrides {
        if let Err(err) = config.apply_override(key, value) {
            eprintln!("Error: {err}");
            return Ok(ExitCode::FAILURE);
        }
    }

    info!(attempts = config.max_attempts, required_successes = config.required_successes, "starting scheduler");
    let outcome = run_with_retries(&device, &circuit, &config)?;

    println!("\nResult:");
    println!("  Iterations: {}", outcome.result.iterations);
    println!("  Teledata:   {}", outcome.result.num_teledata);
    println!("  Telegate:   {}", outcome.result.num_telegate);
    println!("  Swaps:      {}", outcome.result.num_swaps);
    println!("  Deadlocks:  {}", outcome.result.num_deadlocks);
    println!("  Attempts:   {}", outcome.attempts);
    println!("  Success:    {}", outcome.result.success);

    if config.save_report {
        outcome.report.save_as_json(&config.report_filename)?;
        info!(path = %config.report_filename, "wrote report");
    }

    Ok(ExitCode::SUCCESS)
}

/// Splits the trailing arg list into file paths and `--key value` override
/// pairs. A leading `--` on an arg marks it (and the following arg) as an
/// override; everything else is treated as a file path.
fn split_args(args: &[String]) -> Result<(Vec<PathBuf>, Vec<(String, String)>)> {
    let mut files = Vec::new();
    let mut overrides = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if let Some(key) = arg.strip_prefix("--") {
            let Some(value) = args.get(i + 1) else {
                bail!("override '--{key}' is missing a value");
            };
            overrides.push((key.to_string(), value.clone()));
            i += 2;
        } else {
            files.push(PathBuf::from(arg));
            i += 1;
        }
    }
    Ok((files, overrides))
}
