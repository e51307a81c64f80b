//! Command-line front end for the TeleSABRE routing scheduler.
//!
//! Loads a device, config, and circuit from the files named on the command
//! line, runs the retry-best-of-N scheduling harness, prints the result,
//! and optionally writes a per-iteration report.

pub mod input;
pub mod pipeline;

pub use input::Inputs;
pub use pipeline::{run_with_retries, RunOutcome};
