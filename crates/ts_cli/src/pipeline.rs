//! Retry-best-of-N scheduling harness (spec §7).
//!
//! Runs the scheduler up to `config.max_attempts` times, incrementing the
//! seed each time, and keeps the best successful result by inter-core op
//! count. Stops early once `config.required_successes` attempts have
//! succeeded.

use rand::SeedableRng;
use tracing::{info, warn};

use ts_core::{Circuit, Config, Device, Layout, Report};
use ts_scheduler::{Scheduler, SchedulerResult};

/// The chosen attempt's outcome, plus the report that produced it.
pub struct RunOutcome {
    pub result: SchedulerResult,
    pub report: Report,
    pub attempts: u32,
}

/// Runs the retry harness to completion.
///
/// Keeps the best successful attempt by [`SchedulerResult::inter_core_op_total`].
/// If every attempt fails, falls back to the last attempt's (unsuccessful)
/// result rather than a sentinel, so the caller always sees what actually
/// happened.
pub fn run_with_retries(device: &Device, circuit: &Circuit, config: &Config) -> anyhow::Result<RunOutcome> {
    let mut attempt_config = config.clone();
    let max_iterations = config.max_iterations;

    let mut best: Option<(SchedulerResult, Report)> = None;
    let mut last: Option<(SchedulerResult, Report)> = None;
    let mut successes = 0u32;
    let mut attempts = 0u32;

    while attempts < config.max_attempts && successes < config.required_successes {
        attempt_config.max_iterations = max_iterations;
        attempts += 1;

        let mut rng = rand::rngs::StdRng::seed_from_u64(attempt_config.seed);
        let layout = Layout::initial(
            attempt_config.initial_layout_type,
            device,
            circuit,
            circuit.num_qubits,
            attempt_config.init_layout_hun_min_free_gate,
            attempt_config.init_layout_hun_min_free_qubit,
            &mut rng,
        )?;

        let mut scheduler = Scheduler::new(device, circuit, &attempt_config, layout);
        let result = scheduler.run(&mut rng)?;
        info!(attempt = attempts, success = result.success, "scheduler attempt finished");

        if result.success {
            successes += 1;
            let better = match &best {
                None => true,
                Some((best_result, _)) => result.inter_core_op_total() < best_result.inter_core_op_total(),
            };
            if better {
                best = Some((result.clone(), scheduler.report.clone()));
            }
        } else if attempts < config.max_attempts {
            warn!(attempt = attempts, "scheduler attempt failed, retrying with a new seed");
        }

        last = Some((result, scheduler.report));
        attempt_config.seed += 1;
    }

    let (result, report) = best.or(last).expect("at least one attempt always runs");
    Ok(RunOutcome { result, report, attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::circuit::GateSpec;
    use ts_core::device::fixtures::{device_a, device_c};

    #[test]
    fn single_successful_attempt_stops_the_loop() {
        let d = device_a();
        let c = Circuit::new("c", 2, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 1] }]).unwrap();
        let mut config = Config::default();
        config.max_attempts = 5;
        config.required_successes = 1;

        let outcome = run_with_retries(&d, &c, &config).unwrap();
        assert!(outcome.result.success);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn keeps_running_until_required_successes_reached() {
        let d = device_c();
        let c = Circuit::new("c", 4, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 3] }]).unwrap();
        let mut config = Config::default();
        config.max_iterations = 2000;
        config.max_attempts = 3;
        config.required_successes = 3;

        let outcome = run_with_retries(&d, &c, &config).unwrap();
        assert!(outcome.result.success);
        assert_eq!(outcome.attempts, 3);
    }

    #[test]
    fn original_config_seed_is_left_untouched() {
        let d = device_c();
        let c = Circuit::new("c", 4, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 3] }]).unwrap();
        let mut config = Config::default();
        config.max_iterations = 2000;
        config.max_attempts = 2;
        config.required_successes = 2;
        let seed_before = config.seed;

        let outcome = run_with_retries(&d, &c, &config).unwrap();
        assert_eq!(outcome.attempts, 2);
        assert_eq!(config.seed, seed_before);
    }
}
