//! The TeleSABRE scheduler loop.
//!
//! `Scheduler` owns the only mutable state of a run: the layout, the DAG's
//! dynamic `remaining_parents`/`executed` bookkeeping, the front set, usage
//! penalties, the safety valve, and the report. The device and circuit are
//! read-only inputs borrowed for the scheduler's lifetime.

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use ts_core::{Circuit, Config, Device, Layout, Report, ReportEntry, Result, TsError};

use crate::candidate::{self, CandidateOp};
use crate::energy;
use crate::slicer;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct SchedulerResult {
    pub success: bool,
    pub iterations: u32,
    pub num_swaps: u32,
    pub num_teledata: u32,
    pub num_telegate: u32,
    pub num_deadlocks: u32,
}

impl SchedulerResult {
    /// The figure of merit the CLI's retry-best-of-N harness ranks by
    /// that the CLI's retry-best-of-N harness ranks by: fewer inter-core
    /// operations is better.
    pub fn inter_core_op_total(&self) -> u32 {
        self.num_teledata + self.num_telegate
    }
}

pub struct Scheduler<'a> {
    device: &'a Device,
    circuit: &'a Circuit,
    config: &'a Config,

    layout: Layout,
    remaining_parents: Vec<usize>,
    executed: Vec<bool>,
    front: Vec<usize>,

    usage_penalties: Vec<f32>,
    usage_reset_countdown: u32,

    iterations_without_progress: u32,
    safety_valve: bool,
    last_progress_layout: Layout,
    num_deadlocks: u32,

    num_swaps: u32,
    num_teledata: u32,
    num_telegate: u32,

    pub report: Report,
}

impl<'a> Scheduler<'a> {
    pub fn new(device: &'a Device, circuit: &'a Circuit, config: &'a Config, layout: Layout) -> Self {
        let remaining_parents: Vec<usize> = circuit.gates.iter().map(|g| g.parent_count).collect();
        let executed = vec![false; circuit.gates.len()];
        let front: Vec<usize> = (0..circuit.gates.len()).filter(|&g| remaining_parents[g] == 0).collect();
        let usage_penalties = vec![1.0f32; device.num_qubits];

        let device_json = serde_json::json!({});
        let circuit_json = serde_json::json!({});

        Self {
            device,
            circuit,
            config,
            last_progress_layout: layout.clone(),
            layout,
            remaining_parents,
            executed,
            front,
            usage_penalties,
            usage_reset_countdown: config.usage_penalties_reset_interval,
            iterations_without_progress: 0,
            safety_valve: false,
            num_deadlocks: 0,
            num_swaps: 0,
            num_teledata: 0,
            num_telegate: 0,
            report: Report::new(config.clone(), device_json, circuit_json),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Runs the scheduler to completion: either the front empties
    /// (`success = true`) or `max_iterations` is reached (`success = false`).
    pub fn run(&mut self, rng: &mut impl Rng) -> Result<SchedulerResult> {
        let mut iteration = 0u32;
        loop {
            if self.front.is_empty() {
                info!(iteration, "front empty, scheduling succeeded");
                return Ok(self.result(true, iteration));
            }
            if iteration >= self.config.max_iterations {
                info!(iteration, "iteration cap reached, scheduling failed");
                return Ok(self.result(false, iteration));
            }

            self.step(iteration, rng)?;
            iteration += 1;
        }
    }

    fn step(&mut self, iteration: u32, rng: &mut impl Rng) -> Result<()> {
        let mut solving_deadlock = self.safety_valve;
        let mut made_progress = false;

        // 1. Safety-valve check.
        if !self.safety_valve && self.iterations_without_progress > self.config.safety_valve_iters {
            info!(iteration, "safety valve activated");
            self.safety_valve = true;
            self.layout = self.last_progress_layout.clone();
            self.num_deadlocks += 1;
            solving_deadlock = true;
        }

        // 2. Execute front gates whose endpoints already coincide.
        let mut applied_gates = Vec::new();
        loop {
            let ready = self.front.iter().copied().find(|&g| self.gate_is_colocated(g));
            let Some(g) = ready else { break };
            let gate = &self.circuit.gates[g];
            let (p1, p2) = self.gate_phys_endpoints(g);
            applied_gates.push((p1, p2));
            trace!(iteration, gate = g, "executing front gate");
            self.executed[g] = true;
            self.front.retain(|&x| x != g);
            for &child in &gate.children.clone() {
                self.remaining_parents[child] -= 1;
                if self.remaining_parents[child] == 0 {
                    self.front.push(child);
                }
            }
            made_progress = true;
        }

        if made_progress {
            self.iterations_without_progress = 0;
            self.safety_valve = false;
            self.last_progress_layout = self.layout.clone();
        }

        // 3-7. Build candidates from attraction paths and swaps.
        let paths = candidate::attraction_paths(self.device, &self.layout, self.config, self.circuit, &self.front);
        let needed_free = candidate::needed_free_qubits(self.device, &self.layout, &paths);

        let mut ops: Vec<CandidateOp> = Vec::new();
        for path in &paths {
            ops.extend(candidate::teledata_telegate_candidates(self.device, &self.layout, path));
        }
        ops.extend(candidate::swap_candidates(
            self.device,
            &self.layout,
            self.circuit,
            &self.front,
            &needed_free,
        ));

        // 8. Score each candidate. Each evaluation only reads the current
        // layout/device/circuit and clones the layout internally (spec §5),
        // so candidates are scored concurrently; selection below stays
        // sequential.
        let breakdowns: Vec<energy::EnergyBreakdown> = ops
            .par_iter()
            .map(|op| {
                energy::evaluate(
                    self.device,
                    &self.layout,
                    self.config,
                    self.circuit,
                    &self.remaining_parents,
                    &self.executed,
                    &self.front,
                    &self.usage_penalties,
                    self.safety_valve,
                    op,
                )
            })
            .collect();

        let mut scores = Vec::with_capacity(ops.len());
        let mut front_scores = Vec::with_capacity(ops.len());
        let mut future_scores = Vec::with_capacity(ops.len());
        for (op, breakdown) in ops.iter().zip(&breakdowns) {
            let mut score = breakdown.energy;
            score -= match op {
                CandidateOp::Teledata { .. } => self.config.teleport_bonus as f64,
                CandidateOp::Telegate { .. } => self.config.telegate_bonus as f64,
                CandidateOp::Swap { .. } => 0.0,
            };
            scores.push(score);
            front_scores.push(breakdown.front_energy);
            future_scores.push(breakdown.extended_energy);
        }

        // 9. Select and apply the minimum-score candidate, uniformly among ties.
        let mut applied_op: Option<Vec<i32>> = None;
        let mut energy_value = 0.0;
        if !ops.is_empty() {
            let min_score = scores.iter().cloned().fold(f64::INFINITY, f64::min);
            let candidates: Vec<usize> = (0..ops.len()).filter(|&i| scores[i] == min_score).collect();
            let chosen = candidates[rng.gen_range(0..candidates.len())];
            energy_value = scores[chosen];
            let op = ops[chosen];
            applied_op = Some(op.touched_qubits());
            let gates_before = applied_gates.len();
            self.apply(op, &mut applied_gates)?;
            if applied_gates.len() > gates_before {
                // A TELEGATE executed its front gate as a side effect: this
                // is progress, same as step 2's front-gate execution.
                self.iterations_without_progress = 0;
                self.safety_valve = false;
                self.last_progress_layout = self.layout.clone();
            }
            for p in op.touched_qubits() {
                self.usage_penalties[p as usize] += self.config.usage_penalty;
            }
            debug!(iteration, ?op, score = energy_value, "applied candidate");
        }

        if !applied_gates.is_empty() {
            made_progress = true;
        }

        // 10. Usage-penalty decay.
        if self.usage_reset_countdown == 0 {
            self.usage_penalties.iter_mut().for_each(|p| *p = 1.0);
            self.usage_reset_countdown = self.config.usage_penalties_reset_interval;
        } else {
            self.usage_reset_countdown -= 1;
        }

        // 11. Report entry.
        let remaining_nodes: Vec<usize> = (0..self.circuit.gates.len()).filter(|&g| !self.executed[g]).collect();
        let entry = ReportEntry {
            iteration,
            phys_to_virt: self.layout.phys_to_virt.clone(),
            virt_to_phys: self.layout.virt_to_phys.clone(),
            swap_count: self.num_swaps,
            teleportation_count: self.num_teledata,
            telegate_count: self.num_telegate,
            remaining_nodes,
            front: self.front.clone(),
            gates: self.front.iter().map(|&g| self.circuit.gates[g].gate_type.clone()).collect(),
            applied_gates,
            applied_ops: applied_op.into_iter().collect(),
            needed_paths: paths.iter().map(|p| p.phys_path.clone()).collect(),
            energy: energy_value,
            candidate_ops: ops.iter().map(|op| op.touched_qubits()).collect(),
            candidate_ops_scores: scores,
            candidate_ops_front_scores: front_scores,
            candidate_ops_future_scores: future_scores,
            solving_deadlock,
        };
        self.report.push(entry);

        // 12. Advance iteration-without-progress counter.
        if made_progress {
            self.iterations_without_progress = 0;
        } else {
            self.iterations_without_progress += 1;
        }

        Ok(())
    }

    fn gate_is_colocated(&self, g: usize) -> bool {
        let gate = &self.circuit.gates[g];
        if gate.targets.len() == 1 {
            return true;
        }
        let (p1, p2) = self.gate_phys_endpoints(g);
        self.device.get_distance(p1, p2) == 1
    }

    fn gate_phys_endpoints(&self, g: usize) -> (i32, i32) {
        let gate = &self.circuit.gates[g];
        let p1 = self.layout.virt_to_phys[gate.targets[0] as usize];
        let p2 = if gate.targets.len() == 2 {
            self.layout.virt_to_phys[gate.targets[1] as usize]
        } else {
            p1
        };
        (p1, p2)
    }

    fn apply(&mut self, op: CandidateOp, applied_gates: &mut Vec<(i32, i32)>) -> Result<()> {
        match op {
            CandidateOp::Swap { p1, p2, .. } => {
                self.layout.apply_swap(self.device, p1, p2)?;
                self.num_swaps += 1;
            }
            CandidateOp::Teledata { src, mediator, tgt } => {
                self.layout.apply_teleport(self.device, src, mediator, tgt)?;
                self.num_teledata += 1;
            }
            CandidateOp::Telegate { front_gate, a, b, .. } => {
                self.num_telegate += 1;
                let gate = &self.circuit.gates[front_gate];
                if gate.targets.len() != 2 {
                    return Err(TsError::layout("telegate candidate referenced a non-two-qubit gate"));
                }
                applied_gates.push((a, b));
                self.executed[front_gate] = true;
                self.front.retain(|&x| x != front_gate);
                for &child in &gate.children.clone() {
                    self.remaining_parents[child] -= 1;
                    if self.remaining_parents[child] == 0 {
                        self.front.push(child);
                    }
                }
            }
        }
        Ok(())
    }

    fn result(&self, success: bool, iterations: u32) -> SchedulerResult {
        SchedulerResult {
            success,
            iterations,
            num_swaps: self.num_swaps,
            num_teledata: self.num_teledata,
            num_telegate: self.num_telegate,
            num_deadlocks: self.num_deadlocks,
        }
    }
}

/// Convenience wrapper used when the caller doesn't need per-layer slicing
/// outside of scoring (kept for symmetry with [`slicer::slice_remaining`],
/// exercised directly in this module's tests).
#[cfg(test)]
fn slice_of(circuit: &Circuit, scheduler: &Scheduler) -> slicer::Slices {
    slicer::slice_remaining(circuit, &scheduler.remaining_parents, &scheduler.executed, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use ts_core::circuit::GateSpec;
    use ts_core::device::fixtures::{device_a, device_b, device_c};

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(11)
    }

    #[test]
    fn s1_trivial_gate_executes_with_no_ops() {
        let d = device_a();
        let c = Circuit::new("c", 2, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 1] }]).unwrap();
        let config = Config::default();
        let layout = Layout::round_robin(&d, 2, &mut rng()).unwrap();
        let mut scheduler = Scheduler::new(&d, &c, &config, layout);
        let result = scheduler.run(&mut rng()).unwrap();
        assert!(result.success);
        assert_eq!(result.num_swaps, 0);
        assert_eq!(result.num_teledata, 0);
        assert_eq!(result.num_telegate, 0);
    }

    #[test]
    fn s2_needs_exactly_one_swap() {
        let d = device_b();
        let c = Circuit::new("c", 3, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 2] }]).unwrap();
        let mut config = Config::default();
        config.max_iterations = 1000;
        let mut seed_rng = rand::rngs::StdRng::seed_from_u64(1);
        let layout = Layout::round_robin(&d, 3, &mut seed_rng).unwrap();

        assert_eq!(layout.virt_to_phys, vec![0, 1, 2]);

        let mut scheduler = Scheduler::new(&d, &c, &config, layout);
        let result = scheduler.run(&mut seed_rng).unwrap();
        assert!(result.success);
        assert_eq!(result.num_swaps, 1);
    }

    #[test]
    fn s3_cross_core_gate_uses_teledata_or_telegate() {
        let d = device_c();
        let c = Circuit::new("c", 4, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 3] }]).unwrap();
        let mut config = Config::default();
        config.max_iterations = 2000;
        let mut seed_rng = rand::rngs::StdRng::seed_from_u64(5);
        let layout = Layout::round_robin(&d, 4, &mut seed_rng).unwrap();
        let mut scheduler = Scheduler::new(&d, &c, &config, layout);
        let result = scheduler.run(&mut seed_rng).unwrap();
        assert!(result.success);
        assert!(result.inter_core_op_total() >= 1);
    }

    #[test]
    fn s6_same_seed_is_deterministic() {
        let d = device_c();
        let c = Circuit::new("c", 4, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 3] }]).unwrap();
        let mut config = Config::default();
        config.max_iterations = 2000;

        let run_once = || {
            let mut seed_rng = rand::rngs::StdRng::seed_from_u64(123);
            let layout = Layout::round_robin(&d, 4, &mut seed_rng).unwrap();
            let mut scheduler = Scheduler::new(&d, &c, &config, layout);
            let result = scheduler.run(&mut seed_rng).unwrap();
            (result.num_swaps, result.num_teledata, result.num_telegate, result.success)
        };

        assert_eq!(run_once(), run_once());
    }

    #[test]
    fn slicer_view_never_duplicates_a_gate() {
        let d = device_a();
        let c = Circuit::new(
            "c",
            2,
            vec![
                GateSpec { gate_type: "cx".into(), targets: vec![0, 1] },
                GateSpec { gate_type: "cx".into(), targets: vec![0, 1] },
            ],
        )
        .unwrap();
        let config = Config::default();
        let layout = Layout::round_robin(&d, 2, &mut rng()).unwrap();
        let scheduler = Scheduler::new(&d, &c, &config, layout);
        let slices = slice_of(&c, &scheduler);
        let count: usize = slices.layers.iter().map(|l| l.gate_ids.len()).sum();
        assert!(count <= 2);
    }
}
