//! Append-only structured trace of the scheduler's iterations (spec §6).
//!
//! The report sink itself has no logic beyond accumulation and JSON
//! serialization; the scheduler decides what each [`ReportEntry`] contains.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

/// One iteration's worth of scheduler state and decisions.
///
/// Mirrors the original's `report_entry_t`, which carries more fields than
/// spec §6's JSON sketch documents explicitly (`phys_to_virt`/`virt_to_phys`
/// per iteration, a single `applied_ops` entry rather than a list) -- kept
/// here in full since the sketch is a subset of the real per-iteration trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub iteration: u32,
    pub phys_to_virt: Vec<i32>,
    pub virt_to_phys: Vec<i32>,
    pub swap_count: u32,
    pub teleportation_count: u32,
    pub telegate_count: u32,
    /// Ids of gates not yet executed, in DAG order.
    pub remaining_nodes: Vec<usize>,
    /// Ids of the currently-ready (front) gates.
    pub front: Vec<usize>,
    /// Gate type tags, parallel to `front`.
    pub gates: Vec<String>,
    /// `(p1, p2)` physical qubits of every gate executed this iteration.
    pub applied_gates: Vec<(i32, i32)>,
    /// Qubits of the chosen candidate op, if any was applied.
    pub applied_ops: Vec<Vec<i32>>,
    /// One physical-qubit path per attraction path computed this iteration.
    pub needed_paths: Vec<Vec<i32>>,
    pub energy: f64,
    /// Qubits touched by each candidate considered this iteration.
    pub candidate_ops: Vec<Vec<i32>>,
    pub candidate_ops_scores: Vec<f64>,
    /// Front-energy component of each candidate's score (see spec §4.10
    /// and §9's note on the source's dead `evaluate_op_energy` path --
    /// these are populated from the one live energy computation rather
    /// than left as literal zeros).
    pub candidate_ops_front_scores: Vec<f64>,
    pub candidate_ops_future_scores: Vec<f64>,
    pub solving_deadlock: bool,
}

/// The full report: per-iteration trace plus verbatim echoes of the
/// config/device/circuit that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub config: Config,
    #[serde(default)]
    pub device: serde_json::Value,
    #[serde(default)]
    pub circuit: serde_json::Value,
    pub iterations: Vec<ReportEntry>,
}

impl Report {
    pub fn new(config: Config, device: serde_json::Value, circuit: serde_json::Value) -> Self {
        Self {
            config,
            device,
            circuit,
            iterations: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.iterations.push(entry);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    pub fn save_as_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(iteration: u32) -> ReportEntry {
        ReportEntry {
            iteration,
            phys_to_virt: vec![0, 1],
            virt_to_phys: vec![0, 1],
            swap_count: 0,
            teleportation_count: 0,
            telegate_count: 0,
            remaining_nodes: vec![],
            front: vec![],
            gates: vec![],
            applied_gates: vec![],
            applied_ops: vec![],
            needed_paths: vec![],
            energy: 0.0,
            candidate_ops: vec![],
            candidate_ops_scores: vec![],
            candidate_ops_front_scores: vec![],
            candidate_ops_future_scores: vec![],
            solving_deadlock: false,
        }
    }

    #[test]
    fn report_roundtrips_through_json() {
        let mut report = Report::new(Config::default(), serde_json::json!({}), serde_json::json!({}));
        report.push(entry(0));
        report.push(entry(1));
        let json = report.to_json().unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.iterations.len(), 2);
        assert_eq!(parsed.iterations[1].iteration, 1);
    }

    #[test]
    fn save_as_json_writes_a_file() {
        let mut report = Report::new(Config::default(), serde_json::json!({}), serde_json::json!({}));
        report.push(entry(0));
        let path = std::env::temp_dir().join("ts_report_test.json");
        report.save_as_json(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"iterations\""));
        let _ = std::fs::remove_file(&path);
    }
}
