//! Gate dependency DAG.
//!
//! Each gate touches one or two virtual qubits. Dependencies are built by a
//! single linear sweep over the gate list: for every qubit `Q` the most
//! recently seen gate touching `Q` becomes the parent of the next gate that
//! touches `Q`. This yields a DAG in which gates sharing a qubit are totally
//! ordered, with no quadratic pairwise scan.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};

/// One gate: a type tag and one or two virtual qubit targets.
///
/// `gate_type` is an opaque label (`"cx"`, `"h"`, `"unknown"`, ...); the
/// scheduler never interprets it beyond counting targets, since routing does
/// not depend on gate semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpec {
    #[serde(default = "default_gate_type")]
    pub gate_type: String,
    pub targets: Vec<i32>,
}

fn default_gate_type() -> String {
    "unknown".to_string()
}

/// A gate node in the dependency DAG: its static targets plus the edges
/// discovered during construction. `parent_count` and `children` never
/// change after [`Circuit::new`] returns; the scheduler tracks the dynamic
/// `remaining_parents`/`executed` state itself (the circuit is a read-only,
/// shared input).
#[derive(Debug, Clone)]
pub struct Gate {
    pub id: usize,
    pub gate_type: String,
    pub targets: Vec<i32>,
    pub parent_count: usize,
    pub children: Vec<usize>,
}

impl Gate {
    pub fn is_two_qubit(&self) -> bool {
        self.targets.len() == 2
    }
}

/// The gate DAG for one circuit.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub name: String,
    pub num_qubits: usize,
    pub gates: Vec<Gate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CircuitJson {
    circuit: CircuitJsonInner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CircuitJsonInner {
    #[serde(default = "default_circuit_name")]
    name: String,
    num_qubits: usize,
    gates: Vec<GateJson>,
}

fn default_circuit_name() -> String {
    "circuit".to_string()
}

/// A gate entry in circuit JSON: either a bare `[q1, q2]` pair (type
/// defaults to `"unknown"`) or an explicit `{"type": ..., "targets": [...]}`
/// object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GateJson {
    Bare(Vec<i32>),
    Typed(GateSpec),
}

impl From<GateJson> for GateSpec {
    fn from(value: GateJson) -> Self {
        match value {
            GateJson::Bare(targets) => GateSpec {
                gate_type: default_gate_type(),
                targets,
            },
            GateJson::Typed(spec) => spec,
        }
    }
}

impl Circuit {
    /// Builds the dependency DAG from an ordered list of gate specs via a
    /// single linear sweep keyed on each qubit's last-writer.
    pub fn new(name: impl Into<String>, num_qubits: usize, specs: Vec<GateSpec>) -> Result<Self> {
        let mut gates: Vec<Gate> = Vec::with_capacity(specs.len());
        let mut last_gate_on: Vec<Option<usize>> = vec![None; num_qubits];

        for (id, spec) in specs.into_iter().enumerate() {
            if spec.targets.is_empty() || spec.targets.len() > 2 {
                return Err(TsError::circuit(format!(
                    "gate {id} has {} targets, expected 1 or 2",
                    spec.targets.len()
                )));
            }
            for &q in &spec.targets {
                if q < 0 || q as usize >= num_qubits {
                    return Err(TsError::InvalidVirtualQubit(q, num_qubits));
                }
            }

            let mut parent_count = 0;
            for &q in &spec.targets {
                if let Some(parent) = last_gate_on[q as usize] {
                    gates[parent].children.push(id);
                    parent_count += 1;
                }
            }
            gates.push(Gate {
                id,
                gate_type: spec.gate_type,
                targets: spec.targets.clone(),
                parent_count,
                children: Vec::new(),
            });
            for &q in &spec.targets {
                last_gate_on[q as usize] = Some(id);
            }
        }

        Ok(Self {
            name: name.into(),
            num_qubits,
            gates,
        })
    }

    /// Parses the `"circuit"` key of a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: CircuitJson = serde_json::from_str(json)?;
        let inner = parsed.circuit;
        let specs: Vec<GateSpec> = inner.gates.into_iter().map(GateSpec::from).collect();
        Self::new(inner.name, inner.num_qubits, specs)
    }

    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }
}
