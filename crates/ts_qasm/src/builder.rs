//! Lowers a parsed [`Program`](crate::ast::Program) into a `ts_core::Circuit`.
//!
//! Qubit registers are assigned sequential global indices in declaration
//! order, matching `circuit_from_qasm`'s offset accumulation.

use std::collections::HashMap;

use ts_core::circuit::GateSpec;
use ts_core::Circuit;

use crate::ast::{Program, QubitRef, Statement};
use crate::error::{QasmError, Result};

pub fn build_circuit(program: &Program) -> Result<Circuit> {
    let mut offsets: HashMap<String, usize> = HashMap::new();
    let mut total_qubits = 0usize;
    for stmt in &program.statements {
        if let Statement::QReg { name, size } = stmt {
            if offsets.contains_key(name) {
                return Err(QasmError::BuildError(format!("duplicate qreg '{name}'")));
            }
            offsets.insert(name.clone(), total_qubits);
            total_qubits += size;
        }
    }
    if total_qubits == 0 {
        return Err(QasmError::BuildError("no quantum registers declared".to_string()));
    }

    let mut specs = Vec::new();
    for stmt in &program.statements {
        if let Statement::Gate { gate_type, refs } = stmt {
            if refs.is_empty() || refs.len() > 2 {
                return Err(QasmError::BuildError(format!(
                    "gate '{gate_type}' has {} targets, expected 1 or 2",
                    refs.len()
                )));
            }
            let targets = refs
                .iter()
                .map(|r| resolve_qubit(&offsets, r))
                .collect::<Result<Vec<i32>>>()?;
            specs.push(GateSpec { gate_type: gate_type.clone(), targets });
        }
    }

    Circuit::new("qasm", total_qubits, specs).map_err(QasmError::from)
}

fn resolve_qubit(offsets: &HashMap<String, usize>, r: &QubitRef) -> Result<i32> {
    let offset = *offsets
        .get(&r.register)
        .ok_or_else(|| QasmError::BuildError(format!("undefined qreg '{}'", r.register)))?;
    Ok((offset + r.index) as i32)
}
