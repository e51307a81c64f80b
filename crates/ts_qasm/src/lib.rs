//! QASM-subset front end for the TeleSABRE routing scheduler.
//!
//! Parses the line-oriented register-declaration-and-gate-call subset
//! and lowers it straight into a `ts_core::Circuit`.

pub mod ast;
pub mod builder;
pub mod error;
pub mod parser;
pub mod preprocessor;

pub use builder::build_circuit;
pub use error::{QasmError, Result};
pub use parser::parse_qasm_str;
pub use preprocessor::resolve_includes;

use ts_core::Circuit;

/// Parses QASM-subset source directly into a circuit.
pub fn parse_qasm(source: &str) -> Result<Circuit> {
    let program = parse_qasm_str(source)?;
    build_circuit(&program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_qasm_builds_a_circuit_end_to_end() {
        let source = r#"
            OPENQASM 2.0;
            qreg q[2];
            creg c[2];
            h q[0];
            cx q[0], q[1];
            measure q[0] -> c[0];
        "#;

        let circuit = parse_qasm(source).unwrap();

        assert_eq!(circuit.num_qubits, 2);
        assert_eq!(circuit.gates.len(), 2);
        assert_eq!(circuit.gates[0].gate_type, "h");
        assert_eq!(circuit.gates[0].targets, vec![0]);
        assert_eq!(circuit.gates[1].gate_type, "cx");
        assert_eq!(circuit.gates[1].targets, vec![0, 1]);
    }
}
