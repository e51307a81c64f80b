//! Remaining-circuit slicer.
//!
//! Greedily layers the not-yet-executed two-qubit gates of the DAG: layer
//! `t` holds gates touching pairwise-disjoint qubits, and a gate lands in
//! the earliest layer after the last layer any of its qubits already
//! appears in. Single-qubit gates contribute nothing to a layer -- they are
//! walked through and marked executed inline, so the slice is a compact
//! lookahead tape the energy evaluator can scan without re-deriving
//! readiness from the live front.

use ts_core::Circuit;

/// One layer of the sliced remaining circuit: gate ids touching
/// pairwise-disjoint qubits.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub gate_ids: Vec<usize>,
}

/// CSR-style layering of the remaining two-qubit-or-more gates.
#[derive(Debug, Clone, Default)]
pub struct Slices {
    pub layers: Vec<Layer>,
}

impl Slices {
    pub fn num_gates(&self) -> usize {
        self.layers.iter().map(|l| l.gate_ids.len()).sum()
    }

    pub fn iter_gates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(t, layer)| layer.gate_ids.iter().map(move |&g| (t, g)))
    }
}

/// Builds the sliced remaining-circuit view via a Kahn-style BFS over
/// `remaining_parents`/`executed`. Single-qubit gates are walked through
/// (marked executed, their unique child's remaining-parents decremented)
/// rather than placed in a layer; a gate restricted by `two_qubit_only`
/// ends up in the earliest layer after the last layer any of its qubits
/// has already appeared in. Empty layers are skipped.
///
/// `remaining_parents` and `executed` are read-only here: the caller (the
/// scheduler) owns and mutates that dynamic state; this function operates
/// on a private copy so repeated calls during one iteration don't disturb
/// the live front bookkeeping.
pub fn slice_remaining(
    circuit: &Circuit,
    remaining_parents: &[usize],
    executed: &[bool],
    two_qubit_only: bool,
) -> Slices {
    let mut remaining_parents = remaining_parents.to_vec();
    let mut executed = executed.to_vec();

    let mut queue: std::collections::VecDeque<usize> = (0..circuit.gates.len())
        .filter(|&g| !executed[g] && remaining_parents[g] == 0)
        .collect();

    let mut last_layer_of_qubit: Vec<i64> = vec![-1; circuit.num_qubits];
    let mut layers: Vec<Layer> = Vec::new();

    while let Some(g) = queue.pop_front() {
        if executed[g] {
            continue;
        }
        let gate = &circuit.gates[g];
        let is_two_qubit = gate.is_two_qubit();

        if two_qubit_only && !is_two_qubit {
            // Single-qubit gates contribute nothing to the slice: walk
            // through them immediately.
            executed[g] = true;
            for &child in &gate.children {
                remaining_parents[child] -= 1;
                if remaining_parents[child] == 0 && !executed[child] {
                    queue.push_back(child);
                }
            }
            continue;
        }

        let layer_idx = gate
            .targets
            .iter()
            .map(|&q| last_layer_of_qubit[q as usize])
            .max()
            .unwrap_or(-1)
            + 1;
        let layer_idx = layer_idx as usize;
        if layers.len() <= layer_idx {
            layers.resize(layer_idx + 1, Layer::default());
        }
        layers[layer_idx].gate_ids.push(g);
        for &q in &gate.targets {
            last_layer_of_qubit[q as usize] = layer_idx as i64;
        }

        executed[g] = true;
        for &child in &gate.children {
            remaining_parents[child] -= 1;
            if remaining_parents[child] == 0 && !executed[child] {
                queue.push_back(child);
            }
        }
    }

    layers.retain(|l| !l.gate_ids.is_empty());
    Slices { layers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::circuit::GateSpec;

    fn spec(targets: &[i32]) -> GateSpec {
        GateSpec {
            gate_type: "cx".to_string(),
            targets: targets.to_vec(),
        }
    }

    fn all_ready(circuit: &Circuit) -> (Vec<usize>, Vec<bool>) {
        let remaining = circuit.gates.iter().map(|g| g.parent_count).collect();
        let executed = vec![false; circuit.gates.len()];
        (remaining, executed)
    }

    #[test]
    fn disjoint_gates_land_in_one_layer() {
        let c = Circuit::new("c", 4, vec![spec(&[0, 1]), spec(&[2, 3])]).unwrap();
        let (remaining, executed) = all_ready(&c);
        let slices = slice_remaining(&c, &remaining, &executed, true);
        assert_eq!(slices.layers.len(), 1);
        assert_eq!(slices.layers[0].gate_ids.len(), 2);
    }

    #[test]
    fn dependent_gates_land_in_separate_layers() {
        let c = Circuit::new("c", 2, vec![spec(&[0, 1]), spec(&[0, 1])]).unwrap();
        let (remaining, executed) = all_ready(&c);
        let slices = slice_remaining(&c, &remaining, &executed, true);
        assert_eq!(slices.layers.len(), 2);
        assert_eq!(slices.layers[0].gate_ids, vec![0]);
        assert_eq!(slices.layers[1].gate_ids, vec![1]);
    }

    #[test]
    fn single_qubit_gates_are_skipped_when_filtered() {
        let c = Circuit::new(
            "c",
            2,
            vec![
                GateSpec {
                    gate_type: "h".to_string(),
                    targets: vec![0],
                },
                spec(&[0, 1]),
            ],
        )
        .unwrap();
        let (remaining, executed) = all_ready(&c);
        let slices = slice_remaining(&c, &remaining, &executed, true);
        assert_eq!(slices.num_gates(), 1);
        assert_eq!(slices.layers[0].gate_ids, vec![1]);
    }

    #[test]
    fn every_remaining_multi_qubit_gate_appears_exactly_once() {
        let c = Circuit::new(
            "c",
            6,
            vec![
                spec(&[0, 1]),
                spec(&[2, 3]),
                spec(&[0, 2]),
                spec(&[4, 5]),
            ],
        )
        .unwrap();
        let (remaining, executed) = all_ready(&c);
        let slices = slice_remaining(&c, &remaining, &executed, true);
        let mut seen: Vec<usize> = slices.iter_gates().map(|(_, g)| g).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
