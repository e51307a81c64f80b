//! Lookahead energy evaluation.
//!
//! Scores a candidate op by applying it to a cloned layout, then walking the
//! sliced remaining circuit: layer 0 contributes `front_energy`, every layer
//! after it contributes `extended_energy`, up to `extended_set_size` gates
//! counted across all layers beyond the front. Safety-valve mode narrows the
//! walk to the first contributing gate and skips the front-size
//! normalization, biasing the search toward unsticking a single gate.

use ts_core::{Circuit, Config, Device, Layout};

use crate::candidate::CandidateOp;
use crate::contracted_router;
use crate::slicer;

#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyBreakdown {
    pub front_energy: f64,
    pub extended_energy: f64,
    pub usage_penalty: f64,
    pub energy: f64,
}

fn gate_cost(device: &Device, layout: &Layout, config: &Config, p1: i32, p2: i32) -> i64 {
    if device.phys_to_core[p1 as usize] == device.phys_to_core[p2 as usize] {
        2 * device.get_distance(p1, p2)
    } else {
        contracted_router::route(device, layout, config, p1, p2).distance
    }
}

/// Applies `op` to a clone of `layout` and returns the resulting layout
/// alongside whether the op's own gate (TELEGATE only) executed as a
/// side-effect.
fn apply_hypothetical(device: &Device, layout: &Layout, op: &CandidateOp) -> Layout {
    let mut next = layout.clone();
    match *op {
        CandidateOp::Swap { p1, p2, .. } => {
            let _ = next.apply_swap(device, p1, p2);
        }
        CandidateOp::Teledata { src, mediator, tgt } => {
            let _ = next.apply_teleport(device, src, mediator, tgt);
        }
        CandidateOp::Telegate { .. } => {
            // No data movement: the layout is unchanged by a TELEGATE.
        }
    }
    next
}

/// Evaluates `op`'s lookahead energy against the current scheduler state.
/// `usage_penalties` is indexed by physical qubit.
pub fn evaluate(
    device: &Device,
    layout: &Layout,
    config: &Config,
    circuit: &Circuit,
    remaining_parents: &[usize],
    executed: &[bool],
    front: &[usize],
    usage_penalties: &[f32],
    safety_valve: bool,
    op: &CandidateOp,
) -> EnergyBreakdown {
    let next_layout = apply_hypothetical(device, layout, op);

    let usage_penalty = op
        .touched_qubits()
        .iter()
        .map(|&p| usage_penalties[p as usize] as f64)
        .fold(1.0_f64, f64::max);

    let slices = slicer::slice_remaining(circuit, remaining_parents, executed, true);

    let mut front_energy = 0.0_f64;
    let mut extended_energy = 0.0_f64;
    let mut extended_counted = 0u32;

    'layers: for (layer_idx, layer) in slices.layers.iter().enumerate() {
        for &g in &layer.gate_ids {
            let gate = &circuit.gates[g];
            let (v1, v2) = (gate.targets[0], gate.targets[1]);
            let (p1, p2) = (next_layout.virt_to_phys[v1 as usize], next_layout.virt_to_phys[v2 as usize]);
            let cost = gate_cost(device, &next_layout, config, p1, p2) as f64;

            if layer_idx == 0 {
                front_energy += cost;
            } else {
                extended_energy += cost;
                extended_counted += 1;
            }

            if safety_valve {
                break 'layers;
            }
            if layer_idx > 0 && extended_counted >= config.extended_set_size {
                break 'layers;
            }
        }
    }

    let front_size = front.len().max(1) as f64;
    let front_term = if safety_valve { front_energy } else { front_energy / front_size };
    let extended_term = if config.extended_set_size > 0 {
        config.extended_set_factor as f64 * extended_energy / config.extended_set_size as f64
    } else {
        0.0
    };

    let energy = (front_term + extended_term) * usage_penalty;

    EnergyBreakdown {
        front_energy,
        extended_energy,
        usage_penalty,
        energy,
    }
}
