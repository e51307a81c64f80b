//! Candidate movement operations.
//!
//! An *attraction path* is the Dijkstra route between a front gate's two
//! physical endpoints through the contracted graph; candidates are read off
//! its interior. A SWAP, by contrast, is proposed directly from the device's
//! intra-core edges, independent of any specific path.

use ts_core::{Circuit, Config, Device, Layout};

use crate::contracted_router;

/// Diagnostic record of why a SWAP was proposed (telesabre.c's `reasons`
/// bitmask, carried as a plain flag struct -- no bitflags crate appears
/// anywhere in the corpus for a set this small).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapReasons {
    pub p1_busy: bool,
    pub p2_busy: bool,
    pub p1_in_front: bool,
    pub p2_in_front: bool,
    pub p1_needed_nearest_free: bool,
    pub p2_needed_nearest_free: bool,
}

/// A proposed movement or remote-gate operation, not yet scored or applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOp {
    Swap {
        p1: i32,
        p2: i32,
        reasons: SwapReasons,
    },
    Teledata {
        src: i32,
        mediator: i32,
        tgt: i32,
    },
    Telegate {
        a: i32,
        ma: i32,
        mb: i32,
        b: i32,
        front_gate: usize,
    },
}

impl CandidateOp {
    /// The physical qubits this op touches, for usage-penalty bumps and
    /// report serialization.
    pub fn touched_qubits(&self) -> Vec<i32> {
        match *self {
            CandidateOp::Swap { p1, p2, .. } => vec![p1, p2],
            CandidateOp::Teledata { src, mediator, tgt } => vec![src, mediator, tgt],
            CandidateOp::Telegate { a, ma, mb, b, .. } => vec![a, ma, mb, b],
        }
    }
}

/// One front gate's routed path between its two physical endpoints, with the
/// gate's id so candidates can be traced back to it.
#[derive(Debug, Clone)]
pub struct AttractionPath {
    pub front_gate: usize,
    pub phys_path: Vec<i32>,
}

/// Builds the attraction path for every front gate whose endpoints
/// currently sit in different cores.
pub fn attraction_paths(
    device: &Device,
    layout: &Layout,
    config: &Config,
    circuit: &Circuit,
    front: &[usize],
) -> Vec<AttractionPath> {
    let mut paths = Vec::new();
    for &g in front {
        let gate = &circuit.gates[g];
        if !gate.is_two_qubit() {
            continue;
        }
        let p1 = layout.virt_to_phys[gate.targets[0] as usize];
        let p2 = layout.virt_to_phys[gate.targets[1] as usize];
        if device.phys_to_core[p1 as usize] == device.phys_to_core[p2 as usize] {
            continue;
        }
        let routed = contracted_router::route(device, layout, config, p1, p2);
        if routed.is_unreachable() {
            continue;
        }
        paths.push(AttractionPath {
            front_gate: g,
            phys_path: routed.phys_path,
        });
    }
    paths
}

/// The set of physical qubits that should be kept free: every comm qubit
/// traversed by any attraction path contributes its own nearest-free qubit.
pub fn needed_free_qubits(device: &Device, layout: &Layout, paths: &[AttractionPath]) -> Vec<i32> {
    let mut seen_comm = std::collections::HashSet::new();
    let mut needed = Vec::new();
    for path in paths {
        for &p in &path.phys_path {
            if device.qubit_is_comm[p as usize] && seen_comm.insert(p) {
                if let Some(free) = layout.get_nearest_free_qubit(device, p) {
                    needed.push(free);
                }
            }
        }
    }
    needed
}

/// From a path of length `L`, emit TELEGATE when
/// `L==4` and the interior mediators are free comm qubits adjacent to their
/// respective endpoints, and TELEDATA from both path ends when `L>=3`.
pub fn teledata_telegate_candidates(device: &Device, layout: &Layout, path: &AttractionPath) -> Vec<CandidateOp> {
    let mut ops = Vec::new();
    let nodes = &path.phys_path;
    let l = nodes.len();
    if l < 3 {
        return ops;
    }

    if l == 4 {
        let (g1, m1, m2, g2) = (nodes[0], nodes[1], nodes[2], nodes[3]);
        if device.qubit_is_comm[m1 as usize]
            && device.qubit_is_comm[m2 as usize]
            && layout.is_free(m1)
            && layout.is_free(m2)
            && device.has_edge(g1, m1)
            && device.has_edge(m2, g2)
        {
            ops.push(CandidateOp::Telegate {
                a: g1,
                ma: m1,
                mb: m2,
                b: g2,
                front_gate: path.front_gate,
            });
        }
    }

    let try_teledata = |source: i32, mediator: i32, target: i32, ops: &mut Vec<CandidateOp>| {
        if device.has_edge(source, mediator)
            && device.qubit_is_comm[mediator as usize]
            && device.qubit_is_comm[target as usize]
            && layout.is_free(mediator)
            && layout.is_free(target)
            && layout.remaining_capacity[device.phys_to_core[target as usize] as usize] >= 2
        {
            ops.push(CandidateOp::Teledata { src: source, mediator, tgt: target });
        }
    };

    try_teledata(nodes[0], nodes[1], nodes[2], &mut ops);
    try_teledata(nodes[l - 1], nodes[l - 2], nodes[l - 3], &mut ops);

    ops
}

/// Per spec §4.6 step 7: a SWAP is proposed across an intra-core edge when
/// at least one endpoint is occupied and at least one endpoint is "needed"
/// (appears in the front, or is a qubit the nearest-free set wants kept
/// free).
pub fn swap_candidates(
    device: &Device,
    layout: &Layout,
    circuit: &Circuit,
    front: &[usize],
    needed_free: &[i32],
) -> Vec<CandidateOp> {
    let mut in_front_virt = vec![false; layout.num_virtual_qubits];
    for &g in front {
        for &q in &circuit.gates[g].targets {
            in_front_virt[q as usize] = true;
        }
    }
    let needed_free: std::collections::HashSet<i32> = needed_free.iter().copied().collect();

    let is_needed = |p: i32| -> (bool, bool, bool) {
        let free = layout.is_free(p);
        let in_front = !free && in_front_virt[layout.phys_to_virt[p as usize] as usize];
        let in_needed_free = free && needed_free.contains(&p);
        (in_front || in_needed_free, in_front, in_needed_free)
    };

    let mut ops = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for p1 in 0..device.num_qubits as i32 {
        for &p2 in device.neighbors(p1) {
            if device.phys_to_core[p1 as usize] != device.phys_to_core[p2 as usize] {
                continue;
            }
            let key = (p1.min(p2), p1.max(p2));
            if !seen.insert(key) {
                continue;
            }
            let free1 = layout.is_free(p1);
            let free2 = layout.is_free(p2);
            if free1 && free2 {
                continue;
            }
            let (p1_needed, p1_front, p1_nf) = is_needed(p1);
            let (p2_needed, p2_front, p2_nf) = is_needed(p2);
            if !(p1_needed || p2_needed) {
                continue;
            }
            ops.push(CandidateOp::Swap {
                p1,
                p2,
                reasons: SwapReasons {
                    p1_busy: !free1,
                    p2_busy: !free2,
                    p1_in_front: p1_front,
                    p2_in_front: p2_front,
                    p1_needed_nearest_free: p1_nf,
                    p2_needed_nearest_free: p2_nf,
                },
            });
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use ts_core::device::fixtures::{device_a, device_c};
    use ts_core::circuit::GateSpec;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(3)
    }

    #[test]
    fn attraction_path_skips_same_core_front_gates() {
        let d = device_a();
        let layout = Layout::round_robin(&d, 2, &mut rng()).unwrap();
        let c = Circuit::new("c", 2, vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 1] }]).unwrap();
        let paths = attraction_paths(&d, &layout, &Config::default(), &c, &[0]);
        assert!(paths.is_empty());
    }

    #[test]
    fn swap_candidates_are_proposed_on_every_intra_core_edge_touching_front() {
        let d = device_c();
        let layout = Layout::round_robin(&d, 4, &mut rng()).unwrap();
        let c = Circuit::new(
            "c",
            4,
            vec![GateSpec { gate_type: "cx".into(), targets: vec![0, 1] }],
        )
        .unwrap();
        let ops = swap_candidates(&d, &layout, &c, &[0], &[]);
        assert!(!ops.is_empty());
        for op in &ops {
            assert!(matches!(op, CandidateOp::Swap { .. }));
        }
    }

    #[test]
    fn teledata_requires_free_comm_mediator_and_target() {
        let d = device_c();
        let layout = Layout::round_robin(&d, 2, &mut rng()).unwrap();
        let path = AttractionPath { front_gate: 0, phys_path: vec![0, 1, 2, 3] };
        let ops = teledata_telegate_candidates(&d, &layout, &path);
        for op in &ops {
            if let CandidateOp::Teledata { mediator, tgt, .. } = op {
                assert!(layout.is_free(*mediator));
                assert!(layout.is_free(*tgt));
            }
        }
    }
}
