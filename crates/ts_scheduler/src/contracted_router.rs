//! Per-gate contracted routing graph.
//!
//! For a front gate whose two virtual endpoints sit in different cores, the
//! nodes of the reduced graph are every communication qubit of the device
//! plus (at most) two extra nodes for the gate's own endpoints, when an
//! endpoint isn't itself a comm qubit. Edge weights fold in intra-core
//! distance, a penalty for routing through a qubit that coincides with a
//! gate endpoint, the nearest-free-qubit distance, and a full-core penalty.
//! The `2x` factor throughout reflects the round-trip cost of EPR-pair
//! distribution.

use ts_core::{Config, Device, Graph, Layout};

/// A routed attraction path: the physical qubits Dijkstra's path visits,
/// translated back from contracted-graph node ids, and the total distance.
#[derive(Debug, Clone, Default)]
pub struct RoutedPath {
    pub phys_path: Vec<i32>,
    pub distance: i64,
}

impl RoutedPath {
    pub fn is_unreachable(&self) -> bool {
        self.phys_path.is_empty()
    }
}

struct ContractedGraph {
    graph: Graph,
    node_a: usize,
    node_b: usize,
    node_to_phys: Vec<i32>,
}

fn full_core_penalty(layout: &Layout, config: &Config, core: i32) -> i64 {
    if layout.remaining_capacity[core as usize] <= 2 {
        config.full_core_penalty as i64
    } else {
        0
    }
}

fn endpoint_bonus(phys_a: i32, phys_b: i32, pc: i32) -> i64 {
    (pc == phys_a) as i64 + (pc == phys_b) as i64
}

/// Sums edge-weight terms with saturation: a full core makes
/// [`Layout::nearest_free_penalty`] return `heap::INF`, and two such INF
/// terms on one edge (e.g. both endpoints of an inter-core link sitting in
/// fully-packed cores) would otherwise overflow `i64` before Dijkstra ever
/// runs. Saturating keeps the edge merely "very expensive" instead of a
/// panic (debug) or wrapped negative weight (release).
fn saturating_sum(terms: &[i64]) -> i64 {
    terms.iter().fold(0i64, |acc, &t| acc.saturating_add(t))
}

fn build(device: &Device, layout: &Layout, config: &Config, phys_a: i32, phys_b: i32) -> ContractedGraph {
    let mut node_to_phys = device.comm_qubits.clone();
    let a_is_comm = device.qubit_is_comm[phys_a as usize];
    let b_is_comm = device.qubit_is_comm[phys_b as usize];

    let node_a = if a_is_comm {
        device.comm_qubit_node_id[phys_a as usize] as usize
    } else {
        node_to_phys.push(phys_a);
        node_to_phys.len() - 1
    };
    let node_b = if b_is_comm {
        device.comm_qubit_node_id[phys_b as usize] as usize
    } else {
        node_to_phys.push(phys_b);
        node_to_phys.len() - 1
    };

    let mut graph = Graph::new(node_to_phys.len());
    let nf_penalty = |pc: i32| layout.nearest_free_penalty(device, pc);

    for core in 0..device.num_cores {
        let comms = &device.core_comm_qubits[core];
        for i in 0..comms.len() {
            for j in (i + 1)..comms.len() {
                let (pc1, pc2) = (comms[i], comms[j]);
                let weight = saturating_sum(&[
                    2i64.saturating_mul(device.get_distance(pc1, pc2)),
                    endpoint_bonus(phys_a, phys_b, pc1),
                    endpoint_bonus(phys_a, phys_b, pc2),
                    nf_penalty(pc1),
                    nf_penalty(pc2),
                    full_core_penalty(layout, config, core as i32),
                ]);
                let n1 = device.comm_qubit_node_id[pc1 as usize] as usize;
                let n2 = device.comm_qubit_node_id[pc2 as usize] as usize;
                graph.add_edge(n1, n2, weight);
            }
        }
    }

    for &(pc1, pc2) in &device.inter_core_edges {
        let weight = saturating_sum(&[
            2i64.saturating_mul(config.inter_core_edge_weight as i64),
            endpoint_bonus(phys_a, phys_b, pc1),
            endpoint_bonus(phys_a, phys_b, pc2),
            nf_penalty(pc1),
            nf_penalty(pc2),
            full_core_penalty(layout, config, device.phys_to_core[pc1 as usize]),
            full_core_penalty(layout, config, device.phys_to_core[pc2 as usize]),
        ]);
        let n1 = device.comm_qubit_node_id[pc1 as usize] as usize;
        let n2 = device.comm_qubit_node_id[pc2 as usize] as usize;
        graph.add_edge(n1, n2, weight);
    }

    if !a_is_comm {
        let core = device.phys_to_core[phys_a as usize];
        for &pc in &device.core_comm_qubits[core as usize] {
            let weight = saturating_sum(&[
                2i64.saturating_mul((device.get_distance(phys_a, pc) - 1).abs()),
                nf_penalty(pc),
                full_core_penalty(layout, config, core),
            ]);
            let n = device.comm_qubit_node_id[pc as usize] as usize;
            graph.add_directed_edge(node_a, n, weight);
        }
    }
    if !b_is_comm {
        let core = device.phys_to_core[phys_b as usize];
        for &pc in &device.core_comm_qubits[core as usize] {
            let weight = saturating_sum(&[
                2i64.saturating_mul((device.get_distance(pc, phys_b) - 1).abs()),
                nf_penalty(pc),
                full_core_penalty(layout, config, core),
            ]);
            let n = device.comm_qubit_node_id[pc as usize] as usize;
            graph.add_directed_edge(n, node_b, weight);
        }
    }

    ContractedGraph {
        graph,
        node_a,
        node_b,
        node_to_phys,
    }
}

/// Builds the contracted graph for the gate `(phys_a, phys_b)` and runs
/// Dijkstra from `phys_a`'s node to `phys_b`'s node, translating the result
/// back into physical qubit ids.
pub fn route(device: &Device, layout: &Layout, config: &Config, phys_a: i32, phys_b: i32) -> RoutedPath {
    let cg = build(device, layout, config, phys_a, phys_b);
    let path = cg.graph.dijkstra(cg.node_a, cg.node_b);
    if path.is_unreachable() {
        return RoutedPath::default();
    }
    RoutedPath {
        phys_path: path.nodes.iter().map(|&n| cg.node_to_phys[n]).collect(),
        distance: path.distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::device::fixtures::device_c;
    use rand::SeedableRng;

    fn layout_for(device: &Device, num_virtual: usize) -> Layout {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        Layout::round_robin(device, num_virtual, &mut rng).unwrap()
    }

    #[test]
    fn routes_across_a_single_inter_core_link() {
        let d = device_c();
        // device_c: cores {0,1} edge (0,1); {2,3} edge (2,3); inter edge (1,2).
        let layout = layout_for(&d, 4);
        let routed = route(&d, &layout, &Config::default(), 0, 3);
        assert!(!routed.is_unreachable());
        assert_eq!(routed.phys_path.first().copied(), Some(0));
        assert_eq!(routed.phys_path.last().copied(), Some(3));
        // Minimal bridge is endpoint -> comm(1) -> comm(2) -> endpoint: 4 nodes.
        assert_eq!(routed.phys_path.len(), 4);
        assert!(routed.phys_path.contains(&1));
        assert!(routed.phys_path.contains(&2));
    }

    #[test]
    fn path_distance_matches_edge_weight_sum() {
        let d = device_c();
        let layout = layout_for(&d, 4);
        let config = Config::default();
        let cg = build(&d, &layout, &config, 0, 3);
        let path = cg.graph.dijkstra(cg.node_a, cg.node_b);
        let summed: i64 = path.distances.iter().sum();
        assert_eq!(summed, path.distance);
    }
}
