//! Static device topology.
//!
//! A device is a fixed partition of physical qubits into cores, each an
//! intra-connected cluster, joined by a sparse set of inter-core edges.
//! Every physical qubit incident to an inter-core edge becomes a
//! *communication qubit*. Everything here is built once at construction and
//! never mutated afterwards.
//!
//! Qubits of core `c` occupy the contiguous range
//! `[c * core_capacity, (c + 1) * core_capacity)`, matching the convention
//! the device JSON schema assumes.

use crate::error::{Result, TsError};
use crate::graph::Graph;
use serde::{Deserialize, Serialize};

/// A teleportation edge: a free intra-core neighbor of an inter-core
/// mediator qubit, paired with the mediator's cross-core partner.
///
/// Derived once from `inter_core_edges` and kept around as a structural
/// record of the device's teleport topology; the contracted router builds
/// its own per-gate edges directly rather than consulting this list during
/// scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TpEdge {
    pub source: i32,
    pub mediator: i32,
    pub target: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceJson {
    device: DeviceJsonInner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceJsonInner {
    #[serde(default = "default_device_name")]
    name: String,
    num_qubits: usize,
    num_cores: usize,
    #[serde(default)]
    inter_core_edges: Vec<(i32, i32)>,
    #[serde(default)]
    intra_core_edges: Vec<(i32, i32)>,
}

fn default_device_name() -> String {
    "device".to_string()
}

/// Static multi-core device topology.
#[derive(Debug, Clone)]
pub struct Device {
    pub name: String,
    pub num_qubits: usize,
    pub num_cores: usize,
    pub core_capacity: usize,

    pub phys_to_core: Vec<i32>,
    pub core_qubits: Vec<Vec<i32>>,

    adjacency: Vec<Vec<i32>>,
    pub inter_core_edges: Vec<(i32, i32)>,
    pub tp_edges: Vec<TpEdge>,

    pub comm_qubits: Vec<i32>,
    pub qubit_is_comm: Vec<bool>,
    /// Dense index of each comm qubit into `comm_qubits`, `-1` if not comm.
    pub comm_qubit_node_id: Vec<i32>,
    pub core_comm_qubits: Vec<Vec<i32>>,

    /// `distance_matrix[core][local_i][local_j]`, Floyd-Warshall over the
    /// core's intra-core edges.
    distance_matrix: Vec<Vec<Vec<i64>>>,
}

impl Device {
    /// Builds a device from its core count/capacity and edge lists.
    /// `intra_core_edges` must only connect qubits within the same core.
    pub fn new(
        name: impl Into<String>,
        num_cores: usize,
        core_capacity: usize,
        intra_core_edges: &[(i32, i32)],
        inter_core_edges: &[(i32, i32)],
    ) -> Result<Self> {
        let num_qubits = num_cores * core_capacity;
        let phys_to_core: Vec<i32> = (0..num_qubits)
            .map(|p| (p / core_capacity) as i32)
            .collect();

        let mut core_qubits = vec![Vec::new(); num_cores];
        for p in 0..num_qubits {
            core_qubits[phys_to_core[p] as usize].push(p as i32);
        }

        let mut adjacency = vec![Vec::new(); num_qubits];
        for &(u, v) in intra_core_edges.iter().chain(inter_core_edges.iter()) {
            Self::validate_qubit(u, num_qubits)?;
            Self::validate_qubit(v, num_qubits)?;
            adjacency[u as usize].push(v);
            adjacency[v as usize].push(u);
        }

        let mut qubit_is_comm = vec![false; num_qubits];
        for &(p1, p2) in inter_core_edges {
            qubit_is_comm[p1 as usize] = true;
            qubit_is_comm[p2 as usize] = true;
        }
        let comm_qubits: Vec<i32> = (0..num_qubits as i32)
            .filter(|&p| qubit_is_comm[p as usize])
            .collect();
        let mut comm_qubit_node_id = vec![-1i32; num_qubits];
        for (node_id, &p) in comm_qubits.iter().enumerate() {
            comm_qubit_node_id[p as usize] = node_id as i32;
        }
        let mut core_comm_qubits = vec![Vec::new(); num_cores];
        for &p in &comm_qubits {
            core_comm_qubits[phys_to_core[p as usize] as usize].push(p);
        }

        let tp_edges = Self::build_tp_edges(inter_core_edges, &phys_to_core, &adjacency);
        let distance_matrix =
            Self::floyd_warshall_per_core(num_cores, core_capacity, &core_qubits, intra_core_edges, &phys_to_core);

        Ok(Self {
            name: name.into(),
            num_qubits,
            num_cores,
            core_capacity,
            phys_to_core,
            core_qubits,
            adjacency,
            inter_core_edges: inter_core_edges.to_vec(),
            tp_edges,
            comm_qubits,
            qubit_is_comm,
            comm_qubit_node_id,
            core_comm_qubits,
            distance_matrix,
        })
    }

    fn validate_qubit(p: i32, num_qubits: usize) -> Result<()> {
        if p < 0 || p as usize >= num_qubits {
            return Err(TsError::InvalidPhysicalQubit(p, num_qubits));
        }
        Ok(())
    }

    /// For every inter-core edge `(p1, p2)`, every intra-core neighbor of
    /// `p1` becomes a teleport source mediated by `p1` targeting `p2`, and
    /// symmetrically for `p2`.
    fn build_tp_edges(
        inter_core_edges: &[(i32, i32)],
        phys_to_core: &[i32],
        adjacency: &[Vec<i32>],
    ) -> Vec<TpEdge> {
        let mut tp_edges = Vec::new();
        for &(p1, p2) in inter_core_edges {
            for &n in &adjacency[p1 as usize] {
                if phys_to_core[n as usize] == phys_to_core[p1 as usize] {
                    tp_edges.push(TpEdge {
                        source: n,
                        mediator: p1,
                        target: p2,
                    });
                }
            }
            for &n in &adjacency[p2 as usize] {
                if phys_to_core[n as usize] == phys_to_core[p2 as usize] {
                    tp_edges.push(TpEdge {
                        source: n,
                        mediator: p2,
                        target: p1,
                    });
                }
            }
        }
        tp_edges
    }

    fn floyd_warshall_per_core(
        num_cores: usize,
        core_capacity: usize,
        core_qubits: &[Vec<i32>],
        intra_core_edges: &[(i32, i32)],
        phys_to_core: &[i32],
    ) -> Vec<Vec<Vec<i64>>> {
        let mut matrices = Vec::with_capacity(num_cores);
        for c in 0..num_cores {
            let base = core_qubits[c].first().copied().unwrap_or(0);
            let mut dist = vec![vec![crate::heap::INF; core_capacity]; core_capacity];
            for i in 0..core_capacity {
                dist[i][i] = 0;
            }
            for &(u, v) in intra_core_edges {
                if phys_to_core[u as usize] as usize != c {
                    continue;
                }
                let (li, lj) = ((u - base) as usize, (v - base) as usize);
                dist[li][lj] = 1;
                dist[lj][li] = 1;
            }
            for k in 0..core_capacity {
                for i in 0..core_capacity {
                    for j in 0..core_capacity {
                        let via = dist[i][k] + dist[k][j];
                        if via < dist[i][j] {
                            dist[i][j] = via;
                        }
                    }
                }
            }
            matrices.push(dist);
        }
        matrices
    }

    /// Generates a regular grid device: `core_x * core_y` cores, each an
    /// intra-core `qubit_x * qubit_y` grid, with one inter-core edge
    /// between each pair of horizontally/vertically adjacent cores.
    pub fn new_grid(core_x: usize, core_y: usize, qubit_x: usize, qubit_y: usize) -> Result<Self> {
        let core_capacity = qubit_x * qubit_y;
        let num_cores = core_x * core_y;
        let core_id = |cx: usize, cy: usize| cy * core_x + cx;
        let local_id = |qx: usize, qy: usize| qy * qubit_x + qx;
        let global = |cx: usize, cy: usize, qx: usize, qy: usize| {
            (core_id(cx, cy) * core_capacity + local_id(qx, qy)) as i32
        };

        let mut intra_core_edges = Vec::new();
        for cy in 0..core_y {
            for cx in 0..core_x {
                for qy in 0..qubit_y {
                    for qx in 0..qubit_x {
                        if qx + 1 < qubit_x {
                            intra_core_edges
                                .push((global(cx, cy, qx, qy), global(cx, cy, qx + 1, qy)));
                        }
                        if qy + 1 < qubit_y {
                            intra_core_edges
                                .push((global(cx, cy, qx, qy), global(cx, cy, qx, qy + 1)));
                        }
                    }
                }
            }
        }

        let mut inter_core_edges = Vec::new();
        for cy in 0..core_y {
            for cx in 0..core_x {
                if cx + 1 < core_x {
                    inter_core_edges.push((
                        global(cx, cy, qubit_x - 1, 0),
                        global(cx + 1, cy, 0, 0),
                    ));
                }
                if cy + 1 < core_y {
                    inter_core_edges.push((
                        global(cx, cy, 0, qubit_y - 1),
                        global(cx, cy + 1, 0, 0),
                    ));
                }
            }
        }

        Self::new(
            format!("grid_{core_x}x{core_y}_{qubit_x}x{qubit_y}"),
            num_cores,
            core_capacity,
            &intra_core_edges,
            &inter_core_edges,
        )
    }

    /// Parses the `"device"` key of a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: DeviceJson = serde_json::from_str(json)?;
        let inner = parsed.device;
        if inner.num_cores == 0 {
            return Err(TsError::device("num_cores must be nonzero"));
        }
        let core_capacity = inner.num_qubits / inner.num_cores;
        Self::new(
            inner.name,
            inner.num_cores,
            core_capacity,
            &inner.intra_core_edges,
            &inner.inter_core_edges,
        )
    }

    /// Intra-core Manhattan-style distance (same core only); `INF` if `p1`
    /// and `p2` belong to different cores. Inter-core distances are
    /// expressed via the contracted router, not this matrix.
    pub fn get_distance(&self, p1: i32, p2: i32) -> i64 {
        let c1 = self.phys_to_core[p1 as usize];
        let c2 = self.phys_to_core[p2 as usize];
        if c1 != c2 {
            return crate::heap::INF;
        }
        let base = self.core_qubits[c1 as usize][0];
        self.distance_matrix[c1 as usize][(p1 - base) as usize][(p2 - base) as usize]
    }

    pub fn has_edge(&self, p1: i32, p2: i32) -> bool {
        self.get_distance(p1, p2) == 1
    }

    /// Intra-core neighbors (and, for comm qubits, the cross-core partner)
    /// of `p`.
    pub fn neighbors(&self, p: i32) -> &[i32] {
        &self.adjacency[p as usize]
    }

    /// Builds a `Graph` over `0..num_qubits` whose edges mirror this
    /// device's intra-core and inter-core adjacency, each weighted 1. Used
    /// for diagnostics and tests; the scheduler itself only ever routes
    /// through per-gate contracted graphs (§4.7).
    pub fn to_graph(&self) -> Graph {
        let mut g = Graph::new(self.num_qubits);
        let mut seen = std::collections::HashSet::new();
        for p in 0..self.num_qubits as i32 {
            for &n in self.neighbors(p) {
                let key = (p.min(n), p.max(n));
                if seen.insert(key) {
                    g.add_edge(p as usize, n as usize, 1);
                }
            }
        }
        g
    }
}

/// Hand-built devices used by the end-to-end scenarios in spec §8
/// (`device_a()` .. `device_h()` in `device.c`).
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures {
    use super::Device;

    /// One core, two qubits, a single edge (S1).
    pub fn device_a() -> Device {
        Device::new("device_a", 1, 2, &[(0, 1)], &[]).unwrap()
    }

    /// One core, three qubits on a path 0-1-2 (S2).
    pub fn device_b() -> Device {
        Device::new("device_b", 1, 3, &[(0, 1), (1, 2)], &[]).unwrap()
    }

    /// Two cores of two qubits each, intra edges (0,1)(2,3), one inter edge
    /// (1,2) (S3, S4).
    pub fn device_c() -> Device {
        Device::new("device_c", 2, 2, &[(0, 1), (2, 3)], &[(1, 2)]).unwrap()
    }

    /// A 2x2 grid of 2x2-qubit cores.
    pub fn device_d() -> Device {
        Device::new_grid(2, 2, 2, 2).unwrap()
    }

    /// A 2x2 grid of 3x3-qubit cores.
    pub fn device_e() -> Device {
        Device::new_grid(2, 2, 3, 3).unwrap()
    }

    /// A 3x1 grid of 2x2-qubit cores.
    pub fn device_f() -> Device {
        Device::new_grid(3, 1, 2, 2).unwrap()
    }

    /// A 3x3 grid of 3x3-qubit cores.
    pub fn device_g() -> Device {
        Device::new_grid(3, 3, 3, 3).unwrap()
    }

    /// A single core of four qubits arranged in a ring, no inter-core edges.
    pub fn device_h() -> Device {
        Device::new("device_h", 1, 4, &[(0, 1), (1, 2), (2, 3), (3, 0)], &[]).unwrap()
    }
}
