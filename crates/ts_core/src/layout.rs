//! The virt<->phys layout: the scheduler's one piece of mutable state.
//!
//! Physical qubits holding no virtual qubit carry a sentinel id `>=
//! num_virtual_qubits`; every free physical qubit keeps a distinct sentinel
//! so it can be tracked as its own "free slot identity" as teleports move it
//! around (see [`Layout::apply_teleport`]).

use rand::seq::SliceRandom;
use rand::Rng;

use crate::circuit::Circuit;
use crate::config::InitialLayoutType;
use crate::device::Device;
use crate::error::{Result, TsError};
use crate::heap::IndexedHeap;

/// Bidirectional virt<->phys mapping, per-core free-slot counters, and one
/// nearest-free-qubit heap per communication qubit.
#[derive(Debug, Clone)]
pub struct Layout {
    pub num_virtual_qubits: usize,
    pub phys_to_virt: Vec<i32>,
    pub virt_to_phys: Vec<i32>,
    pub remaining_capacity: Vec<i32>,
    /// Indexed by `device.comm_qubit_node_id[pc]`; entries are free physical
    /// qubit ids in `pc`'s core, keyed by `device.get_distance(pc, id)`.
    nearest_free: Vec<IndexedHeap>,
}

impl Layout {
    /// True if physical qubit `p` holds no virtual qubit.
    pub fn is_free(&self, p: i32) -> bool {
        self.phys_to_virt[p as usize] as usize >= self.num_virtual_qubits
    }

    /// Builds an empty layout (every physical qubit free) and its
    /// nearest-free heaps; callers then place virtual qubits via
    /// [`Layout::place`] before scheduling starts.
    fn new_empty(device: &Device, num_virtual_qubits: usize) -> Self {
        let phys_to_virt: Vec<i32> = (0..device.num_qubits)
            .map(|p| (num_virtual_qubits + p) as i32)
            .collect();
        let virt_to_phys = vec![-1i32; num_virtual_qubits];
        let remaining_capacity = device
            .core_qubits
            .iter()
            .map(|qs| qs.len() as i32)
            .collect();

        let mut layout = Self {
            num_virtual_qubits,
            phys_to_virt,
            virt_to_phys,
            remaining_capacity,
            nearest_free: (0..device.comm_qubits.len())
                .map(|_| IndexedHeap::new(device.num_qubits))
                .collect(),
        };
        layout.rebuild_nearest_free(device);
        layout
    }

    /// Places virtual qubit `v` onto physical qubit `p` of an empty layout.
    fn place(&mut self, device: &Device, v: i32, p: i32) {
        self.phys_to_virt[p as usize] = v;
        self.virt_to_phys[v as usize] = p;
        self.remaining_capacity[device.phys_to_core[p as usize] as usize] -= 1;
    }

    fn rebuild_nearest_free(&mut self, device: &Device) {
        for heap in &mut self.nearest_free {
            *heap = IndexedHeap::new(device.num_qubits);
        }
        for (node_id, &pc) in device.comm_qubits.iter().enumerate() {
            let core = device.phys_to_core[pc as usize];
            for &p in &device.core_qubits[core as usize] {
                if self.is_free(p) {
                    self.nearest_free[node_id].insert(p, device.get_distance(pc, p));
                }
            }
        }
    }

    /// Round-robin initial layout: virtual qubit `v` goes to core `v mod
    /// num_cores`, then physical qubits within each core are randomly
    /// permuted among the virtuals assigned to it.
    pub fn round_robin(device: &Device, num_virtual_qubits: usize, rng: &mut impl Rng) -> Result<Self> {
        let mut layout = Self::new_empty(device, num_virtual_qubits);
        let mut per_core: Vec<Vec<i32>> = vec![Vec::new(); device.num_cores];
        for v in 0..num_virtual_qubits as i32 {
            per_core[(v as usize) % device.num_cores].push(v);
        }
        for (core, virts) in per_core.into_iter().enumerate() {
            if virts.len() > device.core_qubits[core].len() {
                return Err(TsError::layout(format!(
                    "core {core} cannot hold {} virtual qubits",
                    virts.len()
                )));
            }
            let mut phys = device.core_qubits[core].clone();
            phys.shuffle(rng);
            for (v, p) in virts.into_iter().zip(phys) {
                layout.place(device, v, p);
            }
        }
        layout.rebuild_nearest_free(device);
        Ok(layout)
    }

    /// Random initial layout: shuffle all physical qubits, then fill with
    /// virtuals in order, skipping cores already at capacity.
    pub fn random(device: &Device, num_virtual_qubits: usize, rng: &mut impl Rng) -> Result<Self> {
        let mut layout = Self::new_empty(device, num_virtual_qubits);
        let mut phys: Vec<i32> = (0..device.num_qubits as i32).collect();
        phys.shuffle(rng);

        let mut remaining: Vec<i32> = device
            .core_qubits
            .iter()
            .map(|qs| qs.len() as i32)
            .collect();
        let mut it = phys.into_iter();
        for v in 0..num_virtual_qubits as i32 {
            loop {
                let p = it.next().ok_or_else(|| {
                    TsError::layout("not enough physical qubits for random layout")
                })?;
                let core = device.phys_to_core[p as usize] as usize;
                if remaining[core] > 0 {
                    remaining[core] -= 1;
                    layout.place(device, v, p);
                    break;
                }
            }
        }
        layout.rebuild_nearest_free(device);
        Ok(layout)
    }

    /// Greedy "hungarian" initial layout (spec §4.5; the name is a
    /// misnomer kept for compatibility -- this is a greedy first-fit, not an
    /// assignment solver). Considers the first two-qubit slice: for each
    /// gate, places both endpoints in the first core with
    /// `remaining_capacity > min_free_gate`; remaining virtuals go to the
    /// first core with `remaining_capacity > min_free_qubit`. Physical
    /// assignment within each core is then randomly permuted.
    pub fn hungarian(
        device: &Device,
        circuit: &Circuit,
        num_virtual_qubits: usize,
        min_free_gate: i32,
        min_free_qubit: i32,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let mut core_of_virt: Vec<Option<usize>> = vec![None; num_virtual_qubits];
        let mut remaining: Vec<i32> = device
            .core_qubits
            .iter()
            .map(|qs| qs.len() as i32)
            .collect();

        let first_slice = circuit.gates.iter().filter(|g| g.is_two_qubit());
        let mut seen_in_slice = vec![false; num_virtual_qubits];
        for gate in first_slice {
            if gate.targets.iter().any(|&q| seen_in_slice[q as usize]) {
                break;
            }
            for &q in &gate.targets {
                seen_in_slice[q as usize] = true;
            }
            if gate.targets.iter().any(|&q| core_of_virt[q as usize].is_some()) {
                continue;
            }
            let core = (0..device.num_cores).find(|&c| remaining[c] > min_free_gate);
            if let Some(core) = core {
                for &q in &gate.targets {
                    core_of_virt[q as usize] = Some(core);
                    remaining[core] -= 1;
                }
            }
        }

        for v in 0..num_virtual_qubits {
            if core_of_virt[v].is_none() {
                let core = (0..device.num_cores)
                    .find(|&c| remaining[c] > min_free_qubit)
                    .ok_or_else(|| TsError::layout("no core with free capacity for hungarian layout"))?;
                core_of_virt[v] = Some(core);
                remaining[core] -= 1;
            }
        }

        let mut virts_per_core: Vec<Vec<i32>> = vec![Vec::new(); device.num_cores];
        for (v, core) in core_of_virt.into_iter().enumerate() {
            virts_per_core[core.unwrap()].push(v as i32);
        }

        let mut layout = Self::new_empty(device, num_virtual_qubits);
        for (core, virts) in virts_per_core.into_iter().enumerate() {
            let mut phys = device.core_qubits[core].clone();
            phys.shuffle(rng);
            for (v, p) in virts.into_iter().zip(phys) {
                layout.place(device, v, p);
            }
        }
        layout.rebuild_nearest_free(device);
        Ok(layout)
    }

    pub fn initial(
        kind: InitialLayoutType,
        device: &Device,
        circuit: &Circuit,
        num_virtual_qubits: usize,
        min_free_gate: i32,
        min_free_qubit: i32,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        match kind {
            InitialLayoutType::RoundRobin => Self::round_robin(device, num_virtual_qubits, rng),
            InitialLayoutType::Random => Self::random(device, num_virtual_qubits, rng),
            InitialLayoutType::Hungarian => Self::hungarian(
                device,
                circuit,
                num_virtual_qubits,
                min_free_gate,
                min_free_qubit,
                rng,
            ),
        }
    }

    /// Swaps the virtual qubits held by `p1` and `p2` (must be distinct,
    /// not both free). Updates the nearest-free heaps of their shared core
    /// only when exactly one endpoint changes free/occupied status.
    pub fn apply_swap(&mut self, device: &Device, p1: i32, p2: i32) -> Result<()> {
        if p1 == p2 {
            return Err(TsError::layout("apply_swap: p1 == p2"));
        }
        let free1 = self.is_free(p1);
        let free2 = self.is_free(p2);
        if free1 && free2 {
            return Err(TsError::layout("apply_swap: both endpoints are free"));
        }

        let (v1, v2) = (self.phys_to_virt[p1 as usize], self.phys_to_virt[p2 as usize]);
        self.phys_to_virt[p1 as usize] = v2;
        self.phys_to_virt[p2 as usize] = v1;
        if (v1 as usize) < self.num_virtual_qubits {
            self.virt_to_phys[v1 as usize] = p2;
        }
        if (v2 as usize) < self.num_virtual_qubits {
            self.virt_to_phys[v2 as usize] = p1;
        }

        if free1 != free2 {
            let (freed, occupied) = if free1 { (p1, p2) } else { (p2, p1) };
            self.mark_occupied(device, occupied);
            self.mark_free(device, freed);
        }
        Ok(())
    }

    /// Teleports the data qubit held by `src` to `tgt` through free
    /// `mediator`. Preconditions: `src` occupied, `mediator` and `tgt` free.
    pub fn apply_teleport(&mut self, device: &Device, src: i32, mediator: i32, tgt: i32) -> Result<()> {
        if self.is_free(src) {
            return Err(TsError::layout("apply_teleport: src is free"));
        }
        if !self.is_free(mediator) {
            return Err(TsError::layout("apply_teleport: mediator is occupied"));
        }
        if !self.is_free(tgt) {
            return Err(TsError::layout("apply_teleport: tgt is occupied"));
        }

        let v = self.phys_to_virt[src as usize];
        let free_sentinel = self.phys_to_virt[tgt as usize];
        self.phys_to_virt[tgt as usize] = v;
        self.phys_to_virt[src as usize] = free_sentinel;
        self.virt_to_phys[v as usize] = tgt;

        let src_core = device.phys_to_core[src as usize] as usize;
        let tgt_core = device.phys_to_core[tgt as usize] as usize;
        self.remaining_capacity[src_core] += 1;
        self.remaining_capacity[tgt_core] -= 1;

        self.mark_occupied(device, tgt);
        self.mark_free(device, src);
        Ok(())
    }

    fn mark_free(&mut self, device: &Device, p: i32) {
        let core = device.phys_to_core[p as usize];
        for &pc in &device.core_comm_qubits[core as usize] {
            let node_id = device.comm_qubit_node_id[pc as usize] as usize;
            self.nearest_free[node_id].insert(p, device.get_distance(pc, p));
        }
    }

    fn mark_occupied(&mut self, device: &Device, p: i32) {
        let core = device.phys_to_core[p as usize];
        for &pc in &device.core_comm_qubits[core as usize] {
            let node_id = device.comm_qubit_node_id[pc as usize] as usize;
            self.nearest_free[node_id].remove(p);
        }
    }

    /// The closest free physical qubit to comm qubit `pc`, if any.
    pub fn get_nearest_free_qubit(&self, device: &Device, pc: i32) -> Option<i32> {
        let node_id = device.comm_qubit_node_id[pc as usize];
        if node_id < 0 {
            return None;
        }
        let min = self.nearest_free[node_id as usize].get_min();
        if min.id < 0 {
            None
        } else {
            Some(min.id)
        }
    }

    /// The priority (distance) of the nearest free qubit to `pc`, or `INF`.
    pub fn nearest_free_penalty(&self, device: &Device, pc: i32) -> i64 {
        let node_id = device.comm_qubit_node_id[pc as usize];
        if node_id < 0 {
            return crate::heap::INF;
        }
        self.nearest_free[node_id as usize].get_min().priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fixtures::device_c;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(1)
    }

    #[test]
    fn phys_to_virt_and_virt_to_phys_are_mutual_inverses() {
        let d = device_c();
        let layout = Layout::round_robin(&d, 4, &mut rng()).unwrap();
        for v in 0..4 {
            let p = layout.virt_to_phys[v];
            assert_eq!(layout.phys_to_virt[p as usize], v as i32);
        }
    }

    #[test]
    fn swap_then_swap_back_is_identity() {
        let d = device_c();
        let mut layout = Layout::round_robin(&d, 4, &mut rng()).unwrap();
        let before = layout.clone();
        layout.apply_swap(&d, 0, 1).unwrap();
        layout.apply_swap(&d, 0, 1).unwrap();
        assert_eq!(layout.phys_to_virt, before.phys_to_virt);
        assert_eq!(layout.virt_to_phys, before.virt_to_phys);
        assert_eq!(layout.remaining_capacity, before.remaining_capacity);
    }

    #[test]
    fn swap_rejects_both_free_or_equal() {
        let d = device_c();
        let mut layout = Layout::round_robin(&d, 2, &mut rng()).unwrap();
        assert!(layout.apply_swap(&d, 0, 0).is_err());
    }

    #[test]
    fn teleport_updates_capacity_and_nearest_free() {
        use crate::device::fixtures::device_d;
        let d = device_d();
        let mut layout = Layout::round_robin(&d, 1, &mut rng()).unwrap();
        let src = layout.virt_to_phys[0];
        let src_core = d.phys_to_core[src as usize] as usize;
        let mediator = d.core_qubits[src_core]
            .iter()
            .copied()
            .find(|&p| p != src)
            .unwrap();
        let other_core = (0..d.num_cores).find(|&c| c != src_core).unwrap();
        let tgt = d.core_qubits[other_core][0];

        let cap_before = layout.remaining_capacity.clone();
        layout.apply_teleport(&d, src, mediator, tgt).unwrap();

        assert_eq!(layout.virt_to_phys[0], tgt);
        assert_eq!(layout.phys_to_virt[tgt as usize], 0);
        assert!(layout.phys_to_virt[src as usize] as usize >= 1);
        assert_eq!(layout.remaining_capacity[src_core], cap_before[src_core] + 1);
        assert_eq!(layout.remaining_capacity[other_core], cap_before[other_core] - 1);

        // Mediator never changes occupancy.
        assert!(layout.phys_to_virt[mediator as usize] as usize >= 1);
    }

    #[test]
    fn teleport_rejects_occupied_mediator_or_target() {
        let d = device_c();
        let mut layout = Layout::round_robin(&d, 4, &mut rng()).unwrap();
        let src = layout.virt_to_phys[0];
        let occupied = layout.virt_to_phys[1];
        assert!(layout.apply_teleport(&d, src, occupied, occupied).is_err());
    }

    #[test]
    fn remaining_capacity_matches_free_count() {
        let d = device_c();
        let layout = Layout::round_robin(&d, 3, &mut rng()).unwrap();
        for c in 0..d.num_cores {
            let free = d.core_qubits[c]
                .iter()
                .filter(|&&p| layout.phys_to_virt[p as usize] as usize >= 3)
                .count();
            assert_eq!(layout.remaining_capacity[c], free as i32);
        }
    }
}
