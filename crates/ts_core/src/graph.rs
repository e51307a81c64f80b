//! Weighted graph with per-node weights, and Dijkstra shortest path.
//!
//! Node ids are dense indices `0..num_nodes`; edge weights and node
//! weights are signed integers so per-hop and per-node penalty terms can
//! be summed directly during relaxation.

use crate::heap::IndexedHeap;

/// One outgoing edge: destination node and weight.
#[derive(Debug, Clone, Copy)]
struct Edge {
    to: usize,
    weight: i64,
}

/// A shortest path returned by [`Graph::dijkstra`].
#[derive(Debug, Clone, Default)]
pub struct Path {
    /// Node ids along the path, `nodes[0]` is `src`, last is `dst`.
    pub nodes: Vec<usize>,
    /// Per-hop distances, `distances.len() == nodes.len() - 1` when non-empty.
    pub distances: Vec<i64>,
    /// Total distance, `+inf` (`crate::heap::INF`) if unreachable.
    pub distance: i64,
}

impl Path {
    /// True if `src` could not reach `dst`.
    pub fn is_unreachable(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Adjacency-list graph with per-node weights, used both as the full device
/// topology graph and as the per-gate contracted router graph.
#[derive(Debug, Clone)]
pub struct Graph {
    adj: Vec<Vec<Edge>>,
    node_weights: Vec<i64>,
}

impl Graph {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            adj: vec![Vec::new(); num_nodes],
            node_weights: vec![0; num_nodes],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    /// Adds a directed edge `u -> v` with the given weight.
    pub fn add_directed_edge(&mut self, u: usize, v: usize, weight: i64) {
        self.adj[u].push(Edge { to: v, weight });
    }

    /// Adds edges in both directions (a single edge if `u == v`).
    pub fn add_edge(&mut self, u: usize, v: usize, weight: i64) {
        self.add_directed_edge(u, v, weight);
        if u != v {
            self.add_directed_edge(v, u, weight);
        }
    }

    /// Adds `delta` to the weight of the first `u -> v` edge found.
    pub fn increase_edge_weight(&mut self, u: usize, v: usize, delta: i64) {
        if let Some(edge) = self.adj[u].iter_mut().find(|e| e.to == v) {
            edge.weight += delta;
        }
    }

    pub fn set_node_weight(&mut self, node: usize, weight: i64) {
        self.node_weights[node] = weight;
    }

    pub fn increase_node_weight(&mut self, node: usize, delta: i64) {
        self.node_weights[node] += delta;
    }

    /// Single-source shortest path from `src` to `dst`. Relaxation sums
    /// *edge weight + destination node weight*, so node weights model
    /// per-hop penalties rather than per-node costs. Returns a path with
    /// `distance == INF` and empty `nodes` if `dst` is unreachable.
    pub fn dijkstra(&self, src: usize, dst: usize) -> Path {
        let n = self.num_nodes();
        let mut dist = vec![crate::heap::INF; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];

        dist[src] = self.node_weights[src];
        let mut heap = IndexedHeap::new(n);
        heap.insert(src as i32, dist[src]);

        while !heap.is_empty() {
            let min = heap.extract_min();
            let u = min.id as usize;
            if visited[u] {
                continue;
            }
            visited[u] = true;
            if u == dst {
                break;
            }
            for edge in &self.adj[u] {
                let v = edge.to;
                if visited[v] {
                    continue;
                }
                let candidate = dist[u].saturating_add(edge.weight).saturating_add(self.node_weights[v]);
                if dist[u] < crate::heap::INF && candidate < dist[v] {
                    dist[v] = candidate;
                    prev[v] = Some(u);
                    heap.insert(v as i32, dist[v]);
                }
            }
        }

        if dist[dst] >= crate::heap::INF {
            return Path {
                nodes: Vec::new(),
                distances: Vec::new(),
                distance: crate::heap::INF,
            };
        }

        let mut nodes = vec![dst];
        let mut cur = dst;
        while let Some(p) = prev[cur] {
            nodes.push(p);
            cur = p;
        }
        nodes.reverse();

        let distances = nodes
            .windows(2)
            .map(|w| dist[w[1]] - dist[w[0]])
            .collect();

        Path {
            nodes,
            distances,
            distance: dist[dst],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dijkstra_finds_shortest_path() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1);
        g.add_edge(1, 2, 1);
        g.add_edge(0, 2, 5);
        g.add_edge(2, 3, 1);

        let path = g.dijkstra(0, 3);
        assert_eq!(path.nodes, vec![0, 1, 2, 3]);
        assert_eq!(path.distance, 3);
        assert_eq!(path.distances.iter().sum::<i64>(), path.distance);
    }

    #[test]
    fn unreachable_dst_has_infinite_distance() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 1);
        let path = g.dijkstra(0, 2);
        assert!(path.is_unreachable());
        assert_eq!(path.distance, crate::heap::INF);
    }

    #[test]
    fn node_weights_add_per_hop_penalty() {
        let mut g = Graph::new(2);
        g.add_edge(0, 1, 1);
        g.set_node_weight(1, 10);
        let path = g.dijkstra(0, 1);
        assert_eq!(path.distance, 11);
    }

    #[test]
    fn consecutive_path_nodes_are_adjacent() {
        let mut g = Graph::new(5);
        g.add_edge(0, 1, 2);
        g.add_edge(1, 2, 3);
        g.add_edge(2, 4, 1);
        g.add_edge(0, 3, 100);
        let path = g.dijkstra(0, 4);
        for w in path.nodes.windows(2) {
            let (u, v) = (w[0], w[1]);
            assert!(g.adj[u].iter().any(|e| e.to == v));
        }
    }
}
