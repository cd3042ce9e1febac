//! Stock topologies and whole-graph measurements.

use super::error::TopologyError;
use super::graph::Topology;
use petgraph::algo::dijkstra;

/// A complete topology on `n` nodes: every ordered pair of distinct nodes is linked.
pub fn complete(n: usize) -> Topology {
    let mut topo = Topology::new(format!("complete{n}"));
    let ids: Vec<_> = (0..n).map(|_| topo.add_node()).collect();
    for &a in &ids {
        for &b in &ids {
            if a != b {
                // Both endpoints were just added and are distinct.
                let _ = topo.add_link(a, b);
            }
        }
    }
    topo
}

/// A line `0 - 1 - ... - (n-1)` with links in both directions.
pub fn chain(n: usize) -> Topology {
    let mut topo = Topology::new(format!("chain{n}"));
    let ids: Vec<_> = (0..n).map(|_| topo.add_node()).collect();
    for pair in ids.windows(2) {
        let _ = topo.add_bidirectional_link(pair[0], pair[1]);
    }
    topo
}

/// Marks every node as a switch.
pub fn force_switch_labels(topo: &mut Topology) {
    let ids: Vec<_> = topo.node_ids().collect();
    for id in ids {
        let _ = topo.set_switch(id, true);
    }
}

/// Hop diameter: the longest shortest path between any ordered pair of nodes.
/// Returns `None` if some node cannot reach another.
pub fn diameter(topo: &Topology) -> Option<usize> {
    let n = topo.node_count();
    let mut longest = 0;
    for source in topo.node_ids() {
        let dist = dijkstra(topo.graph(), source, None, |_| 1usize);
        if dist.len() != n {
            return None;
        }
        longest = longest.max(dist.values().copied().max().unwrap_or(0));
    }
    Some(longest)
}

/// Hop limit for path enumeration: `ceil(diameter * factor)`, never below one hop.
pub fn hop_limit(topo: &Topology, factor: f64) -> Result<usize, TopologyError> {
    let diam = diameter(topo).ok_or_else(|| TopologyError::Disconnected { name: topo.name().to_string() })?;
    Ok(((diam as f64 * factor).ceil() as usize).max(1))
}
