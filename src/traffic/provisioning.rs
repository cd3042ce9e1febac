//! provisioning.rs
//! Derives ingress-egress pairs, traffic matrices, traffic classes and link capacities.

use super::class::{TrafficClass, TrafficClassId};
use super::error::TrafficError;
use crate::topology::{LinkId, NodeId, Topology};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// An ordered `(ingress, egress)` pair.
pub type IePair = (NodeId, NodeId);

/// Demand volume per ingress-egress pair.
pub type TrafficMatrix = BTreeMap<IePair, f64>;

/// How one named class of traffic is derived from the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProfile {
    /// Share of each pair's volume assigned to this class.
    pub weight: f64,
    pub flow_size: f64,
    /// Ordered service chain the class must traverse.
    #[serde(default)]
    pub services: Vec<String>,
}

/// All ordered pairs of distinct nodes, ascending.
pub fn generate_ie_pairs(topo: &Topology) -> Vec<IePair> {
    let nodes: Vec<NodeId> = topo.node_ids().collect();
    all_pairs(&nodes)
}

/// Ordered pairs of distinct nodes drawn from `nodes` only.
pub fn generate_ie_pairs_among(topo: &Topology, nodes: &[NodeId]) -> Result<Vec<IePair>, TrafficError> {
    let mut unique = BTreeSet::new();
    for &node in nodes {
        topo.node(node)?;
        unique.insert(node);
    }
    let nodes: Vec<NodeId> = unique.into_iter().collect();
    Ok(all_pairs(&nodes))
}

fn all_pairs(nodes: &[NodeId]) -> Vec<IePair> {
    let mut pairs = Vec::with_capacity(nodes.len() * nodes.len().saturating_sub(1));
    for &src in nodes {
        for &dst in nodes {
            if src != dst {
                pairs.push((src, dst));
            }
        }
    }
    pairs
}

/// Splits `total_volume` evenly across `pairs`.
pub fn compute_uniform_traffic_matrix(pairs: &[IePair], total_volume: f64) -> Result<TrafficMatrix, TrafficError> {
    if pairs.is_empty() {
        return Err(TrafficError::NoPairs);
    }
    if !total_volume.is_finite() || total_volume < 0.0 {
        return Err(TrafficError::InvalidVolume(total_volume));
    }
    let share = total_volume / pairs.len() as f64;
    Ok(pairs.iter().map(|&pair| (pair, share)).collect())
}

/// Emits one class per pair and per named class: `demand = volume * weight`, `flow_size = size`.
///
/// `weights` and `sizes` must name the same classes.
pub fn generate_traffic_classes(
    pairs: &[IePair],
    matrix: &TrafficMatrix,
    weights: &BTreeMap<String, f64>,
    sizes: &BTreeMap<String, f64>,
) -> Result<Vec<TrafficClass>, TrafficError> {
    if let Some(name) = weights.keys().find(|k| !sizes.contains_key(*k))
        .or_else(|| sizes.keys().find(|k| !weights.contains_key(*k)))
    {
        return Err(TrafficError::InconsistentClassTables(name.clone()));
    }
    let profiles: BTreeMap<String, ClassProfile> = weights
        .iter()
        .map(|(name, &weight)| {
            (name.clone(), ClassProfile { weight, flow_size: sizes[name], services: Vec::new() })
        })
        .collect();
    generate_traffic_classes_with(pairs, matrix, &profiles)
}

/// Like `generate_traffic_classes`, with service chains taken from the profiles.
pub fn generate_traffic_classes_with(
    pairs: &[IePair],
    matrix: &TrafficMatrix,
    profiles: &BTreeMap<String, ClassProfile>,
) -> Result<Vec<TrafficClass>, TrafficError> {
    let mut classes = Vec::with_capacity(pairs.len() * profiles.len());
    for &(src, dst) in pairs {
        let volume = *matrix.get(&(src, dst)).ok_or(TrafficError::MissingMatrixEntry { src, dst })?;
        for (name, profile) in profiles {
            let id = TrafficClassId(classes.len() as u32);
            let class = TrafficClass::new(id, name.as_str(), src, dst, volume * profile.weight, profile.flow_size)?
                .with_services(profile.services.clone());
            classes.push(class);
        }
    }
    Ok(classes)
}

/// Computes a uniform capacity for every link.
///
/// Each class's demand is placed on its shortest path; every link is then provisioned with
/// `peak load * oversubscription`. The aggregate load a link could see when many classes share
/// it is higher than that, so the optimization has to spread traffic.
pub fn provision_links(
    topo: &Topology,
    classes: &[TrafficClass],
    oversubscription: f64,
) -> Result<BTreeMap<LinkId, f64>, TrafficError> {
    if !oversubscription.is_finite() || oversubscription <= 0.0 {
        return Err(TrafficError::InvalidOversubscription(oversubscription));
    }

    // 1. Shortest-path loads
    let mut loads: BTreeMap<LinkId, f64> = BTreeMap::new();
    for class in classes {
        let path = shortest_path(topo, class.src(), class.dst())?;
        for hop in path.windows(2) {
            *loads.entry(LinkId::new(hop[0], hop[1])).or_insert(0.0) += class.demand();
        }
    }

    // 2. Uniform provisioning at the peak
    let peak = loads.values().copied().fold(0.0, f64::max);
    let capacity = peak * oversubscription;
    log::debug!("Provisioning {} links at {capacity} (peak {peak} x {oversubscription})", topo.link_count());

    Ok(topo.links().into_iter().map(|(link, _)| (link, capacity)).collect())
}

/// Writes capacities onto the topology's links.
pub fn apply_capacities(topo: &mut Topology, capacities: &BTreeMap<LinkId, f64>) -> Result<(), TrafficError> {
    for (&link, &cap) in capacities {
        topo.set_link_capacity(link, cap)?;
    }
    Ok(())
}

/// BFS shortest path. Neighbours are expanded in ascending id order, so ties go to lower ids.
fn shortest_path(topo: &Topology, src: NodeId, dst: NodeId) -> Result<Vec<NodeId>, TrafficError> {
    topo.node(src)?;
    topo.node(dst)?;

    let mut parent: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut queue = VecDeque::from([src]);
    let mut seen = BTreeSet::from([src]);

    while let Some(node) = queue.pop_front() {
        if node == dst {
            let mut path = vec![dst];
            let mut cur = dst;
            while let Some(&prev) = parent.get(&cur) {
                path.push(prev);
                cur = prev;
            }
            path.reverse();
            return Ok(path);
        }
        for next in topo.successors(node)? {
            if seen.insert(next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    Err(TrafficError::Unreachable { src, dst })
}
