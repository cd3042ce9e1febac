use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A unique, stable identifier for a node within a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A directed link. `(a, b)` and `(b, a)` are different links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId {
    pub src: NodeId,
    pub dst: NodeId,
}

impl LinkId {
    pub fn new(src: NodeId, dst: NodeId) -> Self { Self { src, dst } }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

/// Per-node attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    pub is_switch: bool,
    pub has_middlebox: bool,
    /// Service types the node can apply (e.g. `fw`, `ids`). Order is irrelevant.
    pub services: BTreeSet<String>,
}

impl NodeAttrs {
    pub fn supports(&self, service: &str) -> bool {
        self.services.contains(service)
    }
}

/// Per-link attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkAttrs {
    /// Provisioned capacity, set by `traffic::apply_capacities` or by hand.
    pub capacity: Option<f64>,
    pub power_cost: Option<f64>,
    /// Cost of carrying one unit of traffic over this link. Defaults to 1,
    /// which makes a path's routing cost its hop count.
    pub routing_cost: f64,
}

impl Default for LinkAttrs {
    fn default() -> Self {
        Self { capacity: None, power_cost: None, routing_cost: 1.0 }
    }
}
