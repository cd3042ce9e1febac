//! Defines the `Path`, a candidate route for exactly one traffic class.

use super::error::PathError;
use crate::topology::{LinkId, NodeId, Topology, TopologyError};
use crate::traffic::TrafficClassId;
use smallvec::SmallVec;
use std::fmt;

/// Stable identity of a path: the owning class plus the index the generator assigned.
///
/// The index survives selection, so two paths with the same node sequence under different
/// classes never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId {
    pub class: TrafficClassId,
    pub index: u32,
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/p{}", self.class, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    id: PathId,
    nodes: SmallVec<[NodeId; 8]>,
}

impl Path {
    /// Builds a path from a node sequence of at least two nodes.
    pub fn try_new(id: PathId, nodes: impl IntoIterator<Item = NodeId>) -> Result<Self, PathError> {
        let nodes: SmallVec<[NodeId; 8]> = nodes.into_iter().collect();
        if nodes.len() < 2 {
            return Err(PathError::TooShort(id, nodes.len()));
        }
        Ok(Self { id, nodes })
    }

    /// Callers guarantee at least two nodes.
    pub(crate) fn new(id: PathId, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let nodes: SmallVec<[NodeId; 8]> = nodes.into_iter().collect();
        debug_assert!(nodes.len() >= 2, "a path needs at least two nodes");
        Self { id, nodes }
    }

    pub fn id(&self) -> PathId { self.id }
    pub fn nodes(&self) -> &[NodeId] { &self.nodes }
    pub fn hops(&self) -> usize { self.nodes.len().saturating_sub(1) }

    #[inline(always)]
    pub fn src(&self) -> NodeId { self.nodes[0] }
    #[inline(always)]
    pub fn dst(&self) -> NodeId { self.nodes[self.nodes.len() - 1] }

    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.nodes.windows(2).map(|w| LinkId::new(w[0], w[1]))
    }

    /// Every node except the two endpoints.
    pub fn transit_nodes(&self) -> &[NodeId] {
        match self.nodes.len() {
            0..=2 => &[],
            n => &self.nodes[1..n - 1],
        }
    }

    pub fn uses_link(&self, link: LinkId) -> bool { self.links().any(|l| l == link) }

    /// Sum of the routing costs of the traversed links.
    pub fn routing_cost(&self, topo: &Topology) -> Result<f64, TopologyError> {
        self.links().map(|l| topo.link(l).map(|attrs| attrs.routing_cost)).sum()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.id)?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{node}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::generators::complete;

    fn pid(index: u32) -> PathId {
        PathId { class: TrafficClassId(1), index }
    }

    #[test]
    fn test_links_and_transit() {
        let p = Path::new(pid(0), [NodeId(0), NodeId(3), NodeId(2)]);
        assert_eq!(p.hops(), 2);
        assert_eq!(p.transit_nodes(), &[NodeId(3)]);
        let links: Vec<_> = p.links().collect();
        assert_eq!(links, vec![LinkId::new(NodeId(0), NodeId(3)), LinkId::new(NodeId(3), NodeId(2))]);
        assert!(p.uses_link(LinkId::new(NodeId(3), NodeId(2))));
        assert!(!p.uses_link(LinkId::new(NodeId(2), NodeId(3))));
        assert_eq!(p.to_string(), "tc1/p0[n0 n3 n2]");
    }

    #[test]
    fn test_direct_path_has_no_transit() {
        let p = Path::new(pid(4), [NodeId(5), NodeId(6)]);
        assert!(p.transit_nodes().is_empty());
        assert_eq!((p.src(), p.dst()), (NodeId(5), NodeId(6)));
    }

    #[test]
    fn test_try_new_rejects_short_sequences() {
        assert_eq!(Path::try_new(pid(0), [NodeId(2)]).unwrap_err(), PathError::TooShort(pid(0), 1));
        assert_eq!(Path::try_new(pid(1), Vec::new()).unwrap_err(), PathError::TooShort(pid(1), 0));
        let p = Path::try_new(pid(2), [NodeId(2), NodeId(0)]).unwrap();
        assert_eq!((p.src(), p.dst()), (NodeId(2), NodeId(0)));
    }

    #[test]
    fn test_routing_cost_defaults_to_hops() {
        let mut topo = complete(4);
        let p = Path::new(pid(0), [NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(p.routing_cost(&topo).unwrap(), 2.0);

        topo.set_link_routing_cost(LinkId::new(NodeId(1), NodeId(2)), 5.0).unwrap();
        assert_eq!(p.routing_cost(&topo).unwrap(), 6.0);
    }
}
