//! Capability tests that decide whether a candidate path may carry a traffic class.

use super::path::Path;
use crate::topology::Topology;
use crate::traffic::TrafficClass;

/// A path filter applied during generation.
///
/// Predicates must be `Sync`: classes are enumerated in parallel over a shared topology.
pub trait PathPredicate: Sync {
    fn accepts(&self, class: &TrafficClass, path: &Path, topo: &Topology) -> bool;
}

impl<F> PathPredicate for F
where
    F: Fn(&TrafficClass, &Path, &Topology) -> bool + Sync,
{
    fn accepts(&self, class: &TrafficClass, path: &Path, topo: &Topology) -> bool {
        self(class, path, topo)
    }
}

/// Accepts every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPredicate;

impl PathPredicate for NullPredicate {
    fn accepts(&self, _: &TrafficClass, _: &Path, _: &Topology) -> bool { true }
}

/// Accepts paths that visit at least one middlebox.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasMiddlebox;

impl PathPredicate for HasMiddlebox {
    fn accepts(&self, _: &TrafficClass, path: &Path, topo: &Topology) -> bool {
        path.nodes()
            .iter()
            .any(|&n| topo.node(n).map(|attrs| attrs.has_middlebox).unwrap_or(false))
    }
}

/// Accepts paths that visit middleboxes offering the class's service chain, in order.
///
/// A single middlebox may apply several consecutive services. An empty chain accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceChain;

impl PathPredicate for ServiceChain {
    fn accepts(&self, class: &TrafficClass, path: &Path, topo: &Topology) -> bool {
        let chain = class.services();
        let mut next = 0;
        for &node in path.nodes() {
            let Ok(attrs) = topo.node(node) else { return false };
            if !attrs.has_middlebox {
                continue;
            }
            while next < chain.len() && attrs.supports(&chain[next]) {
                next += 1;
            }
            if next == chain.len() {
                break;
            }
        }
        next == chain.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathId;
    use crate::topology::{generators::chain, NodeId};
    use crate::traffic::TrafficClassId;

    fn setup() -> (Topology, TrafficClass, Path) {
        let mut topo = chain(4);
        topo.set_middlebox(NodeId(1), true).unwrap();
        topo.set_service_types(NodeId(1), ["ids"]).unwrap();
        topo.set_middlebox(NodeId(2), true).unwrap();
        topo.set_service_types(NodeId(2), ["fw", "nat"]).unwrap();
        let class = TrafficClass::new(TrafficClassId(0), "web", NodeId(0), NodeId(3), 1.0, 1.0).unwrap();
        let path = Path::new(PathId { class: class.id(), index: 0 }, (0..4).map(NodeId));
        (topo, class, path)
    }

    fn with_chain(class: &TrafficClass, chain: &[&str]) -> TrafficClass {
        class.clone().with_services(chain.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_null_and_middlebox() {
        let (mut topo, class, path) = setup();
        assert!(NullPredicate.accepts(&class, &path, &topo));
        assert!(HasMiddlebox.accepts(&class, &path, &topo));

        topo.set_middlebox(NodeId(1), false).unwrap();
        topo.set_middlebox(NodeId(2), false).unwrap();
        assert!(!HasMiddlebox.accepts(&class, &path, &topo));
    }

    #[test]
    fn test_service_chain_order_matters() {
        let (topo, class, path) = setup();
        assert!(ServiceChain.accepts(&class, &path, &topo));
        assert!(ServiceChain.accepts(&with_chain(&class, &["ids", "fw"]), &path, &topo));
        assert!(ServiceChain.accepts(&with_chain(&class, &["ids", "fw", "nat"]), &path, &topo));
        assert!(!ServiceChain.accepts(&with_chain(&class, &["fw", "ids"]), &path, &topo));
        assert!(!ServiceChain.accepts(&with_chain(&class, &["dpi"]), &path, &topo));
    }

    #[test]
    fn test_closure_predicate() {
        let (topo, class, path) = setup();
        let short = |_: &TrafficClass, p: &Path, _: &Topology| p.hops() <= 2;
        assert!(!short.accepts(&class, &path, &topo));
    }
}
