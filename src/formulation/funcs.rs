//! Modeling knobs: how capacity rows are scaled, which nodes a path powers on,
//! and whether indicators are integral.

use crate::path::Path;
use crate::solver::Domain;
use crate::topology::NodeId;
use crate::traffic::TrafficClass;
use serde::{Deserialize, Serialize};

/// Per-link resource accounting for `cap_links`.
///
/// A row reads `Σ coefficient(class, capacity) × Flow ≤ bound(capacity)`.
pub trait CapacityAccounting {
    fn coefficient(&self, class: &TrafficClass, capacity: f64) -> f64;
    fn bound(&self, capacity: f64) -> f64;
}

/// Raw demand against raw capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNormalize;

impl CapacityAccounting for NoNormalize {
    fn coefficient(&self, class: &TrafficClass, _capacity: f64) -> f64 { class.demand() }
    fn bound(&self, capacity: f64) -> f64 { capacity }
}

/// Demand as a fraction of capacity, bounded by 1. A zero-capacity link admits no demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl CapacityAccounting for Normalize {
    fn coefficient(&self, class: &TrafficClass, capacity: f64) -> f64 {
        if capacity > 0.0 { class.demand() / capacity } else { class.demand() }
    }
    fn bound(&self, capacity: f64) -> f64 { if capacity > 0.0 { 1.0 } else { 0.0 } }
}

/// Serializable selector for the two built-in accountings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Accounting {
    #[default]
    NoNormalize,
    Normalize,
}

impl Accounting {
    pub fn as_dyn(&self) -> &'static dyn CapacityAccounting {
        match self {
            Accounting::NoNormalize => &NoNormalize,
            Accounting::Normalize => &Normalize,
        }
    }
}

/// Which nodes of a used path must be powered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeActivation {
    /// Intermediate nodes only. Endpoints host the traffic source and sink.
    #[default]
    TransitOnly,
    AllOnPath,
}

impl NodeActivation {
    pub fn nodes<'p>(&self, path: &'p Path) -> &'p [NodeId] {
        match self {
            NodeActivation::TransitOnly => path.transit_nodes(),
            NodeActivation::AllOnPath => path.nodes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorDomain {
    #[default]
    Binary,
    /// Continuous in `[0, 1]`: the LP relaxation.
    Relaxed,
}

impl IndicatorDomain {
    pub fn domain(&self) -> Domain {
        match self {
            IndicatorDomain::Binary => Domain::Binary,
            IndicatorDomain::Relaxed => Domain::FRACTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathId;
    use crate::traffic::TrafficClassId;

    #[test]
    fn test_accountings() {
        let tc = TrafficClass::new(TrafficClassId(0), "all", NodeId(0), NodeId(1), 50.0, 1.0).unwrap();
        assert_eq!(NoNormalize.coefficient(&tc, 200.0), 50.0);
        assert_eq!(NoNormalize.bound(200.0), 200.0);
        assert_eq!(Normalize.coefficient(&tc, 200.0), 0.25);
        assert_eq!(Normalize.bound(200.0), 1.0);
        assert_eq!(Normalize.bound(0.0), 0.0);
    }

    #[test]
    fn test_activation_policy() {
        let id = PathId { class: TrafficClassId(0), index: 0 };
        let p = Path::new(id, [NodeId(0), NodeId(4), NodeId(1)]);
        assert_eq!(NodeActivation::TransitOnly.nodes(&p), &[NodeId(4)]);
        assert_eq!(NodeActivation::AllOnPath.nodes(&p).len(), 3);
    }

    #[test]
    fn test_serde_names() {
        let a: NodeActivation = serde_json::from_str("\"all-on-path\"").unwrap();
        assert_eq!(a, NodeActivation::AllOnPath);
        let d: IndicatorDomain = serde_json::from_str("\"relaxed\"").unwrap();
        assert_eq!(d.domain(), Domain::FRACTION);
    }
}
