//! Defines the `TrafficClass`, an aggregate demand between one ingress and one egress node.

use super::error::TrafficError;
use crate::topology::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a traffic class, assigned in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TrafficClassId(pub u32);

impl TrafficClassId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
}

impl fmt::Display for TrafficClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tc{}", self.0)
    }
}

/// An immutable source-destination aggregate with a volume and a service requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficClass {
    id: TrafficClassId,
    name: String,
    src: NodeId,
    dst: NodeId,
    demand: f64,
    flow_size: f64,
    services: Vec<String>,
}

impl TrafficClass {
    pub fn new(
        id: TrafficClassId,
        name: impl Into<String>,
        src: NodeId,
        dst: NodeId,
        demand: f64,
        flow_size: f64,
    ) -> Result<Self, TrafficError> {
        if src == dst {
            return Err(TrafficError::SameIngressEgress(src));
        }
        if !demand.is_finite() || demand < 0.0 {
            return Err(TrafficError::InvalidVolume(demand));
        }
        Ok(Self { id, name: name.into(), src, dst, demand, flow_size, services: Vec::new() })
    }

    /// Sets the ordered chain of service types this traffic must traverse.
    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    pub fn id(&self) -> TrafficClassId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn src(&self) -> NodeId { self.src }
    pub fn dst(&self) -> NodeId { self.dst }
    /// Demand volume (flows) carried by this class.
    pub fn demand(&self) -> f64 { self.demand }
    pub fn flow_size(&self) -> f64 { self.flow_size }
    pub fn services(&self) -> &[String] { &self.services }

    /// Demand expressed in bytes.
    pub fn bytes(&self) -> f64 { self.demand * self.flow_size }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' {}->{} ({})", self.id, self.name, self.src, self.dst, self.demand)
    }
}
