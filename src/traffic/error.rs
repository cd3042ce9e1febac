//! Defines the error type for traffic provisioning.
use crate::topology::{NodeId, TopologyError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrafficError {
    #[error("No ingress-egress pairs to distribute traffic over")]
    NoPairs,
    #[error("Invalid traffic volume {0}: must be finite and non-negative")]
    InvalidVolume(f64),
    #[error("Invalid oversubscription factor {0}: must be finite and positive")]
    InvalidOversubscription(f64),
    #[error("Ingress and egress must differ (both are {0})")]
    SameIngressEgress(NodeId),
    #[error("Traffic class '{0}' has a weight but no flow size, or the other way round")]
    InconsistentClassTables(String),
    #[error("Pair {src} -> {dst} is missing from the traffic matrix")]
    MissingMatrixEntry { src: NodeId, dst: NodeId },
    #[error("Destination {dst} is unreachable from {src}")]
    Unreachable { src: NodeId, dst: NodeId },
    #[error(transparent)]
    Topology(#[from] TopologyError),
}
