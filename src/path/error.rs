//! Defines the error type for path generation.
use super::path::PathId;
use crate::topology::NodeId;
use crate::traffic::TrafficClassId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Traffic class {class} references node {node}, which is not in the topology")]
    UnknownEndpoint { class: TrafficClassId, node: NodeId },
    #[error("Traffic class {0} appears more than once")]
    DuplicateClass(TrafficClassId),
    #[error("Path {path} does not connect the endpoints of traffic class {class}")]
    ForeignPath { class: TrafficClassId, path: PathId },
    #[error("Path {0} needs at least two nodes, got {1}")]
    TooShort(PathId, usize),
}
