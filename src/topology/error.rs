//! Defines the error type for topology lookups and mutations.
use super::types::{LinkId, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Unknown link {0}")]
    UnknownLink(LinkId),
    #[error("Node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("Self-loop on node {0} is not allowed")]
    SelfLoop(NodeId),
    #[error("Topology '{name}' is not strongly connected")]
    Disconnected { name: String },
}
