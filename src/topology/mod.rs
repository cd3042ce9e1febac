//! Defines the network topology: nodes, directed links and their attributes.
pub mod error;
pub mod generators;
pub mod graph;
pub mod types;

// Re-export key types for convenient access
pub use error::TopologyError;
pub use generators::{diameter, hop_limit};
pub use graph::Topology;
pub use types::{LinkAttrs, LinkId, NodeAttrs, NodeId};
