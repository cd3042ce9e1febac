//! Defines the error type for building an optimization program.
use crate::solver::VarKey;
use crate::topology::{LinkId, NodeId, TopologyError};
use crate::traffic::TrafficClassId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulationError {
    #[error("Traffic class {0} has no candidate paths")]
    NoCandidatePaths(TrafficClassId),
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Unknown link {0}")]
    UnknownLink(LinkId),
    #[error("Step '{step}' needs {what}, which have not been declared")]
    MissingVariables { step: &'static str, what: &'static str },
    #[error("Variable {0} is already declared")]
    DuplicateVariable(VarKey),
    #[error("An objective is already set")]
    ObjectiveAlreadySet,
    #[error("No objective has been set")]
    NoObjective,
    #[error("The program has already been handed to the solver")]
    AlreadySolved,
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error(transparent)]
    Topology(TopologyError),
}
