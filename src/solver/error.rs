//! Defines the error type for solving.
use super::problem::VarKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("The problem is infeasible")]
    Infeasible,
    #[error("The problem is unbounded")]
    Unbounded,
    #[error("Solver backend failed: {0}")]
    Backend(String),
    #[error("No successful solve yet")]
    NotSolved,
    #[error("Variable {0} is not part of the solved program")]
    UnknownVariable(VarKey),
}
