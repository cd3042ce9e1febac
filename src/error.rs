//! Crate-level error: every stage's error, kept distinct.
use crate::config::ConfigError;
use crate::formulation::FormulationError;
use crate::path::PathError;
use crate::solver::SolveError;
use crate::topology::TopologyError;
use crate::traffic::TrafficError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Traffic(#[from] TrafficError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Formulation(#[from] FormulationError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

impl Error {
    /// The model was well-formed but admits no feasible routing.
    pub fn is_infeasible(&self) -> bool { matches!(self, Error::Solve(SolveError::Infeasible)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
