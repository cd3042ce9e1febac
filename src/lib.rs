//! Traffic-engineering optimization core.
//!
//! Builds a routing program from a topology, provisioned traffic classes and their candidate
//! paths, then solves it for a cost or power objective under link capacity and
//! active-node limits. Data flows one way:
//! topology -> traffic -> path -> formulation -> solver.

pub mod config;
pub mod error;
pub mod formulation;
pub mod path;
pub mod scenario;
pub mod solver;
pub mod topology;
pub mod traffic;

pub use config::{ConfigError, ScenarioConfig};
pub use error::{Error, Result};
pub use formulation::{get_optimization, BinaryKind, ObjectiveTemplate, Optimization};
pub use scenario::{run, Outcome};
pub use solver::{MicroLpBackend, SolveError, SolverBackend};
pub use topology::{LinkId, NodeId, Topology};
pub use traffic::{TrafficClass, TrafficClassId};
