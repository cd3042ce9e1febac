//! Builds the routing optimization program from candidate paths, step by step.
pub mod builder;
pub mod error;
pub mod funcs;
pub mod objective;
pub mod vars;

pub use builder::{BinaryKind, FormulationOptions, Optimization};
pub use error::FormulationError;
pub use funcs::{Accounting, CapacityAccounting, IndicatorDomain, NodeActivation, NoNormalize, Normalize};
pub use objective::{ObjectiveTemplate, PowerCosts};
pub use vars::VariableTable;

/// A fresh optimization backed by the built-in microlp solver.
pub fn get_optimization() -> Optimization { Optimization::default() }
