//! Hands a built program to a numeric backend and returns the assignment.
pub mod error;
pub mod microlp;
pub mod problem;

pub use error::SolveError;
pub use microlp::MicroLpBackend;
pub use problem::{
    Constraint, ConstraintTag, Domain, LinearExpr, Objective, Program, Relation, Sense, Solution, VarDecl,
    VarIndex, VarKey,
};

/// A numeric optimizer. Blocks until it has an answer; no retries, no cancellation.
pub trait SolverBackend {
    fn name(&self) -> &str;
    fn solve(&self, program: &Program) -> Result<Solution, SolveError>;
}
