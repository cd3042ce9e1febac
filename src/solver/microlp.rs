//! microlp.rs
//! `SolverBackend` over `good_lp` with the pure-Rust microlp solver.

use super::error::SolveError;
use super::problem::{Domain, LinearExpr, Program, Relation, Sense, Solution};
use super::SolverBackend;
use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, IntoAffineExpression, ProblemVariables, ResolutionError, Solution as _,
    SolverModel, Variable, VariableDefinition,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MicroLpBackend {
    pub fn new() -> Self { Self }
}

impl SolverBackend for MicroLpBackend {
    fn name(&self) -> &str { "microlp" }

    fn solve(&self, program: &Program) -> Result<Solution, SolveError> {
        // 1. Columns
        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = program.variables.iter().map(|d| vars.add(definition(&d.domain))).collect();

        // 2. Objective
        let objective = to_expression(&program.objective.expr, &columns);
        let unsolved = match program.objective.sense {
            Sense::Minimize => vars.minimise(objective),
            Sense::Maximize => vars.maximise(objective),
        };
        let mut model = unsolved.using(microlp);

        // 3. Rows
        for c in &program.constraints {
            let lhs = to_expression(&c.expr, &columns);
            let rhs = c.rhs;
            let row = match c.relation {
                Relation::Le => constraint!(lhs <= rhs),
                Relation::Eq => constraint!(lhs == rhs),
                Relation::Ge => constraint!(lhs >= rhs),
            };
            model.add_constraint(row);
        }

        // 4. Solve and read back in column order
        let solved = model.solve().map_err(SolveError::from)?;
        let values: Vec<f64> = columns.iter().map(|&v| solved.value(v)).collect();
        let objective = program.objective.expr.eval(&values);
        Ok(Solution { objective, values })
    }
}

fn definition(domain: &Domain) -> VariableDefinition {
    match *domain {
        Domain::Binary => variable().binary(),
        Domain::Continuous { lower, upper: Some(upper) } => variable().min(lower).max(upper),
        Domain::Continuous { lower, upper: None } => variable().min(lower),
    }
}

fn to_expression(expr: &LinearExpr, columns: &[Variable]) -> Expression {
    expr.terms()
        .fold(expr.constant().into_expression(), |acc, (var, coef)| acc + coef * Expression::from(columns[var.index()]))
}

impl From<ResolutionError> for SolveError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => SolveError::Infeasible,
            ResolutionError::Unbounded => SolveError::Unbounded,
            other => SolveError::Backend(other.to_string()),
        }
    }
}
