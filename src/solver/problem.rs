//! problem.rs
//! The linear / mixed-integer program handed to a solver backend, and the assignment it returns.

use crate::path::PathId;
use crate::topology::{LinkId, NodeId};
use crate::traffic::TrafficClassId;
use std::collections::BTreeMap;
use std::fmt;

/// Dense column index of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarIndex(pub u32);

impl VarIndex {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
}

/// Identity of a decision variable: its kind plus the path, node or link it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarKey {
    /// Fraction of a class's demand carried on a path.
    Flow(PathId),
    /// Whether a path carries any flow.
    PathUsed(PathId),
    /// Whether a node is powered on.
    NodeActive(NodeId),
    /// Whether a link is powered on.
    LinkActive(LinkId),
    /// Highest link utilization, used by the min-max load objective.
    MaxLinkLoad,
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKey::Flow(p) => write!(f, "x_{p}"),
            VarKey::PathUsed(p) => write!(f, "bp_{p}"),
            VarKey::NodeActive(n) => write!(f, "bn_{n}"),
            VarKey::LinkActive(l) => write!(f, "bl_{l}"),
            VarKey::MaxLinkLoad => write!(f, "max_link_load"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    Continuous { lower: f64, upper: Option<f64> },
    Binary,
}

impl Domain {
    pub const FRACTION: Domain = Domain::Continuous { lower: 0.0, upper: Some(1.0) };
    pub const NON_NEGATIVE: Domain = Domain::Continuous { lower: 0.0, upper: None };
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub key: VarKey,
    pub domain: Domain,
}

/// `Σ coefficient * variable + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<VarIndex, f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self { Self::default() }

    pub fn with_term(mut self, var: VarIndex, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    /// Adds `coefficient * var`, merging with an existing term for the same variable.
    pub fn add_term(&mut self, var: VarIndex, coefficient: f64) {
        *self.terms.entry(var).or_insert(0.0) += coefficient;
    }

    pub fn add_constant(&mut self, constant: f64) { self.constant += constant; }

    pub fn extend(&mut self, other: &LinearExpr) {
        for (&var, &coef) in &other.terms {
            self.add_term(var, coef);
        }
        self.constant += other.constant;
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarIndex, f64)> + '_ {
        self.terms.iter().map(|(v, c)| (*v, *c))
    }

    pub fn constant(&self) -> f64 { self.constant }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
    pub fn len(&self) -> usize { self.terms.len() }

    /// Evaluates the expression against one value per declared variable.
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Le => "<=",
            Relation::Eq => "==",
            Relation::Ge => ">=",
        })
    }
}

/// What a constraint is for. Used in logs and violation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintTag {
    FlowAllocation(TrafficClassId),
    RouteLink(PathId),
    NodeLink { path: PathId, node: NodeId },
    LinkLink { path: PathId, link: LinkId },
    Capacity(LinkId),
    RequiredNodes,
    NodeBudget,
    LinkBudget,
    MaxLinkLoad(LinkId),
}

impl fmt::Display for ConstraintTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintTag::FlowAllocation(tc) => write!(f, "allocation[{tc}]"),
            ConstraintTag::RouteLink(p) => write!(f, "route[{p}]"),
            ConstraintTag::NodeLink { path, node } => write!(f, "node_link[{path},{node}]"),
            ConstraintTag::LinkLink { path, link } => write!(f, "link_link[{path},{link}]"),
            ConstraintTag::Capacity(l) => write!(f, "capacity[{l}]"),
            ConstraintTag::RequiredNodes => write!(f, "required_nodes"),
            ConstraintTag::NodeBudget => write!(f, "node_budget"),
            ConstraintTag::LinkBudget => write!(f, "link_budget"),
            ConstraintTag::MaxLinkLoad(l) => write!(f, "max_link_load[{l}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub tag: ConstraintTag,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(tag: ConstraintTag, expr: LinearExpr, relation: Relation, rhs: f64) -> Self {
        Self { tag, expr, relation, rhs }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.eval(values);
        match self.relation {
            Relation::Le => lhs <= self.rhs + tolerance,
            Relation::Eq => (lhs - self.rhs).abs() <= tolerance,
            Relation::Ge => lhs >= self.rhs - tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

/// A program in standard form: variables with domains, linear constraints, one objective.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub variables: Vec<VarDecl>,
    pub constraints: Vec<Constraint>,
    pub objective: Objective,
}

impl Program {
    pub fn rows(&self) -> usize { self.constraints.len() }
    pub fn cols(&self) -> usize { self.variables.len() }

    /// Constraints the assignment breaks by more than `tolerance`.
    pub fn violations(&self, solution: &Solution, tolerance: f64) -> Vec<ConstraintTag> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(&solution.values, tolerance))
            .map(|c| c.tag)
            .collect()
    }
}

/// The backend's answer: objective value plus one value per declared variable, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub objective: f64,
    pub values: Vec<f64>,
}

impl Solution {
    pub fn value(&self, var: VarIndex) -> Option<f64> { self.values.get(var.index()).copied() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_merges_terms_and_evaluates() {
        let mut e = LinearExpr::new().with_term(VarIndex(0), 2.0).with_term(VarIndex(2), -1.0);
        e.add_term(VarIndex(0), 1.5);
        e.add_constant(4.0);
        assert_eq!(e.len(), 2);
        assert_eq!(e.eval(&[1.0, 100.0, 3.0]), 3.5 - 3.0 + 4.0);
    }

    #[test]
    fn test_constraint_satisfaction_with_tolerance() {
        let expr = LinearExpr::new().with_term(VarIndex(0), 1.0).with_term(VarIndex(1), 1.0);
        let eq = Constraint::new(ConstraintTag::RequiredNodes, expr.clone(), Relation::Eq, 1.0);
        assert!(eq.is_satisfied(&[0.4, 0.6000001], 1e-6));
        assert!(!eq.is_satisfied(&[0.4, 0.5], 1e-6));

        let le = Constraint::new(ConstraintTag::NodeBudget, expr, Relation::Le, 1.0);
        assert!(le.is_satisfied(&[0.0, 0.0], 1e-9));
        assert!(!le.is_satisfied(&[1.0, 1.0], 1e-9));
    }

    #[test]
    fn test_violations_report_tags() {
        let x = VarIndex(0);
        let program = Program {
            variables: vec![VarDecl { key: VarKey::MaxLinkLoad, domain: Domain::NON_NEGATIVE }],
            constraints: vec![
                Constraint::new(ConstraintTag::NodeBudget, LinearExpr::new().with_term(x, 1.0), Relation::Le, 2.0),
                Constraint::new(ConstraintTag::RequiredNodes, LinearExpr::new().with_term(x, 1.0), Relation::Ge, 5.0),
            ],
            objective: Objective { sense: Sense::Minimize, expr: LinearExpr::new().with_term(x, 1.0) },
        };
        let solution = Solution { objective: 3.0, values: vec![3.0] };
        assert_eq!(program.violations(&solution, 1e-9), vec![ConstraintTag::NodeBudget, ConstraintTag::RequiredNodes]);
    }

    #[test]
    fn test_var_key_display() {
        let p = PathId { class: TrafficClassId(2), index: 1 };
        assert_eq!(VarKey::Flow(p).to_string(), "x_tc2/p1");
        assert_eq!(VarKey::NodeActive(NodeId(4)).to_string(), "bn_n4");
        assert_eq!(VarKey::LinkActive(LinkId::new(NodeId(0), NodeId(1))).to_string(), "bl_n0->n1");
    }
}
