//! builder.rs
//! `Optimization` accumulates variables, constraints and one objective, then hands the
//! program to its backend exactly once.

use super::error::FormulationError;
use super::funcs::{CapacityAccounting, IndicatorDomain, NodeActivation};
use super::objective::{self, lookup_error, ObjectiveTemplate};
use super::vars::VariableTable;
use crate::error::Error;
use crate::path::{PathId, PathsPerClass};
use crate::solver::{
    Constraint, ConstraintTag, Domain, LinearExpr, MicroLpBackend, Objective, Program, Relation, Sense, Solution,
    SolveError, SolverBackend, VarIndex, VarKey,
};
use crate::topology::{LinkId, NodeId, Topology};
use crate::traffic::TrafficClassId;
use std::collections::BTreeMap;

/// Absolute slack allowed when re-checking the backend's answer.
const VERIFY_TOLERANCE: f64 = 1e-6;
/// Indicator and flow values above this count as "on".
const ACTIVE_THRESHOLD: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    Path,
    Node,
    Link,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormulationOptions {
    pub indicators: IndicatorDomain,
    pub node_activation: NodeActivation,
}

pub struct Optimization {
    options: FormulationOptions,
    vars: VariableTable,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    backend: Box<dyn SolverBackend>,
    solution: Option<Solution>,
    violations: Vec<ConstraintTag>,
    consumed: bool,
}

impl Default for Optimization {
    fn default() -> Self { Self::new(Box::new(MicroLpBackend)) }
}

impl Optimization {
    pub fn new(backend: Box<dyn SolverBackend>) -> Self { Self::with_options(backend, FormulationOptions::default()) }

    pub fn with_options(backend: Box<dyn SolverBackend>, options: FormulationOptions) -> Self {
        Self {
            options,
            vars: VariableTable::new(),
            constraints: Vec::new(),
            objective: None,
            backend,
            solution: None,
            violations: Vec::new(),
            consumed: false,
        }
    }

    pub fn options(&self) -> FormulationOptions { self.options }
    pub fn num_variables(&self) -> usize { self.vars.len() }
    pub fn num_constraints(&self) -> usize { self.constraints.len() }
    pub fn variables(&self) -> &VariableTable { &self.vars }
    pub fn constraints(&self) -> &[Constraint] { &self.constraints }

    // --- Variables ---

    /// One flow fraction in `[0, 1]` per candidate path.
    pub fn add_decision_vars(&mut self, pptc: &PathsPerClass) -> Result<(), FormulationError> {
        self.ensure_open()?;
        if let Some(&class) = pptc.unroutable().first() {
            return Err(FormulationError::NoCandidatePaths(class));
        }
        let before = self.vars.len();
        for (_, path) in pptc.all_paths() {
            self.vars.declare(VarKey::Flow(path.id()), Domain::FRACTION)?;
        }
        log::debug!("add_decision_vars: {} flow variables", self.vars.len() - before);
        Ok(())
    }

    /// Declares path, node and/or link indicators and links them to path usage.
    ///
    /// Node and link indicators are tied to path indicators with `PathUsed <= NodeActive(n)` for
    /// each node the activation policy counts, and `PathUsed <= LinkActive(l)` for each link,
    /// so path indicators must exist (declared now or earlier).
    pub fn add_binary_vars(
        &mut self,
        pptc: &PathsPerClass,
        topo: &Topology,
        kinds: &[BinaryKind],
    ) -> Result<(), FormulationError> {
        self.ensure_open()?;
        let domain = self.options.indicators.domain();
        let activation = self.options.node_activation;
        let (vars_before, rows_before) = (self.vars.len(), self.constraints.len());

        // 1. Declarations
        if kinds.contains(&BinaryKind::Path) {
            for (_, path) in pptc.all_paths() {
                self.vars.declare(VarKey::PathUsed(path.id()), domain)?;
            }
        }
        let with_nodes = kinds.contains(&BinaryKind::Node);
        if with_nodes {
            for node in topo.node_ids() {
                self.vars.declare(VarKey::NodeActive(node), domain)?;
            }
        }
        let with_links = kinds.contains(&BinaryKind::Link);
        if with_links {
            for (link, _) in topo.links() {
                self.vars.declare(VarKey::LinkActive(link), domain)?;
            }
        }

        // 2. Linking rows
        if with_nodes || with_links {
            for (_, path) in pptc.all_paths() {
                let used = self.vars.require(&VarKey::PathUsed(path.id()), "add_binary_vars", "path indicators")?;
                if with_nodes {
                    for &node in activation.nodes(path) {
                        let active = self.vars.get(&VarKey::NodeActive(node)).ok_or(FormulationError::UnknownNode(node))?;
                        self.push_link_row(ConstraintTag::NodeLink { path: path.id(), node }, used, active);
                    }
                }
                if with_links {
                    for link in path.links() {
                        let active = self.vars.get(&VarKey::LinkActive(link)).ok_or(FormulationError::UnknownLink(link))?;
                        self.push_link_row(ConstraintTag::LinkLink { path: path.id(), link }, used, active);
                    }
                }
            }
        }
        log::debug!(
            "add_binary_vars {kinds:?}: {} indicators, {} linking rows",
            self.vars.len() - vars_before,
            self.constraints.len() - rows_before
        );
        Ok(())
    }

    // --- Constraints ---

    /// Per class, the flow fractions over its paths sum to one.
    pub fn allocate_flow(&mut self, pptc: &PathsPerClass) -> Result<(), FormulationError> {
        self.ensure_open()?;
        let before = self.constraints.len();
        for (class, paths) in pptc.iter() {
            if paths.is_empty() {
                return Err(FormulationError::NoCandidatePaths(class.id()));
            }
            let mut expr = LinearExpr::new();
            for path in paths {
                expr.add_term(self.flow(path.id(), "allocate_flow")?, 1.0);
            }
            self.constraints.push(Constraint::new(ConstraintTag::FlowAllocation(class.id()), expr, Relation::Eq, 1.0));
        }
        log::debug!("allocate_flow: {} rows", self.constraints.len() - before);
        Ok(())
    }

    /// Per path, flow may only be positive on a used path: `Flow <= PathUsed`.
    pub fn route_all(&mut self, pptc: &PathsPerClass) -> Result<(), FormulationError> {
        self.ensure_open()?;
        let before = self.constraints.len();
        for (_, path) in pptc.all_paths() {
            let flow = self.flow(path.id(), "route_all")?;
            let used = self.vars.require(&VarKey::PathUsed(path.id()), "route_all", "path indicators")?;
            self.push_link_row(ConstraintTag::RouteLink(path.id()), flow, used);
        }
        log::debug!("route_all: {} rows", self.constraints.len() - before);
        Ok(())
    }

    /// One capacity row per capacitated link that some candidate path traverses.
    pub fn cap_links(
        &mut self,
        pptc: &PathsPerClass,
        topo: &Topology,
        capacities: &BTreeMap<LinkId, f64>,
        accounting: &dyn CapacityAccounting,
    ) -> Result<(), FormulationError> {
        self.ensure_open()?;
        for (&link, &cap) in capacities {
            if !topo.has_link(link) {
                return Err(FormulationError::UnknownLink(link));
            }
            if !cap.is_finite() || cap < 0.0 {
                return Err(FormulationError::InvalidParameter { name: "link capacity", value: cap });
            }
        }

        let mut rows: BTreeMap<LinkId, (f64, LinearExpr)> = BTreeMap::new();
        for (class, path) in pptc.all_paths() {
            let flow = self.flow(path.id(), "cap_links")?;
            for link in path.links() {
                if let Some(&cap) = capacities.get(&link) {
                    rows.entry(link)
                        .or_insert_with(|| (cap, LinearExpr::new()))
                        .1
                        .add_term(flow, accounting.coefficient(class, cap));
                }
            }
        }
        let count = rows.len();
        for (link, (cap, expr)) in rows {
            self.constraints.push(Constraint::new(ConstraintTag::Capacity(link), expr, Relation::Le, accounting.bound(cap)));
        }
        log::debug!("cap_links: {count} rows for {} capacitated links", capacities.len());
        Ok(())
    }

    /// At least `some` of `nodes` (every node with an indicator when `None`) are active.
    pub fn req_some_nodes(&mut self, some: usize, nodes: Option<&[NodeId]>) -> Result<(), FormulationError> {
        self.ensure_open()?;
        if !self.vars.any(|k| matches!(k, VarKey::NodeActive(_))) {
            return Err(FormulationError::MissingVariables { step: "req_some_nodes", what: "node indicators" });
        }
        let chosen: Vec<VarIndex> = match nodes {
            Some(nodes) => nodes
                .iter()
                .map(|&n| self.vars.get(&VarKey::NodeActive(n)).ok_or(FormulationError::UnknownNode(n)))
                .collect::<Result<_, _>>()?,
            None => self
                .vars
                .iter()
                .filter(|(_, k)| matches!(k, VarKey::NodeActive(_)))
                .map(|(idx, _)| idx)
                .collect(),
        };
        let mut expr = LinearExpr::new();
        for idx in chosen {
            expr.add_term(idx, 1.0);
        }
        log::debug!("req_some_nodes: at least {some} of {} nodes", expr.len());
        self.constraints.push(Constraint::new(ConstraintTag::RequiredNodes, expr, Relation::Ge, some as f64));
        Ok(())
    }

    /// Every node in `nodes` is active.
    pub fn req_all_nodes(&mut self, nodes: &[NodeId]) -> Result<(), FormulationError> {
        self.req_some_nodes(nodes.len(), Some(nodes))
    }

    /// `Σ cost(n) × NodeActive(n) <= budget` over every topology node.
    pub fn add_node_budget<F>(&mut self, topo: &Topology, cost: F, budget: f64) -> Result<(), FormulationError>
    where
        F: Fn(NodeId) -> f64,
    {
        self.ensure_open()?;
        check_budget(budget)?;
        let mut expr = LinearExpr::new();
        for node in topo.node_ids() {
            let active = self.vars.require(&VarKey::NodeActive(node), "add_node_budget", "node indicators")?;
            expr.add_term(active, cost(node));
        }
        log::debug!("add_node_budget: {} nodes, budget {budget}", expr.len());
        self.constraints.push(Constraint::new(ConstraintTag::NodeBudget, expr, Relation::Le, budget));
        Ok(())
    }

    /// `Σ cost(l) × LinkActive(l) <= budget` over every topology link.
    pub fn add_link_budget<F>(&mut self, topo: &Topology, cost: F, budget: f64) -> Result<(), FormulationError>
    where
        F: Fn(LinkId) -> f64,
    {
        self.ensure_open()?;
        check_budget(budget)?;
        let mut expr = LinearExpr::new();
        for (link, _) in topo.links() {
            let active = self.vars.require(&VarKey::LinkActive(link), "add_link_budget", "link indicators")?;
            expr.add_term(active, cost(link));
        }
        log::debug!("add_link_budget: {} links, budget {budget}", expr.len());
        self.constraints.push(Constraint::new(ConstraintTag::LinkBudget, expr, Relation::Le, budget));
        Ok(())
    }

    // --- Objective ---

    pub fn set_predef_objective(
        &mut self,
        template: &ObjectiveTemplate,
        pptc: &PathsPerClass,
        topo: &Topology,
    ) -> Result<(), FormulationError> {
        self.ensure_open()?;
        if self.objective.is_some() {
            return Err(FormulationError::ObjectiveAlreadySet);
        }
        let expr = match template {
            ObjectiveTemplate::MinRoutingCost => objective::routing_cost(&self.vars, pptc, topo)?,
            ObjectiveTemplate::MinRoutingCostWithPower(costs) => {
                let mut expr = objective::routing_cost(&self.vars, pptc, topo)?;
                expr.extend(&objective::power(&self.vars, topo, costs)?);
                expr
            }
            ObjectiveTemplate::MinPower(costs) => objective::power(&self.vars, topo, costs)?,
            ObjectiveTemplate::MinMaxLinkLoad => self.max_link_load(pptc, topo)?,
        };
        log::debug!("Objective '{}' over {} terms", template.name(), expr.len());
        self.objective = Some(Objective { sense: Sense::Minimize, expr });
        Ok(())
    }

    /// Adds `MaxLinkLoad` and `Σ demand × Flow <= MaxLinkLoad × capacity` per traversed,
    /// capacitated link. Returns the objective `MaxLinkLoad`.
    fn max_link_load(&mut self, pptc: &PathsPerClass, topo: &Topology) -> Result<LinearExpr, FormulationError> {
        let mut rows: BTreeMap<LinkId, (f64, LinearExpr)> = BTreeMap::new();
        for (class, path) in pptc.all_paths() {
            let flow = self.flow(path.id(), "objective")?;
            for link in path.links() {
                if let Some(cap) = topo.link(link).map_err(lookup_error)?.capacity {
                    rows.entry(link)
                        .or_insert_with(|| (cap, LinearExpr::new()))
                        .1
                        .add_term(flow, class.demand());
                }
            }
        }
        if rows.is_empty() {
            return Err(FormulationError::MissingVariables { step: "objective", what: "capacitated links" });
        }

        let load = self.vars.declare(VarKey::MaxLinkLoad, Domain::NON_NEGATIVE)?;
        for (link, (cap, mut expr)) in rows {
            expr.add_term(load, -cap);
            self.constraints.push(Constraint::new(ConstraintTag::MaxLinkLoad(link), expr, Relation::Le, 0.0));
        }
        Ok(LinearExpr::new().with_term(load, 1.0))
    }

    // --- Solve ---

    /// Hands the program to the backend. The program is consumed whatever the outcome.
    pub fn solve(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        let objective = self.objective.take().ok_or(FormulationError::NoObjective)?;
        self.consumed = true;
        let program = Program {
            variables: self.vars.decls().to_vec(),
            constraints: std::mem::take(&mut self.constraints),
            objective,
        };
        log::info!("Solving {} rows x {} columns with {}", program.rows(), program.cols(), self.backend.name());

        let solution = self.backend.solve(&program)?;
        self.violations = program.violations(&solution, VERIFY_TOLERANCE);
        if let Some(first) = self.violations.first() {
            log::warn!("Solution violates {} constraints, first: {first}", self.violations.len());
        }
        log::info!("Solved, objective {}", solution.objective);
        self.solution = Some(solution);
        Ok(())
    }

    pub fn solution(&self) -> Result<&Solution, SolveError> { self.solution.as_ref().ok_or(SolveError::NotSolved) }

    pub fn solved_objective(&self) -> Result<f64, SolveError> { Ok(self.solution()?.objective) }

    pub fn solved_value(&self, key: &VarKey) -> Result<f64, SolveError> {
        let solution = self.solution()?;
        self.vars.get(key).and_then(|idx| solution.value(idx)).ok_or(SolveError::UnknownVariable(*key))
    }

    /// `(path, fraction)` for every candidate path of `class`, in path order.
    pub fn flow_fractions(&self, class: TrafficClassId) -> Result<Vec<(PathId, f64)>, SolveError> {
        let solution = self.solution()?;
        Ok(self
            .vars
            .iter()
            .filter_map(|(idx, key)| match key {
                VarKey::Flow(p) if p.class == class => solution.value(idx).map(|v| (*p, v)),
                _ => None,
            })
            .collect())
    }

    /// Paths carrying a positive share of their class's demand.
    pub fn used_paths(&self) -> Result<Vec<PathId>, SolveError> {
        let solution = self.solution()?;
        Ok(self
            .vars
            .iter()
            .filter_map(|(idx, key)| match key {
                VarKey::Flow(p) if solution.value(idx).unwrap_or(0.0) > ACTIVE_THRESHOLD => Some(*p),
                _ => None,
            })
            .collect())
    }

    pub fn active_nodes(&self) -> Result<Vec<NodeId>, SolveError> {
        let solution = self.solution()?;
        Ok(self
            .vars
            .iter()
            .filter_map(|(idx, key)| match key {
                VarKey::NodeActive(n) if solution.value(idx).unwrap_or(0.0) > ACTIVE_THRESHOLD => Some(*n),
                _ => None,
            })
            .collect())
    }

    /// Constraints the last solution breaks beyond tolerance. Empty for a sound backend.
    pub fn violations(&self) -> &[ConstraintTag] { &self.violations }

    // --- Helpers ---

    #[inline(always)]
    fn ensure_open(&self) -> Result<(), FormulationError> {
        if self.consumed { Err(FormulationError::AlreadySolved) } else { Ok(()) }
    }

    #[inline(always)]
    fn flow(&self, path: PathId, step: &'static str) -> Result<VarIndex, FormulationError> {
        self.vars.require(&VarKey::Flow(path), step, "flow variables")
    }

    /// `lhs - rhs <= 0`
    fn push_link_row(&mut self, tag: ConstraintTag, lhs: VarIndex, rhs: VarIndex) {
        let expr = LinearExpr::new().with_term(lhs, 1.0).with_term(rhs, -1.0);
        self.constraints.push(Constraint::new(tag, expr, Relation::Le, 0.0));
    }
}

fn check_budget(budget: f64) -> Result<(), FormulationError> {
    if budget.is_finite() && budget >= 0.0 {
        Ok(())
    } else {
        Err(FormulationError::InvalidParameter { name: "budget", value: budget })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::funcs::{NoNormalize, Normalize};
    use crate::formulation::objective::PowerCosts;
    use crate::path::{generate_paths_per_class, NullPredicate};
    use crate::topology::generators::complete;
    use crate::traffic::TrafficClass;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn link(a: u32, b: u32) -> LinkId { LinkId::new(NodeId(a), NodeId(b)) }

    /// Complete graph on `n` nodes, one class n0 -> n{n-1} of demand 10, paths up to 2 hops.
    fn setup(n: usize) -> (Topology, PathsPerClass) {
        let topo = complete(n);
        let dst = NodeId::new(n - 1);
        let class = TrafficClass::new(TrafficClassId(0), "all", NodeId(0), dst, 10.0, 1.0).unwrap();
        let pptc = generate_paths_per_class(&topo, &[class], &NullPredicate, 2, 10).unwrap();
        (topo, pptc)
    }

    /// Backend that records the program and answers with all zeros, or fails.
    struct Recording {
        seen: Rc<RefCell<Option<Program>>>,
        fail: bool,
    }

    impl SolverBackend for Recording {
        fn name(&self) -> &str { "recording" }

        fn solve(&self, program: &Program) -> Result<Solution, SolveError> {
            *self.seen.borrow_mut() = Some(program.clone());
            if self.fail {
                return Err(SolveError::Backend("boom".to_string()));
            }
            Ok(Solution { objective: 0.0, values: vec![0.0; program.cols()] })
        }
    }

    fn count(opt: &Optimization, pred: impl Fn(&ConstraintTag) -> bool) -> usize {
        opt.constraints().iter().filter(|c| pred(&c.tag)).count()
    }

    #[test]
    fn test_decision_vars_per_path() {
        let (_, pptc) = setup(4);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        assert_eq!(opt.num_variables(), pptc.total_paths());
        assert_eq!(opt.add_decision_vars(&pptc).unwrap_err(), FormulationError::DuplicateVariable(VarKey::Flow(PathId { class: TrafficClassId(0), index: 0 })));
    }

    #[test]
    fn test_empty_class_is_a_configuration_error() {
        let topo = complete(3);
        let class = TrafficClass::new(TrafficClassId(3), "all", NodeId(0), NodeId(2), 1.0, 1.0).unwrap();
        let pptc = generate_paths_per_class(&topo, &[class], &|_: &TrafficClass, _: &crate::path::Path, _: &Topology| false, 2, 10).unwrap();
        let mut opt = Optimization::default();
        assert_eq!(opt.add_decision_vars(&pptc).unwrap_err(), FormulationError::NoCandidatePaths(TrafficClassId(3)));
    }

    #[rstest]
    #[case(NodeActivation::TransitOnly, 2)]
    #[case(NodeActivation::AllOnPath, 8)]
    fn test_node_linking_rows(#[case] activation: NodeActivation, #[case] expected: usize) {
        // Paths n0-n3, n0-n1-n3, n0-n2-n3
        let (topo, pptc) = setup(4);
        let options = FormulationOptions { node_activation: activation, ..Default::default() };
        let mut opt = Optimization::with_options(Box::new(MicroLpBackend), options);
        opt.add_decision_vars(&pptc).unwrap();
        opt.add_binary_vars(&pptc, &topo, &[BinaryKind::Node, BinaryKind::Path, BinaryKind::Link]).unwrap();
        assert_eq!(count(&opt, |t| matches!(t, ConstraintTag::NodeLink { .. })), expected);
        assert_eq!(count(&opt, |t| matches!(t, ConstraintTag::LinkLink { .. })), 5);
        assert_eq!(opt.num_variables(), 3 + 3 + 4 + 12);
    }

    #[test]
    fn test_node_indicators_need_path_indicators() {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        let err = opt.add_binary_vars(&pptc, &topo, &[BinaryKind::Node]).unwrap_err();
        assert!(matches!(err, FormulationError::MissingVariables { step: "add_binary_vars", .. }));
    }

    #[test]
    fn test_steps_need_their_variables() {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        assert!(matches!(opt.allocate_flow(&pptc), Err(FormulationError::MissingVariables { step: "allocate_flow", .. })));
        opt.add_decision_vars(&pptc).unwrap();
        assert!(matches!(opt.route_all(&pptc), Err(FormulationError::MissingVariables { step: "route_all", .. })));
        assert!(matches!(opt.req_some_nodes(1, None), Err(FormulationError::MissingVariables { .. })));
        assert!(matches!(opt.add_node_budget(&topo, |_| 1.0, 5.0), Err(FormulationError::MissingVariables { .. })));
        assert!(matches!(
            opt.set_predef_objective(&ObjectiveTemplate::MinPower(PowerCosts::uniform(1.0, 1.0)), &pptc, &topo),
            Err(FormulationError::MissingVariables { what: "node indicators", .. })
        ));
    }

    #[test]
    fn test_cap_links_rows_and_unknown_link() {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        let caps: BTreeMap<LinkId, f64> = topo.links().into_iter().map(|(l, _)| (l, 100.0)).collect();
        opt.cap_links(&pptc, &topo, &caps, &NoNormalize).unwrap();
        // n0->n2, n0->n1, n1->n2
        assert_eq!(count(&opt, |t| matches!(t, ConstraintTag::Capacity(_))), 3);

        let bad = BTreeMap::from([(link(0, 7), 1.0)]);
        assert_eq!(opt.cap_links(&pptc, &topo, &bad, &Normalize).unwrap_err(), FormulationError::UnknownLink(link(0, 7)));
    }

    #[test]
    fn test_unknown_required_node() {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        opt.add_binary_vars(&pptc, &topo, &[BinaryKind::Path, BinaryKind::Node]).unwrap();
        assert_eq!(opt.req_all_nodes(&[NodeId(1), NodeId(9)]).unwrap_err(), FormulationError::UnknownNode(NodeId(9)));
    }

    #[test]
    fn test_second_objective_is_rejected() {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        opt.set_predef_objective(&ObjectiveTemplate::MinRoutingCost, &pptc, &topo).unwrap();
        assert_eq!(
            opt.set_predef_objective(&ObjectiveTemplate::MinRoutingCost, &pptc, &topo).unwrap_err(),
            FormulationError::ObjectiveAlreadySet
        );
    }

    #[test]
    fn test_not_solved_before_solve() {
        let opt = Optimization::default();
        assert_eq!(opt.solved_objective().unwrap_err(), SolveError::NotSolved);
        assert_eq!(opt.active_nodes().unwrap_err(), SolveError::NotSolved);
    }

    #[test]
    fn test_program_is_consumed_once() {
        let (topo, pptc) = setup(3);
        let seen = Rc::new(RefCell::new(None));
        let mut opt = Optimization::new(Box::new(Recording { seen: Rc::clone(&seen), fail: false }));
        opt.add_decision_vars(&pptc).unwrap();
        opt.allocate_flow(&pptc).unwrap();
        opt.set_predef_objective(&ObjectiveTemplate::MinRoutingCost, &pptc, &topo).unwrap();
        opt.solve().unwrap();

        let program = seen.borrow().clone().unwrap();
        assert_eq!((program.rows(), program.cols()), (1, 2));
        // All-zero flows break the allocation row.
        assert_eq!(opt.violations(), &[ConstraintTag::FlowAllocation(TrafficClassId(0))]);
        assert_eq!(opt.allocate_flow(&pptc).unwrap_err(), FormulationError::AlreadySolved);
        assert!(matches!(opt.solve(), Err(Error::Formulation(FormulationError::AlreadySolved))));
    }

    #[test]
    fn test_backend_failure_surfaces_verbatim() {
        let (topo, pptc) = setup(3);
        let seen = Rc::new(RefCell::new(None));
        let mut opt = Optimization::new(Box::new(Recording { seen, fail: true }));
        opt.add_decision_vars(&pptc).unwrap();
        opt.set_predef_objective(&ObjectiveTemplate::MinRoutingCost, &pptc, &topo).unwrap();
        assert!(matches!(opt.solve(), Err(Error::Solve(SolveError::Backend(m))) if m == "boom"));
        assert_eq!(opt.solved_objective().unwrap_err(), SolveError::NotSolved);
    }

    #[test]
    fn test_solve_without_objective() {
        let (_, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        assert!(matches!(opt.solve(), Err(Error::Formulation(FormulationError::NoObjective))));
    }

    /// Paths n0-n2 (1 hop) and n0-n1-n2 (2 hops); n0->n2 can carry 40% of the demand.
    fn congested(template: ObjectiveTemplate, node_budget: Option<f64>) -> Result<Optimization, Error> {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc)?;
        opt.add_binary_vars(&pptc, &topo, &[BinaryKind::Path, BinaryKind::Node])?;
        opt.allocate_flow(&pptc)?;
        opt.route_all(&pptc)?;
        opt.cap_links(&pptc, &topo, &BTreeMap::from([(link(0, 2), 4.0)]), &NoNormalize)?;
        if let Some(budget) = node_budget {
            opt.add_node_budget(&topo, |_| 1.0, budget)?;
        }
        opt.set_predef_objective(&template, &pptc, &topo)?;
        opt.solve()?;
        Ok(opt)
    }

    #[test]
    fn test_capacity_forces_detour() {
        let opt = congested(ObjectiveTemplate::MinRoutingCost, None).unwrap();
        assert!((opt.solved_objective().unwrap() - 1.6).abs() < 1e-6);
        let fractions = opt.flow_fractions(TrafficClassId(0)).unwrap();
        assert_eq!(fractions.len(), 2);
        assert!((fractions[0].1 - 0.4).abs() < 1e-6);
        assert!((fractions[1].1 - 0.6).abs() < 1e-6);
        assert!(opt.violations().is_empty());
    }

    #[test]
    fn test_power_objective_activates_transit_node() {
        let template = ObjectiveTemplate::MinRoutingCostWithPower(PowerCosts::uniform(1500.0, 500.0));
        let opt = congested(template, Some(5.0)).unwrap();
        assert!((opt.solved_objective().unwrap() - 1501.6).abs() < 1e-4);
        assert_eq!(opt.active_nodes().unwrap(), vec![NodeId(1)]);
        assert_eq!(opt.used_paths().unwrap().len(), 2);
        assert!(opt.solved_value(&VarKey::PathUsed(PathId { class: TrafficClassId(0), index: 1 })).unwrap() > 0.5);
    }

    #[test]
    fn test_zero_node_budget_is_infeasible() {
        let err = congested(ObjectiveTemplate::MinRoutingCost, Some(0.0)).err().unwrap();
        assert!(matches!(err, Error::Solve(SolveError::Infeasible)));
    }

    #[test]
    fn test_min_max_link_load_balances() {
        let (mut topo, pptc) = setup(3);
        let ids: Vec<LinkId> = topo.links().into_iter().map(|(l, _)| l).collect();
        for l in ids {
            topo.set_link_capacity(l, 10.0).unwrap();
        }
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        opt.allocate_flow(&pptc).unwrap();
        opt.set_predef_objective(&ObjectiveTemplate::MinMaxLinkLoad, &pptc, &topo).unwrap();
        opt.solve().unwrap();
        assert!((opt.solved_objective().unwrap() - 0.5).abs() < 1e-6);
        assert!((opt.solved_value(&VarKey::MaxLinkLoad).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_required_node_costs_power() {
        let (topo, pptc) = setup(3);
        let mut opt = Optimization::default();
        opt.add_decision_vars(&pptc).unwrap();
        opt.add_binary_vars(&pptc, &topo, &[BinaryKind::Path, BinaryKind::Node]).unwrap();
        opt.allocate_flow(&pptc).unwrap();
        opt.route_all(&pptc).unwrap();
        opt.req_some_nodes(1, None).unwrap();
        opt.set_predef_objective(&ObjectiveTemplate::MinPower(PowerCosts::uniform(1500.0, 0.0)), &pptc, &topo).unwrap();
        opt.solve().unwrap();
        assert!((opt.solved_objective().unwrap() - 1500.0).abs() < 1e-6);
        assert_eq!(opt.active_nodes().unwrap().len(), 1);
    }
}
