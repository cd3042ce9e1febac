//! objective.rs
//! Predefined objective templates and the linear expressions behind them.

use super::error::FormulationError;
use super::vars::VariableTable;
use crate::path::PathsPerClass;
use crate::solver::{LinearExpr, VarKey};
use crate::topology::{LinkId, NodeId, Topology, TopologyError};
use std::collections::BTreeMap;

/// Power drawn by an active element.
///
/// Link power resolves as: override, then the link's own `power_cost`, then `link`.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCosts {
    pub node: f64,
    pub link: f64,
    pub node_overrides: BTreeMap<NodeId, f64>,
    pub link_overrides: BTreeMap<LinkId, f64>,
}

impl PowerCosts {
    pub fn uniform(node: f64, link: f64) -> Self {
        Self { node, link, node_overrides: BTreeMap::new(), link_overrides: BTreeMap::new() }
    }

    pub fn node_power(&self, node: NodeId) -> f64 { self.node_overrides.get(&node).copied().unwrap_or(self.node) }

    pub fn link_power(&self, topo: &Topology, link: LinkId) -> Result<f64, TopologyError> {
        if let Some(&p) = self.link_overrides.get(&link) {
            return Ok(p);
        }
        Ok(topo.link(link)?.power_cost.unwrap_or(self.link))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveTemplate {
    /// Demand-share weighted path cost.
    MinRoutingCost,
    MinRoutingCostWithPower(PowerCosts),
    MinPower(PowerCosts),
    /// Minimizes the highest link utilization.
    MinMaxLinkLoad,
}

impl ObjectiveTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveTemplate::MinRoutingCost => "min routing cost",
            ObjectiveTemplate::MinRoutingCostWithPower(_) => "min routing cost with power",
            ObjectiveTemplate::MinPower(_) => "min power",
            ObjectiveTemplate::MinMaxLinkLoad => "min max link load",
        }
    }
}

/// `Σ share(class) × cost(path) × Flow(path)`, `share = demand / total demand`.
pub(crate) fn routing_cost(
    vars: &VariableTable,
    pptc: &PathsPerClass,
    topo: &Topology,
) -> Result<LinearExpr, FormulationError> {
    let total = pptc.total_demand();
    let mut expr = LinearExpr::new();
    for (class, path) in pptc.all_paths() {
        let x = vars.require(&VarKey::Flow(path.id()), "objective", "flow variables")?;
        let share = if total > 0.0 { class.demand() / total } else { 0.0 };
        let cost = path.routing_cost(topo).map_err(lookup_error)?;
        expr.add_term(x, share * cost);
    }
    Ok(expr)
}

/// Power of every declared node and link indicator. At least node indicators must exist.
pub(crate) fn power(vars: &VariableTable, topo: &Topology, costs: &PowerCosts) -> Result<LinearExpr, FormulationError> {
    if !vars.any(|k| matches!(k, VarKey::NodeActive(_))) {
        return Err(FormulationError::MissingVariables { step: "objective", what: "node indicators" });
    }
    let mut expr = LinearExpr::new();
    for node in topo.node_ids() {
        if let Some(b) = vars.get(&VarKey::NodeActive(node)) {
            expr.add_term(b, costs.node_power(node));
        }
    }
    for (link, _) in topo.links() {
        if let Some(b) = vars.get(&VarKey::LinkActive(link)) {
            expr.add_term(b, costs.link_power(topo, link).map_err(lookup_error)?);
        }
    }
    Ok(expr)
}

pub(crate) fn lookup_error(err: TopologyError) -> FormulationError {
    match err {
        TopologyError::UnknownNode(n) => FormulationError::UnknownNode(n),
        TopologyError::UnknownLink(l) => FormulationError::UnknownLink(l),
        other => FormulationError::Topology(other),
    }
}
