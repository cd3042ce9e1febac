//! scenario.rs
//! The end-to-end workflow: provision traffic, generate and sample paths, build the
//! program, solve it.

use crate::config::ScenarioConfig;
use crate::error::Error;
use crate::formulation::{BinaryKind, FormulationOptions, Optimization};
use crate::path::{choose_rand_seeded, generate_paths_per_class, PathsPerClass};
use crate::solver::SolverBackend;
use crate::topology::{generators, hop_limit, LinkId, NodeId, Topology};
use crate::traffic::{
    apply_capacities, compute_uniform_traffic_matrix, generate_ie_pairs, generate_traffic_classes_with,
    provision_links, TrafficClass,
};
use std::collections::BTreeMap;

/// Result of a solved scenario. `optimization` answers assignment queries.
pub struct Outcome {
    pub objective: f64,
    pub topology: Topology,
    pub classes: Vec<TrafficClass>,
    pub capacities: BTreeMap<LinkId, f64>,
    pub hop_limit: usize,
    pub pptc: PathsPerClass,
    pub optimization: Optimization,
}

/// Complete graph of `n` switches, each hosting a middlebox with `switch`, `fw` and `ids`.
pub fn elastic_tree(n: usize) -> Topology {
    let mut topo = generators::complete(n);
    generators::force_switch_labels(&mut topo);
    let ids: Vec<NodeId> = topo.node_ids().collect();
    for id in ids {
        // Ids come from the topology itself.
        let _ = topo.set_middlebox(id, true);
        let _ = topo.set_service_types(id, ["switch", "fw", "ids"]);
    }
    topo
}

/// Traffic classes and provisioned capacities for `topo`. Capacities are written onto its links.
pub fn provision(
    topo: &mut Topology,
    config: &ScenarioConfig,
) -> Result<(Vec<TrafficClass>, BTreeMap<LinkId, f64>), Error> {
    let pairs = generate_ie_pairs(topo);
    let matrix = compute_uniform_traffic_matrix(&pairs, config.total_volume)?;
    let classes = generate_traffic_classes_with(&pairs, &matrix, &config.classes)?;
    let capacities = provision_links(topo, &classes, config.oversubscription)?;
    apply_capacities(topo, &capacities)?;
    log::info!("Provisioned {} classes over {} links", classes.len(), capacities.len());
    Ok((classes, capacities))
}

/// Candidate paths per class, sampled when `paths_per_class` is set. Returns the hop bound used.
pub fn candidate_paths(
    topo: &Topology,
    classes: &[TrafficClass],
    config: &ScenarioConfig,
) -> Result<(PathsPerClass, usize), Error> {
    let limit = match config.max_path_length {
        Some(limit) => limit,
        None => hop_limit(topo, config.path_length_factor)?,
    };
    let predicate = config.predicate.build();
    let all = generate_paths_per_class(topo, classes, predicate.as_ref(), limit, config.max_paths)?;
    let pptc = match config.paths_per_class {
        Some(k) => choose_rand_seeded(&all, k, config.seed),
        None => all,
    };
    log::info!("Kept {} candidate paths (hop limit {limit})", pptc.total_paths());
    Ok((pptc, limit))
}

/// Runs the whole workflow on `topo` and solves with `backend`.
pub fn run(mut topo: Topology, config: &ScenarioConfig, backend: Box<dyn SolverBackend>) -> Result<Outcome, Error> {
    config.validate()?;

    // 1. Traffic
    let (classes, capacities) = provision(&mut topo, config)?;

    // 2. Paths
    let (pptc, hop_limit) = candidate_paths(&topo, &classes, config)?;

    // 3. Program
    let options = FormulationOptions { indicators: config.indicators, node_activation: config.node_activation };
    let mut opt = Optimization::with_options(backend, options);
    let mut kinds = vec![BinaryKind::Path, BinaryKind::Node];
    if config.link_indicators {
        kinds.push(BinaryKind::Link);
    }
    opt.add_decision_vars(&pptc)?;
    opt.add_binary_vars(&pptc, &topo, &kinds)?;
    opt.allocate_flow(&pptc)?;
    opt.route_all(&pptc)?;
    opt.cap_links(&pptc, &topo, &capacities, config.capacity_accounting.as_dyn())?;
    if config.min_active_nodes > 0 {
        opt.req_some_nodes(config.min_active_nodes, None)?;
    }
    opt.add_node_budget(&topo, |_| config.node_cost, config.node_budget)?;
    if let Some(budget) = config.link_budget {
        opt.add_link_budget(&topo, |_| config.link_cost, budget)?;
    }
    opt.set_predef_objective(&config.objective_template(), &pptc, &topo)?;

    // 4. Solve
    opt.solve()?;
    let objective = opt.solved_objective()?;
    log::info!("Scenario on '{}' solved, objective {objective}", topo.name());

    Ok(Outcome { objective, topology: topo, classes, capacities, hop_limit, pptc, optimization: opt })
}
