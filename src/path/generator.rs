//! generator.rs
//! Bounded, deterministic path enumeration per traffic class, and the resulting
//! paths-per-traffic-class (PPTC) map.

use super::error::PathError;
use super::path::{Path, PathId};
use super::predicate::PathPredicate;
use crate::topology::{NodeId, Topology};
use crate::traffic::{TrafficClass, TrafficClassId};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// One traffic class together with its candidate paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPaths {
    pub class: TrafficClass,
    pub paths: Vec<Path>,
}

/// Mapping from traffic class to its candidate paths, ordered by class id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathsPerClass {
    entries: BTreeMap<TrafficClassId, ClassPaths>,
}

impl PathsPerClass {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, class: TrafficClass, paths: Vec<Path>) -> Result<(), PathError> {
        let id = class.id();
        if self.entries.contains_key(&id) {
            return Err(PathError::DuplicateClass(id));
        }
        if let Some(p) = paths.iter().find(|p| p.id().class != id || p.src() != class.src() || p.dst() != class.dst()) {
            return Err(PathError::ForeignPath { class: id, path: p.id() });
        }
        self.entries.insert(id, ClassPaths { class, paths });
        Ok(())
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn total_paths(&self) -> usize { self.entries.values().map(|e| e.paths.len()).sum() }

    pub fn iter(&self) -> impl Iterator<Item = (&TrafficClass, &[Path])> + '_ {
        self.entries.values().map(|e| (&e.class, e.paths.as_slice()))
    }

    /// Every `(class, path)` pair, classes in id order, paths in index order.
    pub fn all_paths(&self) -> impl Iterator<Item = (&TrafficClass, &Path)> + '_ {
        self.entries.values().flat_map(|e| e.paths.iter().map(move |p| (&e.class, p)))
    }

    pub fn get(&self, id: TrafficClassId) -> Option<&ClassPaths> { self.entries.get(&id) }
    pub fn class(&self, id: TrafficClassId) -> Option<&TrafficClass> { self.entries.get(&id).map(|e| &e.class) }
    pub fn paths(&self, id: TrafficClassId) -> Option<&[Path]> { self.entries.get(&id).map(|e| e.paths.as_slice()) }

    pub fn total_demand(&self) -> f64 { self.entries.values().map(|e| e.class.demand()).sum() }

    /// Classes with no candidate path. They cannot be routed.
    pub fn unroutable(&self) -> Vec<TrafficClassId> {
        self.entries.values().filter(|e| e.paths.is_empty()).map(|e| e.class.id()).collect()
    }

    /// Drops unroutable classes, returning the remaining map and the dropped ids.
    pub fn without_unroutable(mut self) -> (Self, Vec<TrafficClassId>) {
        let dropped = self.unroutable();
        for id in &dropped {
            self.entries.remove(id);
        }
        (self, dropped)
    }

    /// Builds a new map with each class's paths replaced by `select(paths)`.
    pub(crate) fn map_paths<F>(&self, mut select: F) -> Self
    where
        F: FnMut(&[Path]) -> Vec<Path>,
    {
        let entries = self.entries
            .iter()
            .map(|(id, e)| (*id, ClassPaths { class: e.class.clone(), paths: select(&e.paths) }))
            .collect();
        Self { entries }
    }
}

/// Enumerates candidate paths for every class.
///
/// Paths are produced in order of increasing hop count, ties broken by lexicographic node
/// order; only paths accepted by `predicate` are kept, up to `max_paths` per class and
/// `max_path_length` hops. A class with no accepted path maps to an empty set.
pub fn generate_paths_per_class<P>(
    topo: &Topology,
    classes: &[TrafficClass],
    predicate: &P,
    max_path_length: usize,
    max_paths: usize,
) -> Result<PathsPerClass, PathError>
where
    P: PathPredicate + ?Sized,
{
    // Adjacency is read by every worker; sort once.
    let adjacency: BTreeMap<NodeId, Vec<NodeId>> = topo
        .node_ids()
        .map(|n| (n, topo.successors(n).unwrap_or_default()))
        .collect();

    let generated: Vec<(TrafficClass, Vec<Path>)> = classes
        .par_iter()
        .map(|class| {
            for node in [class.src(), class.dst()] {
                if !topo.has_node(node) {
                    return Err(PathError::UnknownEndpoint { class: class.id(), node });
                }
            }
            let mut walker = Walker {
                adjacency: &adjacency,
                topo,
                class,
                predicate,
                max_paths,
                found: Vec::new(),
            };
            walker.run(max_path_length);
            Ok((class.clone(), walker.found))
        })
        .collect::<Result<_, _>>()?;

    // Single writer merge
    let mut pptc = PathsPerClass::new();
    for (class, paths) in generated {
        if paths.is_empty() {
            log::warn!("No usable path for {class} within {max_path_length} hops");
        }
        pptc.insert(class, paths)?;
    }
    log::info!("Generated {} paths for {} traffic classes", pptc.total_paths(), pptc.len());
    Ok(pptc)
}

struct Walker<'a, P: ?Sized> {
    adjacency: &'a BTreeMap<NodeId, Vec<NodeId>>,
    topo: &'a Topology,
    class: &'a TrafficClass,
    predicate: &'a P,
    max_paths: usize,
    found: Vec<Path>,
}

impl<P: PathPredicate + ?Sized> Walker<'_, P> {
    fn run(&mut self, max_path_length: usize) {
        let mut stack: SmallVec<[NodeId; 8]> = SmallVec::new();
        for hops in 1..=max_path_length {
            if self.is_full() {
                break;
            }
            stack.clear();
            stack.push(self.class.src());
            self.extend(&mut stack, hops);
        }
    }

    #[inline(always)]
    fn is_full(&self) -> bool { self.found.len() >= self.max_paths }

    /// Depth-first walk producing simple paths of exactly `remaining` more hops.
    fn extend(&mut self, stack: &mut SmallVec<[NodeId; 8]>, remaining: usize) {
        let Some(&current) = stack.last() else { return };
        let dst = self.class.dst();

        if remaining == 0 {
            if current == dst {
                self.offer(stack);
            }
            return;
        }
        // The destination can only be the last node.
        if current == dst {
            return;
        }

        let adjacency = self.adjacency;
        let Some(next_hops) = adjacency.get(&current) else { return };
        for &next in next_hops {
            if self.is_full() {
                return;
            }
            if stack.contains(&next) {
                continue;
            }
            stack.push(next);
            self.extend(stack, remaining - 1);
            stack.pop();
        }
    }

    fn offer(&mut self, stack: &[NodeId]) {
        let id = PathId { class: self.class.id(), index: self.found.len() as u32 };
        let path = Path::new(id, stack.iter().copied());
        if self.predicate.accepts(self.class, &path, self.topo) {
            self.found.push(path);
        }
    }
}
