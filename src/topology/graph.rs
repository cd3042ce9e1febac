//! graph.rs
//! The mutable network graph: nodes, directed links and their attributes.

use super::error::TopologyError;
use super::types::{LinkAttrs, LinkId, NodeAttrs, NodeId};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Topology {
    name: String,
    graph: DiGraphMap<NodeId, LinkAttrs>,
    attrs: BTreeMap<NodeId, NodeAttrs>,
}

impl Topology {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), graph: DiGraphMap::new(), attrs: BTreeMap::new() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn node_count(&self) -> usize { self.attrs.len() }
    pub fn link_count(&self) -> usize { self.graph.edge_count() }
    pub fn has_node(&self, id: NodeId) -> bool { self.attrs.contains_key(&id) }
    pub fn has_link(&self, link: LinkId) -> bool { self.graph.contains_edge(link.src, link.dst) }

    /// Read-only access to the underlying graph for petgraph algorithms.
    pub fn graph(&self) -> &DiGraphMap<NodeId, LinkAttrs> { &self.graph }

    // --- Construction ---

    /// Adds a node with default attributes and returns its id.
    /// Ids are dense: the n-th node added gets `NodeId(n)` unless ids were inserted by hand.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.attrs.keys().next_back().map_or(NodeId(0), |last| NodeId(last.0 + 1));
        self.attrs.insert(id, NodeAttrs::default());
        self.graph.add_node(id);
        id
    }

    pub fn insert_node(&mut self, id: NodeId, attrs: NodeAttrs) -> Result<(), TopologyError> {
        if self.attrs.contains_key(&id) {
            return Err(TopologyError::DuplicateNode(id));
        }
        self.attrs.insert(id, attrs);
        self.graph.add_node(id);
        Ok(())
    }

    /// Adds the directed link `src -> dst`. Re-adding an existing link keeps its attributes.
    pub fn add_link(&mut self, src: NodeId, dst: NodeId) -> Result<LinkId, TopologyError> {
        self.ensure_node(src)?;
        self.ensure_node(dst)?;
        if src == dst {
            return Err(TopologyError::SelfLoop(src));
        }
        if !self.graph.contains_edge(src, dst) {
            self.graph.add_edge(src, dst, LinkAttrs::default());
        }
        Ok(LinkId::new(src, dst))
    }

    pub fn add_bidirectional_link(&mut self, a: NodeId, b: NodeId) -> Result<(LinkId, LinkId), TopologyError> {
        Ok((self.add_link(a, b)?, self.add_link(b, a)?))
    }

    // --- Accessors ---

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeAttrs)> + '_ {
        self.attrs.iter().map(|(id, attrs)| (*id, attrs))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.attrs.keys().copied()
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeAttrs, TopologyError> {
        self.attrs.get(&id).ok_or(TopologyError::UnknownNode(id))
    }

    /// Links in ascending `(src, dst)` order.
    pub fn links(&self) -> Vec<(LinkId, &LinkAttrs)> {
        let mut links: Vec<_> = self.graph
            .all_edges()
            .map(|(src, dst, attrs)| (LinkId::new(src, dst), attrs))
            .collect();
        links.sort_by_key(|(id, _)| *id);
        links
    }

    pub fn link(&self, link: LinkId) -> Result<&LinkAttrs, TopologyError> {
        self.graph.edge_weight(link.src, link.dst).ok_or(TopologyError::UnknownLink(link))
    }

    /// Outgoing neighbours in ascending id order.
    pub fn successors(&self, id: NodeId) -> Result<Vec<NodeId>, TopologyError> {
        self.ensure_node(id)?;
        let mut next: Vec<NodeId> = self.graph.neighbors_directed(id, Direction::Outgoing).collect();
        next.sort_unstable();
        Ok(next)
    }

    // --- Attribute setters ---

    pub fn set_switch(&mut self, id: NodeId, is_switch: bool) -> Result<(), TopologyError> {
        self.node_mut(id)?.is_switch = is_switch;
        Ok(())
    }

    pub fn set_middlebox(&mut self, id: NodeId, has_middlebox: bool) -> Result<(), TopologyError> {
        self.node_mut(id)?.has_middlebox = has_middlebox;
        Ok(())
    }

    pub fn set_service_types<I, S>(&mut self, id: NodeId, services: I) -> Result<(), TopologyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_mut(id)?.services = services.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn set_link_capacity(&mut self, link: LinkId, capacity: f64) -> Result<(), TopologyError> {
        self.link_mut(link)?.capacity = Some(capacity);
        Ok(())
    }

    pub fn set_link_power(&mut self, link: LinkId, power: f64) -> Result<(), TopologyError> {
        self.link_mut(link)?.power_cost = Some(power);
        Ok(())
    }

    pub fn set_link_routing_cost(&mut self, link: LinkId, cost: f64) -> Result<(), TopologyError> {
        self.link_mut(link)?.routing_cost = cost;
        Ok(())
    }

    fn ensure_node(&self, id: NodeId) -> Result<(), TopologyError> {
        if self.attrs.contains_key(&id) { Ok(()) } else { Err(TopologyError::UnknownNode(id)) }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeAttrs, TopologyError> {
        self.attrs.get_mut(&id).ok_or(TopologyError::UnknownNode(id))
    }

    fn link_mut(&mut self, link: LinkId) -> Result<&mut LinkAttrs, TopologyError> {
        self.graph.edge_weight_mut(link.src, link.dst).ok_or(TopologyError::UnknownLink(link))
    }
}
