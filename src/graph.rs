use crate::{Edge, Element, ElementKind, ElementRef, Node, Position};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use ulid::Ulid;

/// Outcome of deleting a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// The removed node
    pub node: String,

    /// Edges removed because they touched the node
    pub removed_edges: Vec<String>,

    /// Bypass edges created to keep paths through the node
    pub bypass_edges: Vec<String>,
}

/// The live element set of a diagram.
///
/// Every edge endpoint names a node in the set; operations that would
/// leave a dangling edge are refused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSet {
    /// Nodes in load order
    nodes: Vec<Node>,

    /// Edges in load order
    edges: Vec<Edge>,
}

impl ElementSet {
    /// Create a new empty element set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed parts, rejecting duplicate ids and dangling edges
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut set = Self::new();
        for node in nodes {
            set.add_node(node)?;
        }
        for edge in edges {
            set.add_edge(edge)?;
        }
        Ok(set)
    }

    // ========== Node Operations ==========

    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.contains_id(&node.id) {
            return Err(anyhow!("Duplicate element id: {}", node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Move a node
    pub fn set_position(&mut self, id: &str, position: Position) -> Result<()> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;
        node.position = position;
        Ok(())
    }

    // ========== Edge Operations ==========

    /// Add an edge whose endpoints are both present
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if !self.contains_node(&edge.source) {
            return Err(anyhow!(
                "Edge {} references missing source node: {}",
                edge.id,
                edge.source
            ));
        }
        if !self.contains_node(&edge.target) {
            return Err(anyhow!(
                "Edge {} references missing target node: {}",
                edge.id,
                edge.target
            ));
        }
        if self.contains_id(&edge.id) {
            return Err(anyhow!("Duplicate element id: {}", edge.id));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge(id).is_some()
    }

    /// Whether any edge goes `source -> target`
    pub fn has_edge_between(&self, source: &str, target: &str) -> bool {
        self.edges.iter().any(|e| e.connects(source, target))
    }

    /// Get all edges ending at a node
    pub fn incoming_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.ends_at(node_id)).collect()
    }

    /// Get all edges starting from a node
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.starts_from(node_id)).collect()
    }

    /// Remove a single edge; no rewiring
    pub fn delete_edge(&mut self, id: &str) -> Result<Edge> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| anyhow!("Edge not found: {}", id))?;
        Ok(self.edges.remove(index))
    }

    // ========== Node Deletion With Rewiring ==========

    /// Delete a node, reconnecting each of its in-neighbours to each of its
    /// out-neighbours with a bypass edge.
    ///
    /// A pair is skipped when both ends are the same node or when any edge
    /// between them already exists. Only the node's immediate neighbourhood
    /// is considered.
    pub fn delete_node(&mut self, id: &str) -> Result<DeletionReport> {
        if !self.contains_node(id) {
            return Err(anyhow!("Node not found: {}", id));
        }

        let sources = distinct(self.incoming_edges(id).into_iter().map(|e| e.source.clone()));
        let targets = distinct(self.outgoing_edges(id).into_iter().map(|e| e.target.clone()));

        let mut bypass_edges = Vec::new();
        for src in &sources {
            for dst in &targets {
                if src == dst || self.has_edge_between(src, dst) {
                    continue;
                }
                let edge = Edge::bypass(self.fresh_edge_id(), src.as_str(), dst.as_str());
                debug!(edge = %edge.id, source = %src, target = %dst, "created bypass edge");
                bypass_edges.push(edge.id.clone());
                self.edges.push(edge);
            }
        }

        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            std::mem::take(&mut self.edges).into_iter().partition(|e| e.involves(id));
        self.edges = kept;
        self.nodes.retain(|n| n.id != id);

        Ok(DeletionReport {
            node: id.to_string(),
            removed_edges: removed.into_iter().map(|e| e.id).collect(),
            bypass_edges,
        })
    }

    // ========== Classes ==========

    /// Tag one element with a class
    pub fn add_class(&mut self, element: &ElementRef, class: &str) -> Result<()> {
        let classes = match element.kind {
            ElementKind::Node => self
                .nodes
                .iter_mut()
                .find(|n| n.id == element.id)
                .map(|n| &mut n.classes),
            ElementKind::Edge => self
                .edges
                .iter_mut()
                .find(|e| e.id == element.id)
                .map(|e| &mut e.classes),
        }
        .ok_or_else(|| anyhow!("Element not found: {}", element))?;
        classes.insert(class.to_string());
        Ok(())
    }

    /// Remove a class from every element of a kind; returns how many carried it
    pub fn clear_class(&mut self, kind: ElementKind, class: &str) -> usize {
        match kind {
            ElementKind::Node => self
                .nodes
                .iter_mut()
                .map(|n| n.classes.remove(class))
                .filter(|removed| *removed)
                .count(),
            ElementKind::Edge => self
                .edges
                .iter_mut()
                .map(|e| e.classes.remove(class))
                .filter(|removed| *removed)
                .count(),
        }
    }

    // ========== Utility Methods ==========

    /// Borrowed view of an element
    pub fn element(&self, element: &ElementRef) -> Option<Element<'_>> {
        match element.kind {
            ElementKind::Node => self.node(&element.id).map(Element::Node),
            ElementKind::Edge => self.edge(&element.id).map(Element::Edge),
        }
    }

    /// Node and edge ids share one namespace
    pub fn contains_id(&self, id: &str) -> bool {
        self.contains_node(id) || self.contains_edge(id)
    }

    fn fresh_edge_id(&self) -> String {
        loop {
            let id = format!("e{}", Ulid::new());
            if !self.contains_id(&id) {
                return id;
            }
        }
    }

    /// Count nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Count edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn distinct(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(id.clone())).collect()
}
