//! Live host graph built from packet endpoints.
//!
//! Nodes are deduplicated by host identifier. Edges are never merged: every
//! packet with both endpoints appends one, so repeated traffic between the
//! same pair shows up as repeated links.

use std::collections::HashMap;

use tracing::debug;

use crate::packet::{Packet, Protocol};

/// A host seen as source or destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    /// Protocol of the most recent packet touching this host.
    pub protocol: Protocol,
}

/// One packet's worth of connection between two hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub protocol: Protocol,
}

/// What a single [`NetworkGraphModel::ingest`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub nodes_added: usize,
    /// A node was added or had its protocol tag overwritten.
    pub nodes_changed: bool,
    pub edges_changed: bool,
}

impl IngestOutcome {
    pub fn changed(&self) -> bool {
        self.nodes_changed || self.edges_changed
    }
}

/// Consumer of the node and edge sets, typically a force-directed layout.
///
/// Views only read; the model stays the single owner of graph state.
pub trait GraphView {
    fn set_nodes(&mut self, nodes: &[GraphNode]);
    fn set_edges(&mut self, edges: &[GraphEdge]);
    fn restart_layout(&mut self);
}

/// Any view that ignores updates (headless sessions).
impl GraphView for () {
    fn set_nodes(&mut self, _nodes: &[GraphNode]) {}
    fn set_edges(&mut self, _edges: &[GraphEdge]) {}
    fn restart_layout(&mut self) {}
}

#[derive(Debug, Clone, Default)]
pub struct NetworkGraphModel {
    nodes: Vec<GraphNode>,
    by_id: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    max_edges: Option<usize>,
}

impl NetworkGraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_edges` edges, dropping the oldest first.
    pub fn with_edge_capacity(max_edges: usize) -> Self {
        Self {
            max_edges: Some(max_edges.max(1)),
            ..Self::default()
        }
    }

    /// Fold one packet into the graph. Packets missing either endpoint are
    /// ignored entirely.
    pub fn ingest(&mut self, packet: &Packet) -> IngestOutcome {
        let Some((source, target)) = packet.endpoints() else {
            debug!(size = ?packet.size, "packet without both endpoints, graph untouched");
            return IngestOutcome::default();
        };

        let mut outcome = IngestOutcome::default();
        for host in [source, target] {
            self.touch(host, packet.protocol, &mut outcome);
        }

        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            protocol: packet.protocol,
        });
        if let Some(max) = self.max_edges {
            if self.edges.len() > max {
                let excess = self.edges.len() - max;
                self.edges.drain(0..excess);
            }
        }
        outcome.edges_changed = true;

        outcome
    }

    fn touch(&mut self, host: &str, protocol: Protocol, outcome: &mut IngestOutcome) {
        match self.by_id.get(host) {
            Some(&index) => {
                let node = &mut self.nodes[index];
                if node.protocol != protocol {
                    node.protocol = protocol;
                    outcome.nodes_changed = true;
                }
            }
            None => {
                self.by_id.insert(host.to_string(), self.nodes.len());
                self.nodes.push(GraphNode {
                    id: host.to_string(),
                    protocol,
                });
                outcome.nodes_added += 1;
                outcome.nodes_changed = true;
            }
        }
    }

    /// Push the current sets to a view and restart its layout.
    pub fn publish(&self, view: &mut impl GraphView) {
        view.set_nodes(&self.nodes);
        view.set_edges(&self.edges);
        view.restart_layout();
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.by_id.get(id).map(|&index| &self.nodes[index])
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges in arrival order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }
}
