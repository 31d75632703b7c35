//! Canonical node/edge store of one workflow.
//!
//! The graph keeps nodes and edges in insertion order, which doubles as the
//! canvas draw order. Every mutation runs under a single write guard, so a
//! concurrent reader sees either the state before or after a mutation and
//! never an edge pointing at a missing node.

use std::{
    collections::HashSet,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use petgraph::{Direction, algo, graphmap::DiGraphMap};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    AgentflowError, Result, ShareLock,
    model::{EdgeId, EdgeModel, GraphSnapshot, NodeDraft, NodeId, NodeModel},
    utils,
};

#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: Vec<NodeModel>,
    edges: Vec<EdgeModel>,
}

impl GraphState {
    fn node_index(
        &self,
        id: &str,
    ) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    fn edge_index(
        &self,
        id: &str,
    ) -> Option<usize> {
        self.edges.iter().position(|e| e.id == id)
    }

    fn node_mut(
        &mut self,
        id: &str,
    ) -> Result<&mut NodeModel> {
        self.nodes.iter_mut().find(|n| n.id == id).ok_or_else(|| AgentflowError::node_not_found(id))
    }

    fn fresh_node_id(&self) -> NodeId {
        loop {
            let id = utils::shortid();
            if self.node_index(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_edge_id(&self) -> EdgeId {
        loop {
            let id = utils::shortid();
            if self.edge_index(&id).is_none() {
                return id;
            }
        }
    }

    /// Check the edge rules without mutating anything.
    fn check_edge(
        &self,
        source: &str,
        target: &str,
    ) -> Result<()> {
        if self.node_index(source).is_none() {
            return Err(AgentflowError::NotFound(format!("source node {} not found", source)));
        }
        if self.node_index(target).is_none() {
            return Err(AgentflowError::NotFound(format!("target node {} not found", target)));
        }
        if source == target {
            return Err(AgentflowError::InvalidEdge(format!("self-loop on node {} is not allowed", source)));
        }
        if self.edges.iter().any(|e| e.connects(source, target)) {
            return Err(AgentflowError::InvalidEdge(format!("edge {} -> {} already exists", source, target)));
        }
        Ok(())
    }
}

/// Node and edge collections of a single workflow.
///
/// Cloning a `WorkflowGraph` shares the underlying state; use
/// [`WorkflowGraph::from_snapshot`] to get an independent copy.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    state: ShareLock<GraphState>,
}

impl WorkflowGraph {
    /// create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from a snapshot, rejecting snapshots that break the
    /// graph invariants.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut node_ids = HashSet::new();
        for node in snapshot.nodes.iter() {
            if !node_ids.insert(node.id.as_str()) {
                return Err(AgentflowError::Convert(format!("duplicate node id {}", node.id)));
            }
        }

        let mut state = GraphState {
            nodes: snapshot.nodes,
            edges: Vec::with_capacity(snapshot.edges.len()),
        };
        let mut edge_ids = HashSet::new();
        for edge in snapshot.edges {
            if !edge_ids.insert(edge.id.clone()) {
                return Err(AgentflowError::Convert(format!("duplicate edge id {}", edge.id)));
            }
            state.check_edge(&edge.source_node_id, &edge.target_node_id)?;
            state.edges.push(edge);
        }

        Ok(Self {
            state: ShareLock::new(RwLock::new(state)),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place a new node at the end of the draw order.
    pub fn add_node(
        &self,
        draft: NodeDraft,
    ) -> NodeModel {
        let mut state = self.write();
        let node = draft.into_node(state.fresh_node_id());
        trace!("graph::add_node({}, {})", node.id, node.node_type);
        state.nodes.push(node.clone());
        node
    }

    /// Update the canvas position of a node. Edges are untouched.
    pub fn move_node(
        &self,
        id: &str,
        x: f64,
        y: f64,
    ) -> Result<()> {
        let mut state = self.write();
        let node = state.node_mut(id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    pub fn rename_node(
        &self,
        id: &str,
        name: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.write();
        state.node_mut(id)?.name = name.into();
        Ok(())
    }

    /// Replace the configuration mapping of a node.
    pub fn update_node_config(
        &self,
        id: &str,
        config: Map<String, Value>,
    ) -> Result<()> {
        let mut state = self.write();
        state.node_mut(id)?.config = config;
        Ok(())
    }

    /// Remove a node together with every edge that starts or ends at it.
    pub fn remove_node(
        &self,
        id: &str,
    ) -> Result<()> {
        let mut state = self.write();
        let idx = state.node_index(id).ok_or_else(|| AgentflowError::node_not_found(id))?;
        state.nodes.remove(idx);

        let before = state.edges.len();
        state.edges.retain(|e| !e.touches(id));
        debug!("graph::remove_node({}) dropped {} incident edges", id, before - state.edges.len());
        Ok(())
    }

    /// Connect two existing nodes.
    ///
    /// Fails with `NotFound` when either node is unknown and with
    /// `InvalidEdge` for self-loops or an already existing directed edge.
    pub fn add_edge(
        &self,
        source: &str,
        target: &str,
    ) -> Result<EdgeModel> {
        let mut state = self.write();
        state.check_edge(source, target)?;

        let edge = EdgeModel {
            id: state.fresh_edge_id(),
            source_node_id: source.to_string(),
            target_node_id: target.to_string(),
        };
        trace!("graph::add_edge({}: {} -> {})", edge.id, source, target);
        state.edges.push(edge.clone());
        Ok(edge)
    }

    pub fn remove_edge(
        &self,
        id: &str,
    ) -> Result<()> {
        let mut state = self.write();
        let idx = state.edge_index(id).ok_or_else(|| AgentflowError::edge_not_found(id))?;
        state.edges.remove(idx);
        Ok(())
    }

    /// Detached copy of the current nodes and edges.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let state = self.read();
        GraphSnapshot {
            nodes: state.nodes.clone(),
            edges: state.edges.clone(),
        }
    }

    pub fn node(
        &self,
        id: &str,
    ) -> Option<NodeModel> {
        self.read().nodes.iter().find(|n| n.id == id).cloned()
    }

    pub fn edge(
        &self,
        id: &str,
    ) -> Option<EdgeModel> {
        self.read().edges.iter().find(|e| e.id == id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    /// Edges ending at the node, in insertion order.
    pub fn incoming(
        &self,
        id: &str,
    ) -> Vec<EdgeModel> {
        self.read().edges.iter().filter(|e| e.target_node_id == id).cloned().collect()
    }

    /// Edges starting at the node, in insertion order.
    pub fn outgoing(
        &self,
        id: &str,
    ) -> Vec<EdgeModel> {
        self.read().edges.iter().filter(|e| e.source_node_id == id).cloned().collect()
    }

    /// Run `f` against a petgraph view of the current state.
    fn with_graph<R>(
        &self,
        f: impl FnOnce(&DiGraphMap<&str, ()>) -> R,
    ) -> R {
        let state = self.read();
        let mut graph = DiGraphMap::with_capacity(state.nodes.len(), state.edges.len());
        for node in state.nodes.iter() {
            graph.add_node(node.id.as_str());
        }
        for edge in state.edges.iter() {
            graph.add_edge(edge.source_node_id.as_str(), edge.target_node_id.as_str(), ());
        }
        f(&graph)
    }

    /// Nodes without incoming edges, in draw order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.with_graph(|g| g.nodes().filter(|n| g.neighbors_directed(*n, Direction::Incoming).next().is_none()).map(str::to_string).collect())
    }

    /// Nodes without outgoing edges, in draw order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.with_graph(|g| g.nodes().filter(|n| g.neighbors_directed(*n, Direction::Outgoing).next().is_none()).map(str::to_string).collect())
    }

    /// Cycles are allowed; this only reports whether one exists.
    pub fn is_cyclic(&self) -> bool {
        self.with_graph(|g| algo::is_cyclic_directed(g))
    }

    /// Flow order of the nodes, `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        self.with_graph(|g| algo::toposort(g, None).ok().map(|order| order.into_iter().map(str::to_string).collect()))
    }

    /// Human-readable dump of the graph.
    pub fn schema(&self) -> String {
        let state = self.read();
        let mut lines = Vec::new();

        lines.push("=== Workflow Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", state.nodes.len(), state.edges.len()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for node in state.nodes.iter() {
            lines.push(format!("[{}] {} (type: {}, at: {}, {})", node.id, node.name, node.node_type, node.x, node.y));
        }
        lines.push(String::new());

        lines.push("--- Edges ---".to_string());
        for edge in state.edges.iter() {
            lines.push(format!("{} --> {} (id: {})", edge.source_node_id, edge.target_node_id, edge.id));
        }
        lines.push(String::new());

        lines.push("--- Graph Structure ---".to_string());
        for node in state.nodes.iter() {
            let outgoing: Vec<&str> = state.edges.iter().filter(|e| e.source_node_id == node.id).map(|e| e.target_node_id.as_str()).collect();
            if outgoing.is_empty() {
                lines.push(format!("{} -> (end)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, outgoing.join(", ")));
            }
        }

        lines.join("\n")
    }
}
