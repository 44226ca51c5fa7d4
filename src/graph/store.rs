//! The owning store for pipeline nodes and edges.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::Node;
use crate::types::NodeId;

/// A directed arc between two nodes.
///
/// An edge grants the target visibility into the source's output and orders
/// the source before the target during execution. It is an allowed-reference
/// relationship, not necessarily a data-flow pipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub source_port: Option<String>,
    #[serde(default)]
    pub target_port: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_port: None,
            target_port: None,
        }
    }

    #[must_use]
    pub fn with_ports(
        mut self,
        source_port: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.source_port = Some(source_port.into());
        self.target_port = Some(target_port.into());
        self
    }
}

/// Structural errors raised by graph mutations and queries.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The queried or referenced node id is not in the store.
    ///
    /// Queries fail loudly instead of returning an empty default so dangling
    /// references surface after a node is deleted.
    #[error("node not found: {id}")]
    #[diagnostic(
        code(dagwire::graph::node_not_found),
        help("The node may have been deleted; check for dangling references.")
    )]
    NodeNotFound { id: NodeId },

    /// Inserting the edge would close a directed cycle.
    #[error("edge {from} -> {to} would create a cycle")]
    #[diagnostic(
        code(dagwire::graph::cycle),
        help("The pipeline graph must stay acyclic; remove one edge on the path back.")
    )]
    CycleDetected { from: NodeId, to: NodeId },

    /// Self-edges are rejected outright.
    #[error("node {id} cannot reference itself")]
    #[diagnostic(code(dagwire::graph::self_edge))]
    SelfEdge { id: NodeId },

    /// A node with this id is already registered.
    #[error("duplicate node id: {id}")]
    #[diagnostic(code(dagwire::graph::duplicate_node))]
    DuplicateNode { id: NodeId },
}

/// Owns the pipeline's nodes and edges and answers traversal queries.
///
/// Node order is preserved as insertion order; every traversal that has to
/// break ties between independent nodes does so by that order, which keeps
/// execution sequences reproducible across runs.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    /// Nodes in insertion order.
    nodes: Vec<Node>,
    /// Index from node id into `nodes`.
    index: FxHashMap<NodeId, usize>,
    /// Edges in insertion order.
    edges: Vec<Edge>,
    /// Adjacency: source -> targets.
    outgoing: FxHashMap<NodeId, Vec<NodeId>>,
    /// Reverse adjacency: target -> sources.
    incoming: FxHashMap<NodeId, Vec<NodeId>>,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Fails with [`GraphError::DuplicateNode`] when the id
    /// is already taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode { id: node.id });
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every edge touching it.
    ///
    /// Returns the removed node so callers can clear its result and logs.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, GraphError> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })?;
        let node = self.nodes.remove(pos);
        self.index.remove(id);
        for (_, p) in self.index.iter_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        self.edges.retain(|e| e.source != id && e.target != id);
        self.outgoing.remove(id);
        self.incoming.remove(id);
        for targets in self.outgoing.values_mut() {
            targets.retain(|t| t != id);
        }
        for sources in self.incoming.values_mut() {
            sources.retain(|s| s != id);
        }
        Ok(node)
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Result<&Node, GraphError> {
        self.index
            .get(id)
            .map(|pos| &self.nodes[*pos])
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })
    }

    /// All nodes, in insertion order.
    #[must_use]
    pub fn node_data(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, in insertion order.
    #[must_use]
    pub fn edge_data(&self) -> &[Edge] {
        &self.edges
    }

    /// Insert a directed edge `source -> target`.
    ///
    /// Duplicate edges (same source and target) are silently collapsed.
    /// Fails with [`GraphError::CycleDetected`] when the insertion would
    /// close a cycle; the edge set is left unchanged in that case.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
        self.insert_edge(Edge::new(source, target))
    }

    /// [`add_edge`](Self::add_edge) with port annotations preserved.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        let (source, target) = (edge.source.clone(), edge.target.clone());
        self.node(&source)?;
        self.node(&target)?;
        if source == target {
            return Err(GraphError::SelfEdge { id: source });
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            return Ok(());
        }
        // target already reaches source => the new edge closes a cycle.
        if self.reaches(&target, &source) {
            return Err(GraphError::CycleDetected {
                from: source,
                to: target,
            });
        }
        self.outgoing
            .entry(source.clone())
            .or_default()
            .push(target.clone());
        self.incoming.entry(target).or_default().push(source);
        self.edges.push(edge);
        Ok(())
    }

    /// Remove the edge `source -> target` if present.
    pub fn remove_edge(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
        self.node(source)?;
        self.node(target)?;
        self.edges
            .retain(|e| !(e.source == source && e.target == target));
        if let Some(targets) = self.outgoing.get_mut(source) {
            targets.retain(|t| t != target);
        }
        if let Some(sources) = self.incoming.get_mut(target) {
            sources.retain(|s| s != source);
        }
        Ok(())
    }

    /// Direct predecessors of `id`, in insertion order of the nodes.
    pub fn predecessors(&self, id: &str) -> Result<Vec<&Node>, GraphError> {
        self.node(id)?;
        let sources: FxHashSet<&str> = self
            .incoming
            .get(id)
            .map(|s| s.iter().map(String::as_str).collect())
            .unwrap_or_default();
        Ok(self
            .nodes
            .iter()
            .filter(|n| sources.contains(n.id.as_str()))
            .collect())
    }

    /// All nodes reachable by following edges backward from `id`,
    /// transitively, excluding `id` itself. Insertion order.
    pub fn ancestors(&self, id: &str) -> Result<Vec<&Node>, GraphError> {
        self.closure(id, &self.incoming)
    }

    /// All nodes reachable by following edges forward from `id`,
    /// transitively, excluding `id` itself. Insertion order.
    pub fn descendants(&self, id: &str) -> Result<Vec<&Node>, GraphError> {
        self.closure(id, &self.outgoing)
    }

    /// The target plus its ancestors, topologically sorted.
    ///
    /// Any edge `u -> v` within the returned set places `u` before `v`; ties
    /// among independent nodes are broken by node insertion order (Kahn's
    /// algorithm over an ordered candidate list), so the result is stable for
    /// a given graph.
    pub fn execution_order(&self, target: &str) -> Result<Vec<NodeId>, GraphError> {
        self.node(target)?;
        let mut members: FxHashSet<&str> = self
            .ancestors(target)?
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        members.insert(target);

        // In-degree restricted to the member set.
        let mut in_degree: FxHashMap<&str, usize> = FxHashMap::default();
        for id in &members {
            let degree = self
                .incoming
                .get(*id)
                .map(|sources| {
                    sources
                        .iter()
                        .filter(|s| members.contains(s.as_str()))
                        .count()
                })
                .unwrap_or(0);
            in_degree.insert(id, degree);
        }

        let mut order: Vec<NodeId> = Vec::with_capacity(members.len());
        let mut remaining = members.len();
        while remaining > 0 {
            // Scan nodes in insertion order for the next zero-in-degree member.
            let next = self
                .nodes
                .iter()
                .map(|n| n.id.as_str())
                .find(|id| in_degree.get(id).is_some_and(|d| *d == 0));
            let Some(next) = next else {
                // Unreachable with a cycle-free edge set; add_edge guards it.
                break;
            };
            in_degree.remove(next);
            remaining -= 1;
            if let Some(targets) = self.outgoing.get(next) {
                for t in targets {
                    if let Some(d) = in_degree.get_mut(t.as_str()) {
                        *d -= 1;
                    }
                }
            }
            order.push(next.to_string());
        }
        Ok(order)
    }

    /// Whether `ancestor` reaches `of` along forward edges. A node is never
    /// its own ancestor, matching [`ancestors`](Self::ancestors).
    pub fn is_ancestor(&self, ancestor: &str, of: &str) -> Result<bool, GraphError> {
        self.node(ancestor)?;
        self.node(of)?;
        if ancestor == of {
            return Ok(false);
        }
        Ok(self.reaches(ancestor, of))
    }

    /// Depth-first reachability along strictly forward steps; `from` does
    /// not reach itself unless an edge path leads back (never true here,
    /// the edge set stays acyclic).
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&str> = vec![from];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(targets) = self.outgoing.get(current) {
                for t in targets {
                    if t == to {
                        return true;
                    }
                    stack.push(t.as_str());
                }
            }
        }
        false
    }

    fn closure<'a>(
        &'a self,
        id: &str,
        adjacency: &FxHashMap<NodeId, Vec<NodeId>>,
    ) -> Result<Vec<&'a Node>, GraphError> {
        self.node(id)?;
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&str> = adjacency
            .get(id)
            .map(|next| next.iter().map(String::as_str).collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = adjacency.get(current) {
                stack.extend(next.iter().map(String::as_str));
            }
        }
        Ok(self
            .nodes
            .iter()
            .filter(|n| seen.contains(n.id.as_str()))
            .collect())
    }
}
