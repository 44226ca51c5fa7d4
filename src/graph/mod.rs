//! Graph ownership and traversal for the pipeline DAG.
//!
//! The [`GraphStore`] owns the set of [`Node`](crate::node::Node)s and
//! [`Edge`]s that make up a pipeline. It is pure data plus traversal: ancestor
//! and descendant closures, deterministic execution ordering, and structural
//! validation. The store never executes anything; the
//! [`Runner`](crate::runner::Runner) queries it at run time.
//!
//! # Core Concepts
//!
//! - **Nodes**: configuration-bearing vertices, keyed by stable string ids
//! - **Edges**: directed allowed-reference arcs; a node may be wired purely
//!   for ordering without consuming the upstream output
//! - **Acyclicity**: edge insertions that would close a cycle are rejected
//!   with [`GraphError::CycleDetected`], leaving the edge set unchanged
//! - **Determinism**: traversal results follow node insertion order so
//!   repeated runs of the same graph execute in the same sequence
//!
//! # Quick Start
//!
//! ```rust
//! use dagwire::graph::GraphStore;
//! use dagwire::node::{Node, NodeConfig};
//!
//! let mut graph = GraphStore::new();
//! graph.add_node(Node::new("a", "extract", NodeConfig::file("extract.py"))).unwrap();
//! graph.add_node(Node::new("b", "load", NodeConfig::api("POST", "https://api/load"))).unwrap();
//! graph.add_edge("a", "b").unwrap();
//!
//! let order = graph.execution_order("b").unwrap();
//! assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
//! ```

mod store;

pub use store::{Edge, GraphError, GraphStore};

#[cfg(test)]
mod tests;
