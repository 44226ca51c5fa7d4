//! # Dagwire: DAG Execution Engine for Visual Pipelines
//!
//! Dagwire is the execution core of a node-based pipeline composer: a graph
//! of configured nodes (script files, HTTP requests, database queries) wired
//! by directed edges, where downstream parameters may reference upstream
//! outputs by dot path. The engine owns graph mutation, reference
//! resolution, sequential scheduling, result storage, and the execution log.
//!
//! ## Core Concepts
//!
//! - **Nodes**: Configured units of work with kind-specific settings
//! - **Edges**: Allowed-reference relationships that also order execution
//! - **References**: Dot paths (`result.data[0].name`) into upstream outputs
//! - **Runner**: Strictly sequential, fail-fast topological execution
//! - **Results**: Per-node status/output records, read live by the UI
//! - **Execution log**: Append-only ordered entries with filtered views
//!
//! ## Quick Start
//!
//! ```
//! use dagwire::action::{ActionError, ActionRegistry, Invocation, NodeAction};
//! use dagwire::graph::GraphStore;
//! use dagwire::node::{BoundParameter, Node, NodeConfig, NodeReference};
//! use dagwire::results::ResultStore;
//! use dagwire::event_log::ExecutionLog;
//! use dagwire::runner::Runner;
//! use async_trait::async_trait;
//! use parking_lot::RwLock;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Shell;
//!
//! #[async_trait]
//! impl NodeAction for Shell {
//!     async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError> {
//!         Ok(json!({ "stdout": format!("ran {}", invocation.node.name) }))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = GraphStore::new();
//! graph.add_node(Node::new("fetch", "fetch", NodeConfig::file("fetch.sh")))?;
//! graph.add_node(
//!     Node::new("report", "report", NodeConfig::file("report.sh")).with_parameter(
//!         BoundParameter::reference("input", NodeReference::new("fetch", "result.stdout")),
//!     ),
//! )?;
//! graph.add_edge("fetch", "report")?;
//!
//! let registry = ActionRegistry::new().with_action("file", Arc::new(Shell));
//! let runner = Runner::new(
//!     Arc::new(RwLock::new(graph)),
//!     ResultStore::new(),
//!     ExecutionLog::new(),
//!     registry,
//! );
//!
//! let outcome = runner.run_node("report").await?;
//! assert_eq!(outcome.executed, vec!["fetch", "report"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`node`] - Node configs, parameters, and reference types
//! - [`graph`] - Graph store, cycle rejection, traversal queries
//! - [`resolver`] - Reference discovery and parameter resolution
//! - [`action`] - The `NodeAction` trait and kind-tag dispatch
//! - [`runner`] - Sequential scheduler, admission, cancellation
//! - [`results`] - Per-node result store with change subscriptions
//! - [`event_log`] - Append-only execution log and sinks
//! - [`telemetry`] - Tracing and diagnostics bootstrap

pub mod action;
pub mod event_log;
pub mod graph;
pub mod node;
pub mod resolver;
pub mod results;
pub mod runner;
pub mod telemetry;
pub mod types;

pub use action::{ActionError, ActionRegistry, Invocation, NodeAction};
pub use graph::{Edge, GraphError, GraphStore};
pub use node::{BoundParameter, Node, NodeConfig, NodeReference, ParamBinding, ParamType};
pub use results::{NodeResult, ResultStore};
pub use runner::{CancelHandle, RunOptions, RunOutcome, Runner, RunnerError};
pub use types::{NodeId, NodeStatus, RunId, RunStatus};
