//! Core identifier and status types for the dagwire engine.
//!
//! This module defines the fundamental types shared across the graph store,
//! runner, and result store. Everything here is plain data: identifiers,
//! layout coordinates, and the per-node execution state machine.
//!
//! # Key Types
//!
//! - [`NodeId`] / [`RunId`]: stable string identifiers for nodes and runs
//! - [`NodeStatus`]: the per-node execution state machine
//! - [`RunStatus`]: terminal status of a whole `run_node` invocation
//! - [`Position`]: layout coordinates, irrelevant to execution semantics
//!
//! # Examples
//!
//! ```rust
//! use dagwire::types::{NodeStatus, new_run_id};
//!
//! let status = NodeStatus::Idle;
//! assert!(!status.is_terminal());
//! assert!(NodeStatus::Success.is_terminal());
//!
//! let run_id = new_run_id();
//! assert!(run_id.starts_with("run_"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, stable identifier of a node within the graph.
///
/// Node ids are opaque strings chosen by the caller (the visual editor assigns
/// them at node-creation time) and never reinterpreted by the engine.
pub type NodeId = String;

/// Identifier grouping all log entries and results of one `run_node` call.
pub type RunId = String;

/// Mint a fresh run identifier.
///
/// Run ids are `run_`-prefixed v4 UUIDs so log entries from different runs
/// never collide even when runs start within the same millisecond.
#[must_use]
pub fn new_run_id() -> RunId {
    format!("run_{}", uuid::Uuid::new_v4())
}

/// Execution state of a single node.
///
/// Transitions are driven only by the runner:
///
/// ```text
/// Idle ──► Running ──► Success
///             │
///             └──────► Error
/// Success | Error ──► Running   (re-run, fresh result)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Never executed, or reset after the backing result was cleared.
    #[default]
    Idle,
    /// Currently executing inside a run.
    Running,
    /// Last execution completed and an output value was recorded.
    Success,
    /// Last execution failed; the error message is recorded verbatim.
    Error,
}

impl NodeStatus {
    /// Whether this status ends a node's participation in a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeStatus::Idle => "idle",
            NodeStatus::Running => "running",
            NodeStatus::Success => "success",
            NodeStatus::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Terminal status of one `run_node` invocation as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every node in the execution order finished with `Success`.
    Success,
    /// A node failed to resolve its inputs or its action failed; the
    /// remainder of the order was aborted.
    Error,
    /// The caller requested cancellation between node steps.
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
            RunStatus::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

/// Canvas coordinates of a node. Layout only; never consulted for execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(NodeStatus::Success.is_terminal());
        assert!(NodeStatus::Error.is_terminal());
        assert!(!NodeStatus::Idle.is_terminal());
        assert!(!NodeStatus::Running.is_terminal());
    }

    #[test]
    fn run_ids_are_unique() {
        let a = new_run_id();
        let b = new_run_id();
        assert_ne!(a, b);
        assert!(a.starts_with("run_"));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&NodeStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
