//! Per-node execution results and the shared store that owns them.
//!
//! The [`ResultStore`] is the single place execution state lives: the runner
//! writes status transitions into it and the resolver plus the UI read from
//! it, concurrently. Writes replace the whole [`NodeResult`] under one write
//! lock, so a reader can never observe a torn status/output/error triple;
//! reads of a not-yet-updated entry are expected and acceptable within a run.
//!
//! # Examples
//!
//! ```rust
//! use dagwire::results::{NodeResult, ResultStore};
//! use dagwire::types::NodeStatus;
//! use serde_json::json;
//!
//! let store = ResultStore::new();
//! store.set(NodeResult::running("n1", "fetch"));
//! store.set(NodeResult::success("n1", "fetch", json!({"rows": 3})));
//!
//! let result = store.get("n1").unwrap();
//! assert_eq!(result.status, NodeStatus::Success);
//! assert_eq!(result.output.unwrap()["rows"], 3);
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::types::{NodeId, NodeStatus};

/// Execution record of one node's latest run attempt.
///
/// Created lazily on the first run attempt and overwritten on every
/// subsequent run of the same node; no history is retained beyond the latest
/// attempt. `output` is present iff `status == Success`, `error` iff
/// `status == Error`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub node_id: NodeId,
    pub node_name: String,
    pub status: NodeStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl NodeResult {
    /// A fresh record for a node that just entered `Running`.
    pub fn running(node_id: impl Into<NodeId>, node_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            status: NodeStatus::Running,
            output: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// A terminal `Success` record carrying the recorded output.
    pub fn success(node_id: impl Into<NodeId>, node_name: impl Into<String>, output: Value) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            status: NodeStatus::Success,
            output: Some(output),
            error: None,
            started_at: Utc::now(),
            finished_at: Some(Utc::now()),
        }
    }

    /// A terminal `Error` record carrying the failure message verbatim.
    pub fn error(
        node_id: impl Into<NodeId>,
        node_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            status: NodeStatus::Error,
            output: None,
            error: Some(message.into()),
            started_at: Utc::now(),
            finished_at: Some(Utc::now()),
        }
    }

    /// Complete a `Running` record into `Success`, keeping `started_at`.
    #[must_use]
    pub fn completed(mut self, output: Value) -> Self {
        self.status = NodeStatus::Success;
        self.output = Some(output);
        self.error = None;
        self.finished_at = Some(Utc::now());
        self
    }

    /// Complete a `Running` record into `Error`, keeping `started_at`.
    #[must_use]
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = NodeStatus::Error;
        self.output = None;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        self
    }
}

#[derive(Default)]
struct ResultStoreInner {
    results: FxHashMap<NodeId, NodeResult>,
    subscribers: Vec<flume::Sender<NodeResult>>,
}

/// Keyed store of the latest [`NodeResult`] per node.
///
/// Cheap to clone; clones share the same underlying map. Every write
/// broadcasts the new record to subscribers so the UI can update status
/// badges live without polling.
#[derive(Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<ResultStoreInner>>,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest result for `node_id`, or `None` if the node never ran.
    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<NodeResult> {
        self.inner.read().results.get(node_id).cloned()
    }

    /// Current status of `node_id`; `Idle` when no record exists.
    #[must_use]
    pub fn status(&self, node_id: &str) -> NodeStatus {
        self.inner
            .read()
            .results
            .get(node_id)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    /// Replace the record for the result's node atomically and notify
    /// subscribers.
    pub fn set(&self, result: NodeResult) {
        let mut inner = self.inner.write();
        inner.results.insert(result.node_id.clone(), result.clone());
        inner.subscribers.retain(|tx| tx.send(result.clone()).is_ok());
    }

    /// Drop the record for `node_id`, resetting it to `Idle`.
    pub fn clear(&self, node_id: &str) {
        self.inner.write().results.remove(node_id);
    }

    /// Drop every record.
    pub fn clear_all(&self) {
        self.inner.write().results.clear();
    }

    /// Snapshot of all records, for result panels.
    #[must_use]
    pub fn snapshot(&self) -> FxHashMap<NodeId, NodeResult> {
        self.inner.read().results.clone()
    }

    /// Subscribe to result changes. Each write delivers the full new record;
    /// dropped receivers are pruned on the next write.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<NodeResult> {
        let (tx, rx) = flume::unbounded();
        self.inner.write().subscribers.push(tx);
        rx
    }
}
