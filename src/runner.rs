//! Sequential execution scheduler.
//!
//! [`Runner::run_node`] executes a target node together with every ancestor
//! that has not yet succeeded, strictly one at a time in the graph's
//! deterministic topological order. Actions share process-wide side effects
//! (log ordering, connections), so branches are never fanned out in parallel
//! even when the graph would allow it; linearizable logs are worth the
//! wall-clock cost.
//!
//! Exactly one run may be in flight at a time. A second `run_node` issued
//! mid-run is rejected with [`RunnerError::AlreadyRunning`] and touches
//! nothing. A [`CancelHandle`] aborts a run between node steps: the node
//! already in flight finishes and its result is recorded, but nothing after
//! it starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use miette::Diagnostic;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::action::{ActionRegistry, Invocation};
use crate::event_log::{ExecutionLog, LogEntry, LogKind};
use crate::graph::{GraphError, GraphStore};
use crate::node::Node;
use crate::resolver;
use crate::results::{NodeResult, ResultStore};
use crate::types::{new_run_id, NodeId, NodeStatus, RunId, RunStatus};

/// Errors surfaced directly to the caller of [`Runner::run_node`].
///
/// Run-time failures inside a run (resolution, action errors) are not here;
/// they land in the failing node's [`NodeResult`] and in the returned
/// [`RunOutcome`] instead.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// Another run is in flight. Overlapping runs could race on node state,
    /// so admission rejects instead of queueing.
    #[error("a run is already in progress")]
    #[diagnostic(
        code(dagwire::runner::already_running),
        help("Wait for the current run to finish, or cancel it first.")
    )]
    AlreadyRunning,
}

/// Caller-tunable knobs for one run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    /// Re-execute ancestors even when their last result is a success.
    pub force_rerun: bool,
}

/// The failing node of an errored run, with its message verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub node_id: NodeId,
    pub message: String,
}

/// Summary of one `run_node` invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub target: NodeId,
    /// Node ids actually executed, in execution order.
    pub executed: Vec<NodeId>,
    /// Node ids skipped because their last result was already a success.
    pub skipped: Vec<NodeId>,
    pub status: RunStatus,
    pub failure: Option<RunFailure>,
}

/// Aborts an in-flight run between node steps.
///
/// Cheap to clone; safe to trigger from any thread. The node currently
/// executing is allowed to finish and its result is recorded.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Releases the admission flag when a run exits by any path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives node execution over a shared [`GraphStore`].
///
/// The graph lives behind a lock so the composer can keep editing between
/// runs; each run works from a snapshot taken at admission, so a mid-run
/// edit never changes an order already being executed.
#[derive(Clone)]
pub struct Runner {
    graph: Arc<RwLock<GraphStore>>,
    results: ResultStore,
    log: ExecutionLog,
    registry: Arc<ActionRegistry>,
    running: Arc<AtomicBool>,
    last_outcome: Arc<Mutex<Option<RunOutcome>>>,
}

impl Runner {
    pub fn new(
        graph: Arc<RwLock<GraphStore>>,
        results: ResultStore,
        log: ExecutionLog,
        registry: ActionRegistry,
    ) -> Self {
        Self {
            graph,
            results,
            log,
            registry: Arc::new(registry),
            running: Arc::new(AtomicBool::new(false)),
            last_outcome: Arc::new(Mutex::new(None)),
        }
    }

    pub fn graph(&self) -> &Arc<RwLock<GraphStore>> {
        &self.graph
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// The outcome of the most recent run, if any run has completed.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome.lock().clone()
    }

    /// Remove a node from the graph, dropping its stored result and its log
    /// entries with it. Incident edges go away with the node.
    pub fn remove_node(&self, node_id: &str) -> Result<Node, RunnerError> {
        let removed = self.graph.write().remove_node(node_id)?;
        self.results.clear(node_id);
        self.log.clear_node(&removed.id);
        Ok(removed)
    }

    /// Execute `target` and its not-yet-successful ancestors with default
    /// options and no cancellation.
    pub async fn run_node(&self, target: &str) -> Result<RunOutcome, RunnerError> {
        self.run_node_with(target, RunOptions::default(), &CancelHandle::new())
            .await
    }

    /// Execute `target` under explicit options and an external cancel handle.
    ///
    /// Nodes execute strictly sequentially in the graph's deterministic
    /// topological order. The first resolution or action failure marks that
    /// node `error` and aborts the rest of the order; nodes after it keep
    /// their pre-run status. Structural problems (unknown target) surface as
    /// [`RunnerError`] before anything is touched.
    #[instrument(skip(self, cancel), fields(target = %target))]
    pub async fn run_node_with(
        &self,
        target: &str,
        options: RunOptions,
        cancel: &CancelHandle,
    ) -> Result<RunOutcome, RunnerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RunnerError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        // Snapshot the graph so concurrent edits cannot reorder this run.
        let graph = self.graph.read().clone();
        let order = graph.execution_order(target)?;
        let run_id = new_run_id();
        tracing::info!(run_id = %run_id, order = ?order, "run admitted");

        let mut outcome = RunOutcome {
            run_id: run_id.clone(),
            target: target.to_string(),
            executed: Vec::new(),
            skipped: Vec::new(),
            status: RunStatus::Success,
            failure: None,
        };

        for node_id in &order {
            if cancel.is_cancelled() {
                tracing::info!(run_id = %run_id, at = %node_id, "run cancelled");
                outcome.status = RunStatus::Cancelled;
                break;
            }

            // Skipping is a shortcut on last-known status, not a freshness
            // check; the target itself always re-runs.
            let is_target = node_id == target;
            if !options.force_rerun
                && !is_target
                && self.results.status(node_id) == NodeStatus::Success
            {
                outcome.skipped.push(node_id.clone());
                continue;
            }

            // Ids in `order` come from the snapshot, so the lookup holds.
            let node = graph.node(node_id)?.clone();

            if let Err(message) = self.execute_one(&graph, &node, &run_id).await {
                outcome.executed.push(node_id.clone());
                outcome.status = RunStatus::Error;
                outcome.failure = Some(RunFailure {
                    node_id: node_id.clone(),
                    message,
                });
                break;
            }
            outcome.executed.push(node_id.clone());
        }

        *self.last_outcome.lock() = Some(outcome.clone());
        tracing::info!(run_id = %run_id, status = ?outcome.status, "run finished");
        Ok(outcome)
    }

    /// Run one node to a terminal status. `Err` carries the recorded failure
    /// message; the caller aborts the remainder of the order.
    async fn execute_one(
        &self,
        graph: &GraphStore,
        node: &Node,
        run_id: &RunId,
    ) -> Result<(), String> {
        self.results
            .set(NodeResult::running(node.id.clone(), node.name.clone()));
        self.log.append(
            LogEntry::new(
                node.id.clone(),
                node.name.clone(),
                LogKind::Info,
                format!("Starting {}", node.name),
            )
            .with_run_id(run_id.clone()),
        );

        let params = match self.resolve_all(graph, node) {
            Ok(params) => params,
            Err(message) => {
                self.fail_node(node, run_id, &message);
                return Err(message);
            }
        };

        let invocation = Invocation {
            node: node.clone(),
            params,
            run_id: run_id.clone(),
        };
        match self.registry.dispatch(invocation).await {
            Ok(output) => {
                self.results.set(NodeResult::success(
                    node.id.clone(),
                    node.name.clone(),
                    output,
                ));
                self.log.append(
                    LogEntry::new(
                        node.id.clone(),
                        node.name.clone(),
                        LogKind::Success,
                        format!("{} completed", node.name),
                    )
                    .with_run_id(run_id.clone()),
                );
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.fail_node(node, run_id, &message);
                Err(message)
            }
        }
    }

    /// Resolve every enabled parameter, revalidating ancestry first. The
    /// graph may have been rewired since a binding was picked, so binding
    /// validity is never assumed at run time.
    fn resolve_all(
        &self,
        graph: &GraphStore,
        node: &Node,
    ) -> Result<rustc_hash::FxHashMap<String, serde_json::Value>, String> {
        for param in node.parameters.iter().filter(|p| p.enabled) {
            if let crate::node::ParamBinding::Reference(reference) = &param.binding {
                resolver::validate_binding(graph, &node.id, reference)
                    .map_err(|e| e.to_string())?;
            }
        }
        resolver::resolve_parameters(node, &self.results).map_err(|e| e.to_string())
    }

    fn fail_node(&self, node: &Node, run_id: &RunId, message: &str) {
        // The message is recorded verbatim; no rewriting or truncation.
        self.results.set(NodeResult::error(
            node.id.clone(),
            node.name.clone(),
            message,
        ));
        self.log.append(
            LogEntry::new(
                node.id.clone(),
                node.name.clone(),
                LogKind::Error,
                message,
            )
            .with_run_id(run_id.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionError, NodeAction};
    use crate::node::NodeConfig;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Echo;

    #[async_trait]
    impl NodeAction for Echo {
        async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError> {
            Ok(json!({ "node": invocation.node.id }))
        }
    }

    fn single_node_runner() -> Runner {
        let mut graph = GraphStore::new();
        graph
            .add_node(Node::new("only", "only", NodeConfig::file("only.sh")))
            .unwrap();
        let registry = ActionRegistry::new().with_action("file", Arc::new(Echo));
        Runner::new(
            Arc::new(RwLock::new(graph)),
            ResultStore::new(),
            ExecutionLog::new(),
            registry,
        )
    }

    #[tokio::test]
    async fn unknown_target_is_a_structural_error() {
        let runner = single_node_runner();
        let err = runner.run_node("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            RunnerError::Graph(GraphError::NodeNotFound { .. })
        ));
        assert!(runner.last_outcome().is_none());
    }

    #[tokio::test]
    async fn outcome_is_retained_for_later_queries() {
        let runner = single_node_runner();
        let outcome = runner.run_node("only").await.unwrap();
        assert_eq!(outcome.status, RunStatus::Success);
        let retained = runner.last_outcome().unwrap();
        assert_eq!(retained.run_id, outcome.run_id);
        assert_eq!(retained.executed, vec!["only"]);
    }

    #[tokio::test]
    async fn target_reruns_even_when_already_successful() {
        let runner = single_node_runner();
        runner.run_node("only").await.unwrap();
        let outcome = runner.run_node("only").await.unwrap();
        assert_eq!(outcome.executed, vec!["only"]);
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn cancel_before_start_runs_nothing() {
        let runner = single_node_runner();
        let cancel = CancelHandle::new();
        cancel.cancel();
        let outcome = runner
            .run_node_with("only", RunOptions::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert!(outcome.executed.is_empty());
        assert_eq!(runner.results().status("only"), NodeStatus::Idle);
    }
}
