use std::sync::Arc;

use async_trait::async_trait;
use dagwire::action::{ActionError, Invocation, NodeAction};
use dagwire::runner::CancelHandle;
use dagwire::types::NodeId;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Succeeds for every node, echoing the node id and resolved parameters.
#[derive(Debug, Clone, Default)]
pub struct EchoAction;

#[async_trait]
impl NodeAction for EchoAction {
    async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError> {
        let params: serde_json::Map<String, Value> =
            invocation.params.clone().into_iter().collect();
        Ok(json!({ "node": invocation.node.id, "params": params }))
    }
}

/// Fails for one configured node id, succeeds (echo) for everything else.
#[derive(Debug, Clone)]
pub struct FailAtAction {
    pub fail_node: NodeId,
    pub message: &'static str,
}

impl FailAtAction {
    pub fn new(fail_node: impl Into<NodeId>, message: &'static str) -> Self {
        Self {
            fail_node: fail_node.into(),
            message,
        }
    }
}

#[async_trait]
impl NodeAction for FailAtAction {
    async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError> {
        if invocation.node.id == self.fail_node {
            return Err(ActionError::failed(self.message));
        }
        EchoAction.execute(invocation).await
    }
}

/// Records the ids it executes, in order, and echoes.
#[derive(Debug, Clone, Default)]
pub struct RecordingAction {
    executed: Arc<Mutex<Vec<NodeId>>>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> Vec<NodeId> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl NodeAction for RecordingAction {
    async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError> {
        self.executed.lock().push(invocation.node.id.clone());
        EchoAction.execute(invocation).await
    }
}

/// Cancels the run from inside a configured node's execution, then succeeds.
/// The node in flight finishes; nothing after it starts.
#[derive(Debug, Clone)]
pub struct CancelDuringAction {
    pub cancel_node: NodeId,
    pub handle: CancelHandle,
}

impl CancelDuringAction {
    pub fn new(cancel_node: impl Into<NodeId>, handle: CancelHandle) -> Self {
        Self {
            cancel_node: cancel_node.into(),
            handle,
        }
    }
}

#[async_trait]
impl NodeAction for CancelDuringAction {
    async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError> {
        if invocation.node.id == self.cancel_node {
            self.handle.cancel();
        }
        EchoAction.execute(invocation).await
    }
}
