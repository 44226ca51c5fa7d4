//! The execution seam between the scheduler and node side effects.
//!
//! The runner never performs I/O itself. Each node kind (`file`, `api`,
//! `database`) registers a [`NodeAction`] in an [`ActionRegistry`]; the
//! runner resolves parameters, builds an [`Invocation`], and dispatches by
//! the node's kind tag. Tests and embedders swap in their own actions the
//! same way.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::node::Node;
use crate::types::RunId;

/// Everything an action needs to execute one node.
///
/// `params` holds the node's enabled parameters, already resolved to concrete
/// values. The action never reads upstream results directly.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub node: Node,
    pub params: FxHashMap<String, Value>,
    pub run_id: RunId,
}

/// Errors an action can surface to the scheduler.
#[derive(Debug, Error, Diagnostic)]
pub enum ActionError {
    /// The action ran and failed. The message is recorded verbatim in the
    /// node's result and the execution log.
    #[error("{message}")]
    #[diagnostic(code(dagwire::action::failed))]
    Failed { message: String },

    /// No action is registered for the node's kind tag.
    #[error("no action registered for node kind `{kind}`")]
    #[diagnostic(
        code(dagwire::action::unsupported),
        help("Register an action for this kind before running the graph.")
    )]
    Unsupported { kind: String },
}

impl ActionError {
    pub fn failed(message: impl Into<String>) -> Self {
        ActionError::Failed {
            message: message.into(),
        }
    }
}

/// One node execution strategy.
///
/// Implementations must be deterministic with respect to the invocation where
/// possible; the scheduler records whatever [`Value`] they return as the
/// node's output, unchanged.
#[async_trait]
pub trait NodeAction: Send + Sync {
    async fn execute(&self, invocation: Invocation) -> Result<Value, ActionError>;
}

/// Kind-tag dispatch table for [`NodeAction`]s.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: FxHashMap<String, Arc<dyn NodeAction>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action for a kind tag, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, action: Arc<dyn NodeAction>) {
        self.actions.insert(kind.into(), action);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_action(mut self, kind: impl Into<String>, action: Arc<dyn NodeAction>) -> Self {
        self.register(kind, action);
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn NodeAction>> {
        self.actions.get(kind).cloned()
    }

    /// Dispatch an invocation to the action registered for its node's kind.
    pub async fn dispatch(&self, invocation: Invocation) -> Result<Value, ActionError> {
        let kind = invocation.node.config.kind_tag();
        let action = self.get(kind).ok_or_else(|| ActionError::Unsupported {
            kind: kind.to_string(),
        })?;
        action.execute(invocation).await
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ActionRegistry").field("kinds", &kinds).finish()
    }
}
