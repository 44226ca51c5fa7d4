//! Reference discovery and run-time parameter resolution.
//!
//! Two responsibilities live here:
//!
//! 1. **Discovery** — [`available_references`] lists every output field a node
//!    may legally bind to: one reference per declared output field of each
//!    upstream node, enriched with observed fields once an upstream has a
//!    successful result. The picker can therefore offer references before
//!    anything has run.
//! 2. **Resolution** — [`resolve`] turns a [`BoundParameter`] into a concrete
//!    [`Value`] at run time: literals are coerced per their declared type,
//!    references are dereferenced against the [`ResultStore`] by walking a
//!    dot path (with `[index]` segments) into the upstream output.
//!
//! Resolution has no side effects and is idempotent, so the UI can call it
//! speculatively for read-only previews with the exact semantics of a real
//! run.
//!
//! # Path grammar
//!
//! `result.data[0].name` — dot-separated segments, each optionally carrying a
//! single `[usize]` suffix. The leading `result` segment is the output
//! envelope and addresses the whole output. Malformed or ambiguous paths
//! resolve to [`ResolveError::FieldNotFound`] rather than a guess.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::graph::{GraphError, GraphStore};
use crate::node::{BoundParameter, Node, NodeReference, ParamBinding, ParamType};
use crate::results::ResultStore;
use crate::types::{NodeId, NodeStatus};

/// Nested-field discovery stops at this depth, matching the picker's cap.
const MAX_FIELD_DEPTH: usize = 2;

/// Errors raised while validating a binding or dereferencing a reference.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// The referenced upstream node has no successful result to read from.
    #[error("upstream node {node_id} is not ready (status: {status})")]
    #[diagnostic(
        code(dagwire::resolver::upstream_not_ready),
        help("Run the upstream node to completion before resolving references into it.")
    )]
    UpstreamNotReady { node_id: NodeId, status: NodeStatus },

    /// The reference path does not resolve within the stored output.
    #[error("field `{field}` not found in output of node {node_id}")]
    #[diagnostic(
        code(dagwire::resolver::field_not_found),
        help("The upstream output shape may have changed since the reference was picked.")
    )]
    FieldNotFound { node_id: NodeId, field: String },

    /// The referenced node is not an ancestor of the parameter's owner.
    #[error("node {node_id} is not an ancestor of {owner}")]
    #[diagnostic(
        code(dagwire::resolver::not_an_ancestor),
        help("A parameter may only reference nodes wired upstream of its owner.")
    )]
    NotAnAncestor { node_id: NodeId, owner: NodeId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

/// List the references `node_id` may bind to.
///
/// Direct predecessors only when `include_transitive` is false; the full
/// ancestor closure when true. Each upstream contributes its whole output,
/// its declared output fields, and — when its latest result is a success with
/// a structured output — observed nested fields up to depth 2 with `[0]`
/// probes into arrays of objects.
pub fn available_references(
    graph: &GraphStore,
    results: &ResultStore,
    node_id: &str,
    include_transitive: bool,
) -> Result<Vec<NodeReference>, GraphError> {
    let upstream = if include_transitive {
        graph.ancestors(node_id)?
    } else {
        graph.predecessors(node_id)?
    };

    let mut references = Vec::new();
    let mut seen: FxHashMap<(NodeId, String), ()> = FxHashMap::default();
    for node in upstream {
        let result = results.get(&node.id);
        let status = result.as_ref().map(|r| r.status).unwrap_or_default();

        // Whole-output reference; annotate pending status for the picker.
        let suffix = match status {
            NodeStatus::Success => String::new(),
            other => format!(" ({other})"),
        };
        push_unique(
            &mut references,
            &mut seen,
            NodeReference::new(node.id.clone(), "result")
                .with_display_path(format!("{} → result{suffix}", node.name)),
        );

        for field in node.config.declared_output_fields() {
            let display = format!("{} → {field}", node.name);
            push_unique(
                &mut references,
                &mut seen,
                NodeReference::new(node.id.clone(), field).with_display_path(display),
            );
        }

        if status == NodeStatus::Success
            && let Some(output) = result.and_then(|r| r.output)
        {
            collect_value_fields(&mut references, &mut seen, node, &output, "result", 0);
        }
    }
    Ok(references)
}

/// Check that `reference` points at an ancestor of `owner`.
///
/// Enforced when the UI proposes a binding, and again by the runner before
/// dereferencing, since the graph can change between binding and run time.
pub fn validate_binding(
    graph: &GraphStore,
    owner: &str,
    reference: &NodeReference,
) -> Result<(), ResolveError> {
    if graph.is_ancestor(&reference.node_id, owner)? {
        Ok(())
    } else {
        Err(ResolveError::NotAnAncestor {
            node_id: reference.node_id.clone(),
            owner: owner.to_string(),
        })
    }
}

/// Materialize one bound parameter.
///
/// Literals are coerced per their declared type; references are dereferenced
/// against `results`. Pure: no side effects, safe to call repeatedly.
pub fn resolve(param: &BoundParameter, results: &ResultStore) -> Result<Value, ResolveError> {
    match &param.binding {
        ParamBinding::Literal { value, ty } => Ok(coerce_literal(value, *ty)),
        ParamBinding::Reference(reference) => resolve_reference(reference, results),
    }
}

/// Resolve every enabled parameter of `node` into a key -> value map.
pub fn resolve_parameters(
    node: &Node,
    results: &ResultStore,
) -> Result<FxHashMap<String, Value>, ResolveError> {
    let mut resolved = FxHashMap::default();
    for param in node.parameters.iter().filter(|p| p.enabled) {
        resolved.insert(param.key.clone(), resolve(param, results)?);
    }
    Ok(resolved)
}

/// Dereference a single [`NodeReference`] against the result store.
pub fn resolve_reference(
    reference: &NodeReference,
    results: &ResultStore,
) -> Result<Value, ResolveError> {
    let result = results
        .get(&reference.node_id)
        .ok_or_else(|| ResolveError::UpstreamNotReady {
            node_id: reference.node_id.clone(),
            status: NodeStatus::Idle,
        })?;
    // An errored upstream never yields its stale prior-success output.
    if result.status != NodeStatus::Success {
        return Err(ResolveError::UpstreamNotReady {
            node_id: reference.node_id.clone(),
            status: result.status,
        });
    }
    let output = result.output.unwrap_or(Value::Null);
    extract_path(&output, &reference.field).ok_or_else(|| ResolveError::FieldNotFound {
        node_id: reference.node_id.clone(),
        field: reference.field.clone(),
    })
}

/// Coerce a literal string per its declared type.
///
/// Parse failure is never fatal: the value degrades to its raw string form,
/// matching the editor's forgiving behavior.
#[must_use]
pub fn coerce_literal(raw: &str, ty: ParamType) -> Value {
    match ty {
        ParamType::String => Value::String(raw.to_string()),
        ParamType::Number => {
            let trimmed = raw.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                Value::Number(n.into())
            } else if let Some(n) = trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Value::Number(n)
            } else {
                Value::String(raw.to_string())
            }
        }
        ParamType::Boolean => match raw.trim().to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        ParamType::Object | ParamType::Array => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
    }
}

/// Walk a dot path into `output`. `None` on any missing segment, malformed
/// path, bad index, or traversal into a scalar.
#[must_use]
pub fn extract_path(output: &Value, path: &str) -> Option<Value> {
    let mut current = output.clone();
    for (i, segment) in path.split('.').enumerate() {
        let (name, index) = parse_segment(segment)?;
        // The leading `result` segment addresses the whole output.
        if i == 0 && name == "result" {
            if let Some(idx) = index {
                current = current.get(idx)?.clone();
            }
            continue;
        }
        if name.is_empty() {
            return None;
        }
        current = current.get(name)?.clone();
        if let Some(idx) = index {
            current = current.get(idx)?.clone();
        }
    }
    Some(current)
}

/// Split `name[3]` into `("name", Some(3))`; plain segments carry no index.
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        None => Some((segment, None)),
        Some(open) => {
            let close = segment.find(']')?;
            if close != segment.len() - 1 || close <= open {
                return None;
            }
            let index: usize = segment[open + 1..close].parse().ok()?;
            Some((&segment[..open], Some(index)))
        }
    }
}

fn push_unique(
    references: &mut Vec<NodeReference>,
    seen: &mut FxHashMap<(NodeId, String), ()>,
    reference: NodeReference,
) {
    let key = (reference.node_id.clone(), reference.field.clone());
    if seen.insert(key, ()).is_none() {
        references.push(reference);
    }
}

/// Recursively offer references into an observed output value.
///
/// Objects contribute one reference per key; arrays of objects contribute
/// `[0]`-probe references based on the first element's keys.
fn collect_value_fields(
    references: &mut Vec<NodeReference>,
    seen: &mut FxHashMap<(NodeId, String), ()>,
    node: &Node,
    value: &Value,
    path: &str,
    depth: usize,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let field = format!("{path}.{key}");
                push_unique(
                    references,
                    seen,
                    NodeReference::new(node.id.clone(), field.clone())
                        .with_display_path(format!("{} → {field}", node.name)),
                );
                if nested.is_object() || nested.is_array() {
                    collect_value_fields(references, seen, node, nested, &field, depth + 1);
                }
            }
        }
        Value::Array(items) => {
            if let Some(Value::Object(first)) = items.first() {
                for key in first.keys() {
                    let field = format!("{path}[0].{key}");
                    push_unique(
                        references,
                        seen,
                        NodeReference::new(node.id.clone(), field.clone())
                            .with_display_path(format!("{} → {field}", node.name)),
                    );
                }
            }
        }
        _ => {}
    }
}
