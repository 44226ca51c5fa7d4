//! Node, configuration, and parameter-binding types.
//!
//! A [`Node`] is a vertex in the pipeline graph. Its behavior is fully
//! described by its [`NodeConfig`], a tagged union with one variant per node
//! kind (file/script execution, HTTP API call, database query). The engine
//! never interprets configs beyond dispatching on the kind; the actual
//! connectors live behind the [`NodeAction`](crate::action::NodeAction) seam.
//!
//! Inputs of a node are [`BoundParameter`]s: each one is either a typed
//! literal or a [`NodeReference`] pointing into an upstream node's output.
//! The two modes are mutually exclusive by construction ([`ParamBinding`]).
//!
//! # Examples
//!
//! ```rust
//! use dagwire::node::{Node, NodeConfig, BoundParameter, ParamType};
//!
//! let node = Node::new("n1", "fetch-users", NodeConfig::api("GET", "https://api.example.com/users"))
//!     .with_parameter(BoundParameter::literal("limit", "25", ParamType::Number));
//!
//! assert_eq!(node.kind_tag(), "api");
//! assert!(node.config.declared_output_fields().contains(&"result.status".to_string()));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{NodeId, Position};

/// A vertex in the pipeline graph.
///
/// Owned by the [`GraphStore`](crate::graph::GraphStore); created and edited
/// by the UI layer, read-only for the runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, stable identifier.
    pub id: NodeId,
    /// Human-readable label used in log entries and reference display paths.
    pub name: String,
    /// Kind-specific configuration.
    pub config: NodeConfig,
    /// Declared inputs; resolved against upstream results at run time.
    #[serde(default)]
    pub parameters: Vec<BoundParameter>,
    /// Canvas layout position. Irrelevant to execution.
    #[serde(default)]
    pub position: Position,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, config: NodeConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            config,
            parameters: Vec::new(),
            position: Position::default(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, param: BoundParameter) -> Self {
        self.parameters.push(param);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Stable discriminator of the node's kind, used for action dispatch.
    #[must_use]
    pub fn kind_tag(&self) -> &'static str {
        self.config.kind_tag()
    }
}

/// Kind-specific node configuration.
///
/// One exhaustive variant per node kind; both the reference picker (declared
/// output shapes) and action dispatch match on this union rather than doing
/// open-ended shape checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeConfig {
    /// Execute a file or script on the local machine.
    File {
        path: String,
        /// Interpreter override (e.g. `python3`); `None` runs the file directly.
        #[serde(default)]
        interpreter: Option<String>,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Perform an HTTP request.
    Api {
        method: String,
        url: String,
        #[serde(default)]
        headers: Vec<KeyValue>,
        #[serde(default)]
        query: Vec<KeyValue>,
        #[serde(default)]
        body: Option<RequestBody>,
        #[serde(default)]
        auth: ApiAuth,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default = "default_true")]
        follow_redirects: bool,
    },
    /// Run a query against a database connection.
    Database {
        connection: ConnectionDescriptor,
        query: String,
        #[serde(default)]
        max_rows: Option<u64>,
        #[serde(default)]
        timeout_ms: Option<u64>,
        /// Column projection applied to the raw rows; ignored when
        /// `select_all_columns` is set.
        #[serde(default)]
        columns: Vec<ColumnSelection>,
        #[serde(default = "default_true")]
        select_all_columns: bool,
        #[serde(default)]
        post_process: Option<PostProcessScript>,
    },
}

fn default_true() -> bool {
    true
}

impl NodeConfig {
    /// Shorthand for a file node without interpreter or arguments.
    pub fn file(path: impl Into<String>) -> Self {
        NodeConfig::File {
            path: path.into(),
            interpreter: None,
            args: Vec::new(),
        }
    }

    /// Shorthand for a bare API node.
    pub fn api(method: impl Into<String>, url: impl Into<String>) -> Self {
        NodeConfig::Api {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            auth: ApiAuth::None,
            timeout_ms: None,
            follow_redirects: true,
        }
    }

    /// Shorthand for a database node with defaults.
    pub fn database(connection: ConnectionDescriptor, query: impl Into<String>) -> Self {
        NodeConfig::Database {
            connection,
            query: query.into(),
            max_rows: None,
            timeout_ms: None,
            columns: Vec::new(),
            select_all_columns: true,
            post_process: None,
        }
    }

    /// Stable discriminator used as the action-registry key.
    #[must_use]
    pub fn kind_tag(&self) -> &'static str {
        match self {
            NodeConfig::File { .. } => "file",
            NodeConfig::Api { .. } => "api",
            NodeConfig::Database { .. } => "database",
        }
    }

    /// Output field paths this kind is declared to produce.
    ///
    /// The reference picker offers these before the node has ever run; once a
    /// run succeeds, the resolver enriches the list from the observed output.
    /// The leading `result` path addresses the whole output value.
    #[must_use]
    pub fn declared_output_fields(&self) -> Vec<String> {
        let fields: &[&str] = match self {
            NodeConfig::File { .. } => &["result", "result.stdout", "result.stderr", "result.exit_code"],
            NodeConfig::Api { .. } => &[
                "result",
                "result.status",
                "result.status_text",
                "result.headers",
                "result.data",
            ],
            NodeConfig::Database { .. } => {
                &["result", "result.data", "result.row_count", "result.columns"]
            }
        };
        fields.iter().map(|f| (*f).to_string()).collect()
    }
}

/// Enabled key/value pair for headers and query parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

/// HTTP request body variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RequestBody {
    Raw { content: String, content_type: String },
    FormData { fields: Vec<KeyValue> },
    Urlencoded { fields: Vec<KeyValue> },
}

/// Authentication applied to an API node's request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ApiAuth {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
        /// `header` or `query`; where the key is injected.
        add_to: ApiKeyLocation,
    },
}

/// Placement of an API-key credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// Database connection descriptor, discriminated by engine.
///
/// Each engine carries only the fields its driver needs; the engine tag is
/// what the external connector dispatches on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum ConnectionDescriptor {
    Sqlite {
        path: String,
    },
    Postgres {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
    },
    Oracle {
        host: String,
        port: u16,
        service_name: String,
        username: String,
        password: String,
    },
}

impl ConnectionDescriptor {
    /// Engine discriminator, mirrored into log messages.
    #[must_use]
    pub fn engine(&self) -> &'static str {
        match self {
            ConnectionDescriptor::Sqlite { .. } => "sqlite",
            ConnectionDescriptor::Postgres { .. } => "postgres",
            ConnectionDescriptor::Oracle { .. } => "oracle",
        }
    }
}

/// Per-column projection entry for database nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub column_name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Post-processing script applied to a database node's rows by its connector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostProcessScript {
    pub language: String,
    pub code: String,
}

/// Declared type of a literal parameter value.
///
/// Drives coercion in [`resolve`](crate::resolver::resolve): numeric and
/// boolean strings are parsed, object/array strings are parsed as JSON with
/// the raw string retained on parse failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        };
        write!(f, "{label}")
    }
}

/// A resolved pointer to one output field of an upstream node.
///
/// `field` is a dot path into the upstream output (`result.data[0].name`);
/// `display_path` is a human-readable label only and never used for
/// resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReference {
    pub node_id: NodeId,
    pub field: String,
    pub display_path: String,
}

impl NodeReference {
    pub fn new(node_id: impl Into<NodeId>, field: impl Into<String>) -> Self {
        let node_id = node_id.into();
        let field = field.into();
        let display_path = format!("{node_id} → {field}");
        Self {
            node_id,
            field,
            display_path,
        }
    }

    #[must_use]
    pub fn with_display_path(mut self, display_path: impl Into<String>) -> Self {
        self.display_path = display_path.into();
        self
    }
}

/// The two mutually exclusive binding modes of a parameter.
///
/// Switching modes in the editor discards the other side, so exactly one is
/// ever populated; the enum makes that invariant structural.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ParamBinding {
    /// A literal value entered by the user, coerced per its declared type.
    Literal { value: String, ty: ParamType },
    /// A reference into an upstream node's prior output.
    Reference(NodeReference),
}

/// A node's declared input: a key plus its binding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundParameter {
    pub key: String,
    pub binding: ParamBinding,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl BoundParameter {
    /// A literal-bound parameter.
    pub fn literal(key: impl Into<String>, value: impl Into<String>, ty: ParamType) -> Self {
        Self {
            key: key.into(),
            binding: ParamBinding::Literal {
                value: value.into(),
                ty,
            },
            enabled: true,
        }
    }

    /// A reference-bound parameter.
    pub fn reference(key: impl Into<String>, reference: NodeReference) -> Self {
        Self {
            key: key.into(),
            binding: ParamBinding::Reference(reference),
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(NodeConfig::file("a.sh").kind_tag(), "file");
        assert_eq!(NodeConfig::api("GET", "http://x").kind_tag(), "api");
        let conn = ConnectionDescriptor::Sqlite { path: "db.sqlite".into() };
        assert_eq!(NodeConfig::database(conn, "select 1").kind_tag(), "database");
    }

    #[test]
    fn declared_fields_include_whole_output() {
        for config in [
            NodeConfig::file("a.sh"),
            NodeConfig::api("GET", "http://x"),
            NodeConfig::database(
                ConnectionDescriptor::Sqlite { path: "db.sqlite".into() },
                "select 1",
            ),
        ] {
            assert_eq!(config.declared_output_fields()[0], "result");
        }
    }

    #[test]
    fn config_kind_round_trips_through_serde() {
        let config = NodeConfig::database(
            ConnectionDescriptor::Postgres {
                host: "localhost".into(),
                port: 5432,
                database: "app".into(),
                username: "svc".into(),
                password: "secret".into(),
            },
            "select * from users",
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["kind"], "database");
        assert_eq!(json["connection"]["engine"], "postgres");
        let back: NodeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn binding_modes_are_exclusive() {
        let lit = BoundParameter::literal("limit", "10", ParamType::Number);
        assert!(matches!(lit.binding, ParamBinding::Literal { .. }));

        let reference = BoundParameter::reference("rows", NodeReference::new("up", "result.data"));
        match reference.binding {
            ParamBinding::Reference(r) => {
                assert_eq!(r.node_id, "up");
                assert_eq!(r.display_path, "up → result.data");
            }
            ParamBinding::Literal { .. } => panic!("expected reference binding"),
        }
    }
}
