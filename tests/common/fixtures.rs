use std::sync::Arc;

use dagwire::action::{ActionRegistry, NodeAction};
use dagwire::event_log::ExecutionLog;
use dagwire::graph::GraphStore;
use dagwire::node::{Node, NodeConfig};
use dagwire::results::ResultStore;
use dagwire::runner::Runner;
use parking_lot::RwLock;

/// A file node whose name matches its id.
pub fn file_node(id: &str) -> Node {
    Node::new(id, id, NodeConfig::file(format!("{id}.sh")))
}

/// Build a linear chain `ids[0] -> ids[1] -> ...` of file nodes.
pub fn chain_graph(ids: &[&str]) -> GraphStore {
    let mut graph = GraphStore::new();
    for id in ids {
        graph.add_node(file_node(id)).unwrap();
    }
    for pair in ids.windows(2) {
        graph.add_edge(pair[0], pair[1]).unwrap();
    }
    graph
}

/// A runner over `graph` with `action` handling every file node.
pub fn runner_with(graph: GraphStore, action: Arc<dyn NodeAction>) -> Runner {
    let registry = ActionRegistry::new().with_action("file", action);
    Runner::new(
        Arc::new(RwLock::new(graph)),
        ResultStore::new(),
        ExecutionLog::new(),
        registry,
    )
}
