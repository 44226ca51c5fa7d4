use super::*;
use crate::node::{Node, NodeConfig};

fn file_node(id: &str) -> Node {
    Node::new(id, format!("node-{id}"), NodeConfig::file(format!("{id}.sh")))
}

fn diamond() -> GraphStore {
    // a -> b -> d, a -> c -> d
    let mut graph = GraphStore::new();
    for id in ["a", "b", "c", "d"] {
        graph.add_node(file_node(id)).unwrap();
    }
    graph.add_edge("a", "b").unwrap();
    graph.add_edge("a", "c").unwrap();
    graph.add_edge("b", "d").unwrap();
    graph.add_edge("c", "d").unwrap();
    graph
}

#[test]
fn add_node_rejects_duplicates() {
    let mut graph = GraphStore::new();
    graph.add_node(file_node("a")).unwrap();
    let err = graph.add_node(file_node("a")).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateNode { .. }));
}

#[test]
fn missing_node_lookups_fail_loudly() {
    let graph = GraphStore::new();
    assert!(matches!(
        graph.node("ghost"),
        Err(GraphError::NodeNotFound { .. })
    ));
    assert!(matches!(
        graph.ancestors("ghost"),
        Err(GraphError::NodeNotFound { .. })
    ));
    assert!(matches!(
        graph.execution_order("ghost"),
        Err(GraphError::NodeNotFound { .. })
    ));
}

#[test]
fn add_edge_rejects_unknown_endpoints() {
    let mut graph = GraphStore::new();
    graph.add_node(file_node("a")).unwrap();
    assert!(matches!(
        graph.add_edge("a", "ghost"),
        Err(GraphError::NodeNotFound { .. })
    ));
}

#[test]
fn add_edge_rejects_self_edge() {
    let mut graph = GraphStore::new();
    graph.add_node(file_node("a")).unwrap();
    assert!(matches!(
        graph.add_edge("a", "a"),
        Err(GraphError::SelfEdge { .. })
    ));
}

#[test]
fn duplicate_edges_collapse() {
    let mut graph = GraphStore::new();
    graph.add_node(file_node("a")).unwrap();
    graph.add_node(file_node("b")).unwrap();
    graph.add_edge("a", "b").unwrap();
    graph.add_edge("a", "b").unwrap();
    assert_eq!(graph.edge_data().len(), 1);
}

#[test]
fn cycle_insertion_fails_and_leaves_edges_unchanged() {
    let mut graph = GraphStore::new();
    for id in ["a", "b", "c"] {
        graph.add_node(file_node(id)).unwrap();
    }
    graph.add_edge("a", "b").unwrap();
    graph.add_edge("b", "c").unwrap();
    let before = graph.edge_data().to_vec();

    let err = graph.add_edge("c", "a").unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
    assert_eq!(graph.edge_data(), before.as_slice());

    // Two-node cycle too.
    let err = graph.add_edge("b", "a").unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
}

#[test]
fn ancestors_are_transitive_and_exclude_self() {
    let graph = diamond();
    let ancestors: Vec<&str> = graph
        .ancestors("d")
        .unwrap()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(ancestors, vec!["a", "b", "c"]);
    assert!(graph.ancestors("a").unwrap().is_empty());
}

#[test]
fn descendants_mirror_ancestors() {
    let graph = diamond();
    let descendants: Vec<&str> = graph
        .descendants("a")
        .unwrap()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(descendants, vec!["b", "c", "d"]);
}

#[test]
fn predecessors_are_direct_only() {
    let graph = diamond();
    let preds: Vec<&str> = graph
        .predecessors("d")
        .unwrap()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(preds, vec!["b", "c"]);
}

#[test]
fn execution_order_is_topological_and_stable() {
    let graph = diamond();
    let order = graph.execution_order("d").unwrap();
    // b and c are independent; insertion order breaks the tie.
    assert_eq!(order, vec!["a", "b", "c", "d"]);

    // Repeated calls yield the identical sequence.
    assert_eq!(graph.execution_order("d").unwrap(), order);
}

#[test]
fn execution_order_covers_only_the_requested_path() {
    let mut graph = diamond();
    graph.add_node(file_node("e")).unwrap();
    graph.add_edge("a", "e").unwrap();

    // e is not an ancestor of d and must not appear.
    let order = graph.execution_order("d").unwrap();
    assert!(!order.contains(&"e".to_string()));
}

#[test]
fn remove_node_drops_incident_edges() {
    let mut graph = diamond();
    graph.remove_node("b").unwrap();
    assert!(graph.node("b").is_err());
    assert!(
        graph
            .edge_data()
            .iter()
            .all(|e| e.source != "b" && e.target != "b")
    );
    // d is still reachable through c.
    assert_eq!(graph.execution_order("d").unwrap(), vec!["a", "c", "d"]);
}

#[test]
fn remove_edge_reopens_the_slot() {
    let mut graph = GraphStore::new();
    graph.add_node(file_node("a")).unwrap();
    graph.add_node(file_node("b")).unwrap();
    graph.add_edge("a", "b").unwrap();
    graph.remove_edge("a", "b").unwrap();
    assert!(graph.edge_data().is_empty());
    // Reversing the direction is legal once the original edge is gone.
    graph.add_edge("b", "a").unwrap();
}

#[test]
fn is_ancestor_checks_forward_reachability() {
    let graph = diamond();
    assert!(graph.is_ancestor("a", "d").unwrap());
    assert!(!graph.is_ancestor("d", "a").unwrap());
    assert!(!graph.is_ancestor("b", "c").unwrap());
}

#[test]
fn a_node_is_never_its_own_ancestor() {
    let graph = diamond();
    for id in ["a", "b", "c", "d"] {
        assert!(!graph.is_ancestor(id, id).unwrap());
    }
}

#[test]
fn cycle_error_names_the_rejected_edge() {
    let mut graph = GraphStore::new();
    for id in ["a", "b"] {
        graph.add_node(file_node(id)).unwrap();
    }
    graph.add_edge("a", "b").unwrap();

    let err = graph.add_edge("b", "a").unwrap_err();
    match &err {
        GraphError::CycleDetected { from, to } => {
            assert_eq!(from, "b");
            assert_eq!(to, "a");
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
    assert_eq!(err.to_string(), "edge b -> a would create a cycle");
}
