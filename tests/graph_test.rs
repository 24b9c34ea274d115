//! Directed graph validation tests

use tile_traffic::simulation::{DirectedGraph, GraphError, NodeId};

fn n(id: usize) -> NodeId {
    NodeId(id)
}

fn ids(raw: &[usize]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId).collect()
}

fn sorted_edges(graph: &DirectedGraph) -> Vec<(usize, usize)> {
    let mut edges: Vec<(usize, usize)> = graph
        .serialize_edges()
        .into_iter()
        .map(|(s, t)| (s.0, t.0))
        .collect();
    edges.sort();
    edges
}

fn sorted_nodes(graph: &DirectedGraph) -> Vec<usize> {
    let mut nodes: Vec<usize> = graph.nodes().map(|n| n.0).collect();
    nodes.sort();
    nodes
}

/// Seven nodes, one strongly connected core (0..=3), a sink (5) and a source (6)
fn complex_graph() -> DirectedGraph {
    let mut graph = DirectedGraph::new();
    for (s, t) in [
        (0, 1),
        (1, 2),
        (1, 3),
        (1, 4),
        (2, 3),
        (2, 4),
        (3, 0),
        (3, 4),
        (4, 5),
        (6, 3),
    ] {
        graph.add_edge(n(s), n(t));
    }
    graph
}

#[test]
fn test_node_id_validation() {
    assert_eq!(NodeId::try_from(3i64), Ok(n(3)));
    assert_eq!(
        NodeId::try_from(-3i64),
        Err(GraphError::InvalidNode("-3".to_string()))
    );
    assert_eq!("3".parse::<NodeId>(), Ok(n(3)));
    assert!(matches!(
        "-3".parse::<NodeId>(),
        Err(GraphError::InvalidNode(_))
    ));
    assert!(matches!(
        "three".parse::<NodeId>(),
        Err(GraphError::InvalidNode(_))
    ));
}

#[test]
fn test_add_edge() {
    let mut graph = DirectedGraph::new();

    graph.add_edge(n(0), n(1));
    assert_eq!(sorted_nodes(&graph), vec![0, 1]);
    assert_eq!(sorted_edges(&graph), vec![(0, 1)]);

    graph.add_edge(n(1), n(2));
    graph.add_edge(n(2), n(0));
    graph.add_edge(n(1), n(3));
    assert_eq!(sorted_nodes(&graph), vec![0, 1, 2, 3]);
    assert_eq!(sorted_edges(&graph), vec![(0, 1), (1, 2), (1, 3), (2, 0)]);
    assert_eq!(graph.adjacent(n(1)), Ok(ids(&[2, 3])));
    assert_eq!(graph.adjacent(n(3)), Ok(vec![]));
}

#[test]
fn test_same_edge_is_added_once() {
    let mut graph = DirectedGraph::new();
    graph.add_edge(n(0), n(1));
    graph.add_edge(n(0), n(1));

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.out_degree(n(0)), Ok(1));
    assert_eq!(graph.in_degree(n(1)), Ok(1));
}

#[test]
fn test_self_loop() {
    let mut graph = DirectedGraph::new();
    graph.add_edge(n(4), n(4));

    assert!(graph.contains_edge(n(4), n(4)));
    assert_eq!(graph.adjacent(n(4)), Ok(ids(&[4])));
    assert!(graph.reachable_from(n(4)).unwrap().is_empty());

    graph.remove_edge(n(4), n(4));
    assert!(graph.is_empty());
}

#[test]
fn test_remove_edge_prunes_orphans() {
    let mut graph = DirectedGraph::new();
    graph.add_edge(n(0), n(1));
    graph.add_edge(n(1), n(2));
    graph.add_edge(n(1), n(3));
    graph.add_edge(n(2), n(0));
    graph.add_edge(n(4), n(0));

    // Still connected
    graph.remove_edge(n(1), n(2));
    assert_eq!(sorted_nodes(&graph), vec![0, 1, 2, 3, 4]);
    assert_eq!(sorted_edges(&graph), vec![(0, 1), (1, 3), (2, 0), (4, 0)]);

    // Node 2 loses its last edge
    graph.remove_edge(n(2), n(0));
    assert_eq!(sorted_nodes(&graph), vec![0, 1, 3, 4]);

    // Disconnected, but nobody is orphaned
    graph.remove_edge(n(0), n(1));
    assert_eq!(sorted_nodes(&graph), vec![0, 1, 3, 4]);
    assert_eq!(graph.adjacent(n(0)), Ok(vec![]));

    // Both endpoints orphaned at once
    graph.remove_edge(n(1), n(3));
    assert_eq!(sorted_nodes(&graph), vec![0, 4]);
    assert_eq!(sorted_edges(&graph), vec![(4, 0)]);
}

#[test]
fn test_remove_missing_edge_is_noop() {
    let mut graph = complex_graph();
    let before = sorted_edges(&graph);

    graph.remove_edge(n(5), n(4));
    graph.remove_edge(n(10), n(11));

    assert_eq!(sorted_edges(&graph), before);
}

#[test]
fn test_remove_node() {
    let mut graph = DirectedGraph::new();
    graph.add_edge(n(0), n(1));
    graph.add_edge(n(1), n(2));
    graph.add_edge(n(1), n(3));
    graph.add_edge(n(2), n(0));
    graph.add_edge(n(4), n(0));

    graph.remove_node(n(3));
    assert_eq!(sorted_nodes(&graph), vec![0, 1, 2, 4]);
    assert_eq!(sorted_edges(&graph), vec![(0, 1), (1, 2), (2, 0), (4, 0)]);

    graph.remove_node(n(2));
    assert_eq!(sorted_nodes(&graph), vec![0, 1, 4]);
    assert_eq!(sorted_edges(&graph), vec![(0, 1), (4, 0)]);

    // Everyone left hangs off node 0
    graph.remove_node(n(0));
    assert!(graph.is_empty());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_degrees() {
    let graph = complex_graph();

    let in_degrees: Vec<usize> = (0..=6).map(|i| graph.in_degree(n(i)).unwrap()).collect();
    let out_degrees: Vec<usize> = (0..=6).map(|i| graph.out_degree(n(i)).unwrap()).collect();

    assert_eq!(in_degrees, vec![1, 1, 1, 3, 3, 1, 0]);
    assert_eq!(out_degrees, vec![1, 3, 2, 2, 1, 0, 1]);
}

#[test]
fn test_unknown_node_errors() {
    let graph = complex_graph();

    assert_eq!(graph.in_degree(n(9)), Err(GraphError::UnknownNode(n(9))));
    assert_eq!(graph.out_degree(n(9)), Err(GraphError::UnknownNode(n(9))));
    assert_eq!(graph.adjacent(n(9)), Err(GraphError::UnknownNode(n(9))));
    assert!(matches!(
        graph.reachable_from(n(9)),
        Err(GraphError::UnknownNode(_))
    ));
    assert_eq!(
        graph.shortest_path(n(9), n(0)),
        Err(GraphError::UnknownNode(n(9)))
    );
}

#[test]
fn test_adjacent_keeps_insertion_order() {
    let graph = complex_graph();

    assert_eq!(graph.adjacent(n(0)), Ok(ids(&[1])));
    assert_eq!(graph.adjacent(n(1)), Ok(ids(&[2, 3, 4])));
    assert_eq!(graph.adjacent(n(2)), Ok(ids(&[3, 4])));
    assert_eq!(graph.adjacent(n(3)), Ok(ids(&[0, 4])));
    assert_eq!(graph.adjacent(n(4)), Ok(ids(&[5])));
    assert_eq!(graph.adjacent(n(5)), Ok(vec![]));
    assert_eq!(graph.adjacent(n(6)), Ok(ids(&[3])));
}

#[test]
fn test_reachable_from() {
    let graph = complex_graph();

    let reachable = |source: usize| -> Vec<NodeId> {
        graph.reachable_from(n(source)).unwrap().iter().copied().collect()
    };

    // Sources on a cycle never list themselves
    assert_eq!(reachable(0), ids(&[1, 2, 3, 4, 5]));
    assert_eq!(reachable(1), ids(&[0, 2, 3, 4, 5]));
    assert_eq!(reachable(2), ids(&[0, 1, 3, 4, 5]));
    assert_eq!(reachable(3), ids(&[0, 1, 2, 4, 5]));
    assert_eq!(reachable(4), ids(&[5]));
    assert_eq!(reachable(5), vec![]);
    assert_eq!(reachable(6), ids(&[0, 1, 2, 3, 4, 5]));
}

#[test]
fn test_reachable_from_disconnected_graph() {
    let mut graph = DirectedGraph::new();
    for (s, t) in [(0, 1), (0, 3), (1, 0), (1, 2), (3, 2), (4, 6), (5, 6)] {
        graph.add_edge(n(s), n(t));
    }

    let reachable = |source: usize| -> Vec<NodeId> {
        graph.reachable_from(n(source)).unwrap().iter().copied().collect()
    };

    assert_eq!(reachable(0), ids(&[1, 2, 3]));
    assert_eq!(reachable(1), ids(&[0, 2, 3]));
    assert_eq!(reachable(2), vec![]);
    assert_eq!(reachable(3), ids(&[2]));
    assert_eq!(reachable(4), ids(&[6]));
    assert_eq!(reachable(5), ids(&[6]));
    assert_eq!(reachable(6), vec![]);
}

#[test]
fn test_shortest_path() {
    let graph = complex_graph();

    assert_eq!(graph.shortest_path(n(0), n(0)), Ok(ids(&[0])));
    assert_eq!(graph.shortest_path(n(0), n(1)), Ok(ids(&[0, 1])));
    assert_eq!(graph.shortest_path(n(0), n(2)), Ok(ids(&[0, 1, 2])));
    assert_eq!(graph.shortest_path(n(0), n(3)), Ok(ids(&[0, 1, 3])));
    assert_eq!(graph.shortest_path(n(0), n(4)), Ok(ids(&[0, 1, 4])));
    assert_eq!(graph.shortest_path(n(0), n(5)), Ok(ids(&[0, 1, 4, 5])));
    assert_eq!(graph.shortest_path(n(6), n(5)), Ok(ids(&[6, 3, 4, 5])));
    assert_eq!(
        graph.shortest_path(n(0), n(6)),
        Err(GraphError::NoPath { from: n(0), to: n(6) })
    );
    assert_eq!(
        graph.shortest_path(n(0), n(42)),
        Err(GraphError::NoPath { from: n(0), to: n(42) })
    );
}

#[test]
fn test_shortest_path_prefers_lower_ids_on_ties() {
    let mut graph = DirectedGraph::new();
    // Two routes of equal length, inserted high id first
    graph.add_edge(n(0), n(7));
    graph.add_edge(n(0), n(2));
    graph.add_edge(n(7), n(9));
    graph.add_edge(n(2), n(9));

    assert_eq!(graph.shortest_path(n(0), n(9)), Ok(ids(&[0, 2, 9])));
}

#[test]
fn test_serialize_edges() {
    let graph = complex_graph();

    let edges: Vec<(usize, usize)> = graph
        .serialize_edges()
        .into_iter()
        .map(|(s, t)| (s.0, t.0))
        .collect();

    assert_eq!(
        edges,
        vec![
            (0, 1),
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 3),
            (2, 4),
            (3, 0),
            (3, 4),
            (4, 5),
            (6, 3),
        ]
    );
}

#[test]
fn test_add_then_remove_leaves_empty_graph() {
    let mut graph = DirectedGraph::new();
    graph.add_edge(n(0), n(1));
    graph.remove_edge(n(0), n(1));

    assert!(graph.is_empty());
    assert!(!graph.contains_node(n(0)));
    assert!(!graph.contains_node(n(1)));
}
