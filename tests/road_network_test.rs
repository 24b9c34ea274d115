//! Routing graph validation tests
//!
//! The graph is driven through the world so tile shapes and routing nodes
//! stay in step the way they do at runtime.

use rand::SeedableRng;
use std::collections::HashSet;

use tile_traffic::simulation::{
    node_position, Direction, NodeId, NodeRole, Position, SimConfig, SimRoadNetwork, SimWorld,
    TileType,
};

fn quiet_world(rows: usize, cols: usize) -> SimWorld {
    SimWorld::new(
        SimConfig::new(rows, cols)
            .with_seed(11)
            .with_spawn_chance(0.0),
    )
}

fn live_ids(network: &SimRoadNetwork) -> HashSet<NodeId> {
    network.live_nodes().map(|n| n.id).collect()
}

/// Every edge touches live nodes only and every live node has an edge
fn assert_consistent(network: &SimRoadNetwork) {
    let live = live_ids(network);
    for (source, target) in network.edges() {
        assert!(live.contains(&source), "edge from dead node {}", source);
        assert!(live.contains(&target), "edge to dead node {}", target);
    }
    for id in &live {
        assert!(network.graph().contains_node(*id), "live node {} has no edges", id);
    }
}

#[test]
fn test_node_position() {
    let s = 60.0;
    let center = Position::new(30.0, 30.0);

    // Up segment: 20 above center, entry on the left lane
    let entry = node_position(0, 0, Direction::Up, NodeRole::Entry, s);
    let exit = node_position(0, 0, Direction::Up, NodeRole::Exit, s);
    assert_eq!(entry, Position::new(center.x - 7.5, center.y - 20.0));
    assert_eq!(exit, Position::new(center.x + 7.5, center.y - 20.0));

    // Right segment of cell (1, 2)
    let entry = node_position(1, 2, Direction::Right, NodeRole::Entry, s);
    assert_eq!(entry, Position::new(150.0 + 20.0, 90.0 - 7.5));
}

#[test]
fn test_lone_tile_loops_both_ways() {
    let mut world = quiet_world(3, 3);
    assert!(world.add_tile(1, 1, false));

    let network = world.road_network();
    let insct = network.intersection(1, 1).unwrap();
    assert_eq!(insct.segment_directions(), vec![Direction::Up]);

    let segment = insct.segment(Direction::Up).unwrap();
    assert!(network.graph().contains_edge(segment.entry, segment.exit));
    assert!(network.graph().contains_edge(segment.exit, segment.entry));
    assert_eq!(network.live_node_count(), 2);
    assert_eq!(network.edge_count(), 2);

    // Nowhere to go is never the answer for a live node
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    for node in [segment.entry, segment.exit] {
        assert!(network
            .random_node_along_path(node, &mut rng)
            .unwrap()
            .is_some());
    }
    assert_consistent(network);
}

#[test]
fn test_two_tiles_form_a_loop() {
    let mut world = quiet_world(3, 3);
    world.add_tile(1, 0, false);
    world.add_tile(1, 1, false);

    let network = world.road_network();
    let left = network.intersection(1, 0).unwrap();
    let right = network.intersection(1, 1).unwrap();
    assert_eq!(left.segment_directions(), vec![Direction::Right]);
    assert_eq!(right.segment_directions(), vec![Direction::Left]);

    let a = left.segment(Direction::Right).unwrap();
    let b = right.segment(Direction::Left).unwrap();

    // Dead-end U-turns plus the two bridges
    assert!(network.graph().contains_edge(a.entry, a.exit));
    assert!(network.graph().contains_edge(b.entry, b.exit));
    assert!(network.graph().contains_edge(a.exit, b.entry));
    assert!(network.graph().contains_edge(b.exit, a.entry));
    assert_eq!(network.edge_count(), 4);
    assert_eq!(network.live_node_count(), 4);

    // The lone stub of the first tile was retired
    assert!(!network.is_live(NodeId(0)));
    assert!(!network.is_live(NodeId(1)));

    assert_eq!(
        network.shortest_path(a.entry, b.entry),
        Ok(vec![a.entry, a.exit, b.entry])
    );
    assert_consistent(network);
}

#[test]
fn test_crossing_connects_every_entry_to_other_exits() {
    let mut world = quiet_world(3, 3);
    for (row, col) in [(1, 1), (0, 1), (2, 1), (1, 0), (1, 2)] {
        world.add_tile(row, col, false);
    }
    assert_eq!(world.tiles().get(1, 1), TileType::UpRightDownLeft);

    let network = world.road_network();
    let insct = network.intersection(1, 1).unwrap();
    assert_eq!(insct.segment_count(), 4);

    for (entry_dir, entry) in insct.segments() {
        for (exit_dir, exit) in insct.segments() {
            assert_eq!(
                network.graph().contains_edge(entry.entry, exit.exit),
                entry_dir != exit_dir,
                "{:?} -> {:?}",
                entry_dir,
                exit_dir
            );
        }
    }

    // 4 stubs x 1 U-turn, 12 turns through the crossing, 4 x 2 bridges
    assert_eq!(network.edge_count(), 4 + 12 + 8);
    assert_eq!(network.live_node_count(), 4 * 2 + 4 * 2);
    assert_consistent(network);
}

#[test]
fn test_dead_ends_join_both_lanes() {
    let mut world = quiet_world(3, 4);
    for col in 0..4 {
        world.add_tile(1, col, false);
    }

    let network = world.road_network();
    let live = live_ids(network);
    assert_eq!(live.len(), 2 + 4 + 4 + 2);

    for &node in &live {
        let reachable: HashSet<NodeId> = network
            .graph()
            .reachable_from(node)
            .unwrap()
            .iter()
            .copied()
            .collect();
        let others: HashSet<NodeId> = live.iter().copied().filter(|n| *n != node).collect();
        assert!(others.is_subset(&reachable), "node {} is stuck", node);
    }
    assert_consistent(network);
}

#[test]
fn test_ring_lanes_run_in_opposite_directions() {
    let mut world = quiet_world(3, 3);
    for (row, col) in [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)] {
        world.add_tile(row, col, false);
    }

    let network = world.road_network();
    assert_eq!(network.live_node_count(), 8 * 4);

    // Without a dead end there is no way onto the other lane
    let top = network.intersection(0, 1).unwrap();
    let east = top.segment(Direction::Right).unwrap();
    let west = top.segment(Direction::Left).unwrap();
    let reachable = network.graph().reachable_from(west.entry).unwrap();
    assert!(reachable.contains(&east.exit));
    assert!(!reachable.contains(&east.entry));
    assert_eq!(reachable.len(), 8 * 2 - 1);
    assert_consistent(network);
}

#[test]
fn test_remove_tile_restores_shape() {
    let mut world = quiet_world(3, 3);
    world.add_tile(1, 0, false);
    world.add_tile(1, 1, false);
    world.add_tile(1, 2, false);
    assert_eq!(world.road_network().live_node_count(), 8);

    assert!(world.remove_tile(1, 2));
    let network = world.road_network();
    assert!(network.intersection(1, 2).is_none());
    assert_eq!(network.live_node_count(), 4);
    assert_eq!(network.edge_count(), 4);
    assert_consistent(network);

    assert!(world.remove_tile(1, 1));
    let network = world.road_network();
    let lone = network.intersection(1, 0).unwrap();
    assert_eq!(lone.segment_directions(), vec![Direction::Up]);
    assert_eq!(network.live_node_count(), 2);
    assert_eq!(network.edge_count(), 2);
    assert_consistent(network);

    assert!(world.remove_tile(1, 0));
    let network = world.road_network();
    assert_eq!(network.live_node_count(), 0);
    assert_eq!(network.edge_count(), 0);
    assert!(network.newest_node().is_none());
}

#[test]
fn test_add_remove_round_trip_keeps_counts() {
    let mut world = quiet_world(4, 4);
    for (row, col) in [(1, 1), (1, 2), (2, 1)] {
        world.add_tile(row, col, false);
    }
    let nodes = world.road_network().live_node_count();
    let edges = world.road_network().edge_count();

    world.add_tile(2, 2, false);
    assert!(world.road_network().live_node_count() > nodes);
    world.remove_tile(2, 2);

    assert_eq!(world.road_network().live_node_count(), nodes);
    assert_eq!(world.road_network().edge_count(), edges);
    assert_consistent(world.road_network());
}

#[test]
fn test_nearest_and_newest_node() {
    let mut world = quiet_world(2, 2);
    world.add_tile(0, 0, false);
    world.add_tile(0, 1, false);

    let network = world.road_network();
    let newest = network.newest_node().unwrap();
    assert!(network.is_live(newest));
    assert!(network.live_nodes().all(|n| n.id <= newest));

    let target = network.node(newest).unwrap().position;
    assert_eq!(network.nearest_live_node(&target), Some(newest));
}

#[test]
fn test_off_grid_cells_have_no_intersection() {
    let mut world = quiet_world(3, 3);
    world.add_tile(1, 0, false);

    let network = world.road_network();
    assert!(network.intersection(1, 0).is_some());
    // (0, 3) would pack onto the same key as (1, 0)
    assert!(network.intersection(0, 3).is_none());
    assert!(network.intersection(3, 0).is_none());
    assert!(network.intersection(99, 99).is_none());
}

#[test]
fn test_edges_list_source_then_target() {
    let mut world = quiet_world(1, 3);
    for col in 0..3 {
        world.add_tile(0, col, false);
    }

    let network = world.road_network();
    let edges = network.edges();
    assert_eq!(edges.len(), network.edge_count());
    for (source, target) in edges {
        assert!(network.graph().contains_edge(source, target));
        let from = network.node(source).unwrap();
        let to = network.node(target).unwrap();
        // Edges between tiles always leave through an exit and arrive at an entry
        if (from.row, from.col) != (to.row, to.col) {
            assert_eq!(from.role, NodeRole::Exit);
            assert_eq!(to.role, NodeRole::Entry);
        }
    }
}
