//! Tests for graph construction and congestion-aware routing

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use traffic_flow::simulation::{
    congestion_cost, free_flow_cost, CellularEdge, CostModel, EdgeModel, FluidEdge, Intersection,
    NetworkError, NodeId, RoadGraph, Vehicle, VehicleId,
};

fn id(name: &str) -> NodeId {
    NodeId::new(name)
}

/// Two equal-length routes from A to D: via B (north) and via C (south)
fn diamond() -> RoadGraph {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 0.0, 0.0);
    graph.add_node("B", 10.0, 10.0);
    graph.add_node("C", 10.0, -10.0);
    graph.add_node("D", 20.0, 0.0);
    for (src, dst) in [("A", "B"), ("B", "D"), ("A", "C"), ("C", "D")] {
        graph
            .add_edge(src, dst, CellularEdge::new(15, 5, 0.0))
            .expect("edge should be added");
    }
    graph
}

/// Queue `count` vehicles on an edge behind a red exit
fn congest(graph: &mut RoadGraph, src: &str, dst: &str, count: usize) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut vehicles = HashMap::new();
    let edge = graph.get_edge_mut(&id(src), &id(dst)).expect("edge exists");
    for i in 0..count {
        let mut v = Vehicle::new(VehicleId(format!("{}{}-{}", src, dst, i)), Vec::<NodeId>::new());
        assert!(edge.insert(&mut v));
        vehicles.insert(v.id.clone(), v);
        for _ in 0..20 {
            edge.advance(false, &mut vehicles, &mut rng);
        }
    }
}

#[test]
fn test_find_path_includes_both_endpoints() {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 0.0, 0.0);
    graph.add_node("B", 20.0, 0.0);
    graph.add_node("C", 50.0, 0.0);
    graph.add_edge("A", "B", CellularEdge::new(20, 5, 0.1)).unwrap();
    graph.add_edge("B", "C", CellularEdge::new(30, 5, 0.1)).unwrap();

    let path = graph
        .find_path(&id("A"), &id("C"), congestion_cost(CostModel::Banded))
        .unwrap();
    assert_eq!(path, vec![id("A"), id("B"), id("C")]);

    let err = graph
        .find_path(&id("C"), &id("A"), free_flow_cost)
        .unwrap_err();
    assert_eq!(
        err,
        NetworkError::NoPathFound {
            src: id("C"),
            dst: id("A")
        }
    );
}

#[test]
fn test_construction_errors() {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 0.0, 0.0);
    graph.add_node("B", 1.0, 0.0);

    assert_eq!(
        graph.add_edge("A", "X", CellularEdge::new(5, 5, 0.0)).unwrap_err(),
        NetworkError::UnknownNode(id("X"))
    );

    graph.add_edge("A", "B", CellularEdge::new(5, 5, 0.0)).unwrap();
    assert_eq!(
        graph.add_edge("A", "B", FluidEdge::new(5.0, 5.0, 0.2)).unwrap_err(),
        NetworkError::DuplicateEdge {
            src: id("A"),
            dst: id("B")
        }
    );

    assert!(graph.get_edge(&id("A"), &id("B")).is_ok());
    assert_eq!(
        graph.get_edge(&id("B"), &id("A")).unwrap_err(),
        NetworkError::NoSuchEdge {
            src: id("B"),
            dst: id("A")
        }
    );
    assert!(matches!(
        graph.find_path(&id("A"), &id("Z"), free_flow_cost),
        Err(NetworkError::UnknownNode(_))
    ));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_readding_node_keeps_original_position() {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 1.0, 2.0);
    graph.add_node("A", 5.0, 5.0);
    assert_eq!(graph.node_count(), 1);
    let node = graph.node(&id("A")).unwrap();
    assert_eq!((node.position.x, node.position.y), (1.0, 2.0));
}

#[test]
fn test_routing_avoids_congested_route() {
    let mut graph = diamond();
    let cost = congestion_cost(CostModel::Banded);

    // 8 of 15 cells is above the 50% band
    congest(&mut graph, "A", "B", 8);
    let path = graph.find_path(&id("A"), &id("D"), &cost).unwrap();
    assert_eq!(path, vec![id("A"), id("C"), id("D")]);

    // Once the south route is worse, traffic goes north again
    congest(&mut graph, "C", "D", 13);
    let path = graph.find_path(&id("A"), &id("D"), &cost).unwrap();
    assert_eq!(path, vec![id("A"), id("B"), id("D")]);
}

#[test]
fn test_smooth_cost_also_avoids_congestion() {
    let mut graph = diamond();
    congest(&mut graph, "C", "D", 3);
    let path = graph
        .find_path(&id("A"), &id("D"), congestion_cost(CostModel::Smooth))
        .unwrap();
    assert_eq!(path, vec![id("A"), id("B"), id("D")]);
}

#[test]
fn test_fluid_edges_route_by_travel_time() {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 0.0, 0.0);
    graph.add_node("B", 0.0, 0.0);
    graph.add_node("C", 0.0, 0.0);
    // Same length, the direct road is much slower
    graph.add_edge("A", "C", FluidEdge::new(100.0, 1.0, 0.2)).unwrap();
    graph.add_edge("A", "B", FluidEdge::new(50.0, 10.0, 0.2)).unwrap();
    graph.add_edge("B", "C", FluidEdge::new(50.0, 10.0, 0.2)).unwrap();

    let path = graph
        .find_path(&id("A"), &id("C"), congestion_cost(CostModel::Banded))
        .unwrap();
    assert_eq!(path, vec![id("A"), id("B"), id("C")]);
}

#[test]
fn test_two_way_edges_are_independent() {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 0.0, 0.0);
    graph.add_node("B", 10.0, 0.0);
    graph
        .add_two_way_edge("A", "B", || CellularEdge::new(10, 5, 0.0))
        .unwrap();

    let mut v = Vehicle::new(VehicleId::new("v"), Vec::<NodeId>::new());
    assert!(graph.get_edge_mut(&id("A"), &id("B")).unwrap().insert(&mut v));

    assert_eq!(graph.get_edge(&id("A"), &id("B")).unwrap().vehicle_count(), 1);
    assert_eq!(graph.get_edge(&id("B"), &id("A")).unwrap().vehicle_count(), 0);
}

#[test]
fn test_traffic_light_uses_incoming_nodes() {
    let mut graph = RoadGraph::new();
    for (name, x) in [("W", -10.0), ("E", 10.0), ("X", 0.0), ("S", 0.0)] {
        graph.add_node(name, x, 0.0);
    }
    graph.add_edge("W", "X", CellularEdge::new(10, 5, 0.0)).unwrap();
    graph.add_edge("E", "X", CellularEdge::new(10, 5, 0.0)).unwrap();
    graph.add_edge("X", "S", CellularEdge::new(10, 5, 0.0)).unwrap();

    assert_eq!(graph.incoming_nodes(&id("X")).unwrap(), vec![id("W"), id("E")]);
    graph.add_traffic_light(&id("X"), 2).unwrap();

    assert!(graph.can_pass(&id("W"), &id("X")));
    assert!(!graph.can_pass(&id("E"), &id("X")));
    // Nodes without a controller never block
    assert!(graph.can_pass(&id("X"), &id("S")));

    graph.update_intersections();
    graph.update_intersections();
    assert!(!graph.can_pass(&id("W"), &id("X")));
    assert!(graph.can_pass(&id("E"), &id("X")));

    assert!(matches!(
        graph.add_intersection(&id("nowhere"), Intersection::Uncontrolled),
        Err(NetworkError::UnknownNode(_))
    ));
}

#[test]
fn test_edge_info_reports_model_state() {
    let mut graph = RoadGraph::new();
    graph.add_node("A", 0.0, 0.0);
    graph.add_node("B", 10.0, 0.0);
    graph.add_edge("A", "B", FluidEdge::new(50.0, 5.0, 0.2)).unwrap();

    let edge = graph.get_edge(&id("A"), &id("B")).unwrap();
    assert!(matches!(edge, EdgeModel::Fluid(_)));
    let info = edge.info();
    assert_eq!(info.capacity, 10);
    assert_eq!(info.vehicles, 0);
    let text = info.to_string();
    assert!(text.contains("Fluid (LWR)"));
    assert!(text.contains("Vehicles:   0/10"));
}
