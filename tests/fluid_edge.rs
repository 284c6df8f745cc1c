//! Tests for the density-flow edge model

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use traffic_flow::simulation::{FluidEdge, NodeId, Vehicle, VehicleId, FLUID_SAFETY_GAP};

fn insert(edge: &mut FluidEdge, vehicles: &mut HashMap<VehicleId, Vehicle>, id: &str) -> bool {
    let mut v = Vehicle::new(VehicleId::new(id), Vec::<NodeId>::new());
    v.speed = 4.0;
    let inserted = edge.insert(&mut v);
    if inserted {
        assert_eq!(v.speed, 0.0, "inserted vehicles start at rest");
        vehicles.insert(v.id.clone(), v);
    }
    inserted
}

/// Feeds the entrance every tick until `count` vehicles are on the edge
fn load(
    edge: &mut FluidEdge,
    vehicles: &mut HashMap<VehicleId, Vehicle>,
    rng: &mut StdRng,
    count: usize,
) {
    for tick in 0..200 {
        if edge.vehicle_count() == count {
            return;
        }
        insert(edge, vehicles, &format!("v{}", tick));
        edge.advance(vehicles, rng);
    }
    panic!("edge never reached {} vehicles", count);
}

fn assert_gaps(edge: &FluidEdge, tick: usize) {
    let positions: Vec<f64> = edge
        .vehicle_positions()
        .iter()
        .map(|(_, ratio)| ratio * edge.distance())
        .collect();
    for pair in positions.windows(2) {
        assert!(
            pair[1] <= pair[0] - FLUID_SAFETY_GAP + 1e-9,
            "tick {}: follower at {} too close to leader at {}",
            tick,
            pair[1],
            pair[0]
        );
    }
}

#[test]
fn test_capacity_follows_jam_density() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut edge = FluidEdge::new(20.0, 5.0, 0.2);
    let mut vehicles = HashMap::new();
    assert_eq!(edge.max_vehicles(), 4);

    load(&mut edge, &mut vehicles, &mut rng, 4);
    while !edge.entrance_clear() {
        edge.advance(&mut vehicles, &mut rng);
    }
    assert!(!insert(&mut edge, &mut vehicles, "overflow"));
    assert_eq!(edge.occupation_ratio(), 1.0);
}

#[test]
fn test_entrance_blocked_within_safety_gap() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut edge = FluidEdge::new(100.0, 5.0, 0.2);
    let mut vehicles = HashMap::new();

    assert!(insert(&mut edge, &mut vehicles, "first"));
    assert!(!edge.entrance_clear());
    assert!(!insert(&mut edge, &mut vehicles, "second"));
    assert_eq!(edge.vehicle_count(), 1);

    edge.advance(&mut vehicles, &mut rng);
    assert!(insert(&mut edge, &mut vehicles, "second"));
}

#[test]
fn test_followers_keep_safety_gap() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut edge = FluidEdge::new(100.0, 5.0, 0.2);
    let mut vehicles = HashMap::new();

    for tick in 0..400 {
        // Upstream pushes a vehicle every tick, like a saturated transfer phase
        insert(&mut edge, &mut vehicles, &format!("v{}", tick));
        assert_gaps(&edge, tick);

        edge.advance(&mut vehicles, &mut rng);

        assert_gaps(&edge, tick);
        for (_, ratio) in edge.vehicle_positions() {
            assert!((0.0..=1.0).contains(&ratio));
        }
        let occupation = edge.occupation_ratio();
        assert!((0.0..=1.0).contains(&occupation));

        // Drain slowly so a jam forms upstream
        if tick % 3 == 0 {
            if let Some(id) = edge.pop_last_vehicle() {
                vehicles.remove(&id);
            }
        }
    }
}

#[test]
fn test_only_vehicles_at_exit_are_visible() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut edge = FluidEdge::new(10.0, 2.0, 0.2);
    let mut vehicles = HashMap::new();
    assert!(insert(&mut edge, &mut vehicles, "v"));

    edge.advance(&mut vehicles, &mut rng);
    assert!(edge.peek_last_vehicle().is_none());
    assert!(edge.pop_last_vehicle().is_none());
    assert_eq!(edge.vehicle_count(), 1);

    for _ in 0..20 {
        edge.advance(&mut vehicles, &mut rng);
    }
    assert_eq!(edge.peek_last_vehicle(), Some(&VehicleId::new("v")));
    assert_eq!(edge.peek_last_vehicle(), edge.peek_last_vehicle());
    assert_eq!(vehicles[&VehicleId::new("v")].speed, 0.0, "clamped at the end");

    assert_eq!(edge.pop_last_vehicle(), Some(VehicleId::new("v")));
    assert_eq!(edge.vehicle_count(), 0);
}

#[test]
fn test_flow_speed_and_travel_time() {
    let mut rng = StdRng::seed_from_u64(30);
    let mut edge = FluidEdge::new(100.0, 5.0, 0.2);
    let mut vehicles = HashMap::new();
    assert_eq!(edge.flow_factor(), 1.0);
    assert!((edge.travel_time_cost() - 20.0).abs() < 1e-9);

    load(&mut edge, &mut vehicles, &mut rng, 10);
    // k = 0.1, k / k_max = 0.5
    assert!((edge.flow_factor() - 0.75).abs() < 1e-9);
    assert!((edge.flow_speed() - 3.75).abs() < 1e-9);
    assert!((edge.travel_time_cost() - 100.0 / 3.75).abs() < 1e-9);
}

#[test]
fn test_full_edge_still_drains() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut edge = FluidEdge::new(10.0, 5.0, 0.2);
    let mut vehicles = HashMap::new();
    load(&mut edge, &mut vehicles, &mut rng, 2);

    // At jam density the flow stops and routing sees a near-infinite cost
    assert_eq!(edge.flow_factor(), 0.0);
    assert!((edge.travel_time_cost() - 10.0 / (5.0 * 0.01)).abs() < 1e-9);

    // Vehicles still crawl forward and leave through the exit
    for tick in 0..200 {
        edge.advance(&mut vehicles, &mut rng);
        assert_gaps(&edge, tick);
        if let Some(id) = edge.pop_last_vehicle() {
            vehicles.remove(&id);
        }
        if edge.vehicle_count() == 0 {
            return;
        }
    }
    panic!("jammed edge never drained");
}
