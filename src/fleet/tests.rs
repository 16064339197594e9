use super::*;
use crate::vehicle::{Position, Vehicle, VehicleStatus, VehicleUpdate};
use std::sync::Arc;
use std::thread;

fn ts(s: &str) -> String {
    s.to_string()
}

fn make_vehicle(id: &str, name: &str, status: VehicleStatus) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        name: name.to_string(),
        plate: format!("PL-{}", id),
        driver: format!("Driver {}", id),
        status,
        position: Position { lat: 40.0, lng: -74.0 },
        speed: 0.0,
        heading: 0.0,
        last_update: ts("2024-02-11T13:00:00Z"),
        odometer: 12000.0,
        fuel: 80.0,
    }
}

fn make_update(vehicle_id: &str) -> VehicleUpdate {
    VehicleUpdate {
        vehicle_id: vehicle_id.to_string(),
        position: Position { lat: 1.0, lng: 2.0 },
        speed: 45.0,
        heading: 90.0,
        status: VehicleStatus::Active,
        timestamp: ts("2024-02-11T13:05:00Z"),
    }
}

fn sorted_ids(vehicles: &[Vehicle]) -> Vec<String> {
    let mut ids: Vec<String> = vehicles.iter().map(|v| v.id.clone()).collect();
    ids.sort();
    ids
}

#[test]
fn test_store_starts_empty() {
    let store = FleetStore::new();
    assert!(store.is_empty());
    assert!(store.list().is_empty());
    assert!(store.get("v1").is_none());
}

#[test]
fn test_load_snapshot_then_list() {
    let store = FleetStore::new();
    let snapshot = vec![
        make_vehicle("v1", "Truck A", VehicleStatus::Idle),
        make_vehicle("v2", "Van B", VehicleStatus::Active),
        make_vehicle("v3", "Truck C", VehicleStatus::Offline),
    ];

    assert_eq!(store.load_snapshot(snapshot.clone()), 3);

    assert_eq!(sorted_ids(&store.list()), vec!["v1", "v2", "v3"]);
    for vehicle in &snapshot {
        assert_eq!(store.get(&vehicle.id).as_ref(), Some(vehicle));
    }
    assert!(store.get("v4").is_none());
}

#[test]
fn test_load_snapshot_replaces_previous() {
    let store = FleetStore::new();
    store.load_snapshot(vec![
        make_vehicle("v1", "Truck A", VehicleStatus::Idle),
        make_vehicle("v2", "Van B", VehicleStatus::Active),
    ]);

    let mut renamed = make_vehicle("v2", "Van B (renamed)", VehicleStatus::Idle);
    renamed.fuel = 12.0;
    store.load_snapshot(vec![renamed, make_vehicle("v3", "Truck C", VehicleStatus::Idle)]);

    assert_eq!(sorted_ids(&store.list()), vec!["v2", "v3"]);
    assert!(store.get("v1").is_none());

    let v2 = store.get("v2").unwrap();
    assert_eq!(v2.name, "Van B (renamed)");
    assert_eq!(v2.fuel, 12.0);
}

#[test]
fn test_load_empty_snapshot_clears_store() {
    let store = FleetStore::new();
    store.load_snapshot(vec![make_vehicle("v1", "Truck A", VehicleStatus::Idle)]);

    assert_eq!(store.load_snapshot(Vec::new()), 0);
    assert!(store.is_empty());
}

#[test]
fn test_duplicate_ids_keep_last() {
    let store = FleetStore::new();
    store.load_snapshot(vec![
        make_vehicle("v1", "First", VehicleStatus::Idle),
        make_vehicle("v1", "Second", VehicleStatus::Active),
    ]);

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("v1").unwrap().name, "Second");
}

#[test]
fn test_update_known_vehicle_merges_live_fields() {
    let store = FleetStore::new();
    store.load_snapshot(vec![make_vehicle("v1", "Truck A", VehicleStatus::Idle)]);

    let updated = store.apply_update(&make_update("v1")).unwrap();

    let vehicle = store.get("v1").unwrap();
    assert_eq!(vehicle, updated);
    assert_eq!(vehicle.status, VehicleStatus::Active);
    assert_eq!(vehicle.speed, 45.0);
    assert_eq!(vehicle.position, Position { lat: 1.0, lng: 2.0 });
    assert_eq!(vehicle.heading, 90.0);
    assert_eq!(vehicle.last_update, ts("2024-02-11T13:05:00Z"));

    assert_eq!(vehicle.name, "Truck A");
    assert_eq!(vehicle.plate, "PL-v1");
    assert_eq!(vehicle.driver, "Driver v1");
    assert_eq!(vehicle.odometer, 12000.0);
    assert_eq!(vehicle.fuel, 80.0);
}

#[test]
fn test_truck_a_scenario_keeps_timestamp_text() {
    let store = FleetStore::new();
    store.load_snapshot(vec![make_vehicle("v1", "Truck A", VehicleStatus::Idle)]);

    let mut update = make_update("v1");
    update.timestamp = ts("T1");
    store.apply_update(&update).unwrap();

    let vehicle = store.get("v1").unwrap();
    assert_eq!(vehicle.last_update, "T1");
    assert_eq!(vehicle.status, VehicleStatus::Active);
    assert_eq!(vehicle.speed, 45.0);
    assert_eq!(vehicle.name, "Truck A");
}

#[test]
fn test_offset_timestamp_not_normalized() {
    let store = FleetStore::new();
    store.load_snapshot(vec![make_vehicle("v1", "Truck A", VehicleStatus::Idle)]);

    let mut update = make_update("v1");
    update.timestamp = ts("2024-02-11T15:05:00+02:00");
    store.apply_update(&update).unwrap();

    let value = serde_json::to_value(store.get("v1").unwrap()).unwrap();
    assert_eq!(value["lastUpdate"], "2024-02-11T15:05:00+02:00");
}

#[test]
fn test_update_for_every_vehicle_leaves_display_fields() {
    let store = FleetStore::new();
    let snapshot: Vec<Vehicle> = (0..20)
        .map(|i| make_vehicle(&format!("v{}", i), &format!("Unit {}", i), VehicleStatus::Idle))
        .collect();
    store.load_snapshot(snapshot.clone());

    for original in &snapshot {
        store.apply_update(&make_update(&original.id)).unwrap();

        let current = store.get(&original.id).unwrap();
        assert_eq!(current.id, original.id);
        assert_eq!(current.name, original.name);
        assert_eq!(current.plate, original.plate);
        assert_eq!(current.driver, original.driver);
        assert_eq!(current.odometer, original.odometer);
        assert_eq!(current.fuel, original.fuel);
    }
}

#[test]
fn test_update_for_unknown_vehicle_is_discarded() {
    let store = FleetStore::new();
    let snapshot = vec![
        make_vehicle("v1", "Truck A", VehicleStatus::Idle),
        make_vehicle("v2", "Van B", VehicleStatus::Active),
    ];
    store.load_snapshot(snapshot.clone());

    assert!(store.apply_update(&make_update("ghost")).is_none());

    assert_eq!(store.len(), 2);
    assert!(store.get("ghost").is_none());
    assert!(store.list().iter().all(|v| v.id != "ghost"));
    for vehicle in &snapshot {
        assert_eq!(store.get(&vehicle.id).as_ref(), Some(vehicle));
    }
}

#[test]
fn test_update_before_any_load_is_discarded() {
    let store = FleetStore::new();
    assert!(store.apply_update(&make_update("v1")).is_none());
    assert!(store.is_empty());
}

#[test]
fn test_updates_apply_in_order() {
    let store = FleetStore::new();
    store.load_snapshot(vec![make_vehicle("v1", "Truck A", VehicleStatus::Idle)]);

    for speed in [10.0, 20.0, 30.0] {
        let mut update = make_update("v1");
        update.speed = speed;
        store.apply_update(&update);
    }

    assert_eq!(store.get("v1").unwrap().speed, 30.0);
}

#[test]
fn test_changes_broadcast_after_mutation() {
    let store = FleetStore::new();
    let mut rx = store.subscribe();

    store.load_snapshot(vec![make_vehicle("v1", "Truck A", VehicleStatus::Idle)]);
    store.apply_update(&make_update("v1"));
    store.apply_update(&make_update("ghost"));

    match rx.try_recv().unwrap() {
        FleetChange::SnapshotLoaded { count, .. } => assert_eq!(count, 1),
        other => panic!("Expected SnapshotLoaded, got {:?}", other),
    }
    match rx.try_recv().unwrap() {
        FleetChange::VehicleUpdated { vehicle_id, .. } => assert_eq!(vehicle_id, "v1"),
        other => panic!("Expected VehicleUpdated, got {:?}", other),
    }
    // Discarded updates are not announced
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[test]
fn test_concurrent_updates_different_vehicles() {
    let store = Arc::new(FleetStore::new());
    store.load_snapshot(
        (0..10).map(|i| make_vehicle(&format!("v{}", i), "Unit", VehicleStatus::Idle)),
    );

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut update = make_update(&format!("v{}", i));
                update.speed = i as f64;
                store.apply_update(&update);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..10 {
        let vehicle = store.get(&format!("v{}", i)).unwrap();
        assert_eq!(vehicle.speed, i as f64);
        assert_eq!(vehicle.status, VehicleStatus::Active);
    }
}

#[test]
fn test_list_never_mixes_two_snapshots() {
    let fleet = |prefix: &'static str| -> Vec<Vehicle> {
        (0..50)
            .map(|i| make_vehicle(&format!("{}{}", prefix, i), prefix, VehicleStatus::Idle))
            .collect()
    };

    let store = Arc::new(FleetStore::new());
    store.load_snapshot(fleet("a"));

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for round in 0..200 {
                let prefix = if round % 2 == 0 { "b" } else { "a" };
                store.load_snapshot(fleet(prefix));
            }
        })
    };

    while !writer.is_finished() {
        let listed = store.list();
        assert_eq!(listed.len(), 50);
        let first = listed[0].name.clone();
        assert!(
            listed.iter().all(|v| v.name == first),
            "list mixed vehicles from two snapshots"
        );
    }
    writer.join().unwrap();
}

#[test]
fn test_metrics_count_by_status() {
    let vehicles = vec![
        make_vehicle("v1", "A", VehicleStatus::Active),
        make_vehicle("v2", "B", VehicleStatus::Active),
        make_vehicle("v3", "C", VehicleStatus::Idle),
        make_vehicle("v4", "D", VehicleStatus::Offline),
    ];

    let metrics = FleetMetrics::from_vehicles(&vehicles);
    assert_eq!(metrics.total, 4);
    assert_eq!(metrics.active, 2);
    assert_eq!(metrics.idle, 1);
    assert_eq!(metrics.offline, 1);
    assert_eq!(metrics.count(VehicleStatus::Active), 2);
}

#[test]
fn test_metrics_track_store_updates() {
    let store = FleetStore::new();
    store.load_snapshot(vec![
        make_vehicle("v1", "A", VehicleStatus::Idle),
        make_vehicle("v2", "B", VehicleStatus::Idle),
    ]);
    store.apply_update(&make_update("v1"));

    let metrics = FleetMetrics::from_vehicles(&store.list());
    assert_eq!(metrics.active, 1);
    assert_eq!(metrics.idle, 1);
}

#[test]
fn test_filter_search_matches_name_plate_driver() {
    let mut vehicles = vec![
        make_vehicle("v1", "Truck Alpha", VehicleStatus::Active),
        make_vehicle("v2", "Van Beta", VehicleStatus::Idle),
        make_vehicle("v3", "Truck Gamma", VehicleStatus::Offline),
    ];
    vehicles[1].plate = "XYZ-999".to_string();
    vehicles[2].driver = "Morgan Lee".to_string();

    let by_name = VehicleFilter::new("truck", None).apply(&vehicles);
    assert_eq!(sorted_ids(&by_name), vec!["v1", "v3"]);

    let by_plate = VehicleFilter::new("xyz", None).apply(&vehicles);
    assert_eq!(sorted_ids(&by_plate), vec!["v2"]);

    let by_driver = VehicleFilter::new("MORGAN", None).apply(&vehicles);
    assert_eq!(sorted_ids(&by_driver), vec!["v3"]);
}

#[test]
fn test_filter_by_status() {
    let vehicles = vec![
        make_vehicle("v1", "Truck Alpha", VehicleStatus::Active),
        make_vehicle("v2", "Van Beta", VehicleStatus::Idle),
        make_vehicle("v3", "Truck Gamma", VehicleStatus::Active),
    ];

    let active = VehicleFilter::new("", Some(VehicleStatus::Active)).apply(&vehicles);
    assert_eq!(sorted_ids(&active), vec!["v1", "v3"]);

    let active_gamma =
        VehicleFilter::new("gamma", Some(VehicleStatus::Active)).apply(&vehicles);
    assert_eq!(sorted_ids(&active_gamma), vec!["v3"]);

    let none = VehicleFilter::new("beta", Some(VehicleStatus::Offline)).apply(&vehicles);
    assert!(none.is_empty());
}

#[test]
fn test_filter_search_whitespace_is_literal() {
    let mut vehicles = vec![
        make_vehicle("v1", "Truck Alpha", VehicleStatus::Active),
        make_vehicle("v2", "Vanbeta", VehicleStatus::Idle),
    ];
    for vehicle in &mut vehicles {
        vehicle.driver = "Dana".to_string();
    }

    let spaced = VehicleFilter::new(" ", None).apply(&vehicles);
    assert_eq!(sorted_ids(&spaced), vec!["v1"]);

    let padded = VehicleFilter::new(" truck", None).apply(&vehicles);
    assert!(padded.is_empty());
}

#[test]
fn test_filter_default_matches_all_sorted_by_name() {
    let vehicles = vec![
        make_vehicle("v3", "Charlie", VehicleStatus::Idle),
        make_vehicle("v1", "Alpha", VehicleStatus::Idle),
        make_vehicle("v2", "Bravo", VehicleStatus::Idle),
    ];

    let names: Vec<String> = VehicleFilter::default()
        .apply(&vehicles)
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);
}
