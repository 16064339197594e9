use crate::vehicle::{Vehicle, VehicleUpdate};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Change notification broadcast after each store mutation
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetChange {
    SnapshotLoaded {
        count: usize,
        timestamp: DateTime<Utc>,
    },
    VehicleUpdated {
        vehicle_id: String,
        timestamp: DateTime<Utc>,
    },
}

/// Authoritative in-memory snapshot of the tracked fleet.
///
/// All mutation goes through `load_snapshot` and `apply_update`. Readers get
/// owned copies, so nothing outside the store can mutate a vehicle.
pub struct FleetStore {
    /// Lock-free concurrent map for fast reads
    vehicles: DashMap<String, Vehicle>,

    /// Held for writing across a whole snapshot load; every reader and
    /// `apply_update` holds it for reading, so none sees a half-applied load
    reload: RwLock<()>,

    /// Broadcast channel for change notifications
    change_tx: broadcast::Sender<FleetChange>,
}

impl FleetStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(1000);

        Self {
            vehicles: DashMap::new(),
            reload: RwLock::new(()),
            change_tx,
        }
    }

    /// Replace the whole snapshot.
    ///
    /// Vehicles missing from `vehicles` stop being retrievable. A repeated id
    /// keeps its last occurrence. Returns the number of vehicles now held.
    pub fn load_snapshot<I>(&self, vehicles: I) -> usize
    where
        I: IntoIterator<Item = Vehicle>,
    {
        let incoming: Vec<Vehicle> = vehicles.into_iter().collect();

        let count = {
            let _reload = self.reload.write().unwrap_or_else(PoisonError::into_inner);

            {
                let keep: HashSet<&str> = incoming.iter().map(|v| v.id.as_str()).collect();
                self.vehicles.retain(|id, _| keep.contains(id.as_str()));
            }
            for vehicle in incoming {
                self.vehicles.insert(vehicle.id.clone(), vehicle);
            }
            self.vehicles.len()
        };
        info!(vehicles = count, "Loaded fleet snapshot");

        let _ = self.change_tx.send(FleetChange::SnapshotLoaded {
            count,
            timestamp: Utc::now(),
        });

        count
    }

    /// Merge a live update into an existing vehicle.
    ///
    /// Returns the updated vehicle, or None when the id is not in the
    /// snapshot. Unknown ids never create a vehicle.
    pub fn apply_update(&self, update: &VehicleUpdate) -> Option<Vehicle> {
        let updated = {
            let _reload = self.read_guard();
            let mut vehicle = match self.vehicles.get_mut(&update.vehicle_id) {
                Some(vehicle) => vehicle,
                None => {
                    debug!(vehicle_id = %update.vehicle_id, "Update for unknown vehicle discarded");
                    return None;
                }
            };
            vehicle.apply_update(update);
            vehicle.clone()
        };

        let _ = self.change_tx.send(FleetChange::VehicleUpdated {
            vehicle_id: update.vehicle_id.clone(),
            timestamp: Utc::now(),
        });

        Some(updated)
    }

    /// Get vehicle by ID
    pub fn get(&self, vehicle_id: &str) -> Option<Vehicle> {
        let _reload = self.read_guard();
        self.vehicles.get(vehicle_id).map(|v| v.clone())
    }

    /// Get all vehicles (order unspecified)
    pub fn list(&self) -> Vec<Vehicle> {
        let _reload = self.read_guard();
        self.vehicles.iter().map(|v| v.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        let _reload = self.read_guard();
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.reload.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<FleetChange> {
        self.change_tx.subscribe()
    }
}

impl Default for FleetStore {
    fn default() -> Self {
        Self::new()
    }
}
