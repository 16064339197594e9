//! Dashboard host glue: routes live feed events into the fleet store and
//! tracks connection status for user-facing display.

use crate::feed::FeedHandler;
use crate::fleet::FleetStore;
use crate::vehicle::VehicleUpdate;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared connection status and feed counters
#[derive(Clone, Default)]
pub struct DashboardStatus {
    connected: Arc<AtomicBool>,
    updates_applied: Arc<AtomicU64>,
    updates_discarded: Arc<AtomicU64>,
    reconnects_scheduled: Arc<AtomicU64>,
}

impl DashboardStatus {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn get_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.is_connected(),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_discarded: self.updates_discarded.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dashboard status at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub updates_applied: u64,
    /// Updates for vehicles not in the snapshot
    pub updates_discarded: u64,
    pub reconnects_scheduled: u64,
}

/// Feed handler that applies updates to the store
pub struct Dashboard {
    store: Arc<FleetStore>,
    status: DashboardStatus,
}

impl Dashboard {
    pub fn new(store: Arc<FleetStore>) -> Self {
        Self {
            store,
            status: DashboardStatus::default(),
        }
    }

    pub fn store(&self) -> &Arc<FleetStore> {
        &self.store
    }

    /// Status handle that stays valid after the dashboard moves into the
    /// feed channel
    pub fn status(&self) -> DashboardStatus {
        self.status.clone()
    }
}

impl FeedHandler for Dashboard {
    fn on_vehicle_update(&mut self, update: VehicleUpdate) {
        match self.store.apply_update(&update) {
            Some(_) => {
                self.status.updates_applied.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.status.updates_discarded.fetch_add(1, Ordering::Relaxed);
                debug!(vehicle_id = %update.vehicle_id, "Ignoring update for vehicle not in snapshot");
            }
        }
    }

    fn on_connect(&mut self) {
        self.status.connected.store(true, Ordering::Relaxed);
        info!("Connected: live feed established");
    }

    fn on_disconnect(&mut self) {
        // Only announce the first drop; failed reconnects stay quiet
        if self.status.connected.swap(false, Ordering::Relaxed) {
            warn!("Disconnected: live feed lost, continuing on last known snapshot");
        }
    }

    fn on_reconnect_scheduled(&mut self, attempt: u32, delay: Duration) {
        self.status.reconnects_scheduled.fetch_add(1, Ordering::Relaxed);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
    }
}
