use crate::vehicle::{Vehicle, VehicleStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fleet summary counts for the metrics panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetMetrics {
    pub total: usize,
    pub active: usize,
    pub idle: usize,
    pub offline: usize,
    pub generated_at: DateTime<Utc>,
}

impl FleetMetrics {
    pub fn from_vehicles(vehicles: &[Vehicle]) -> Self {
        let mut metrics = Self {
            total: vehicles.len(),
            active: 0,
            idle: 0,
            offline: 0,
            generated_at: Utc::now(),
        };

        for vehicle in vehicles {
            match vehicle.status {
                VehicleStatus::Active => metrics.active += 1,
                VehicleStatus::Idle => metrics.idle += 1,
                VehicleStatus::Offline => metrics.offline += 1,
            }
        }

        metrics
    }

    pub fn count(&self, status: VehicleStatus) -> usize {
        match status {
            VehicleStatus::Active => self.active,
            VehicleStatus::Idle => self.idle,
            VehicleStatus::Offline => self.offline,
        }
    }
}

/// List filter: free-text search plus an optional status.
///
/// `search` is a case-insensitive substring of name, plate or driver, used
/// as typed (whitespace included); an empty search matches everything. `status: None` means all statuses.
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub search: String,
    pub status: Option<VehicleStatus>,
}

impl VehicleFilter {
    pub fn new(search: impl Into<String>, status: Option<VehicleStatus>) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(status) = self.status {
            if vehicle.status != status {
                return false;
            }
        }

        let needle = self.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [&vehicle.name, &vehicle.plate, &vehicle.driver]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Matching vehicles, sorted by name then id for a stable display order
    pub fn apply(&self, vehicles: &[Vehicle]) -> Vec<Vehicle> {
        let mut matched: Vec<Vehicle> = vehicles
            .iter()
            .filter(|v| self.matches(v))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matched
    }
}
