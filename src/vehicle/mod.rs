use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod validation;

pub use validation::{validate_update, ValidationError};

/// Operational status of a tracked vehicle.
///
/// Serialized lowercase on the wire. Any other value fails to deserialize,
/// so a vehicle can never hold an out-of-range status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Idle,
    Offline,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Idle => "idle",
            VehicleStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// A tracked vehicle as held in the fleet snapshot.
///
/// `name`, `plate`, `driver`, `odometer` and `fuel` are only ever set by a
/// full snapshot load. Live updates touch the remaining fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Externally assigned identifier, unique within a snapshot
    pub id: String,

    pub name: String,
    pub plate: String,
    pub driver: String,

    pub status: VehicleStatus,
    pub position: Position,

    /// Speed in km/h
    pub speed: f64,

    /// Heading in degrees
    pub heading: f64,

    /// Timestamp of the last live update (or of the snapshot), kept
    /// exactly as the source sent it
    pub last_update: String,

    /// Odometer reading in km
    pub odometer: f64,

    /// Fuel level in percent
    pub fuel: f64,
}

impl Vehicle {
    /// `last_update` read as an RFC 3339 instant, if it is one
    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_update)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Merge a live update into this vehicle.
    ///
    /// Overwrites exactly `position`, `speed`, `heading`, `status` and
    /// `last_update`. Identity, display and slow-changing fields are left
    /// untouched. The caller is responsible for matching `vehicle_id`.
    pub fn apply_update(&mut self, update: &VehicleUpdate) {
        self.position = update.position;
        self.speed = update.speed;
        self.heading = update.heading;
        self.status = update.status;
        self.last_update.clone_from(&update.timestamp);
    }
}

/// Partial live update for a single vehicle, as carried by the feed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub vehicle_id: String,
    pub position: Position,
    pub speed: f64,
    pub heading: f64,
    pub status: VehicleStatus,

    /// Opaque source timestamp, copied verbatim into `Vehicle::last_update`
    pub timestamp: String,
}

impl VehicleUpdate {
    /// Check the update against payload rules before any field is trusted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_update(self)
    }
}
