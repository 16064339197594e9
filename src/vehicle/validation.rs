use super::VehicleUpdate;
use std::fmt;

/// Validation errors for VehicleUpdate payloads
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingVehicleId,
    NonFinite(&'static str),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    NegativeSpeed(f64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingVehicleId => write!(f, "vehicleId is required"),
            ValidationError::NonFinite(field) => {
                write!(f, "{} must be a finite number", field)
            }
            ValidationError::LatitudeOutOfRange(lat) => {
                write!(f, "latitude must be within [-90, 90], got {}", lat)
            }
            ValidationError::LongitudeOutOfRange(lng) => {
                write!(f, "longitude must be within [-180, 180], got {}", lng)
            }
            ValidationError::NegativeSpeed(speed) => {
                write!(f, "speed must not be negative, got {}", speed)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a VehicleUpdate decoded from the feed.
///
/// Rules:
/// - vehicleId: non-empty
/// - lat, lng, speed, heading: finite
/// - lat within [-90, 90], lng within [-180, 180]
/// - speed: not negative
///
/// Heading is not range-checked; renderers normalize it modulo 360.
pub fn validate_update(update: &VehicleUpdate) -> Result<(), ValidationError> {
    if update.vehicle_id.is_empty() {
        return Err(ValidationError::MissingVehicleId);
    }

    let numbers = [
        ("position.lat", update.position.lat),
        ("position.lng", update.position.lng),
        ("speed", update.speed),
        ("heading", update.heading),
    ];
    for (field, value) in numbers {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(field));
        }
    }

    if !(-90.0..=90.0).contains(&update.position.lat) {
        return Err(ValidationError::LatitudeOutOfRange(update.position.lat));
    }
    if !(-180.0..=180.0).contains(&update.position.lng) {
        return Err(ValidationError::LongitudeOutOfRange(update.position.lng));
    }

    if update.speed < 0.0 {
        return Err(ValidationError::NegativeSpeed(update.speed));
    }

    Ok(())
}
