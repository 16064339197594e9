// Vehicle data model and update validation
pub mod vehicle;

// Fleet state store and derived views
pub mod fleet;

// Live feed channel (WebSocket client)
pub mod feed;

// Snapshot source for full fleet loads
pub mod snapshot;

// Configuration
pub mod config;

// Feed → store wiring and connection status
pub mod dashboard;

pub use dashboard::{Dashboard, DashboardStatus};
pub use feed::{ConnectionState, FeedChannel, FeedConfig, FeedHandle, FeedHandler};
pub use fleet::{FleetChange, FleetMetrics, FleetStore, VehicleFilter};
pub use vehicle::{Position, Vehicle, VehicleStatus, VehicleUpdate};
