// Fleet state store and derived read-side views

mod store;
mod view;

pub use store::{FleetChange, FleetStore};
pub use view::{FleetMetrics, VehicleFilter};

#[cfg(test)]
mod tests;
