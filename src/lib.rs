//! FleetWatch - live fleet geofencing and track-processing engine
//!
//! This library provides the tracking core behind a fleet-management
//! dashboard: a polled live view of vehicle positions, circular geofence
//! zones with enter/exit detection, inspection due-date classification,
//! GPS history reduction for replay, and distribution-route lifecycle
//! tracking.
//!
//! # High-Level API
//!
//! ```ignore
//! use fleetwatch::feed::{PositionPoller, PollerConfig, VehicleSelection};
//! use fleetwatch::zone::{Zone, ZoneRegistry};
//!
//! let handle = PositionPoller::start(feed, VehicleSelection::All, PollerConfig::default());
//! let mut rx = handle.subscribe();
//!
//! let mut registry = ZoneRegistry::new();
//! registry.add(Zone::new("depot", "Depot", "#ff0000", 50.0755, 14.4378, 1000.0)?)?;
//!
//! while let Ok(event) = rx.recv().await {
//!     // Evaluate zone membership for each position batch
//! }
//! ```

pub mod feed;
pub mod geo;
pub mod inspection;
pub mod logging;
pub mod notify;
pub mod route;
pub mod track;
pub mod zone;

/// Version of the FleetWatch library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
