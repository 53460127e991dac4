//! Geofence zones and containment
//!
//! Owns the set of circular geofence zones and the derived per-(vehicle,
//! zone) membership state, and turns position batches into enter/exit
//! [`TransitionEvent`]s.

mod registry;
mod types;

pub use registry::ZoneRegistry;
pub use types::{TransitionEvent, TransitionKind, Zone, ZoneError, ZoneId};
