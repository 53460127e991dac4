//! Core types for the position feed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Opaque vehicle identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Vehicle lifecycle status, owned by the external fleet registry.
///
/// Decommissioned vehicles are excluded from zone evaluation; their last
/// snapshot is retained for display but no further batches include them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleStatus {
    #[default]
    Active,
    InService,
    Decommissioned,
}

impl VehicleStatus {
    /// Parse a feed status string. Unknown values map to `Active` so an
    /// unrecognized status never drops a vehicle from tracking.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "in-service" | "in_service" => Self::InService,
            "decommissioned" => Self::Decommissioned,
            _ => Self::Active,
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::InService => write!(f, "in-service"),
            Self::Decommissioned => write!(f, "decommissioned"),
        }
    }
}

/// Untrusted position record as returned by the feed.
///
/// This is the wire shape; it is validated and converted to a
/// [`PositionSample`] before anything downstream sees it. A record with a
/// malformed coordinate or timestamp is dropped for the batch, never
/// applied.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPosition {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339 timestamp. Absent or malformed timestamps disqualify the
    /// record from zone evaluation (stale-data contract).
    pub timestamp: Option<String>,
    /// Instantaneous speed, if the feed reports one.
    pub speed: Option<f64>,
    pub status: Option<String>,
}

/// Immutable, validated position sample for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub vehicle: VehicleId,
    pub point: GeoPoint,
    pub timestamp: DateTime<Utc>,
    /// Instantaneous speed in the feed's unit. `None` when the feed did not
    /// report one; consumers treat absent speed as 0.
    pub speed: Option<f64>,
}

/// Last-known state for one vehicle in the poller's live view.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub sample: PositionSample,
    pub status: VehicleStatus,
}

/// Which vehicles a subscription tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleSelection {
    /// Track every vehicle the feed reports.
    All,
    /// Track only the listed vehicle ids.
    Vehicles(Vec<VehicleId>),
}

impl VehicleSelection {
    /// True if `id` is covered by this selection.
    pub fn includes(&self, id: &VehicleId) -> bool {
        match self {
            Self::All => true,
            Self::Vehicles(ids) => ids.contains(id),
        }
    }
}

/// Events broadcast by the poller to its subscribers.
#[derive(Debug, Clone)]
pub enum PollerEvent {
    /// A fetch succeeded: the validated samples applied this tick.
    Batch(Vec<PositionSample>),
    /// A fetch failed; last-known positions were retained and the poller
    /// will retry on the next tick. Advisory, never fatal.
    FetchFailed {
        consecutive_errors: u32,
        message: String,
    },
}
