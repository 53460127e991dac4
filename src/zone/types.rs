//! Geofence zone type definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feed::VehicleId;
use crate::geo::{self, GeoError, GeoPoint};

/// Opaque zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A circular geofence zone.
///
/// The radius is meters, everywhere: construction takes meters, the
/// containment test compares against meters, and any persistence layer is
/// expected to store meters. No other unit appears at any boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    /// Human-readable label for notifications and the map layer.
    pub label: String,
    /// Display color (e.g. `#ff0000`). Display-only, never interpreted.
    pub color: String,
    pub center: GeoPoint,
    /// Radius in meters, strictly positive.
    pub radius_m: f64,
    /// Inactive zones are skipped by evaluation entirely.
    pub active: bool,
    /// Whether transition events for this zone reach the dispatcher.
    pub notify: bool,
}

impl Zone {
    /// Create an active, notifying zone, validating center and radius.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        color: impl Into<String>,
        lat: f64,
        lon: f64,
        radius_m: f64,
    ) -> Result<Self, ZoneError> {
        let center = GeoPoint::new(lat, lon)?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ZoneError::InvalidRadius(radius_m));
        }
        Ok(Self {
            id: ZoneId::new(id),
            label: label.into(),
            color: color.into(),
            center,
            radius_m,
            active: true,
            notify: true,
        })
    }

    /// True iff `point` lies within this zone (boundary inclusive).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        geo::is_inside(point, &self.center, self.radius_m)
    }
}

/// Errors from zone construction and registry CRUD.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Radius must be strictly positive and finite.
    #[error("invalid zone radius: {0} m (must be > 0)")]
    InvalidRadius(f64),

    /// Center coordinates out of range.
    #[error("invalid zone center: {0}")]
    InvalidCenter(#[from] GeoError),

    /// A zone with this id already exists in the registry.
    #[error("zone {0} already exists")]
    DuplicateId(ZoneId),

    /// No zone with this id in the registry.
    #[error("zone {0} not found")]
    NotFound(ZoneId),
}

/// Direction of a zone boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Enter,
    Exit,
}

impl TransitionKind {
    /// The opposite crossing direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::Enter => Self::Exit,
            Self::Exit => Self::Enter,
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// A vehicle crossing a zone boundary, emitted by evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub vehicle: VehicleId,
    pub zone: ZoneId,
    pub kind: TransitionKind,
    /// Timestamp of the position sample that triggered the crossing.
    pub at: DateTime<Utc>,
}
