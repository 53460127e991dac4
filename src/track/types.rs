//! History track type definitions.

use serde::{Deserialize, Serialize};

use crate::feed::PositionSample;

/// Default speed threshold below which a sample counts as stopped.
///
/// Expressed in the feed's speed unit; real-world GPS jitter makes
/// instantaneous speeds of a parked vehicle hover a few units above zero.
pub const DEFAULT_STOP_SPEED_THRESHOLD: f64 = 5.0;

/// Coarse movement state derived from instantaneous speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementState {
    Moving,
    Stopped,
}

/// A position sample annotated with its movement state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub sample: PositionSample,
    pub movement: MovementState,
}

/// Aggregate statistics over one vehicle's track.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Sum of great-circle distances between consecutive samples, not the
    /// straight-line endpoint distance.
    pub total_distance_km: f64,
    /// Highest instantaneous speed seen (absent speeds count as 0).
    pub max_speed: f64,
    /// Mean instantaneous speed over all samples (absent speeds count as 0).
    pub avg_speed: f64,
    /// Number of samples classified as stopped.
    pub stop_count: usize,
}
