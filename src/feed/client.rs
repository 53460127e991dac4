//! Position feed trait and record validation.
//!
//! The [`PositionFeed`] trait abstracts over whatever backend serves live
//! vehicle positions (REST endpoint, message bus, database view). The
//! poller only requires a single fetch method; everything about scheduling,
//! retries and staleness lives in the poller itself.

use std::future::Future;

use chrono::{DateTime, Utc};

use super::error::FeedError;
use super::types::{PositionSample, RawPosition, VehicleId, VehicleSelection, VehicleStatus};
use crate::geo::GeoPoint;

/// Trait for fetching the current position set for a selection of vehicles.
///
/// Implementations should return one record per vehicle. The response is
/// treated as untrusted; validation happens in [`validate_record`].
pub trait PositionFeed: Send + Sync {
    /// Fetch current positions for the selected vehicles.
    fn fetch_positions(
        &self,
        selection: &VehicleSelection,
    ) -> impl Future<Output = Result<Vec<RawPosition>, FeedError>> + Send;
}

/// Validate a single raw record into a trusted sample.
///
/// Checks, in order: coordinate ranges, timestamp presence and RFC 3339
/// form. The vehicle status is parsed leniently (unknown strings map to
/// active) since status is informational, not safety-relevant.
pub fn validate_record(raw: &RawPosition) -> Result<(PositionSample, VehicleStatus), FeedError> {
    let point = GeoPoint::new(raw.latitude, raw.longitude).map_err(|source| {
        FeedError::InvalidCoordinate {
            vehicle: raw.id.clone(),
            source,
        }
    })?;

    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| FeedError::BadTimestamp(raw.id.clone()))?;

    let status = raw
        .status
        .as_deref()
        .map(VehicleStatus::parse)
        .unwrap_or_default();

    Ok((
        PositionSample {
            vehicle: VehicleId::new(raw.id.clone()),
            point,
            timestamp,
            speed: raw.speed,
        },
        status,
    ))
}
