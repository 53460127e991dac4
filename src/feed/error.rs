//! Error types for the position feed.

use thiserror::Error;

use crate::geo::GeoError;

/// Errors that can occur while fetching or applying position batches.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The fetch itself failed (network, backend, decode). Transient:
    /// last-known positions are retained and the next tick retries.
    #[error("position fetch failed: {0}")]
    FetchFailed(String),

    /// A record carried a malformed latitude/longitude. The record is
    /// dropped from the batch, not retried.
    #[error("invalid coordinate for vehicle {vehicle}: {source}")]
    InvalidCoordinate {
        vehicle: String,
        #[source]
        source: GeoError,
    },

    /// A record's timestamp was absent or not RFC 3339. The record is
    /// skipped for this batch (stale-data contract).
    #[error("missing or malformed timestamp for vehicle {0}")]
    BadTimestamp(String),

    /// A record's timestamp regressed behind the vehicle's last-known
    /// sample. Out-of-order samples are dropped, never silently reordered.
    #[error("out-of-order sample for vehicle {vehicle} ({timestamp} is behind {last_known})")]
    OutOfOrderSample {
        vehicle: String,
        timestamp: String,
        last_known: String,
    },

    /// The poller task is no longer running.
    #[error("poller command channel closed")]
    ChannelClosed,
}
