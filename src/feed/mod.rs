//! Position feed polling
//!
//! Maintains a live, eventually-consistent view of vehicle positions by
//! periodically fetching from a caller-supplied [`PositionFeed`]. The
//! polling loop is the only background work in the crate; everything
//! downstream (zones, notifications, track processing) is synchronous
//! computation driven from its batches.
//!
//! # Components
//!
//! - [`client`] - `PositionFeed` trait and record validation
//! - [`poller`] - poll loop daemon, `PollerHandle`, generation-tagged
//!   stale-result discard
//! - [`types`] - `VehicleId`, `PositionSample`, `VehicleSelection`,
//!   `PollerEvent`
//! - [`config`] - poll interval and channel sizing
//! - [`error`] - `FeedError` taxonomy

mod client;
mod config;
mod error;
mod poller;
mod types;

pub use client::{validate_record, PositionFeed};
pub use config::{PollerConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_POLL_INTERVAL_SECS, MAX_BACKOFF};
pub use error::FeedError;
pub use poller::{PollerHandle, PositionPoller};
pub use types::{
    PollerEvent, PositionSample, RawPosition, VehicleId, VehicleSelection, VehicleSnapshot,
    VehicleStatus,
};
