//! Distribution route lifecycle.
//!
//! A route moves through a small state machine while a vehicle works its
//! drop points:
//!
//! - `Pending` - scheduled, not yet started
//! - `Active` - underway; progress is recorded against it
//! - `Delayed` / `Issue` - operator-flagged exceptional states
//! - `Completed` - terminal
//!
//! # Components
//!
//! - [`RouteBoard`] - owns the route set and enforces transitions
//! - [`DistributionRoute`] - per-route record
//! - [`RouteStatus`] / [`RouteError`] - lifecycle states and rejections

mod board;
mod types;

pub use board::RouteBoard;
pub use types::{DistributionRoute, RouteAction, RouteError, RouteId, RouteStatus};
