//! Distribution route type definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feed::VehicleId;

/// Opaque route identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RouteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle state of a distribution route.
///
/// Transitions: `Pending -> Active`; `Active -> Completed | Delayed |
/// Issue`; `Delayed -> Completed`; cancel removes the route from any
/// non-terminal state. Nothing leaves `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Pending,
    Active,
    Completed,
    Delayed,
    Issue,
}

impl RouteStatus {
    /// True for states no transition can leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Delayed => write!(f, "delayed"),
            Self::Issue => write!(f, "issue"),
        }
    }
}

/// The dispatcher action that was attempted, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Start,
    Complete,
    Cancel,
    RecordProgress,
    MarkDelayed,
    MarkIssue,
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Complete => write!(f, "complete"),
            Self::Cancel => write!(f, "cancel"),
            Self::RecordProgress => write!(f, "record progress"),
            Self::MarkDelayed => write!(f, "mark delayed"),
            Self::MarkIssue => write!(f, "mark issue"),
        }
    }
}

/// A scheduled newspaper-distribution route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRoute {
    pub id: RouteId,
    pub vehicle: VehicleId,
    /// Reference to the assigned driver in the external user store.
    pub driver: String,
    pub total_drop_points: u32,
    /// Always within `0..=total_drop_points`, monotonically non-decreasing
    /// while active, forced to `total_drop_points` on completion.
    pub completed_drop_points: u32,
    pub scheduled_start: DateTime<Utc>,
    /// Set when the route is started (kept if an operator pre-set it).
    pub start_time: Option<DateTime<Utc>>,
    /// Set on completion.
    pub end_time: Option<DateTime<Utc>>,
    pub status: RouteStatus,
}

impl DistributionRoute {
    /// Create a pending route with no progress.
    pub fn new(
        id: impl Into<String>,
        vehicle: VehicleId,
        driver: impl Into<String>,
        total_drop_points: u32,
        scheduled_start: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RouteId::new(id),
            vehicle,
            driver: driver.into(),
            total_drop_points,
            completed_drop_points: 0,
            scheduled_start,
            start_time: None,
            end_time: None,
            status: RouteStatus::Pending,
        }
    }
}

/// Errors from route lifecycle operations.
///
/// Every rejection leaves the route exactly as it was; callers can rely on
/// no partial mutation having happened.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The action is not legal from the route's current state. Carries the
    /// actual state so the UI can react.
    #[error("cannot {action} route {route}: state is {from}")]
    InvalidTransition {
        route: RouteId,
        from: RouteStatus,
        action: RouteAction,
    },

    /// Progress beyond the route's total drop points.
    #[error("progress {completed} exceeds total drop points {total}")]
    ProgressOutOfRange { completed: u32, total: u32 },

    /// Progress must never decrease while a route is active.
    #[error("progress cannot regress from {current} to {requested}")]
    ProgressRegression { current: u32, requested: u32 },

    /// No route with this id on the board.
    #[error("route {0} not found")]
    NotFound(RouteId),

    /// A route with this id is already scheduled.
    #[error("route {0} already scheduled")]
    DuplicateId(RouteId),
}
