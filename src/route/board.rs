//! Route board - owns the active route set and its lifecycle transitions.
//!
//! The board is the single owner of per-route state. Route creation and
//! cancellation are externally triggered (scheduling lives outside this
//! core); the board owns exactly the status and progress transitions.
//! Every mutating method validates first and only then writes, so a
//! rejected call never leaves partial state behind.

use std::collections::HashMap;

use chrono::Utc;

use super::types::{DistributionRoute, RouteAction, RouteError, RouteId, RouteStatus};

/// The set of scheduled and running routes.
#[derive(Debug, Default)]
pub struct RouteBoard {
    routes: HashMap<RouteId, DistributionRoute>,
}

impl RouteBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a newly created route on the board.
    pub fn schedule(&mut self, route: DistributionRoute) -> Result<(), RouteError> {
        if self.routes.contains_key(&route.id) {
            return Err(RouteError::DuplicateId(route.id));
        }
        tracing::info!(
            route = %route.id,
            vehicle = %route.vehicle,
            drop_points = route.total_drop_points,
            "Route scheduled"
        );
        self.routes.insert(route.id.clone(), route);
        Ok(())
    }

    /// Look up a route.
    pub fn get(&self, id: &RouteId) -> Option<&DistributionRoute> {
        self.routes.get(id)
    }

    /// All routes currently on the board, in no particular order.
    pub fn routes(&self) -> impl Iterator<Item = &DistributionRoute> {
        self.routes.values()
    }

    /// Start a pending route: sets `Active` and stamps `start_time` if the
    /// operator has not pre-set one.
    pub fn start(&mut self, id: &RouteId) -> Result<&DistributionRoute, RouteError> {
        let route = self.get_mut(id)?;
        if route.status != RouteStatus::Pending {
            return Err(RouteError::InvalidTransition {
                route: id.clone(),
                from: route.status,
                action: RouteAction::Start,
            });
        }
        route.status = RouteStatus::Active;
        if route.start_time.is_none() {
            route.start_time = Some(Utc::now());
        }
        tracing::info!(route = %id, "Route started");
        Ok(route)
    }

    /// Complete an active or delayed route: stamps `end_time` and forces
    /// the progress counter to the total.
    pub fn complete(&mut self, id: &RouteId) -> Result<&DistributionRoute, RouteError> {
        let route = self.get_mut(id)?;
        if !matches!(route.status, RouteStatus::Active | RouteStatus::Delayed) {
            return Err(RouteError::InvalidTransition {
                route: id.clone(),
                from: route.status,
                action: RouteAction::Complete,
            });
        }
        route.status = RouteStatus::Completed;
        route.end_time = Some(Utc::now());
        route.completed_drop_points = route.total_drop_points;
        tracing::info!(route = %id, "Route completed");
        Ok(route)
    }

    /// Cancel a route from any non-terminal state.
    ///
    /// The route is removed from the board entirely; there is no visible
    /// "cancelled" state, it simply disappears from scheduling.
    pub fn cancel(&mut self, id: &RouteId) -> Result<DistributionRoute, RouteError> {
        match self.routes.get(id) {
            None => return Err(RouteError::NotFound(id.clone())),
            Some(route) if route.status.is_terminal() => {
                return Err(RouteError::InvalidTransition {
                    route: id.clone(),
                    from: route.status,
                    action: RouteAction::Cancel,
                });
            }
            Some(_) => {}
        }
        tracing::info!(route = %id, "Route cancelled");
        // Presence was just checked; remove cannot miss.
        self.routes
            .remove(id)
            .ok_or_else(|| RouteError::NotFound(id.clone()))
    }

    /// Record drop-point progress on an active route.
    ///
    /// Progress must stay within `0..=total` and never decrease. Does not
    /// change the route's status: delay and issue detection are operator
    /// signals, not derived from progress.
    pub fn record_progress(
        &mut self,
        id: &RouteId,
        completed: u32,
    ) -> Result<&DistributionRoute, RouteError> {
        let route = self.get_mut(id)?;
        if route.status != RouteStatus::Active {
            return Err(RouteError::InvalidTransition {
                route: id.clone(),
                from: route.status,
                action: RouteAction::RecordProgress,
            });
        }
        if completed > route.total_drop_points {
            return Err(RouteError::ProgressOutOfRange {
                completed,
                total: route.total_drop_points,
            });
        }
        if completed < route.completed_drop_points {
            return Err(RouteError::ProgressRegression {
                current: route.completed_drop_points,
                requested: completed,
            });
        }
        route.completed_drop_points = completed;
        tracing::debug!(
            route = %id,
            completed,
            total = route.total_drop_points,
            "Route progress recorded"
        );
        Ok(route)
    }

    /// Operator signal: mark an active route delayed.
    pub fn mark_delayed(&mut self, id: &RouteId) -> Result<&DistributionRoute, RouteError> {
        self.transition_from_active(id, RouteStatus::Delayed, RouteAction::MarkDelayed)
    }

    /// Operator signal: flag an active route with an issue.
    pub fn mark_issue(&mut self, id: &RouteId) -> Result<&DistributionRoute, RouteError> {
        self.transition_from_active(id, RouteStatus::Issue, RouteAction::MarkIssue)
    }

    fn transition_from_active(
        &mut self,
        id: &RouteId,
        to: RouteStatus,
        action: RouteAction,
    ) -> Result<&DistributionRoute, RouteError> {
        let route = self.get_mut(id)?;
        if route.status != RouteStatus::Active {
            return Err(RouteError::InvalidTransition {
                route: id.clone(),
                from: route.status,
                action,
            });
        }
        route.status = to;
        tracing::info!(route = %id, status = %to, "Route status changed");
        Ok(route)
    }

    fn get_mut(&mut self, id: &RouteId) -> Result<&mut DistributionRoute, RouteError> {
        self.routes
            .get_mut(id)
            .ok_or_else(|| RouteError::NotFound(id.clone()))
    }
}
