//! Notification dispatch for zone transitions.
//!
//! Consumes [`TransitionEvent`]s from the containment engine and hands
//! user-facing notifications to an external sink (UI toast, webhook, log).
//! Delivery is fire-and-forget: the engine's correctness never depends on
//! a notification arriving, and failed deliveries are not retried.
//!
//! Two gates sit between an event and the sink:
//!
//! - the zone's `notify` flag - events for muted zones are discarded, and
//! - per-(vehicle, zone, kind) deduplication - the same kind is never
//!   emitted twice without the opposite transition in between.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feed::VehicleId;
use crate::zone::{TransitionEvent, TransitionKind, ZoneId, ZoneRegistry};

/// A user-facing zone notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub vehicle: VehicleId,
    pub zone: ZoneId,
    /// Zone label at dispatch time, for display without a registry lookup.
    pub zone_label: String,
    pub kind: TransitionKind,
    pub at: DateTime<Utc>,
}

impl Notification {
    /// Human-readable one-liner for simple sinks.
    pub fn message(&self) -> String {
        match self.kind {
            TransitionKind::Enter => {
                format!("Vehicle {} entered zone {}", self.vehicle, self.zone_label)
            }
            TransitionKind::Exit => {
                format!("Vehicle {} left zone {}", self.vehicle, self.zone_label)
            }
        }
    }
}

/// Sink for delivered notifications.
///
/// Implementations must not block the caller for long; delivery happens on
/// the evaluation path. Failures are the sink's own concern.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

/// Sink that emits notifications as structured log records.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &Notification) {
        tracing::info!(
            vehicle = %notification.vehicle,
            zone = %notification.zone,
            kind = %notification.kind,
            "{}",
            notification.message()
        );
    }
}

/// Dispatcher with per-(vehicle, zone) deduplication.
pub struct NotificationDispatcher<S: NotificationSink> {
    sink: S,
    /// Last kind emitted per (vehicle, zone); a repeat of the same kind is
    /// suppressed until the opposite one has been seen.
    last_emitted: HashMap<(VehicleId, ZoneId), TransitionKind>,
}

impl<S: NotificationSink> NotificationDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            last_emitted: HashMap::new(),
        }
    }

    /// Dispatch a batch of transition events.
    ///
    /// `registry` supplies each zone's current `notify` flag and label.
    /// Events for zones deleted since evaluation are dropped. Returns the
    /// number of notifications delivered.
    pub fn dispatch(&mut self, events: &[TransitionEvent], registry: &ZoneRegistry) -> usize {
        let mut delivered = 0;

        for event in events {
            let Some(zone) = registry.get(&event.zone) else {
                tracing::debug!(zone = %event.zone, "Dropping event for deleted zone");
                continue;
            };
            if !zone.notify {
                continue;
            }

            let key = (event.vehicle.clone(), event.zone.clone());
            if self.last_emitted.get(&key) == Some(&event.kind) {
                tracing::trace!(
                    vehicle = %event.vehicle,
                    zone = %event.zone,
                    kind = %event.kind,
                    "Suppressing duplicate notification"
                );
                continue;
            }
            self.last_emitted.insert(key, event.kind);

            self.sink.deliver(&Notification {
                vehicle: event.vehicle.clone(),
                zone: event.zone.clone(),
                zone_label: zone.label.clone(),
                kind: event.kind,
                at: event.at,
            });
            delivered += 1;
        }

        delivered
    }
}
