//! Zone registry and containment engine.
//!
//! The registry owns the zone collection and the per-(vehicle, zone)
//! membership table. It is an explicitly owned value, never a process-wide
//! singleton: create one per tracking session, mutate it through CRUD, and
//! drop it with the session.
//!
//! # Membership model
//!
//! Each (vehicle, active zone) pair is a two-state machine: `Outside`
//! (initial) and `Inside`. Entries are created lazily on first evaluation.
//! [`evaluate`](ZoneRegistry::evaluate) recomputes containment from the
//! current geometry on every call; editing a zone's geometry never fires
//! retroactive events - the next evaluation simply sees the new circle.

use std::collections::HashMap;

use crate::feed::{PositionSample, VehicleId};

use super::types::{TransitionEvent, TransitionKind, Zone, ZoneError, ZoneId};

/// Membership state for one (vehicle, zone) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Outside,
    Inside,
}

/// Registry of geofence zones with membership tracking.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    /// Zones in insertion order. Order is what makes event emission
    /// deterministic per zone across batches.
    zones: Vec<Zone>,
    membership: HashMap<(VehicleId, ZoneId), Membership>,
}

impl ZoneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone. Fails if a zone with the same id already exists.
    pub fn add(&mut self, zone: Zone) -> Result<(), ZoneError> {
        if self.zones.iter().any(|z| z.id == zone.id) {
            return Err(ZoneError::DuplicateId(zone.id));
        }
        tracing::info!(zone = %zone.id, label = %zone.label, radius_m = zone.radius_m, "Zone added");
        self.zones.push(zone);
        Ok(())
    }

    /// Replace an existing zone's definition (label, color, geometry,
    /// flags). Membership state is kept; containment against the new
    /// geometry is recomputed on the next evaluation, never retroactively.
    pub fn update(&mut self, zone: Zone) -> Result<(), ZoneError> {
        match self.zones.iter_mut().find(|z| z.id == zone.id) {
            Some(existing) => {
                tracing::info!(zone = %zone.id, "Zone updated");
                *existing = zone;
                Ok(())
            }
            None => Err(ZoneError::NotFound(zone.id)),
        }
    }

    /// Remove a zone and all its membership state. Re-adding a zone with
    /// the same id starts fresh at `Outside` for every vehicle.
    pub fn remove(&mut self, id: &ZoneId) -> Result<Zone, ZoneError> {
        let index = self
            .zones
            .iter()
            .position(|z| &z.id == id)
            .ok_or_else(|| ZoneError::NotFound(id.clone()))?;
        let zone = self.zones.remove(index);
        self.membership.retain(|(_, zone_id), _| zone_id != id);
        tracing::info!(zone = %id, "Zone removed");
        Ok(zone)
    }

    /// Toggle a zone's active flag.
    ///
    /// Deactivating clears the zone's membership state, so membership only
    /// ever exists for (vehicle, active zone) pairs and reactivation starts
    /// fresh at `Outside`.
    pub fn set_active(&mut self, id: &ZoneId, active: bool) -> Result<(), ZoneError> {
        let zone = self
            .zones
            .iter_mut()
            .find(|z| &z.id == id)
            .ok_or_else(|| ZoneError::NotFound(id.clone()))?;
        zone.active = active;
        if !active {
            self.membership.retain(|(_, zone_id), _| zone_id != id);
        }
        tracing::info!(zone = %id, active, "Zone active flag changed");
        Ok(())
    }

    /// Look up a zone by id.
    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    /// All zones, in insertion order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Whether a vehicle is currently inside a zone, per the last
    /// evaluation. `false` for pairs never evaluated.
    pub fn is_inside(&self, vehicle: &VehicleId, zone: &ZoneId) -> bool {
        self.membership
            .get(&(vehicle.clone(), zone.clone()))
            .is_some_and(|m| *m == Membership::Inside)
    }

    /// Evaluate one position against every active zone, flipping membership
    /// states and emitting the transitions that occurred.
    ///
    /// Events carry the triggering sample's timestamp. For a given zone,
    /// successive evaluations alternate enter/exit strictly; a position
    /// that does not change containment emits nothing.
    pub fn evaluate(&mut self, sample: &PositionSample) -> Vec<TransitionEvent> {
        let mut events = Vec::new();

        for zone in &self.zones {
            if !zone.active {
                continue;
            }

            let inside_now = zone.contains(&sample.point);
            let key = (sample.vehicle.clone(), zone.id.clone());
            let state = self.membership.entry(key).or_insert(Membership::Outside);

            let kind = match (*state, inside_now) {
                (Membership::Outside, true) => {
                    *state = Membership::Inside;
                    TransitionKind::Enter
                }
                (Membership::Inside, false) => {
                    *state = Membership::Outside;
                    TransitionKind::Exit
                }
                _ => continue,
            };

            tracing::debug!(
                vehicle = %sample.vehicle,
                zone = %zone.id,
                kind = %kind,
                "Zone transition"
            );

            events.push(TransitionEvent {
                vehicle: sample.vehicle.clone(),
                zone: zone.id.clone(),
                kind,
                at: sample.timestamp,
            });
        }

        events
    }

    /// Evaluate a whole position batch in order, concatenating events.
    pub fn evaluate_batch(&mut self, samples: &[PositionSample]) -> Vec<TransitionEvent> {
        samples
            .iter()
            .flat_map(|sample| self.evaluate(sample))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use chrono::{TimeZone, Utc};

    const PRAGUE_LAT: f64 = 50.0755;
    const PRAGUE_LON: f64 = 14.4378;

    fn prague_zone() -> Zone {
        Zone::new("z1", "Prague center", "#3366ff", PRAGUE_LAT, PRAGUE_LON, 1000.0).unwrap()
    }

    fn sample(vehicle: &str, lat: f64, lon: f64, secs: u32) -> PositionSample {
        PositionSample {
            vehicle: VehicleId::from(vehicle),
            point: GeoPoint { lat, lon },
            timestamp: Utc.with_ymd_and_hms(2026, 8, 29, 10, 0, secs).unwrap(),
            speed: Some(20.0),
        }
    }

    #[test]
    fn test_enter_emitted_on_first_inside_position() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        let events = registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Enter);
        assert_eq!(events[0].vehicle, VehicleId::from("v1"));
        assert_eq!(events[0].zone, ZoneId::from("z1"));
        assert!(registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z1")));
    }

    #[test]
    fn test_no_event_while_membership_unchanged() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));
        let repeat = registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 30));
        assert!(repeat.is_empty());

        // Outside positions with no prior entry emit nothing either.
        let outside = registry.evaluate(&sample("v2", 51.0, 15.0, 0));
        assert!(outside.is_empty());
    }

    #[test]
    fn test_exit_after_moving_two_km_away() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));

        // ~2 km north of the center, well outside the 1000 m radius.
        let events = registry.evaluate(&sample("v1", PRAGUE_LAT + 0.018, PRAGUE_LON, 30));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Exit);
        assert!(!registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z1")));
    }

    #[test]
    fn test_n_crossings_emit_n_alternating_events() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        let inside = (PRAGUE_LAT, PRAGUE_LON);
        let outside = (PRAGUE_LAT + 0.018, PRAGUE_LON);

        let mut all = Vec::new();
        for (i, &(lat, lon)) in [inside, outside, inside, outside, inside]
            .iter()
            .enumerate()
        {
            all.extend(registry.evaluate(&sample("v1", lat, lon, i as u32)));
        }

        assert_eq!(all.len(), 5);
        let expected = [
            TransitionKind::Enter,
            TransitionKind::Exit,
            TransitionKind::Enter,
            TransitionKind::Exit,
            TransitionKind::Enter,
        ];
        for (event, expected_kind) in all.iter().zip(expected) {
            assert_eq!(event.kind, expected_kind);
        }
    }

    #[test]
    fn test_first_event_matches_first_crossing_direction() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        // Vehicle starts outside: the first event must be an enter, and
        // only once it actually crosses in.
        let none = registry.evaluate(&sample("v1", PRAGUE_LAT + 0.018, PRAGUE_LON, 0));
        assert!(none.is_empty());

        let events = registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 30));
        assert_eq!(events[0].kind, TransitionKind::Enter);
    }

    #[test]
    fn test_inactive_zone_skipped() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();
        registry.set_active(&ZoneId::from("z1"), false).unwrap();

        let events = registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));
        assert!(events.is_empty());
        assert!(!registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z1")));
    }

    #[test]
    fn test_reactivated_zone_starts_outside() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));
        registry.set_active(&ZoneId::from("z1"), false).unwrap();
        registry.set_active(&ZoneId::from("z1"), true).unwrap();

        // Still inside geographically, so reactivation yields a fresh enter.
        let events = registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 30));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Enter);
    }

    #[test]
    fn test_remove_clears_membership_and_readd_starts_fresh() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));
        registry.remove(&ZoneId::from("z1")).unwrap();
        assert!(!registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z1")));

        registry.add(prague_zone()).unwrap();
        let events = registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 30));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Enter);
    }

    #[test]
    fn test_geometry_update_fires_no_retroactive_events() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();

        registry.evaluate(&sample("v1", PRAGUE_LAT, PRAGUE_LON, 0));

        // Shrink the zone so the vehicle's last position is now outside.
        let mut smaller = prague_zone();
        smaller.radius_m = 1.0;
        registry.update(smaller).unwrap();

        // No event until the next evaluation sees the new geometry.
        assert!(registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z1")));

        // 900 m from center: inside the old circle, outside the new one.
        let events = registry.evaluate(&sample("v1", PRAGUE_LAT + 0.008, PRAGUE_LON, 30));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Exit);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();
        assert!(matches!(
            registry.add(prague_zone()),
            Err(ZoneError::DuplicateId(_))
        ));
        assert_eq!(registry.zones().len(), 1);
    }

    #[test]
    fn test_crud_on_missing_zone() {
        let mut registry = ZoneRegistry::new();
        let missing = ZoneId::from("nope");
        assert!(matches!(
            registry.remove(&missing),
            Err(ZoneError::NotFound(_))
        ));
        assert!(matches!(
            registry.set_active(&missing, true),
            Err(ZoneError::NotFound(_))
        ));
        assert!(matches!(
            registry.update(prague_zone()),
            Err(ZoneError::NotFound(_))
        ));
    }

    #[test]
    fn test_zone_validation() {
        assert!(matches!(
            Zone::new("z", "Zero", "#fff", 50.0, 14.0, 0.0),
            Err(ZoneError::InvalidRadius(_))
        ));
        assert!(matches!(
            Zone::new("z", "Negative", "#fff", 50.0, 14.0, -5.0),
            Err(ZoneError::InvalidRadius(_))
        ));
        assert!(matches!(
            Zone::new("z", "Bad center", "#fff", 91.0, 14.0, 100.0),
            Err(ZoneError::InvalidCenter(_))
        ));
    }

    #[test]
    fn test_membership_per_vehicle_and_zone() {
        let mut registry = ZoneRegistry::new();
        registry.add(prague_zone()).unwrap();
        registry
            .add(Zone::new("z2", "Brno", "#00ff00", 49.1951, 16.6068, 1500.0).unwrap())
            .unwrap();

        let events = registry.evaluate_batch(&[
            sample("v1", PRAGUE_LAT, PRAGUE_LON, 0),
            sample("v2", 49.1951, 16.6068, 0),
        ]);

        assert_eq!(events.len(), 2);
        assert!(registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z1")));
        assert!(!registry.is_inside(&VehicleId::from("v1"), &ZoneId::from("z2")));
        assert!(registry.is_inside(&VehicleId::from("v2"), &ZoneId::from("z2")));
        assert!(!registry.is_inside(&VehicleId::from("v2"), &ZoneId::from("z1")));
    }
}
