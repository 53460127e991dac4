//! Distance and containment primitives
//!
//! Provides great-circle distance between geographic coordinates and the
//! point-in-circle test used by the geofence containment engine. All
//! functions here are pure; callers are expected to pre-validate
//! coordinates via [`GeoPoint::new`].

mod types;

pub use types::{GeoError, GeoPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance between two points, in kilometers.
///
/// The haversine formula is numerically stable near the poles and across
/// the ±180° meridian, so no special casing is needed for either.
#[inline]
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Test whether a point lies inside a circle of `radius_m` meters around
/// `center`. The boundary is inclusive: a point exactly `radius_m` meters
/// from the center is inside.
///
/// Radii are meters throughout the crate; the kilometer output of
/// [`distance_km`] is converted exactly once, here.
#[inline]
pub fn is_inside(point: &GeoPoint, center: &GeoPoint, radius_m: f64) -> bool {
    distance_km(point, center) * 1000.0 <= radius_m
}
