//! History track processing
//!
//! Reduces a raw, time-ordered position history for one vehicle into the
//! shapes the display layer needs: a decimated track for replay, a
//! stops-only track, a waypoint sample for road-snapped routing, and an
//! aggregate summary. Every operation here is pure: the input slice is
//! never mutated and repeated calls yield identical results.

mod types;

pub use types::{HistoryPoint, MovementState, TrackSummary, DEFAULT_STOP_SPEED_THRESHOLD};

use crate::feed::PositionSample;
use crate::geo::{self, GeoPoint};

/// Target number of samples after decimation.
const WAYPOINT_TARGET: usize = 15;

/// Minimum input length before decimation kicks in. Shorter tracks are
/// returned as-is.
const DECIMATION_MIN_LEN: usize = 20;

/// Classify one sample's movement state against a speed threshold.
///
/// An absent speed counts as 0, which classifies as stopped.
#[inline]
pub fn classify_movement(sample: &PositionSample, speed_threshold: f64) -> MovementState {
    if sample.speed.unwrap_or(0.0) < speed_threshold {
        MovementState::Stopped
    } else {
        MovementState::Moving
    }
}

/// Deterministic stride decimation for route-waypoint display.
///
/// Keeps every Nth sample with `N = ceil(len / 15)` once the input has at
/// least 20 samples, always including the first and last sample. Inputs
/// shorter than 20 samples are returned unchanged. The output is never
/// longer than the input.
pub fn simplify(samples: &[PositionSample]) -> Vec<PositionSample> {
    if samples.len() < DECIMATION_MIN_LEN {
        return samples.to_vec();
    }

    let stride = samples.len().div_ceil(WAYPOINT_TARGET);
    let last = samples.len() - 1;

    let mut reduced: Vec<PositionSample> =
        samples.iter().step_by(stride).cloned().collect();

    // The stride walk starts at the first sample but can step past the
    // last; the endpoint is part of the contract.
    if (last % stride) != 0 {
        reduced.push(samples[last].clone());
    }

    reduced
}

/// Retain only the samples classified as stopped.
///
/// A sample is stopped when its instantaneous speed is below
/// `speed_threshold` (absent speed counts as 0, i.e. stopped).
pub fn stops_only(samples: &[PositionSample], speed_threshold: f64) -> Vec<HistoryPoint> {
    samples
        .iter()
        .filter_map(|sample| {
            let movement = classify_movement(sample, speed_threshold);
            (movement == MovementState::Stopped).then(|| HistoryPoint {
                sample: sample.clone(),
                movement,
            })
        })
        .collect()
}

/// Annotate every sample with its movement state.
pub fn annotate(samples: &[PositionSample], speed_threshold: f64) -> Vec<HistoryPoint> {
    samples
        .iter()
        .map(|sample| HistoryPoint {
            sample: sample.clone(),
            movement: classify_movement(sample, speed_threshold),
        })
        .collect()
}

/// Aggregate statistics over a track.
///
/// The distance is the sum over consecutive sample pairs, so a loop that
/// returns to its start still reports the full distance driven. Stops are
/// counted with [`DEFAULT_STOP_SPEED_THRESHOLD`].
pub fn summarize(samples: &[PositionSample]) -> TrackSummary {
    if samples.is_empty() {
        return TrackSummary::default();
    }

    let total_distance_km = samples
        .windows(2)
        .map(|pair| geo::distance_km(&pair[0].point, &pair[1].point))
        .sum();

    let mut max_speed: f64 = 0.0;
    let mut speed_sum = 0.0;
    let mut stop_count = 0;
    for sample in samples {
        let speed = sample.speed.unwrap_or(0.0);
        max_speed = max_speed.max(speed);
        speed_sum += speed;
        if classify_movement(sample, DEFAULT_STOP_SPEED_THRESHOLD) == MovementState::Stopped {
            stop_count += 1;
        }
    }

    TrackSummary {
        total_distance_km,
        max_speed,
        avg_speed: speed_sum / samples.len() as f64,
        stop_count,
    }
}

/// Waypoint sample for display routing: the decimated track projected to
/// bare coordinates.
pub fn waypoints(samples: &[PositionSample]) -> Vec<GeoPoint> {
    simplify(samples).into_iter().map(|s| s.point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::VehicleId;
    use chrono::{Duration, TimeZone, Utc};

    fn track(specs: &[(f64, f64, Option<f64>)]) -> Vec<PositionSample> {
        let start = Utc.with_ymd_and_hms(2026, 8, 29, 8, 0, 0).unwrap();
        specs
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon, speed))| PositionSample {
                vehicle: VehicleId::from("v1"),
                point: GeoPoint { lat, lon },
                timestamp: start + Duration::seconds(i as i64 * 30),
                speed,
            })
            .collect()
    }

    fn straight_track(len: usize) -> Vec<PositionSample> {
        let specs: Vec<_> = (0..len)
            .map(|i| (50.0 + i as f64 * 0.001, 14.0, Some(40.0)))
            .collect();
        track(&specs)
    }

    #[test]
    fn test_simplify_short_input_unchanged() {
        let samples = straight_track(19);
        let reduced = simplify(&samples);
        assert_eq!(reduced, samples);
    }

    #[test]
    fn test_simplify_empty_input() {
        assert!(simplify(&[]).is_empty());
    }

    #[test]
    fn test_simplify_preserves_endpoints() {
        for len in [20, 21, 50, 99, 100, 1000] {
            let samples = straight_track(len);
            let reduced = simplify(&samples);
            assert_eq!(reduced.first(), samples.first(), "len={}", len);
            assert_eq!(reduced.last(), samples.last(), "len={}", len);
        }
    }

    #[test]
    fn test_simplify_target_size() {
        for len in [20, 45, 100, 500, 10_000] {
            let reduced = simplify(&straight_track(len));
            assert!(
                reduced.len() <= WAYPOINT_TARGET + 1,
                "len={} reduced to {}",
                len,
                reduced.len()
            );
            assert!(reduced.len() <= len);
        }
    }

    #[test]
    fn test_simplify_exact_stride_has_no_duplicate_endpoint() {
        // 30 samples, stride 2: index 28 steps to... 0,2,..,28 then last=29
        // is appended. 31 samples, stride ceil(31/15)=3: 0,3,..,30 ends
        // exactly on the last sample, which must not be duplicated.
        let samples = straight_track(31);
        let reduced = simplify(&samples);
        let last_two: Vec<_> = reduced.iter().rev().take(2).collect();
        assert_ne!(last_two[0], last_two[1]);
    }

    #[test]
    fn test_simplify_is_idempotent_on_input() {
        let samples = straight_track(100);
        let a = simplify(&samples);
        let b = simplify(&samples);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stops_only_filters_by_threshold() {
        let samples = track(&[
            (50.0, 14.0, Some(0.0)),
            (50.001, 14.0, Some(30.0)),
            (50.002, 14.0, Some(4.9)),
            (50.003, 14.0, Some(5.0)),
        ]);
        let stops = stops_only(&samples, DEFAULT_STOP_SPEED_THRESHOLD);
        assert_eq!(stops.len(), 2);
        assert!(stops.iter().all(|p| p.movement == MovementState::Stopped));
        assert_eq!(stops[0].sample.point.lat, 50.0);
        assert_eq!(stops[1].sample.point.lat, 50.002);
    }

    #[test]
    fn test_stops_only_missing_speed_counts_as_stopped() {
        let samples = track(&[(50.0, 14.0, None), (50.001, 14.0, Some(30.0))]);
        let stops = stops_only(&samples, DEFAULT_STOP_SPEED_THRESHOLD);
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].sample.speed, None);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary, TrackSummary::default());
    }

    #[test]
    fn test_summarize_distance_is_path_not_endpoint() {
        // Out and back: endpoint distance ~0, path distance ~2x the leg.
        let samples = track(&[
            (50.0, 14.0, Some(40.0)),
            (50.01, 14.0, Some(40.0)),
            (50.0, 14.0, Some(40.0)),
        ]);
        let summary = summarize(&samples);
        let leg = geo::distance_km(&samples[0].point, &samples[1].point);
        assert!((summary.total_distance_km - 2.0 * leg).abs() < 1e-9);
        assert!(summary.total_distance_km > 2.0);
    }

    #[test]
    fn test_summarize_speeds_and_stops() {
        let samples = track(&[
            (50.0, 14.0, Some(0.0)),
            (50.001, 14.0, Some(60.0)),
            (50.002, 14.0, None),
            (50.003, 14.0, Some(20.0)),
        ]);
        let summary = summarize(&samples);
        assert_eq!(summary.max_speed, 60.0);
        assert_eq!(summary.avg_speed, 20.0); // (0 + 60 + 0 + 20) / 4
        assert_eq!(summary.stop_count, 2); // 0.0 and the absent speed
    }

    #[test]
    fn test_waypoints_projects_simplified_track() {
        let samples = straight_track(100);
        let points = waypoints(&samples);
        assert_eq!(points.len(), simplify(&samples).len());
        assert_eq!(points.first(), Some(&samples[0].point));
        assert_eq!(points.last(), Some(&samples[99].point));
    }

    #[test]
    fn test_annotate_marks_every_sample() {
        let samples = track(&[(50.0, 14.0, Some(0.0)), (50.001, 14.0, Some(30.0))]);
        let annotated = annotate(&samples, DEFAULT_STOP_SPEED_THRESHOLD);
        assert_eq!(annotated.len(), 2);
        assert_eq!(annotated[0].movement, MovementState::Stopped);
        assert_eq!(annotated[1].movement, MovementState::Moving);
    }
}
