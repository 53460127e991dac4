//! Inspection due-date classification.
//!
//! Maps a vehicle's regulatory inspection deadline to one of four urgency
//! tiers. Comparison happens at day granularity: both sides are reduced to
//! calendar dates first, so time-of-day components can never shift a
//! deadline across a tier boundary.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Length of the "upcoming" warning window, inclusive of both ends.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

/// Urgency tier for an inspection due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    /// No due date on record.
    Missing,
    /// Due date is strictly before today.
    Expired,
    /// Due date falls within `[today, today + 30 days]`.
    Upcoming,
    /// Due date is more than 30 days out.
    Normal,
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Expired => write!(f, "expired"),
            Self::Upcoming => write!(f, "upcoming"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

/// Classify an inspection due date against `today`.
///
/// Pure and idempotent: the same inputs always yield the same tier.
pub fn classify(due: Option<NaiveDate>, today: NaiveDate) -> InspectionStatus {
    let Some(due) = due else {
        return InspectionStatus::Missing;
    };

    if due < today {
        return InspectionStatus::Expired;
    }

    let days_until = (due - today).num_days();
    if days_until <= UPCOMING_WINDOW_DAYS {
        InspectionStatus::Upcoming
    } else {
        InspectionStatus::Normal
    }
}

/// Classify a timestamped due date from the fleet registry.
///
/// Both the due stamp and `now` are reduced to their date parts in the
/// given timezone before comparison.
pub fn classify_datetime<Tz: TimeZone>(
    due: Option<DateTime<Tz>>,
    now: DateTime<Tz>,
) -> InspectionStatus {
    classify(due.map(|d| d.date_naive()), now.date_naive())
}

/// Classify against the current UTC date.
pub fn classify_now(due: Option<NaiveDate>) -> InspectionStatus {
    classify(due, Utc::now().date_naive())
}
