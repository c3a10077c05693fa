//! Trip history views: dedupe, status filter and newest-first ordering.
//!
//! The store can hold near-duplicate trips when a start is logged twice in
//! quick succession. [`dedupe_trips`] collapses trips to the same destination
//! started within the same two-minute bucket.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo_utils::{format_lat_lng, round_coordinate};
use crate::{Timestamp, TripRecord, TripStatus};

/// Width of the start-time bucket used by [`dedupe_trips`].
pub const DEDUPE_BUCKET_SECS: i64 = 120;

/// Which trips a history view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Active status, or no completion time yet
    Active,
    Completed,
    Cancelled,
}

impl StatusFilter {
    pub fn matches(&self, trip: &TripRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => trip.status == TripStatus::Active || trip.completed_at.is_none(),
            StatusFilter::Completed => trip.status == TripStatus::Completed,
            StatusFilter::Cancelled => trip.status == TripStatus::Cancelled,
        }
    }
}

fn dedupe_key(trip: &TripRecord) -> (String, u64, u64, i64) {
    let (label, lat, lng) = match &trip.destination {
        Some(d) => (
            d.trimmed_label().to_lowercase(),
            d.lat.unwrap_or(0.0),
            d.lng.unwrap_or(0.0),
        ),
        None => (String::new(), 0.0, 0.0),
    };
    let started = Timestamp::seconds_or_zero(trip.started_at.as_ref());
    (
        label,
        round_coordinate(lat).to_bits(),
        round_coordinate(lng).to_bits(),
        started.div_euclid(DEDUPE_BUCKET_SECS),
    )
}

/// Keep the first trip for each destination and two-minute start bucket.
///
/// Input order is preserved.
pub fn dedupe_trips(trips: &[TripRecord]) -> Vec<&TripRecord> {
    let mut seen = HashSet::new();
    trips.iter().filter(|t| seen.insert(dedupe_key(t))).collect()
}

/// Deduped trips matching `filter`, newest start first.
pub fn trip_history(trips: &[TripRecord], filter: StatusFilter) -> Vec<&TripRecord> {
    let mut out: Vec<&TripRecord> = dedupe_trips(trips)
        .into_iter()
        .filter(|t| filter.matches(t))
        .collect();
    out.sort_by_key(|t| std::cmp::Reverse(Timestamp::seconds_or_zero(t.started_at.as_ref())));
    out
}

/// Destination text for a history row.
pub fn destination_display(trip: &TripRecord) -> String {
    match &trip.destination {
        Some(d) => match (&d.label, d.lat, d.lng) {
            (Some(label), _, _) => label.clone(),
            (None, Some(lat), Some(lng)) => format_lat_lng(lat, lng),
            _ => "--".to_string(),
        },
        None => "--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Destination;

    fn trip(id: &str, label: &str, started: i64) -> TripRecord {
        TripRecord::new(id, "user-1")
            .with_destination(Destination::new(19.0760, 72.8777, label))
            .with_started_at(started)
    }

    #[test]
    fn test_dedupe_same_bucket() {
        // 1_000_080 and 1_000_100 share the bucket starting at 1_000_080
        let trips = vec![
            trip("a", "Mumbai", 1_000_080),
            trip("b", " mumbai ", 1_000_100),
            trip("c", "Mumbai", 1_000_200),
        ];
        let ids: Vec<&str> = dedupe_trips(&trips).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_dedupe_distinguishes_destinations() {
        let mut other = trip("b", "Mumbai", 1_000_080);
        other.destination = Some(Destination::new(18.5204, 73.8567, "Mumbai"));
        let trips = vec![trip("a", "Mumbai", 1_000_080), other];
        assert_eq!(dedupe_trips(&trips).len(), 2);
    }

    #[test]
    fn test_status_filter() {
        let active = trip("a", "x", 1);
        let completed = trip("b", "x", 200).with_completed_at(300);
        let cancelled = trip("c", "x", 400).with_status(TripStatus::Cancelled);

        assert!(StatusFilter::Active.matches(&active));
        assert!(!StatusFilter::Active.matches(&completed));
        // Cancelled without a completion time still counts as active
        assert!(StatusFilter::Active.matches(&cancelled));
        assert!(StatusFilter::Completed.matches(&completed));
        assert!(StatusFilter::Cancelled.matches(&cancelled));
        assert!(StatusFilter::All.matches(&cancelled));
    }

    #[test]
    fn test_trip_history_newest_first() {
        let trips = vec![
            trip("a", "x", 1_000),
            trip("b", "y", 5_000).with_completed_at(6_000),
            trip("c", "z", 3_000),
        ];
        let ids: Vec<&str> = trip_history(&trips, StatusFilter::All)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let active: Vec<&str> = trip_history(&trips, StatusFilter::Active)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(active, vec!["c", "a"]);
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(destination_display(&trip("a", "Pune", 0)), "Pune");

        let unlabeled = TripRecord::new("b", "u").with_destination(Destination::unlabeled(18.5204, 73.8567));
        assert_eq!(destination_display(&unlabeled), "18.5204, 73.8567");

        assert_eq!(destination_display(&TripRecord::new("c", "u")), "--");
    }
}
