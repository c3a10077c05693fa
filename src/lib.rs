//! # Destination Recommender
//!
//! Trip-history clustering and destination recommendations for group travel.
//!
//! This library provides:
//! - Greedy spatial clustering of past trip destinations
//! - Frequency/recency ranking of the resulting clusters
//! - Exclusion of destinations visited in the last day or among the last few
//!   distinct destinations, with a static fallback list
//! - An in-memory trip log with live per-user subscriptions
//! - Trip history dedupe, filtering and ordering
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch recommendation with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use destination_recommender::{recommend, Destination, RecommendConfig, TripRecord};
//!
//! let day = 86_400;
//! let now = 1_700_000_000;
//!
//! let trips = vec![
//!     TripRecord::new("t1", "user-1")
//!         .with_destination(Destination::new(19.0760, 72.8777, "Mumbai"))
//!         .with_started_at(now - 30 * day),
//!     TripRecord::new("t2", "user-1")
//!         .with_destination(Destination::new(19.0761, 72.8778, "Mumbai"))
//!         .with_started_at(now - 20 * day),
//! ];
//!
//! let set = recommend(&trips, now, &RecommendConfig::default());
//! for rec in set.displayed(&RecommendConfig::default()) {
//!     println!("{} ({} visits)", rec.display_label(), rec.count);
//! }
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TripError};

// Distance, rounding and formatting helpers
pub mod geo_utils;

// Wall-clock source
pub mod clock;
pub use clock::{Clock, FixedClock, SystemClock};

// Greedy destination clustering
pub mod clustering;
pub use clustering::{cluster_destinations, ClusterItem, DestinationCluster};

// Ranking, exclusion filters and fallback
pub mod recommend;
pub use recommend::{
    compute_recommendations, destination_key, filter_recommendations, last_distinct_keys,
    recommend, recommend_batch, RecommendConfig, Recommendation, RecommendationSet,
    RecommendationSource, Recommender,
};
#[cfg(feature = "parallel")]
pub use recommend::recommend_batch_parallel;

// Trip history views
pub mod history;
pub use history::{dedupe_trips, destination_display, trip_history, StatusFilter};

// Trip log collaborator
pub mod store;
pub use store::{MemoryTripLog, SubscriptionId, TripListener, TripLog};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use destination_recommender::GpsPoint;
/// let point = GpsPoint::new(19.0760, 72.8777); // Mumbai
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A document-store timestamp.
///
/// Only `seconds` participates in comparisons; `nanoseconds` is carried so
/// records round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanoseconds: i32,
}

impl Timestamp {
    /// Timestamp at a whole number of seconds since the Unix epoch.
    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanoseconds: 0 }
    }

    /// Seconds of an optional timestamp; absent timestamps count as the epoch.
    #[inline]
    pub fn seconds_or_zero(ts: Option<&Timestamp>) -> i64 {
        ts.map_or(0, |t| t.seconds)
    }
}

/// Trip destination as stored on a trip record.
///
/// Coordinates are optional because partially written records exist in the
/// store; such destinations are skipped by clustering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Destination {
    /// Fully specified destination with a label.
    pub fn new(lat: f64, lng: f64, label: impl Into<String>) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            label: Some(label.into()),
        }
    }

    /// Fully specified destination without a label.
    pub fn unlabeled(lat: f64, lng: f64) -> Self {
        Self { lat: Some(lat), lng: Some(lng), label: None }
    }

    /// Both coordinates, if present.
    pub fn point(&self) -> Option<GpsPoint> {
        Some(GpsPoint::new(self.lat?, self.lng?))
    }

    /// Label with surrounding whitespace removed; empty when absent.
    pub fn trimmed_label(&self) -> &str {
        self.label.as_deref().map_or("", str::trim)
    }
}

/// Lifecycle state of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// One attempted or completed journey.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: String,
    /// Owner of the trip
    pub user_id: String,
    /// Group the trip was started from, if any
    #[serde(default)]
    pub group_id: Option<String>,
    /// Destination, immutable once the record exists
    #[serde(default)]
    pub destination: Option<Destination>,
    /// Set by the store when the trip is logged
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    /// Set at most once, never earlier than `started_at`
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TripRecord {
    /// Active trip with no destination or timestamps.
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_started_at(mut self, seconds: i64) -> Self {
        self.started_at = Some(Timestamp::from_seconds(seconds));
        self
    }

    /// Mark completed at `seconds`.
    pub fn with_completed_at(mut self, seconds: i64) -> Self {
        self.completed_at = Some(Timestamp::from_seconds(seconds));
        self.status = TripStatus::Completed;
        self
    }

    pub fn with_status(mut self, status: TripStatus) -> Self {
        self.status = status;
        self
    }

    /// When the destination was visited: completion time, else start time.
    pub fn visited_at(&self) -> Option<Timestamp> {
        self.completed_at.or(self.started_at)
    }
}

/// Parse a trip snapshot (a JSON array of trip documents).
///
/// # Example
/// ```
/// use destination_recommender::parse_trips;
///
/// let json = r#"[{"id": "a", "userId": "u1",
///                 "destination": {"lat": 19.076, "lng": 72.8777, "label": "Mumbai"},
///                 "startedAt": {"seconds": 1700000000, "nanoseconds": 0},
///                 "status": "active"}]"#;
/// let trips = parse_trips(json).unwrap();
/// assert_eq!(trips[0].user_id, "u1");
/// ```
pub fn parse_trips(json: &str) -> Result<Vec<TripRecord>> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_point_requires_both_coordinates() {
        assert!(Destination::new(19.0, 72.0, "x").point().is_some());
        let partial = Destination { lat: Some(19.0), lng: None, label: None };
        assert!(partial.point().is_none());
    }

    #[test]
    fn test_trimmed_label() {
        let d = Destination::new(1.0, 2.0, "  Pune  ");
        assert_eq!(d.trimmed_label(), "Pune");
        assert_eq!(Destination::unlabeled(1.0, 2.0).trimmed_label(), "");
    }

    #[test]
    fn test_visited_prefers_completion() {
        let t = TripRecord::new("a", "u").with_started_at(100);
        assert_eq!(t.visited_at(), Some(Timestamp::from_seconds(100)));

        let t = t.with_completed_at(250);
        assert_eq!(t.visited_at(), Some(Timestamp::from_seconds(250)));
        assert_eq!(t.status, TripStatus::Completed);
    }

    #[test]
    fn test_seconds_or_zero() {
        assert_eq!(Timestamp::seconds_or_zero(None), 0);
        assert_eq!(Timestamp::seconds_or_zero(Some(&Timestamp::from_seconds(42))), 42);
    }

    #[test]
    fn test_parse_trips_defaults() {
        let json = r#"[
            {"id": "a", "userId": "u1"},
            {"id": "b", "userId": "u1", "groupId": "g1",
             "destination": {"lat": 18.5204, "lng": 73.8567},
             "startedAt": {"seconds": 10},
             "completedAt": {"seconds": 20, "nanoseconds": 5},
             "status": "completed", "notes": "rainy"}
        ]"#;
        let trips = parse_trips(json).unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].status, TripStatus::Active);
        assert!(trips[0].destination.is_none());

        assert_eq!(trips[1].group_id.as_deref(), Some("g1"));
        assert_eq!(trips[1].completed_at.unwrap().nanoseconds, 5);
        assert_eq!(trips[1].status, TripStatus::Completed);
        assert_eq!(trips[1].notes.as_deref(), Some("rainy"));
    }

    #[test]
    fn test_parse_trips_rejects_malformed() {
        assert!(matches!(parse_trips("{not json"), Err(TripError::Json(_))));
    }
}
