//! Destination recommendations from trip history.
//!
//! A recommendation pass runs in three steps:
//!
//! 1. [`compute_recommendations`] clusters destinations
//!    ([`cluster_destinations`]) and ranks clusters by visit count, then by
//!    most recent visit.
//! 2. [`filter_recommendations`] drops anything visited within the recency
//!    window and anything among the last few distinct destinations
//!    ([`last_distinct_keys`]).
//! 3. [`recommend`] substitutes the configured fallback list when nothing
//!    survives the filter.
//!
//! Everything here is a pure function of the trips, `now` and the config.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clustering::{cluster_destinations, DestinationCluster};
use crate::geo_utils::{format_coordinate, format_lat_lng, round_coordinate};
use crate::{Clock, Timestamp, TripRecord};

// ============================================================================
// Types
// ============================================================================

/// A ranked destination derived from one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// `lowercase(label)|lat,lng` with rounded coordinates
    pub key: String,
    /// Most frequent label in the cluster, may be empty
    pub label: String,
    /// Centroid latitude rounded to 5 decimals
    pub lat: f64,
    /// Centroid longitude rounded to 5 decimals
    pub lng: f64,
    /// Trips assigned to the cluster (0 for fallback samples)
    pub count: u32,
    /// Most recent visit in the cluster
    pub last_visited: Option<Timestamp>,
}

impl Recommendation {
    /// Build the recommendation for a finished cluster.
    pub fn from_cluster(cluster: &DestinationCluster) -> Self {
        let label = cluster.best_label().to_string();
        let lat = round_coordinate(cluster.center.latitude);
        let lng = round_coordinate(cluster.center.longitude);
        Self {
            key: format_key(&label, lat, lng),
            label,
            lat,
            lng,
            count: saturating_count(cluster.count()),
            last_visited: cluster.last_visited(),
        }
    }

    /// Static suggestion not derived from user data.
    pub fn sample(key: &str, label: &str, lat: f64, lng: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            lat,
            lng,
            count: 0,
            last_visited: None,
        }
    }

    /// Label, or the coordinates when the cluster has no label.
    pub fn display_label(&self) -> String {
        if self.label.is_empty() {
            format_lat_lng(self.lat, self.lng)
        } else {
            self.label.clone()
        }
    }

    fn last_visited_seconds(&self) -> i64 {
        Timestamp::seconds_or_zero(self.last_visited.as_ref())
    }
}

/// Cluster size as a `u32`, pinned at `u32::MAX` for larger clusters.
fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Where a [`RecommendationSet`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    /// Ranked from the user's trip history
    History,
    /// Static fallback samples
    Fallback,
}

/// Output of a full recommendation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    pub source: RecommendationSource,
}

impl RecommendationSet {
    pub fn is_fallback(&self) -> bool {
        self.source == RecommendationSource::Fallback
    }

    /// Leading recommendations to show, capped by the limit for this source.
    pub fn displayed(&self, config: &RecommendConfig) -> &[Recommendation] {
        let limit = match self.source {
            RecommendationSource::History => config.max_recommendations,
            RecommendationSource::Fallback => config.max_fallback,
        };
        &self.recommendations[..limit.min(self.recommendations.len())]
    }
}

/// Configuration for clustering, exclusion and fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendConfig {
    /// A destination joins the first cluster whose centroid is within this distance.
    /// Default: 300.0 meters
    pub cluster_radius_meters: f64,

    /// Destinations visited this recently (inclusive) are not recommended.
    /// Default: 86400 seconds (24 hours)
    pub recency_window_secs: i64,

    /// Number of most recent distinct destinations that are never recommended.
    /// Default: 3
    pub last_distinct_count: usize,

    /// Recommendations shown when derived from history.
    /// Default: 6
    pub max_recommendations: usize,

    /// Fallback samples shown when history yields nothing.
    /// Default: 4
    pub max_fallback: usize,

    /// Returned when every history recommendation is filtered out.
    /// Default: five sample cities in Maharashtra
    pub fallback: Vec<Recommendation>,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            cluster_radius_meters: 300.0,
            recency_window_secs: 24 * 3600,
            last_distinct_count: 3,
            max_recommendations: 6,
            max_fallback: 4,
            fallback: default_fallback(),
        }
    }
}

/// Sample destinations used when there is nothing to recommend.
pub fn default_fallback() -> Vec<Recommendation> {
    vec![
        Recommendation::sample("mumbai|19.0760,72.8777", "Mumbai, Maharashtra, India", 19.0760, 72.8777),
        Recommendation::sample("pune|18.5204,73.8567", "Pune, Maharashtra, India", 18.5204, 73.8567),
        Recommendation::sample("satara|17.6805,74.0183", "Satara, Maharashtra", 17.6805, 74.0183),
        Recommendation::sample("sangli|16.8524,74.5815", "Sangli, Maharashtra", 16.8524, 74.5815),
        Recommendation::sample("kolhapur|16.7050,74.2433", "Kolhapur, Maharashtra", 16.7050, 74.2433),
    ]
}

// ============================================================================
// Keys
// ============================================================================

/// Identity key for a destination: lowercased label plus rounded coordinates.
///
/// ```
/// use destination_recommender::destination_key;
///
/// assert_eq!(destination_key("Mumbai", 19.0760, 72.8777), "mumbai|19.076,72.8777");
/// ```
pub fn destination_key(label: &str, lat: f64, lng: f64) -> String {
    format_key(label, round_coordinate(lat), round_coordinate(lng))
}

fn format_key(label: &str, lat_rounded: f64, lng_rounded: f64) -> String {
    format!(
        "{}|{},{}",
        label.to_lowercase(),
        format_coordinate(lat_rounded),
        format_coordinate(lng_rounded)
    )
}

/// Key of a raw trip. Missing coordinates key as zero, so destination-less
/// trips share the key `|0,0`.
fn trip_key(trip: &TripRecord) -> String {
    match &trip.destination {
        Some(d) => destination_key(d.trimmed_label(), d.lat.unwrap_or(0.0), d.lng.unwrap_or(0.0)),
        None => destination_key("", 0.0, 0.0),
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Cluster and rank destinations, most visited first.
///
/// Equal counts are ordered by most recent visit; exact ties keep cluster
/// creation order.
pub fn compute_recommendations(trips: &[TripRecord], config: &RecommendConfig) -> Vec<Recommendation> {
    let clusters = cluster_destinations(trips, config.cluster_radius_meters);

    let mut recs: Vec<Recommendation> = clusters.iter().map(Recommendation::from_cluster).collect();
    recs.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.last_visited_seconds().cmp(&a.last_visited_seconds()))
    });
    recs
}

// ============================================================================
// Exclusion
// ============================================================================

/// Keys of the `count` most recent distinct destinations.
///
/// Trips are walked newest first by start time (missing start times last,
/// input order on ties), keyed like recommendations, and deduplicated. The
/// result is in recency order.
pub fn last_distinct_keys(trips: &[TripRecord], count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&TripRecord> = trips.iter().collect();
    ordered.sort_by_key(|t| std::cmp::Reverse(Timestamp::seconds_or_zero(t.started_at.as_ref())));

    let mut keys: Vec<String> = Vec::with_capacity(count);
    for trip in ordered {
        let key = trip_key(trip);
        if !keys.contains(&key) {
            keys.push(key);
            if keys.len() >= count {
                break;
            }
        }
    }
    keys
}

/// Drop recommendations visited within the recency window or matching one of
/// the last distinct destinations.
///
/// `now_seconds` is read once for the whole pass.
pub fn filter_recommendations(
    recommendations: Vec<Recommendation>,
    trips: &[TripRecord],
    now_seconds: i64,
    config: &RecommendConfig,
) -> Vec<Recommendation> {
    let recent_keys: HashSet<String> =
        last_distinct_keys(trips, config.last_distinct_count).into_iter().collect();

    let before = recommendations.len();
    let kept: Vec<Recommendation> = recommendations
        .into_iter()
        .filter(|r| {
            let age = now_seconds.saturating_sub(r.last_visited_seconds());
            let is_recent = age <= config.recency_window_secs;
            let is_last_distinct = recent_keys.contains(&r.key);
            !is_recent && !is_last_distinct
        })
        .collect();

    debug!(
        "[Recommend] kept {} of {} recommendations ({} recent keys excluded)",
        kept.len(),
        before,
        recent_keys.len()
    );
    kept
}

// ============================================================================
// Entry Points
// ============================================================================

/// Full recommendation pass: rank, filter, and fall back when empty.
///
/// # Example
/// ```
/// use destination_recommender::{recommend, RecommendConfig};
///
/// let set = recommend(&[], 1_700_000_000, &RecommendConfig::default());
/// assert!(set.is_fallback());
/// assert_eq!(set.recommendations.len(), 5);
/// ```
pub fn recommend(trips: &[TripRecord], now_seconds: i64, config: &RecommendConfig) -> RecommendationSet {
    let ranked = compute_recommendations(trips, config);
    let filtered = filter_recommendations(ranked, trips, now_seconds, config);

    if filtered.is_empty() {
        RecommendationSet {
            recommendations: config.fallback.clone(),
            source: RecommendationSource::Fallback,
        }
    } else {
        RecommendationSet {
            recommendations: filtered,
            source: RecommendationSource::History,
        }
    }
}

/// Recommendation entry point bound to a clock.
#[derive(Debug, Clone, Default)]
pub struct Recommender<C: Clock> {
    clock: C,
    config: RecommendConfig,
}

impl<C: Clock> Recommender<C> {
    pub fn new(clock: C, config: RecommendConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Run [`recommend`] with the clock sampled once.
    pub fn recommend(&self, trips: &[TripRecord]) -> RecommendationSet {
        recommend(trips, self.clock.now_seconds(), &self.config)
    }
}

fn trips_by_user(trips: &[TripRecord]) -> BTreeMap<&str, Vec<TripRecord>> {
    let mut by_user: BTreeMap<&str, Vec<TripRecord>> = BTreeMap::new();
    for trip in trips {
        by_user.entry(trip.user_id.as_str()).or_default().push(trip.clone());
    }
    by_user
}

/// Recommend for every user appearing in `trips`, keyed by user id.
///
/// Each user's trips keep their relative input order.
pub fn recommend_batch(
    trips: &[TripRecord],
    now_seconds: i64,
    config: &RecommendConfig,
) -> BTreeMap<String, RecommendationSet> {
    trips_by_user(trips)
        .into_iter()
        .map(|(user, user_trips)| (user.to_string(), recommend(&user_trips, now_seconds, config)))
        .collect()
}

/// Batch recommendation using parallel processing.
///
/// Same output as [`recommend_batch`]; users are processed concurrently with
/// rayon. Recommended for large batches (100+ users).
#[cfg(feature = "parallel")]
pub fn recommend_batch_parallel(
    trips: &[TripRecord],
    now_seconds: i64,
    config: &RecommendConfig,
) -> BTreeMap<String, RecommendationSet> {
    use rayon::prelude::*;

    let groups: Vec<(&str, Vec<TripRecord>)> = trips_by_user(trips).into_iter().collect();
    groups
        .par_iter()
        .map(|(user, user_trips)| (user.to_string(), recommend(user_trips, now_seconds, config)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
