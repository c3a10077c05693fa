//! Greedy spatial clustering of trip destinations.
//!
//! Points are visited once, in input order. Each point joins the **first**
//! existing cluster (in creation order) whose current centroid lies within the
//! radius, not the nearest one. The result depends on input order and is not
//! an optimal partition; downstream keys and counts rely on that exact
//! behavior, so it must not be replaced with nearest-centroid or k-means
//! assignment.
//!
//! Centroids are per-axis running means of latitude and longitude. This is a
//! flat-plane approximation that is fine at sub-kilometer radii but drifts for
//! clusters spanning large areas or the antimeridian.
//!
//! ```rust
//! use destination_recommender::{cluster_destinations, Destination, TripRecord};
//!
//! let trips = vec![
//!     TripRecord::new("a", "u").with_destination(Destination::new(19.0760, 72.8777, "Mumbai")),
//!     TripRecord::new("b", "u").with_destination(Destination::new(19.0761, 72.8778, "Mumbai")),
//!     TripRecord::new("c", "u").with_destination(Destination::new(18.5204, 73.8567, "Pune")),
//! ];
//!
//! let clusters = cluster_destinations(&trips, 300.0);
//! assert_eq!(clusters.len(), 2);
//! assert_eq!(clusters[0].count(), 2);
//! ```

use log::debug;

use crate::geo_utils::haversine_distance;
use crate::{GpsPoint, Timestamp, TripRecord};

/// A trip destination assigned to a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterItem {
    pub trip_id: String,
    pub point: GpsPoint,
    /// Trimmed label, empty when the trip had none
    pub label: String,
    /// Completion time, else start time
    pub visited: Option<Timestamp>,
}

impl ClusterItem {
    /// Project a trip onto a cluster item; `None` when either coordinate is missing.
    pub fn from_trip(trip: &TripRecord) -> Option<Self> {
        let destination = trip.destination.as_ref()?;
        let point = destination.point()?;
        Some(Self {
            trip_id: trip.id.clone(),
            point,
            label: destination.trimmed_label().to_string(),
            visited: trip.visited_at(),
        })
    }
}

/// A group of nearby destinations with a running centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationCluster {
    /// Mean latitude/longitude of all items
    pub center: GpsPoint,
    /// Items in assignment order
    pub items: Vec<ClusterItem>,
}

impl DestinationCluster {
    /// Singleton cluster centered exactly on the item.
    fn new(item: ClusterItem) -> Self {
        Self {
            center: item.point,
            items: vec![item],
        }
    }

    /// Append an item and fold it into the running mean.
    fn push(&mut self, item: ClusterItem) {
        let n = (self.items.len() + 1) as f64;
        self.center = GpsPoint::new(
            (self.center.latitude * (n - 1.0) + item.point.latitude) / n,
            (self.center.longitude * (n - 1.0) + item.point.longitude) / n,
        );
        self.items.push(item);
    }

    /// Number of trips assigned to this cluster.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Most frequent non-empty label. Ties go to the label seen first.
    /// Empty when no item carries a label.
    pub fn best_label(&self) -> &str {
        let mut tally: Vec<(&str, usize)> = Vec::new();
        for item in &self.items {
            if item.label.is_empty() {
                continue;
            }
            match tally.iter_mut().find(|(label, _)| *label == item.label) {
                Some((_, count)) => *count += 1,
                None => tally.push((item.label.as_str(), 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (label, count) in tally {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        best.map_or("", |(label, _)| label)
    }

    /// Most recent visit among the items, compared by whole seconds.
    ///
    /// Missing timestamps count as the epoch; on equal seconds the earlier
    /// item wins.
    pub fn last_visited(&self) -> Option<Timestamp> {
        let mut iter = self.items.iter();
        let first = iter.next()?.visited;
        iter.fold(first, |acc, item| {
            let s = Timestamp::seconds_or_zero(item.visited.as_ref());
            let a = Timestamp::seconds_or_zero(acc.as_ref());
            if s > a {
                item.visited
            } else {
                acc
            }
        })
    }
}

/// Cluster trip destinations with a single greedy pass.
///
/// Trips whose destination lacks a latitude or longitude are skipped. Each
/// remaining destination joins the first cluster whose centroid is within
/// `radius_meters` (inclusive), or starts a new cluster at its own position.
/// Clusters are returned in creation order.
pub fn cluster_destinations(trips: &[TripRecord], radius_meters: f64) -> Vec<DestinationCluster> {
    let mut clusters: Vec<DestinationCluster> = Vec::new();
    let mut skipped = 0usize;

    for trip in trips {
        let Some(item) = ClusterItem::from_trip(trip) else {
            skipped += 1;
            continue;
        };

        let target = clusters
            .iter_mut()
            .find(|c| haversine_distance(&item.point, &c.center) <= radius_meters);

        match target {
            Some(cluster) => cluster.push(item),
            None => clusters.push(DestinationCluster::new(item)),
        }
    }

    debug!(
        "[Clustering] {} trips -> {} clusters ({} without coordinates, radius {}m)",
        trips.len(),
        clusters.len(),
        skipped,
        radius_meters
    );

    clusters
}
