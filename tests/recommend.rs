//! End-to-end recommendation behavior over trip histories.

use destination_recommender::{
    cluster_destinations, compute_recommendations, last_distinct_keys, recommend, Destination,
    RecommendConfig, RecommendationSource, Timestamp, TripRecord,
};

const NOW: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

fn trip(id: &str, lat: f64, lng: f64, label: &str, started: i64) -> TripRecord {
    TripRecord::new(id, "user-1")
        .with_destination(Destination::new(lat, lng, label))
        .with_started_at(started)
}

/// Deterministic pseudo-random history scattered around a few hubs.
fn scattered_history(n: usize) -> Vec<TripRecord> {
    let hubs = [(19.0760, 72.8777), (18.5204, 73.8567), (16.7050, 74.2433)];
    let labels = ["Home", "Office", "", "Gym"];
    let mut seed: u64 = 42;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) as f64) / ((1u64 << 31) as f64)
    };

    (0..n)
        .map(|i| {
            let (lat, lng) = hubs[i % hubs.len()];
            let jitter_lat = (next() - 0.5) * 0.008;
            let jitter_lng = (next() - 0.5) * 0.008;
            let started = NOW - ((next() * 60.0) as i64) * DAY;
            let mut t = trip(&format!("t{i}"), lat + jitter_lat, lng + jitter_lng, labels[i % 4], started);
            if i % 3 == 0 {
                t = t.with_completed_at(started + 3600);
            }
            if i % 11 == 0 {
                t.destination = None;
            }
            t
        })
        .collect()
}

#[test]
fn test_mumbai_scenario() {
    let trips = vec![
        trip("old", 19.0760, 72.8777, "Mumbai", NOW - 11 * DAY).with_completed_at(NOW - 10 * DAY),
        trip("new", 19.0761, 72.8778, "Mumbai", NOW - 6 * DAY).with_completed_at(NOW - 5 * DAY),
    ];
    let config = RecommendConfig::default();

    let recs = compute_recommendations(&trips, &config);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].count, 2);
    assert_eq!(recs[0].label, "Mumbai");
    assert_eq!(recs[0].last_visited, Some(Timestamp::from_seconds(NOW - 5 * DAY)));
    assert_eq!(recs[0].lat, 19.07605);
    assert_eq!(recs[0].lng, 72.87775);

    // The centroid key differs from both raw trip keys, so it is not among
    // the last distinct destinations and is old enough to recommend.
    let set = recommend(&trips, NOW, &config);
    assert_eq!(set.source, RecommendationSource::History);
    assert_eq!(set.recommendations, recs);
}

#[test]
fn test_mumbai_scenario_excluded_when_key_matches_recent_trip() {
    let trips = vec![
        trip("a", 19.0760, 72.8777, "Mumbai", NOW - 11 * DAY).with_completed_at(NOW - 10 * DAY),
        trip("b", 19.0760, 72.8777, "Mumbai", NOW - 6 * DAY).with_completed_at(NOW - 5 * DAY),
    ];
    let set = recommend(&trips, NOW, &RecommendConfig::default());
    assert!(set.is_fallback());
}

#[test]
fn test_points_500m_apart() {
    let trips = vec![
        trip("a", 19.0760, 72.8777, "North", NOW - 20 * DAY),
        trip("b", 19.0715, 72.8777, "South", NOW - 20 * DAY),
    ];
    let recs = compute_recommendations(&trips, &RecommendConfig::default());
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.count == 1));
}

#[test]
fn test_last_three_distinct() {
    // Chronological: A, B, A, C
    let trips = vec![
        trip("1", 10.0, 10.0, "A", NOW - 40 * DAY),
        trip("2", 20.0, 20.0, "B", NOW - 30 * DAY),
        trip("3", 10.0, 10.0, "A", NOW - 20 * DAY),
        trip("4", 30.0, 30.0, "C", NOW - 10 * DAY),
    ];
    let mut keys = last_distinct_keys(&trips, 3);
    keys.sort();
    assert_eq!(keys, vec!["a|10,10", "b|20,20", "c|30,30"]);

    // Every cluster matches one of those keys
    assert!(recommend(&trips, NOW, &RecommendConfig::default()).is_fallback());
}

#[test]
fn test_empty_and_single() {
    let config = RecommendConfig::default();
    assert!(compute_recommendations(&[], &config).is_empty());

    let single = vec![trip("a", 1.0, 2.0, "Solo", NOW - 3 * DAY)];
    let recs = compute_recommendations(&single, &config);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].count, 1);
}

#[test]
fn test_count_conservation() {
    let trips = scattered_history(200);
    let valid = trips.iter().filter(|t| t.destination.is_some()).count();

    let recs = compute_recommendations(&trips, &RecommendConfig::default());
    let total: u32 = recs.iter().map(|r| r.count).sum();
    assert_eq!(total as usize, valid);
}

#[test]
fn test_label_majority_property() {
    let trips = scattered_history(120);
    let clusters = cluster_destinations(&trips, 300.0);

    for cluster in &clusters {
        let best = cluster.best_label();
        let count_of = |label: &str| cluster.items.iter().filter(|i| i.label == label).count();
        if best.is_empty() {
            assert!(cluster.items.iter().all(|i| i.label.is_empty()));
        } else {
            let best_count = count_of(best);
            for item in cluster.items.iter().filter(|i| !i.label.is_empty()) {
                assert!(count_of(item.label.as_str()) <= best_count);
            }
        }
    }
}

#[test]
fn test_membership_rule_holds() {
    // Replaying the pass: each point belongs to the first cluster within
    // radius of the centroid at the time it was processed.
    let trips = scattered_history(150);
    let clusters = cluster_destinations(&trips, 300.0);

    let mut centers: Vec<(f64, f64, usize)> = Vec::new();
    let mut expected: Vec<usize> = Vec::new();
    for t in trips.iter().filter(|t| t.destination.is_some()) {
        let p = t.destination.as_ref().and_then(|d| d.point()).unwrap();
        let hit = centers.iter().position(|&(lat, lng, _)| {
            destination_recommender::geo_utils::haversine_distance(
                &p,
                &destination_recommender::GpsPoint::new(lat, lng),
            ) <= 300.0
        });
        match hit {
            Some(i) => {
                let (lat, lng, n) = centers[i];
                let m = (n + 1) as f64;
                centers[i] = ((lat * (m - 1.0) + p.latitude) / m, (lng * (m - 1.0) + p.longitude) / m, n + 1);
                expected.push(i);
            }
            None => {
                centers.push((p.latitude, p.longitude, 1));
                expected.push(centers.len() - 1);
            }
        }
    }

    assert_eq!(clusters.len(), centers.len());
    for (i, cluster) in clusters.iter().enumerate() {
        assert_eq!(cluster.count(), expected.iter().filter(|&&c| c == i).count());
    }
}

#[test]
fn test_recency_exclusion_property() {
    let trips = scattered_history(200);
    let config = RecommendConfig { last_distinct_count: 0, ..RecommendConfig::default() };
    let set = recommend(&trips, NOW, &config);

    assert_eq!(set.source, RecommendationSource::History);
    assert!(!set.recommendations.is_empty());
    for rec in &set.recommendations {
        let last = Timestamp::seconds_or_zero(rec.last_visited.as_ref());
        assert!(NOW - last > config.recency_window_secs);
    }
}

#[test]
fn test_determinism() {
    let trips = scattered_history(180);
    let config = RecommendConfig::default();
    let first = recommend(&trips, NOW, &config);
    for _ in 0..5 {
        assert_eq!(recommend(&trips, NOW, &config), first);
    }
}

#[test]
fn test_serialized_shape() {
    let recs = compute_recommendations(
        &[trip("a", 19.0760, 72.8777, "Mumbai", NOW - 3 * DAY)],
        &RecommendConfig::default(),
    );
    let json = serde_json::to_value(&recs[0]).unwrap();
    assert_eq!(json["key"], "mumbai|19.076,72.8777");
    assert_eq!(json["count"], 1);
    assert_eq!(json["lastVisited"]["seconds"], NOW - 3 * DAY);
}
