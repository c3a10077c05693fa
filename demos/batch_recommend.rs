//! Recommend for many users at once using rayon.
//!
//! Run with: cargo run --release --example batch_recommend --features parallel

use std::time::Instant;

use destination_recommender::{
    recommend_batch, recommend_batch_parallel, Destination, RecommendConfig, TripRecord,
};

fn main() {
    let now = 1_700_000_000;
    let day = 86_400;

    let trips: Vec<TripRecord> = (0..50_000)
        .map(|i| {
            let hub = (i % 17) as f64;
            TripRecord::new(format!("trip-{i}"), format!("user-{}", i % 500))
                .with_destination(Destination::new(
                    18.0 + hub * 0.05 + (i % 7) as f64 * 0.0003,
                    73.0 + hub * 0.05,
                    format!("Spot {}", i % 17),
                ))
                .with_started_at(now - (i % 90) as i64 * day)
        })
        .collect();

    let config = RecommendConfig::default();

    let t = Instant::now();
    let sequential = recommend_batch(&trips, now, &config);
    println!("Sequential: {} users in {:?}", sequential.len(), t.elapsed());

    let t = Instant::now();
    let parallel = recommend_batch_parallel(&trips, now, &config);
    println!("Parallel:   {} users in {:?}", parallel.len(), t.elapsed());

    assert_eq!(sequential, parallel);
    let fallback = parallel.values().filter(|s| s.is_fallback()).count();
    println!("{} users fell back to sample destinations", fallback);
}
