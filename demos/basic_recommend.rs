//! Log a few trips and print destination recommendations.
//!
//! Run with: cargo run --example basic_recommend

use destination_recommender::{
    recommend, trip_history, destination_display, Destination, FixedClock, MemoryTripLog,
    RecommendConfig, StatusFilter, TripLog,
};

fn main() {
    let day = 86_400;
    let start = 1_700_000_000;
    let clock = std::sync::Arc::new(FixedClock::new(start));
    let log = MemoryTripLog::with_clock(std::sync::Arc::clone(&clock));

    let itinerary = [
        (19.0760, 72.8777, "Gateway of India"),
        (19.0761, 72.8778, "Gateway of India"),
        (18.5204, 73.8567, "Shaniwar Wada"),
        (19.0759, 72.8776, "Gateway"),
        (17.6805, 74.0183, "Kaas Plateau"),
        (16.7050, 74.2433, "Rankala Lake"),
        (16.8524, 74.5815, "Ganapati Temple"),
    ];

    for (lat, lng, label) in itinerary {
        let id = log
            .log_trip_start("demo-user", None, Some(Destination::new(lat, lng, label)))
            .expect("log trip start");
        clock.advance(3 * 3600);
        log.log_trip_complete(&id).expect("complete trip");
        clock.advance(7 * day);
    }

    let trips = log.list_user_trips("demo-user");

    println!("Trip history\n");
    for trip in trip_history(&trips, StatusFilter::All) {
        println!("   {:<20} {:?}", destination_display(trip), trip.status);
    }

    let config = RecommendConfig::default();
    let now = start + 60 * day;
    let set = recommend(&trips, now, &config);

    println!("\nRecommendations ({:?})\n", set.source);
    for rec in set.displayed(&config) {
        println!("   {:<20} {} visits  [{}]", rec.display_label(), rec.count, rec.key);
    }
}
