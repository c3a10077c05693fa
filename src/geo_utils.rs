//! # Geographic Utilities
//!
//! Distance and coordinate helpers used by destination clustering and keying.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`round_coordinate`] | Round a coordinate to [`KEY_DECIMALS`] decimal places |
//! | [`format_coordinate`] | Shortest decimal rendering used inside destination keys |
//! | [`format_lat_lng`] | `"lat, lng"` rendering with four decimals for display |
//!
//! ## Example
//!
//! ```rust
//! use destination_recommender::{GpsPoint, geo_utils};
//!
//! let gateway = GpsPoint::new(18.9220, 72.8347);
//! let colaba = GpsPoint::new(18.9067, 72.8147);
//!
//! let dist = geo_utils::haversine_distance(&gateway, &colaba);
//! println!("Gateway to Colaba: {:.0}m", dist);
//!
//! assert_eq!(geo_utils::round_coordinate(19.076_012_3), 19.07601);
//! ```
//!
//! ## Algorithm Notes
//!
//! The haversine formula assumes a spherical Earth of radius
//! [`EARTH_RADIUS_METERS`]. The clustering radius is compared directly against
//! its output, so the radius constant is fixed rather than taken from a
//! geodesy crate whose mean radius may differ.

use crate::GpsPoint;

/// Earth radius used by [`haversine_distance`], in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Decimal places kept when rounding coordinates for keys and display (~1.1 m).
pub const KEY_DECIMALS: i32 = 5;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use destination_recommender::{GpsPoint, geo_utils};
///
/// let first_visit = GpsPoint::new(19.0760, 72.8777);
/// let second_visit = GpsPoint::new(19.0761, 72.8778);
///
/// // Two taps on the same landmark, well inside one cluster
/// let distance = geo_utils::haversine_distance(&first_visit, &second_visit);
/// assert!((distance - 15.3).abs() < 0.1);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

// =============================================================================
// Rounding & Formatting
// =============================================================================

/// Round a coordinate to [`KEY_DECIMALS`] decimal places.
///
/// Halves round toward positive infinity and negative zero is normalised to
/// zero, so keys built from the result are stable for values on either side
/// of the prime meridian or equator.
///
/// ```rust
/// use destination_recommender::geo_utils::round_coordinate;
///
/// assert_eq!(round_coordinate(72.877_749), 72.87775);
/// assert_eq!(round_coordinate(-0.000_001), 0.0);
/// ```
#[inline]
pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(KEY_DECIMALS);
    // + 0.0 turns -0.0 into 0.0
    (value * scale + 0.5).floor() / scale + 0.0
}

/// Render a rounded coordinate the way it appears inside a destination key.
///
/// Uses the shortest decimal representation (`19.076`, not `19.07600`).
#[inline]
pub fn format_coordinate(value: f64) -> String {
    format!("{}", value)
}

/// Render a coordinate pair for display, four decimals each.
pub fn format_lat_lng(lat: f64, lng: f64) -> String {
    format!("{:.4}, {:.4}", lat, lng)
}

// =============================================================================
// Unit Tests
// =============================================================================
