//! Unified error type for trip-log operations and trip ingestion.
//!
//! Clustering and ranking never fail; errors only come from mutating the trip
//! log or decoding trip documents.

use thiserror::Error;

/// Errors surfaced by the trip log and JSON ingestion.
#[derive(Debug, Error)]
pub enum TripError {
    /// No trip with this identifier exists in the log.
    #[error("trip {trip_id} not found")]
    NotFound { trip_id: String },

    /// The trip already reached its terminal `completed` state.
    #[error("trip {trip_id} was already completed at {completed_at}s")]
    AlreadyCompleted { trip_id: String, completed_at: i64 },

    /// A trip snapshot could not be decoded.
    #[error("malformed trip document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TripError>;
