//! Trip log: append-only trip records with live per-user subscriptions.
//!
//! [`TripLog`] is the collaborator the recommender reads trips from.
//! [`MemoryTripLog`] keeps records in process and pushes the user's full trip
//! list to subscribers whenever one of that user's trips changes.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use destination_recommender::{Destination, FixedClock, MemoryTripLog, TripLog, TripRecord};
//!
//! let log = MemoryTripLog::with_clock(FixedClock::new(1_700_000_000));
//! let seen = Arc::new(Mutex::new(0usize));
//!
//! let counter = Arc::clone(&seen);
//! log.subscribe_user_trips("user-1", Arc::new(move |trips: &[TripRecord]| {
//!     *counter.lock().unwrap() = trips.len();
//! }));
//!
//! let id = log.log_trip_start("user-1", None, Some(Destination::new(19.076, 72.8777, "Mumbai"))).unwrap();
//! log.log_trip_complete(&id).unwrap();
//! assert_eq!(*seen.lock().unwrap(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::{Clock, Destination, Result, SystemClock, Timestamp, TripError, TripRecord, TripStatus};

/// Callback receiving a user's complete trip list.
pub type TripListener = Arc<dyn Fn(&[TripRecord]) + Send + Sync>;

/// Handle returned by [`TripLog::subscribe_user_trips`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Storage and live updates for trip records.
pub trait TripLog {
    /// Record the start of a trip. Returns the new trip id.
    fn log_trip_start(
        &self,
        user_id: &str,
        group_id: Option<&str>,
        destination: Option<Destination>,
    ) -> Result<String>;

    /// Mark a trip completed. Completion is terminal.
    fn log_trip_complete(&self, trip_id: &str) -> Result<()>;

    /// Set or replace the notes on a trip.
    fn upsert_trip_note(&self, trip_id: &str, notes: &str) -> Result<()>;

    /// All trips owned by `user_id`, in the order they were logged.
    fn list_user_trips(&self, user_id: &str) -> Vec<TripRecord>;

    /// Call `listener` with the user's trips now and after every change to them.
    fn subscribe_user_trips(&self, user_id: &str, listener: TripListener) -> SubscriptionId;

    /// Stop a subscription. Returns `false` if it was not active.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct Subscriber {
    id: SubscriptionId,
    user_id: String,
    listener: TripListener,
}

#[derive(Default)]
struct Inner {
    trips: Vec<TripRecord>,
    index: HashMap<String, usize>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl Inner {
    fn user_trips(&self, user_id: &str) -> Vec<TripRecord> {
        self.trips.iter().filter(|t| t.user_id == user_id).cloned().collect()
    }

    fn get_mut(&mut self, trip_id: &str) -> Result<&mut TripRecord> {
        let idx = *self
            .index
            .get(trip_id)
            .ok_or_else(|| TripError::NotFound { trip_id: trip_id.to_string() })?;
        Ok(&mut self.trips[idx])
    }

    /// Snapshot and listeners for `user_id`, taken under the lock.
    fn pending_notification(&self, user_id: &str) -> Option<(Vec<TripRecord>, Vec<TripListener>)> {
        let listeners: Vec<TripListener> = self
            .subscribers
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| Arc::clone(&s.listener))
            .collect();
        if listeners.is_empty() {
            return None;
        }
        Some((self.user_trips(user_id), listeners))
    }
}

/// In-process [`TripLog`].
///
/// Listeners are invoked after the internal lock is released, so they may
/// call back into the log.
pub struct MemoryTripLog<C: Clock = SystemClock> {
    clock: C,
    inner: Mutex<Inner>,
}

impl MemoryTripLog<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryTripLog<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryTripLog<C> {
    /// Log stamping records with `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Number of trips across all users.
    pub fn len(&self) -> usize {
        self.lock().trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().trips.is_empty()
    }

    /// Trip by id.
    pub fn get(&self, trip_id: &str) -> Option<TripRecord> {
        let inner = self.lock();
        inner.index.get(trip_id).map(|&idx| inner.trips[idx].clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `mutate` to a trip, then notify the owner's subscribers.
    fn update<F>(&self, trip_id: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut TripRecord) -> Result<()>,
    {
        let pending = {
            let mut inner = self.lock();
            let trip = inner.get_mut(trip_id)?;
            mutate(trip)?;
            let user_id = trip.user_id.clone();
            inner.pending_notification(&user_id)
        };
        notify(pending);
        Ok(())
    }
}

fn notify(pending: Option<(Vec<TripRecord>, Vec<TripListener>)>) {
    if let Some((trips, listeners)) = pending {
        debug!("[TripLog] pushing {} trips to {} listeners", trips.len(), listeners.len());
        for listener in listeners {
            listener(&trips);
        }
    }
}

impl<C: Clock> TripLog for MemoryTripLog<C> {
    fn log_trip_start(
        &self,
        user_id: &str,
        group_id: Option<&str>,
        destination: Option<Destination>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let record = TripRecord {
            id: id.clone(),
            user_id: user_id.to_string(),
            group_id: group_id.map(str::to_string),
            destination,
            started_at: Some(Timestamp::from_seconds(self.clock.now_seconds())),
            completed_at: None,
            status: TripStatus::Active,
            notes: None,
        };

        let pending = {
            let mut inner = self.lock();
            let idx = inner.trips.len();
            inner.trips.push(record);
            inner.index.insert(id.clone(), idx);
            inner.pending_notification(user_id)
        };

        info!("[TripLog] started trip {} for user {}", id, user_id);
        notify(pending);
        Ok(id)
    }

    fn log_trip_complete(&self, trip_id: &str) -> Result<()> {
        let now = self.clock.now_seconds();
        let result = self.update(trip_id, |trip| {
            if let (TripStatus::Completed, Some(done)) = (trip.status, trip.completed_at) {
                return Err(TripError::AlreadyCompleted {
                    trip_id: trip.id.clone(),
                    completed_at: done.seconds,
                });
            }
            let started = Timestamp::seconds_or_zero(trip.started_at.as_ref());
            trip.completed_at = Some(Timestamp::from_seconds(now.max(started)));
            trip.status = TripStatus::Completed;
            Ok(())
        });

        match &result {
            Ok(()) => info!("[TripLog] completed trip {}", trip_id),
            Err(e) => warn!("[TripLog] could not complete trip: {}", e),
        }
        result
    }

    fn upsert_trip_note(&self, trip_id: &str, notes: &str) -> Result<()> {
        let result = self.update(trip_id, |trip| {
            trip.notes = Some(notes.to_string());
            Ok(())
        });
        if let Err(e) = &result {
            warn!("[TripLog] could not update notes: {}", e);
        }
        result
    }

    fn list_user_trips(&self, user_id: &str) -> Vec<TripRecord> {
        self.lock().user_trips(user_id)
    }

    fn subscribe_user_trips(&self, user_id: &str, listener: TripListener) -> SubscriptionId {
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = SubscriptionId(inner.next_subscription);
            inner.next_subscription += 1;
            inner.subscribers.push(Subscriber {
                id,
                user_id: user_id.to_string(),
                listener: Arc::clone(&listener),
            });
            (id, inner.user_trips(user_id))
        };

        debug!("[TripLog] subscription {:?} for user {}", id, user_id);
        listener(&snapshot);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        inner.subscribers.len() != before
    }
}
