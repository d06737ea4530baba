//! Session Entry
//!
//! Payload and freshness kept in one record so they can never drift apart.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Untyped session data, keyed by field name.
pub type Payload = HashMap<String, Value>;

/// Entry in the store with payload and last-touched time
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) payload: Payload,
    pub(crate) touched_at: Instant,
}

impl Entry {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            payload: Payload::new(),
            touched_at: now,
        }
    }

    /// Replace the payload wholesale and refresh the timestamp
    pub(crate) fn replace(&mut self, payload: Payload, now: Instant) {
        self.payload = payload;
        self.touched_at = now;
    }

    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.touched_at)
    }

    pub(crate) fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}
