//! Store Configuration

use std::time::Duration;

use super::ConfigError;

/// Expiry settings for a [`SessionStore`](super::SessionStore).
///
/// An entry last touched at `t0` is evicted somewhere in
/// `[t0 + ttl, t0 + ttl + tick]`. The tick bounds the extra delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Age at which an entry becomes eligible for eviction
    pub ttl: Duration,

    /// Reaper wake-up period
    pub tick: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            tick: Duration::from_secs(1),
        }
    }
}

impl StoreConfig {
    /// Set the entry TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the reaper tick period
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Reject a zero ttl, a zero tick, or a tick longer than the ttl
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        if self.tick > self.ttl {
            return Err(ConfigError::TickExceedsTtl);
        }
        Ok(())
    }

    /// Earliest and latest eviction delay after the last touch
    pub fn eviction_window(&self) -> (Duration, Duration) {
        (self.ttl, self.ttl.saturating_add(self.tick))
    }
}
