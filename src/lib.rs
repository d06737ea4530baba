//! reapkv - Concurrent In-Memory Session Store
//!
//! Keyed session payloads with per-entry TTL, evicted by a background
//! reaper within a bounded window after their last update.

pub mod metrics;
pub mod quota;
pub mod storage;

pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use quota::{handle_request, QuotaConfig, QuotaError, RequestOutcome, User};
pub use storage::{
    KeyGenerationError, KeyGenerator, Payload, RandomKeyGenerator, Reaper, ReaperHandle,
    SessionStore, StoreConfig, StoreError,
};
