//! Storage Engine
//!
//! In-memory session store with TTL eviction.

mod config;
mod entry;
mod error;
mod keygen;
mod reaper;
mod store;

pub use config::StoreConfig;
pub use entry::Payload;
pub use error::{ConfigError, KeyGenerationError, Result, StoreError};
pub use keygen::{KeyGenerator, RandomKeyGenerator};
pub use reaper::{Reaper, ReaperHandle};
pub use store::SessionStore;
