//! Storage Errors

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The key generator failed or produced an unusable key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key generation failed: {reason}")]
pub struct KeyGenerationError {
    reason: String,
}

impl KeyGenerationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors surfaced by [`SessionStore`](super::SessionStore) operations.
///
/// None of these are fatal. A failed operation leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("session {key} does not exist")]
    NotFound { key: String },

    #[error(transparent)]
    KeyGeneration(#[from] KeyGenerationError),

    #[error("invalid store configuration: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub(crate) fn not_found(key: &str) -> Self {
        Self::NotFound {
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Rejected [`StoreConfig`](super::StoreConfig) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ttl must be greater than zero")]
    ZeroTtl,

    #[error("tick period must be greater than zero")]
    ZeroTick,

    #[error("tick period must not exceed the ttl")]
    TickExceedsTtl,
}
