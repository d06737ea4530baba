//! Session Key Generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;

use super::KeyGenerationError;

/// Source of unique opaque session keys.
///
/// Generation may fail. The store calls this before taking its lock.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Result<String, KeyGenerationError>;
}

impl<F> KeyGenerator for F
where
    F: Fn() -> Result<String, KeyGenerationError> + Send + Sync,
{
    fn generate(&self) -> Result<String, KeyGenerationError> {
        self()
    }
}

/// Random keys read from the operating system RNG, URL-safe base64 encoded.
#[derive(Debug, Clone, Copy)]
pub struct RandomKeyGenerator {
    bytes: usize,
}

impl Default for RandomKeyGenerator {
    fn default() -> Self {
        Self { bytes: 32 }
    }
}

impl RandomKeyGenerator {
    /// Use `bytes` bytes of entropy per key
    pub fn with_bytes(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> Result<String, KeyGenerationError> {
        if self.bytes == 0 {
            return Err(KeyGenerationError::new("key length must be non-zero"));
        }
        let mut buf = vec![0u8; self.bytes];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| KeyGenerationError::new(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_keys_are_url_safe() {
        let key = RandomKeyGenerator::default().generate().unwrap();
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(key.len(), 43);
        assert!(key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_random_keys_are_unique() {
        let source = RandomKeyGenerator::with_bytes(16);
        let keys: HashSet<String> = (0..1000).map(|_| source.generate().unwrap()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_zero_length_fails() {
        let err = RandomKeyGenerator::with_bytes(0).generate().unwrap_err();
        assert_eq!(err.reason(), "key length must be non-zero");
    }

    #[test]
    fn test_closure_generator() {
        let fixed = || Ok::<_, KeyGenerationError>("fixed".to_string());
        assert_eq!(fixed.generate().unwrap(), "fixed");
    }
}
