//! Share token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Generates opaque, URL-safe share tokens from OS-seeded randomness.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    bytes: usize,
}

impl TokenGenerator {
    /// Creates a generator producing tokens from `bytes` random bytes.
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes: bytes.max(16),
        }
    }

    /// Generates a new token.
    pub fn generate(&self) -> String {
        let mut buf = vec![0u8; self.bytes];
        rand::rng().fill_bytes(&mut buf);
        URL_SAFE_NO_PAD.encode(buf)
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}
