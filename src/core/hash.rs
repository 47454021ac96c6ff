//! Digest Hashing for Exported Results
//!
//! Provides deterministic hashing of closed round records so the
//! persistence collaborator can check that an export was not altered.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type ResultsDigest = [u8; 32];

/// Deterministic hasher for result records.
///
/// Wraps SHA-256 with helpers for the primitive field types.
/// Order of updates is critical for determinism.
pub struct DigestHasher {
    hasher: Sha256,
}

impl DigestHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for a session export.
    pub fn for_export() -> Self {
        Self::new(b"GUESS_ROUND_EXPORT_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an optional u32; absence hashes differently from zero.
    #[inline]
    pub fn update_opt_u32(&mut self, value: Option<u32>) {
        match value {
            Some(v) => {
                self.update_u8(1);
                self.update_u32(v);
            }
            None => self.update_u8(0),
        }
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> ResultsDigest {
        self.hasher.finalize().into()
    }
}
