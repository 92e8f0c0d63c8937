//! Deterministic 64-bit hashes for test identifiers
//!
//! Ids derived here must be identical across runs and processes, so the
//! std `Hasher` (randomly seeded) is not an option. Each step folds the
//! previous value and the next string into a SHA-256 digest and keeps
//! the leading 64 bits.

use sha2::{Digest, Sha256};
use std::fmt;

/// An immutable, order-sensitive 64-bit hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash64(u64);

impl Hash64 {
    /// The empty hash
    pub const fn new() -> Self {
        Hash64(0)
    }

    /// Fold a string into the hash, returning the combined value
    #[must_use]
    pub fn add(self, value: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0.to_be_bytes());
        // Length prefix keeps ("ab", "c") apart from ("a", "bc")
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Hash64(u64::from_be_bytes(bytes))
    }

    /// Raw 64-bit value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Hash64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}
