//! # SHA-256 Hashing Utilities
//!
//! This module provides the SHA-256 hashing functions used for header
//! hashes, validator-set hashes, and address derivation.
//!
//! ## Functions
//!
//! - `sha256` - Hash a single byte slice
//! - `sha256_concat` - Hash multiple byte slices concatenated
//!
//! ## Streaming Hasher
//!
//! For incremental data, use the `Hasher` struct:
//!
//! ```rust
//! use skiplight_crypto::hash::Hasher;
//!
//! let mut hasher = Hasher::new();
//! hasher.update(b"hello");
//! hasher.update(b" world");
//! let hash = hasher.finalize();
//! ```

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```rust
/// use skiplight_crypto::sha256;
///
/// let hash = sha256(b"hello");
/// assert_eq!(hash.len(), 32);
/// ```
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA-256 hash of multiple concatenated inputs.
///
/// This avoids allocating a temporary buffer for the concatenation.
///
/// # Example
///
/// ```rust
/// use skiplight_crypto::sha256_concat;
///
/// let hash = sha256_concat(&[b"hello", b" ", b"world"]);
/// // Equivalent to: sha256(b"hello world")
/// ```
#[inline]
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// A streaming SHA-256 hasher for incremental hashing.
#[derive(Clone)]
pub struct Hasher {
    inner: Sha256,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a new SHA-256 hasher.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update the hasher with additional data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Update the hasher with multiple data chunks.
    #[inline]
    pub fn update_many(&mut self, parts: &[&[u8]]) {
        for part in parts {
            self.inner.update(part);
        }
    }

    /// Finalize the hasher and return the hash.
    ///
    /// This consumes the hasher. To continue hashing, create a new `Hasher`.
    #[inline]
    pub fn finalize(self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}

impl std::fmt::Debug for Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}
