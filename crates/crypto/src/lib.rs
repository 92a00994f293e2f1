//! # Skiplight Crypto
//!
//! Cryptographic primitives for the Skiplight light-client engine.
//!
//! This crate provides:
//! - **SHA-256 hashing** - header, validator-set, and address digests
//! - **Ed25519 signatures** - validator vote signing and verification
//! - **[`SignatureVerifier`]** - the seam through which the verification
//!   engine consumes signature checks, so the engine itself never
//!   re-implements or hard-codes a primitive
//!
//! ## Example
//!
//! ```rust
//! use skiplight_crypto::{sha256, ed25519::PrivateKey};
//!
//! // Hash some data
//! let hash = sha256(b"hello world");
//!
//! // Generate a key and sign
//! let private_key = PrivateKey::random();
//! let public_key = private_key.public_key();
//! let signature = private_key.sign(b"message");
//!
//! // Verify signature
//! assert!(public_key.verify(b"message", &signature));
//! ```

pub mod ed25519;
pub mod hash;

pub use ed25519::{Ed25519Verifier, PrivateKey, PublicKey, Signature};
pub use hash::{sha256, sha256_concat, Hasher};

/// Common type alias for a 32-byte hash.
pub type Hash = [u8; 32];

/// A 20-byte account address derived from a public key.
pub type Address = [u8; 20];

/// Zero hash constant - represents "no block" in votes and links.
pub const NIL_HASH: Hash = [0u8; 32];

/// Zero address constant.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Error types for cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Invalid private key bytes
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid public key bytes
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid input length
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// Hex decoding error
    #[error("hex decoding error: {0}")]
    HexError(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::HexError(e.to_string())
    }
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Deterministic, stateless signature verification.
///
/// Implementations must be pure: the same (key, message, signature) triple
/// always yields the same answer.
pub trait SignatureVerifier: Send + Sync {
    /// Check `signature` over `message` against `pubkey`.
    fn verify(&self, pubkey: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}
