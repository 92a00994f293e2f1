//! # Skiplight Types
//!
//! Core type definitions for the Skiplight light-client engine:
//! - [`Header`], [`Commit`], [`SignedHeader`] - signed block headers
//! - [`Validator`], [`ValidatorSet`] - validator sets with voting power
//! - [`LightBlock`] - a signed header plus the validator set behind it
//! - [`TrustOptions`], [`TrustLevel`] - subjective trust anchoring and the
//!   skipping-verification quorum fraction
//!
//! ## Example
//!
//! ```rust,ignore
//! use skiplight_types::{LightBlock, TrustOptions};
//!
//! let options = TrustOptions { period: 4 * 3600 * 1000, height: 1, hash };
//! options.validate()?;
//! block.validate_basic("my-chain")?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod header;
pub mod light_block;
pub mod trust;
pub mod validator;

// Re-export main types at crate root
pub use header::{canonical_vote_bytes, domains, Commit, CommitSig, Header, SignedHeader};
pub use light_block::LightBlock;
pub use trust::{TrustLevel, TrustOptions};
pub use validator::{Validator, ValidatorSet};

// The primitive aliases are shared with the crypto crate.
pub use skiplight_crypto::{Address, Hash, NIL_HASH, ZERO_ADDRESS};

/// Result type alias for type validation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from validating core types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Trust options failed validation
    #[error("invalid trust options: {0}")]
    InvalidTrustOptions(String),

    /// Trust level outside the permitted range
    #[error("invalid trust level: {0}")]
    InvalidTrustLevel(String),

    /// A light block failed structural validation
    #[error("invalid light block: {0}")]
    InvalidLightBlock(String),
}
