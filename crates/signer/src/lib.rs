//! # Skiplight Signer
//!
//! The sign-vote monotonicity guard used by external signer processes.
//!
//! A validator must never sign two different messages at the same
//! (height, round, step): that is equivocation, the fault the light client
//! hunts for. This crate wraps the signing key with a guard that:
//!
//! - signs requests strictly beyond the last signed (height, round, step)
//! - refuses any request lexicographically behind it
//! - treats a re-sign of the same message that differs only in timestamp as
//!   idempotent, returning the original signature and timestamp
//! - refuses a different payload at the same position as a conflicting vote
//!
//! The last-signed state is persisted crash-safely (write temp, fsync,
//! rename); a partial or missing state file reads as "never signed", which
//! is safe because the guard only ever refuses - it never approves based on
//! absent state.
//!
//! Step ordering is `prevote < precommit < proposal`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skiplight_signer::{FileSigner, Vote, VoteType};
//!
//! let mut signer = FileSigner::load_or_generate("key.json", "state.json")?;
//! let mut vote = Vote {
//!     vote_type: VoteType::Prevote,
//!     height: 10,
//!     round: 1,
//!     block_hash,
//!     timestamp: now,
//!     signature: None,
//! };
//! signer.sign_vote("my-chain", &mut vote)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod signer;
pub mod state;

pub use signer::{FileSigner, Proposal, SignerKey, Vote, VoteType};
pub use state::{SignState, SignStep};

/// Result type alias for signer operations
pub type Result<T> = std::result::Result<T, SignerError>;

/// Errors from the signing guard
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The request is behind the last signed (height, round, step)
    #[error(
        "sign request regresses: got height {height} round {round} step {step}, \
         last signed height {last_height} round {last_round} step {last_step}"
    )]
    Regression {
        /// Requested height
        height: u64,
        /// Requested round
        round: u64,
        /// Requested step ordinal
        step: u8,
        /// Last signed height
        last_height: u64,
        /// Last signed round
        last_round: u64,
        /// Last signed step ordinal
        last_step: u8,
    },

    /// Same (height, round, step) as the last signature but a different
    /// payload: signing it would equivocate
    #[error("conflicting data at height {height} round {round} step {step}")]
    ConflictingData {
        /// Requested height
        height: u64,
        /// Requested round
        round: u64,
        /// Requested step ordinal
        step: u8,
    },

    /// Key file problems
    #[error("key error: {0}")]
    Key(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
