//! # Skiplight Client
//!
//! The verification core and client orchestrator of the Skiplight
//! light-client engine. From a single cryptographically anchored starting
//! point, the client tracks the canonical chain of signed headers produced
//! by a dynamic validator set without downloading every block:
//!
//! - **Skipping (bisection) verification** extends trust across height gaps
//!   whenever more than the trust level of previously trusted voting power
//!   signed the candidate header
//! - **Sequential verification** walks heights one by one through the
//!   parent-hash and next-validators commitments
//! - **Backwards verification** reaches heights below the earliest trusted
//!   block by following the parent-hash chain down
//! - **Witness cross-referencing** checks every verified hop against
//!   independent providers, expels equivocators, and emits fork evidence
//!
//! ## Security Model
//!
//! The client trusts:
//! - The anchor supplied in [`TrustOptions`](skiplight_types::TrustOptions)
//!   (height + header hash)
//! - The BFT consensus quorum rules (>2/3 to finalize, >trust level of a
//!   previously trusted set to skip)
//!
//! It does NOT trust any individual provider: the primary's answers are
//! cross-checked against witnesses, and a single verifiable conflicting
//! header is treated as an attack.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skiplight_client::{Client, ClientOptions};
//! use skiplight_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let client = Client::new(
//!     "my-chain",
//!     trust_options,
//!     primary,
//!     vec![witness_a, witness_b],
//!     Arc::new(MemoryStore::new()),
//!     ClientOptions::default(),
//! )
//! .await?;
//!
//! let block = client.verify_light_block_at_height(4321, now).await?;
//! ```
//!
//! ## Modules
//!
//! - [`client`] - the orchestrator
//! - [`verify`] - pure verification predicates
//! - [`provider`] - the light block source abstraction
//! - [`evidence`] - fork evidence

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod client;
pub mod evidence;
pub mod provider;
pub mod verify;

// Re-export main types at crate root
pub use client::{Client, ClientOptions, ConfirmationFn, VerificationMode};
pub use evidence::LightClientAttackEvidence;
pub use provider::{MockProvider, Provider, ProviderError, LATEST_HEIGHT};
pub use verify::{
    verify_adjacent, verify_non_adjacent, CommitVerifier, VerificationOptions, VerifyError,
};

use skiplight_store::StoreError;

/// Result type alias for light client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in light client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client options failed validation
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Trust options or trust level failed validation
    #[error(transparent)]
    InvalidTrustOptions(#[from] skiplight_types::Error),

    /// Bootstrap from the store requested, but the store holds nothing
    #[error("trust store is empty")]
    TrustStoreEmpty,

    /// Cross-referencing required but no witnesses are configured
    #[error("no witnesses configured for cross-referencing")]
    NoWitnesses,

    /// A verification predicate failed
    #[error(transparent)]
    Verification(#[from] VerifyError),

    /// No witness confirmed a verified header
    #[error("no witness confirmed the header at height {height}")]
    FailedHeaderCrossReferencing {
        /// Height of the unconfirmed header
        height: u64,
    },

    /// Two providers presented verifiable but conflicting light blocks
    #[error("light client attack: witness {witness} served {evidence}")]
    LightClientAttack {
        /// The conflicting block and the last agreed height
        evidence: LightClientAttackEvidence,
        /// Identity of the witness that served the conflicting block
        witness: String,
    },

    /// A provider-surface failure that exhausted rotation
    #[error("provider {provider}: {source}")]
    Provider {
        /// Identity of the failing provider
        provider: String,
        /// The underlying provider error
        #[source]
        source: ProviderError,
    },

    /// The trust store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Heights are strictly positive
    #[error("height must be positive")]
    ZeroHeight,

    /// The operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is a light-client attack.
    pub fn is_attack(&self) -> bool {
        matches!(self, Error::LightClientAttack { .. })
    }
}
