//! The verification core.
//!
//! Pure predicates over `(trusted, untrusted, now)` triples. Nothing here
//! performs I/O or touches a store; the client orchestrator decides what to
//! verify and what to do with the result.
//!
//! Two commit predicates back the two trust-extension modes:
//!
//! - **full**: more than two thirds of the block's own validator set signed
//!   it - the block was finalized by its chain
//! - **light**: more than ⟨trust level⟩ of a *previously trusted* validator
//!   set signed it - enough of the validators we already trusted vouch for
//!   the new block, so trust can skip over the gap

use std::collections::HashSet;
use std::sync::Arc;

use skiplight_crypto::{Ed25519Verifier, SignatureVerifier};
use skiplight_types::{Commit, CommitSig, LightBlock, TrustLevel, ValidatorSet};
use tracing::trace;

/// Errors from the verification predicates.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    /// Adjacent verification was asked to cross more than one height
    #[error("header at height {untrusted} is not adjacent to trusted height {trusted}")]
    NotAdjacent {
        /// Height of the trusted block
        trusted: u64,
        /// Height of the candidate block
        untrusted: u64,
    },

    /// The trusted block is too old to extend trust from
    #[error("trusted header expired: trusted at {trusted_at}ms, now {now}ms")]
    OldHeaderExpired {
        /// Timestamp of the trusted header
        trusted_at: u64,
        /// Observation time
        now: u64,
    },

    /// The candidate header claims a time beyond the permitted clock drift
    #[error("new header time {header_time}ms is ahead of now {now}ms plus drift")]
    NewHeaderTooFarInFuture {
        /// Timestamp of the candidate header
        header_time: u64,
        /// Observation time
        now: u64,
    },

    /// BFT time must increase from block to block
    #[error("non-monotonic BFT time: candidate at {new_time}ms, trusted at {trusted_time}ms")]
    NonMonotonicBftTime {
        /// Timestamp of the candidate header
        new_time: u64,
        /// Timestamp of the trusted header
        trusted_time: u64,
    },

    /// A structural or hash commitment check failed
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A quorum or signature check failed
    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    /// Trusted-set signature overlap below the trust level
    #[error("not enough trust: {tallied} of {total} trusted power signed, needed more than {trust_level}")]
    NotEnoughTrust {
        /// Trusted power that signed the candidate
        tallied: u128,
        /// Total trusted power
        total: u128,
        /// The governing trust level
        trust_level: TrustLevel,
    },
}

/// Policy knobs for the verification predicates.
#[derive(Debug, Clone, Copy)]
pub struct VerificationOptions {
    /// How long a trusted header may be used to extend trust, in ms
    pub trusting_period: u64,
    /// Tolerated clock skew between this node and block producers, in ms
    pub clock_drift: u64,
    /// Quorum fraction for non-adjacent trust extension
    pub trust_level: TrustLevel,
}

/// Commit verification with an injected signature scheme.
#[derive(Clone)]
pub struct CommitVerifier {
    signatures: Arc<dyn SignatureVerifier>,
}

impl CommitVerifier {
    /// Build a verifier over any signature implementation.
    pub fn new(signatures: Arc<dyn SignatureVerifier>) -> Self {
        Self { signatures }
    }

    /// The standard Ed25519-backed verifier.
    pub fn ed25519() -> Self {
        Self::new(Arc::new(Ed25519Verifier))
    }

    /// Check that more than two thirds of `vals` signed the commit.
    ///
    /// Every signature slot must line up with the validator at the same
    /// position; any cryptographically invalid signature fails the commit.
    /// Nil votes and empty signatures are verified structurally but never
    /// count toward the quorum.
    pub fn verify_commit_full(
        &self,
        chain_id: &str,
        commit: &Commit,
        vals: &ValidatorSet,
    ) -> Result<(), VerifyError> {
        if commit.signatures.len() != vals.len() {
            return Err(VerifyError::InvalidCommit(format!(
                "commit has {} signature slots for {} validators",
                commit.signatures.len(),
                vals.len()
            )));
        }

        let mut tallied: u128 = 0;
        let mut seen = HashSet::new();

        for (index, (sig, validator)) in commit.signatures.iter().zip(vals.validators()).enumerate()
        {
            let (address, signature) = match sig {
                CommitSig::Absent => continue,
                CommitSig::Commit {
                    validator_address,
                    signature,
                    ..
                }
                | CommitSig::Nil {
                    validator_address,
                    signature,
                    ..
                } => (validator_address, signature),
            };

            // Position binds the slot to exactly one validator.
            if address != &validator.address {
                return Err(VerifyError::InvalidCommit(format!(
                    "signature at position {index} claims validator {}",
                    hex::encode(address)
                )));
            }
            if !seen.insert(*address) {
                return Err(VerifyError::InvalidCommit(format!(
                    "double vote by validator {}",
                    hex::encode(address)
                )));
            }

            if signature.is_empty() {
                // An empty signature is a vote that never happened.
                continue;
            }

            let Some(sign_bytes) = commit.vote_sign_bytes(chain_id, index) else {
                continue;
            };
            if !self
                .signatures
                .verify(&validator.pubkey, &sign_bytes, signature)
            {
                return Err(VerifyError::InvalidCommit(format!(
                    "invalid signature from validator {}",
                    hex::encode(address)
                )));
            }

            if sig.is_commit() {
                tallied += u128::from(validator.power);
            }
        }

        let quorum = vals.quorum_power();
        if tallied < quorum {
            return Err(VerifyError::InvalidCommit(format!(
                "insufficient voting power: {tallied} of {}, quorum is {quorum}",
                vals.total_power()
            )));
        }

        trace!(tallied, quorum, "Full commit verified");
        Ok(())
    }

    /// Check that more than `trust_level` of `trusted_vals` signed the
    /// commit.
    ///
    /// Signers that are not in the trusted set are ignored rather than
    /// rejected - the new validator set is allowed to contain strangers, the
    /// question is only whether enough *known* power vouches for the block.
    pub fn verify_commit_light(
        &self,
        chain_id: &str,
        commit: &Commit,
        trusted_vals: &ValidatorSet,
        trust_level: TrustLevel,
    ) -> Result<(), VerifyError> {
        let total = trusted_vals.total_power();
        let mut tallied: u128 = 0;
        let mut seen = HashSet::new();

        for (index, sig) in commit.signatures.iter().enumerate() {
            // Only votes for the committed block carry trust.
            let CommitSig::Commit {
                validator_address,
                signature,
                ..
            } = sig
            else {
                continue;
            };
            if signature.is_empty() {
                continue;
            }
            if !seen.insert(*validator_address) {
                return Err(VerifyError::InvalidCommit(format!(
                    "double vote by validator {}",
                    hex::encode(validator_address)
                )));
            }

            let Some(validator) = trusted_vals.by_address(validator_address) else {
                continue;
            };

            let Some(sign_bytes) = commit.vote_sign_bytes(chain_id, index) else {
                continue;
            };
            if !self
                .signatures
                .verify(&validator.pubkey, &sign_bytes, signature)
            {
                return Err(VerifyError::InvalidCommit(format!(
                    "invalid signature from trusted validator {}",
                    hex::encode(validator_address)
                )));
            }

            tallied += u128::from(validator.power);
            if trust_level.is_met(tallied, total) {
                trace!(tallied, total, %trust_level, "Trusted overlap sufficient");
                return Ok(());
            }
        }

        Err(VerifyError::NotEnoughTrust {
            tallied,
            total,
            trust_level,
        })
    }
}

impl std::fmt::Debug for CommitVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitVerifier").finish_non_exhaustive()
    }
}

/// Shared time and integrity checks for both hop predicates.
fn verify_against_trusted(
    trusted: &LightBlock,
    untrusted: &LightBlock,
    options: &VerificationOptions,
    now: u64,
) -> Result<(), VerifyError> {
    // Monotonic BFT time.
    if untrusted.time() <= trusted.time() {
        return Err(VerifyError::NonMonotonicBftTime {
            new_time: untrusted.time(),
            trusted_time: trusted.time(),
        });
    }

    // Not from the future, modulo clock drift.
    if untrusted.time() >= now.saturating_add(options.clock_drift) {
        return Err(VerifyError::NewHeaderTooFarInFuture {
            header_time: untrusted.time(),
            now,
        });
    }

    // The trusted block must still be inside its trusting period.
    if trusted.time().saturating_add(options.trusting_period) <= now {
        return Err(VerifyError::OldHeaderExpired {
            trusted_at: trusted.time(),
            now,
        });
    }

    // The candidate's validator set must hash to its header commitment.
    if untrusted.signed_header.header.validators_hash != untrusted.validators.hash() {
        return Err(VerifyError::InvalidHeader(
            "validators hash does not match the validator set".into(),
        ));
    }

    Ok(())
}

/// Verify a trusted → trusted+1 hop.
///
/// Adjacent hops carry trust through the chain structure itself: the parent
/// hash link and the trusted header's next-validators commitment pin down
/// exactly one successor, which then only needs a valid commit from its own
/// validator set.
pub fn verify_adjacent(
    verifier: &CommitVerifier,
    trusted: &LightBlock,
    untrusted: &LightBlock,
    options: &VerificationOptions,
    now: u64,
) -> Result<(), VerifyError> {
    if untrusted.height() != trusted.height() + 1 {
        return Err(VerifyError::NotAdjacent {
            trusted: trusted.height(),
            untrusted: untrusted.height(),
        });
    }

    verify_against_trusted(trusted, untrusted, options, now)?;

    if untrusted.signed_header.header.last_block_hash != trusted.hash() {
        return Err(VerifyError::InvalidHeader(format!(
            "last block hash {} does not link to the trusted header",
            hex::encode(untrusted.signed_header.header.last_block_hash)
        )));
    }

    if untrusted.signed_header.header.validators_hash
        != trusted.signed_header.header.next_validators_hash
    {
        return Err(VerifyError::InvalidHeader(
            "validator set does not match the trusted next-validators commitment".into(),
        ));
    }

    verifier.verify_commit_full(
        &untrusted.signed_header.header.chain_id,
        &untrusted.signed_header.commit,
        &untrusted.validators,
    )
}

/// Verify a hop across a height gap.
///
/// Without the structural links, trust carries only through validator
/// overlap: more than `trust_level` of the trusted block's next validators
/// must have signed the candidate, and the candidate must additionally be
/// finalized by its own set.
pub fn verify_non_adjacent(
    verifier: &CommitVerifier,
    trusted: &LightBlock,
    untrusted: &LightBlock,
    options: &VerificationOptions,
    now: u64,
) -> Result<(), VerifyError> {
    verify_against_trusted(trusted, untrusted, options, now)?;

    let chain_id = &untrusted.signed_header.header.chain_id;

    verifier.verify_commit_light(
        chain_id,
        &untrusted.signed_header.commit,
        &trusted.next_validators,
        options.trust_level,
    )?;

    verifier.verify_commit_full(
        chain_id,
        &untrusted.signed_header.commit,
        &untrusted.validators,
    )
}
