//! Header, commit, and canonical signing bytes.
//!
//! This module defines the signed-header half of a light block:
//! - [`Header`] - block metadata with the validator-set commitments light
//!   clients follow across heights
//! - [`Commit`] and [`CommitSig`] - the precommit signatures that finalized
//!   a header, indexed by validator position
//! - [`SignedHeader`] - a header paired with its commit
//! - [`canonical_vote_bytes`] - the byte encoding validators sign

use serde::{Deserialize, Serialize};
use skiplight_crypto::{Address, Hash, Hasher, Signature, NIL_HASH};

/// Domain separators for signature and hash security.
///
/// These prefixes prevent replay across contexts: a prevote signature cannot
/// be reused as a precommit, and a header hash cannot collide with a
/// validator-set hash over the same bytes.
pub mod domains {
    /// Domain separator for header hashes
    pub const HEADER: &[u8] = b"SKIPLIGHT_HEADER_V1";
    /// Domain separator for validator-set hashes
    pub const VALIDATOR_SET: &[u8] = b"SKIPLIGHT_VALSET_V1";
    /// Domain separator for prevote messages
    pub const PREVOTE: &[u8] = b"SKIPLIGHT_PREVOTE_V1";
    /// Domain separator for precommit messages
    pub const PRECOMMIT: &[u8] = b"SKIPLIGHT_PRECOMMIT_V1";
    /// Domain separator for block proposals
    pub const PROPOSAL: &[u8] = b"SKIPLIGHT_PROPOSAL_V1";
}

/// Canonical byte encoding of a vote, the message validators actually sign.
///
/// Layout: domain ‖ chain-id length (u32 LE) ‖ chain-id ‖ height (u64 LE) ‖
/// round (u64 LE) ‖ block hash ‖ timestamp in ms (u64 LE).
///
/// The timestamp is deliberately the trailing 8 bytes: two encodings that
/// agree on everything except the timestamp share a prefix, which is what
/// signing-state guards compare.
pub fn canonical_vote_bytes(
    domain: &[u8],
    chain_id: &str,
    height: u64,
    round: u64,
    block_hash: &Hash,
    timestamp: u64,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(domain.len() + 4 + chain_id.len() + 56);
    bytes.extend(domain);
    bytes.extend(&(chain_id.len() as u32).to_le_bytes());
    bytes.extend(chain_id.as_bytes());
    bytes.extend(&height.to_le_bytes());
    bytes.extend(&round.to_le_bytes());
    bytes.extend(block_hash);
    bytes.extend(&timestamp.to_le_bytes());
    bytes
}

/// A block header as tracked by the light client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Chain identifier (prevents cross-chain replay)
    pub chain_id: String,
    /// Block height, strictly positive
    pub height: u64,
    /// Unix timestamp in milliseconds
    pub time: u64,
    /// Hash of the previous block's header
    pub last_block_hash: Hash,
    /// Hash of the previous block's commit
    pub last_commit_hash: Hash,
    /// Hash of the validator set that votes at this height
    pub validators_hash: Hash,
    /// Hash of the validator set that votes at height + 1
    ///
    /// Light clients follow validator-set transitions through this
    /// commitment: an adjacent hop requires the new block's validator set to
    /// hash to the trusted header's `next_validators_hash`.
    pub next_validators_hash: Hash,
    /// Hash of the consensus parameters
    pub consensus_hash: Hash,
    /// Application state root after the previous block
    pub app_hash: Hash,
    /// Root of the previous block's execution results
    pub results_hash: Hash,
}

impl Header {
    /// Computes the hash of this header.
    ///
    /// All fields are fed to the hasher in declaration order under a domain
    /// separator; the chain id is length-prefixed.
    pub fn hash(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(domains::HEADER);
        hasher.update(&(self.chain_id.len() as u32).to_le_bytes());
        hasher.update(self.chain_id.as_bytes());
        hasher.update(&self.height.to_le_bytes());
        hasher.update(&self.time.to_le_bytes());
        hasher.update_many(&[
            &self.last_block_hash,
            &self.last_commit_hash,
            &self.validators_hash,
            &self.next_validators_hash,
            &self.consensus_hash,
            &self.app_hash,
            &self.results_hash,
        ]);
        hasher.finalize()
    }

    /// Hex representation of the header hash.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// A single slot in a commit, indexed by validator position.
///
/// A validator either did not vote, voted for the committed block, or voted
/// nil. Nil votes carry valid signatures but never count toward the quorum
/// for the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitSig {
    /// No vote was received from the validator at this position
    Absent,
    /// The validator voted for the committed block
    Commit {
        /// Address of the signing validator
        validator_address: Address,
        /// Vote timestamp in milliseconds
        timestamp: u64,
        /// Signature over the canonical precommit bytes
        signature: Signature,
    },
    /// The validator voted nil
    Nil {
        /// Address of the signing validator
        validator_address: Address,
        /// Vote timestamp in milliseconds
        timestamp: u64,
        /// Signature over the canonical precommit bytes for the nil hash
        signature: Signature,
    },
}

impl CommitSig {
    /// Address of the validator this slot belongs to, if it voted at all.
    pub fn validator_address(&self) -> Option<&Address> {
        match self {
            CommitSig::Absent => None,
            CommitSig::Commit {
                validator_address, ..
            }
            | CommitSig::Nil {
                validator_address, ..
            } => Some(validator_address),
        }
    }

    /// Whether this slot counts toward the committed block's quorum.
    pub fn is_commit(&self) -> bool {
        matches!(self, CommitSig::Commit { .. })
    }
}

/// The precommit signatures that finalized a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Height of the committed block
    pub height: u64,
    /// Round in which consensus was reached
    pub round: u64,
    /// Hash of the committed block's header
    pub block_hash: Hash,
    /// One slot per validator, in validator-set order
    pub signatures: Vec<CommitSig>,
}

impl Commit {
    /// Canonical sign-bytes for the slot at `index`.
    ///
    /// Commit votes sign the committed block hash; nil votes sign the nil
    /// hash. Absent slots have no sign-bytes.
    pub fn vote_sign_bytes(&self, chain_id: &str, index: usize) -> Option<Vec<u8>> {
        match self.signatures.get(index)? {
            CommitSig::Absent => None,
            CommitSig::Commit { timestamp, .. } => Some(canonical_vote_bytes(
                domains::PRECOMMIT,
                chain_id,
                self.height,
                self.round,
                &self.block_hash,
                *timestamp,
            )),
            CommitSig::Nil { timestamp, .. } => Some(canonical_vote_bytes(
                domains::PRECOMMIT,
                chain_id,
                self.height,
                self.round,
                &NIL_HASH,
                *timestamp,
            )),
        }
    }
}

/// A header paired with the commit that finalized it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedHeader {
    /// The block header
    pub header: Header,
    /// The commit for this header
    pub commit: Commit,
}

impl SignedHeader {
    /// Hash of the wrapped header.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}
