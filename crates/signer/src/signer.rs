//! The file-backed signer.
//!
//! Wraps an Ed25519 key with the monotonicity guard: a request is signed
//! only if it is at or beyond the last signed (height, round, step), and a
//! re-sign of the same logical message returns the previous signature
//! instead of producing a second one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skiplight_crypto::{ed25519::PrivateKey, Address, Hash, PublicKey, Signature};
use skiplight_types::{canonical_vote_bytes, domains};
use tracing::{debug, info};

use crate::state::{write_atomically, SignState, SignStep};
use crate::{Result, SignerError};

/// Vote flavor; proposals are their own request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteType {
    /// First voting round
    Prevote,
    /// Second voting round
    Precommit,
}

/// A vote to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Prevote or precommit
    pub vote_type: VoteType,
    /// Block height
    pub height: u64,
    /// Consensus round
    pub round: u64,
    /// Hash of the block voted for (the nil hash for a nil vote)
    pub block_hash: Hash,
    /// Vote timestamp in milliseconds
    pub timestamp: u64,
    /// Filled in by the signer
    pub signature: Option<Signature>,
}

impl Vote {
    fn step(&self) -> SignStep {
        match self.vote_type {
            VoteType::Prevote => SignStep::Prevote,
            VoteType::Precommit => SignStep::Precommit,
        }
    }

    fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let domain = match self.vote_type {
            VoteType::Prevote => domains::PREVOTE,
            VoteType::Precommit => domains::PRECOMMIT,
        };
        canonical_vote_bytes(
            domain,
            chain_id,
            self.height,
            self.round,
            &self.block_hash,
            self.timestamp,
        )
    }
}

/// A block proposal to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Block height
    pub height: u64,
    /// Consensus round
    pub round: u64,
    /// Hash of the proposed block
    pub block_hash: Hash,
    /// Proposal timestamp in milliseconds
    pub timestamp: u64,
    /// Filled in by the signer
    pub signature: Option<Signature>,
}

impl Proposal {
    fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        canonical_vote_bytes(
            domains::PROPOSAL,
            chain_id,
            self.height,
            self.round,
            &self.block_hash,
            self.timestamp,
        )
    }
}

/// On-disk key record, hex-encoded.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    address: String,
    pub_key: String,
    priv_key: String,
}

/// The signer's key material.
pub struct SignerKey {
    /// Address derived from the public key
    pub address: Address,
    /// The public half
    pub pubkey: PublicKey,
    privkey: PrivateKey,
}

impl SignerKey {
    fn from_private(privkey: PrivateKey) -> Self {
        let pubkey = privkey.public_key();
        Self {
            address: pubkey.to_address(),
            pubkey,
            privkey,
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let record = KeyFile {
            address: hex::encode(self.address),
            pub_key: self.pubkey.to_hex(),
            priv_key: hex::encode(self.privkey.to_bytes()),
        };
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| SignerError::Serialization(e.to_string()))?;
        write_atomically(path, &json)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let record: KeyFile = serde_json::from_slice(&bytes)
            .map_err(|e| SignerError::Serialization(e.to_string()))?;
        let seed = hex::decode(&record.priv_key).map_err(|e| SignerError::Key(e.to_string()))?;
        let privkey = PrivateKey::from_bytes(&seed).map_err(|e| SignerError::Key(e.to_string()))?;
        let key = Self::from_private(privkey);
        if key.pubkey.to_hex() != record.pub_key {
            return Err(SignerError::Key(
                "public key does not match the private key".into(),
            ));
        }
        Ok(key)
    }
}

impl std::fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SignerKey")
            .field("address", &hex::encode(self.address))
            .finish_non_exhaustive()
    }
}

/// A validator signer backed by a key file and a last-signed-state file.
pub struct FileSigner {
    key: SignerKey,
    state: SignState,
    state_path: PathBuf,
}

impl FileSigner {
    /// Generate a fresh key and empty state, persisting both.
    pub fn generate(key_path: impl AsRef<Path>, state_path: impl AsRef<Path>) -> Result<Self> {
        let key = SignerKey::from_private(PrivateKey::random());
        key.save_to(key_path.as_ref())?;

        let state = SignState::default();
        let state_path = state_path.as_ref().to_path_buf();
        state.save_to(&state_path)?;

        info!(address = %hex::encode(key.address), "Generated signer key");
        Ok(Self {
            key,
            state,
            state_path,
        })
    }

    /// Load an existing key; the state file may be missing or partial.
    pub fn load(key_path: impl AsRef<Path>, state_path: impl AsRef<Path>) -> Result<Self> {
        let key = SignerKey::load_from(key_path.as_ref())?;
        let state_path = state_path.as_ref().to_path_buf();
        let state = SignState::load_from(&state_path);
        Ok(Self {
            key,
            state,
            state_path,
        })
    }

    /// Load the key if it exists, generate it otherwise.
    pub fn load_or_generate(
        key_path: impl AsRef<Path>,
        state_path: impl AsRef<Path>,
    ) -> Result<Self> {
        if key_path.as_ref().exists() {
            Self::load(key_path, state_path)
        } else {
            Self::generate(key_path, state_path)
        }
    }

    /// The signer's address.
    pub fn address(&self) -> Address {
        self.key.address
    }

    /// The signer's public key.
    pub fn public_key(&self) -> PublicKey {
        self.key.pubkey
    }

    /// The last signed state.
    pub fn state(&self) -> &SignState {
        &self.state
    }

    /// Forget all signing history and persist the empty state.
    pub fn reset(&mut self) -> Result<()> {
        self.state = SignState::default();
        self.state.save_to(&self.state_path)
    }

    /// Persist the current state.
    pub fn save(&self) -> Result<()> {
        self.state.save_to(&self.state_path)
    }

    /// Sign a vote, enforcing monotonicity.
    ///
    /// On success the vote's signature is filled in. If the request is a
    /// re-sign of the last vote differing only in timestamp, the timestamp
    /// is rewritten to the previously signed one and the previous signature
    /// is returned unchanged.
    pub fn sign_vote(&mut self, chain_id: &str, vote: &mut Vote) -> Result<()> {
        let sign_bytes = vote.sign_bytes(chain_id);
        match self.sign_message(vote.height, vote.round, vote.step(), sign_bytes)? {
            Outcome::Signed(signature) => vote.signature = Some(signature),
            Outcome::Reused {
                signature,
                timestamp,
            } => {
                vote.timestamp = timestamp;
                vote.signature = Some(signature);
            }
        }
        Ok(())
    }

    /// Sign a proposal, enforcing monotonicity. Semantics as [`sign_vote`].
    ///
    /// [`sign_vote`]: FileSigner::sign_vote
    pub fn sign_proposal(&mut self, chain_id: &str, proposal: &mut Proposal) -> Result<()> {
        let sign_bytes = proposal.sign_bytes(chain_id);
        match self.sign_message(proposal.height, proposal.round, SignStep::Proposal, sign_bytes)? {
            Outcome::Signed(signature) => proposal.signature = Some(signature),
            Outcome::Reused {
                signature,
                timestamp,
            } => {
                proposal.timestamp = timestamp;
                proposal.signature = Some(signature);
            }
        }
        Ok(())
    }

    fn sign_message(
        &mut self,
        height: u64,
        round: u64,
        step: SignStep,
        sign_bytes: Vec<u8>,
    ) -> Result<Outcome> {
        let same_hrs = self.state.check_hrs(height, round, step)?;

        if same_hrs {
            return self.resign_same_hrs(height, round, step, &sign_bytes);
        }

        let signature = self.key.privkey.sign(&sign_bytes);
        self.state = SignState {
            height,
            round,
            step: step.ordinal(),
            signature: Some(signature.as_bytes().to_vec()),
            sign_bytes: Some(sign_bytes),
        };
        // Persist before handing the signature out; a crash after signing
        // but before recording it must not allow a conflicting re-sign.
        self.state.save_to(&self.state_path)?;

        debug!(height, round, %step, "Signed");
        Ok(Outcome::Signed(signature))
    }

    /// Same (height, round, step) as the last signature: idempotent for the
    /// same payload (modulo timestamp), a refusal for anything else.
    fn resign_same_hrs(
        &self,
        height: u64,
        round: u64,
        step: SignStep,
        sign_bytes: &[u8],
    ) -> Result<Outcome> {
        let (last_bytes, last_signature) = match (&self.state.sign_bytes, &self.state.signature) {
            (Some(bytes), Some(signature)) => (bytes, signature),
            _ => {
                return Err(SignerError::ConflictingData {
                    height,
                    round,
                    step: step.ordinal(),
                })
            }
        };

        if last_bytes.as_slice() == sign_bytes || only_differ_by_timestamp(last_bytes, sign_bytes) {
            let timestamp = trailing_timestamp(last_bytes).ok_or(SignerError::ConflictingData {
                height,
                round,
                step: step.ordinal(),
            })?;
            debug!(height, round, %step, "Reusing previous signature");
            return Ok(Outcome::Reused {
                signature: Signature::from_bytes(last_signature),
                timestamp,
            });
        }

        Err(SignerError::ConflictingData {
            height,
            round,
            step: step.ordinal(),
        })
    }
}

impl std::fmt::Debug for FileSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSigner")
            .field("address", &hex::encode(self.key.address))
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

enum Outcome {
    Signed(Signature),
    Reused { signature: Signature, timestamp: u64 },
}

/// The canonical encoding puts the timestamp in the trailing 8 bytes, so
/// "same message, different timestamp" is a prefix comparison.
fn only_differ_by_timestamp(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.len() >= 8 && a[..a.len() - 8] == b[..b.len() - 8]
}

fn trailing_timestamp(bytes: &[u8]) -> Option<u64> {
    let tail: [u8; 8] = bytes.get(bytes.len().checked_sub(8)?..)?.try_into().ok()?;
    Some(u64::from_le_bytes(tail))
}
