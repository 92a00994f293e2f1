//! Light blocks: the unit of light-client verification.

use serde::{Deserialize, Serialize};
use skiplight_crypto::Hash;

use crate::{Error, Result, SignedHeader, ValidatorSet};

/// A signed header paired with the validator sets behind it.
///
/// Carries both the set that voted at this height and the set committed for
/// the next height: non-adjacent trust extension tallies signature overlap
/// against a trusted block's *next* validators.
///
/// Immutable once constructed; [`LightBlock::validate_basic`] checks the
/// internal consistency a provider-supplied block must satisfy before any
/// trust decision is made about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightBlock {
    /// Header and the commit that finalized it
    pub signed_header: SignedHeader,
    /// The validator set voting at this height
    pub validators: ValidatorSet,
    /// The validator set voting at the next height
    pub next_validators: ValidatorSet,
}

impl LightBlock {
    /// Create a new light block.
    pub fn new(
        signed_header: SignedHeader,
        validators: ValidatorSet,
        next_validators: ValidatorSet,
    ) -> Self {
        Self {
            signed_header,
            validators,
            next_validators,
        }
    }

    /// Height of the block.
    pub fn height(&self) -> u64 {
        self.signed_header.header.height
    }

    /// Header timestamp in milliseconds.
    pub fn time(&self) -> u64 {
        self.signed_header.header.time
    }

    /// Hash of the block's header.
    pub fn hash(&self) -> Hash {
        self.signed_header.hash()
    }

    /// Structural self-consistency checks.
    ///
    /// A block that fails any of these is malformed regardless of what the
    /// chain looks like: wrong chain id, zero height, an empty validator
    /// set, a validator set that does not hash to the header's commitment,
    /// or a commit that does not commit to this header.
    pub fn validate_basic(&self, chain_id: &str) -> Result<()> {
        let header = &self.signed_header.header;
        let commit = &self.signed_header.commit;

        if header.chain_id != chain_id {
            return Err(Error::InvalidLightBlock(format!(
                "header chain id {:?} does not match {:?}",
                header.chain_id, chain_id
            )));
        }

        if header.height == 0 {
            return Err(Error::InvalidLightBlock("height must be positive".into()));
        }

        if self.validators.is_empty() {
            return Err(Error::InvalidLightBlock("empty validator set".into()));
        }

        if header.validators_hash != self.validators.hash() {
            return Err(Error::InvalidLightBlock(format!(
                "validators hash {} does not match the validator set",
                hex::encode(header.validators_hash)
            )));
        }

        if header.next_validators_hash != self.next_validators.hash() {
            return Err(Error::InvalidLightBlock(format!(
                "next validators hash {} does not match the next validator set",
                hex::encode(header.next_validators_hash)
            )));
        }

        if commit.height != header.height {
            return Err(Error::InvalidLightBlock(format!(
                "commit height {} does not match header height {}",
                commit.height, header.height
            )));
        }

        if commit.block_hash != header.hash() {
            return Err(Error::InvalidLightBlock(
                "commit does not commit to this header".into(),
            ));
        }

        if commit.signatures.len() != self.validators.len() {
            return Err(Error::InvalidLightBlock(format!(
                "commit has {} signature slots for {} validators",
                commit.signatures.len(),
                self.validators.len()
            )));
        }

        Ok(())
    }
}
