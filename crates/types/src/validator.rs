//! Validators and validator sets.

use serde::{Deserialize, Serialize};
use skiplight_crypto::{Address, Hash, Hasher, PublicKey};

use crate::header::domains;

/// A single validator: public key plus voting power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Address derived from the public key
    pub address: Address,
    /// Ed25519 public key used to sign votes
    pub pubkey: PublicKey,
    /// Voting power, strictly positive
    pub power: u64,
}

impl Validator {
    /// Create a new validator; the address is derived from the key.
    pub fn new(pubkey: PublicKey, power: u64) -> Self {
        Self {
            address: pubkey.to_address(),
            pubkey,
            power,
        }
    }

    /// The validator's address as a hex string.
    pub fn address_hex(&self) -> String {
        hex::encode(self.address)
    }
}

/// An ordered set of validators for one height.
///
/// Validator position in the list is the index used by commit signatures,
/// so the order is part of the set's identity and of its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    /// Validators in canonical order
    validators: Vec<Validator>,
    /// Total voting power across all validators
    total_power: u128,
}

impl ValidatorSet {
    /// Create a validator set from an ordered list of validators.
    pub fn new(validators: Vec<Validator>) -> Self {
        let total_power = validators.iter().map(|v| u128::from(v.power)).sum();
        Self {
            validators,
            total_power,
        }
    }

    /// The validators in canonical order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Get a validator by its position in the set.
    pub fn get(&self, index: usize) -> Option<&Validator> {
        self.validators.get(index)
    }

    /// Find a validator by address.
    pub fn by_address(&self, address: &Address) -> Option<&Validator> {
        self.validators.iter().find(|v| &v.address == address)
    }

    /// Whether an address belongs to this set.
    pub fn has_address(&self, address: &Address) -> bool {
        self.by_address(address).is_some()
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Total voting power of the set.
    pub fn total_power(&self) -> u128 {
        self.total_power
    }

    /// The power required for a full quorum: more than 2/3 of the total.
    pub fn quorum_power(&self) -> u128 {
        (self.total_power * 2 / 3) + 1
    }

    /// The proposer for a given height and round.
    ///
    /// Deterministic round-robin: `validators[(height + round) % n]`.
    pub fn proposer(&self, height: u64, round: u64) -> Option<&Validator> {
        if self.validators.is_empty() {
            return None;
        }
        let idx = ((height.wrapping_add(round)) as usize) % self.validators.len();
        self.validators.get(idx)
    }

    /// The stable hash of this set over (public key, power) pairs in order.
    pub fn hash(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(domains::VALIDATOR_SET);
        for validator in &self.validators {
            hasher.update(validator.pubkey.as_bytes());
            hasher.update(&validator.power.to_le_bytes());
        }
        hasher.finalize()
    }
}
