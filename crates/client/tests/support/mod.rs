//! Shared builders for light-client tests: deterministic keys, validator
//! sets, and signed light blocks wired together the way a real chain would
//! produce them.

#![allow(dead_code)]

use std::collections::BTreeMap;

use skiplight_crypto::{ed25519::PrivateKey, Hash, NIL_HASH};
use skiplight_types::{
    canonical_vote_bytes, domains, Commit, CommitSig, Header, LightBlock, SignedHeader,
    TrustOptions, Validator, ValidatorSet,
};

pub const CHAIN_ID: &str = "test";

/// Base time of every test chain, in ms.
pub const B_TIME: u64 = 1_577_836_800_000;

pub const MINUTE: u64 = 60_000;
pub const HOUR: u64 = 3_600_000;

/// Deterministic keys: the seed byte keeps distinct validator generations
/// apart.
pub fn keys(n: usize, seed: u8) -> Vec<PrivateKey> {
    (0..n)
        .map(|i| {
            let mut bytes = [0u8; 32];
            bytes[0] = seed;
            bytes[1] = i as u8 + 1;
            bytes[31] = 0xA5;
            PrivateKey::from_bytes(&bytes).expect("valid seed")
        })
        .collect()
}

pub fn validators(keys: &[PrivateKey], power: u64) -> ValidatorSet {
    ValidatorSet::new(
        keys.iter()
            .map(|k| Validator::new(k.public_key(), power))
            .collect(),
    )
}

/// Build a signed light block.
///
/// `signers` are positions into `keys`/`vals`; everyone else is recorded as
/// absent. `app_hash` is the knob tests turn to fork a header without
/// touching anything else.
#[allow(clippy::too_many_arguments)]
pub fn signed_block(
    height: u64,
    time: u64,
    last_block_hash: Hash,
    vals: &ValidatorSet,
    next_vals: &ValidatorSet,
    keys: &[PrivateKey],
    signers: &[usize],
    app_hash: Hash,
) -> LightBlock {
    let header = Header {
        chain_id: CHAIN_ID.to_string(),
        height,
        time,
        last_block_hash,
        last_commit_hash: [2u8; 32],
        validators_hash: vals.hash(),
        next_validators_hash: next_vals.hash(),
        consensus_hash: [3u8; 32],
        app_hash,
        results_hash: [5u8; 32],
    };
    let header_hash = header.hash();

    let mut signatures = vec![CommitSig::Absent; vals.len()];
    for &i in signers {
        let sign_bytes =
            canonical_vote_bytes(domains::PRECOMMIT, CHAIN_ID, height, 0, &header_hash, time);
        signatures[i] = CommitSig::Commit {
            validator_address: keys[i].public_key().to_address(),
            timestamp: time,
            signature: keys[i].sign(&sign_bytes),
        };
    }

    let commit = Commit {
        height,
        round: 0,
        block_hash: header_hash,
        signatures,
    };
    LightBlock::new(
        SignedHeader { header, commit },
        vals.clone(),
        next_vals.clone(),
    )
}

/// All signer positions for a key list.
pub fn all_signers(keys: &[PrivateKey]) -> Vec<usize> {
    (0..keys.len()).collect()
}

/// A fully signed chain over one static validator set, one block per
/// minute, heights 1..=n.
pub fn linear_chain(n: u64, keys: &[PrivateKey], power: u64) -> BTreeMap<u64, LightBlock> {
    let vals = validators(keys, power);
    let signers = all_signers(keys);
    let mut blocks = BTreeMap::new();
    let mut last_hash = NIL_HASH;
    for height in 1..=n {
        let block = signed_block(
            height,
            B_TIME + height * MINUTE,
            last_hash,
            &vals,
            &vals,
            keys,
            &signers,
            [4u8; 32],
        );
        last_hash = block.hash();
        blocks.insert(height, block);
    }
    blocks
}

/// Trust options anchored at the given block, with a 4 hour period.
pub fn trust_options(anchor: &LightBlock) -> TrustOptions {
    TrustOptions {
        period: 4 * HOUR,
        height: anchor.height(),
        hash: anchor.hash(),
    }
}
