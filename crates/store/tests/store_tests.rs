//! Tests for the trust store implementations

use skiplight_crypto::ed25519::PrivateKey;
use skiplight_store::{DbStore, LightStore, MemoryStore};
use skiplight_types::{Commit, CommitSig, Header, LightBlock, SignedHeader, Validator, ValidatorSet};

fn test_validator_set() -> ValidatorSet {
    let validators = (1u8..=4)
        .map(|i| {
            let key = PrivateKey::from_bytes(&[i; 32]).unwrap();
            Validator::new(key.public_key(), 20)
        })
        .collect();
    ValidatorSet::new(validators)
}

fn test_block(height: u64) -> LightBlock {
    let vals = test_validator_set();
    let header = Header {
        chain_id: "test".to_string(),
        height,
        time: 1_000 + height * 1_000,
        last_block_hash: [height as u8; 32],
        last_commit_hash: [0u8; 32],
        validators_hash: vals.hash(),
        next_validators_hash: vals.hash(),
        consensus_hash: [0u8; 32],
        app_hash: [0u8; 32],
        results_hash: [0u8; 32],
    };
    let commit = Commit {
        height,
        round: 0,
        block_hash: header.hash(),
        signatures: vec![CommitSig::Absent; vals.len()],
    };
    LightBlock::new(SignedHeader { header, commit }, vals.clone(), vals)
}

fn run_basic_suite(store: &dyn LightStore) {
    assert!(store.is_empty().unwrap());
    assert_eq!(store.first_height().unwrap(), None);
    assert_eq!(store.last_height().unwrap(), None);

    for height in [1u64, 5, 3, 9] {
        store.save(&test_block(height)).unwrap();
    }

    assert_eq!(store.len().unwrap(), 4);
    assert_eq!(store.first_height().unwrap(), Some(1));
    assert_eq!(store.last_height().unwrap(), Some(9));

    let block = store.get(5).unwrap().unwrap();
    assert_eq!(block.height(), 5);
    assert!(store.get(4).unwrap().is_none());

    // Replacing an existing height does not grow the store
    store.save(&test_block(5)).unwrap();
    assert_eq!(store.len().unwrap(), 4);

    // Nearest-at-or-below walks down through gaps
    assert_eq!(store.nearest_at_or_below(4).unwrap().unwrap().height(), 3);
    assert_eq!(store.nearest_at_or_below(9).unwrap().unwrap().height(), 9);
    assert_eq!(store.nearest_at_or_below(100).unwrap().unwrap().height(), 9);

    store.delete(1).unwrap();
    assert_eq!(store.first_height().unwrap(), Some(3));
    assert!(store.nearest_at_or_below(2).unwrap().is_none());

    // Deleting a missing height is a no-op
    store.delete(42).unwrap();
    assert_eq!(store.len().unwrap(), 3);

    store.delete_all().unwrap();
    assert!(store.is_empty().unwrap());
    assert_eq!(store.last_height().unwrap(), None);
}

fn run_prune_suite(store: &dyn LightStore) {
    for height in 1..=10u64 {
        store.save(&test_block(height)).unwrap();
    }

    let pruned = store.prune(4).unwrap();
    assert_eq!(pruned, 6);
    assert_eq!(store.len().unwrap(), 4);
    assert_eq!(store.first_height().unwrap(), Some(7));
    assert_eq!(store.last_height().unwrap(), Some(10));

    // Pruning below the current size is a no-op
    assert_eq!(store.prune(10).unwrap(), 0);

    // Size 1 keeps only the most recent entry; zero is clamped to one
    assert_eq!(store.prune(0).unwrap(), 3);
    assert_eq!(store.first_height().unwrap(), Some(10));
    assert_eq!(store.last_height().unwrap(), Some(10));
}

#[test]
fn test_memory_store_basic() {
    run_basic_suite(&MemoryStore::new());
}

#[test]
fn test_memory_store_prune() {
    run_prune_suite(&MemoryStore::new());
}

#[test]
fn test_db_store_basic() {
    let dir = tempfile::tempdir().unwrap();
    let store = DbStore::open(dir.path()).unwrap();
    run_basic_suite(&store);
}

#[test]
fn test_db_store_prune() {
    let dir = tempfile::tempdir().unwrap();
    let store = DbStore::open(dir.path()).unwrap();
    run_prune_suite(&store);
}

#[test]
fn test_db_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = DbStore::open(dir.path()).unwrap();
        for height in [2u64, 4, 8] {
            store.save(&test_block(height)).unwrap();
        }
    }

    let store = DbStore::open(dir.path()).unwrap();
    assert_eq!(store.len().unwrap(), 3);
    assert_eq!(store.first_height().unwrap(), Some(2));
    assert_eq!(store.last_height().unwrap(), Some(8));

    let block = store.get(4).unwrap().unwrap();
    assert_eq!(block.hash(), test_block(4).hash());
}
