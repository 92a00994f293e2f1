//! Tests for the pure verification predicates

mod support;

use skiplight_client::{
    verify_adjacent, verify_non_adjacent, CommitVerifier, VerificationOptions, VerifyError,
};
use skiplight_crypto::{ed25519::PrivateKey, Signature, NIL_HASH};
use skiplight_types::{canonical_vote_bytes, domains, CommitSig, TrustLevel, Validator, ValidatorSet};

use support::{all_signers, keys, signed_block, validators, B_TIME, CHAIN_ID, HOUR};

fn options() -> VerificationOptions {
    VerificationOptions {
        trusting_period: 4 * HOUR,
        clock_drift: 10_000,
        trust_level: TrustLevel::ONE_THIRD,
    }
}

#[test]
fn test_adjacent_happy_path() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    let h2 = signed_block(
        2,
        B_TIME + 30 * 60_000,
        h1.hash(),
        &vals,
        &vals,
        &keys,
        &signers,
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    verify_adjacent(&verifier, &h1, &h2, &options(), B_TIME + HOUR).unwrap();
}

#[test]
fn test_adjacent_rejects_gap() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    let h3 = signed_block(3, B_TIME + HOUR, [7u8; 32], &vals, &vals, &keys, &signers, [4u8; 32]);

    let verifier = CommitVerifier::ed25519();
    let err = verify_adjacent(&verifier, &h1, &h3, &options(), B_TIME + 2 * HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::NotAdjacent { trusted: 1, untrusted: 3 }));
}

#[test]
fn test_adjacent_rejects_broken_parent_link() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    // Links to a hash that is not h1's
    let h2 = signed_block(
        2,
        B_TIME + HOUR,
        [9u8; 32],
        &vals,
        &vals,
        &keys,
        &signers,
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    let err = verify_adjacent(&verifier, &h1, &h2, &options(), B_TIME + 2 * HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::InvalidHeader(_)));
}

#[test]
fn test_adjacent_rejects_wrong_next_validators_commitment() {
    let old_keys = keys(4, 1);
    let new_keys = keys(4, 2);
    let old_vals = validators(&old_keys, 20);
    let new_vals = validators(&new_keys, 10);

    // h1 commits to old_vals for height 2, but h2 is produced by new_vals.
    let h1 = signed_block(
        1,
        B_TIME,
        NIL_HASH,
        &old_vals,
        &old_vals,
        &old_keys,
        &all_signers(&old_keys),
        [4u8; 32],
    );
    let h2 = signed_block(
        2,
        B_TIME + HOUR,
        h1.hash(),
        &new_vals,
        &new_vals,
        &new_keys,
        &all_signers(&new_keys),
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    let err = verify_adjacent(&verifier, &h1, &h2, &options(), B_TIME + 2 * HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::InvalidHeader(_)));
}

#[test]
fn test_non_adjacent_happy_path() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    let h3 = signed_block(
        3,
        B_TIME + HOUR,
        [7u8; 32],
        &vals,
        &vals,
        &keys,
        &signers,
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    verify_non_adjacent(&verifier, &h1, &h3, &options(), B_TIME + 2 * HOUR).unwrap();
}

#[test]
fn test_non_adjacent_insufficient_signers() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &all_signers(&keys), [4u8; 32]);
    // One of four equal-power validators signed: 25% <= 1/3
    let h2 = signed_block(2, B_TIME + HOUR, h1.hash(), &vals, &vals, &keys, &[0], [4u8; 32]);

    let verifier = CommitVerifier::ed25519();
    let err = verify_non_adjacent(&verifier, &h1, &h2, &options(), B_TIME + 2 * HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::NotEnoughTrust { tallied: 20, total: 80, .. }));
}

#[test]
fn test_non_adjacent_unknown_signers_are_ignored() {
    let old_keys = keys(4, 1);
    let new_keys = keys(4, 2);
    let old_vals = validators(&old_keys, 20);
    let new_vals = validators(&new_keys, 10);

    let h1 = signed_block(
        1,
        B_TIME,
        NIL_HASH,
        &old_vals,
        &old_vals,
        &old_keys,
        &all_signers(&old_keys),
        [4u8; 32],
    );
    // Fully signed, but by validators the trusted set has never heard of.
    let h3 = signed_block(
        3,
        B_TIME + HOUR,
        [7u8; 32],
        &new_vals,
        &new_vals,
        &new_keys,
        &all_signers(&new_keys),
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    let err = verify_non_adjacent(&verifier, &h1, &h3, &options(), B_TIME + 2 * HOUR).unwrap_err();
    // Not a signature failure: zero trusted overlap.
    assert!(matches!(err, VerifyError::NotEnoughTrust { tallied: 0, .. }));
}

#[test]
fn test_non_monotonic_time_rejected() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME + HOUR, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    let h2 = signed_block(2, B_TIME + HOUR, h1.hash(), &vals, &vals, &keys, &signers, [4u8; 32]);

    let verifier = CommitVerifier::ed25519();
    let err = verify_adjacent(&verifier, &h1, &h2, &options(), B_TIME + 2 * HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::NonMonotonicBftTime { .. }));
}

#[test]
fn test_header_from_the_future_rejected() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    // One minute ahead of `now`, drift allows only ten seconds
    let h2 = signed_block(
        2,
        B_TIME + HOUR + 60_000,
        h1.hash(),
        &vals,
        &vals,
        &keys,
        &signers,
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    let err = verify_adjacent(&verifier, &h1, &h2, &options(), B_TIME + HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::NewHeaderTooFarInFuture { .. }));
}

#[test]
fn test_expired_trusting_period_rejected() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);
    let signers = all_signers(&keys);

    let h1 = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &signers, [4u8; 32]);
    let h2 = signed_block(
        2,
        B_TIME + 5 * HOUR,
        h1.hash(),
        &vals,
        &vals,
        &keys,
        &signers,
        [4u8; 32],
    );

    // Five hours later, past the four hour trusting period
    let verifier = CommitVerifier::ed25519();
    let err = verify_adjacent(&verifier, &h1, &h2, &options(), B_TIME + 5 * HOUR).unwrap_err();
    assert!(matches!(err, VerifyError::OldHeaderExpired { .. }));
}

#[test]
fn test_commit_full_quorum_boundary() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);

    // 3 of 4 validators is 60 of 80: above the 54 quorum
    let h = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &[0, 1, 2], [4u8; 32]);
    let verifier = CommitVerifier::ed25519();
    verifier
        .verify_commit_full(CHAIN_ID, &h.signed_header.commit, &vals)
        .unwrap();

    // 2 of 4 is 40 of 80: below quorum
    let h = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &[0, 1], [4u8; 32]);
    let err = verifier
        .verify_commit_full(CHAIN_ID, &h.signed_header.commit, &vals)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidCommit(_)));
}

#[test]
fn test_commit_full_rejects_double_vote() {
    // A set that lists the same key twice: both slots sign, and the second
    // must be rejected as a double vote.
    let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
    let twin_keys = vec![
        PrivateKey::from_bytes(&[42u8; 32]).unwrap(),
        PrivateKey::from_bytes(&[42u8; 32]).unwrap(),
    ];
    let vals = ValidatorSet::new(vec![
        Validator::new(key.public_key(), 20),
        Validator::new(key.public_key(), 20),
    ]);

    let h = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &twin_keys, &[0, 1], [4u8; 32]);
    let verifier = CommitVerifier::ed25519();
    let err = verifier
        .verify_commit_full(CHAIN_ID, &h.signed_header.commit, &vals)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidCommit(ref reason) if reason.contains("double")));
}

#[test]
fn test_commit_full_nil_votes_do_not_count() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);

    // Two block votes plus two valid nil votes: the nil votes verify but
    // only 40 of 80 power backs the block.
    let mut block = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &[0, 1], [4u8; 32]);
    for i in [2usize, 3] {
        let sign_bytes = canonical_vote_bytes(domains::PRECOMMIT, CHAIN_ID, 1, 0, &NIL_HASH, B_TIME);
        block.signed_header.commit.signatures[i] = CommitSig::Nil {
            validator_address: keys[i].public_key().to_address(),
            timestamp: B_TIME,
            signature: keys[i].sign(&sign_bytes),
        };
    }

    let verifier = CommitVerifier::ed25519();
    let err = verifier
        .verify_commit_full(CHAIN_ID, &block.signed_header.commit, &vals)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidCommit(ref reason) if reason.contains("insufficient")));
}

#[test]
fn test_commit_full_empty_signature_does_not_count() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);

    let mut block = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &[0, 1, 2], [4u8; 32]);
    // Blank out one of the three signatures: 40 of 80 left.
    if let CommitSig::Commit { signature, .. } = &mut block.signed_header.commit.signatures[2] {
        *signature = Signature::from_bytes(&[]);
    }

    let verifier = CommitVerifier::ed25519();
    let err = verifier
        .verify_commit_full(CHAIN_ID, &block.signed_header.commit, &vals)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidCommit(ref reason) if reason.contains("insufficient")));
}

#[test]
fn test_commit_full_rejects_tampered_signature() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);

    let mut block = signed_block(1, B_TIME, NIL_HASH, &vals, &vals, &keys, &all_signers(&keys), [4u8; 32]);
    if let CommitSig::Commit { signature, .. } = &mut block.signed_header.commit.signatures[1] {
        *signature = Signature::from_bytes(&[0xFF; 64]);
    }

    let verifier = CommitVerifier::ed25519();
    let err = verifier
        .verify_commit_full(CHAIN_ID, &block.signed_header.commit, &vals)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidCommit(ref reason) if reason.contains("invalid signature")));
}

#[test]
fn test_commit_light_partial_overlap() {
    // Trusted set: four validators of power 20. The new chain rotated two
    // of them out; the remaining overlap is 40 of 80, above 1/3 but not 2/3.
    let old_keys = keys(4, 1);
    let new_keys: Vec<PrivateKey> = old_keys
        .iter()
        .take(2)
        .map(|k| PrivateKey::from_bytes(&k.to_bytes()).unwrap())
        .chain(keys(2, 9))
        .collect();

    let old_vals = validators(&old_keys, 20);
    let new_vals = validators(&new_keys, 20);

    let block = signed_block(
        5,
        B_TIME + HOUR,
        [7u8; 32],
        &new_vals,
        &new_vals,
        &new_keys,
        &all_signers(&new_keys),
        [4u8; 32],
    );

    let verifier = CommitVerifier::ed25519();
    // 40 of 80 > 1/3: enough at the default level
    verifier
        .verify_commit_light(
            CHAIN_ID,
            &block.signed_header.commit,
            &old_vals,
            TrustLevel::ONE_THIRD,
        )
        .unwrap();

    // 40 of 80 is not more than 2/3
    let err = verifier
        .verify_commit_light(
            CHAIN_ID,
            &block.signed_header.commit,
            &old_vals,
            TrustLevel::new(2, 3).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, VerifyError::NotEnoughTrust { tallied: 40, total: 80, .. }));
}

#[test]
fn test_commit_light_nil_votes_do_not_count() {
    let keys = keys(4, 1);
    let vals = validators(&keys, 20);

    // One block vote plus three valid nil votes, all from trusted
    // validators. Were nil votes tallied, the full 80 would carry trust;
    // only the 20 behind the block may count.
    let mut block = signed_block(5, B_TIME + HOUR, [7u8; 32], &vals, &vals, &keys, &[0], [4u8; 32]);
    for i in [1usize, 2, 3] {
        let sign_bytes =
            canonical_vote_bytes(domains::PRECOMMIT, CHAIN_ID, 5, 0, &NIL_HASH, B_TIME + HOUR);
        block.signed_header.commit.signatures[i] = CommitSig::Nil {
            validator_address: keys[i].public_key().to_address(),
            timestamp: B_TIME + HOUR,
            signature: keys[i].sign(&sign_bytes),
        };
    }

    let verifier = CommitVerifier::ed25519();
    let err = verifier
        .verify_commit_light(
            CHAIN_ID,
            &block.signed_header.commit,
            &vals,
            TrustLevel::ONE_THIRD,
        )
        .unwrap_err();
    assert!(matches!(err, VerifyError::NotEnoughTrust { tallied: 20, total: 80, .. }));
}
