//! The light client orchestrator.
//!
//! Owns the trust store, one primary provider, and the witness list. Drives
//! the verification algorithms, cross-references every verified hop against
//! the witnesses, rotates the primary away when it misbehaves, and prunes
//! the store as trust advances.
//!
//! Mutating operations (`verify_light_block_at_height`, `update`,
//! `cleanup`) are serialized by one coarse lock. Read accessors take
//! short-lived snapshots and are safe to call concurrently with anything.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use skiplight_store::LightStore;
use skiplight_types::{LightBlock, TrustLevel, TrustOptions};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::evidence::LightClientAttackEvidence;
use crate::provider::{Provider, ProviderError, LATEST_HEIGHT};
use crate::verify::{
    verify_adjacent, verify_non_adjacent, CommitVerifier, VerificationOptions, VerifyError,
};
use crate::{Error, Result};

/// Decides whether stored trusted state may be thrown away when it disagrees
/// with freshly supplied trust options. Receives the newest stored block and
/// the options; returning `true` wipes the store and re-anchors.
pub type ConfirmationFn = Arc<dyn Fn(&LightBlock, &TrustOptions) -> bool + Send + Sync>;

/// How trust is extended towards a target height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMode {
    /// Verify every height with the adjacent predicate
    Sequential,
    /// Bisect over height gaps using validator-set overlap at the given
    /// trust level
    Skipping(TrustLevel),
}

impl Default for VerificationMode {
    fn default() -> Self {
        VerificationMode::Skipping(TrustLevel::ONE_THIRD)
    }
}

impl std::fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationMode::Sequential => write!(f, "sequential"),
            VerificationMode::Skipping(level) => write!(f, "skipping({level})"),
        }
    }
}

/// Client configuration.
#[derive(Clone)]
pub struct ClientOptions {
    /// Verification mode
    pub mode: VerificationMode,
    /// Maximum primary rotations per operation
    pub max_retry_attempts: u32,
    /// Tolerated clock skew against block producers, in ms
    pub clock_drift: u64,
    /// Number of most recent blocks the store keeps after pruning
    pub pruning_size: usize,
    /// Deadline for every provider call
    pub request_timeout: Duration,
    /// Consecutive misses before a witness is dropped
    pub witness_failure_budget: u32,
    /// Callback deciding whether to overwrite disagreeing stored state
    pub confirmation: ConfirmationFn,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            mode: VerificationMode::default(),
            max_retry_attempts: 10,
            clock_drift: 10_000,
            pruning_size: 1_000,
            request_timeout: Duration::from_secs(10),
            witness_failure_budget: 3,
            // Refusing keeps whatever the store already trusts.
            confirmation: Arc::new(|_, _| false),
        }
    }
}

impl ClientOptions {
    fn validate(&self) -> Result<()> {
        if let VerificationMode::Skipping(level) = self.mode {
            level.validate()?;
        }
        if self.pruning_size == 0 {
            return Err(Error::InvalidOptions("pruning size must be at least 1".into()));
        }
        Ok(())
    }

    fn verification_options(&self, trusting_period: u64) -> VerificationOptions {
        let trust_level = match self.mode {
            VerificationMode::Skipping(level) => level,
            VerificationMode::Sequential => TrustLevel::ONE_THIRD,
        };
        VerificationOptions {
            trusting_period,
            clock_drift: self.clock_drift,
            trust_level,
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("mode", &self.mode)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .field("clock_drift", &self.clock_drift)
            .field("pruning_size", &self.pruning_size)
            .field("request_timeout", &self.request_timeout)
            .field("witness_failure_budget", &self.witness_failure_budget)
            .finish_non_exhaustive()
    }
}

/// A cross-checking provider plus its consecutive-miss counter.
struct Witness {
    provider: Arc<dyn Provider>,
    failures: u32,
}

/// The light client.
pub struct Client {
    chain_id: String,
    trusting_period: u64,
    options: ClientOptions,
    verifier: CommitVerifier,
    store: Arc<dyn LightStore>,
    primary: RwLock<Arc<dyn Provider>>,
    witnesses: RwLock<Vec<Witness>>,
    /// Serializes mutating operations.
    op_lock: Mutex<()>,
    cancelled: RwLock<bool>,
}

impl Client {
    /// Create a client anchored by trust options.
    ///
    /// Trust is seeded from the store when it already holds the anchor;
    /// otherwise the anchor is fetched from the primary, commit-verified,
    /// cross-referenced against every witness, and stored. A store that
    /// disagrees with the options is kept unless the confirmation callback
    /// approves wiping it.
    pub async fn new(
        chain_id: impl Into<String>,
        trust_options: TrustOptions,
        primary: Arc<dyn Provider>,
        witnesses: Vec<Arc<dyn Provider>>,
        store: Arc<dyn LightStore>,
        options: ClientOptions,
    ) -> Result<Self> {
        trust_options.validate()?;
        options.validate()?;

        let client = Self::assemble(
            chain_id.into(),
            trust_options.period,
            primary,
            witnesses,
            store,
            options,
        );
        client.seed_trust(&trust_options).await?;
        Ok(client)
    }

    /// Create a client that trusts whatever the store already holds.
    ///
    /// Fails with [`Error::TrustStoreEmpty`] when there is nothing to trust.
    pub async fn from_trusted_store(
        chain_id: impl Into<String>,
        trusting_period: u64,
        primary: Arc<dyn Provider>,
        witnesses: Vec<Arc<dyn Provider>>,
        store: Arc<dyn LightStore>,
        options: ClientOptions,
    ) -> Result<Self> {
        if trusting_period == 0 {
            return Err(Error::InvalidOptions("trusting period must be positive".into()));
        }
        options.validate()?;

        let client = Self::assemble(
            chain_id.into(),
            trusting_period,
            primary,
            witnesses,
            store,
            options,
        );
        if client.store.is_empty()? {
            return Err(Error::TrustStoreEmpty);
        }
        Ok(client)
    }

    fn assemble(
        chain_id: String,
        trusting_period: u64,
        primary: Arc<dyn Provider>,
        witnesses: Vec<Arc<dyn Provider>>,
        store: Arc<dyn LightStore>,
        options: ClientOptions,
    ) -> Self {
        if witnesses.is_empty() {
            warn!("No witnesses configured; verification will fail cross-referencing");
        }
        let mut ids: Vec<&str> = witnesses.iter().map(|w| w.id()).collect();
        ids.push(primary.id());
        ids.sort_unstable();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                // Duplicates are counted, not deduplicated; silently merging
                // them could hide a misconfiguration.
                warn!(provider = pair[0], "Provider registered more than once");
            }
        }

        info!(
            chain_id = %chain_id,
            primary = primary.id(),
            witnesses = witnesses.len(),
            mode = %options.mode,
            "Creating light client"
        );

        Self {
            chain_id,
            trusting_period,
            options,
            verifier: CommitVerifier::ed25519(),
            store,
            primary: RwLock::new(primary),
            witnesses: RwLock::new(
                witnesses
                    .into_iter()
                    .map(|provider| Witness {
                        provider,
                        failures: 0,
                    })
                    .collect(),
            ),
            op_lock: Mutex::new(()),
            cancelled: RwLock::new(false),
        }
    }

    async fn seed_trust(&self, trust_options: &TrustOptions) -> Result<()> {
        if let Some(block) = self.store.get(trust_options.height)? {
            if block.hash() == trust_options.hash {
                info!(height = trust_options.height, "Reusing trusted state from the store");
                return Ok(());
            }
        }

        let Some(stored) = self.store.last()? else {
            return self.fetch_anchor(trust_options).await;
        };

        // Stored trust disagrees with the options; the confirmation
        // callback decides which one wins.
        if (self.options.confirmation)(&stored, trust_options) {
            info!(
                stored_height = stored.height(),
                anchor_height = trust_options.height,
                "Superseding stored trusted state"
            );
            self.store.delete_all()?;
            self.fetch_anchor(trust_options).await
        } else {
            warn!(
                stored_height = stored.height(),
                anchor_height = trust_options.height,
                "Stored state disagrees with trust options; keeping the store"
            );
            Ok(())
        }
    }

    async fn fetch_anchor(&self, trust_options: &TrustOptions) -> Result<()> {
        let anchor = self.fetch_from_primary(trust_options.height).await?;
        if anchor.hash() != trust_options.hash {
            return Err(Error::Provider {
                provider: self.primary_id(),
                source: ProviderError::BadBlock(format!(
                    "anchor at height {} hashes to {}, expected {}",
                    trust_options.height,
                    hex::encode(anchor.hash()),
                    hex::encode(trust_options.hash)
                )),
            });
        }
        self.verifier.verify_commit_full(
            &self.chain_id,
            &anchor.signed_header.commit,
            &anchor.validators,
        )?;
        self.cross_reference(&anchor, trust_options.height).await?;
        self.store.save(&anchor)?;

        info!(
            height = anchor.height(),
            hash = %hex::encode(anchor.hash()),
            "Trust anchored"
        );
        Ok(())
    }

    /// The chain this client follows.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The current primary provider.
    pub fn primary(&self) -> Arc<dyn Provider> {
        self.primary.read().clone()
    }

    /// Identity of the current primary provider.
    pub fn primary_id(&self) -> String {
        self.primary.read().id().to_string()
    }

    /// The current witnesses, in order.
    pub fn witnesses(&self) -> Vec<Arc<dyn Provider>> {
        self.witnesses
            .read()
            .iter()
            .map(|w| w.provider.clone())
            .collect()
    }

    /// Identities of the current witnesses, in order.
    pub fn witness_ids(&self) -> Vec<String> {
        self.witnesses
            .read()
            .iter()
            .map(|w| w.provider.id().to_string())
            .collect()
    }

    /// Lowest trusted height, if any.
    pub fn first_trusted_height(&self) -> Result<Option<u64>> {
        Ok(self.store.first_height()?)
    }

    /// Highest trusted height, if any.
    pub fn last_trusted_height(&self) -> Result<Option<u64>> {
        Ok(self.store.last_height()?)
    }

    /// The stored light block at `height`, if present.
    pub fn trusted_light_block(&self, height: u64) -> Result<Option<LightBlock>> {
        Ok(self.store.get(height)?)
    }

    /// Register another witness. Duplicates are allowed and counted.
    pub fn add_provider(&self, provider: Arc<dyn Provider>) {
        let primary_id = self.primary.read().id().to_string();
        let mut witnesses = self.witnesses.write();
        if primary_id == provider.id()
            || witnesses.iter().any(|w| w.provider.id() == provider.id())
        {
            warn!(provider = provider.id(), "Provider registered more than once");
        }
        witnesses.push(Witness {
            provider,
            failures: 0,
        });
    }

    /// Delete every trusted block. The next operation needs a re-anchor.
    pub async fn cleanup(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        info!("Removing all trusted state");
        self.store.delete_all()?;
        Ok(())
    }

    /// Cancel in-flight verification. The flag is re-armed by the next
    /// operation.
    pub fn cancel(&self) {
        *self.cancelled.write() = true;
    }

    fn reset_cancel(&self) {
        *self.cancelled.write() = false;
    }

    fn check_cancelled(&self) -> Result<()> {
        if *self.cancelled.read() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Fetch the latest block from the primary and, if it is ahead of the
    /// last trusted height, verify up to it. Returns `None` when there is
    /// no progress to make.
    pub async fn update(&self, now: u64) -> Result<Option<LightBlock>> {
        let _guard = self.op_lock.lock().await;
        self.reset_cancel();

        let last = self.store.last()?.ok_or(Error::TrustStoreEmpty)?;
        let latest = self.fetch_from_primary(LATEST_HEIGHT).await?;

        if latest.height() <= last.height() {
            debug!(
                latest = latest.height(),
                trusted = last.height(),
                "Primary has nothing newer"
            );
            return Ok(None);
        }

        let verified = match self.options.mode {
            VerificationMode::Sequential => {
                self.verify_sequential(last, latest.height(), now).await?
            }
            VerificationMode::Skipping(_) => self.verify_skipping(last, latest, now).await?,
        };
        Ok(Some(verified))
    }

    /// Verify and return the light block at `height`, fetching and checking
    /// whatever intermediate blocks the algorithm needs.
    ///
    /// Already-verified heights are served straight from the store without
    /// touching any provider.
    pub async fn verify_light_block_at_height(&self, height: u64, now: u64) -> Result<LightBlock> {
        if height == 0 {
            return Err(Error::ZeroHeight);
        }

        let _guard = self.op_lock.lock().await;
        self.reset_cancel();

        if let Some(block) = self.store.get(height)? {
            debug!(height, "Serving verified block from the store");
            return Ok(block);
        }

        let first = self.store.first()?.ok_or(Error::TrustStoreEmpty)?;
        if height < first.height() {
            return self.verify_backwards(first, height, now).await;
        }

        // Forward verification anchors at the closest trusted block below
        // the target; a miss above means such a block always exists.
        let anchor = self
            .store
            .nearest_at_or_below(height)?
            .ok_or(Error::TrustStoreEmpty)?;

        match self.options.mode {
            VerificationMode::Sequential => self.verify_sequential(anchor, height, now).await,
            VerificationMode::Skipping(_) => {
                let target = self.fetch_from_primary(height).await?;
                self.verify_skipping(anchor, target, now).await
            }
        }
    }

    /// Adjacent hops all the way from `trusted` to `target_height`.
    async fn verify_sequential(
        &self,
        mut trusted: LightBlock,
        target_height: u64,
        now: u64,
    ) -> Result<LightBlock> {
        let options = self.options.verification_options(self.trusting_period);

        while trusted.height() < target_height {
            self.check_cancelled()?;

            let next = self.fetch_from_primary(trusted.height() + 1).await?;
            verify_adjacent(&self.verifier, &trusted, &next, &options, now)?;
            self.cross_reference(&next, trusted.height()).await?;
            self.save_verified(&next)?;

            debug!(height = next.height(), "Verified adjacent hop");
            trusted = next;
        }
        Ok(trusted)
    }

    /// Bisection from `trusted` to the already-fetched `target`.
    ///
    /// Runs the recursion iteratively with an explicit stack of pending
    /// blocks, which bounds call depth and gives a cancellation checkpoint
    /// at every pivot. Store writes happen in strictly increasing height
    /// order; the number of pivots is logarithmic in the height gap.
    async fn verify_skipping(
        &self,
        mut trusted: LightBlock,
        target: LightBlock,
        now: u64,
    ) -> Result<LightBlock> {
        let options = self.options.verification_options(self.trusting_period);
        let mut pending: Vec<LightBlock> = Vec::new();
        let mut current = target;

        loop {
            self.check_cancelled()?;

            let verdict = if current.height() == trusted.height() + 1 {
                verify_adjacent(&self.verifier, &trusted, &current, &options, now)
            } else {
                verify_non_adjacent(&self.verifier, &trusted, &current, &options, now)
            };

            match verdict {
                Ok(()) => {
                    self.cross_reference(&current, trusted.height()).await?;
                    self.save_verified(&current)?;
                    debug!(height = current.height(), "Verified hop");

                    trusted = current;
                    match pending.pop() {
                        Some(next) => current = next,
                        None => return Ok(trusted),
                    }
                }
                Err(VerifyError::NotEnoughTrust { .. }) => {
                    let pivot = (trusted.height() + current.height()) / 2;
                    debug!(
                        trusted = trusted.height(),
                        candidate = current.height(),
                        pivot,
                        "Not enough trust, bisecting"
                    );
                    let pivot_block = self.fetch_from_primary(pivot).await?;
                    pending.push(current);
                    current = pivot_block;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Hash-chain from the earliest trusted block down to `target_height`.
    ///
    /// Quorums below the earliest trusted height prove nothing extra: each
    /// parent is pinned by its child's `last_block_hash`. The trusting
    /// period is checked once against the earliest trusted block.
    async fn verify_backwards(
        &self,
        earliest: LightBlock,
        target_height: u64,
        now: u64,
    ) -> Result<LightBlock> {
        if earliest.time().saturating_add(self.trusting_period) <= now {
            return Err(VerifyError::OldHeaderExpired {
                trusted_at: earliest.time(),
                now,
            }
            .into());
        }

        let mut cursor = earliest;
        while cursor.height() > target_height {
            self.check_cancelled()?;

            let parent = self.fetch_from_primary(cursor.height() - 1).await?;
            if parent.hash() != cursor.signed_header.header.last_block_hash {
                return Err(VerifyError::InvalidHeader(format!(
                    "header at height {} does not hash-link from height {}",
                    parent.height(),
                    cursor.height()
                ))
                .into());
            }
            if parent.time() >= cursor.time() {
                return Err(VerifyError::NonMonotonicBftTime {
                    new_time: parent.time(),
                    trusted_time: cursor.time(),
                }
                .into());
            }

            debug!(height = parent.height(), "Verified hash link backwards");
            cursor = parent;
        }

        self.store.save(&cursor)?;
        info!(height = cursor.height(), "Verified block backwards");
        Ok(cursor)
    }

    fn save_verified(&self, block: &LightBlock) -> Result<()> {
        self.store.save(block)?;
        self.store.prune(self.options.pruning_size)?;
        Ok(())
    }

    /// Fetch a validated block from the primary, rotating to a witness when
    /// the primary cannot serve the request.
    async fn fetch_from_primary(&self, height: u64) -> Result<LightBlock> {
        self.check_cancelled()?;

        let primary = self.primary.read().clone();
        let error = match self.fetch_checked(&primary, height).await {
            Ok(block) => return Ok(block),
            Err(error) => error,
        };
        warn!(
            provider = primary.id(),
            height,
            %error,
            "Primary fetch failed, rotating to a witness"
        );

        let candidates: Vec<Arc<dyn Provider>> = self
            .witnesses
            .read()
            .iter()
            .map(|w| w.provider.clone())
            .collect();

        let mut attempts = 0u32;
        for candidate in candidates {
            if attempts >= self.options.max_retry_attempts {
                break;
            }
            attempts += 1;
            self.check_cancelled()?;

            match self.fetch_checked(&candidate, height).await {
                Ok(block) => {
                    self.install_primary(&candidate);
                    return Ok(block);
                }
                Err(probe_error) => {
                    debug!(
                        witness = candidate.id(),
                        height,
                        error = %probe_error,
                        "Witness cannot serve the height"
                    );
                    self.note_witness_failure(
                        candidate.id(),
                        matches!(probe_error, ProviderError::BadBlock(_)),
                    );
                }
            }
        }

        Err(Error::Provider {
            provider: primary.id().to_string(),
            source: error,
        })
    }

    /// One provider call, bounded by the request timeout, with basic
    /// validation of whatever comes back.
    async fn fetch_checked(
        &self,
        provider: &Arc<dyn Provider>,
        height: u64,
    ) -> std::result::Result<LightBlock, ProviderError> {
        let response =
            tokio::time::timeout(self.options.request_timeout, provider.light_block(height)).await;
        let block = match response {
            Ok(Ok(block)) => block,
            Ok(Err(error)) => return Err(error),
            Err(_) => return Err(ProviderError::NoResponse),
        };

        if height != LATEST_HEIGHT && block.height() != height {
            return Err(ProviderError::BadBlock(format!(
                "asked for height {height}, got {}",
                block.height()
            )));
        }
        block
            .validate_basic(&self.chain_id)
            .map_err(|e| ProviderError::BadBlock(e.to_string()))?;
        Ok(block)
    }

    fn install_primary(&self, candidate: &Arc<dyn Provider>) {
        let old = {
            let mut primary = self.primary.write();
            std::mem::replace(&mut *primary, candidate.clone())
        };
        let mut witnesses = self.witnesses.write();
        if let Some(pos) = witnesses
            .iter()
            .position(|w| w.provider.id() == candidate.id())
        {
            witnesses.remove(pos);
        }
        info!(
            new_primary = candidate.id(),
            old_primary = old.id(),
            "Promoted witness to primary"
        );
    }

    fn note_witness_failure(&self, id: &str, malformed: bool) {
        let mut witnesses = self.witnesses.write();
        let Some(pos) = witnesses.iter().position(|w| w.provider.id() == id) else {
            return;
        };
        if malformed {
            warn!(witness = id, "Removing witness after a malformed response");
            witnesses.remove(pos);
            return;
        }
        witnesses[pos].failures += 1;
        if witnesses[pos].failures >= self.options.witness_failure_budget {
            warn!(
                witness = id,
                failures = witnesses[pos].failures,
                "Removing witness after repeated misses"
            );
            witnesses.remove(pos);
        }
    }

    fn reset_witness_failures(&self, id: &str) {
        let mut witnesses = self.witnesses.write();
        if let Some(witness) = witnesses.iter_mut().find(|w| w.provider.id() == id) {
            witness.failures = 0;
        }
    }

    fn remove_witness(&self, id: &str) {
        let mut witnesses = self.witnesses.write();
        if let Some(pos) = witnesses.iter().position(|w| w.provider.id() == id) {
            witnesses.remove(pos);
        }
    }

    /// Ask every witness about a freshly verified block.
    ///
    /// A witness agreeing keeps its place; one presenting a verifiable
    /// conflicting block proves a fork; misses consume the failure budget;
    /// malformed answers expel the witness at once. At least one witness
    /// must confirm, or the hop fails.
    async fn cross_reference(&self, block: &LightBlock, common_height: u64) -> Result<()> {
        let height = block.height();
        let snapshot: Vec<Arc<dyn Provider>> = self
            .witnesses
            .read()
            .iter()
            .map(|w| w.provider.clone())
            .collect();
        if snapshot.is_empty() {
            return Err(Error::NoWitnesses);
        }

        let mut confirmed = 0usize;
        for witness in snapshot {
            self.check_cancelled()?;

            let response =
                tokio::time::timeout(self.options.request_timeout, witness.light_block(height))
                    .await;
            match response {
                Err(_) | Ok(Err(ProviderError::NoResponse)) | Ok(Err(ProviderError::NotFound)) => {
                    debug!(witness = witness.id(), height, "Witness missed the block");
                    self.note_witness_failure(witness.id(), false);
                }
                Ok(Err(ProviderError::BadBlock(reason))) => {
                    warn!(witness = witness.id(), %reason, "Witness returned a bad block");
                    self.note_witness_failure(witness.id(), true);
                }
                Ok(Ok(candidate)) => {
                    if candidate.hash() == block.hash() {
                        confirmed += 1;
                        self.reset_witness_failures(witness.id());
                    } else if self.is_verifiable_conflict(&candidate, height) {
                        return Err(self
                            .handle_fork(block, candidate, common_height, &witness)
                            .await);
                    } else {
                        warn!(
                            witness = witness.id(),
                            height,
                            "Witness served an unverifiable conflicting block"
                        );
                        self.note_witness_failure(witness.id(), true);
                    }
                }
            }
        }

        if confirmed == 0 {
            return Err(Error::FailedHeaderCrossReferencing { height });
        }
        debug!(height, confirmed, "Cross-referenced verified block");
        Ok(())
    }

    /// A conflicting block only evidences a fork if it would verify on its
    /// own; anything less is just a broken witness.
    fn is_verifiable_conflict(&self, candidate: &LightBlock, height: u64) -> bool {
        candidate.height() == height
            && candidate.validate_basic(&self.chain_id).is_ok()
            && self
                .verifier
                .verify_commit_full(
                    &self.chain_id,
                    &candidate.signed_header.commit,
                    &candidate.validators,
                )
                .is_ok()
    }

    /// Two verifiable blocks at one height: report evidence both ways,
    /// expel the witness, and surface the attack.
    async fn handle_fork(
        &self,
        our_block: &LightBlock,
        conflicting: LightBlock,
        common_height: u64,
        witness: &Arc<dyn Provider>,
    ) -> Error {
        let witness_id = witness.id().to_string();
        warn!(
            witness = %witness_id,
            height = conflicting.height(),
            "Conflicting verifiable block; light client attack"
        );

        let against_witness = LightClientAttackEvidence::new(conflicting, common_height);
        let against_primary = LightClientAttackEvidence::new(our_block.clone(), common_height);

        let primary = self.primary.read().clone();
        if let Err(error) = primary.report_evidence(against_witness.clone()).await {
            warn!(provider = primary.id(), %error, "Failed to report evidence to the primary");
        }
        if let Err(error) = witness.report_evidence(against_primary).await {
            warn!(provider = %witness_id, %error, "Failed to report evidence to the witness");
        }

        self.remove_witness(&witness_id);

        Error::LightClientAttack {
            evidence: against_witness,
            witness: witness_id,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("chain_id", &self.chain_id)
            .field("trusting_period", &self.trusting_period)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
