//! Light block providers.
//!
//! A provider is a remote source of light blocks: a full node, an RPC
//! gateway, anything that can answer "give me the block at height h". The
//! client treats providers as stateless, idempotent callees and talks to one
//! primary plus any number of cross-checking witnesses through this trait.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use skiplight_types::LightBlock;

use crate::evidence::LightClientAttackEvidence;

/// Height argument meaning "the provider's latest block".
pub const LATEST_HEIGHT: u64 = 0;

/// Errors a provider can surface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider does not have the requested block
    #[error("light block not found")]
    NotFound,

    /// The provider did not answer within the deadline
    #[error("provider did not respond")]
    NoResponse,

    /// The provider answered with a block that fails basic validation
    #[error("bad light block: {0}")]
    BadBlock(String),
}

/// A remote source of light blocks.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identity of this provider, used for logging and for telling
    /// duplicate registrations apart.
    fn id(&self) -> &str;

    /// Fetch the light block at `height`, or the latest block when `height`
    /// is [`LATEST_HEIGHT`].
    async fn light_block(&self, height: u64) -> Result<LightBlock, ProviderError>;

    /// Hand the provider evidence of a light-client attack so it can gossip
    /// it to the network.
    async fn report_evidence(
        &self,
        evidence: LightClientAttackEvidence,
    ) -> Result<(), ProviderError>;
}

/// A scripted, recording provider for tests.
///
/// Serves blocks from a height-keyed script, optionally overridden per
/// height by scripted errors or by a blanket error (a "dead" provider).
/// Every request and every received piece of evidence is recorded so tests
/// can assert on fetch counts and evidence routing.
#[derive(Default)]
pub struct MockProvider {
    id: String,
    blocks: RwLock<BTreeMap<u64, LightBlock>>,
    errors: RwLock<HashMap<u64, ProviderError>>,
    default_error: Option<ProviderError>,
    requests: RwLock<Vec<u64>>,
    evidence: RwLock<Vec<LightClientAttackEvidence>>,
}

impl MockProvider {
    /// Create an empty mock provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Create a mock provider pre-loaded with blocks.
    pub fn with_blocks(id: impl Into<String>, blocks: impl IntoIterator<Item = LightBlock>) -> Self {
        let provider = Self::new(id);
        for block in blocks {
            provider.add_block(block);
        }
        provider
    }

    /// Create a provider that answers every request with `error`.
    pub fn failing(id: impl Into<String>, error: ProviderError) -> Self {
        Self {
            id: id.into(),
            default_error: Some(error),
            ..Self::default()
        }
    }

    /// Add a block to the script.
    pub fn add_block(&self, block: LightBlock) {
        self.blocks.write().insert(block.height(), block);
    }

    /// Script an error for a specific height.
    pub fn set_error(&self, height: u64, error: ProviderError) {
        self.errors.write().insert(height, error);
    }

    /// Heights requested so far, in order.
    pub fn requests(&self) -> Vec<u64> {
        self.requests.read().clone()
    }

    /// Evidence received so far.
    pub fn received_evidence(&self) -> Vec<LightClientAttackEvidence> {
        self.evidence.read().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn light_block(&self, height: u64) -> Result<LightBlock, ProviderError> {
        self.requests.write().push(height);

        if let Some(error) = &self.default_error {
            return Err(error.clone());
        }
        if let Some(error) = self.errors.read().get(&height) {
            return Err(error.clone());
        }

        let blocks = self.blocks.read();
        let block = if height == LATEST_HEIGHT {
            blocks.values().next_back()
        } else {
            blocks.get(&height)
        };
        block.cloned().ok_or(ProviderError::NotFound)
    }

    async fn report_evidence(
        &self,
        evidence: LightClientAttackEvidence,
    ) -> Result<(), ProviderError> {
        if let Some(error) = &self.default_error {
            return Err(error.clone());
        }
        self.evidence.write().push(evidence);
        Ok(())
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
