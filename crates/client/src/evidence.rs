//! Fork evidence.
//!
//! When the primary and a witness present cryptographically valid light
//! blocks with different hashes at the same height, one of them is lying
//! about the canonical chain. The pair of a conflicting block and the last
//! height both providers agreed on is the evidence the client hands back to
//! providers for gossiping.

use serde::{Deserialize, Serialize};
use skiplight_types::LightBlock;

/// Proof that some provider served a block off the canonical chain.
///
/// `conflicting_block` is valid in isolation (well-formed, commit
/// verifiable); `common_height` is the trusted height both sides still
/// agreed on, which bounds where the fork started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightClientAttackEvidence {
    /// The block that diverges from the verified chain
    pub conflicting_block: LightBlock,
    /// Last height at which the providers agreed
    pub common_height: u64,
}

impl LightClientAttackEvidence {
    /// Create evidence from a conflicting block and the common height.
    pub fn new(conflicting_block: LightBlock, common_height: u64) -> Self {
        Self {
            conflicting_block,
            common_height,
        }
    }

    /// Height at which the conflict was observed.
    pub fn conflict_height(&self) -> u64 {
        self.conflicting_block.height()
    }
}

impl std::fmt::Display for LightClientAttackEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "conflicting block {} at height {} (common height {})",
            hex::encode(self.conflicting_block.hash()),
            self.conflict_height(),
            self.common_height
        )
    }
}
