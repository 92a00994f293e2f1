//! Skiplight Trust Store
//!
//! Ordered persistent mapping from height to verified light block, with
//! first/last cursors, range pruning, and bulk deletion. Two
//! implementations:
//!
//! - **[`MemoryStore`]**: a lock-guarded `BTreeMap`, for tests and
//!   short-lived clients
//! - **[`DbStore`]**: a RocksDB-backed store with column families for blocks
//!   and cursor metadata
//!
//! Height gaps are normal: skipping verification only stores the blocks it
//! actually traversed.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod db;
pub mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

use skiplight_types::LightBlock;
use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database error
    #[error("database error: {0}")]
    Database(String),

    /// A stored entry failed to decode
    #[error("corrupt entry at height {height}: {reason}")]
    Corrupt {
        /// Height of the undecodable entry
        height: u64,
        /// Decoder failure
        reason: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// An ordered store of verified light blocks, keyed by height.
///
/// Implementations serialize writes internally; every method is atomic from
/// the caller's perspective. There are no duplicate heights: `save` on an
/// existing height replaces the entry.
pub trait LightStore: Send + Sync {
    /// Insert or replace the block at its height.
    fn save(&self, block: &LightBlock) -> Result<()>;

    /// Fetch the block at a height, or `None`.
    fn get(&self, height: u64) -> Result<Option<LightBlock>>;

    /// Remove the block at a height. Removing a missing height is a no-op.
    fn delete(&self, height: u64) -> Result<()>;

    /// Lowest stored height, or `None` when empty.
    fn first_height(&self) -> Result<Option<u64>>;

    /// Highest stored height, or `None` when empty.
    fn last_height(&self) -> Result<Option<u64>>;

    /// Number of stored blocks.
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no blocks.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete all but the `size` most recent entries. `size` is clamped to
    /// a minimum of 1, so the most recent block always survives. Returns
    /// the number of deleted entries.
    fn prune(&self, size: usize) -> Result<usize>;

    /// Delete every entry.
    fn delete_all(&self) -> Result<()>;

    /// Fetch the block at the lowest stored height.
    fn first(&self) -> Result<Option<LightBlock>> {
        match self.first_height()? {
            Some(height) => self.get(height),
            None => Ok(None),
        }
    }

    /// Fetch the block at the highest stored height.
    fn last(&self) -> Result<Option<LightBlock>> {
        match self.last_height()? {
            Some(height) => self.get(height),
            None => Ok(None),
        }
    }

    /// Highest stored height at or below `height`, together with its block.
    ///
    /// This is the anchor-selection query: forward verification starts from
    /// the closest trusted block under the target.
    fn nearest_at_or_below(&self, height: u64) -> Result<Option<LightBlock>>;
}
