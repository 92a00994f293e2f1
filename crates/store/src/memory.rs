//! In-memory trust store.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use skiplight_types::LightBlock;
use tracing::debug;

use crate::{LightStore, Result};

/// A trust store held entirely in memory.
///
/// The backing `BTreeMap` keeps heights ordered, so cursor queries are reads
/// of the map's ends. All operations take the single lock, which serializes
/// writes and gives readers a consistent snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: RwLock<BTreeMap<u64, LightBlock>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LightStore for MemoryStore {
    fn save(&self, block: &LightBlock) -> Result<()> {
        self.blocks.write().insert(block.height(), block.clone());
        Ok(())
    }

    fn get(&self, height: u64) -> Result<Option<LightBlock>> {
        Ok(self.blocks.read().get(&height).cloned())
    }

    fn delete(&self, height: u64) -> Result<()> {
        self.blocks.write().remove(&height);
        Ok(())
    }

    fn first_height(&self) -> Result<Option<u64>> {
        Ok(self.blocks.read().keys().next().copied())
    }

    fn last_height(&self) -> Result<Option<u64>> {
        Ok(self.blocks.read().keys().next_back().copied())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.blocks.read().len())
    }

    fn prune(&self, size: usize) -> Result<usize> {
        let size = size.max(1);
        let mut blocks = self.blocks.write();
        if blocks.len() <= size {
            return Ok(0);
        }

        let excess = blocks.len() - size;
        let doomed: Vec<u64> = blocks.keys().take(excess).copied().collect();
        for height in &doomed {
            blocks.remove(height);
        }

        debug!(pruned = excess, retained = size, "Pruned trust store");
        Ok(excess)
    }

    fn delete_all(&self) -> Result<()> {
        self.blocks.write().clear();
        Ok(())
    }

    fn nearest_at_or_below(&self, height: u64) -> Result<Option<LightBlock>> {
        Ok(self
            .blocks
            .read()
            .range(..=height)
            .next_back()
            .map(|(_, block)| block.clone()))
    }
}
