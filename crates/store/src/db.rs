//! RocksDB-backed trust store.
//!
//! Light blocks live in their own column family keyed by big-endian height,
//! so the key order is the height order and cursor queries are iterator
//! seeks. A metadata column family carries the first/last cursor record.
//! Every mutation goes through a single write batch: the block write and the
//! cursor update land together or not at all.

use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatchWithTransaction,
};
use serde::{Deserialize, Serialize};
use skiplight_types::LightBlock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{LightStore, Result, StoreError};

/// Column family names
pub mod cf {
    /// Light blocks keyed by big-endian height
    pub const LIGHT_BLOCKS: &str = "light_blocks";
    /// Store metadata (the first/last cursor record)
    pub const META: &str = "meta";

    /// All column families
    pub const ALL: &[&str] = &[LIGHT_BLOCKS, META];
}

/// Key of the cursor record inside the meta column family.
const CURSOR_KEY: &[u8] = b"cursors";

/// First/last height cursors plus the entry count.
///
/// Redundant with the block column family (and rebuilt from it on open), but
/// keeps cursor reads constant-time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct CursorRecord {
    first: Option<u64>,
    last: Option<u64>,
    len: u64,
}

fn encode_height(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

fn decode_height(key: &[u8]) -> Option<u64> {
    key.try_into().ok().map(u64::from_be_bytes)
}

/// A durable trust store backed by RocksDB.
pub struct DbStore {
    inner: DBWithThreadMode<MultiThreaded>,
    /// Serializes read-modify-write cycles on the cursor record.
    write_lock: Mutex<()>,
}

impl DbStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = cf::ALL
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            path.as_ref(),
            cf_descriptors,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            inner: db,
            write_lock: Mutex::new(()),
        };

        // The cursor record can be stale after a crash; the block column
        // family is authoritative, so rebuild from it.
        let cursors = store.scan_cursors(None)?;
        store.put_cursors(&cursors)?;

        info!(
            first = ?cursors.first,
            last = ?cursors.last,
            blocks = cursors.len,
            "Opened trust store"
        );

        Ok(store)
    }

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.inner
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("missing column family {name}")))
    }

    fn cursors(&self) -> Result<CursorRecord> {
        let meta = self.cf_handle(cf::META)?;
        let raw = self
            .inner
            .get_cf(&meta, CURSOR_KEY)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        match raw {
            Some(bytes) => serde_json::from_slice(&bytes).or_else(|e| {
                warn!(error = %e, "Cursor record undecodable, rebuilding from blocks");
                self.scan_cursors(None)
            }),
            None => Ok(CursorRecord::default()),
        }
    }

    fn put_cursors(&self, cursors: &CursorRecord) -> Result<()> {
        let meta = self.cf_handle(cf::META)?;
        let bytes =
            serde_json::to_vec(cursors).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.inner
            .put_cf(&meta, CURSOR_KEY, bytes)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Walk the block keys and recompute the cursor record, optionally
    /// pretending one height is already gone.
    fn scan_cursors(&self, excluding: Option<u64>) -> Result<CursorRecord> {
        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let mut cursors = CursorRecord::default();
        for item in self.inner.iterator_cf(&blocks, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let Some(height) = decode_height(&key) else {
                continue;
            };
            if Some(height) == excluding {
                continue;
            }
            cursors.first = Some(cursors.first.map_or(height, |f| f.min(height)));
            cursors.last = Some(cursors.last.map_or(height, |l| l.max(height)));
            cursors.len += 1;
        }
        Ok(cursors)
    }

    fn write_batch(&self, batch: WriteBatchWithTransaction<false>) -> Result<()> {
        self.inner
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn decode_block(height: u64, bytes: &[u8]) -> Result<LightBlock> {
        // serde ignores unknown fields, so entries written by newer
        // versions with extra fields still decode.
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
            height,
            reason: e.to_string(),
        })
    }
}

impl LightStore for DbStore {
    fn save(&self, block: &LightBlock) -> Result<()> {
        let _guard = self.write_lock.lock();

        let height = block.height();
        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let meta = self.cf_handle(cf::META)?;

        let existed = self
            .inner
            .get_cf(&blocks, encode_height(height))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        let mut cursors = self.cursors()?;
        if !existed {
            cursors.len += 1;
        }
        cursors.first = Some(cursors.first.map_or(height, |f| f.min(height)));
        cursors.last = Some(cursors.last.map_or(height, |l| l.max(height)));

        let value =
            serde_json::to_vec(block).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let cursor_bytes =
            serde_json::to_vec(&cursors).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut batch = WriteBatchWithTransaction::<false>::default();
        batch.put_cf(&blocks, encode_height(height), value);
        batch.put_cf(&meta, CURSOR_KEY, cursor_bytes);
        self.write_batch(batch)?;

        debug!(height, "Saved light block");
        Ok(())
    }

    fn get(&self, height: u64) -> Result<Option<LightBlock>> {
        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let raw = self
            .inner
            .get_cf(&blocks, encode_height(height))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        raw.map(|bytes| Self::decode_block(height, &bytes)).transpose()
    }

    fn delete(&self, height: u64) -> Result<()> {
        let _guard = self.write_lock.lock();

        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let meta = self.cf_handle(cf::META)?;

        let existed = self
            .inner
            .get_cf(&blocks, encode_height(height))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if !existed {
            return Ok(());
        }

        let mut cursors = self.cursors()?;
        if cursors.first == Some(height) || cursors.last == Some(height) {
            cursors = self.scan_cursors(Some(height))?;
        } else {
            cursors.len = cursors.len.saturating_sub(1);
        }

        let cursor_bytes =
            serde_json::to_vec(&cursors).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut batch = WriteBatchWithTransaction::<false>::default();
        batch.delete_cf(&blocks, encode_height(height));
        batch.put_cf(&meta, CURSOR_KEY, cursor_bytes);
        self.write_batch(batch)
    }

    fn first_height(&self) -> Result<Option<u64>> {
        Ok(self.cursors()?.first)
    }

    fn last_height(&self) -> Result<Option<u64>> {
        Ok(self.cursors()?.last)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.cursors()?.len as usize)
    }

    fn prune(&self, size: usize) -> Result<usize> {
        let size = size.max(1);
        let _guard = self.write_lock.lock();

        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let meta = self.cf_handle(cf::META)?;

        let mut heights = Vec::new();
        for item in self.inner.iterator_cf(&blocks, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if let Some(height) = decode_height(&key) {
                heights.push(height);
            }
        }

        if heights.len() <= size {
            return Ok(0);
        }
        let excess = heights.len() - size;

        let cursors = CursorRecord {
            first: heights.get(excess).copied(),
            last: heights.last().copied(),
            len: size as u64,
        };
        let cursor_bytes =
            serde_json::to_vec(&cursors).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut batch = WriteBatchWithTransaction::<false>::default();
        for height in &heights[..excess] {
            batch.delete_cf(&blocks, encode_height(*height));
        }
        batch.put_cf(&meta, CURSOR_KEY, cursor_bytes);
        self.write_batch(batch)?;

        debug!(pruned = excess, retained = size, "Pruned trust store");
        Ok(excess)
    }

    fn delete_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock();

        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let meta = self.cf_handle(cf::META)?;

        let mut batch = WriteBatchWithTransaction::<false>::default();
        for item in self.inner.iterator_cf(&blocks, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            batch.delete_cf(&blocks, key);
        }
        let cursor_bytes = serde_json::to_vec(&CursorRecord::default())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        batch.put_cf(&meta, CURSOR_KEY, cursor_bytes);
        self.write_batch(batch)
    }

    fn nearest_at_or_below(&self, height: u64) -> Result<Option<LightBlock>> {
        let blocks = self.cf_handle(cf::LIGHT_BLOCKS)?;
        let key = encode_height(height);
        let mode = IteratorMode::From(&key, Direction::Reverse);
        for item in self.inner.iterator_cf(&blocks, mode) {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let Some(found) = decode_height(&key) else {
                continue;
            };
            if found > height {
                // Reverse iteration from a missing key can land one past it.
                continue;
            }
            return Self::decode_block(found, &value).map(Some);
        }
        Ok(None)
    }
}

impl std::fmt::Debug for DbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbStore").finish_non_exhaustive()
    }
}
