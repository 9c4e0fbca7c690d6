//! In-memory shared store for testing (HashMap storage)

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::{SharedStore, StoreError};

#[derive(Default)]
struct Data {
    lists: HashMap<String, Vec<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// Store that keeps lists and hashes in memory
///
/// Clones share the same data, so a test can keep a handle for inspection
/// while the gateway components own another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Data>>,
    /// Simulate an unreachable store for reads (LRANGE, HGET)
    fail_reads: Arc<AtomicBool>,
    /// Simulate an unreachable store for writes (RPUSH, LREM, HSET, HDEL)
    fail_writes: Arc<AtomicBool>,
    reads: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable read failure simulation
    pub fn set_fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Enable write failure simulation
    pub fn set_fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Number of read operations that reached the store
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write operations that reached the store
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of a whole list
    pub fn list(&self, key: &str) -> Vec<String> {
        self.data.read().lists.get(key).cloned().unwrap_or_default()
    }

    /// Replace a whole list
    pub fn seed_list(&self, key: &str, values: &[&str]) {
        self.data.write().lists.insert(
            key.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
    }

    /// Insert many hash fields at once
    pub fn seed_hash<I>(&self, key: &str, fields: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.data
            .write()
            .hashes
            .entry(key.to_string())
            .or_default()
            .extend(fields);
    }

    /// Read a hash field without going through the counters
    pub fn hash_field(&self, key: &str, field: &str) -> Option<String> {
        self.data
            .read()
            .hashes
            .get(key)
            .and_then(|h| h.get(field).cloned())
    }

    fn begin_read(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionFailed(
                "Simulated store outage".to_string(),
            ));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionFailed(
                "Simulated store outage".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve Redis-style inclusive range indices against a list length
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.begin_read()?;
        let data = self.data.read();
        let list = match data.lists.get(key) {
            Some(list) => list,
            None => return Ok(Vec::new()),
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list[from..=to].to_vec(),
            None => Vec::new(),
        })
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        self.begin_write()?;
        let mut data = self.data.write();
        let list = data.lists.entry(key.to_string()).or_default();
        list.push(value.to_string());
        Ok(list.len())
    }

    async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<usize, StoreError> {
        self.begin_write()?;
        let mut data = self.data.write();
        let list = match data.lists.get_mut(key) {
            Some(list) => list,
            None => return Ok(0),
        };

        let limit = if count == 0 {
            usize::MAX
        } else {
            count.unsigned_abs()
        };
        let mut removed = 0;
        if count >= 0 {
            list.retain(|v| {
                if removed < limit && v == value {
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        } else {
            // Negative count removes from the tail
            let mut kept: Vec<String> = Vec::with_capacity(list.len());
            for v in list.drain(..).rev() {
                if removed < limit && v == value {
                    removed += 1;
                } else {
                    kept.push(v);
                }
            }
            kept.reverse();
            *list = kept;
        }
        Ok(removed)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.begin_read()?;
        Ok(self
            .data
            .read()
            .hashes
            .get(key)
            .and_then(|h| h.get(field).cloned()))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.begin_write()?;
        self.data
            .write()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.begin_write()?;
        Ok(self
            .data
            .write()
            .hashes
            .get_mut(key)
            .map(|h| h.remove(field).is_some())
            .unwrap_or(false))
    }
}
