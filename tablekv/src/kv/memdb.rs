//! Ordered in-memory key/value store.
//!
//! Committed data lives in a `BTreeMap` behind an `Arc<RwLock<..>>`. Each
//! transaction reads from a snapshot taken at `begin` with its own
//! [`MemBuffer`] layered on top; iterators merge both views in key order.
//!
//! # Commit
//!
//! Commit is optimistic: if any key written by the transaction was committed
//! by someone else after the snapshot was taken, the commit fails with
//! [`KvError::WriteConflict`] and nothing is applied. Entries written with
//! [`Transaction::set_untouched`] are dropped from the write set.
//!
//! Committed deletes stay in the map as tombstones so a later commit can still
//! detect a conflict against them. Nothing prunes them, and every snapshot
//! copies the live entries, so the store suits tests and tools, not large data.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kv::{KvError, KvIterator, Mutator, Retriever, Transaction};

/// Configuration for fault injection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultConfig {
    /// Probability of a read error (0.0 - 1.0).
    pub read_error_rate: f64,
    /// Probability of a write error (0.0 - 1.0).
    pub write_error_rate: f64,
}

impl FaultConfig {
    /// Create a fault config with no faults.
    #[must_use]
    pub fn no_faults() -> Self {
        Self::default()
    }

    /// Fail every read and write.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            read_error_rate: 1.0,
            write_error_rate: 1.0,
        }
    }
}

/// Seeded fault source shared by a transaction's reads and writes.
struct FaultInjector {
    config: FaultConfig,
    rng: RefCell<StdRng>,
}

impl FaultInjector {
    fn new(config: FaultConfig, seed: u64) -> Self {
        Self {
            config,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn check(&self, rate: f64, op: &'static str) -> Result<(), KvError> {
        if rate > 0.0 && self.rng.borrow_mut().random_bool(rate.min(1.0)) {
            tracing::debug!("injecting {op} fault");
            return Err(KvError::Injected { op });
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), KvError> {
        self.check(self.config.read_error_rate, "read")
    }

    fn check_write(&self) -> Result<(), KvError> {
        self.check(self.config.write_error_rate, "write")
    }
}

/// A committed value and the version that wrote it. `None` is a delete.
struct Versioned {
    value: Option<Vec<u8>>,
    version: u64,
}

#[derive(Default)]
struct StoreInner {
    data: BTreeMap<Vec<u8>, Versioned>,
    version: u64,
}

/// An ordered, transactional in-memory store.
#[derive(Default)]
pub struct MemStore {
    inner: Arc<RwLock<StoreInner>>,
    faults: Option<(FaultConfig, u64)>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose transactions inject faults.
    ///
    /// Each transaction draws from an RNG seeded with `seed` and its start
    /// version, so a run is reproducible.
    #[must_use]
    pub fn with_faults(config: FaultConfig, seed: u64) -> Self {
        Self {
            inner: Arc::default(),
            faults: Some((config, seed)),
        }
    }

    /// Begin a transaction over a snapshot of the committed data.
    pub fn begin(&self) -> Result<MemTxn, KvError> {
        let snapshot = self.snapshot()?;
        let faults = self
            .faults
            .map(|(config, seed)| FaultInjector::new(config, seed ^ snapshot.version));
        #[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
        let store = Arc::clone(&self.inner);
        Ok(MemTxn {
            store,
            snapshot,
            buffer: MemBuffer::default(),
            faults,
        })
    }

    /// Take a read-only snapshot of the committed data.
    pub fn snapshot(&self) -> Result<MemSnapshot, KvError> {
        let inner = self.inner.read().map_err(|_| KvError::Poisoned)?;
        let data = inner
            .data
            .iter()
            .filter_map(|(k, v)| v.value.as_ref().map(|value| (k.to_vec(), value.to_vec())))
            .collect();
        Ok(MemSnapshot {
            data: Arc::new(data),
            version: inner.version,
        })
    }

    /// Number of live committed keys.
    pub fn len(&self) -> Result<usize, KvError> {
        let inner = self.inner.read().map_err(|_| KvError::Poisoned)?;
        Ok(inner.data.values().filter(|v| v.value.is_some()).count())
    }

    pub fn is_empty(&self) -> Result<bool, KvError> {
        Ok(self.len()? == 0)
    }
}

/// Read-only view of the store as of one commit version.
pub struct MemSnapshot {
    data: Arc<BTreeMap<Vec<u8>, Vec<u8>>>,
    version: u64,
}

impl Retriever for MemSnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.data.get(key).map(|v| v.to_vec()))
    }

    fn iter(&self, lower: &[u8], upper: &[u8]) -> Result<Box<dyn KvIterator>, KvError> {
        let entries = range(&*self.data, lower, upper)
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect();
        Ok(Box::new(MemIterator::new(entries)))
    }
}

fn range<'a, V>(
    map: &'a BTreeMap<Vec<u8>, V>,
    lower: &'a [u8],
    upper: &'a [u8],
) -> Box<dyn Iterator<Item = (&'a Vec<u8>, &'a V)> + 'a> {
    if upper.is_empty() {
        return Box::new(map.range::<[u8], _>((Bound::Included(lower), Bound::Unbounded)));
    }
    if lower >= upper {
        return Box::new(std::iter::empty());
    }
    Box::new(map.range::<[u8], _>((Bound::Included(lower), Bound::Excluded(upper))))
}

/// A buffered write. An empty value is a delete.
#[derive(Debug)]
struct Pending {
    value: Vec<u8>,
    untouched: bool,
}

/// Pending writes of one transaction, ordered by key.
#[derive(Debug, Default)]
pub struct MemBuffer {
    entries: BTreeMap<Vec<u8>, Pending>,
}

impl MemBuffer {
    /// Raw buffered value, including `Some(&[])` for a buffered delete.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(|p| p.value.as_slice())
    }

    /// Whether `key` holds an untouched entry that commit will skip.
    #[must_use]
    pub fn is_untouched(&self, key: &[u8]) -> bool {
        self.entries.get(key).is_some_and(|p| p.untouched)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>, untouched: bool) {
        self.entries
            .insert(key.to_vec(), Pending { value, untouched });
    }

    fn delete(&mut self, key: &[u8]) {
        self.set(key, Vec::new(), false);
    }

    fn range<'a>(
        &'a self,
        lower: &'a [u8],
        upper: &'a [u8],
    ) -> impl Iterator<Item = (&'a Vec<u8>, &'a [u8])> + 'a {
        range(&self.entries, lower, upper).map(|(k, p)| (k, p.value.as_slice()))
    }
}

/// A transaction over [`MemStore`].
pub struct MemTxn {
    store: Arc<RwLock<StoreInner>>,
    snapshot: MemSnapshot,
    buffer: MemBuffer,
    faults: Option<FaultInjector>,
}

impl MemTxn {
    /// The transaction's pending writes.
    #[must_use]
    pub const fn mem_buffer(&self) -> &MemBuffer {
        &self.buffer
    }

    /// Apply the write buffer to the store.
    ///
    /// Returns the new commit version.
    pub fn commit(self) -> Result<u64, KvError> {
        let mut inner = self.store.write().map_err(|_| KvError::Poisoned)?;

        let writes: Vec<(Vec<u8>, Vec<u8>)> = self
            .buffer
            .entries
            .into_iter()
            .filter(|(_, pending)| !pending.untouched)
            .map(|(key, pending)| (key, pending.value))
            .collect();

        for (key, _) in &writes {
            if let Some(existing) = inner.data.get(key)
                && existing.version > self.snapshot.version
            {
                tracing::debug!(
                    start_version = self.snapshot.version,
                    committed_version = existing.version,
                    "write conflict"
                );
                return Err(KvError::WriteConflict { key: key.to_vec() });
            }
        }

        inner.version += 1;
        let version = inner.version;
        let count = writes.len();
        for (key, value) in writes {
            let value = if value.is_empty() { None } else { Some(value) };
            inner.data.insert(key, Versioned { value, version });
        }
        tracing::debug!(version, count, "committed transaction");
        Ok(version)
    }

    /// Discard the write buffer.
    pub fn rollback(self) {
        tracing::trace!(pending = self.buffer.len(), "rolled back transaction");
    }

    fn check_read(&self) -> Result<(), KvError> {
        self.faults.as_ref().map_or(Ok(()), FaultInjector::check_read)
    }

    fn check_write(&self) -> Result<(), KvError> {
        self.faults.as_ref().map_or(Ok(()), FaultInjector::check_write)
    }
}

impl Retriever for MemTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.check_read()?;
        match self.buffer.get(key) {
            Some([]) => Ok(None),
            Some(value) => Ok(Some(value.to_vec())),
            None => self.snapshot.get(key),
        }
    }

    fn iter(&self, lower: &[u8], upper: &[u8]) -> Result<Box<dyn KvIterator>, KvError> {
        self.check_read()?;
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = range(&*self.snapshot.data, lower, upper)
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect();
        for (key, value) in self.buffer.range(lower, upper) {
            if value.is_empty() {
                merged.remove(key);
            } else {
                merged.insert(key.to_vec(), value.to_vec());
            }
        }
        Ok(Box::new(MemIterator::new(merged.into_iter().collect())))
    }
}

impl Mutator for MemTxn {
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), KvError> {
        if value.is_empty() {
            return Err(KvError::EmptyValue);
        }
        self.check_write()?;
        self.buffer.set(key, value, false);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        self.check_write()?;
        self.buffer.delete(key);
        Ok(())
    }
}

impl Transaction for MemTxn {
    fn mem_buffer_get(&self, key: &[u8]) -> Option<&[u8]> {
        self.buffer.get(key)
    }

    fn set_untouched(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), KvError> {
        if value.is_empty() {
            return Err(KvError::EmptyValue);
        }
        self.check_write()?;
        self.buffer.set(key, value, true);
        Ok(())
    }
}

/// Cursor over a materialized, sorted range.
pub struct MemIterator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
    closed: bool,
}

impl MemIterator {
    fn new(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            entries,
            pos: 0,
            closed: false,
        }
    }
}

impl KvIterator for MemIterator {
    fn valid(&self) -> bool {
        !self.closed && self.pos < self.entries.len()
    }

    fn key(&self) -> &[u8] {
        if !self.valid() {
            return &[];
        }
        &self.entries[self.pos].0
    }

    fn value(&self) -> &[u8] {
        if !self.valid() {
            return &[];
        }
        &self.entries[self.pos].1
    }

    fn next(&mut self) -> Result<(), KvError> {
        if self.closed {
            return Err(KvError::Closed);
        }
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.entries = Vec::new();
    }
}
