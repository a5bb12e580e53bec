//! Transactional key/value interface consumed by the index layer.
//!
//! The index code only talks to the store through these traits:
//! - [`Retriever`]: point reads and ordered range iteration
//! - [`Mutator`]: point writes and deletes into a transaction's write buffer
//! - [`Transaction`]: a retriever/mutator whose write buffer can be queried on
//!   its own, independent of the committed snapshot
//!
//! [`MemStore`] is an ordered in-memory implementation with optimistic
//! conflict detection at commit.

mod memdb;

pub use memdb::{
    FaultConfig, MemBuffer, MemIterator, MemSnapshot, MemStore, MemTxn,
};

/// Trailing flag marking an index value as written by an untouched create.
///
/// Such entries only re-assert an existing index entry and are not persisted
/// on commit.
pub const UNCOMMIT_INDEX_KV_FLAG: u8 = b'1';

/// Ordered cursor over a key range.
pub trait KvIterator {
    /// Whether the cursor points at an entry.
    fn valid(&self) -> bool;
    /// Current key. Empty once the cursor is exhausted.
    fn key(&self) -> &[u8];
    /// Current value. Empty once the cursor is exhausted.
    fn value(&self) -> &[u8];
    /// Advance to the next entry.
    fn next(&mut self) -> Result<(), KvError>;
    /// Release the cursor. Safe to call more than once.
    fn close(&mut self);
}

/// Read access to a transaction view.
pub trait Retriever {
    /// Read the value at `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError>;

    /// Open a cursor over `[lower, upper)`. An empty `upper` is unbounded.
    fn iter(&self, lower: &[u8], upper: &[u8]) -> Result<Box<dyn KvIterator>, KvError>;
}

/// Write access to a transaction's write buffer.
pub trait Mutator {
    /// Write `value` at `key`. Values must be non-empty.
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), KvError>;

    /// Delete `key`.
    fn delete(&mut self, key: &[u8]) -> Result<(), KvError>;
}

/// Combined read/write access.
pub trait RetrieverMutator: Retriever + Mutator {}

impl<T: Retriever + Mutator + ?Sized> RetrieverMutator for T {}

/// A transaction whose uncommitted writes can be inspected directly.
pub trait Transaction: RetrieverMutator {
    /// Look `key` up in the write buffer only.
    ///
    /// Returns the raw buffered value; a buffered delete is `Some(&[])`.
    fn mem_buffer_get(&self, key: &[u8]) -> Option<&[u8]>;

    /// Write an untouched index entry.
    ///
    /// The entry is visible to reads in this transaction but is never
    /// committed. A later [`Mutator::set`] or [`Mutator::delete`] of the same
    /// key clears the mark.
    fn set_untouched(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), KvError>;
}

/// An owned key with prefix helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Vec<u8>);

impl Key {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn has_prefix(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    /// The smallest key greater than every key that starts with `self`.
    #[must_use]
    pub fn prefix_next(&self) -> Self {
        Self(prefix_next(&self.0))
    }

}

impl std::ops::Deref for Key {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Compute the exclusive upper bound of the range of keys starting with `key`.
///
/// Increments the last byte with carry. If every byte overflows, the result
/// is `key` with a trailing `0x00`.
#[must_use]
pub fn prefix_next(key: &[u8]) -> Vec<u8> {
    let mut buf = key.to_vec();
    for i in (0..buf.len()).rev() {
        buf[i] = buf[i].wrapping_add(1);
        if buf[i] != 0 {
            return buf;
        }
    }
    let mut buf = key.to_vec();
    buf.push(0);
    buf
}

/// Errors surfaced by the key/value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// A cursor was used after being closed.
    Closed,
    /// A written key was committed by another transaction after this one started.
    WriteConflict { key: Vec<u8> },
    /// Values must be non-empty; an empty value marks a delete.
    EmptyValue,
    /// A fault injected by [`FaultConfig`].
    Injected { op: &'static str },
    /// The store lock was poisoned by a panicking writer.
    Poisoned,
}

impl std::fmt::Display for KvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "iterator is closed"),
            Self::WriteConflict { key } => write!(f, "write conflict on key {key:02x?}"),
            Self::EmptyValue => write!(f, "cannot set an empty value"),
            Self::Injected { op } => write!(f, "injected {op} fault"),
            Self::Poisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl std::error::Error for KvError {}
