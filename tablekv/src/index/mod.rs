//! Secondary index layer.
//!
//! Translates a row's indexed column values plus its handle into keys in the
//! ordered key/value store and back, and enforces index-level constraints:
//! uniqueness, NULL semantics and column prefix lengths.
//!
//! # Key Format
//!
//! `prefix ++ encode(values) [++ encode(handle)]`
//!
//! An entry is *distinct* when the index is unique and no indexed value is
//! NULL. Distinct entries keep the handle in the value (8 big-endian bytes);
//! all other entries append the handle to the key and store the placeholder
//! value `'0'`. Entries written by an untouched create carry a trailing
//! [`UNCOMMIT_INDEX_KV_FLAG`](crate::kv::UNCOMMIT_INDEX_KV_FLAG) byte.

mod iter;
mod secondary;
mod truncate;

pub use iter::{IndexIter, IndexStep};
pub use secondary::SecondaryIndex;
pub use truncate::truncate_index_values_if_needed;

use crate::codec::CodecError;
use crate::config::IndexConfig;
use crate::kv::{Key, KvError, Mutator, Retriever, RetrieverMutator, Transaction};
use crate::model::IndexInfo;
use crate::types::{Datum, Handle, HandleError};

/// Placeholder value of a non-distinct entry.
pub const NON_DISTINCT_VALUE: u8 = b'0';

/// Operations every index kind supports.
pub trait Index {
    /// Index metadata.
    fn meta(&self) -> &IndexInfo;

    /// Key prefix shared by every entry of this index.
    fn prefix(&self) -> &Key;

    /// Build the storage key for `values` and `handle`.
    ///
    /// Truncates `values` in place to the index's prefix lengths. Reuses
    /// `buf` when given. Returns the key and whether it is distinct.
    fn gen_index_key(
        &self,
        ctx: &StatementContext,
        values: &mut [Datum],
        handle: Handle,
        buf: Option<Vec<u8>>,
    ) -> Result<(Vec<u8>, bool), IndexError>;

    /// Add an entry for `values` and `handle`.
    ///
    /// On a uniqueness violation returns [`IndexError::KeyExists`] carrying
    /// the handle of the row that already holds the value.
    fn create(
        &self,
        ctx: &mut StatementContext,
        txn: &mut dyn Transaction,
        values: &mut [Datum],
        handle: Handle,
        opts: CreateIdxOptions,
    ) -> Result<(), IndexError>;

    /// Remove the entry for `values` and `handle`.
    fn delete(
        &self,
        ctx: &StatementContext,
        m: &mut dyn Mutator,
        values: &mut [Datum],
        handle: Handle,
    ) -> Result<(), IndexError>;

    /// Remove every entry of the index. Returns the number of deleted keys.
    fn drop_all(&self, rm: &mut dyn RetrieverMutator) -> Result<usize, IndexError>;

    /// Position an iterator at the first entry not less than `values`.
    ///
    /// The flag reports whether that entry's key equals the sought key.
    fn seek(
        &self,
        ctx: &StatementContext,
        r: &dyn Retriever,
        values: &mut [Datum],
    ) -> Result<(IndexIter<'_>, bool), IndexError>;

    /// Iterate the whole index.
    fn seek_first(&self, r: &dyn Retriever) -> Result<IndexIter<'_>, IndexError>;

    /// Check whether an entry for `values` and `handle` exists.
    ///
    /// Returns [`IndexError::KeyExists`] if a distinct entry exists for
    /// another handle.
    fn exist(
        &self,
        ctx: &StatementContext,
        r: &dyn Retriever,
        values: &mut [Datum],
        handle: Handle,
    ) -> Result<(bool, Handle), IndexError>;

    /// Project the indexed columns out of a full row, reusing `vals`.
    fn fetch_values(&self, row: &[Datum], vals: Vec<Datum>) -> Result<Vec<Datum>, IndexError>;
}

/// Options for [`Index::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateIdxOptions {
    /// The entry is unchanged by the current statement.
    pub untouched: bool,
    /// Span the write is recorded under.
    pub span: Option<tracing::Span>,
}

impl CreateIdxOptions {
    #[must_use]
    pub fn untouched() -> Self {
        Self {
            untouched: true,
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// Reusable buffers for one statement's writes.
#[derive(Debug, Default)]
pub struct WriteStmtBufs {
    /// Key buffer handed back by the last create.
    pub index_key_buf: Option<Vec<u8>>,
}

/// Caller-owned per-statement state passed into index operations.
#[derive(Debug, Default)]
pub struct StatementContext {
    pub config: IndexConfig,
    pub write_bufs: WriteStmtBufs,
}

impl StatementContext {
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            write_bufs: WriteStmtBufs::default(),
        }
    }
}

/// Errors that can occur during index operations.
#[derive(Debug)]
pub enum IndexError {
    /// The value codec rejected an input.
    Encoding(CodecError),
    /// A stored handle could not be decoded.
    MalformedHandle(HandleError),
    /// The index references a column the row does not have.
    IndexOutOfBound {
        column: String,
        offset: usize,
        row_len: usize,
    },
    /// A distinct entry already exists for another row.
    KeyExists { handle: Handle },
    /// Key/value store error, passed through unchanged.
    Store(KvError),
}

impl IndexError {
    /// Whether this is a uniqueness violation.
    #[must_use]
    pub const fn is_key_exists(&self) -> bool {
        matches!(self, Self::KeyExists { .. })
    }
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(e) => write!(f, "encoding error: {e}"),
            Self::MalformedHandle(e) => write!(f, "{e}"),
            Self::IndexOutOfBound {
                column,
                offset,
                row_len,
            } => write!(
                f,
                "index column {column} offset {offset} out of bound for row of {row_len} values"
            ),
            Self::KeyExists { handle } => write!(f, "key already exists for handle {handle}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
            Self::MalformedHandle(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::IndexOutOfBound { .. } | Self::KeyExists { .. } => None,
        }
    }
}

impl From<CodecError> for IndexError {
    fn from(e: CodecError) -> Self {
        Self::Encoding(e)
    }
}

impl From<HandleError> for IndexError {
    fn from(e: HandleError) -> Self {
        Self::MalformedHandle(e)
    }
}

impl From<KvError> for IndexError {
    fn from(e: KvError) -> Self {
        Self::Store(e)
    }
}
