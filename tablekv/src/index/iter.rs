//! Forward iteration over an index's entries.

use crate::codec;
use crate::index::IndexError;
use crate::kv::{KvError, KvIterator};
use crate::types::{Datum, Handle, HandleError, decode_handle};

/// Owns a store cursor and closes it when dropped.
pub(crate) struct Cursor {
    it: Option<Box<dyn KvIterator>>,
}

impl Cursor {
    pub(crate) fn new(it: Box<dyn KvIterator>) -> Self {
        Self { it: Some(it) }
    }

    pub(crate) fn valid(&self) -> bool {
        self.it.as_ref().is_some_and(|it| it.valid())
    }

    pub(crate) fn key(&self) -> &[u8] {
        match &self.it {
            Some(it) => it.key(),
            None => &[],
        }
    }

    pub(crate) fn value(&self) -> &[u8] {
        match &self.it {
            Some(it) => it.value(),
            None => &[],
        }
    }

    pub(crate) fn advance(&mut self) -> Result<(), KvError> {
        match &mut self.it {
            Some(it) => it.next(),
            None => Err(KvError::Closed),
        }
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut it) = self.it.take() {
            it.close();
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}

/// Result of advancing an [`IndexIter`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexStep {
    /// The next entry's column values and row handle.
    Entry { values: Vec<Datum>, handle: Handle },
    /// The cursor is exhausted or has left the index's key range.
    EndOfIndex,
}

impl IndexStep {
    #[must_use]
    pub const fn is_end(&self) -> bool {
        matches!(self, Self::EndOfIndex)
    }
}

/// Lazy, forward-only iterator over index entries.
///
/// Holds an open store cursor until closed or dropped.
pub struct IndexIter<'a> {
    cursor: Cursor,
    prefix: &'a [u8],
    column_count: usize,
}

impl<'a> IndexIter<'a> {
    pub(crate) fn new(it: Box<dyn KvIterator>, prefix: &'a [u8], column_count: usize) -> Self {
        Self {
            cursor: Cursor::new(it),
            prefix,
            column_count,
        }
    }

    /// Decode the current entry and advance.
    ///
    /// Returns [`IndexStep::EndOfIndex`] once the cursor leaves the index,
    /// including after [`close`](Self::close).
    pub fn next_step(&mut self) -> Result<IndexStep, IndexError> {
        if !self.cursor.valid() || !self.cursor.key().starts_with(self.prefix) {
            return Ok(IndexStep::EndOfIndex);
        }

        let suffix = &self.cursor.key()[self.prefix.len()..];
        let mut values = codec::decode(suffix, self.column_count)?;
        let handle = if values.len() > self.column_count {
            // Non-distinct: the handle is the trailing key value.
            let last = values.pop().unwrap_or(Datum::Null);
            last.as_i64()
                .ok_or_else(|| HandleError::InvalidKind(last.kind()))?
        } else {
            decode_handle(self.cursor.value())?
        };

        self.cursor.advance()?;
        Ok(IndexStep::Entry { values, handle })
    }

    /// Release the underlying cursor. Safe to call more than once.
    pub fn close(&mut self) {
        self.cursor.close();
    }
}

impl Iterator for IndexIter<'_> {
    type Item = Result<(Vec<Datum>, Handle), IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_step() {
            Ok(IndexStep::Entry { values, handle }) => Some(Ok((values, handle))),
            Ok(IndexStep::EndOfIndex) => {
                self.close();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}
