//! Secondary index backed by the ordered key/value store.

use crate::codec;
use crate::index::iter::Cursor;
use crate::index::{
    CreateIdxOptions, Index, IndexError, IndexIter, NON_DISTINCT_VALUE, StatementContext,
    truncate_index_values_if_needed,
};
use crate::kv::{Key, Mutator, Retriever, RetrieverMutator, Transaction, UNCOMMIT_INDEX_KV_FLAG};
use crate::model::{IndexInfo, TableInfo};
use crate::tablecodec::encode_table_index_prefix;
use crate::types::{Datum, Handle, decode_handle, encode_handle};

/// Worst-case encoded size of one integer or short value.
const ENCODED_VALUE_SIZE: usize = 9;

/// A secondary index on one physical table partition.
///
/// References catalog metadata; owns only its key prefix.
pub struct SecondaryIndex<'a> {
    table: &'a TableInfo,
    info: &'a IndexInfo,
    prefix: Key,
}

impl<'a> SecondaryIndex<'a> {
    /// Create an index handle for the partition with `physical_id`.
    ///
    /// The prefix is derived from the physical id, never from `table.id`:
    /// partitions of one table have different physical ids.
    #[must_use]
    pub fn new(physical_id: i64, table: &'a TableInfo, info: &'a IndexInfo) -> Self {
        Self {
            table,
            info,
            prefix: Key::new(encode_table_index_prefix(physical_id, info.id)),
        }
    }

    /// Reuse `buf` when given, cleared, or allocate one sized for `values`.
    fn key_buf(&self, ctx: &StatementContext, values: &[Datum], buf: Option<Vec<u8>>) -> Vec<u8> {
        match buf {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => Vec::with_capacity(
                (self.prefix.len() + (values.len() + 1) * ENCODED_VALUE_SIZE)
                    .max(ctx.config.key_buffer_capacity),
            ),
        }
    }

    /// Append the entry key for `values` and `handle` to `key`.
    ///
    /// Truncates `values` in place to the index's prefix lengths. Returns
    /// whether the entry is distinct.
    fn encode_entry_key(
        &self,
        key: &mut Vec<u8>,
        values: &mut [Datum],
        handle: Handle,
    ) -> Result<bool, IndexError> {
        let distinct = self.is_distinct(values);

        // For string columns, indexes can be created using only the leading
        // part of column values with `col_name(length)`.
        let values = truncate_index_values_if_needed(self.table, self.info, values);

        key.extend_from_slice(&self.prefix);
        codec::encode_key(key, values)?;
        if !distinct {
            codec::encode_key(key, &[Datum::Int64(handle)])?;
        }
        tracing::trace!(index = %self.info.name, distinct, len = key.len(), "generated index key");
        Ok(distinct)
    }

    /// Distinct entries require no NULL among the values of a unique index.
    fn is_distinct(&self, values: &[Datum]) -> bool {
        // For all engines, a UNIQUE index permits multiple NULL values.
        self.info.unique && !values.iter().any(Datum::is_null)
    }

    fn write_entry(
        &self,
        ctx: &StatementContext,
        txn: &mut dyn Transaction,
        key: &[u8],
        distinct: bool,
        handle: Handle,
        untouched: bool,
    ) -> Result<(), IndexError> {
        if untouched {
            // The flag byte keeps the value distinguishable from a committed one.
            let value = if distinct {
                let mut value = encode_handle(handle).to_vec();
                value.push(UNCOMMIT_INDEX_KV_FLAG);
                value
            } else {
                vec![UNCOMMIT_INDEX_KV_FLAG]
            };
            txn.set_untouched(key, value)?;
            return Ok(());
        }

        if !distinct {
            // The handle is already in the key, so the key is unique by construction.
            txn.set(key, vec![NON_DISTINCT_VALUE])?;
            return Ok(());
        }

        if ctx.config.batch_check {
            txn.set(key, encode_handle(handle).to_vec())?;
            return Ok(());
        }

        match txn.get(key)? {
            None => {
                txn.set(key, encode_handle(handle).to_vec())?;
                Ok(())
            }
            Some(value) => {
                let existing = decode_handle(&value)?;
                tracing::debug!(
                    index = %self.info.name,
                    existing,
                    handle,
                    "unique index entry already exists"
                );
                Err(IndexError::KeyExists { handle: existing })
            }
        }
    }
}

impl Index for SecondaryIndex<'_> {
    fn meta(&self) -> &IndexInfo {
        self.info
    }

    fn prefix(&self) -> &Key {
        &self.prefix
    }

    fn gen_index_key(
        &self,
        ctx: &StatementContext,
        values: &mut [Datum],
        handle: Handle,
        buf: Option<Vec<u8>>,
    ) -> Result<(Vec<u8>, bool), IndexError> {
        let mut key = self.key_buf(ctx, values, buf);
        let distinct = self.encode_entry_key(&mut key, values, handle)?;
        Ok((key, distinct))
    }

    fn create(
        &self,
        ctx: &mut StatementContext,
        txn: &mut dyn Transaction,
        values: &mut [Datum],
        handle: Handle,
        opts: CreateIdxOptions,
    ) -> Result<(), IndexError> {
        let _entered = opts.span.as_ref().map(tracing::Span::enter);

        let buf = ctx.write_bufs.index_key_buf.take();
        let mut key = self.key_buf(ctx, values, buf);
        let result = self
            .encode_entry_key(&mut key, values, handle)
            .and_then(|distinct| {
                // An entry already in the write buffer must not be
                // overwritten with the uncommitted flag.
                if opts.untouched && txn.mem_buffer_get(&key).is_some() {
                    tracing::debug!(index = %self.info.name, handle, "untouched entry already buffered");
                    return Ok(());
                }
                self.write_entry(ctx, txn, &key, distinct, handle, opts.untouched)
            });
        ctx.write_bufs.index_key_buf = Some(key);
        result
    }

    fn delete(
        &self,
        ctx: &StatementContext,
        m: &mut dyn Mutator,
        values: &mut [Datum],
        handle: Handle,
    ) -> Result<(), IndexError> {
        let (key, _) = self.gen_index_key(ctx, values, handle, None)?;
        m.delete(&key)?;
        Ok(())
    }

    fn drop_all(&self, rm: &mut dyn RetrieverMutator) -> Result<usize, IndexError> {
        let upper = self.prefix.prefix_next();
        let mut cursor = Cursor::new(rm.iter(&self.prefix, &upper)?);

        let mut deleted = 0;
        while cursor.valid() && cursor.key().starts_with(&self.prefix) {
            rm.delete(cursor.key())?;
            deleted += 1;
            cursor.advance()?;
        }
        cursor.close();

        tracing::debug!(index = %self.info.name, deleted, "dropped index entries");
        Ok(deleted)
    }

    fn seek(
        &self,
        ctx: &StatementContext,
        r: &dyn Retriever,
        values: &mut [Datum],
    ) -> Result<(IndexIter<'_>, bool), IndexError> {
        let (key, _) = self.gen_index_key(ctx, values, 0, None)?;
        let upper = self.prefix.prefix_next();
        let it = r.iter(&key, &upper)?;
        let hit = it.valid() && it.key() == key.as_slice();
        Ok((
            IndexIter::new(it, &self.prefix, self.info.columns.len()),
            hit,
        ))
    }

    fn seek_first(&self, r: &dyn Retriever) -> Result<IndexIter<'_>, IndexError> {
        let upper = self.prefix.prefix_next();
        let it = r.iter(&self.prefix, &upper)?;
        Ok(IndexIter::new(it, &self.prefix, self.info.columns.len()))
    }

    fn exist(
        &self,
        ctx: &StatementContext,
        r: &dyn Retriever,
        values: &mut [Datum],
        handle: Handle,
    ) -> Result<(bool, Handle), IndexError> {
        let (key, distinct) = self.gen_index_key(ctx, values, handle, None)?;

        let Some(value) = r.get(&key)? else {
            return Ok((false, 0));
        };

        // A distinct entry keeps the handle in its value.
        if distinct {
            let stored = decode_handle(&value)?;
            if stored != handle {
                return Err(IndexError::KeyExists { handle: stored });
            }
            return Ok((true, stored));
        }

        Ok((true, handle))
    }

    fn fetch_values(&self, row: &[Datum], mut vals: Vec<Datum>) -> Result<Vec<Datum>, IndexError> {
        vals.clear();
        vals.reserve(self.info.columns.len());
        for column in &self.info.columns {
            let Some(value) = row.get(column.offset) else {
                return Err(IndexError::IndexOutOfBound {
                    column: column.name.to_string(),
                    offset: column.offset,
                    row_len: row.len(),
                });
            };
            vals.push(value.to_owned());
        }
        Ok(vals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::IndexStep;
    use crate::kv::{FaultConfig, KvError, MemStore};
    use crate::model::{Charset, ColumnInfo, IndexColumn};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn table() -> TableInfo {
        let column = |name: &str, offset| ColumnInfo {
            name: name.to_string(),
            offset,
            charset: Charset::Utf8mb4,
        };
        TableInfo {
            id: 10,
            name: "users".to_string(),
            columns: vec![column("id", 0), column("a", 1), column("b", 2)],
        }
    }

    fn index_info(unique: bool) -> IndexInfo {
        let column = |name: &str, offset| IndexColumn {
            name: name.to_string(),
            offset,
            length: None,
        };
        IndexInfo {
            id: 3,
            name: "idx_a_b".to_string(),
            columns: vec![column("a", 1), column("b", 2)],
            unique,
        }
    }

    #[test]
    fn test_distinctness_rule() {
        let table = table();
        let ctx = StatementContext::default();
        for unique in [true, false] {
            let info = index_info(unique);
            let index = SecondaryIndex::new(10, &table, &info);

            let mut values = vec![Datum::Int64(1), Datum::from("x")];
            let (_, distinct) = index.gen_index_key(&ctx, &mut values, 1, None).expect("key");
            assert_eq!(distinct, unique);

            let mut values = vec![Datum::Int64(1), Datum::Null];
            let (_, distinct) = index.gen_index_key(&ctx, &mut values, 1, None).expect("key");
            assert!(!distinct);
        }
    }

    #[test]
    fn test_key_layout() {
        let table = table();
        let info = index_info(false);
        let index = SecondaryIndex::new(10, &table, &info);
        let ctx = StatementContext::default();

        let mut values = vec![Datum::Int64(5), Datum::Int64(6)];
        let (key, distinct) = index.gen_index_key(&ctx, &mut values, 7, None).expect("key");
        assert!(!distinct);

        let mut expected = encode_table_index_prefix(10, 3);
        codec::encode_key(
            &mut expected,
            &[Datum::Int64(5), Datum::Int64(6), Datum::Int64(7)],
        )
        .expect("encode");
        assert_eq!(key, expected);

        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let (key, distinct) = index.gen_index_key(&ctx, &mut values, 7, None).expect("key");
        assert!(distinct);
        assert_eq!(key.len(), expected.len() - 9);
    }

    #[test]
    fn test_prefix_uses_physical_id() {
        let table = table();
        let info = index_info(false);
        let partition = SecondaryIndex::new(99, &table, &info);
        assert_eq!(&**partition.prefix(), encode_table_index_prefix(99, 3).as_slice());
    }

    #[test]
    fn test_key_buffer_reused() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let ctx = StatementContext::default();

        let buf = Vec::with_capacity(256);
        let ptr = buf.as_ptr();
        let mut values = vec![Datum::Int64(1), Datum::Int64(2)];
        let (key, _) = index.gen_index_key(&ctx, &mut values, 1, Some(buf)).expect("key");
        assert_eq!(key.as_ptr(), ptr);
        assert_eq!(&key[..index.prefix().len()], &**index.prefix());
    }

    #[test]
    fn test_distinct_keys_differ() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let ctx = StatementContext::default();
        let mut rng = StdRng::seed_from_u64(23);

        for _ in 0..500 {
            let a = rng.random_range(0..50i64);
            let b = rng.random_range(0..50i64);
            let c = rng.random_range(0..50i64);
            let d = rng.random_range(0..50i64);
            let mut v1 = vec![Datum::Int64(a), Datum::Int64(b)];
            let mut v2 = vec![Datum::Int64(c), Datum::Int64(d)];
            let (k1, _) = index.gen_index_key(&ctx, &mut v1, 1, None).expect("key");
            let (k2, _) = index.gen_index_key(&ctx, &mut v2, 1, None).expect("key");
            assert_eq!((a, b) == (c, d), k1 == k2);
        }
    }

    #[test]
    fn test_encoding_error_surfaces() {
        let table = table();
        let info = index_info(false);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::Float64(f64::NAN), Datum::Int64(1)];
        let err = index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::Encoding(codec::CodecError::InvalidFloat)));
        assert!(txn.mem_buffer().is_empty());
    }

    #[test]
    fn test_key_buffer_kept_on_encoding_error() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let buf = Vec::with_capacity(256);
        let ptr = buf.as_ptr();
        ctx.write_bufs.index_key_buf = Some(buf);

        let mut values = vec![Datum::Int64(1), Datum::Float64(f64::NAN)];
        index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .unwrap_err();
        let buf = ctx.write_bufs.index_key_buf.take().expect("buffer returned");
        assert_eq!(buf.as_ptr(), ptr);

        // The next create reuses the same allocation.
        ctx.write_bufs.index_key_buf = Some(buf);
        let mut values = vec![Datum::Int64(1), Datum::Int64(2)];
        index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .expect("create");
        let key = ctx.write_bufs.index_key_buf.take().expect("buffer returned");
        assert_eq!(key.as_ptr(), ptr);
        assert_eq!(txn.get(&key).expect("get"), Some(encode_handle(1).to_vec()));
    }

    #[test]
    fn test_create_exist_delete() {
        let table = table();
        let ctx_default = StatementContext::default();
        for unique in [true, false] {
            let info = index_info(unique);
            let index = SecondaryIndex::new(10, &table, &info);
            let mut ctx = StatementContext::default();
            let store = MemStore::new();
            let mut txn = store.begin().expect("begin");

            let mut values = vec![Datum::from("k"), Datum::Int64(1)];
            index
                .create(&mut ctx, &mut txn, &mut values, 42, CreateIdxOptions::default())
                .expect("create");
            assert_eq!(
                index.exist(&ctx_default, &txn, &mut values, 42).expect("exist"),
                (true, 42)
            );

            index
                .delete(&ctx_default, &mut txn, &mut values, 42)
                .expect("delete");
            assert_eq!(
                index.exist(&ctx_default, &txn, &mut values, 42).expect("exist"),
                (false, 0)
            );
        }
    }

    #[test]
    fn test_exist_reports_conflicting_handle() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .expect("create");

        let err = index.exist(&ctx, &txn, &mut values, 2).unwrap_err();
        assert!(matches!(err, IndexError::KeyExists { handle: 1 }));
    }

    #[test]
    fn test_non_distinct_value_is_placeholder() {
        let table = table();
        let info = index_info(false);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::default())
            .expect("create");
        let key = ctx.write_bufs.index_key_buf.take().expect("key buffer kept");
        assert_eq!(txn.get(&key).expect("get"), Some(b"0".to_vec()));
    }

    #[test]
    fn test_untouched_writes_flag() {
        let table = table();
        let mut ctx = StatementContext::default();
        let store = MemStore::new();

        let info = index_info(false);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut txn = store.begin().expect("begin");
        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::untouched())
            .expect("create");
        let key = ctx.write_bufs.index_key_buf.take().expect("key buffer kept");
        assert_eq!(txn.mem_buffer_get(&key), Some(&[UNCOMMIT_INDEX_KV_FLAG][..]));

        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::untouched())
            .expect("create");
        let key = ctx.write_bufs.index_key_buf.take().expect("key buffer kept");
        let mut expected = encode_handle(5).to_vec();
        expected.push(UNCOMMIT_INDEX_KV_FLAG);
        assert_eq!(txn.mem_buffer_get(&key), Some(expected.as_slice()));

        // Untouched entries only re-assert existing rows and are not committed.
        txn.commit().expect("commit");
        assert!(store.is_empty().expect("is_empty"));
    }

    #[test]
    fn test_untouched_skips_buffered_key() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::default())
            .expect("create");
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::untouched())
            .expect("untouched create");

        let key = ctx.write_bufs.index_key_buf.take().expect("key buffer kept");
        assert_eq!(txn.mem_buffer_get(&key), Some(&encode_handle(5)[..]));
    }

    #[test]
    fn test_untouched_over_committed_entry_writes() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        let mut txn = store.begin().expect("begin");
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::default())
            .expect("create");
        txn.commit().expect("commit");

        // Present in the store but not in the new write buffer: the flagged
        // value is written without a uniqueness check.
        let mut txn = store.begin().expect("begin");
        index
            .create(&mut ctx, &mut txn, &mut values, 5, CreateIdxOptions::untouched())
            .expect("untouched create");
        assert_eq!(txn.mem_buffer().len(), 1);
        assert_eq!(index.exist(&ctx, &txn, &mut values, 5).expect("exist"), (true, 5));
    }

    #[test]
    fn test_batch_check_skips_uniqueness() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::new(IndexConfig {
            batch_check: true,
            ..IndexConfig::default()
        });
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .expect("create");
        index
            .create(&mut ctx, &mut txn, &mut values, 2, CreateIdxOptions::default())
            .expect("unchecked create overwrites");
        assert_eq!(index.exist(&ctx, &txn, &mut values, 2).expect("exist"), (true, 2));
    }

    #[test]
    fn test_null_values_permit_duplicates_on_unique_index() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        for handle in [1, 2, 3] {
            let mut values = vec![Datum::from("k"), Datum::Null];
            index
                .create(&mut ctx, &mut txn, &mut values, handle, CreateIdxOptions::default())
                .expect("create");
        }

        let handles: Vec<Handle> = index
            .seek_first(&txn)
            .expect("seek")
            .map(|entry| entry.expect("entry").1)
            .collect();
        assert_eq!(handles, vec![1, 2, 3]);
    }

    #[test]
    fn test_seek_reports_hit() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        for (v, h) in [(1, 10), (3, 30)] {
            let mut values = vec![Datum::Int64(v), Datum::Int64(0)];
            index
                .create(&mut ctx, &mut txn, &mut values, h, CreateIdxOptions::default())
                .expect("create");
        }

        let mut values = vec![Datum::Int64(3), Datum::Int64(0)];
        let (mut it, hit) = index.seek(&ctx, &txn, &mut values).expect("seek");
        assert!(hit);
        assert_eq!(
            it.next_step().expect("next"),
            IndexStep::Entry {
                values: vec![Datum::Int64(3), Datum::Int64(0)],
                handle: 30
            }
        );
        assert!(it.next_step().expect("next").is_end());

        let mut values = vec![Datum::Int64(2), Datum::Int64(0)];
        let (mut it, hit) = index.seek(&ctx, &txn, &mut values).expect("seek");
        assert!(!hit);
        let IndexStep::Entry { handle, .. } = it.next_step().expect("next") else {
            panic!("expected an entry after the sought key");
        };
        assert_eq!(handle, 30);
    }

    #[test]
    fn test_iteration_stops_at_prefix_boundary() {
        let table = table();
        let info = index_info(false);
        let other_info = IndexInfo {
            id: 4,
            ..index_info(false)
        };
        let index = SecondaryIndex::new(10, &table, &info);
        let other = SecondaryIndex::new(10, &table, &other_info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        for handle in 0..5 {
            let mut values = vec![Datum::Int64(handle), Datum::Int64(0)];
            index
                .create(&mut ctx, &mut txn, &mut values, handle, CreateIdxOptions::default())
                .expect("create");
            other
                .create(&mut ctx, &mut txn, &mut values, handle, CreateIdxOptions::default())
                .expect("create");
        }

        let entries: Vec<_> = index
            .seek_first(&txn)
            .expect("seek")
            .collect::<Result<_, _>>()
            .expect("entries");
        assert_eq!(entries.len(), 5);

        assert_eq!(index.drop_all(&mut txn).expect("drop"), 5);
        assert!(index.seek_first(&txn).expect("seek").next_step().expect("next").is_end());
        assert_eq!(other.seek_first(&txn).expect("seek").count(), 5);
    }

    #[test]
    fn test_closed_iterator_is_exhausted() {
        let table = table();
        let info = index_info(false);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::Int64(1), Datum::Int64(1)];
        index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .expect("create");

        let mut it = index.seek_first(&txn).expect("seek");
        it.close();
        it.close();
        assert!(it.next_step().expect("next").is_end());
    }

    #[test]
    fn test_fetch_values() {
        let table = table();
        let info = index_info(false);
        let index = SecondaryIndex::new(10, &table, &info);

        let row = vec![Datum::Int64(1), Datum::from("a"), Datum::from("b")];
        let vals = index
            .fetch_values(&row, vec![Datum::Null; 8])
            .expect("fetch");
        assert_eq!(vals, vec![Datum::from("a"), Datum::from("b")]);

        let err = index.fetch_values(&row[..2], Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            IndexError::IndexOutOfBound { offset: 2, row_len: 2, .. }
        ));
    }

    #[test]
    fn test_store_errors_pass_through() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::with_faults(FaultConfig::always(), 3);
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        let err = index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::Store(KvError::Injected { op: "read" })));

        let err = index.seek_first(&txn).err().expect("seek fails");
        assert!(matches!(err, IndexError::Store(KvError::Injected { .. })));
    }

    #[test]
    fn test_malformed_stored_handle() {
        let table = table();
        let info = index_info(true);
        let index = SecondaryIndex::new(10, &table, &info);
        let mut ctx = StatementContext::default();
        let store = MemStore::new();
        let mut txn = store.begin().expect("begin");

        let mut values = vec![Datum::from("k"), Datum::Int64(1)];
        let (key, _) = index.gen_index_key(&ctx, &mut values, 1, None).expect("key");
        txn.set(&key, vec![1, 2, 3]).expect("set");

        let err = index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::MalformedHandle(_)));
    }
}
