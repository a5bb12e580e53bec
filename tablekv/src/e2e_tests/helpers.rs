//! Common helpers for end-to-end tests.

use crate::index::{CreateIdxOptions, Index, IndexError, IndexIter, SecondaryIndex, StatementContext};
use crate::kv::Transaction;
use crate::model::{Charset, ColumnInfo, IndexColumn, IndexInfo, TableInfo};
use crate::types::{Datum, Handle};

/// Physical id of the unpartitioned `users` table.
pub const USERS_ID: i64 = 10;

pub const EMAIL_INDEX_ID: i64 = 1;
pub const STATUS_INDEX_ID: i64 = 2;
pub const NAME_INDEX_ID: i64 = 3;

/// Catalog for `users(id, email, status, name)` with three indexes:
/// - `uk_email`: unique on `email`
/// - `idx_status`: non-unique on `status`
/// - `idx_name`: non-unique on `name(3)`
pub struct Users {
    pub table: TableInfo,
    pub email: IndexInfo,
    pub status: IndexInfo,
    pub name: IndexInfo,
}

impl Users {
    #[must_use]
    pub fn fixture() -> Self {
        let column = |name: &str, offset| ColumnInfo {
            name: name.to_string(),
            offset,
            charset: Charset::Utf8mb4,
        };
        let table = TableInfo {
            id: USERS_ID,
            name: "users".to_string(),
            columns: vec![
                column("id", 0),
                column("email", 1),
                column("status", 2),
                column("name", 3),
            ],
        };

        Self {
            table,
            email: single_column_index(EMAIL_INDEX_ID, "uk_email", "email", 1, true, None),
            status: single_column_index(STATUS_INDEX_ID, "idx_status", "status", 2, false, None),
            name: single_column_index(NAME_INDEX_ID, "idx_name", "name", 3, false, Some(3)),
        }
    }

    pub fn email_index(&self) -> SecondaryIndex<'_> {
        SecondaryIndex::new(USERS_ID, &self.table, &self.email)
    }

    pub fn status_index(&self) -> SecondaryIndex<'_> {
        SecondaryIndex::new(USERS_ID, &self.table, &self.status)
    }

    pub fn name_index(&self) -> SecondaryIndex<'_> {
        SecondaryIndex::new(USERS_ID, &self.table, &self.name)
    }
}

fn single_column_index(
    id: i64,
    name: &str,
    column: &str,
    offset: usize,
    unique: bool,
    length: Option<usize>,
) -> IndexInfo {
    IndexInfo {
        id,
        name: name.to_string(),
        columns: vec![IndexColumn {
            name: column.to_string(),
            offset,
            length,
        }],
        unique,
    }
}

/// Build a `users` row.
pub fn user(id: i64, email: Option<&str>, status: &str, name: &str) -> Vec<Datum> {
    vec![
        Datum::Int64(id),
        Datum::from(email),
        Datum::from(status),
        Datum::from(name),
    ]
}

/// Project `row` onto `index` and add its entry.
pub fn insert(
    index: &SecondaryIndex<'_>,
    ctx: &mut StatementContext,
    txn: &mut dyn Transaction,
    row: &[Datum],
    handle: Handle,
) -> Result<(), IndexError> {
    let mut values = index.fetch_values(row, Vec::new())?;
    index.create(ctx, txn, &mut values, handle, CreateIdxOptions::default())
}

/// Drain an index iterator into `(values, handle)` pairs.
pub fn collect(it: IndexIter<'_>) -> Vec<(Vec<Datum>, Handle)> {
    #[allow(clippy::expect_used)]
    it.collect::<Result<Vec<_>, _>>()
        .expect("Index iteration should succeed")
}

/// Handles of every entry in iteration order.
pub fn handles(it: IndexIter<'_>) -> Vec<Handle> {
    collect(it).into_iter().map(|(_, handle)| handle).collect()
}
