//! Table and index metadata consumed from the catalog.
//!
//! These types are owned by the catalog and only referenced by the index
//! layer. They derive serde traits so catalog snapshots can be loaded from
//! any serde format.

use serde::{Deserialize, Serialize};

/// Column character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Utf8mb4,
    Utf8,
    Latin1,
    Ascii,
    Binary,
}

impl Charset {
    /// Whether prefix lengths count Unicode scalar values rather than bytes.
    #[must_use]
    pub const fn is_utf8(self) -> bool {
        matches!(self, Self::Utf8 | Self::Utf8mb4)
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Position of the column in a decoded row.
    pub offset: usize,
    #[serde(default)]
    pub charset: Charset,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Logical table id. Physical partitions may use different ids.
    pub id: i64,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    /// Offset of the column in the table's rows.
    pub offset: usize,
    /// Prefix length for `col(length)` indexes; `None` indexes the full value.
    #[serde(default)]
    pub length: Option<usize>,
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub id: i64,
    pub name: String,
    pub columns: Vec<IndexColumn>,
    #[serde(default)]
    pub unique: bool,
}

impl TableInfo {
    /// Charset of the column at `offset`, defaulting to binary for unknown offsets.
    #[must_use]
    pub fn charset_at(&self, offset: usize) -> Charset {
        self.columns
            .iter()
            .find(|c| c.offset == offset)
            .map_or(Charset::Binary, |c| c.charset)
    }
}
