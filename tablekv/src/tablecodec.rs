//! Physical key prefixes for table indexes.
//!
//! # Key Format
//!
//! Index keys start with a 19-byte prefix:
//! `b"t" ++ comparable(physical_id) ++ b"_i" ++ comparable(index_id)`
//!
//! The prefix is keyed by the physical id, not the logical table id: each
//! partition of a partitioned table gets its own physical id and its own
//! index range.

use crate::codec::{decode_int, encode_int};

pub const TABLE_PREFIX: &[u8] = b"t";
pub const INDEX_PREFIX_SEP: &[u8] = b"_i";

const ID_LEN: usize = 8;

/// Length of an index prefix in bytes.
pub const INDEX_PREFIX_LEN: usize = TABLE_PREFIX.len() + ID_LEN + INDEX_PREFIX_SEP.len() + ID_LEN;

/// Build the key prefix shared by every entry of one index on one partition.
#[must_use]
pub fn encode_table_index_prefix(physical_id: i64, index_id: i64) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_PREFIX_LEN);
    key.extend_from_slice(TABLE_PREFIX);
    key.extend_from_slice(&encode_int(physical_id));
    key.extend_from_slice(INDEX_PREFIX_SEP);
    key.extend_from_slice(&encode_int(index_id));
    key
}

/// Split an index key into `(physical_id, index_id, rest)`.
///
/// Returns `None` if `key` does not start with a well-formed index prefix.
#[must_use]
pub fn decode_index_prefix(key: &[u8]) -> Option<(i64, i64, &[u8])> {
    let rest = key.strip_prefix(TABLE_PREFIX)?;
    let (physical_id, rest) = split_id(rest)?;
    let rest = rest.strip_prefix(INDEX_PREFIX_SEP)?;
    let (index_id, rest) = split_id(rest)?;
    Some((physical_id, index_id, rest))
}

fn split_id(b: &[u8]) -> Option<(i64, &[u8])> {
    let bytes = b.get(..ID_LEN)?;
    let mut raw = [0u8; ID_LEN];
    raw.copy_from_slice(bytes);
    Some((decode_int(raw), &b[ID_LEN..]))
}
