// Life of an index write:
// 1. Caller projects the indexed columns out of a row (`fetch_values`)
// 2. Prefix-length columns are truncated in place
// 3. Values (and the handle, for non-distinct entries) are encoded into a
//    memcomparable key under `t{table}_i{index}`
// 4. Distinct entries are checked for uniqueness against the transaction
// 5. The entry lands in the transaction's write buffer until commit
//
// System components:
//  - Value codec and table key layout
//  - Transactional ordered key/value store
//  - Secondary index operations and iteration

#![cfg_attr(test, allow(clippy::disallowed_methods))]

pub mod codec;
pub mod config;
pub mod index;
pub mod kv;
pub mod model;
pub mod tablecodec;
pub mod types;

mod e2e_tests;

pub use config::IndexConfig;
pub use index::{
    CreateIdxOptions, Index, IndexError, IndexIter, IndexStep, SecondaryIndex, StatementContext,
};
pub use kv::{MemStore, MemTxn};
pub use model::{IndexInfo, TableInfo};
pub use types::{Datum, Handle};
