//! End-to-end tests over an in-memory store.
//!
//! Each test file covers a specific scenario: rows are projected onto their
//! indexes, written through transactions, committed, and read back.

#![cfg(test)]

mod helpers;

mod test_drop;
mod test_iterator_bounds;
mod test_non_unique_index;
mod test_prefix_index;
mod test_store_errors;
mod test_unique_index;
mod test_untouched;
