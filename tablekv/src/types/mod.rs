//! Value and row-identifier types shared by the codec and index layers.

mod datum;
mod handle;

pub use datum::{Datum, Kind};
pub use handle::{HANDLE_SIZE, Handle, HandleError, decode_handle, encode_handle};
