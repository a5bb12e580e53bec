//! Row handle encoding.
//!
//! A handle is the row identifier within one physical table partition. When an
//! index entry is distinct the handle lives in the entry's value as eight raw
//! big-endian bytes.
//!
//! Non-negative handles sort by numeric value under byte comparison. Negative
//! handles still round-trip, but sort after every non-negative handle.

use crate::types::Kind;

/// Unique row identifier within a table partition.
pub type Handle = i64;

/// Encoded size of a handle in bytes.
pub const HANDLE_SIZE: usize = 8;

/// Encode a handle as eight big-endian bytes.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_handle(handle: Handle) -> [u8; HANDLE_SIZE] {
    (handle as u64).to_be_bytes()
}

/// Decode a handle from the first eight bytes of `data`.
///
/// Trailing bytes (for example the uncommitted flag written for untouched
/// entries) are ignored.
pub fn decode_handle(data: &[u8]) -> Result<Handle, HandleError> {
    let Some(bytes) = data.get(..HANDLE_SIZE) else {
        return Err(HandleError::Malformed { len: data.len() });
    };
    let mut raw = [0u8; HANDLE_SIZE];
    raw.copy_from_slice(bytes);
    #[allow(clippy::cast_possible_wrap)]
    Ok(u64::from_be_bytes(raw) as Handle)
}

/// Errors that can occur while decoding a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    /// Fewer than eight bytes were available.
    Malformed { len: usize },
    /// A handle decoded from a key suffix was not an integer.
    InvalidKind(Kind),
}

impl std::fmt::Display for HandleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { len } => {
                write!(f, "malformed handle: expected {HANDLE_SIZE} bytes, got {len}")
            }
            Self::InvalidKind(kind) => write!(f, "handle is not an integer: {kind:?}"),
        }
    }
}

impl std::error::Error for HandleError {}
