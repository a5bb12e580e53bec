//! Order-preserving value codec.
//!
//! Encodes a sequence of [`Datum`]s so that byte-wise comparison of the
//! output matches the logical ordering of the values. Every value starts with a
//! one-byte flag; the flag order is also the cross-kind sort order.
//!
//! # Format
//!
//! - `Null`: `0x00`
//! - `Int64`: `0x03` + big-endian `v ^ (1 << 63)`
//! - `Uint64`: `0x04` + big-endian `v`
//! - `Float64`: `0x05` + big-endian bits, sign bit set for non-negative
//!   values and all bits inverted for negative ones
//! - `String` / `Bytes`: `0x01` + memcomparable groups (see [`encode_bytes`])
//! - `MinNotNull`: `0x01` with no payload, `MaxValue`: `0xFA`
//!
//! Strings and bytes share a flag, so both decode as `Datum::Bytes`.

use crate::types::Datum;

const NIL_FLAG: u8 = 0x00;
const BYTES_FLAG: u8 = 0x01;
const INT_FLAG: u8 = 0x03;
const UINT_FLAG: u8 = 0x04;
const FLOAT_FLAG: u8 = 0x05;
const MAX_FLAG: u8 = 0xFA;

const SIGN_MASK: u64 = 1 << 63;

const ENC_GROUP_SIZE: usize = 8;
const ENC_MARKER: u8 = 0xFF;
const ENC_PAD: u8 = 0x00;

/// Append the comparable encoding of `values` to `buf`.
pub fn encode_key(buf: &mut Vec<u8>, values: &[Datum]) -> Result<(), CodecError> {
    for value in values {
        encode_datum(buf, value)?;
    }
    Ok(())
}

fn encode_datum(buf: &mut Vec<u8>, value: &Datum) -> Result<(), CodecError> {
    match value {
        Datum::Null => buf.push(NIL_FLAG),
        Datum::Int64(v) => {
            buf.push(INT_FLAG);
            buf.extend_from_slice(&encode_int(*v));
        }
        Datum::Uint64(v) => {
            buf.push(UINT_FLAG);
            buf.extend_from_slice(&v.to_be_bytes());
        }
        Datum::Float64(v) => {
            if v.is_nan() {
                return Err(CodecError::InvalidFloat);
            }
            buf.push(FLOAT_FLAG);
            buf.extend_from_slice(&encode_float(*v));
        }
        Datum::String(s) => {
            buf.push(BYTES_FLAG);
            encode_bytes(buf, s.as_bytes());
        }
        Datum::Bytes(b) => {
            buf.push(BYTES_FLAG);
            encode_bytes(buf, b);
        }
        Datum::MinNotNull => buf.push(BYTES_FLAG),
        Datum::MaxValue => buf.push(MAX_FLAG),
    }
    Ok(())
}

/// Comparable encoding of a signed integer, without a flag byte.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_int(v: i64) -> [u8; 8] {
    ((v as u64) ^ SIGN_MASK).to_be_bytes()
}

/// Inverse of [`encode_int`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_int(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ SIGN_MASK) as i64
}

const fn encode_float(v: f64) -> [u8; 8] {
    let mut bits = v.to_bits();
    if v >= 0.0 {
        bits |= SIGN_MASK;
    } else {
        bits = !bits;
    }
    bits.to_be_bytes()
}

fn decode_float(bytes: [u8; 8]) -> f64 {
    let mut bits = u64::from_be_bytes(bytes);
    if bits & SIGN_MASK == 0 {
        bits = !bits;
    } else {
        bits &= !SIGN_MASK;
    }
    f64::from_bits(bits)
}

/// Append `data` as memcomparable groups.
///
/// The payload is split into 8-byte groups. Each group is padded with `0x00`
/// and followed by a marker byte of `0xFF - pad_count`, so a payload whose
/// length is a multiple of eight ends with a fully padded group.
pub fn encode_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.reserve((data.len() / ENC_GROUP_SIZE + 1) * (ENC_GROUP_SIZE + 1));
    let mut idx = 0;
    loop {
        let remain = data.len() - idx;
        if remain >= ENC_GROUP_SIZE {
            buf.extend_from_slice(&data[idx..idx + ENC_GROUP_SIZE]);
            buf.push(ENC_MARKER);
            idx += ENC_GROUP_SIZE;
        } else {
            let pad = ENC_GROUP_SIZE - remain;
            buf.extend_from_slice(&data[idx..]);
            buf.resize(buf.len() + pad, ENC_PAD);
            #[allow(clippy::cast_possible_truncation)]
            buf.push(ENC_MARKER - pad as u8);
            return;
        }
    }
}

fn decode_bytes(mut b: &[u8]) -> Result<(Vec<u8>, &[u8]), CodecError> {
    let mut data = Vec::with_capacity(b.len());
    loop {
        let Some(group) = b.get(..=ENC_GROUP_SIZE) else {
            return Err(CodecError::UnexpectedEnd);
        };
        b = &b[ENC_GROUP_SIZE + 1..];

        let marker = group[ENC_GROUP_SIZE];
        let pad = usize::from(ENC_MARKER - marker);
        if pad > ENC_GROUP_SIZE {
            return Err(CodecError::InvalidMarker(marker));
        }
        let real = ENC_GROUP_SIZE - pad;
        data.extend_from_slice(&group[..real]);

        if pad != 0 {
            if group[real..ENC_GROUP_SIZE].iter().any(|&p| p != ENC_PAD) {
                return Err(CodecError::InvalidMarker(marker));
            }
            return Ok((data, b));
        }
    }
}

fn take_8(b: &[u8]) -> Result<([u8; 8], &[u8]), CodecError> {
    let Some(bytes) = b.get(..8) else {
        return Err(CodecError::UnexpectedEnd);
    };
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok((raw, &b[8..]))
}

/// Decode one value from the front of `b`, returning the rest.
pub fn decode_one(b: &[u8]) -> Result<(Datum, &[u8]), CodecError> {
    let Some((&flag, rest)) = b.split_first() else {
        return Err(CodecError::UnexpectedEnd);
    };
    match flag {
        NIL_FLAG => Ok((Datum::Null, rest)),
        INT_FLAG => {
            let (raw, rest) = take_8(rest)?;
            Ok((Datum::Int64(decode_int(raw)), rest))
        }
        UINT_FLAG => {
            let (raw, rest) = take_8(rest)?;
            Ok((Datum::Uint64(u64::from_be_bytes(raw)), rest))
        }
        FLOAT_FLAG => {
            let (raw, rest) = take_8(rest)?;
            Ok((Datum::Float64(decode_float(raw)), rest))
        }
        BYTES_FLAG => {
            let (data, rest) = decode_bytes(rest)?;
            Ok((Datum::Bytes(data), rest))
        }
        MAX_FLAG => Ok((Datum::MaxValue, rest)),
        other => Err(CodecError::InvalidFlag(other)),
    }
}

/// Decode every value in `b`.
///
/// `size_hint` is the number of values the caller expects; more may be
/// present (for example a trailing handle).
pub fn decode(mut b: &[u8], size_hint: usize) -> Result<Vec<Datum>, CodecError> {
    let mut values = Vec::with_capacity(size_hint);
    while !b.is_empty() {
        let (value, rest) = decode_one(b)?;
        values.push(value);
        b = rest;
    }
    Ok(values)
}

/// Errors that can occur while encoding or decoding values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// NaN has no position in the value ordering.
    InvalidFloat,
    /// Input ended in the middle of a value.
    UnexpectedEnd,
    /// Unknown value flag.
    InvalidFlag(u8),
    /// Corrupt memcomparable group marker or padding.
    InvalidMarker(u8),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFloat => write!(f, "cannot encode NaN"),
            Self::UnexpectedEnd => write!(f, "unexpected end of encoded data"),
            Self::InvalidFlag(flag) => write!(f, "invalid value flag: {flag:#04x}"),
            Self::InvalidMarker(marker) => write!(f, "invalid group marker: {marker:#04x}"),
        }
    }
}

impl std::error::Error for CodecError {}
