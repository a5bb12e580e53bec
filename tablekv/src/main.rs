//! `tablekv-inspect <hex-key> [column-count]`
//!
//! Decodes a raw index key and prints the table and index it belongs to, the
//! indexed column values, and the row handle when the key carries one.

use clap::Parser;
use tablekv::codec;
use tablekv::config::IndexConfig;
use tablekv::tablecodec::decode_index_prefix;
use tablekv::types::{Datum, Handle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Decode a raw index key.
#[derive(Parser, Debug)]
#[command(name = "tablekv-inspect", version)]
struct Args {
    /// Index key as hex, with or without a `0x` prefix.
    #[arg(value_parser = parse_hex)]
    key: HexKey,

    /// Number of indexed columns; a trailing extra value is the handle.
    column_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HexKey(Vec<u8>);

/// A decoded index key.
#[derive(Debug, PartialEq)]
struct DecodedKey {
    physical_id: i64,
    index_id: i64,
    values: Vec<Datum>,
    handle: Option<Handle>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablekv=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match IndexConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(
        "Loaded configuration: batch_check={}, key_buffer_capacity={}",
        config.batch_check,
        config.key_buffer_capacity
    );

    match decode_key(&args.key.0, args.column_count) {
        Ok(decoded) => {
            println!("table:  {}", decoded.physical_id);
            println!("index:  {}", decoded.index_id);
            for (i, value) in decoded.values.iter().enumerate() {
                println!("col[{i}]: {value}");
            }
            match decoded.handle {
                Some(handle) => println!("handle: {handle}"),
                None => println!("handle: <in value>"),
            }
        }
        Err(e) => {
            tracing::error!("failed to decode key: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_hex(s: &str) -> Result<HexKey, String> {
    let s = s.trim().trim_start_matches("0x");
    if !s.len().is_multiple_of(2) {
        return Err(format!("odd number of hex digits: {}", s.len()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex digit at offset {i}"))
        })
        .collect::<Result<_, _>>()
        .map(HexKey)
}

/// Split `key` into its prefix ids and values.
///
/// With a column count, a trailing extra integer is reported as the handle.
/// Without one, every value is listed.
fn decode_key(key: &[u8], column_count: Option<usize>) -> Result<DecodedKey, String> {
    let (physical_id, index_id, rest) =
        decode_index_prefix(key).ok_or_else(|| "not an index key".to_string())?;
    let mut values =
        codec::decode(rest, column_count.unwrap_or_default()).map_err(|e| e.to_string())?;

    let handle = match column_count {
        Some(count) if values.len() == count + 1 => values.pop().as_ref().and_then(Datum::as_i64),
        _ => None,
    };

    tracing::debug!(physical_id, index_id, values = values.len(), "decoded key");
    Ok(DecodedKey {
        physical_id,
        index_id,
        values,
        handle,
    })
}
