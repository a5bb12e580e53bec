//! Column prefix truncation for `col(length)` indexes.

use crate::model::{IndexInfo, TableInfo};
use crate::types::Datum;

/// Truncate indexed values to their columns' prefix lengths.
///
/// UTF-8 family columns are cut to `length` Unicode scalar values, every other
/// charset to `length` bytes. Values of other kinds, and columns without a
/// prefix length, pass through unchanged. Operates in place and returns the
/// same slice.
pub fn truncate_index_values_if_needed<'a>(
    table: &TableInfo,
    index: &IndexInfo,
    values: &'a mut [Datum],
) -> &'a mut [Datum] {
    for (value, column) in values.iter_mut().zip(&index.columns) {
        let Some(length) = column.length else {
            continue;
        };
        let utf8 = table.charset_at(column.offset).is_utf8();
        if let Some(truncated) = truncate_value(value, length, utf8) {
            *value = truncated;
        }
    }
    values
}

/// Returns a replacement when `value` needs to change kind or be rebuilt.
fn truncate_value(value: &mut Datum, length: usize, utf8: bool) -> Option<Datum> {
    match value {
        Datum::String(s) if utf8 => {
            if let Some((end, _)) = s.char_indices().nth(length) {
                s.truncate(end);
            }
            None
        }
        Datum::String(s) => {
            if s.len() <= length {
                return None;
            }
            if s.is_char_boundary(length) {
                s.truncate(length);
                return None;
            }
            // A byte cut inside a character is no longer valid text.
            Some(Datum::Bytes(s.as_bytes()[..length].to_vec()))
        }
        Datum::Bytes(b) if utf8 => {
            if runes(b).nth(length).is_none() {
                return None;
            }
            let truncated: String = runes(b).take(length).collect();
            Some(Datum::Bytes(truncated.into_bytes()))
        }
        Datum::Bytes(b) => {
            b.truncate(length);
            None
        }
        _ => None,
    }
}

/// Decode `b` as UTF-8 where every invalid byte is its own U+FFFD rune.
fn runes(b: &[u8]) -> impl Iterator<Item = char> + '_ {
    b.utf8_chunks().flat_map(|chunk| {
        chunk.valid().chars().chain(std::iter::repeat_n(
            char::REPLACEMENT_CHARACTER,
            chunk.invalid().len(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Charset, ColumnInfo, IndexColumn};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn table(charset: Charset) -> TableInfo {
        TableInfo {
            id: 1,
            name: "t".to_string(),
            columns: vec![
                ColumnInfo {
                    name: "a".to_string(),
                    offset: 0,
                    charset,
                },
                ColumnInfo {
                    name: "b".to_string(),
                    offset: 1,
                    charset,
                },
            ],
        }
    }

    fn index_info(length: Option<usize>) -> IndexInfo {
        IndexInfo {
            id: 1,
            name: "idx".to_string(),
            columns: vec![
                IndexColumn {
                    name: "a".to_string(),
                    offset: 0,
                    length,
                },
                IndexColumn {
                    name: "b".to_string(),
                    offset: 1,
                    length: None,
                },
            ],
            unique: false,
        }
    }

    #[test]
    fn test_utf8_truncates_by_rune() {
        let table = table(Charset::Utf8mb4);
        let index = index_info(Some(3));
        let mut values = vec![Datum::from("héllo"), Datum::from("untouched text")];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::from("hél"));
        assert_eq!(values[1], Datum::from("untouched text"));
    }

    #[test]
    fn test_utf8_bytes_truncate_by_rune() {
        let table = table(Charset::Utf8);
        let index = index_info(Some(2));
        let mut values = vec![Datum::Bytes("日本語".as_bytes().to_vec())];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::Bytes("日本".as_bytes().to_vec()));
    }

    #[test]
    fn test_utf8_bytes_count_each_invalid_byte() {
        let table = table(Charset::Utf8mb4);
        let index = index_info(Some(3));

        // A cut-off three-byte sequence is two runes, one per byte.
        let mut values = vec![Datum::Bytes(vec![0xE6, 0x97, b'a', b'b'])];
        truncate_index_values_if_needed(&table, &index, &mut values);
        let mut expected = "\u{FFFD}\u{FFFD}".as_bytes().to_vec();
        expected.push(b'a');
        assert_eq!(values[0], Datum::Bytes(expected));

        let mut values = vec![Datum::Bytes(vec![0xFF, b'a', 0xFE])];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::Bytes(vec![0xFF, b'a', 0xFE]));
    }

    #[test]
    fn test_binary_truncates_by_byte() {
        let table = table(Charset::Binary);
        let index = index_info(Some(2));
        let mut values = vec![Datum::Bytes(vec![1, 2, 3, 4])];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::Bytes(vec![1, 2]));

        let mut values = vec![Datum::from("héllo")];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::Bytes(vec![b'h', 0xC3]));

        let mut values = vec![Datum::from("hello")];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::from("he"));
    }

    #[test]
    fn test_non_string_and_short_values_unchanged() {
        let table = table(Charset::Utf8mb4);
        let index = index_info(Some(3));
        let mut values = vec![Datum::Int64(123_456)];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::Int64(123_456));

        let mut values = vec![Datum::from("ab")];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::from("ab"));

        let index = index_info(None);
        let mut values = vec![Datum::from("a long value")];
        truncate_index_values_if_needed(&table, &index, &mut values);
        assert_eq!(values[0], Datum::from("a long value"));
    }

    fn random_text(rng: &mut StdRng) -> String {
        const ALPHABET: [char; 6] = ['a', 'z', 'é', 'ß', '日', '🦀'];
        let len = rng.random_range(0..12);
        (0..len)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
            .collect()
    }

    #[test]
    fn test_truncation_idempotent_and_utf8_safe() {
        let mut rng = StdRng::seed_from_u64(17);
        for charset in [Charset::Utf8mb4, Charset::Latin1] {
            let table = table(charset);
            for _ in 0..500 {
                let length = rng.random_range(0..8);
                let index = index_info(Some(length));
                let text = random_text(&mut rng);

                let mut once = vec![Datum::from(text.as_str())];
                truncate_index_values_if_needed(&table, &index, &mut once);
                let mut twice = once.to_vec();
                truncate_index_values_if_needed(&table, &index, &mut twice);
                assert_eq!(once, twice);

                match &once[0] {
                    Datum::String(s) if charset.is_utf8() => {
                        assert!(s.chars().count() <= length);
                        assert!(text.starts_with(s.as_str()));
                    }
                    other => {
                        let bytes = other.as_bytes().expect("string or bytes");
                        assert!(bytes.len() <= length);
                        assert!(text.as_bytes().starts_with(bytes));
                    }
                }
            }
        }
    }
}
