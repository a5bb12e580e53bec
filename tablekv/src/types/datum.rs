//! Typed scalar values carried by index keys.
//!
//! Provides the `Datum` enum and its `Kind` discriminant.

/// Kind discriminant of a [`Datum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Int64,
    Uint64,
    Float64,
    String,
    Bytes,
    MinNotNull,
    MaxValue,
}

/// A typed scalar value.
///
/// `MinNotNull` and `MaxValue` are sentinels used only as range bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    MinNotNull,
    MaxValue,
}

impl Datum {
    /// Get the kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Int64(_) => Kind::Int64,
            Self::Uint64(_) => Kind::Uint64,
            Self::Float64(_) => Kind::Float64,
            Self::String(_) => Kind::String,
            Self::Bytes(_) => Kind::Bytes,
            Self::MinNotNull => Kind::MinNotNull,
            Self::MaxValue => Kind::MaxValue,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Raw bytes of a string or bytes value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(s) => Some(s.as_bytes()),
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Integer payload, for values decoded from a key's handle suffix.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            Self::Uint64(v) => Some(*v as i64),
            _ => None,
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for Datum {
    fn from(v: u64) -> Self {
        Self::Uint64(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Datum {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Datum {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => write!(f, "{b:02x?}"),
            },
            Self::MinNotNull => write!(f, "-inf"),
            Self::MaxValue => write!(f, "+inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_null() {
        assert_eq!(Datum::Null.kind(), Kind::Null);
        assert!(Datum::Null.is_null());
        assert!(!Datum::Int64(0).is_null());
        assert_eq!(Datum::from("a").kind(), Kind::String);
        assert_eq!(Datum::from(vec![1u8]).kind(), Kind::Bytes);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Datum::from(None::<i64>), Datum::Null);
        assert_eq!(Datum::from(Some(3i64)), Datum::Int64(3));
    }

    #[test]
    fn test_as_bytes() {
        assert_eq!(Datum::from("héllo").as_bytes(), Some("héllo".as_bytes()));
        assert_eq!(Datum::Int64(1).as_bytes(), None);
    }
}
