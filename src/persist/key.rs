//! Key Codec Module
//!
//! Snapshots are string-keyed, so every cache key needs a canonical
//! string form and a way back.

use std::fmt;
use std::hash::Hash;

// == Key Codec ==
/// A primitive cache key that round-trips through a string.
pub trait KeyCodec: Hash + Eq + Clone + fmt::Debug {
    fn encode_key(&self) -> String;

    /// Returns None when `raw` is not a valid encoding for this type.
    fn decode_key(raw: &str) -> Option<Self>;
}

impl KeyCodec for String {
    fn encode_key(&self) -> String {
        self.clone()
    }

    fn decode_key(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl KeyCodec for bool {
    fn encode_key(&self) -> String {
        self.to_string()
    }

    fn decode_key(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

macro_rules! impl_integer_key {
    ($($ty:ty),*) => {
        $(
            impl KeyCodec for $ty {
                fn encode_key(&self) -> String {
                    self.to_string()
                }

                fn decode_key(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )*
    };
}

impl_integer_key!(i32, i64, u32, u64, usize);

// == Dynamic Key ==
/// Key whose primitive type is only known at runtime.
///
/// Decoding infers the type from the string: `"true"`/`"false"` become
/// `Bool`, a canonical integer becomes `Int`, anything else stays `Str`.
/// A string key that looks like an integer or boolean therefore comes back
/// as that type after a restore.
///
/// There is no floating-point variant: `f64` is neither `Eq` nor `Hash`.
/// Fractional and exponent forms such as `"1.5"` or `"1e3"` are not
/// treated as numbers and restore as `Str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Key {
    /// Applies the decode-side type inference to a raw string.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => return Key::Bool(true),
            "false" => return Key::Bool(false),
            _ => {}
        }
        // Only canonical forms, so "007" or "+1" stay strings
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Key::Int(n),
            _ => Key::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(n) => write!(f, "{n}"),
            Key::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl KeyCodec for Key {
    fn encode_key(&self) -> String {
        self.to_string()
    }

    fn decode_key(raw: &str) -> Option<Self> {
        Some(Key::infer(raw))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value.into())
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Bool(value)
    }
}
