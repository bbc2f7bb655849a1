//! Serde adapter for `u128` amounts.
//!
//! Amounts serialize as decimal strings so they survive JSON consumers that
//! read numbers as doubles. Deserialization accepts a string or an integer.

use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Text(s) => s.trim().parse().map_err(de::Error::custom),
        Repr::Number(n) => Ok(n as u128),
    }
}
