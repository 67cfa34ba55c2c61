//! Snapshot Module
//!
//! JSON wire format of a persisted cache:
//! `{ "<key>": { "value": <V>, "expiresAt": <epoch ms> | null }, ... }`
//!
//! Entries keep their order in both directions.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

// == Persisted Entry ==
/// One persisted value with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry<V> {
    pub value: V,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

// == Snapshot ==
/// Ordered list of string-keyed entries, encoded as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<V> {
    pub entries: Vec<(String, PersistedEntry<V>)>,
}

impl<V> Default for Snapshot<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Snapshot<V> {
    pub fn push(&mut self, key: String, value: V, expires_at: Option<i64>) {
        self.entries
            .push((key, PersistedEntry { value, expires_at }));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Snapshot<V> {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<V: DeserializeOwned> Snapshot<V> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl<V: Serialize> Serialize for Snapshot<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

struct SnapshotVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for SnapshotVisitor<V> {
    type Value = Snapshot<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of keys to persisted entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, entry)) = access.next_entry::<String, PersistedEntry<V>>()? {
            entries.push((key, entry));
        }
        Ok(Snapshot { entries })
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Snapshot<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor(PhantomData))
    }
}
