use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of leading key characters shown while a key is masked.
pub const MASKED_PREFIX_LEN: usize = 12;

/// Marker appended to a masked key.
pub const MASK_MARKER: &str = "...";

/// Store-assigned record id. Opaque to the dashboard.
///
/// Hosted stores hand out either integer or UUID primary keys, so both
/// JSON numbers and strings are accepted and normalised to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for KeyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for KeyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(s) if s.is_empty() => Err(serde::de::Error::custom("empty record id")),
            RawId::Text(s) => Ok(KeyId(s)),
            RawId::Int(n) => Ok(KeyId(n.to_string())),
        }
    }
}

/// A persisted API key as returned by the record store.
///
/// Every field is required: a store row missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: KeyId,
    pub name: String,
    pub key: String,
    pub usage: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// The key as it should be displayed: full if `visible`, masked otherwise.
    pub fn display_key(&self, visible: bool) -> String {
        if visible {
            self.key.clone()
        } else {
            mask_key(&self.key)
        }
    }
}

/// Insert payload. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewApiKey {
    pub name: String,
    pub key: String,
    pub usage: u64,
    pub created_at: DateTime<Utc>,
}

impl NewApiKey {
    /// A fresh record with zero usage, stamped now.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            usage: 0,
            created_at: Utc::now(),
        }
    }
}

/// Partial update. Only set fields are sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl KeyUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

/// Accepts RFC 3339 timestamps, and zone-less ones (`timestamp` columns)
/// which are taken as UTC.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid created_at '{}': {}", raw, e)))
}

/// First 12 characters of `key` followed by `...`.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(MASKED_PREFIX_LEN).collect();
    format!("{}{}", visible, MASK_MARKER)
}
