//! Metadata entries, their owning collection, and access posture.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
/// Identifier of one edit session. Allocated monotonically from 1 and never reused.
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Representation kind for an entry's value.
pub enum MetadataMode {
    /// Scalar text value.
    Simple,
    /// JSON object or array value.
    #[serde(alias = "json")]
    Structured,
}

impl MetadataMode {
    /// Every mode, in lookup-table order.
    pub const ALL: [Self; 2] = [Self::Simple, Self::Structured];

    /// Returns the stable token used in rendered markup.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Structured => "structured",
        }
    }

    /// Returns the other mode, which is what the editor toggle button targets.
    pub const fn toggled(self) -> Self {
        match self {
            Self::Simple => Self::Structured,
            Self::Structured => Self::Simple,
        }
    }
}

impl std::fmt::Display for MetadataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
/// A metadata value tagged with its representation.
///
/// The variant is the mode, so a value can never disagree with the mode it is shown in.
pub enum MetadataValue {
    /// String, number, boolean, or null.
    Scalar(Value),
    /// JSON object or array.
    Structured(Value),
}

impl MetadataValue {
    /// Wraps raw text as a simple value.
    pub fn text(raw: impl Into<String>) -> Self {
        Self::Scalar(Value::String(raw.into()))
    }

    /// Classifies a stored JSON value: containers are structured, everything else simple.
    ///
    /// `null` is a scalar. Structured parsing only accepts containers, so a `null` shown in the
    /// structured editor could never be saved back unchanged.
    pub fn from_json(value: Value) -> Self {
        if is_json_container(&value) {
            Self::Structured(value)
        } else {
            Self::Scalar(value)
        }
    }

    /// Returns the mode implied by the variant.
    pub const fn mode(&self) -> MetadataMode {
        match self {
            Self::Scalar(_) => MetadataMode::Simple,
            Self::Structured(_) => MetadataMode::Structured,
        }
    }

    /// Returns the underlying JSON value.
    pub fn as_json(&self) -> &Value {
        match self {
            Self::Scalar(value) | Self::Structured(value) => value,
        }
    }

    /// Consumes the wrapper and returns the JSON value.
    pub fn into_json(self) -> Value {
        match self {
            Self::Scalar(value) | Self::Structured(value) => value,
        }
    }
}

/// Returns whether `value` is a JSON object or array.
pub fn is_json_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One key/value metadata pair attached to an item.
pub struct MetadataEntry {
    /// Metadata key, unique within the owning collection.
    pub key: String,
    /// Stored value.
    pub value: MetadataValue,
}

impl MetadataEntry {
    /// Builds an entry.
    pub fn new(key: impl Into<String>, value: MetadataValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Returns the entry's representation mode.
    pub const fn mode(&self) -> MetadataMode {
        self.value.mode()
    }
}

/// Orders metadata keys the way the item view lists them.
///
/// Keys compare case-insensitively first; keys equal under that rule fall back to a raw
/// comparison so the order stays total.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Entries attached to one item, unique by key and kept in [`locale_compare`] order.
pub struct MetadataCollection {
    entries: Vec<MetadataEntry>,
}

impl MetadataCollection {
    /// Builds a collection from an item's `meta` object.
    pub fn from_meta(meta: &Map<String, Value>) -> Self {
        let mut collection = Self::default();
        for (key, value) in meta {
            collection.upsert(MetadataEntry::new(
                key.clone(),
                MetadataValue::from_json(value.clone()),
            ));
        }
        collection
    }

    /// Converts the collection back into a `meta` object.
    pub fn to_meta(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.as_json().clone()))
            .collect()
    }

    /// Returns the entries in display order.
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// Returns the keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the collection has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by exact key.
    pub fn get(&self, key: &str) -> Option<&MetadataEntry> {
        self.position(key).ok().map(|index| &self.entries[index])
    }

    /// Returns whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Inserts `entry`, replacing any entry with the same key. Returns the replaced entry.
    pub fn upsert(&mut self, entry: MetadataEntry) -> Option<MetadataEntry> {
        match self.position(&entry.key) {
            Ok(index) => Some(std::mem::replace(&mut self.entries[index], entry)),
            Err(index) => {
                self.entries.insert(index, entry);
                None
            }
        }
    }

    /// Removes and returns the entry stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<MetadataEntry> {
        self.position(key)
            .ok()
            .map(|index| self.entries.remove(index))
    }

    /// Stores `entry` in place of the entry previously keyed `old_key`.
    ///
    /// Handles key renames: the old key is dropped before the new entry is positioned.
    pub fn replace(&mut self, old_key: &str, entry: MetadataEntry) {
        self.remove(old_key);
        self.upsert(entry);
    }

    fn position(&self, key: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|probe| locale_compare(&probe.key, key))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Caller's access level on the item whose metadata is being edited.
pub enum AccessLevel {
    /// May view metadata only.
    #[default]
    Read,
    /// May add, edit and delete metadata.
    Write,
    /// Full control; implies write.
    Admin,
}

impl AccessLevel {
    /// Returns whether metadata mutations are allowed.
    pub fn can_write(self) -> bool {
        self >= Self::Write
    }
}
