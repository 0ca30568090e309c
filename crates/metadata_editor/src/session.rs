//! Transient add/edit sessions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    model::{is_json_container, MetadataEntry, MetadataMode, MetadataValue, SessionId},
    modes::ModeTable,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
/// In-progress value shown by an open editor.
pub enum DraftValue {
    /// Raw editor text.
    Text(String),
    /// Parsed JSON handed to a structured editor.
    Json(Value),
}

impl DraftValue {
    /// Empty text draft.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Prefill for an editor in `mode` from raw pending text.
    ///
    /// Structured editors receive parsed JSON when the text holds a container; anything else stays
    /// text so nothing the user typed is lost.
    pub fn prefill(mode: MetadataMode, pending: &str) -> Self {
        if mode == MetadataMode::Structured {
            if let Ok(value) = serde_json::from_str::<Value>(pending) {
                if is_json_container(&value) {
                    return Self::Json(value);
                }
            }
        }
        Self::Text(pending.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Key and value currently shown by an open editor.
pub struct Draft {
    /// In-progress key.
    pub key: String,
    /// In-progress value.
    pub value: DraftValue,
}

#[derive(Debug, Clone, PartialEq)]
/// Parsed values waiting on the persistence collaborator.
pub struct PendingSave {
    /// Key being written.
    pub key: String,
    /// Value being written.
    pub value: MetadataValue,
}

#[derive(Debug, Clone, PartialEq)]
/// State of one open add or edit.
pub struct EditSession {
    /// Session identifier.
    pub id: SessionId,
    /// Key of the saved entry being edited; empty for new entries.
    pub original_key: String,
    /// Last saved value; `None` for new entries.
    pub original_value: Option<MetadataValue>,
    /// Mode of the last saved value, or the mode the add started in.
    pub original_mode: MetadataMode,
    /// Whether the entry has never been saved.
    pub is_new: bool,
    /// Mode of the open editor.
    pub current_mode: MetadataMode,
    /// What the open editor shows.
    pub draft: Draft,
    /// Save in flight, if any.
    pub pending_save: Option<PendingSave>,
}

impl EditSession {
    /// Opens a session for a not-yet-saved entry.
    pub fn new_entry(id: SessionId, mode: MetadataMode) -> Self {
        Self {
            id,
            original_key: String::new(),
            original_value: None,
            original_mode: mode,
            is_new: true,
            current_mode: mode,
            draft: Draft {
                key: String::new(),
                value: DraftValue::empty(),
            },
            pending_save: None,
        }
    }

    /// Opens a session over a saved entry.
    pub fn for_entry(id: SessionId, entry: &MetadataEntry, modes: &ModeTable) -> Self {
        let mode = entry.mode();
        let value = match &entry.value {
            MetadataValue::Structured(json) => DraftValue::Json(json.clone()),
            scalar @ MetadataValue::Scalar(_) => DraftValue::Text(modes.display_value(scalar)),
        };
        Self {
            id,
            original_key: entry.key.clone(),
            original_value: Some(entry.value.clone()),
            original_mode: mode,
            is_new: false,
            current_mode: mode,
            draft: Draft {
                key: entry.key.clone(),
                value,
            },
            pending_save: None,
        }
    }

    /// Whether this session edits the saved entry `key`.
    pub fn edits_key(&self, key: &str) -> bool {
        !self.is_new && self.original_key == key
    }

    /// Whether a save is waiting on the persistence collaborator.
    pub fn is_saving(&self) -> bool {
        self.pending_save.is_some()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn edit_session_prefills_structured_entries_with_parsed_json() {
        let entry = MetadataEntry::new("dims", MetadataValue::Structured(json!({"w": 2})));
        let session = EditSession::for_entry(SessionId(7), &entry, &ModeTable::default());

        assert_eq!(session.current_mode, MetadataMode::Structured);
        assert_eq!(session.draft.value, DraftValue::Json(json!({"w": 2})));
        assert!(session.edits_key("dims"));
        assert!(!session.is_new);
    }

    #[test]
    fn structured_prefill_keeps_unparseable_text() {
        assert_eq!(
            DraftValue::prefill(MetadataMode::Structured, "{\"a\":1}"),
            DraftValue::Json(json!({"a": 1}))
        );
        assert_eq!(
            DraftValue::prefill(MetadataMode::Structured, "red"),
            DraftValue::Text("red".to_string())
        );
        assert_eq!(
            DraftValue::prefill(MetadataMode::Simple, "{\"a\":1}"),
            DraftValue::Text("{\"a\":1}".to_string())
        );
    }
}
