//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::{model::MetadataMode, modes::DEFAULT_STRUCTURED_INDENT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Tunables for one editor instance. Missing fields fall back to [`EditorConfig::default`].
pub struct EditorConfig {
    /// Label of the affirmative button in the delete prompt.
    pub delete_confirm_label: String,
    /// Indent width for structured display text.
    pub structured_indent: usize,
    /// Reject keys the server cannot store (containing `.` or starting with `$`) before saving.
    pub enforce_key_rules: bool,
    /// Mode used by the "add metadata" button when the host does not choose one.
    pub default_add_mode: MetadataMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            delete_confirm_label: "Delete".to_string(),
            structured_indent: DEFAULT_STRUCTURED_INDENT,
            enforce_key_rules: true,
            default_add_mode: MetadataMode::Simple,
        }
    }
}

impl EditorConfig {
    /// Parses a config from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the JSON decode error text.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    /// Builds the delete prompt text for `key`.
    pub fn delete_prompt(&self, key: &str) -> String {
        format!("Are you sure you want to delete the metadatum {key}?")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config =
            EditorConfig::from_json_str(r#"{"structured_indent": 2, "default_add_mode": "json"}"#)
                .expect("decode");

        assert_eq!(config.structured_indent, 2);
        assert_eq!(config.default_add_mode, MetadataMode::Structured);
        assert_eq!(config.delete_confirm_label, "Delete");
        assert!(config.enforce_key_rules);
    }

    #[test]
    fn malformed_config_reports_decode_error() {
        assert!(EditorConfig::from_json_str("{").is_err());
    }
}
