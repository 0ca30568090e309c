//! Add/edit/save/cancel/delete lifecycle for an item's key-value metadata.
//!
//! Entries are shown in one of two modes: simple scalar text or structured JSON. The transition
//! logic lives in [`reduce_metadata`], a pure reducer that emits [`EditorEffect`] intents.
//! [`MetadataEditor`] runs those intents against the collaborators injected through
//! [`metadata_host::EditorServices`] and feeds their answers back in as actions.

pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod modes;
pub mod reducer;
pub mod session;
pub mod state;

pub use config::EditorConfig;
pub use editor::{DeleteOutcome, MetadataEditor, SaveOutcome};
pub use error::{EditorError, ValidationError};
pub use model::{
    is_json_container, locale_compare, AccessLevel, MetadataCollection, MetadataEntry,
    MetadataMode, MetadataValue, SessionId,
};
pub use modes::{parses_as_json_container, ModeDescriptor, ModeTable, ModeValidator};
pub use reducer::{reduce_metadata, EditorAction, EditorEffect, PersistRequest};
pub use session::{Draft, DraftValue, EditSession, PendingSave};
pub use state::MetadataEditorState;
