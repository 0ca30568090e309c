//! Owned editor state: the saved collection plus every open session.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
    config::EditorConfig,
    model::{AccessLevel, MetadataCollection, SessionId},
    modes::ModeTable,
    session::EditSession,
};

#[derive(Debug, Clone)]
/// State mutated by [`crate::reduce_metadata`].
pub struct MetadataEditorState {
    /// Saved entries, in display order.
    pub collection: MetadataCollection,
    /// Open sessions keyed by id.
    pub sessions: BTreeMap<SessionId, EditSession>,
    /// Caller's access level on the item.
    pub access: AccessLevel,
    /// Mode descriptor table.
    pub modes: ModeTable,
    /// Tunables.
    pub config: EditorConfig,
    /// Bumped whenever the view is torn down or rebuilt; stale delete completions carry an older
    /// value.
    pub generation: u64,
    next_session_id: u64,
}

impl MetadataEditorState {
    /// Builds state over an existing collection with default modes and config.
    pub fn new(collection: MetadataCollection, access: AccessLevel) -> Self {
        Self {
            collection,
            sessions: BTreeMap::new(),
            access,
            modes: ModeTable::default(),
            config: EditorConfig::default(),
            generation: 0,
            next_session_id: 1,
        }
    }

    /// Builds state from an item's `meta` object.
    pub fn from_meta(meta: &Map<String, Value>, access: AccessLevel) -> Self {
        Self::new(MetadataCollection::from_meta(meta), access)
    }

    /// Replaces the config, applying its display settings to the mode table.
    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.modes = self.modes.with_indent(config.structured_indent);
        self.config = config;
        self
    }

    /// Replaces the mode table, keeping the configured indent.
    pub fn with_modes(mut self, modes: ModeTable) -> Self {
        self.modes = modes.with_indent(self.config.structured_indent);
        self
    }

    /// Returns an open session.
    pub fn session(&self, id: SessionId) -> Option<&EditSession> {
        self.sessions.get(&id)
    }

    /// Returns the open session editing the saved entry `key`.
    pub fn session_for_key(&self, key: &str) -> Option<&EditSession> {
        self.sessions.values().find(|session| session.edits_key(key))
    }

    pub(crate) fn allocate_session_id(&mut self) -> SessionId {
        let id = SessionId(self.next_session_id);
        self.next_session_id += 1;
        id
    }

    /// Closes every open session and invalidates outstanding callbacks.
    pub(crate) fn discard_sessions(&mut self) -> Vec<SessionId> {
        self.generation += 1;
        let closed = self.sessions.keys().copied().collect();
        self.sessions.clear();
        closed
    }
}
