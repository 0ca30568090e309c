//! Driver that runs reducer effects against the injected collaborators.
//!
//! [`MetadataEditor`] owns the reducer state and the [`EditorServices`] bundle. Each public
//! operation dispatches one action, executes the effects that need a collaborator (persistence,
//! confirmation), feeds the completion back into the reducer, and surfaces any error through the
//! notification service. State lives in a `RefCell` that is never borrowed across an `.await`, so
//! saves on different entries may be in flight at the same time.

use std::{cell::RefCell, rc::Rc};

use leptos::logging;
use metadata_host::EditorServices;
use serde_json::{Map, Value};

use crate::{
    config::EditorConfig,
    error::EditorError,
    model::{AccessLevel, MetadataCollection, MetadataEntry, MetadataMode, SessionId},
    reducer::{reduce_metadata, EditorAction, EditorEffect, PersistRequest},
    session::EditSession,
    state::MetadataEditorState,
};

#[derive(Debug, Clone, PartialEq)]
/// Result of [`MetadataEditor::save`].
pub enum SaveOutcome {
    /// The collaborator accepted the change and the entry was updated.
    Saved(MetadataEntry),
    /// The session was closed before the collaborator answered; nothing changed locally.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of [`MetadataEditor::delete_entry`].
pub enum DeleteOutcome {
    /// The entry was removed.
    Deleted,
    /// The user answered no; nothing was sent.
    Declined,
    /// The view was rebuilt while the delete was pending; nothing changed locally.
    Discarded,
}

#[derive(Clone)]
/// Metadata editor for one item.
pub struct MetadataEditor {
    state: Rc<RefCell<MetadataEditorState>>,
    services: EditorServices,
}

impl MetadataEditor {
    /// Wraps prepared state and collaborators.
    pub fn new(state: MetadataEditorState, services: EditorServices) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            services,
        }
    }

    /// Builds an editor over an item's `meta` object with default modes and config.
    pub fn for_item(
        meta: &Map<String, Value>,
        access: AccessLevel,
        services: EditorServices,
    ) -> Self {
        Self::new(MetadataEditorState::from_meta(meta, access), services)
    }

    /// Returns a copy of the saved entries.
    pub fn entries(&self) -> MetadataCollection {
        self.state.borrow().collection.clone()
    }

    /// Returns a copy of an open session.
    pub fn session(&self, id: SessionId) -> Option<EditSession> {
        self.state.borrow().session(id).cloned()
    }

    /// Ids of every open session, oldest first.
    pub fn open_sessions(&self) -> Vec<SessionId> {
        self.state.borrow().sessions.keys().copied().collect()
    }

    /// Returns the active config.
    pub fn config(&self) -> EditorConfig {
        self.state.borrow().config.clone()
    }

    /// Renders an entry's value as editor text.
    pub fn display_value(&self, entry: &MetadataEntry) -> String {
        self.state.borrow().modes.display_value(&entry.value)
    }

    /// Applies one action to the state without running any collaborator.
    ///
    /// # Errors
    ///
    /// Propagates the reducer error.
    pub fn dispatch(&self, action: EditorAction) -> Result<Vec<EditorEffect>, EditorError> {
        let result = reduce_metadata(&mut self.state.borrow_mut(), action);
        if let Err(err) = &result {
            logging::warn!("metadata reducer error: {err}");
        }
        result
    }

    async fn dispatch_reported(
        &self,
        action: EditorAction,
    ) -> Result<Vec<EditorEffect>, EditorError> {
        match self.dispatch(action) {
            Ok(effects) => Ok(effects),
            Err(err) => {
                self.report(&err).await;
                Err(err)
            }
        }
    }

    async fn report(&self, err: &EditorError) {
        let notice = err.notice();
        if let Err(delivery) = self.services.notifications.notify(&notice).await {
            logging::warn!("metadata notice delivery failed: {delivery}");
        }
    }

    /// Opens an editor for a new entry in `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::PermissionDenied`] without write access.
    pub async fn start_add(&self, mode: MetadataMode) -> Result<SessionId, EditorError> {
        let effects = self
            .dispatch_reported(EditorAction::StartAdd { mode })
            .await?;
        opened_session(&effects)
    }

    /// Opens an editor for a new entry in the configured default mode.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::PermissionDenied`] without write access.
    pub async fn start_add_default(&self) -> Result<SessionId, EditorError> {
        let mode = self.state.borrow().config.default_add_mode;
        self.start_add(mode).await
    }

    /// Opens an editor over the saved entry `key`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EntryNotFound`] or [`EditorError::AlreadyEditing`].
    pub async fn start_edit(&self, key: &str) -> Result<SessionId, EditorError> {
        let effects = self
            .dispatch_reported(EditorAction::StartEdit {
                key: key.to_string(),
            })
            .await?;
        opened_session(&effects)
    }

    /// Converts an open editor to `target`, carrying over the typed key and value.
    ///
    /// # Errors
    ///
    /// Returns a validation error (already shown as a warning) when the target mode rejects the
    /// pending value; the session is left as it was.
    pub async fn request_mode_switch(
        &self,
        session: SessionId,
        target: MetadataMode,
        pending_key: &str,
        pending_value: &str,
    ) -> Result<(), EditorError> {
        self.dispatch_reported(EditorAction::RequestModeSwitch {
            session,
            target,
            pending_key: pending_key.to_string(),
            pending_value: pending_value.to_string(),
        })
        .await
        .map(|_| ())
    }

    /// Converts an open editor to `target` without validation, dropping the typed value.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::SessionNotFound`] or [`EditorError::SaveInFlight`].
    pub async fn force_mode_switch(
        &self,
        session: SessionId,
        target: MetadataMode,
        pending_key: &str,
    ) -> Result<(), EditorError> {
        self.dispatch_reported(EditorAction::ForceModeSwitch {
            session,
            target,
            pending_key: pending_key.to_string(),
        })
        .await
        .map(|_| ())
    }

    /// Validates and persists the editor contents.
    ///
    /// # Errors
    ///
    /// Validation failures return before any collaborator call. Collaborator failures return
    /// [`EditorError::Persistence`] after being shown at danger severity; the session stays open.
    pub async fn save(
        &self,
        session: SessionId,
        key: &str,
        raw_value: &str,
    ) -> Result<SaveOutcome, EditorError> {
        let effects = self
            .dispatch_reported(EditorAction::Save {
                session,
                key: key.to_string(),
                raw_value: raw_value.to_string(),
            })
            .await?;
        let Some(request) = effects.into_iter().find_map(|effect| match effect {
            EditorEffect::Persist { request, .. } => Some(request),
            _ => None,
        }) else {
            return Ok(SaveOutcome::Discarded);
        };

        let persistence = &self.services.persistence;
        let result = match &request {
            PersistRequest::Add { key, value } => persistence.add_metadata(key, value).await,
            PersistRequest::Edit {
                old_key,
                new_key,
                value,
            } => persistence.edit_metadata(old_key, new_key, value).await,
        };

        let effects = self
            .dispatch_reported(EditorAction::SaveCompleted { session, result })
            .await?;
        Ok(effects
            .into_iter()
            .find_map(|effect| match effect {
                EditorEffect::EntrySaved { entry, .. } => Some(SaveOutcome::Saved(entry)),
                _ => None,
            })
            .unwrap_or(SaveOutcome::Discarded))
    }

    /// Closes an editor without saving.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::SessionNotFound`] when the session is already closed and
    /// [`EditorError::SaveInFlight`] while its save is waiting on the collaborator.
    pub async fn cancel(&self, session: SessionId) -> Result<(), EditorError> {
        self.dispatch_reported(EditorAction::Cancel { session })
            .await
            .map(|_| ())
    }

    /// Deletes the saved entry `key` after the user confirms.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EntryNotFound`] for unknown keys and [`EditorError::Persistence`]
    /// when the collaborator refuses the delete.
    pub async fn delete_entry(&self, key: &str) -> Result<DeleteOutcome, EditorError> {
        let effects = self
            .dispatch_reported(EditorAction::RequestDelete {
                key: key.to_string(),
            })
            .await?;
        let Some((generation, request)) = effects.into_iter().find_map(|effect| match effect {
            EditorEffect::Confirm {
                generation,
                request,
                ..
            } => Some((generation, request)),
            _ => None,
        }) else {
            return Ok(DeleteOutcome::Discarded);
        };

        if !self.services.confirmation.confirm(&request).await {
            logging::log!("delete of metadatum {key} declined");
            return Ok(DeleteOutcome::Declined);
        }

        let effects = self
            .dispatch_reported(EditorAction::DeleteConfirmed {
                key: key.to_string(),
                generation,
            })
            .await?;
        if !effects
            .iter()
            .any(|effect| matches!(effect, EditorEffect::Remove { .. }))
        {
            return Ok(DeleteOutcome::Discarded);
        }

        let result = self.services.persistence.remove_metadata(key).await;
        let effects = self
            .dispatch_reported(EditorAction::DeleteCompleted {
                key: key.to_string(),
                generation,
                result,
            })
            .await?;
        if effects
            .iter()
            .any(|effect| matches!(effect, EditorEffect::EntryRemoved { .. }))
        {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Discarded)
        }
    }

    /// Rebuilds the entries from the item's `meta` object, closing every editor.
    ///
    /// # Errors
    ///
    /// Propagates the reducer error.
    pub fn hydrate(&self, meta: Map<String, Value>) -> Result<(), EditorError> {
        self.dispatch(EditorAction::Hydrate { meta }).map(|_| ())
    }

    /// Changes the caller's access level.
    ///
    /// # Errors
    ///
    /// Propagates the reducer error.
    pub fn set_access_level(&self, access: AccessLevel) -> Result<(), EditorError> {
        self.dispatch(EditorAction::SetAccessLevel { access })
            .map(|_| ())
    }

    /// Closes every editor; collaborator answers still in flight will be ignored.
    ///
    /// # Errors
    ///
    /// Propagates the reducer error.
    pub fn teardown(&self) -> Result<(), EditorError> {
        self.dispatch(EditorAction::Teardown).map(|_| ())
    }
}

impl std::fmt::Debug for MetadataEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataEditor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn opened_session(effects: &[EditorEffect]) -> Result<SessionId, EditorError> {
    effects
        .iter()
        .find_map(|effect| match effect {
            EditorEffect::OpenEditor { session, .. } => Some(*session),
            _ => None,
        })
        .ok_or(EditorError::EditorNotOpened)
}
