//! Editor actions, side-effect intents, and the transition logic between them.

use leptos::logging;
use metadata_host::{ConfirmRequest, PersistenceError};
use serde_json::{Map, Value};

use crate::{
    error::{EditorError, ValidationError},
    model::{AccessLevel, MetadataCollection, MetadataEntry, MetadataMode, SessionId},
    session::{Draft, DraftValue, EditSession, PendingSave},
    state::MetadataEditorState,
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_metadata`].
pub enum EditorAction {
    /// Open an editor for a new entry.
    StartAdd {
        /// Mode the new editor starts in.
        mode: MetadataMode,
    },
    /// Open an editor over a saved entry.
    StartEdit {
        /// Key of the saved entry.
        key: String,
    },
    /// Convert the open editor to another mode, subject to the target's validator.
    RequestModeSwitch {
        /// Session being converted.
        session: SessionId,
        /// Requested mode.
        target: MetadataMode,
        /// Key currently typed into the editor.
        pending_key: String,
        /// Value text currently in the editor.
        pending_value: String,
    },
    /// Convert the open editor to another mode without validation, discarding the pending value.
    ForceModeSwitch {
        /// Session being converted.
        session: SessionId,
        /// Requested mode.
        target: MetadataMode,
        /// Key currently typed into the editor.
        pending_key: String,
    },
    /// Validate, parse, and request persistence of the editor contents.
    Save {
        /// Session being saved.
        session: SessionId,
        /// Key typed into the editor.
        key: String,
        /// Value text typed into the editor.
        raw_value: String,
    },
    /// Persistence collaborator finished a save.
    SaveCompleted {
        /// Session that requested the save.
        session: SessionId,
        /// Collaborator outcome.
        result: Result<(), PersistenceError>,
    },
    /// Close an editor without saving.
    Cancel {
        /// Session to close.
        session: SessionId,
    },
    /// Ask for confirmation before deleting a saved entry.
    RequestDelete {
        /// Entry key.
        key: String,
    },
    /// The user confirmed a delete prompt.
    DeleteConfirmed {
        /// Entry key.
        key: String,
        /// Generation the prompt was issued under.
        generation: u64,
    },
    /// Persistence collaborator finished a delete.
    DeleteCompleted {
        /// Entry key.
        key: String,
        /// Generation the delete was issued under.
        generation: u64,
        /// Collaborator outcome.
        result: Result<(), PersistenceError>,
    },
    /// Replace the saved entries from the item's `meta` object, closing every editor.
    Hydrate {
        /// Item metadata.
        meta: Map<String, Value>,
    },
    /// Change the caller's access level.
    SetAccessLevel {
        /// New access level.
        access: AccessLevel,
    },
    /// The owning view went away; close every editor and drop late callbacks.
    Teardown,
}

#[derive(Debug, Clone, PartialEq)]
/// Persistence call requested by a save.
pub enum PersistRequest {
    /// `add_metadata(key, value)`.
    Add {
        /// New key.
        key: String,
        /// Value to store.
        value: Value,
    },
    /// `edit_metadata(old_key, new_key, value)`.
    Edit {
        /// Key of the saved entry.
        old_key: String,
        /// Key after the save.
        new_key: String,
        /// Value to store.
        value: Value,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_metadata`] for the driver to execute.
pub enum EditorEffect {
    /// Render an editor for `session` in `mode`, pre-filled with `draft`.
    OpenEditor {
        /// Session shown by the editor.
        session: SessionId,
        /// Editor mode.
        mode: MetadataMode,
        /// Initial contents.
        draft: Draft,
    },
    /// Remove the editor for `session`.
    CloseEditor {
        /// Session whose editor closes.
        session: SessionId,
    },
    /// Call the persistence collaborator for a save.
    Persist {
        /// Session waiting on the call.
        session: SessionId,
        /// Call to make.
        request: PersistRequest,
    },
    /// Ask the user to confirm a delete.
    Confirm {
        /// Entry key.
        key: String,
        /// Generation to echo back in [`EditorAction::DeleteConfirmed`].
        generation: u64,
        /// Prompt contents.
        request: ConfirmRequest,
    },
    /// Call the persistence collaborator for a delete.
    Remove {
        /// Entry key.
        key: String,
        /// Generation to echo back in [`EditorAction::DeleteCompleted`].
        generation: u64,
    },
    /// A saved entry changed.
    EntrySaved {
        /// Session that saved it.
        session: SessionId,
        /// Entry as stored.
        entry: MetadataEntry,
    },
    /// A saved entry was deleted.
    EntryRemoved {
        /// Deleted key.
        key: String,
    },
    /// The whole entry list must be rendered again.
    Rerender,
}

/// Applies an [`EditorAction`] to the editor state and collects resulting side effects.
///
/// Completions that refer to a closed session or an older generation are dropped without touching
/// the state. Errors keep the affected session open: a failed save keeps what the user typed in the
/// session draft so it can be retried.
///
/// # Errors
///
/// Returns [`EditorError`] for rejected input, collaborator failures, and lifecycle misuse such as
/// editing an entry that already has an open session.
pub fn reduce_metadata(
    state: &mut MetadataEditorState,
    action: EditorAction,
) -> Result<Vec<EditorEffect>, EditorError> {
    let mut effects = Vec::new();
    match action {
        EditorAction::StartAdd { mode } => {
            require_write(state)?;
            let id = state.allocate_session_id();
            let session = EditSession::new_entry(id, mode);
            effects.push(open_editor(&session));
            state.sessions.insert(id, session);
        }
        EditorAction::StartEdit { key } => {
            require_write(state)?;
            if let Some(open) = state.session_for_key(&key) {
                return Err(EditorError::AlreadyEditing {
                    key,
                    session: open.id,
                });
            }
            let entry = state
                .collection
                .get(&key)
                .ok_or_else(|| EditorError::EntryNotFound(key.clone()))?
                .clone();
            let id = state.allocate_session_id();
            let session = EditSession::for_entry(id, &entry, &state.modes);
            effects.push(open_editor(&session));
            state.sessions.insert(id, session);
        }
        EditorAction::RequestModeSwitch {
            session,
            target,
            pending_key,
            pending_value,
        } => {
            require_write(state)?;
            let modes = state.modes.clone();
            let open = open_session_mut(state, session)?;
            if open.is_saving() {
                return Err(EditorError::SaveInFlight);
            }
            if open.current_mode == target {
                return Ok(effects);
            }
            modes.check_conversion(open.current_mode, target, &pending_value)?;

            open.current_mode = target;
            open.draft = Draft {
                key: pending_key,
                value: DraftValue::prefill(target, &pending_value),
            };
            effects.push(EditorEffect::CloseEditor { session });
            effects.push(open_editor(open));
        }
        EditorAction::ForceModeSwitch {
            session,
            target,
            pending_key,
        } => {
            require_write(state)?;
            let open = open_session_mut(state, session)?;
            if open.is_saving() {
                return Err(EditorError::SaveInFlight);
            }
            open.current_mode = target;
            open.draft = Draft {
                key: pending_key,
                value: DraftValue::empty(),
            };
            effects.push(EditorEffect::CloseEditor { session });
            effects.push(open_editor(open));
        }
        EditorAction::Save {
            session,
            key,
            raw_value,
        } => {
            require_write(state)?;
            let request = begin_save(state, session, key, raw_value)?;
            effects.push(EditorEffect::Persist { session, request });
        }
        EditorAction::SaveCompleted { session, result } => {
            let Some(open) = state.sessions.get_mut(&session) else {
                logging::warn!("dropping save completion for closed session {session}");
                return Ok(effects);
            };
            let Some(pending) = open.pending_save.take() else {
                logging::warn!("dropping save completion for idle session {session}");
                return Ok(effects);
            };
            result?;

            let entry = MetadataEntry::new(pending.key, pending.value);
            let Some(closed) = state.sessions.remove(&session) else {
                return Ok(effects);
            };
            if closed.is_new {
                state.collection.upsert(entry.clone());
            } else {
                state.collection.replace(&closed.original_key, entry.clone());
            }
            effects.push(EditorEffect::EntrySaved { session, entry });
            effects.push(EditorEffect::CloseEditor { session });
        }
        EditorAction::Cancel { session } => {
            // The collaborator may already have applied an in-flight save.
            if open_session_mut(state, session)?.is_saving() {
                return Err(EditorError::SaveInFlight);
            }
            state.sessions.remove(&session);
            effects.push(EditorEffect::CloseEditor { session });
        }
        EditorAction::RequestDelete { key } => {
            require_write(state)?;
            if !state.collection.contains(&key) {
                return Err(EditorError::EntryNotFound(key));
            }
            let request = ConfirmRequest {
                message: state.config.delete_prompt(&key),
                confirm_label: state.config.delete_confirm_label.clone(),
            };
            effects.push(EditorEffect::Confirm {
                key,
                generation: state.generation,
                request,
            });
        }
        EditorAction::DeleteConfirmed { key, generation } => {
            if generation != state.generation || !state.collection.contains(&key) {
                logging::warn!("dropping stale delete confirmation for metadatum {key}");
                return Ok(effects);
            }
            require_write(state)?;
            effects.push(EditorEffect::Remove { key, generation });
        }
        EditorAction::DeleteCompleted {
            key,
            generation,
            result,
        } => {
            if generation != state.generation {
                logging::warn!("dropping stale delete completion for metadatum {key}");
                return Ok(effects);
            }
            result?;

            state.collection.remove(&key);
            let editing: Vec<SessionId> = state
                .sessions
                .values()
                .filter(|session| session.edits_key(&key))
                .map(|session| session.id)
                .collect();
            for session in editing {
                state.sessions.remove(&session);
                effects.push(EditorEffect::CloseEditor { session });
            }
            effects.push(EditorEffect::EntryRemoved { key });
        }
        EditorAction::Hydrate { meta } => {
            close_all(state, &mut effects);
            state.collection = MetadataCollection::from_meta(&meta);
            effects.push(EditorEffect::Rerender);
        }
        EditorAction::SetAccessLevel { access } => {
            state.access = access;
            effects.push(EditorEffect::Rerender);
        }
        EditorAction::Teardown => close_all(state, &mut effects),
    }

    Ok(effects)
}

fn require_write(state: &MetadataEditorState) -> Result<(), EditorError> {
    if state.access.can_write() {
        Ok(())
    } else {
        Err(EditorError::PermissionDenied)
    }
}

fn open_session_mut(
    state: &mut MetadataEditorState,
    session: SessionId,
) -> Result<&mut EditSession, EditorError> {
    state
        .sessions
        .get_mut(&session)
        .ok_or(EditorError::SessionNotFound(session))
}

fn open_editor(session: &EditSession) -> EditorEffect {
    EditorEffect::OpenEditor {
        session: session.id,
        mode: session.current_mode,
        draft: session.draft.clone(),
    }
}

fn close_all(state: &mut MetadataEditorState, effects: &mut Vec<EditorEffect>) {
    for session in state.discard_sessions() {
        effects.push(EditorEffect::CloseEditor { session });
    }
}

fn begin_save(
    state: &mut MetadataEditorState,
    session: SessionId,
    key: String,
    raw_value: String,
) -> Result<PersistRequest, EditorError> {
    let enforce_key_rules = state.config.enforce_key_rules;
    let modes = state.modes.clone();
    let key_taken = state.collection.contains(&key);
    let open = open_session_mut(state, session)?;
    if open.is_saving() {
        return Err(EditorError::SaveInFlight);
    }

    open.draft = Draft {
        key: key.clone(),
        value: DraftValue::Text(raw_value.clone()),
    };

    if open.is_new && key.is_empty() {
        return Err(ValidationError::KeyRequired.into());
    }
    if enforce_key_rules && (key.contains('.') || key.starts_with('$')) {
        return Err(ValidationError::InvalidKey { key }.into());
    }
    let renamed = open.is_new || open.original_key != key;
    if renamed && key_taken {
        return Err(ValidationError::DuplicateKey { key }.into());
    }

    let value = modes.descriptor(open.current_mode).parse(&raw_value)?;
    if open.current_mode == MetadataMode::Structured {
        open.draft.value = DraftValue::Json(value.as_json().clone());
    }

    let request = if open.is_new {
        PersistRequest::Add {
            key: key.clone(),
            value: value.as_json().clone(),
        }
    } else {
        PersistRequest::Edit {
            old_key: open.original_key.clone(),
            new_key: key.clone(),
            value: value.as_json().clone(),
        }
    };
    open.pending_save = Some(PendingSave { key, value });
    Ok(request)
}
