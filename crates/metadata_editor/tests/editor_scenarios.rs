use std::{cell::RefCell, rc::Rc};

use futures::executor::block_on;
use metadata_editor::{
    AccessLevel, DeleteOutcome, EditorConfig, EditorError, MetadataEditor, MetadataEditorState,
    MetadataMode, MetadataValue, SaveOutcome,
};
use metadata_host::{
    EditorServices, MemoryMetadataPersistence, MemoryNotificationService, MetadataPersistence,
    PersistenceCall, PersistenceError, PersistenceFuture, ScriptedConfirmationService,
};
use serde_json::{json, Map, Value};

fn meta(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

/// Persistence that tears the editor down while a call is in flight, like a user navigating away.
struct NavigateAwayPersistence {
    inner: MemoryMetadataPersistence,
    editor: RefCell<Option<MetadataEditor>>,
}

impl NavigateAwayPersistence {
    fn leave(&self) {
        if let Some(editor) = self.editor.borrow().as_ref() {
            editor.teardown().expect("teardown");
        }
    }
}

impl MetadataPersistence for NavigateAwayPersistence {
    fn add_metadata<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.leave();
            self.inner.add_metadata(key, value).await
        })
    }

    fn edit_metadata<'a>(
        &'a self,
        old_key: &'a str,
        new_key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.leave();
            self.inner.edit_metadata(old_key, new_key, value).await
        })
    }

    fn remove_metadata<'a>(
        &'a self,
        key: &'a str,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.leave();
            self.inner.remove_metadata(key).await
        })
    }
}

/// Persistence that tries to cancel the open editor while an edit call is in flight.
struct CancelDuringEditPersistence {
    inner: MemoryMetadataPersistence,
    editor: RefCell<Option<MetadataEditor>>,
    cancel_result: RefCell<Option<Result<(), EditorError>>>,
}

impl MetadataPersistence for CancelDuringEditPersistence {
    fn add_metadata<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        self.inner.add_metadata(key, value)
    }

    fn edit_metadata<'a>(
        &'a self,
        old_key: &'a str,
        new_key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            let editor = self.editor.borrow().clone();
            if let Some(editor) = editor {
                let session = editor.open_sessions().first().copied();
                if let Some(session) = session {
                    *self.cancel_result.borrow_mut() = Some(editor.cancel(session).await);
                }
            }
            self.inner.edit_metadata(old_key, new_key, value).await
        })
    }

    fn remove_metadata<'a>(
        &'a self,
        key: &'a str,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        self.inner.remove_metadata(key)
    }
}

#[test]
fn cancel_while_save_in_flight_is_refused_and_rename_is_kept() {
    let item_meta = meta(json!({"color": "red"}));
    let persistence = Rc::new(CancelDuringEditPersistence {
        inner: MemoryMetadataPersistence::with_meta(item_meta.clone()),
        editor: RefCell::new(None),
        cancel_result: RefCell::new(None),
    });
    let services = EditorServices::new(
        persistence.clone(),
        Rc::new(ScriptedConfirmationService::default()),
        Rc::new(MemoryNotificationService::default()),
    );
    let editor = MetadataEditor::for_item(&item_meta, AccessLevel::Write, services);
    *persistence.editor.borrow_mut() = Some(editor.clone());

    let session = block_on(editor.start_edit("color")).expect("edit");
    let outcome = block_on(editor.save(session, "colour", "blue")).expect("save");
    persistence.editor.borrow_mut().take();

    assert_eq!(
        persistence.cancel_result.borrow().clone(),
        Some(Err(EditorError::SaveInFlight))
    );
    assert!(matches!(outcome, SaveOutcome::Saved(_)));
    assert_eq!(persistence.inner.meta(), meta(json!({"colour": "blue"})));
    assert_eq!(editor.entries().to_meta(), meta(json!({"colour": "blue"})));

    let session = block_on(editor.start_edit("colour")).expect("edit renamed entry");
    block_on(editor.save(session, "colour", "green")).expect("follow-up edit");
    assert_eq!(persistence.inner.meta(), meta(json!({"colour": "green"})));
}

#[test]
fn add_structured_entry_from_simple_draft_then_rename_it() {
    let persistence = MemoryMetadataPersistence::default();
    let notifications = MemoryNotificationService::default();
    let services = EditorServices::new(
        Rc::new(persistence.clone()),
        Rc::new(ScriptedConfirmationService::default()),
        Rc::new(notifications.clone()),
    );
    let editor = MetadataEditor::for_item(&Map::new(), AccessLevel::Admin, services);

    let session = block_on(editor.start_add(MetadataMode::Simple)).expect("add");
    block_on(editor.request_mode_switch(session, MetadataMode::Structured, "dims", "[1, 2]"))
        .expect("array converts");
    let outcome = block_on(editor.save(session, "dims", "[1, 2]")).expect("save");
    assert_eq!(
        outcome,
        SaveOutcome::Saved(metadata_editor::MetadataEntry::new(
            "dims",
            MetadataValue::Structured(json!([1, 2]))
        ))
    );

    let session = block_on(editor.start_edit("dims")).expect("edit");
    block_on(editor.request_mode_switch(session, MetadataMode::Simple, "size", "[1, 2]"))
        .expect("structured to simple has no validator");
    block_on(editor.save(session, "size", "1x2")).expect("rename");

    assert_eq!(persistence.meta(), meta(json!({"size": "1x2"})));
    assert_eq!(
        persistence.calls().last(),
        Some(&PersistenceCall::Edit {
            old_key: "dims".to_string(),
            new_key: "size".to_string(),
            value: json!("1x2"),
        })
    );
    assert_eq!(
        editor.entries().get("size").map(|entry| entry.mode()),
        Some(MetadataMode::Simple)
    );
    assert!(notifications.notices().is_empty());
}

#[test]
fn save_answer_arriving_after_teardown_changes_nothing() {
    let persistence = Rc::new(NavigateAwayPersistence {
        inner: MemoryMetadataPersistence::with_meta(meta(json!({"color": "red"}))),
        editor: RefCell::new(None),
    });
    let notifications = MemoryNotificationService::default();
    let services = EditorServices::new(
        persistence.clone(),
        Rc::new(ScriptedConfirmationService::new([true])),
        Rc::new(notifications.clone()),
    );
    let editor = MetadataEditor::for_item(
        &meta(json!({"color": "red"})),
        AccessLevel::Write,
        services,
    );
    *persistence.editor.borrow_mut() = Some(editor.clone());

    let session = block_on(editor.start_edit("color")).expect("edit");
    let outcome = block_on(editor.save(session, "color", "blue")).expect("late answer ignored");

    assert_eq!(outcome, SaveOutcome::Discarded);
    assert!(editor.open_sessions().is_empty());
    assert_eq!(
        editor.entries().get("color").map(|entry| entry.value.clone()),
        Some(MetadataValue::text("red"))
    );
    assert!(notifications.notices().is_empty());

    let outcome = block_on(editor.delete_entry("color")).expect("late delete ignored");
    assert_eq!(outcome, DeleteOutcome::Discarded);
    assert!(editor.entries().contains("color"));

    persistence.editor.borrow_mut().take();
}

#[test]
fn edits_on_different_entries_are_independent() {
    let persistence = MemoryMetadataPersistence::with_meta(meta(json!({"a": "1", "b": "2"})));
    let services = EditorServices::new(
        Rc::new(persistence.clone()),
        Rc::new(ScriptedConfirmationService::default()),
        Rc::new(MemoryNotificationService::default()),
    );
    let editor = MetadataEditor::for_item(
        &meta(json!({"a": "1", "b": "2"})),
        AccessLevel::Write,
        services,
    );

    let first = block_on(editor.start_edit("a")).expect("edit a");
    let second = block_on(editor.start_edit("b")).expect("edit b");
    assert!(matches!(
        block_on(editor.start_edit("a")),
        Err(EditorError::AlreadyEditing { .. })
    ));

    block_on(editor.cancel(first)).expect("cancel a");
    block_on(editor.save(second, "b", "two")).expect("save b");

    assert_eq!(editor.entries().to_meta(), meta(json!({"a": "1", "b": "two"})));
}

#[test]
fn configured_editor_uses_custom_label_and_indent() {
    let config = EditorConfig::from_json_str(
        r#"{"delete_confirm_label": "Remove", "structured_indent": 2}"#,
    )
    .expect("config");
    let confirmation = ScriptedConfirmationService::new([false]);
    let item_meta = meta(json!({"dims": {"w": 1}}));
    let state = MetadataEditorState::from_meta(&item_meta, AccessLevel::Write).with_config(config);
    let services = EditorServices::new(
        Rc::new(MemoryMetadataPersistence::default()),
        Rc::new(confirmation.clone()),
        Rc::new(MemoryNotificationService::default()),
    );
    let editor = MetadataEditor::new(state, services);

    let entry = editor.entries().get("dims").cloned().expect("entry");
    assert_eq!(editor.display_value(&entry), "{\n  \"w\": 1\n}");

    assert_eq!(
        block_on(editor.delete_entry("dims")).expect("prompted"),
        DeleteOutcome::Declined
    );
    assert_eq!(confirmation.prompts()[0].confirm_label, "Remove");
}
