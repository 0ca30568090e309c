//! Item metadata persistence contracts and adapters.

use std::{cell::RefCell, collections::VecDeque, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Object-safe boxed future used by [`MetadataPersistence`] async methods.
pub type PersistenceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
/// Failure reported by the persistence collaborator.
///
/// Mirrors the server error payload, which always carries a human-readable `message` field.
pub struct PersistenceError {
    /// User-facing failure text.
    pub message: String,
}

impl PersistenceError {
    /// Builds an error from any message text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host service that writes metadata changes for the item being edited.
pub trait MetadataPersistence {
    /// Adds a new metadata key.
    fn add_metadata<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>>;

    /// Replaces the value stored under `old_key`, renaming it to `new_key`.
    fn edit_metadata<'a>(
        &'a self,
        old_key: &'a str,
        new_key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>>;

    /// Removes a metadata key.
    fn remove_metadata<'a>(
        &'a self,
        key: &'a str,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op persistence for previews; every call succeeds without storing anything.
pub struct NoopMetadataPersistence;

impl MetadataPersistence for NoopMetadataPersistence {
    fn add_metadata<'a>(
        &'a self,
        _key: &'a str,
        _value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async { Ok(()) })
    }

    fn edit_metadata<'a>(
        &'a self,
        _old_key: &'a str,
        _new_key: &'a str,
        _value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async { Ok(()) })
    }

    fn remove_metadata<'a>(
        &'a self,
        _key: &'a str,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One call received by [`MemoryMetadataPersistence`], in arrival order.
pub enum PersistenceCall {
    /// `add_metadata(key, value)`.
    Add {
        /// Key being added.
        key: String,
        /// Value being stored.
        value: Value,
    },
    /// `edit_metadata(old_key, new_key, value)`.
    Edit {
        /// Key before the edit.
        old_key: String,
        /// Key after the edit.
        new_key: String,
        /// Value being stored.
        value: Value,
    },
    /// `remove_metadata(key)`.
    Remove {
        /// Key being removed.
        key: String,
    },
}

#[derive(Debug, Default)]
struct MemoryPersistenceInner {
    meta: Map<String, Value>,
    calls: Vec<PersistenceCall>,
    scripted_failures: VecDeque<String>,
}

#[derive(Debug, Clone, Default)]
/// In-memory persistence that records every call and can be scripted to fail.
pub struct MemoryMetadataPersistence {
    inner: Rc<RefCell<MemoryPersistenceInner>>,
}

impl MemoryMetadataPersistence {
    /// Creates a store pre-populated with an item's `meta` object.
    pub fn with_meta(meta: Map<String, Value>) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().meta = meta;
        store
    }

    /// Makes the next call fail with `message` instead of touching the store.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.inner
            .borrow_mut()
            .scripted_failures
            .push_back(message.into());
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<PersistenceCall> {
        self.inner.borrow().calls.clone()
    }

    /// Returns a copy of the stored metadata.
    pub fn meta(&self) -> Map<String, Value> {
        self.inner.borrow().meta.clone()
    }

    fn record(&self, call: PersistenceCall) -> Result<(), PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(call.clone());
        if let Some(message) = inner.scripted_failures.pop_front() {
            return Err(PersistenceError::new(message));
        }

        match call {
            PersistenceCall::Add { key, value } => {
                if inner.meta.contains_key(&key) {
                    return Err(PersistenceError::new(format!(
                        "metadata key `{key}` already exists"
                    )));
                }
                inner.meta.insert(key, value);
            }
            PersistenceCall::Edit {
                old_key,
                new_key,
                value,
            } => {
                if inner.meta.remove(&old_key).is_none() {
                    return Err(PersistenceError::new(format!(
                        "metadata key `{old_key}` does not exist"
                    )));
                }
                inner.meta.insert(new_key, value);
            }
            PersistenceCall::Remove { key } => {
                inner.meta.remove(&key);
            }
        }
        Ok(())
    }
}

impl MetadataPersistence for MemoryMetadataPersistence {
    fn add_metadata<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.record(PersistenceCall::Add {
                key: key.to_string(),
                value: value.clone(),
            })
        })
    }

    fn edit_metadata<'a>(
        &'a self,
        old_key: &'a str,
        new_key: &'a str,
        value: &'a Value,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.record(PersistenceCall::Edit {
                old_key: old_key.to_string(),
                new_key: new_key.to_string(),
                value: value.clone(),
            })
        })
    }

    fn remove_metadata<'a>(
        &'a self,
        key: &'a str,
    ) -> PersistenceFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.record(PersistenceCall::Remove {
                key: key.to_string(),
            })
        })
    }
}
