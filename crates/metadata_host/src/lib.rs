//! Typed collaborator contracts consumed by the metadata editor.
//!
//! The editor never reaches for ambient singletons: persistence, confirmation prompts and
//! notifications are injected through the traits in this crate. Each contract ships a no-op
//! adapter for unsupported targets and an in-memory adapter used by tests and previews.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod confirm;
pub mod notifications;
pub mod persistence;
pub mod services;

pub use confirm::{
    ConfirmFuture, ConfirmRequest, ConfirmationService, NoopConfirmationService,
    ScriptedConfirmationService,
};
pub use notifications::{
    MemoryNotificationService, Notice, NoopNotificationService, NotificationFuture,
    NotificationService, Severity,
};
pub use persistence::{
    MemoryMetadataPersistence, MetadataPersistence, NoopMetadataPersistence, PersistenceCall,
    PersistenceError, PersistenceFuture,
};
pub use services::EditorServices;
