//! Injected collaborator bundle.

use std::rc::Rc;

use crate::{
    ConfirmationService, MetadataPersistence, NoopConfirmationService, NoopMetadataPersistence,
    NoopNotificationService, NotificationService,
};

/// Collaborators handed to the editor at construction time.
///
/// The host selects concrete adapters before this bundle crosses into `metadata_editor`, which
/// keeps the editor decoupled from any particular transport or UI toolkit.
#[derive(Clone)]
pub struct EditorServices {
    /// Metadata persistence for the item being edited.
    pub persistence: Rc<dyn MetadataPersistence>,
    /// Yes/no prompt used before deletes.
    pub confirmation: Rc<dyn ConfirmationService>,
    /// Transient notice delivery.
    pub notifications: Rc<dyn NotificationService>,
}

impl EditorServices {
    /// Assembles a bundle from concrete adapters.
    pub fn new(
        persistence: Rc<dyn MetadataPersistence>,
        confirmation: Rc<dyn ConfirmationService>,
        notifications: Rc<dyn NotificationService>,
    ) -> Self {
        Self {
            persistence,
            confirmation,
            notifications,
        }
    }
}

impl Default for EditorServices {
    fn default() -> Self {
        Self {
            persistence: Rc::new(NoopMetadataPersistence),
            confirmation: Rc::new(NoopConfirmationService),
            notifications: Rc::new(NoopNotificationService),
        }
    }
}

impl std::fmt::Debug for EditorServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorServices").finish_non_exhaustive()
    }
}
