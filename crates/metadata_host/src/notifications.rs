//! Transient user notification contracts.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`NotificationService`].
pub type NotificationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Visual weight of a notice.
pub enum Severity {
    /// Recoverable problem with user input.
    Warning,
    /// Failed remote operation.
    Danger,
}

impl Severity {
    /// Returns the stable token used by alert styling.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One transient message.
pub struct Notice {
    /// Message body.
    pub text: String,
    /// Display severity.
    pub severity: Severity,
}

impl Notice {
    /// Builds a warning notice.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Warning,
        }
    }

    /// Builds a danger notice.
    pub fn danger(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Danger,
        }
    }
}

/// Host service for user-visible notices.
pub trait NotificationService {
    /// Displays a notice.
    fn notify<'a>(&'a self, notice: &'a Notice) -> NotificationFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op notification service for unsupported targets.
pub struct NoopNotificationService;

impl NotificationService for NoopNotificationService {
    fn notify<'a>(&'a self, _notice: &'a Notice) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// Notification service that keeps every notice in memory.
pub struct MemoryNotificationService {
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl MemoryNotificationService {
    /// Returns the notices delivered so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Returns the most recent notice.
    pub fn last(&self) -> Option<Notice> {
        self.notices.borrow().last().cloned()
    }
}

impl NotificationService for MemoryNotificationService {
    fn notify<'a>(&'a self, notice: &'a Notice) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.notices.borrow_mut().push(notice.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn severity_serializes_as_alert_token() {
        let raw = serde_json::to_string(&Notice::danger("boom")).expect("encode");
        assert_eq!(raw, r#"{"text":"boom","severity":"danger"}"#);
        assert_eq!(Severity::Warning.token(), "warning");
        assert_eq!(Severity::Danger.token(), "danger");
        assert!(serde_json::from_str::<Severity>("\"info\"").is_err());
    }

    #[test]
    fn memory_service_keeps_delivery_order() {
        let service = MemoryNotificationService::default();
        block_on(service.notify(&Notice::warning("first"))).expect("notify");
        block_on(service.notify(&Notice::danger("second"))).expect("notify");

        assert_eq!(service.notices().len(), 2);
        assert_eq!(service.last(), Some(Notice::danger("second")));
    }
}
