//! Interactive confirmation contracts.

use std::{cell::RefCell, collections::VecDeque, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`ConfirmationService`].
pub type ConfirmFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Yes/no prompt shown before a destructive action.
pub struct ConfirmRequest {
    /// Prompt body.
    pub message: String,
    /// Label of the affirmative button.
    pub confirm_label: String,
}

/// Host service that asks the user to confirm an action.
pub trait ConfirmationService {
    /// Presents `request` and resolves to `true` only on an affirmative answer.
    fn confirm<'a>(&'a self, request: &'a ConfirmRequest) -> ConfirmFuture<'a, bool>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Confirmation service for hosts without a prompt; always declines.
pub struct NoopConfirmationService;

impl ConfirmationService for NoopConfirmationService {
    fn confirm<'a>(&'a self, _request: &'a ConfirmRequest) -> ConfirmFuture<'a, bool> {
        Box::pin(async { false })
    }
}

#[derive(Debug, Default)]
struct ScriptedConfirmInner {
    answers: VecDeque<bool>,
    prompts: Vec<ConfirmRequest>,
}

#[derive(Debug, Clone, Default)]
/// Confirmation service answering from a queue of scripted responses.
///
/// Declines once the queue is exhausted.
pub struct ScriptedConfirmationService {
    inner: Rc<RefCell<ScriptedConfirmInner>>,
}

impl ScriptedConfirmationService {
    /// Creates a service that answers `answers` in order.
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        let service = Self::default();
        service.inner.borrow_mut().answers = answers.into_iter().collect();
        service
    }

    /// Queues another answer.
    pub fn push_answer(&self, answer: bool) {
        self.inner.borrow_mut().answers.push_back(answer);
    }

    /// Returns every prompt shown so far.
    pub fn prompts(&self) -> Vec<ConfirmRequest> {
        self.inner.borrow().prompts.clone()
    }
}

impl ConfirmationService for ScriptedConfirmationService {
    fn confirm<'a>(&'a self, request: &'a ConfirmRequest) -> ConfirmFuture<'a, bool> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.prompts.push(request.clone());
            inner.answers.pop_front().unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn scripted_answers_are_consumed_in_order_then_decline() {
        let service = ScriptedConfirmationService::new([true, false]);
        let request = ConfirmRequest {
            message: "Delete?".to_string(),
            confirm_label: "Delete".to_string(),
        };

        assert!(block_on(service.confirm(&request)));
        assert!(!block_on(service.confirm(&request)));
        assert!(!block_on(service.confirm(&request)));
        assert_eq!(service.prompts().len(), 3);
    }
}
