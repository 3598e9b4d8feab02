//! # Action Gate
//!
//! Arbitrates one user-triggered action: checks the trigger's identity,
//! claims the control (the single-flight lock), asks for confirmation, and
//! only then runs the remote operation.
//!
//! ```text
//! trigger ─► identity? ─► claim control ─► confirm? ─► operation
//!               │              │              │
//!            Ignored        Ignored     Denied/Dismissed
//! ```
//!
//! The control is released on every exit path, including errors and a
//! dropped future, by [`BusyGuard`].

use std::future::Future;
use std::sync::Arc;

use crate::bridge::{ConfirmationDialog, ConsoleRenderer};
use crate::core::{ActionId, Trigger};
use crate::errors::AppError;
use crate::queue::MessageQueue;
use crate::views::controls::{ControlPanel, WorkflowPhase};
use crate::views::notifications::ToastLevel;

/// Text and labels for a confirmation prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationSpec {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    pub deny_label: String,
    /// Queued when the user denies or dismisses
    pub cancel_message: Option<String>,
    /// Queued when the user confirms, before the operation runs
    pub success_message: Option<String>,
    pub severity: ToastLevel,
}

impl ConfirmationSpec {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            confirm_label: "Yes".to_string(),
            deny_label: "No".to_string(),
            cancel_message: None,
            success_message: None,
            severity: ToastLevel::Warning,
        }
    }

    #[must_use]
    pub fn with_labels(mut self, confirm: impl Into<String>, deny: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.deny_label = deny.into();
        self
    }

    #[must_use]
    pub fn with_cancel_message(mut self, message: impl Into<String>) -> Self {
        self.cancel_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ToastLevel) -> Self {
        self.severity = severity;
        self
    }

    /// A prompt with neither title nor body cannot be shown
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() || !self.body.trim().is_empty()
    }
}

/// Whether an action asks before running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Skip,
    Prompt(ConfirmationSpec),
}

/// The user's answer to a confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Confirmed,
    Denied,
    Dismissed,
}

/// Outcome of one arbitration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration<T> {
    /// Wrong control, or the control was already busy
    Ignored,
    Denied,
    Dismissed,
    /// The operation ran and produced `T`
    Completed(T),
}

impl<T> Arbitration<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Holds a claimed control and releases it on drop
struct BusyGuard<'a> {
    controls: &'a ControlPanel,
    action: ActionId,
    indicator: &'a str,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.controls.finish(self.action, self.indicator);
        tracing::debug!(action = %self.action, "control released");
    }
}

/// Shows the processing notice for as long as it lives
struct ProcessingNotice<'a>(&'a dyn ConsoleRenderer);

impl<'a> ProcessingNotice<'a> {
    fn show(renderer: &'a dyn ConsoleRenderer) -> Self {
        renderer.set_processing_notice(true);
        Self(renderer)
    }
}

impl Drop for ProcessingNotice<'_> {
    fn drop(&mut self) {
        self.0.set_processing_notice(false);
    }
}

/// Single-flight, confirm-first gate for console actions
#[derive(Clone)]
pub struct ActionGate {
    controls: Arc<ControlPanel>,
    dialog: Arc<dyn ConfirmationDialog>,
    queue: Arc<MessageQueue>,
    renderer: Arc<dyn ConsoleRenderer>,
}

impl ActionGate {
    pub fn new(
        controls: Arc<ControlPanel>,
        dialog: Arc<dyn ConfirmationDialog>,
        queue: Arc<MessageQueue>,
        renderer: Arc<dyn ConsoleRenderer>,
    ) -> Self {
        Self {
            controls,
            dialog,
            queue,
            renderer,
        }
    }

    pub fn controls(&self) -> &Arc<ControlPanel> {
        &self.controls
    }

    /// Run `operation` for `expected` if the trigger and the user allow it.
    ///
    /// The control is claimed before the first await point, so a second
    /// trigger on the same control while this call is pending is ignored.
    /// Errors from `operation` are returned after the control is released.
    pub async fn arbitrate<T, F, Fut>(
        &self,
        trigger: &Trigger,
        expected: ActionId,
        indicator: &str,
        confirmation: &Confirmation,
        operation: F,
    ) -> Result<Arbitration<T>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if !trigger.matches(expected) {
            tracing::debug!(action = %expected, control = ?trigger.resolve(), "trigger does not match action");
            return Ok(Arbitration::Ignored);
        }

        if !self.controls.try_begin(expected, indicator) {
            tracing::debug!(action = %expected, "control busy, dropping trigger");
            return Ok(Arbitration::Ignored);
        }
        let _busy = BusyGuard {
            controls: &self.controls,
            action: expected,
            indicator,
        };

        match confirmation {
            Confirmation::Prompt(spec) if spec.is_well_formed() => {
                let decision = self.dialog.confirm(spec).await;
                tracing::debug!(action = %expected, ?decision, "confirmation answered");
                match decision {
                    Decision::Confirmed => {
                        if let Some(message) = &spec.success_message {
                            self.queue.info(message.as_str());
                        }
                    }
                    Decision::Denied | Decision::Dismissed => {
                        if let Some(message) = &spec.cancel_message {
                            self.queue.info(message.as_str());
                        }
                        return Ok(if decision == Decision::Denied {
                            Arbitration::Denied
                        } else {
                            Arbitration::Dismissed
                        });
                    }
                }
            }
            Confirmation::Prompt(_) => {
                tracing::warn!(action = %expected, "confirmation has no title or body, proceeding without it");
            }
            Confirmation::Skip => {}
        }

        self.controls.set_phase(expected, WorkflowPhase::InFlight);
        let _notice = ProcessingNotice::show(self.renderer.as_ref());
        operation().await.map(Arbitration::Completed)
    }
}
