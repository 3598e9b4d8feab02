//! UI-facing facade for codekeep-app.
//!
//! Frontends should only need this module:
//! - workflows (commands)
//! - host capability traits (dialog, toasts, renderer)
//! - core types (RecoveryConsole, ConsoleConfig)

use std::sync::Arc;

use crate::core::{RecoveryConsole, Trigger};
use crate::workflows::{FormSubmission, WorkflowOutcome};

/// UI wrapper around `RecoveryConsole` to discourage direct access to internals.
#[derive(Clone)]
pub struct UiConsole {
    inner: Arc<RecoveryConsole>,
}

impl UiConsole {
    pub fn new(inner: Arc<RecoveryConsole>) -> Self {
        Self { inner }
    }

    pub fn raw(&self) -> &Arc<RecoveryConsole> {
        &self.inner
    }

    /// Run the workflow for the control with `control_id`, then show any
    /// messages it queued.
    pub async fn activate(&self, control_id: &str, form: &FormSubmission) -> WorkflowOutcome {
        let outcome = self
            .inner
            .dispatch(&Trigger::control(control_id), form)
            .await;
        self.inner.drain_messages().await;
        outcome
    }

    /// Whether leaving the page should be confirmed first
    pub fn should_block_navigation(&self) -> bool {
        self.inner.navigation_guard().should_block()
    }
}

impl From<Arc<RecoveryConsole>> for UiConsole {
    fn from(inner: Arc<RecoveryConsole>) -> Self {
        Self::new(inner)
    }
}

pub mod workflows {
    pub use crate::workflows::codes::{delete_all, delete_one, invalidate};
    pub use crate::workflows::delivery::{download, email};
    pub use crate::workflows::dispatch;
    pub use crate::workflows::generate::{generate_with_expiry, generate_without_expiry, regenerate};
    pub use crate::workflows::verify::verify_setup;
}

pub mod bridge {
    pub use crate::bridge::{ConfirmationDialog, ConsoleRenderer, ToastSurface};
    pub use crate::runtime_bridge::{RemoteChannel, TokenSource};
}

pub mod types {
    pub use crate::config::ConsoleConfig;
    pub use crate::core::{ActionId, ConsoleBuilder, RecoveryConsole, Trigger};
    pub use crate::errors::{AppError, ErrorCategory};
    pub use crate::gate::{ConfirmationSpec, Decision};
    pub use crate::views::{
        BatchRecord, BatchStatus, ControlState, DownloadedFile, HistoryWindow, QueuedToast,
        ToastLevel, VerificationLine, WorkflowPhase,
    };
    pub use crate::workflows::{FormSubmission, Rendered, WorkflowOutcome};
}
