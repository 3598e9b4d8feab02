//! # Presentation Bridges
//!
//! Traits through which the console core reaches the platform UI:
//!
//! - **dialog**: confirm / deny / dismiss prompts
//! - **toasts**: the single toast slot the message queue drains into
//! - **renderer**: codes table, history cards, verification section
//!
//! Implementations are opaque to the core; none of them may block.

use async_trait::async_trait;

use crate::gate::{ConfirmationSpec, Decision};
use crate::views::history::HistoryWindow;
use crate::views::notifications::QueuedToast;
use crate::views::operations::VerificationLine;

/// Modal confirmation prompt
#[async_trait]
pub trait ConfirmationDialog: Send + Sync {
    /// Present the prompt and resolve once the user answers.
    async fn confirm(&self, spec: &ConfirmationSpec) -> Decision;
}

/// The one toast slot. At most one toast is shown at a time.
pub trait ToastSurface: Send + Sync {
    fn show(&self, toast: &QueuedToast);
    fn hide(&self, toast: &QueuedToast);
}

/// Renders console sections from view state
pub trait ConsoleRenderer: Send + Sync {
    /// Populate the codes table.
    ///
    /// Returns false when the table could not be populated, in which case
    /// the generation is treated as failed.
    fn render_codes(&self, codes: &[String]) -> bool;

    fn render_history(&self, _history: &HistoryWindow) {}

    fn render_total_issued(&self, _total: u64) {}

    fn render_verification(&self, _lines: &[VerificationLine]) {}

    fn set_verification_visible(&self, _visible: bool) {}

    /// Toggle the "processing your request" notice
    fn set_processing_notice(&self, _visible: bool) {}
}
