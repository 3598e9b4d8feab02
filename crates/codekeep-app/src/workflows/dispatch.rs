//! Route a trigger to its workflow

use super::{codes, delivery, generate, verify, FormSubmission, WorkflowOutcome};
use crate::core::{ActionId, RecoveryConsole, Trigger};

/// Run the workflow the trigger's control belongs to.
///
/// Detached triggers and unknown controls are ignored.
pub async fn dispatch(
    console: &RecoveryConsole,
    trigger: &Trigger,
    form: &FormSubmission,
) -> WorkflowOutcome {
    let Some(action) = trigger.action() else {
        tracing::debug!(control = ?trigger.resolve(), "no workflow for trigger");
        return WorkflowOutcome::Ignored;
    };

    tracing::debug!(action = %action, "dispatching workflow");
    match action {
        ActionId::GenerateWithExpiry => generate::generate_with_expiry(console, trigger, form).await,
        ActionId::GenerateWithoutExpiry => {
            generate::generate_without_expiry(console, trigger).await
        }
        ActionId::Regenerate => generate::regenerate(console, trigger).await,
        ActionId::Invalidate => codes::invalidate(console, trigger, form).await,
        ActionId::DeleteOne => codes::delete_one(console, trigger, form).await,
        ActionId::DeleteAll => codes::delete_all(console, trigger).await,
        ActionId::Email => delivery::email(console, trigger).await,
        ActionId::Download => delivery::download(console, trigger).await,
        ActionId::VerifySetup => verify::verify_setup(console, trigger, form).await,
    }
}
