//! Batch generation workflows
//!
//! generate-with-expiry, generate-without-expiry and regenerate share one
//! reconciliation path: render codes, acknowledge the view, fold the new
//! batch into history, then release the session's generation flag.

use serde_json::{json, Value};

use super::forms::{self, FormSubmission};
use super::{
    call_json, decode, fail, fail_with, rendered, settle, Rendered, Settled, WorkflowOutcome,
    BATCH_ACTIONS,
};
use crate::core::{ActionId, RecoveryConsole, Trigger};
use crate::errors::AppError;
use crate::gate::{Confirmation, ConfirmationSpec};
use crate::views::history::Retirement;
use crate::views::notifications::{ToastLevel, CODES_NOT_DISPLAYED, GENERIC_FAILURE};
use crate::views::operations::GenerateResponse;

const IN_BACKGROUND: &str = "Great! Your codes are being generated in the background and will \
    appear in the generated codes section once ready. Please don't close the page.";
const NO_ACTION_TAKEN: &str = "No worries! No action was taken";
const CODES_READY: &str = "Your new recovery codes are ready";

/// Generate a batch that expires after the submitted number of days
pub async fn generate_with_expiry(
    console: &RecoveryConsole,
    trigger: &Trigger,
    form: &FormSubmission,
) -> WorkflowOutcome {
    let action = ActionId::GenerateWithExpiry;
    if !trigger.matches(action) {
        return WorkflowOutcome::Ignored;
    }
    let days = match forms::validate(action, form)
        .and_then(|()| forms::days_to_expiry(form).map_err(|e| vec![e]))
    {
        Ok(days) => days,
        Err(errors) => return WorkflowOutcome::Invalid(errors),
    };

    let unit = if days == 1 { "day" } else { "days" };
    let spec = ConfirmationSpec::new(
        "Generate Code",
        format!(
            "This will generate new recovery codes and remove any unused ones. \
             They will be valid for only {days} {unit}. Are you sure you want to continue?"
        ),
    )
    .with_labels("Yes, generate codes", "No, don't generate codes")
    .with_cancel_message(NO_ACTION_TAKEN)
    .with_success_message(IN_BACKGROUND)
    .with_severity(ToastLevel::Info);

    run(
        console,
        trigger,
        action,
        spec,
        json!({ "daysToExpiry": days, "forceUpdate": true }),
    )
    .await
}

/// Generate a batch with no expiry
pub async fn generate_without_expiry(
    console: &RecoveryConsole,
    trigger: &Trigger,
) -> WorkflowOutcome {
    let spec = ConfirmationSpec::new(
        "Generate Code",
        "This will generate new recovery codes. They stay valid until deleted or \
         invalidated. Are you sure you want to continue?",
    )
    .with_labels("Yes, generate codes", "No, don't generate codes")
    .with_cancel_message(NO_ACTION_TAKEN)
    .with_success_message(IN_BACKGROUND)
    .with_severity(ToastLevel::Info);

    run(
        console,
        trigger,
        ActionId::GenerateWithoutExpiry,
        spec,
        json!({ "forceUpdate": true }),
    )
    .await
}

/// Replace the current batch with a fresh one
pub async fn regenerate(console: &RecoveryConsole, trigger: &Trigger) -> WorkflowOutcome {
    let spec = ConfirmationSpec::new(
        "Ready to get new codes?",
        "Doing this will remove your current codes. Are you sure you want to go ahead?",
    )
    .with_labels("Yes, regenerate", "No, keep my existing codes")
    .with_cancel_message("No worries! Your codes are safe.")
    .with_success_message(IN_BACKGROUND);

    run(
        console,
        trigger,
        ActionId::Regenerate,
        spec,
        json!({ "forceUpdate": true }),
    )
    .await
}

async fn run(
    console: &RecoveryConsole,
    trigger: &Trigger,
    action: ActionId,
    spec: ConfirmationSpec,
    body: Value,
) -> WorkflowOutcome {
    let endpoint = console.config().endpoints.for_action(action);
    let result = console
        .gate()
        .arbitrate(
            trigger,
            action,
            action.indicator(),
            &Confirmation::Prompt(spec),
            || request_batch(console, action, endpoint, body),
        )
        .await;

    match settle(result) {
        Settled::Completed(response) => reconcile(console, action, response).await,
        Settled::Stopped(outcome) => outcome,
        Settled::Errored(err) => {
            let outcome = fail(console, action, &err);
            release_after_grace(console);
            outcome
        }
    }
}

/// The generation flag is raised only once the call is actually dispatched.
async fn request_batch(
    console: &RecoveryConsole,
    action: ActionId,
    endpoint: &str,
    body: Value,
) -> Result<GenerateResponse, AppError> {
    console.session().set_code_generation(true);
    console.session().set_pending_action(Some(action));
    let value = call_json(console, endpoint, body).await?;
    decode(endpoint, value)
}

fn release_after_grace(console: &RecoveryConsole) {
    console.session().set_pending_action(None);
    console
        .session()
        .clear_generation_after(console.config().generation_grace());
}

async fn reconcile(
    console: &RecoveryConsole,
    action: ActionId,
    response: GenerateResponse,
) -> WorkflowOutcome {
    if !response.success {
        tracing::warn!(action = %action, error = ?response.error, "server refused generation");
        let outcome = fail_with(console, action, GENERIC_FAILURE, ToastLevel::Error);
        release_after_grace(console);
        return outcome;
    }

    if !response.can_generate {
        let message = response
            .message
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        let outcome = fail_with(console, action, message, ToastLevel::Warning);
        release_after_grace(console);
        return outcome;
    }

    let renderer = console.renderer();
    renderer.render_total_issued(response.total_issued);
    if !renderer.render_codes(&response.codes) {
        let outcome = fail_with(console, action, CODES_NOT_DISPLAYED, ToastLevel::Error);
        release_after_grace(console);
        return outcome;
    }

    acknowledge_viewed(console).await;

    let batch_id = match response.batch {
        Some(batch) => {
            let capacity = response
                .item_per_page
                .unwrap_or(console.config().history_capacity);
            let id = batch.id;
            let mut history = console.history().lock().await;
            let superseded = history.front().filter(|b| b.is_active()).map(|b| b.id);
            let evicted = history.insert(batch, capacity, Retirement::Confirmed);
            if let Some(previous) = superseded {
                history.mark_deleted(previous);
            }
            if !evicted.is_empty() {
                tracing::debug!(evicted = evicted.len(), "history window trimmed");
            }
            renderer.render_history(&history);
            Some(id)
        }
        None => {
            tracing::warn!(action = %action, "generation response carried no batch");
            None
        }
    };

    let session = console.session();
    session.set_code_generation(false);
    session.set_pending_action(None);

    let controls = console.controls();
    for batch_action in BATCH_ACTIONS {
        controls.reset(batch_action);
    }
    if !response.has_completed_setup && !session.is_setup_verified() {
        controls.set_hidden(ActionId::VerifySetup, false);
        renderer.set_verification_visible(true);
    }

    console.queue().success(CODES_READY);
    rendered(
        console,
        action,
        Rendered::Generated {
            batch_id,
            codes: response.codes.len(),
            total_issued: response.total_issued,
        },
    )
}

/// Tell the server the codes were shown. Failure is only logged.
async fn acknowledge_viewed(console: &RecoveryConsole) {
    let endpoint = console.config().endpoints.viewed.as_str();
    if let Err(err) = call_json(console, endpoint, json!({})).await {
        tracing::warn!(error = %err, "failed to mark codes as viewed");
    }
}
