//! One-off verification that the recovery-code setup works end to end

use serde_json::json;

use super::forms::{self, FormSubmission};
use super::{call_json, fail, fail_with, rendered, settle, Rendered, Settled, WorkflowOutcome};
use crate::core::{ActionId, RecoveryConsole, Trigger};
use crate::errors::AppError;
use crate::gate::{Confirmation, ConfirmationSpec};
use crate::views::notifications::{ToastLevel, SETUP_NOT_VERIFIED, SETUP_VERIFIED};
use crate::views::operations::VerifyResponse;

const CODE_FIELD: &str = "verify_code";

/// Check one code against the backend and report each check line
pub async fn verify_setup(
    console: &RecoveryConsole,
    trigger: &Trigger,
    form: &FormSubmission,
) -> WorkflowOutcome {
    let action = ActionId::VerifySetup;
    if !trigger.matches(action) {
        return WorkflowOutcome::Ignored;
    }
    if let Err(errors) = forms::validate(action, form) {
        return WorkflowOutcome::Invalid(errors);
    }
    let code = form.value(CODE_FIELD).unwrap_or_default();
    let endpoint = console.config().endpoints.for_action(action);

    let spec = ConfirmationSpec::new(
        "Verify setup",
        "This will check that your setup is correctly configured with the backend. \
         The check runs once and is not repeated for later batches. \
         Are you sure you want to continue?",
    )
    .with_labels("Yes, validate setup", "No, don't validate setup")
    .with_cancel_message("No worries! No action was taken")
    .with_success_message(
        "Your codes are being verified. You can keep using the console while we check them.",
    )
    .with_severity(ToastLevel::Info);

    let result = console
        .gate()
        .arbitrate(
            trigger,
            action,
            action.indicator(),
            &Confirmation::Prompt(spec),
            || run_check(console, endpoint, code),
        )
        .await;
    console.session().set_verification(false);

    let response = match settle(result) {
        Settled::Completed(response) => response,
        Settled::Stopped(outcome) => return outcome,
        Settled::Errored(err) => return fail(console, action, &err),
    };

    let renderer = console.renderer();
    renderer.render_verification(&response.lines);

    if !response.passed() {
        tracing::info!(checks = response.lines.len(), "setup verification did not pass");
        return fail_with(console, action, SETUP_NOT_VERIFIED, ToastLevel::Warning);
    }

    console.session().mark_setup_verified();
    let controls = console.controls();
    controls.mark_completed(action, SETUP_VERIFIED);
    controls.set_hidden(action, true);
    renderer.set_verification_visible(false);
    console.queue().success(SETUP_VERIFIED);

    rendered(
        console,
        action,
        Rendered::Verified {
            lines: response.lines,
        },
    )
}

async fn run_check(
    console: &RecoveryConsole,
    endpoint: &str,
    code: &str,
) -> Result<VerifyResponse, AppError> {
    console.session().set_verification(true);
    let value = call_json(console, endpoint, json!({ "code": code })).await?;
    VerifyResponse::from_value(&value)
        .ok_or_else(|| AppError::decode(endpoint, "verification result is not an object"))
}
