//! Single-code and whole-batch removal workflows

use serde_json::json;
use tokio::time::Instant;

use super::forms::{self, FormSubmission};
use super::{
    call_json, compose, decode, fail, fail_with, rendered, settle, Rendered, Settled,
    WorkflowOutcome, BATCH_ACTIONS,
};
use crate::core::{ActionId, RecoveryConsole, Trigger};
use crate::errors::AppError;
use crate::gate::{Confirmation, ConfirmationSpec};
use crate::views::history::CounterField;
use crate::views::notifications::{
    ToastLevel, CODE_DEACTIVATED, CODE_DELETED, CODE_INVALID, CODE_NOT_VALID_TITLE,
    CODE_NO_LONGER_VALID, GENERIC_FAILURE,
};
use crate::views::operations::{CodeOperationResponse, MessageResponse};

/// Static description of a single-code operation
struct CodeOperation {
    action: ActionId,
    field: &'static str,
    counter: CounterField,
    /// Alert text the server uses for a full success
    success_text: &'static str,
    confirmation: fn(&str) -> ConfirmationSpec,
}

const INVALIDATE: CodeOperation = CodeOperation {
    action: ActionId::Invalidate,
    field: "invalidate_code",
    counter: CounterField::Invalidated,
    success_text: CODE_DEACTIVATED,
    confirmation: invalidate_prompt,
};

const DELETE_ONE: CodeOperation = CodeOperation {
    action: ActionId::DeleteOne,
    field: "delete_code",
    counter: CounterField::Removed,
    success_text: CODE_DELETED,
    confirmation: delete_prompt,
};

fn invalidate_prompt(code: &str) -> ConfirmationSpec {
    ConfirmationSpec::new(
        "Invalidate Code",
        format!(
            "You are about to invalidate code \"{code}\". This action cannot be undone. \
             Are you sure you want to proceed?"
        ),
    )
    .with_labels("Yes, invalidate", "No, keep code safe")
    .with_cancel_message("Cancelled - your code is safe.")
    .with_success_message(format!(
        "Your request to invalidate code \"{code}\" is being processed."
    ))
}

fn delete_prompt(code: &str) -> ConfirmationSpec {
    ConfirmationSpec::new(
        "Delete code",
        format!(
            "Doing this will delete the code \"{code}\". This action cannot be reversed. \
             Are you sure you want to go ahead?"
        ),
    )
    .with_labels("Yes, delete code", "No, don't delete code")
    .with_cancel_message("No worries! Your code is safe.")
    .with_success_message("Your code is being processed, please wait...")
}

/// Invalidate one code of the current batch
pub async fn invalidate(
    console: &RecoveryConsole,
    trigger: &Trigger,
    form: &FormSubmission,
) -> WorkflowOutcome {
    run_code_operation(console, trigger, form, &INVALIDATE).await
}

/// Delete one code of the current batch
pub async fn delete_one(
    console: &RecoveryConsole,
    trigger: &Trigger,
    form: &FormSubmission,
) -> WorkflowOutcome {
    run_code_operation(console, trigger, form, &DELETE_ONE).await
}

async fn run_code_operation(
    console: &RecoveryConsole,
    trigger: &Trigger,
    form: &FormSubmission,
    op: &CodeOperation,
) -> WorkflowOutcome {
    let action = op.action;
    if !trigger.matches(action) {
        return WorkflowOutcome::Ignored;
    }
    if let Err(errors) = forms::validate(action, form) {
        return WorkflowOutcome::Invalid(errors);
    }
    let code = form.value(op.field).unwrap_or_default();
    let endpoint = console.config().endpoints.for_action(action);

    let result = console
        .gate()
        .arbitrate(
            trigger,
            action,
            action.indicator(),
            &Confirmation::Prompt((op.confirmation)(code)),
            || send_code(console, endpoint, code),
        )
        .await;

    let response = match settle(result) {
        Settled::Completed(response) => response,
        Settled::Stopped(outcome) => return outcome,
        Settled::Errored(err) => return fail(console, action, &err),
    };

    if response.success.is_none() {
        return fail_with(console, action, CODE_INVALID, ToastLevel::Error);
    }

    if !response.operation_success {
        let message = compose(
            Some(response.alert_text.as_deref().unwrap_or(CODE_NOT_VALID_TITLE)),
            Some(response.message.as_deref().unwrap_or(CODE_NO_LONGER_VALID)),
        );
        return fail_with(console, action, message, ToastLevel::Error);
    }

    let message = compose(response.alert_text.as_deref(), response.message.as_deref());
    if response.alert_text.as_deref() != Some(op.success_text) {
        console.queue().info(message.as_str());
        return rendered(console, action, Rendered::Notice { message });
    }

    console.queue().success(message);
    let mut history = console.history().lock().await;
    let value = match history.front().map(|batch| batch.id) {
        Some(id) => history.increment(id, op.counter, Instant::now(), console.config().highlight()),
        None => None,
    };
    console.renderer().render_history(&history);
    drop(history);

    rendered(
        console,
        action,
        Rendered::CodeUpdated {
            counter: op.counter,
            value,
        },
    )
}

async fn send_code(
    console: &RecoveryConsole,
    endpoint: &str,
    code: &str,
) -> Result<CodeOperationResponse, AppError> {
    let value = call_json(console, endpoint, json!({ "code": code })).await?;
    decode(endpoint, value)
}

/// Delete the whole current batch
pub async fn delete_all(console: &RecoveryConsole, trigger: &Trigger) -> WorkflowOutcome {
    let action = ActionId::DeleteAll;
    let endpoint = console.config().endpoints.for_action(action);
    let spec = ConfirmationSpec::new(
        "Delete all codes",
        "Doing this will delete every code in your current batch. This action cannot be \
         reversed. Are you sure you want to go ahead?",
    )
    .with_labels("Yes, delete all", "No, keep my codes")
    .with_cancel_message("No worries! Your codes are safe.")
    .with_success_message("Your codes are being deleted, please wait...")
    .with_severity(ToastLevel::Error);

    let result = console
        .gate()
        .arbitrate(
            trigger,
            action,
            action.indicator(),
            &Confirmation::Prompt(spec),
            || delete_batch(console, endpoint),
        )
        .await;

    let response = match settle(result) {
        Settled::Completed(response) => response,
        Settled::Stopped(outcome) => return outcome,
        Settled::Errored(err) => return fail(console, action, &err),
    };

    if !response.success {
        let message = response.text().unwrap_or(GENERIC_FAILURE).to_string();
        return fail_with(console, action, message, ToastLevel::Error);
    }

    let mut history = console.history().lock().await;
    let batch_id = history.front().map(|batch| batch.id);
    if let Some(id) = batch_id {
        history.mark_deleted(id);
    }
    console.renderer().render_history(&history);
    drop(history);

    for batch_action in BATCH_ACTIONS {
        console
            .controls()
            .mark_completed(batch_action, "No active recovery codes");
    }

    console
        .queue()
        .success(response.text().unwrap_or("All your codes have been deleted"));
    rendered(console, action, Rendered::BatchDeleted { batch_id })
}

async fn delete_batch(
    console: &RecoveryConsole,
    endpoint: &str,
) -> Result<MessageResponse, AppError> {
    let value = call_json(console, endpoint, json!({})).await?;
    decode(endpoint, value)
}
