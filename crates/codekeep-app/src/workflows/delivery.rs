//! Email and download workflows
//!
//! Both are single-use per batch: once they succeed the control is marked
//! completed and stays disabled until the next generation resets it.

use serde_json::json;

use super::{
    call_json, decode, fail, fail_with, post_request, rendered, settle, Rendered, Settled,
    WorkflowOutcome,
};
use crate::core::{ActionId, RecoveryConsole, Trigger};
use crate::errors::AppError;
use crate::gate::{Confirmation, ConfirmationSpec};
use crate::runtime_bridge::RemoteResponse;
use crate::views::notifications::{
    ToastLevel, DOWNLOAD_FAILED, DOWNLOAD_PREPARING, DOWNLOAD_SUCCEEDED, EMAIL_NOT_SENT,
};
use crate::views::operations::MessageResponse;

/// Email the current batch to the account owner
pub async fn email(console: &RecoveryConsole, trigger: &Trigger) -> WorkflowOutcome {
    let action = ActionId::Email;
    let endpoint = console.config().endpoints.for_action(action);
    let spec = ConfirmationSpec::new(
        "Email Recovery Codes?",
        "Would you like to email yourself the recovery codes?",
    )
    .with_labels("Yes, email me", "No, thanks")
    .with_cancel_message("No worries! Just make sure to copy or download the codes.")
    .with_success_message(
        "Your recovery codes are on their way. We'll notify you once the email is sent.",
    )
    .with_severity(ToastLevel::Info);

    let result = console
        .gate()
        .arbitrate(
            trigger,
            action,
            action.indicator(),
            &Confirmation::Prompt(spec),
            || send_email(console, endpoint),
        )
        .await;

    let response = match settle(result) {
        Settled::Completed(response) => response,
        Settled::Stopped(outcome) => return outcome,
        Settled::Errored(err) => return fail(console, action, &err),
    };

    let message = response.text().unwrap_or(EMAIL_NOT_SENT).to_string();
    if !response.success {
        return fail_with(console, action, message, ToastLevel::Error);
    }

    if let Some(label) = action.done_label() {
        console.controls().mark_completed(action, label);
    }
    console.queue().success(message);
    rendered(console, action, Rendered::Emailed)
}

async fn send_email(
    console: &RecoveryConsole,
    endpoint: &str,
) -> Result<MessageResponse, AppError> {
    let value = call_json(console, endpoint, json!({})).await?;
    decode(endpoint, value)
}

/// Download the current batch as a file. No confirmation is asked.
pub async fn download(console: &RecoveryConsole, trigger: &Trigger) -> WorkflowOutcome {
    let action = ActionId::Download;
    let endpoint = console.config().endpoints.for_action(action);

    let result = console
        .gate()
        .arbitrate(
            trigger,
            action,
            action.indicator(),
            &Confirmation::Skip,
            || fetch_file(console, endpoint),
        )
        .await;

    let response = match settle(result) {
        Settled::Completed(response) => response,
        Settled::Stopped(outcome) => return outcome,
        Settled::Errored(err) => return fail(console, action, &err),
    };

    match response {
        RemoteResponse::File(file) if file.success => {
            tracing::info!(filename = %file.filename, bytes = file.bytes.len(), "codes downloaded");
            if let Some(label) = action.done_label() {
                console.controls().mark_completed(action, label);
            }
            console.queue().success(DOWNLOAD_SUCCEEDED);
            rendered(console, action, Rendered::Downloaded(file))
        }
        RemoteResponse::File(file) => {
            tracing::warn!(filename = %file.filename, "server flagged download as unsuccessful");
            fail_with(console, action, DOWNLOAD_FAILED, ToastLevel::Error)
        }
        // The server answers with JSON when there is nothing to download
        RemoteResponse::Json(value) => match decode::<MessageResponse>(endpoint, value) {
            Ok(reply) => {
                let message = reply.text().unwrap_or(DOWNLOAD_FAILED).to_string();
                console.queue().info(message.as_str());
                rendered(console, action, Rendered::Notice { message })
            }
            Err(err) => fail(console, action, &err),
        },
    }
}

async fn fetch_file(
    console: &RecoveryConsole,
    endpoint: &str,
) -> Result<RemoteResponse, AppError> {
    console.queue().info(DOWNLOAD_PREPARING);
    let request = post_request(console, endpoint, json!({ "forceUpdate": true }))?;
    console.remote().call(request).await
}
