//! # Console Workflows
//!
//! One entry point per console action. Each runs the same state machine:
//!
//! ```text
//! IDLE ──validate──► CONFIRMING ──gate──► IN_FLIGHT ──► RENDERED | FAILED
//!   ▲                    │
//!   └──── deny/dismiss ──┘
//! ```
//!
//! Transport and remote errors never escape a workflow: they are logged,
//! turned into one queued message, and reported as [`WorkflowOutcome::Failed`].

pub mod codes;
pub mod delivery;
pub mod dispatch;
pub mod forms;
pub mod generate;
pub mod verify;

pub use dispatch::dispatch;
pub use forms::FormSubmission;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::core::{ActionId, RecoveryConsole};
use crate::errors::AppError;
use crate::gate::{Arbitration, Decision};
use crate::runtime_bridge::RemoteRequest;
use crate::views::controls::WorkflowPhase;
use crate::views::history::CounterField;
use crate::views::notifications::ToastLevel;
use crate::views::operations::{DownloadedFile, VerificationLine};

/// Actions tied to the current batch; disabled once it is deleted and
/// re-enabled by the next generation.
pub(crate) const BATCH_ACTIONS: [ActionId; 5] = [
    ActionId::Invalidate,
    ActionId::DeleteOne,
    ActionId::DeleteAll,
    ActionId::Email,
    ActionId::Download,
];

/// What a successful workflow put on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Generated {
        batch_id: Option<Uuid>,
        codes: usize,
        total_issued: u64,
    },
    CodeUpdated {
        counter: CounterField,
        value: Option<u32>,
    },
    /// Server answered with information rather than a state change
    Notice { message: String },
    BatchDeleted { batch_id: Option<Uuid> },
    Emailed,
    Downloaded(DownloadedFile),
    Verified { lines: Vec<VerificationLine> },
}

/// Terminal state of one workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Trigger did not match, or the control was busy or done
    Ignored,
    /// Form validation failed; nothing was sent
    Invalid(Vec<AppError>),
    /// The user denied or dismissed the confirmation
    Declined(Decision),
    Rendered(Rendered),
    /// A failure message was queued
    Failed { message: String },
}

impl WorkflowOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// An arbitration split into what the workflow does next
pub(crate) enum Settled<T> {
    Completed(T),
    Stopped(WorkflowOutcome),
    Errored(AppError),
}

pub(crate) fn settle<T>(result: Result<Arbitration<T>, AppError>) -> Settled<T> {
    match result {
        Ok(Arbitration::Completed(value)) => Settled::Completed(value),
        Ok(Arbitration::Ignored) => Settled::Stopped(WorkflowOutcome::Ignored),
        Ok(Arbitration::Denied) => Settled::Stopped(WorkflowOutcome::Declined(Decision::Denied)),
        Ok(Arbitration::Dismissed) => {
            Settled::Stopped(WorkflowOutcome::Declined(Decision::Dismissed))
        }
        Err(err) => Settled::Errored(err),
    }
}

/// Build a POST carrying the session's anti-forgery token
pub(crate) fn post_request(
    console: &RecoveryConsole,
    endpoint: &str,
    body: Value,
) -> Result<RemoteRequest, AppError> {
    let token = console
        .tokens()
        .anti_forgery_token()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::MissingToken {
            endpoint: endpoint.to_string(),
        })?;
    let request = RemoteRequest::post(endpoint, body).with_token(token);
    request.validate()?;
    Ok(request)
}

/// POST and expect a JSON answer
pub(crate) async fn call_json(
    console: &RecoveryConsole,
    endpoint: &str,
    body: Value,
) -> Result<Value, AppError> {
    let request = post_request(console, endpoint, body)?;
    tracing::debug!(%endpoint, "calling remote");
    console.remote().call(request).await?.into_json(endpoint)
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::decode(endpoint, e.to_string()))
}

/// Queue `message` and mark the workflow failed
pub(crate) fn fail_with(
    console: &RecoveryConsole,
    action: ActionId,
    message: impl Into<String>,
    level: ToastLevel,
) -> WorkflowOutcome {
    let message = message.into();
    console.queue().enqueue(message.as_str(), level);
    console.controls().set_phase(action, WorkflowPhase::Failed);
    tracing::info!(action = %action, "workflow failed");
    WorkflowOutcome::Failed { message }
}

/// Log the raw error and queue its user-facing message
pub(crate) fn fail(console: &RecoveryConsole, action: ActionId, err: &AppError) -> WorkflowOutcome {
    tracing::warn!(action = %action, code = err.code(), error = %err, "remote operation failed");
    fail_with(console, action, err.user_message(), err.toast_level())
}

/// Mark the workflow rendered and hand back the outcome
pub(crate) fn rendered(
    console: &RecoveryConsole,
    action: ActionId,
    outcome: Rendered,
) -> WorkflowOutcome {
    console.controls().set_phase(action, WorkflowPhase::Rendered);
    tracing::info!(action = %action, "workflow rendered");
    WorkflowOutcome::Rendered(outcome)
}

/// Join an alert title and body into one toast line
pub(crate) fn compose(title: Option<&str>, body: Option<&str>) -> String {
    match (
        title.filter(|t| !t.is_empty()),
        body.filter(|b| !b.is_empty()),
    ) {
        (Some(title), Some(body)) => format!("{title}: {body}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => String::new(),
    }
}
