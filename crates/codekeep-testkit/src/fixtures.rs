//! Canned data and a fully wired console for tests

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use codekeep_app::{
    ActionId, BatchRecord, ConsoleConfig, FormSubmission, RecoveryConsole, Trigger,
    WorkflowOutcome,
};

use crate::mocks::{
    MockRemote, RecordingRenderer, RecordingToastSurface, ScriptedDialog, StaticToken,
};

/// Token every test console sends
pub const TEST_TOKEN: &str = "test-csrf-token";

/// Fixed creation time so fixtures compare equal across runs
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Active batch with a deterministic id
pub fn batch(n: u128) -> BatchRecord {
    BatchRecord::new(Uuid::from_u128(n), 10, fixed_time())
}

/// Server answer to a successful generation
pub fn generate_response(batch: &BatchRecord, codes: &[&str]) -> Value {
    json!({
        "SUCCESS": true,
        "CAN_GENERATE": true,
        "TOTAL_ISSUED": codes.len(),
        "CODES": codes,
        "BATCH": batch,
        "HAS_COMPLETED_SETUP": false,
        "MESSAGE": "Codes generated"
    })
}

/// Server answer to a successful invalidate or delete
pub fn code_operation_success(alert_text: &str) -> Value {
    json!({
        "SUCCESS": true,
        "OPERATION_SUCCESS": true,
        "ALERT_TEXT": alert_text,
        "MESSAGE": "Done"
    })
}

/// Config with short toast timings
pub fn test_config() -> ConsoleConfig {
    ConsoleConfig {
        toast_display_ms: 20,
        toast_stagger_ms: 5,
        generation_grace_ms: 100,
        highlight_ms: 50,
        ..ConsoleConfig::default()
    }
}

/// A console wired to recording mocks
pub struct TestConsole {
    pub console: RecoveryConsole,
    pub remote: Arc<MockRemote>,
    pub dialog: Arc<ScriptedDialog>,
    pub toasts: Arc<RecordingToastSurface>,
    pub renderer: Arc<RecordingRenderer>,
}

impl TestConsole {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ConsoleConfig) -> Self {
        Self::build(config, StaticToken::new(TEST_TOKEN))
    }

    /// Console whose token source never yields a token
    pub fn without_token() -> Self {
        Self::build(test_config(), StaticToken::missing())
    }

    fn build(config: ConsoleConfig, token: Arc<StaticToken>) -> Self {
        let remote = MockRemote::new();
        let dialog = ScriptedDialog::new();
        let toasts = RecordingToastSurface::new();
        let renderer = RecordingRenderer::new();

        let console = RecoveryConsole::builder(config)
            .with_remote(remote.clone())
            .with_tokens(token)
            .with_dialog(dialog.clone())
            .with_renderer(renderer.clone())
            .with_toasts(toasts.clone())
            .build()
            .expect("test config is valid");

        Self {
            console,
            remote,
            dialog,
            toasts,
            renderer,
        }
    }

    /// Endpoint path the console uses for `action`
    pub fn endpoint(&self, action: ActionId) -> String {
        self.console
            .config()
            .endpoints
            .for_action(action)
            .to_string()
    }

    /// Dispatch `action` from its own control
    pub async fn run(&self, action: ActionId, form: &FormSubmission) -> WorkflowOutcome {
        self.console
            .dispatch(&Trigger::for_action(action), form)
            .await
    }

    /// Texts of every message still waiting in the queue
    pub fn pending_messages(&self) -> Vec<String> {
        self.console
            .queue()
            .pending()
            .into_iter()
            .map(|toast| toast.message)
            .collect()
    }

    /// Script a successful generation for `action` and the viewed acknowledgement
    pub fn script_generation(&self, action: ActionId, batch: &BatchRecord, codes: &[&str]) {
        self.remote
            .respond_json(&self.endpoint(action), generate_response(batch, codes));
        let viewed = self.console.config().endpoints.viewed.clone();
        self.remote.respond_json(&viewed, json!({ "SUCCESS": true }));
    }
}

impl Default for TestConsole {
    fn default() -> Self {
        Self::new()
    }
}
