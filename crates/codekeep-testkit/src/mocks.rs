//! Scripted host capabilities
//!
//! Every mock records what the console asked of it so tests can assert on
//! calls, prompts, toasts and rendered state. The remote and the dialog can
//! be held so a test can interleave a second trigger with a pending one.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use codekeep_app::bridge::{ConfirmationDialog, ConsoleRenderer, ToastSurface};
use codekeep_app::views::operations::VerificationLine;
use codekeep_app::{
    AppError, BatchRecord, ConfirmationSpec, Decision, DownloadedFile, HistoryWindow, QueuedToast,
    RemoteChannel, RemoteRequest, RemoteResponse, TokenSource,
};

/// Gate that parks callers until the test releases them
#[derive(Debug, Default)]
struct Hold {
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl Hold {
    fn engage(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    fn release(&self, count: usize) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(count);
        }
    }

    async fn wait(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

// ============================================================================
// Remote
// ============================================================================

type Scripted = Result<RemoteResponse, AppError>;

/// Remote channel answering from per-endpoint scripts
#[derive(Debug, Default)]
pub struct MockRemote {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallbacks: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<RemoteRequest>>,
    hold: Hold,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue one JSON answer for `endpoint`
    pub fn respond_json(&self, endpoint: &str, body: Value) -> &Self {
        self.respond(endpoint, Ok(RemoteResponse::Json(body)))
    }

    /// Queue one file answer for `endpoint`
    pub fn respond_file(&self, endpoint: &str, file: DownloadedFile) -> &Self {
        self.respond(endpoint, Ok(RemoteResponse::File(file)))
    }

    /// Queue one error for `endpoint`
    pub fn fail(&self, endpoint: &str, error: AppError) -> &Self {
        self.respond(endpoint, Err(error))
    }

    pub fn respond(&self, endpoint: &str, answer: Scripted) -> &Self {
        self.scripts
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(answer);
        self
    }

    /// Answer used once the script for `endpoint` runs dry
    pub fn respond_always(&self, endpoint: &str, answer: Scripted) -> &Self {
        self.fallbacks.lock().insert(endpoint.to_string(), answer);
        self
    }

    /// Park every following call until [`MockRemote::release`]
    pub fn hold(&self) {
        self.hold.engage();
    }

    pub fn release(&self, calls: usize) {
        self.hold.release(calls);
    }

    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|request| request.endpoint == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_answer(&self, endpoint: &str) -> Scripted {
        if let Some(answer) = self
            .scripts
            .lock()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            return answer;
        }
        self.fallbacks
            .lock()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| {
                Err(AppError::internal(
                    "mock-remote",
                    format!("no scripted response for {endpoint}"),
                ))
            })
    }
}

#[async_trait]
impl RemoteChannel for MockRemote {
    async fn call(&self, request: RemoteRequest) -> Result<RemoteResponse, AppError> {
        request.validate()?;
        self.calls.lock().push(request.clone());
        self.hold.wait().await;
        self.next_answer(&request.endpoint)
    }
}

// ============================================================================
// Dialog
// ============================================================================

/// Confirmation dialog answering from a queue of decisions.
///
/// Confirms when the queue is empty.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    decisions: Mutex<VecDeque<Decision>>,
    prompts: Mutex<Vec<ConfirmationSpec>>,
    hold: Hold,
}

impl ScriptedDialog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, decision: Decision) -> &Self {
        self.decisions.lock().push_back(decision);
        self
    }

    /// Park every following prompt until [`ScriptedDialog::release`]
    pub fn hold(&self) {
        self.hold.engage();
    }

    pub fn release(&self, prompts: usize) {
        self.hold.release(prompts);
    }

    pub fn prompts(&self) -> Vec<ConfirmationSpec> {
        self.prompts.lock().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl ConfirmationDialog for ScriptedDialog {
    async fn confirm(&self, spec: &ConfirmationSpec) -> Decision {
        self.prompts.lock().push(spec.clone());
        self.hold.wait().await;
        self.decisions
            .lock()
            .pop_front()
            .unwrap_or(Decision::Confirmed)
    }
}

// ============================================================================
// Toasts
// ============================================================================

/// One call made on a toast surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(QueuedToast),
    Hidden(QueuedToast),
}

/// Toast surface that records every show and hide
#[derive(Debug, Default)]
pub struct RecordingToastSurface {
    events: Mutex<Vec<ToastEvent>>,
    visible: AtomicUsize,
    max_visible: AtomicUsize,
}

impl RecordingToastSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ToastEvent> {
        self.events.lock().clone()
    }

    /// Messages in the order they were shown
    pub fn shown(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ToastEvent::Shown(toast) => Some(toast.message.clone()),
                ToastEvent::Hidden(_) => None,
            })
            .collect()
    }

    /// Most toasts ever on screen at once
    pub fn max_visible(&self) -> usize {
        self.max_visible.load(Ordering::SeqCst)
    }
}

impl ToastSurface for RecordingToastSurface {
    fn show(&self, toast: &QueuedToast) {
        let visible = self.visible.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_visible.fetch_max(visible, Ordering::SeqCst);
        self.events.lock().push(ToastEvent::Shown(toast.clone()));
    }

    fn hide(&self, toast: &QueuedToast) {
        self.visible.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().push(ToastEvent::Hidden(toast.clone()));
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Renderer that records what it was asked to draw
#[derive(Debug)]
pub struct RecordingRenderer {
    accept_codes: AtomicBool,
    codes: Mutex<Vec<Vec<String>>>,
    histories: Mutex<Vec<Vec<BatchRecord>>>,
    totals: Mutex<Vec<u64>>,
    verification: Mutex<Vec<VerificationLine>>,
    verification_visible: Mutex<Option<bool>>,
    notices: Mutex<Vec<bool>>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            accept_codes: AtomicBool::new(true),
            codes: Mutex::default(),
            histories: Mutex::default(),
            totals: Mutex::default(),
            verification: Mutex::default(),
            verification_visible: Mutex::default(),
            notices: Mutex::default(),
        }
    }
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `render_codes` report that nothing could be drawn
    pub fn reject_codes(&self) {
        self.accept_codes.store(false, Ordering::SeqCst);
    }

    pub fn last_codes(&self) -> Option<Vec<String>> {
        self.codes.lock().last().cloned()
    }

    pub fn last_history(&self) -> Option<Vec<BatchRecord>> {
        self.histories.lock().last().cloned()
    }

    pub fn last_total(&self) -> Option<u64> {
        self.totals.lock().last().copied()
    }

    pub fn verification_lines(&self) -> Vec<VerificationLine> {
        self.verification.lock().clone()
    }

    pub fn verification_visible(&self) -> Option<bool> {
        *self.verification_visible.lock()
    }

    /// Every processing-notice toggle, in order
    pub fn notices(&self) -> Vec<bool> {
        self.notices.lock().clone()
    }
}

impl ConsoleRenderer for RecordingRenderer {
    fn render_codes(&self, codes: &[String]) -> bool {
        self.codes.lock().push(codes.to_vec());
        self.accept_codes.load(Ordering::SeqCst)
    }

    fn render_history(&self, history: &HistoryWindow) {
        self.histories.lock().push(history.iter().cloned().collect());
    }

    fn render_total_issued(&self, total: u64) {
        self.totals.lock().push(total);
    }

    fn render_verification(&self, lines: &[VerificationLine]) {
        *self.verification.lock() = lines.to_vec();
    }

    fn set_verification_visible(&self, visible: bool) {
        *self.verification_visible.lock() = Some(visible);
    }

    fn set_processing_notice(&self, visible: bool) {
        self.notices.lock().push(visible);
    }
}

// ============================================================================
// Token
// ============================================================================

/// Token source with a fixed answer
#[derive(Debug, Clone)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self(Some(token.into())))
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self(None))
    }
}

impl TokenSource for StaticToken {
    fn anti_forgery_token(&self) -> Option<String> {
        self.0.clone()
    }
}
