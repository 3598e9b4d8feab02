//! The console handle and its builder.

use async_lock::Mutex;
use std::sync::Arc;

use crate::bridge::{ConfirmationDialog, ConsoleRenderer, ToastSurface};
use crate::config::ConsoleConfig;
use crate::core::Trigger;
use crate::errors::AppError;
use crate::gate::ActionGate;
use crate::push::PushFeed;
use crate::queue::MessageQueue;
use crate::runtime_bridge::{RemoteChannel, TokenSource};
use crate::session::{NavigationGuard, SessionState};
use crate::views::controls::ControlPanel;
use crate::views::history::HistoryWindow;
use crate::workflows::{self, FormSubmission, WorkflowOutcome};

/// One recovery-code console session.
///
/// Cheap to clone; every clone shares the same session flags, controls,
/// history and message queue.
#[derive(Clone)]
pub struct RecoveryConsole {
    config: ConsoleConfig,
    session: Arc<SessionState>,
    controls: Arc<ControlPanel>,
    history: Arc<Mutex<HistoryWindow>>,
    queue: Arc<MessageQueue>,
    gate: ActionGate,
    remote: Arc<dyn RemoteChannel>,
    tokens: Arc<dyn TokenSource>,
    renderer: Arc<dyn ConsoleRenderer>,
    toasts: Arc<dyn ToastSurface>,
}

impl RecoveryConsole {
    pub fn builder(config: ConsoleConfig) -> ConsoleBuilder {
        ConsoleBuilder::new(config)
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn controls(&self) -> &Arc<ControlPanel> {
        &self.controls
    }

    pub fn history(&self) -> &Mutex<HistoryWindow> {
        &self.history
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    pub fn remote(&self) -> &dyn RemoteChannel {
        self.remote.as_ref()
    }

    pub fn tokens(&self) -> &dyn TokenSource {
        self.tokens.as_ref()
    }

    pub fn renderer(&self) -> &dyn ConsoleRenderer {
        self.renderer.as_ref()
    }

    pub fn toasts(&self) -> &dyn ToastSurface {
        self.toasts.as_ref()
    }

    /// Guard the host consults before leaving the page
    pub fn navigation_guard(&self) -> NavigationGuard {
        NavigationGuard::new(Arc::clone(&self.session))
    }

    /// Feed for server-pushed notifications, sharing this console's queue
    pub fn push_feed(&self) -> PushFeed {
        PushFeed::new(Arc::clone(&self.queue))
    }

    /// Show every pending message on the toast surface, one at a time.
    ///
    /// Returns immediately with 0 when another drain is already running.
    pub async fn drain_messages(&self) -> usize {
        self.queue.drain(self.toasts.as_ref()).await
    }

    /// Run the workflow bound to `trigger`
    pub async fn dispatch(&self, trigger: &Trigger, form: &FormSubmission) -> WorkflowOutcome {
        workflows::dispatch(self, trigger, form).await
    }
}

/// Builder for [`RecoveryConsole`]
pub struct ConsoleBuilder {
    config: ConsoleConfig,
    session: Option<Arc<SessionState>>,
    remote: Option<Arc<dyn RemoteChannel>>,
    tokens: Option<Arc<dyn TokenSource>>,
    dialog: Option<Arc<dyn ConfirmationDialog>>,
    renderer: Option<Arc<dyn ConsoleRenderer>>,
    toasts: Option<Arc<dyn ToastSurface>>,
}

impl ConsoleBuilder {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            session: None,
            remote: None,
            tokens: None,
            dialog: None,
            renderer: None,
            toasts: None,
        }
    }

    /// Share session flags with another console
    pub fn with_session(mut self, session: Arc<SessionState>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteChannel>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_dialog(mut self, dialog: Arc<dyn ConfirmationDialog>) -> Self {
        self.dialog = Some(dialog);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ConsoleRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_toasts(mut self, toasts: Arc<dyn ToastSurface>) -> Self {
        self.toasts = Some(toasts);
        self
    }

    /// Validate the configuration and wire the console together
    pub fn build(self) -> Result<RecoveryConsole, AppError> {
        self.config.validate()?;

        let remote = self
            .remote
            .ok_or_else(|| AppError::config("Remote channel required"))?;
        let tokens = self
            .tokens
            .ok_or_else(|| AppError::config("Token source required"))?;
        let dialog = self
            .dialog
            .ok_or_else(|| AppError::config("Confirmation dialog required"))?;
        let renderer = self
            .renderer
            .ok_or_else(|| AppError::config("Renderer required"))?;
        let toasts = self
            .toasts
            .ok_or_else(|| AppError::config("Toast surface required"))?;

        let controls = Arc::new(ControlPanel::new());
        let queue = Arc::new(MessageQueue::from_config(&self.config));
        let gate = ActionGate::new(
            Arc::clone(&controls),
            dialog,
            Arc::clone(&queue),
            Arc::clone(&renderer),
        );

        tracing::debug!(base_url = %self.config.base_url, "recovery console ready");
        Ok(RecoveryConsole {
            session: self.session.unwrap_or_default(),
            config: self.config,
            controls,
            history: Arc::new(Mutex::new(HistoryWindow::new())),
            queue,
            gate,
            remote,
            tokens,
            renderer,
            toasts,
        })
    }
}
