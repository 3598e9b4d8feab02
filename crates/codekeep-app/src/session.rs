//! # Session State
//!
//! In-flight flags for the current console session. The orchestrator writes
//! them; the navigation guard reads them. Concurrent workflows on different
//! controls share the flags with last-write-wins semantics.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::ActionId;

/// Flags describing long-running work in this session
#[derive(Debug, Default)]
pub struct SessionState {
    generating: AtomicBool,
    verifying: AtomicBool,
    setup_verified: AtomicBool,
    /// Bumped on every generation start so a stale grace timer cannot clear
    /// a newer generation's flag.
    generation_epoch: AtomicU64,
    pending_action: Mutex<Option<ActionId>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_code_generation(&self, active: bool) {
        if active {
            self.generation_epoch.fetch_add(1, Ordering::SeqCst);
        }
        self.generating.store(active, Ordering::SeqCst);
    }

    pub fn is_code_being_generated(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    /// Clear the generation flag after `grace`, unless another generation
    /// has started in the meantime.
    pub fn clear_generation_after(self: &Arc<Self>, grace: Duration) {
        let epoch = self.generation_epoch.load(Ordering::SeqCst);
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if session.generation_epoch.load(Ordering::SeqCst) == epoch {
                session.generating.store(false, Ordering::SeqCst);
                tracing::debug!("generation grace period elapsed");
            }
        });
    }

    pub fn set_verification(&self, active: bool) {
        self.verifying.store(active, Ordering::SeqCst);
    }

    pub fn is_verification_in_progress(&self) -> bool {
        self.verifying.load(Ordering::SeqCst)
    }

    /// Record that setup verification passed for this session
    pub fn mark_setup_verified(&self) {
        self.setup_verified.store(true, Ordering::SeqCst);
    }

    pub fn is_setup_verified(&self) -> bool {
        self.setup_verified.load(Ordering::SeqCst)
    }

    pub fn set_pending_action(&self, action: Option<ActionId>) {
        *self.pending_action.lock() = action;
    }

    pub fn pending_action(&self) -> Option<ActionId> {
        *self.pending_action.lock()
    }

    /// True while leaving the page would abandon in-flight work
    pub fn should_block_navigation(&self) -> bool {
        self.is_code_being_generated() || self.is_verification_in_progress()
    }
}

/// Read-only view of the session used by hosts to veto navigation.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    session: Arc<SessionState>,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionState>) -> Self {
        Self { session }
    }

    /// Whether the host should stop navigation and ask the user first
    pub fn should_block(&self) -> bool {
        self.session.should_block_navigation()
    }

    /// Prompt text for hosts that show their own confirmation
    pub fn prompt(&self) -> Option<&'static str> {
        self.should_block()
            .then_some("Work is still in progress. Are you sure you want to leave?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_follows_flags() {
        let session = Arc::new(SessionState::new());
        let guard = NavigationGuard::new(Arc::clone(&session));
        assert!(!guard.should_block());
        assert!(guard.prompt().is_none());

        session.set_code_generation(true);
        assert!(guard.should_block());

        session.set_code_generation(false);
        session.set_verification(true);
        assert!(guard.should_block());
        assert!(guard.prompt().is_some());

        session.set_verification(false);
        assert!(!guard.should_block());
    }

    #[test]
    fn test_pending_action_round_trip() {
        let session = SessionState::new();
        session.set_pending_action(Some(ActionId::Regenerate));
        assert_eq!(session.pending_action(), Some(ActionId::Regenerate));
        session.set_pending_action(None);
        assert_eq!(session.pending_action(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_period_clears_generation() {
        let session = Arc::new(SessionState::new());
        session.set_code_generation(true);
        session.clear_generation_after(Duration::from_millis(5000));

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(session.is_code_being_generated());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!session.is_code_being_generated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_grace_timer_keeps_newer_generation() {
        let session = Arc::new(SessionState::new());
        session.set_code_generation(true);
        session.clear_generation_after(Duration::from_millis(5000));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        session.set_code_generation(true);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(session.is_code_being_generated());
    }
}
