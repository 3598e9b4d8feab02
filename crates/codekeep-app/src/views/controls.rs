//! # Control View State
//!
//! Interactivity, busy indicators and per-workflow phase for every console
//! control. The panel is the single-flight lock for the action gate: a
//! control that is not interactive drops new triggers.

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::ActionId;

/// Where a workflow currently is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Confirming,
    InFlight,
    Rendered,
    Failed,
}

/// Display state of one control
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Accepts user interaction
    pub interactive: bool,
    /// Has an arbitration in progress
    pub busy: bool,
    /// Not shown at all
    pub hidden: bool,
    /// Set once a single-use action has succeeded for the current batch
    pub done_label: Option<String>,
    pub phase: WorkflowPhase,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            interactive: true,
            busy: false,
            hidden: false,
            done_label: None,
            phase: WorkflowPhase::Idle,
        }
    }
}

impl ControlState {
    pub fn is_completed(&self) -> bool {
        self.done_label.is_some()
    }
}

#[derive(Debug)]
struct PanelInner {
    controls: IndexMap<ActionId, ControlState>,
    indicators: IndexSet<String>,
}

/// Shared state of all console controls
#[derive(Debug)]
pub struct ControlPanel {
    inner: Mutex<PanelInner>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        let controls = ActionId::ALL
            .into_iter()
            .map(|action| (action, ControlState::default()))
            .collect();
        Self {
            inner: Mutex::new(PanelInner {
                controls,
                indicators: IndexSet::new(),
            }),
        }
    }

    /// Claim a control for one arbitration.
    ///
    /// Returns false (and changes nothing) when the control is already
    /// non-interactive, hidden or completed.
    pub fn try_begin(&self, action: ActionId, indicator: &str) -> bool {
        let mut inner = self.inner.lock();
        let state = inner.controls.entry(action).or_default();
        if !state.interactive || state.hidden || state.is_completed() {
            return false;
        }
        state.interactive = false;
        state.busy = true;
        state.phase = WorkflowPhase::Confirming;
        inner.indicators.insert(indicator.to_string());
        true
    }

    /// Release a control claimed by [`try_begin`](Self::try_begin).
    ///
    /// A completed control stays non-interactive.
    pub fn finish(&self, action: ActionId, indicator: &str) {
        let mut inner = self.inner.lock();
        let state = inner.controls.entry(action).or_default();
        state.busy = false;
        state.interactive = !state.is_completed();
        if matches!(state.phase, WorkflowPhase::Confirming | WorkflowPhase::InFlight) {
            state.phase = WorkflowPhase::Idle;
        }
        inner.indicators.shift_remove(indicator);
    }

    pub fn set_phase(&self, action: ActionId, phase: WorkflowPhase) {
        self.inner.lock().controls.entry(action).or_default().phase = phase;
    }

    /// Put a control into its terminal "already done" state
    pub fn mark_completed(&self, action: ActionId, label: impl Into<String>) {
        let mut inner = self.inner.lock();
        let state = inner.controls.entry(action).or_default();
        state.done_label = Some(label.into());
        state.interactive = false;
    }

    /// Clear a completed state so the control can be used again
    pub fn reset(&self, action: ActionId) {
        let mut inner = self.inner.lock();
        let state = inner.controls.entry(action).or_default();
        state.done_label = None;
        state.interactive = !state.busy;
    }

    pub fn set_hidden(&self, action: ActionId, hidden: bool) {
        self.inner.lock().controls.entry(action).or_default().hidden = hidden;
    }

    pub fn state(&self, action: ActionId) -> ControlState {
        self.inner
            .lock()
            .controls
            .get(&action)
            .cloned()
            .unwrap_or_default()
    }

    pub fn phase(&self, action: ActionId) -> WorkflowPhase {
        self.state(action).phase
    }

    pub fn is_interactive(&self, action: ActionId) -> bool {
        self.state(action).interactive
    }

    pub fn indicator_visible(&self, indicator: &str) -> bool {
        self.inner.lock().indicators.contains(indicator)
    }

    /// Copy of every control's state, in control-table order
    pub fn snapshot(&self) -> Vec<(ActionId, ControlState)> {
        self.inner
            .lock()
            .controls
            .iter()
            .map(|(action, state)| (*action, state.clone()))
            .collect()
    }
}
