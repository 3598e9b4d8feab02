//! # Message Queue
//!
//! FIFO of short-lived notifications drained into a single toast slot.
//! Operation outcomes and push notifications share the same queue, so the
//! user never sees two toasts at once and never loses one to a newer one.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::bridge::ToastSurface;
use crate::config::ConsoleConfig;
use crate::views::notifications::{QueuedToast, ToastId, ToastLevel};

/// Resets the drain flag when a drain ends, including by cancellation.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sequential notification queue
#[derive(Debug)]
pub struct MessageQueue {
    pending: Mutex<VecDeque<QueuedToast>>,
    next_id: AtomicU64,
    draining: AtomicBool,
    display: Duration,
    stagger: Duration,
    max_pending: usize,
}

impl MessageQueue {
    /// Create a queue with explicit timings.
    ///
    /// `max_pending` of zero means unbounded.
    pub fn new(display: Duration, stagger: Duration, max_pending: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            draining: AtomicBool::new(false),
            display,
            stagger,
            max_pending,
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(
            Duration::from_millis(config.toast_display_ms),
            Duration::from_millis(config.toast_stagger_ms),
            config.max_pending_toasts,
        )
    }

    /// Append a message. Drops the oldest pending message when full.
    pub fn enqueue(&self, message: impl Into<String>, level: ToastLevel) -> ToastId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = QueuedToast::new(id, message, level);

        let mut pending = self.pending.lock();
        if self.max_pending > 0 && pending.len() >= self.max_pending {
            if let Some(dropped) = pending.pop_front() {
                tracing::warn!(toast = dropped.id, "message queue full, dropping oldest toast");
            }
        }
        pending.push_back(toast);
        id
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.enqueue(message, ToastLevel::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.enqueue(message, ToastLevel::Success)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.enqueue(message, ToastLevel::Warning)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.enqueue(message, ToastLevel::Error)
    }

    fn pop(&self) -> Option<QueuedToast> {
        self.pending.lock().pop_front()
    }

    /// Copy of the pending messages, head first
    pub fn pending(&self) -> Vec<QueuedToast> {
        self.pending.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Show every pending message in order, one at a time.
    ///
    /// Returns the number of messages this call displayed. A call made while
    /// another drain is running returns 0 immediately; the running drain
    /// picks up anything enqueued in the meantime.
    pub async fn drain(&self, surface: &dyn ToastSurface) -> usize {
        let mut shown = 0;
        loop {
            if self.draining.swap(true, Ordering::AcqRel) {
                return shown;
            }
            {
                let _guard = DrainGuard(&self.draining);
                while let Some(toast) = self.pop() {
                    surface.show(&toast);
                    tokio::time::sleep(self.display).await;
                    surface.hide(&toast);
                    shown += 1;
                    tokio::time::sleep(self.stagger).await;
                }
            }
            // A message may land between the last pop and the flag reset
            if self.is_empty() {
                return shown;
            }
        }
    }
}
