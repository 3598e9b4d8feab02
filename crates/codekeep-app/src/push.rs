//! # Push Feed
//!
//! Pumps server-pushed notification text into the shared message queue.
//! The source is any `Stream<Item = String>`; the `http` feature provides a
//! server-sent-events stream.

use futures::{Stream, StreamExt};
use std::sync::Arc;

use crate::bridge::ToastSurface;
use crate::queue::MessageQueue;
use crate::views::notifications::ToastLevel;

/// Forwards push messages into a [`MessageQueue`]
#[derive(Debug, Clone)]
pub struct PushFeed {
    queue: Arc<MessageQueue>,
}

impl PushFeed {
    pub fn new(queue: Arc<MessageQueue>) -> Self {
        Self { queue }
    }

    /// Consume `stream` until it ends, draining after each message.
    ///
    /// Blank messages are skipped. Returns the number of messages queued.
    pub async fn pump<S>(&self, stream: S, surface: &dyn ToastSurface) -> usize
    where
        S: Stream<Item = String> + Send,
    {
        futures::pin_mut!(stream);
        let mut queued = 0;
        while let Some(message) = stream.next().await {
            let message = message.trim();
            if message.is_empty() {
                continue;
            }
            tracing::debug!(%message, "push notification received");
            self.queue.enqueue(message, ToastLevel::Info);
            queued += 1;
            self.queue.drain(surface).await;
        }
        tracing::info!(queued, "push feed ended");
        queued
    }
}
