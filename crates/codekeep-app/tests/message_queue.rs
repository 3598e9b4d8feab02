#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! # Message Queue Integration Tests
//!
//! FIFO display with at most one toast on screen, concurrent drains and
//! push notifications sharing the queue with operation outcomes.

use futures::stream;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use codekeep_app::push::PushFeed;
use codekeep_app::{MessageQueue, ToastLevel};
use codekeep_testkit::{RecordingToastSurface, ToastEvent};

fn queue() -> Arc<MessageQueue> {
    Arc::new(MessageQueue::new(
        Duration::from_millis(3000),
        Duration::from_millis(500),
        0,
    ))
}

#[tokio::test(start_paused = true)]
async fn test_messages_show_in_order_one_at_a_time() {
    let queue = queue();
    let surface = RecordingToastSurface::new();
    queue.info("first");
    queue.error("second");
    queue.success("third");

    let shown = queue.drain(surface.as_ref()).await;

    assert_eq!(shown, 3);
    assert_eq!(surface.shown(), vec!["first", "second", "third"]);
    assert_eq!(surface.max_visible(), 1);
    assert!(queue.is_empty());

    let events = surface.events();
    assert!(matches!(&events[0], ToastEvent::Shown(t) if t.message == "first"));
    assert!(matches!(&events[1], ToastEvent::Hidden(t) if t.message == "first"));
    assert!(matches!(&events[3], ToastEvent::Hidden(t) if t.level == ToastLevel::Error));
}

#[tokio::test(start_paused = true)]
async fn test_each_toast_stays_for_the_display_duration() {
    let queue = queue();
    let surface = RecordingToastSurface::new();
    queue.info("a");
    queue.info("b");

    let started = tokio::time::Instant::now();
    queue.drain(surface.as_ref()).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2 * (3000 + 500)));
    assert!(elapsed < Duration::from_millis(2 * (3000 + 500) + 50));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_drain_returns_immediately() {
    let queue = queue();
    let surface = RecordingToastSurface::new();
    queue.info("one");
    queue.info("two");

    let (first, second) = tokio::join!(
        queue.drain(surface.as_ref()),
        queue.drain(surface.as_ref())
    );

    assert_eq!(first + second, 2);
    assert_eq!(surface.shown(), vec!["one", "two"]);
    assert_eq!(surface.max_visible(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_message_enqueued_mid_drain_is_picked_up() {
    let queue = queue();
    let surface = RecordingToastSurface::new();
    queue.info("early");

    let (shown, ()) = tokio::join!(queue.drain(surface.as_ref()), async {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        queue.warning("late");
    });

    assert_eq!(shown, 2);
    assert_eq!(surface.shown(), vec!["early", "late"]);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_queue_drops_oldest() {
    let queue = MessageQueue::new(Duration::from_millis(10), Duration::ZERO, 2);
    let surface = RecordingToastSurface::new();
    queue.info("dropped");
    queue.info("kept-1");
    queue.info("kept-2");

    queue.drain(surface.as_ref()).await;

    assert_eq!(surface.shown(), vec!["kept-1", "kept-2"]);
}

#[tokio::test(start_paused = true)]
async fn test_push_notifications_share_the_queue() {
    let queue = queue();
    let surface = RecordingToastSurface::new();
    queue.success("Your new recovery codes are ready");

    let feed = PushFeed::new(Arc::clone(&queue));
    let pushed = feed
        .pump(
            stream::iter(vec![
                "Your recovery codes were emailed".to_string(),
                "   ".to_string(),
            ]),
            surface.as_ref(),
        )
        .await;

    assert_eq!(pushed, 1);
    assert_eq!(
        surface.shown(),
        vec![
            "Your new recovery codes are ready",
            "Your recovery codes were emailed"
        ]
    );
    assert_eq!(surface.max_visible(), 1);
}

// ============================================================================
// Ordering Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Enqueue,
    Drain,
    Wait(u64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Enqueue),
        2 => Just(Step::Drain),
        2 => (0u64..80).prop_map(Step::Wait),
    ]
}

/// Run `steps` against a fresh queue, spawning each drain alongside the
/// enqueues, then flush whatever is left. Returns the enqueued messages.
fn run_interleaving(steps: &[Step], surface: &Arc<RecordingToastSurface>) -> Vec<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let queue = Arc::new(MessageQueue::new(
            Duration::from_millis(30),
            Duration::from_millis(5),
            0,
        ));
        let mut enqueued = Vec::new();
        let mut drains = Vec::new();

        for step in steps {
            match step {
                Step::Enqueue => {
                    let message = format!("message-{}", enqueued.len());
                    queue.info(message.as_str());
                    enqueued.push(message);
                }
                Step::Drain => {
                    let queue = Arc::clone(&queue);
                    let surface = Arc::clone(surface);
                    drains.push(tokio::spawn(async move {
                        queue.drain(surface.as_ref()).await
                    }));
                }
                Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
            }
        }

        for drain in drains {
            drain.await.unwrap();
        }
        queue.drain(surface.as_ref()).await;
        assert!(queue.is_empty());
        enqueued
    })
}

proptest! {
    #[test]
    fn prop_interleaved_drains_show_fifo_one_at_a_time(
        steps in prop::collection::vec(step(), 0..40),
    ) {
        let surface = RecordingToastSurface::new();

        let enqueued = run_interleaving(&steps, &surface);

        prop_assert_eq!(surface.shown(), enqueued);
        prop_assert!(surface.max_visible() <= 1);

        let events = surface.events();
        prop_assert_eq!(events.len() % 2, 0);
        for pair in events.chunks(2) {
            match pair {
                [ToastEvent::Shown(shown), ToastEvent::Hidden(hidden)] => {
                    prop_assert_eq!(shown.id, hidden.id);
                }
                other => prop_assert!(false, "toast shown before the previous one was hidden: {:?}", other),
            }
        }
    }
}
