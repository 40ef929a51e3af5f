//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`JobEvent`]s. It is
//! shared via `Arc<EventBus>` between the supervisor (the only publisher)
//! and any number of observers: a live front-end, the job log, tests.

use tokio::sync::broadcast;

use crate::event::JobEvent;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use csvtx_events::{EventBus, JobEvent, JobEventKind};
///
/// let bus = EventBus::default();
/// let subscription = bus.subscribe();
///
/// bus.publish(JobEvent::new(1, JobEventKind::Completed));
/// subscription.unsubscribe();
/// ```
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// for slow subscribers, which observe the gap as a lag.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: JobEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// One observer's view of the bus.
///
/// Dropping the subscription, or calling [`unsubscribe`](Self::unsubscribe),
/// detaches it.
pub struct Subscription {
    receiver: broadcast::Receiver<JobEvent>,
}

impl Subscription {
    /// Wait for the next event.
    ///
    /// Skips over a lag (logging how many events were lost) and returns
    /// `None` once the bus has been dropped.
    pub async fn next(&mut self) -> Option<JobEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged, some events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Return an already-buffered event without waiting.
    pub fn try_next(&mut self) -> Option<JobEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged, some events were dropped");
                }
                Err(_) => return None,
            }
        }
    }

    /// Detach from the bus.
    pub fn unsubscribe(self) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
