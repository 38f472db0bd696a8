//! Event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the fan-out hub for [`StudioEvent`]s. It is shared
//! via `Arc<EventBus>` across the store, the reconciler, and whatever
//! front end is listening.

use serde::Serialize;
use tokio::sync::broadcast;

/// A notification about the local job list.
///
/// `JobsChanged` is the generic render signal: the list mutated and any
/// view of it should be redrawn. The transition variants are distinct
/// from it so a front end can notify on completion or failure without
/// diffing the list itself.
#[derive(Debug, Clone, Serialize)]
pub enum StudioEvent {
    /// The job list changed (insert, merge, removal, or re-sort).
    JobsChanged,

    /// A job's status transitioned into `completed`.
    JobCompleted { id: String },

    /// A job's status transitioned into `failed`.
    JobFailed {
        id: String,
        /// Failure message reported by the remote system, if any.
        message: Option<String>,
    },
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus for [`StudioEvent`]s.
///
/// Any number of subscribers independently receive every published
/// event. Slow receivers that fall more than the buffer capacity
/// behind observe `RecvError::Lagged` and skip ahead.
pub struct EventBus {
    sender: broadcast::Sender<StudioEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped; publishing
    /// is never an error.
    pub fn publish(&self, event: StudioEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.sender.subscribe()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
