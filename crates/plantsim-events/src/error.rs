//! Error type for event delivery.

use plantsim_types::SubscriberId;

/// A single subscriber failed to accept an event.
///
/// Delivery failures are isolated per subscriber: the notifier logs them and
/// moves on to the next subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The subscriber's bounded queue is full; the event was dropped.
    #[error("subscriber queue full")]
    QueueFull,

    /// The receiving side of the subscriber's channel is gone.
    #[error("subscriber channel closed")]
    Closed,

    /// The subscriber panicked while handling the event.
    #[error("subscriber {id} panicked: {message}")]
    Panicked {
        /// Subscriber that panicked.
        id: SubscriberId,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// Subscriber-specific failure.
    #[error("delivery rejected: {0}")]
    Rejected(String),
}
