//! Ready-made [`Subscriber`] implementations.
//!
//! All of them are non-blocking: channel sinks use `try_send`/`send` on
//! tokio channels and never await.

use plantsim_types::Event;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::error::DeliveryError;
use crate::notifier::Subscriber;

/// Fans events out to any number of broadcast receivers.
///
/// Having no receivers is not a failure; the event is simply dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSubscriber {
    sender: broadcast::Sender<Event>,
}

impl BroadcastSubscriber {
    /// Wrap an existing broadcast sender.
    pub const fn new(sender: broadcast::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Open a new receiver on the underlying channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Subscriber for BroadcastSubscriber {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}

/// Forwards events into a bounded mpsc queue.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    sender: mpsc::Sender<Event>,
}

impl ChannelSubscriber {
    /// Wrap an existing mpsc sender.
    pub const fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Writes every event to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        info!(
            event_id = %event.id,
            source = %event.source,
            severity = event.severity,
            retain = event.retain,
            new_state = event.new_state,
            message = %event.message,
            "Event raised"
        );
        Ok(())
    }
}
