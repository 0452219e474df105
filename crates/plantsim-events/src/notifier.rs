//! The subscriber seam and the relay that fans events out to it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use plantsim_types::{Event, SubscriberId};
use tracing::{debug, warn};

use crate::error::DeliveryError;

/// Receiver of raised events.
///
/// `deliver` is called from inside a simulation tick and must not block:
/// hand the event to a channel or log it, never wait on I/O.
pub trait Subscriber: Send + Sync {
    /// Accept one event.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the subscriber could not take the
    /// event. The notifier logs it and continues with the next subscriber.
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError>;
}

/// Outcome of one [`EventNotifier::notify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers that accepted the event.
    pub delivered: usize,
    /// Subscribers that returned an error or panicked.
    pub failed: usize,
}

/// Stateless relay from simulators to subscribers.
#[derive(Default)]
pub struct EventNotifier {
    subscribers: RwLock<Vec<(SubscriberId, Arc<dyn Subscriber>)>>,
}

impl core::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

impl EventNotifier {
    /// Create a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and return its id.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        self.subscribers.write().push((id, subscriber));
        debug!(subscriber = %id, "Subscriber registered");
        id
    }

    /// Remove a subscriber. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        before != subscribers.len()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver `event` to every subscriber, in registration order.
    ///
    /// Never fails and never panics on behalf of a subscriber.
    pub fn notify(&self, event: &Event) -> DeliveryReport {
        // Snapshot so a subscriber may (un)subscribe without deadlocking.
        let subscribers: Vec<(SubscriberId, Arc<dyn Subscriber>)> =
            self.subscribers.read().clone();

        let mut report = DeliveryReport::default();
        for (id, subscriber) in &subscribers {
            match deliver_isolated(*id, subscriber.as_ref(), event) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(e) => {
                    report.failed = report.failed.saturating_add(1);
                    warn!(
                        subscriber = %id,
                        source = %event.source,
                        error = %e,
                        "Event delivery failed"
                    );
                }
            }
        }
        report
    }
}

fn deliver_isolated(
    id: SubscriberId,
    subscriber: &dyn Subscriber,
    event: &Event,
) -> Result<(), DeliveryError> {
    match catch_unwind(AssertUnwindSafe(|| subscriber.deliver(event))) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_owned()
            };
            Err(DeliveryError::Panicked { id, message })
        }
    }
}
