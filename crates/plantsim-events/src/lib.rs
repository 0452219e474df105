//! Event notification for the plantsim engine.
//!
//! Events are transient: a simulator builds one on its tick, hands it to the
//! [`EventNotifier`], and the notifier relays it synchronously to every
//! registered [`Subscriber`]. Nothing is persisted here. A subscriber that
//! errors or panics is logged and skipped; delivery to the rest continues.
//!
//! # Modules
//!
//! - [`error`] -- [`DeliveryError`] for per-subscriber failures.
//! - [`notifier`] -- The [`Subscriber`] trait and the [`EventNotifier`] relay.
//! - [`sinks`] -- Broadcast, mpsc, and log subscribers.

pub mod error;
pub mod notifier;
pub mod sinks;

pub use error::DeliveryError;
pub use notifier::{DeliveryReport, EventNotifier, Subscriber};
pub use sinks::{BroadcastSubscriber, ChannelSubscriber, LogSubscriber};
