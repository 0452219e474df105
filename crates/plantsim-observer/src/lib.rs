//! Observer API server for the plantsim engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/events`) streaming every event the
//!   engine delivers via [`tokio::sync::broadcast`]
//! - **REST endpoints** for reading and writing variables, historian
//!   records, the recent event log, and condition/alarm state
//! - **Operator REST endpoints** for runtime control (status, pause,
//!   resume, stop, node enable/disable)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The engine has no event storage. A [`JournalSubscriber`] registered
//! with the engine's notifier appends every event to a bounded
//! [`EventJournal`] and forwards it to `WebSocket` clients; condition and
//! alarm state is derived from those events. Variable reads and writes go
//! straight to the shared address space, writes through its permission
//! gate.
//!
//! [`JournalSubscriber`]: journal::JournalSubscriber
//! [`EventJournal`]: journal::EventJournal

pub mod error;
pub mod handlers;
pub mod journal;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use journal::{EventJournal, JournalSubscriber};
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::AppState;
