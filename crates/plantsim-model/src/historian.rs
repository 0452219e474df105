//! Historian sink and the bounded in-memory ring buffer implementation.
//!
//! The address space calls [`Historian::record`] after every successful
//! mutation of a historized variable. Retention is the historian's concern:
//! [`RingHistorian`] keeps the newest `capacity` samples per variable and
//! evicts the oldest first.

use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use plantsim_types::{HistoricalRecord, NodeId, Value};

/// Receiver of value-changed notifications.
pub trait Historian: Send + Sync {
    /// Record that `node` took `value` at `timestamp`.
    fn record(&self, node: &NodeId, timestamp: DateTime<Utc>, value: &Value);
}

/// Historian that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistorian;

impl Historian for NullHistorian {
    fn record(&self, _node: &NodeId, _timestamp: DateTime<Utc>, _value: &Value) {}
}

/// Bounded per-variable ring buffer.
#[derive(Debug)]
pub struct RingHistorian {
    /// Maximum samples kept per variable.
    capacity: NonZeroUsize,
    /// Samples keyed by variable, oldest at the front.
    series: Mutex<BTreeMap<NodeId, VecDeque<HistoricalRecord>>>,
}

impl RingHistorian {
    /// Create a historian keeping at most `capacity` samples per variable.
    pub const fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            series: Mutex::new(BTreeMap::new()),
        }
    }

    /// Configured per-variable capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Samples recorded for `node`, oldest first.
    pub fn history(&self, node: &NodeId) -> Vec<HistoricalRecord> {
        self.series
            .lock()
            .get(node)
            .map(|samples| samples.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Historian for RingHistorian {
    fn record(&self, node: &NodeId, timestamp: DateTime<Utc>, value: &Value) {
        let mut series = self.series.lock();
        let samples = series
            .entry(node.clone())
            .or_default();
        while samples.len() >= self.capacity.get() {
            samples.pop_front();
        }
        samples.push_back(HistoricalRecord {
            timestamp,
            value: value.clone(),
        });
    }
}
