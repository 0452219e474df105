//! Bounded log of delivered events plus the condition and alarm state they
//! imply.
//!
//! The engine keeps no event storage of its own. [`JournalSubscriber`] is
//! registered with the engine's notifier, appends every event to the
//! [`EventJournal`], and forwards it to connected `WebSocket` clients.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use plantsim_events::{BroadcastSubscriber, DeliveryError, Subscriber};
use plantsim_types::{AlarmSnapshot, ConditionSnapshot, Event, EventDetail, NodeId};
use tokio::sync::broadcast;

/// Default number of events kept in the journal.
pub const DEFAULT_EVENT_LOG_SIZE: usize = 500;

#[derive(Debug, Default)]
struct Inner {
    events: VecDeque<Event>,
    conditions: BTreeMap<NodeId, ConditionSnapshot>,
    alarms: BTreeMap<NodeId, AlarmSnapshot>,
}

/// Recently delivered events, newest first, and the latest condition and
/// alarm state derived from them.
#[derive(Debug)]
pub struct EventJournal {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_SIZE)
    }
}

impl EventJournal {
    /// Create a journal keeping at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Maximum number of events kept.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `event` and fold it into the condition/alarm state.
    pub fn record(&self, event: &Event) {
        let mut inner = self.inner.write();
        match &event.detail {
            EventDetail::Condition { state } => {
                inner.conditions.insert(
                    event.source.clone(),
                    ConditionSnapshot {
                        node_id: event.source.clone(),
                        state: *state,
                        severity: event.severity,
                        message: event.message.clone(),
                        retain: event.retain,
                        time: event.time,
                    },
                );
            }
            EventDetail::LimitAlarm {
                band, input_node, ..
            } => {
                inner.alarms.insert(
                    event.source.clone(),
                    AlarmSnapshot {
                        node_id: event.source.clone(),
                        input: input_node.clone(),
                        band: *band,
                        active: band.is_active(),
                        retain: event.retain,
                        severity: event.severity,
                        time: event.time,
                    },
                );
            }
            EventDetail::Simulation => {}
        }

        if self.capacity == 0 {
            return;
        }
        while inner.events.len() >= self.capacity {
            inner.events.pop_back();
        }
        inner.events.push_front(event.clone());
    }

    /// Up to `limit` events, newest first, optionally only from `source`.
    pub fn events(&self, source: Option<&NodeId>, limit: usize) -> Vec<Event> {
        self.inner
            .read()
            .events
            .iter()
            .filter(|e| source.is_none_or(|s| e.source == *s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.inner.read().events.len()
    }

    /// Whether no event has been recorded (or the journal keeps none).
    pub fn is_empty(&self) -> bool {
        self.inner.read().events.is_empty()
    }

    /// Latest state of every condition that has raised an event.
    pub fn conditions(&self) -> Vec<ConditionSnapshot> {
        self.inner.read().conditions.values().cloned().collect()
    }

    /// Latest state of every alarm that has raised an event.
    pub fn alarms(&self) -> Vec<AlarmSnapshot> {
        self.inner.read().alarms.values().cloned().collect()
    }
}

/// Notifier subscriber feeding the journal and the live event stream.
#[derive(Debug, Clone)]
pub struct JournalSubscriber {
    journal: Arc<EventJournal>,
    live: BroadcastSubscriber,
}

impl JournalSubscriber {
    /// Feed `journal` and forward every event on `tx`.
    pub const fn new(journal: Arc<EventJournal>, tx: broadcast::Sender<Event>) -> Self {
        Self {
            journal,
            live: BroadcastSubscriber::new(tx),
        }
    }
}

impl Subscriber for JournalSubscriber {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        self.journal.record(event);
        self.live.deliver(event)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use plantsim_types::{ConditionState, EventId, LimitBand};

    use super::*;

    fn event(source: &str, detail: EventDetail) -> Event {
        Event {
            id: EventId::new(),
            source: NodeId::new(source),
            source_name: source.to_owned(),
            severity: 500,
            message: "msg".to_owned(),
            retain: true,
            new_state: true,
            time: Utc::now(),
            detail,
        }
    }

    #[test]
    fn keeps_newest_events_up_to_capacity() {
        let journal = EventJournal::new(2);
        for _ in 0..3 {
            journal.record(&event("Demo.EventNotifier", EventDetail::Simulation));
        }
        let last = event("Demo.Condition", EventDetail::Simulation);
        journal.record(&last);

        assert_eq!(journal.len(), 2);
        let events = journal.events(None, 10);
        assert_eq!(events.first().unwrap().id, last.id);
    }

    #[test]
    fn zero_capacity_keeps_state_but_no_log() {
        let journal = EventJournal::new(0);
        journal.record(&event(
            "Demo.Condition",
            EventDetail::Condition {
                state: ConditionState::Bad,
            },
        ));
        assert!(journal.is_empty());
        assert_eq!(journal.conditions().len(), 1);
    }

    #[test]
    fn filters_by_source_and_limit() {
        let journal = EventJournal::new(10);
        journal.record(&event("A", EventDetail::Simulation));
        journal.record(&event("B", EventDetail::Simulation));
        journal.record(&event("A", EventDetail::Simulation));

        assert_eq!(journal.events(Some(&NodeId::new("A")), 10).len(), 2);
        assert_eq!(journal.events(None, 1).len(), 1);
    }

    #[test]
    fn derives_alarm_and_condition_state() {
        let journal = EventJournal::default();
        journal.record(&event(
            "Demo.Condition",
            EventDetail::Condition {
                state: ConditionState::Bad,
            },
        ));
        journal.record(&event(
            "Demo.LevelAlarm",
            EventDetail::LimitAlarm {
                band: LimitBand::HighHigh,
                previous: Some(LimitBand::High),
                input: 55.0,
                input_node: NodeId::new("Demo.Ramp"),
            },
        ));

        let conditions = journal.conditions();
        assert_eq!(conditions.first().unwrap().state, ConditionState::Bad);

        let alarms = journal.alarms();
        let alarm = alarms.first().unwrap();
        assert_eq!(alarm.band, LimitBand::HighHigh);
        assert!(alarm.active);
        assert_eq!(alarm.input, NodeId::new("Demo.Ramp"));
    }

    #[tokio::test]
    async fn subscriber_records_and_forwards() {
        let journal = Arc::new(EventJournal::default());
        let (tx, mut rx) = broadcast::channel(4);
        let subscriber = JournalSubscriber::new(Arc::clone(&journal), tx);

        let ev = event("Demo.EventNotifier", EventDetail::Simulation);
        subscriber.deliver(&ev).unwrap();

        assert_eq!(journal.len(), 1);
        assert_eq!(rx.recv().await.unwrap().id, ev.id);
    }

    #[test]
    fn subscriber_without_receivers_still_succeeds() {
        let journal = Arc::new(EventJournal::default());
        let (tx, _) = broadcast::channel(4);
        let subscriber = JournalSubscriber::new(journal, tx);
        assert!(
            subscriber
                .deliver(&event("X", EventDetail::Simulation))
                .is_ok()
        );
    }
}
