//! Pending event queue.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::event::{Event, EventId};

/// Position of an event in the queue: firing time, then creation order.
#[derive(Clone, Copy, Debug)]
struct EventKey {
    time: f64,
    id: EventId,
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EventKey {}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.total_cmp(&other.time).then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Events ordered by `(time, id)`.
///
/// Canceled events are removed immediately, so everything in the queue will be delivered.
#[derive(Default)]
pub(crate) struct EventQueue {
    events: BTreeMap<EventKey, Event>,
    times: HashMap<EventId, f64>,
}

impl EventQueue {
    pub fn push(&mut self, event: Event) {
        self.times.insert(event.id, event.time);
        self.events.insert(
            EventKey {
                time: event.time,
                id: event.id,
            },
            event,
        );
    }

    pub fn pop(&mut self) -> Option<Event> {
        let (_, event) = self.events.pop_first()?;
        self.times.remove(&event.id);
        Some(event)
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.events.first_key_value().map(|(key, _)| key.time)
    }

    /// Removes the event, returns `false` if it is not pending.
    pub fn remove(&mut self, id: EventId) -> bool {
        match self.times.remove(&id) {
            Some(time) => self.events.remove(&EventKey { time, id }).is_some(),
            None => false,
        }
    }

    pub fn remove_matching<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        let keys: Vec<EventKey> = self
            .events
            .iter()
            .filter(|(_, event)| pred(event))
            .map(|(key, _)| *key)
            .collect();
        for key in keys.iter() {
            self.events.remove(key);
            self.times.remove(&key.id);
        }
        keys.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }
}
