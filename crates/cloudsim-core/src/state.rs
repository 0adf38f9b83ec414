use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::component::Id;
use crate::error::ScheduleError;
use crate::event::{Event, EventData, EventId};
use crate::log::log_incorrect_event;
use crate::queue::EventQueue;

/// Epsilon to compare floating point values for equality.
pub const EPSILON: f64 = 1e-12;

pub struct SimulationState {
    clock: f64,
    rand: Pcg64,
    queue: EventQueue,
    next_event_id: EventId,
    stop_requested: bool,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.0,
            rand: Pcg64::seed_from_u64(seed),
            queue: EventQueue::default(),
            next_event_id: 0,
            stop_requested: false,
        }
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn rand(&mut self) -> f64 {
        self.rand.gen_range(0.0..1.0)
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rand.gen_range(range)
    }

    /// Puts an event with relative delay into the queue.
    ///
    /// A rejected event consumes an id but is only logged.
    pub fn add_event<T>(&mut self, data: T, src: Id, dst: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        let check = if !delay.is_finite() {
            Err(ScheduleError::NotFinite(delay))
        } else if delay < -EPSILON {
            Err(ScheduleError::NegativeDelay(delay))
        } else {
            Ok(self.clock + delay.max(0.))
        };
        let time = *check.as_ref().unwrap_or(&self.clock);
        let event = self.make_event(data, src, dst, time);
        let event_id = event.id;
        match check {
            Ok(_) => self.queue.push(event),
            Err(e) => log_incorrect_event(event, &e.to_string()),
        }
        event_id
    }

    /// Puts an event with absolute time into the queue.
    ///
    /// Unlike [`add_event`](Self::add_event), a rejected event does not consume an id.
    pub fn add_event_at<T>(&mut self, data: T, src: Id, dst: Id, time: f64) -> Result<EventId, ScheduleError>
    where
        T: EventData,
    {
        if !time.is_finite() {
            return Err(ScheduleError::NotFinite(time));
        }
        if time < self.clock - EPSILON {
            return Err(ScheduleError::InPast { time, now: self.clock });
        }
        let event = self.make_event(data, src, dst, time.max(self.clock));
        let event_id = event.id;
        self.queue.push(event);
        Ok(event_id)
    }

    fn make_event<T>(&mut self, data: T, src: Id, dst: Id, time: f64) -> Event
    where
        T: EventData,
    {
        let id = self.next_event_id;
        self.next_event_id += 1;
        Event {
            id,
            time,
            src,
            dst,
            data: Box::new(data),
        }
    }

    /// Removes the earliest event from the queue and moves the clock to its time.
    pub fn next_event(&mut self) -> Option<Event> {
        let event = self.queue.pop()?;
        self.clock = event.time;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.queue.peek_time()
    }

    pub fn cancel_event(&mut self, id: EventId) -> bool {
        self.queue.remove(id)
    }

    pub fn cancel_events<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        self.queue.remove_matching(pred)
    }

    pub fn pending_event_count(&self) -> usize {
        self.queue.len()
    }

    pub fn event_count(&self) -> u64 {
        self.next_event_id
    }

    pub fn dump_events(&self) -> Vec<Event> {
        self.queue.iter().cloned().collect()
    }

    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn clear_stop(&mut self) {
        self.stop_requested = false;
    }
}
