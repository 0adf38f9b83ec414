use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::{cast, Event, EventHandler, Id, ScheduleError, Simulation, SimulationContext};

#[derive(Clone, Serialize)]
struct Message {
    id: u32,
}

#[derive(Clone, Serialize)]
struct Stop {}

#[derive(Clone, Serialize)]
struct Unknown {}

struct Recorder {
    received: Vec<(f64, u32)>,
    ctx: SimulationContext,
}

impl Recorder {
    fn new(ctx: SimulationContext) -> Self {
        Self {
            received: Vec::new(),
            ctx,
        }
    }
}

impl EventHandler for Recorder {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            Message { id } => {
                self.received.push((self.ctx.time(), id));
            }
            Stop {} => {
                self.ctx.stop_simulation();
            }
        })
    }
}

fn setup() -> (Simulation, Rc<RefCell<Recorder>>, Id, SimulationContext) {
    let mut sim = Simulation::new(123);
    let recorder = Rc::new(RefCell::new(Recorder::new(sim.create_context("recorder"))));
    let recorder_id = sim.add_handler("recorder", recorder.clone());
    let client = sim.create_context("client");
    (sim, recorder, recorder_id, client)
}

#[test]
fn test_events_are_delivered_in_time_order() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, 3.);
    client.emit(Message { id: 1 }, recorder_id, 1.);
    client.emit(Message { id: 2 }, recorder_id, 2.);

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received, vec![(1., 1), (2., 2), (3., 0)]);
    assert_eq!(sim.time(), 3.);
}

#[test]
// Events with equal time must be delivered in the order they were created.
fn test_equal_time_events_keep_insertion_order() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    for id in 0..10 {
        client.emit(Message { id }, recorder_id, 5.);
    }
    client.emit_now(Message { id: 100 }, recorder_id);

    sim.step_until_no_events();

    let ids: Vec<u32> = recorder.borrow().received.iter().map(|(_, id)| *id).collect();
    assert_eq!(ids, vec![100, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn test_canceled_event_is_not_delivered() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, 1.);
    let canceled = client.emit(Message { id: 1 }, recorder_id, 2.);
    client.emit(Message { id: 2 }, recorder_id, 3.);
    client.cancel_event(canceled);
    assert_eq!(sim.pending_event_count(), 2);

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received, vec![(1., 0), (3., 2)]);
    assert_eq!(sim.event_count(), 3);
}

#[test]
fn test_cancel_events_by_predicate() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    for id in 0..6 {
        client.emit(Message { id }, recorder_id, id as f64);
    }
    assert_eq!(sim.cancel_events(|e| e.time >= 3.), 3);
    assert_eq!(sim.pending_event_count(), 3);

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received.len(), 3);
}

#[test]
fn test_emit_at_absolute_time() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, 10.);
    sim.step();
    assert_eq!(sim.time(), 10.);

    assert!(client.emit_at(Message { id: 1 }, recorder_id, 12.5).is_ok());
    // current time is allowed
    assert!(client.emit_at(Message { id: 2 }, recorder_id, 10.).is_ok());
    assert_eq!(
        client.emit_at(Message { id: 3 }, recorder_id, 9.),
        Err(ScheduleError::InPast { time: 9., now: 10. })
    );
    assert!(matches!(
        client.emit_at(Message { id: 4 }, recorder_id, f64::NAN),
        Err(ScheduleError::NotFinite(_))
    ));

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received, vec![(10., 0), (10., 2), (12.5, 1)]);
}

#[test]
// A negative delay drops the event but keeps the simulation running.
fn test_negative_delay_is_rejected() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, -1.);
    client.emit(Message { id: 1 }, recorder_id, f64::INFINITY);
    client.emit(Message { id: 2 }, recorder_id, 1.);
    assert_eq!(sim.pending_event_count(), 1);
    assert_eq!(sim.event_count(), 3);

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received, vec![(1., 2)]);
}

#[test]
fn test_cancel_result() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    let first = client.emit(Message { id: 0 }, recorder_id, 1.);
    let second = client.emit(Message { id: 1 }, recorder_id, 1.);
    assert!(client.cancel_event(second));
    assert!(!client.cancel_event(second));

    sim.step();
    // delivered events cannot be canceled
    assert!(!client.cancel_event(first));
    assert!(!sim.step());
    assert_eq!(recorder.borrow().received, vec![(1., 0)]);
}

#[test]
// Events emitted by a handler at the current time go after already queued events with the same time.
fn test_reentrant_emit_at_current_time() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, 1.);
    client.emit(Message { id: 1 }, recorder_id, 1.);
    sim.step();
    client.emit_now(Message { id: 2 }, recorder_id);
    client.emit(Message { id: 3 }, recorder_id, 0.5);

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received, vec![(1., 0), (1., 1), (1., 2), (1.5, 3)]);
}

#[test]
fn test_step_until_time() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    for id in 1..=4 {
        client.emit(Message { id }, recorder_id, id as f64);
    }
    assert!(sim.step_until_time(3.));
    assert_eq!(sim.time(), 3.);
    assert_eq!(recorder.borrow().received.len(), 3);
    assert!(sim.step_until_time(3.5));
    assert_eq!(sim.pending_event_count(), 1);
    assert_eq!(sim.time(), 3.);
}

#[test]
fn test_stop_request() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, 1.);
    client.emit(Stop {}, recorder_id, 2.);
    client.emit(Message { id: 1 }, recorder_id, 3.);

    sim.step_until_no_events();
    assert!(sim.is_stopped());
    assert_eq!(sim.time(), 2.);
    assert_eq!(recorder.borrow().received.len(), 1);
    assert_eq!(sim.pending_event_count(), 1);

    sim.resume();
    sim.step_until_no_events();
    assert_eq!(recorder.borrow().received.len(), 2);
}

#[test]
fn test_step_for_duration() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    for id in 1..=5 {
        client.emit(Message { id }, recorder_id, id as f64);
    }

    assert!(sim.step_for_duration(2.5));
    assert_eq!(recorder.borrow().received.len(), 2);
    assert!(!sim.step_for_duration(10.));
    assert_eq!(recorder.borrow().received.len(), 5);
}

#[test]
fn test_unhandled_and_undelivered_events_do_not_stop_simulation() {
    let (mut sim, recorder, recorder_id, mut client) = setup();
    let nobody = sim.create_context("nobody").id();
    client.emit(Unknown {}, recorder_id, 1.);
    client.emit(Message { id: 0 }, nobody, 2.);
    client.emit(Message { id: 1 }, recorder_id, 3.);

    sim.step_until_no_events();

    assert_eq!(recorder.borrow().received, vec![(3., 1)]);
}

#[test]
fn test_dump_events() {
    let (sim, _recorder, recorder_id, mut client) = setup();
    client.emit(Message { id: 0 }, recorder_id, 2.);
    let canceled = client.emit(Message { id: 1 }, recorder_id, 1.);
    client.emit(Message { id: 2 }, recorder_id, 0.5);
    client.cancel_event(canceled);

    let times: Vec<f64> = sim.dump_events().iter().map(|e| e.time).collect();
    assert_eq!(times, vec![0.5, 2.]);
}

#[test]
fn test_component_registry() {
    let mut sim = Simulation::new(123);
    let a = sim.create_context("a");
    let b = sim.create_context("b");
    assert_eq!(a.id(), 0);
    assert_eq!(b.id(), 1);
    assert_eq!(sim.lookup_id("b"), Some(1));
    assert_eq!(sim.lookup_id("c"), None);
    assert_eq!(sim.lookup_name(0), "a");
    assert_eq!(b.lookup_name(a.id()), "a");
    assert_eq!(sim.create_context("a").id(), 0);
}

#[test]
fn test_same_seed_gives_same_random_values() {
    let mut sim1 = Simulation::new(42);
    let mut sim2 = Simulation::new(42);
    let mut ctx = sim2.create_context("comp");
    for _ in 0..10 {
        assert_eq!(sim1.rand(), ctx.rand());
    }
    assert_eq!(sim1.gen_range(0..1000), ctx.gen_range(0..1000));
}
