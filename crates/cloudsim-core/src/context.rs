//! Accessing simulation from components.

use std::cell::RefCell;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};

use crate::component::Id;
use crate::error::ScheduleError;
use crate::event::{EventData, EventId};
use crate::state::SimulationState;

/// Component's handle to the simulation: clock, random generator and event emission.
///
/// Components never own the simulation state, several simulations can run side by side.
pub struct SimulationContext {
    id: Id,
    name: String,
    sim_state: Rc<RefCell<SimulationState>>,
    names: Rc<RefCell<Vec<String>>>,
}

impl SimulationContext {
    pub(crate) fn new(
        id: Id,
        name: &str,
        sim_state: Rc<RefCell<SimulationState>>,
        names: Rc<RefCell<Vec<String>>>,
    ) -> Self {
        Self {
            id,
            name: name.to_owned(),
            sim_state,
            names,
        }
    }

    /// Returns the identifier of component associated with this context.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the name of component associated with this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Returns a random float in the range _[0, 1)_
    /// using the simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.sim_state.borrow_mut().rand()
    }

    /// Returns a random value in the specified range
    /// using the simulation-wide random number generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }

    /// Schedules an event for `dst` after `delay`, returns event id.
    ///
    /// An event with negative or non-finite delay is logged as incorrect and never delivered.
    pub fn emit<T>(&mut self, data: T, dst: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().add_event(data, self.id, dst, delay)
    }

    /// Schedules an event for `dst` at the current time.
    pub fn emit_now<T>(&mut self, data: T, dst: Id) -> EventId
    where
        T: EventData,
    {
        self.emit(data, dst, 0.)
    }

    /// Schedules an event for this component after `delay`.
    pub fn emit_self<T>(&mut self, data: T, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.emit(data, self.id, delay)
    }

    /// Schedules an event for `dst` at the absolute `time`.
    ///
    /// A time before the current clock is reported as an error and leaves the queue unchanged.
    pub fn emit_at<T>(&mut self, data: T, dst: Id, time: f64) -> Result<EventId, ScheduleError>
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().add_event_at(data, self.id, dst, time)
    }

    /// Withdraws a pending event, returns `false` if it was already delivered or canceled.
    pub fn cancel_event(&mut self, id: EventId) -> bool {
        self.sim_state.borrow_mut().cancel_event(id)
    }

    /// Asks the simulation to stop after the currently processed event.
    pub fn stop_simulation(&mut self) {
        self.sim_state.borrow_mut().request_stop();
    }

    /// Lookup component name by its identifier.
    pub fn lookup_name(&self, id: Id) -> String {
        self.names.borrow()[id as usize].clone()
    }
}
