//! Event handling.

use crate::event::Event;

/// Trait for consuming events in simulation components.
pub trait EventHandler {
    /// Processes an event delivered at the current simulation time.
    ///
    /// Events emitted from here, including zero-delay ones, go after pending events with the same time.
    fn on(&mut self, event: Event);
}

/// Enables the use of pattern matching syntax for processing different types of events
/// by downcasting the event payload from [`EventData`](crate::event::EventData) to user-defined types.
///
/// Match arms need not be exhaustive. If the event payload does not match any of the specified arms,
/// the event is logged as unhandled under `ERROR` level.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use cloudsim_core::{cast, Event, EventHandler, SimulationContext};
///
/// #[derive(Clone, Serialize)]
/// pub struct HostHeartbeat {
///     host_id: u32,
/// }
///
/// #[derive(Clone, Serialize)]
/// pub struct CheckHosts {}
///
/// pub struct Monitor {
///     last_seen: Vec<f64>,
///     ctx: SimulationContext,
/// }
///
/// impl EventHandler for Monitor {
///     fn on(&mut self, event: Event) {
///         cast!(match event.data {
///             HostHeartbeat { host_id } => {
///                 self.last_seen[host_id as usize] = self.ctx.time();
///             }
///             CheckHosts {} => {
///                 self.ctx.emit_self(CheckHosts {}, 60.);
///             }
///         })
///     }
/// }
/// ```
#[macro_export]
macro_rules! cast {
    ( match $event:ident.data { $( $type:ident { $($tt:tt)* } => { $($expr:tt)* } )+ } ) => {
        $(
            if $event.data.is::<$type>() {
                if let Ok(__value) = $event.data.downcast::<$type>() {
                    let $type { $($tt)* } = *__value;
                    $($expr)*
                }
            } else
        )*
        {
            $crate::log::log_unhandled_event($event);
        }
    }
}
