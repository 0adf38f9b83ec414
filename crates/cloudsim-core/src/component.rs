//! Simulation component identifiers.

/// Identifier of a simulation component.
///
/// Ids are assigned sequentially starting from 0 in the order components are registered.
pub type Id = u32;
