//! Session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime owns the current state, feeds events through
//! [`transition`], and executes the returned effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{AttemptId, SessionState, SessionStateKind};
pub use transition::{transition, TransitionError};
