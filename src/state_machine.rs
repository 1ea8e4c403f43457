//! Dialogue orchestrator
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `(state, event) -> (new state, effects)`. Effects are message appends and
//! at most one backend call, executed by the runtime.

pub mod classify;
mod effect;
pub mod event;
pub mod replies;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, ProviderCall};
pub use event::Event;
pub use state::{CallKind, ConvContext, ConvState, MenuOption, Phase, SearchContext, WaitingFor};
pub use transition::{transition, TransitionError, TransitionResult};
