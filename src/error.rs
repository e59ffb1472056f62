use crate::{AgentId, SimState};
use thiserror::Error;

/// Errors returned by track construction and simulation commands.
///
/// A separation below the safe distance is not an error: it is a modelled
/// outcome reported through [`SeparationEvent::Violation`](crate::SeparationEvent)
/// and the [`SimState::Braked`] state, recoverable via `start()` or `reset()`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationError {
    /// The supplied curve cannot form a valid track. Construction fails.
    #[error("invalid track geometry: {0}")]
    InvalidGeometry(&'static str),

    /// A command argument was rejected. All state is left unchanged.
    #[error("invalid input: {reason} ({value})")]
    InvalidInput { reason: &'static str, value: f64 },

    /// A command was issued in a state which does not permit it.
    #[error("{command} is not valid in the {state:?} state")]
    InvalidState {
        command: &'static str,
        state: SimState,
    },

    /// No agent with the given ID exists in this simulation.
    #[error("unknown agent: {0:?}")]
    UnknownAgent(AgentId),
}

/// Shorthand result type for simulation commands.
pub type SimResult<T> = Result<T, SimulationError>;
