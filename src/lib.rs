pub use agent::{Agent, AgentAttributes, AgentSnapshot, Direction};
pub use cgmath;
pub use error::{SimResult, SimulationError};
pub use simulation::{
    DtPolicy, Separation, SeparationEvent, SimState, SimStatus, Simulation, TickOutput,
};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use track::{Track, TrackSample};
pub use util::Interval;

mod agent;
mod debug;
mod error;
pub mod math;
mod simulation;
mod track;
mod util;

new_key_type! {
    /// Unique ID of an [Agent].
    pub struct AgentId;
}

type AgentSet = SlotMap<AgentId, Agent>;
