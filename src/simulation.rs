use crate::agent::{Agent, AgentAttributes, AgentSnapshot};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::{debug_agent, debug_separation};
use crate::error::{SimResult, SimulationError};
use crate::math::shortest_arc;
use crate::track::Track;
use crate::{AgentId, AgentSet};
use itertools::Itertools;
use rand_distr::Distribution;
use smallvec::SmallVec;

/// The default upper bound on a single time step, in s.
///
/// A stalled host clock can otherwise produce a huge catch-up jump.
const DEFAULT_MAX_STEP_SEC: f64 = 1.0; // s

/// How to handle a time step larger than the configured maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DtPolicy {
    /// Clamp the step to the maximum and advance by that amount.
    Clamp,
    /// Reject the step with [`SimulationError::InvalidInput`]; nothing moves.
    Reject,
}

/// The lifecycle state of a [Simulation].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimState {
    /// Not advancing; positions are preserved.
    Idle,
    /// Advancing on each tick.
    Running,
    /// Stopped by a separation violation; `start()` or `reset()` resumes.
    Braked,
}

/// The measured separation of the closest pair of agents.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Separation {
    /// The pair of agents achieving the minimum distance.
    pub pair: [AgentId; 2],
    /// The shortest-arc distance between them, in m.
    pub distance: f64,
}

/// The safety verdict computed after each tick.
///
/// Derived, never stored: it is recomputed from agent positions every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SeparationEvent {
    /// Every pair is at or above the safe distance.
    /// `None` when fewer than two agents exist.
    Ok(Option<Separation>),
    /// A pair is closer than the safe distance; the simulation has braked.
    Violation(Separation),
}

/// The result of one [Simulation::advance] call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickOutput {
    /// The state after this tick.
    pub state: SimState,
    /// The position and direction of every agent.
    pub agents: Vec<AgentSnapshot>,
    /// The safety verdict for this tick.
    pub event: SeparationEvent,
}

/// A read-only snapshot of the simulation, from [Simulation::current_status].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimStatus {
    pub state: SimState,
    /// The minimum pairwise distance in m; `None` with fewer than two agents.
    pub min_distance: Option<f64>,
    pub positions: Vec<AgentSnapshot>,
}

/// A deterministic simulation of agents on a closed track.
///
/// Agents glide around the track at fixed speeds; after every tick the
/// minimum pairwise shortest-arc distance is measured, and if any pair is
/// closer than the configured safe distance the simulation brakes.
///
/// Time is injected through [advance](Self::advance) and never read from a
/// clock, so two runs fed identical `dt` sequences produce identical
/// positions.
pub struct Simulation {
    /// The track the agents move along.
    track: Track,
    /// The agents being simulated.
    agents: AgentSet,
    /// The minimum allowed separation between any pair of agents, in m.
    safe_distance: f64,
    /// The maximum accepted time step, in s.
    max_dt: f64,
    /// What to do with a time step above `max_dt`.
    dt_policy: DtPolicy,
    /// The current lifecycle state.
    state: SimState,
    /// Debugging information from the previously simulated tick.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation on the given track.
    ///
    /// `safe_distance` is the minimum allowed metric separation in m;
    /// motion stops when any pair of agents gets closer than this.
    pub fn new(track: Track, safe_distance: f64) -> SimResult<Self> {
        if !(safe_distance.is_finite() && safe_distance >= 0.0) {
            return Err(SimulationError::InvalidInput {
                reason: "safe distance must be non-negative and finite",
                value: safe_distance,
            });
        }
        Ok(Self {
            track,
            agents: AgentSet::default(),
            safe_distance,
            max_dt: DEFAULT_MAX_STEP_SEC,
            dt_policy: DtPolicy::Clamp,
            state: SimState::Idle,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        })
    }

    /// Adds an agent to the simulation. Only valid while [SimState::Idle];
    /// the agent count is fixed once the simulation has been started.
    pub fn add_agent(&mut self, attributes: &AgentAttributes) -> SimResult<AgentId> {
        if self.state != SimState::Idle {
            return Err(SimulationError::InvalidState {
                command: "add_agent",
                state: self.state,
            });
        }
        if !(attributes.speed.is_finite() && attributes.speed >= 0.0) {
            return Err(SimulationError::InvalidInput {
                reason: "agent speed must be non-negative and finite",
                value: attributes.speed,
            });
        }
        if !attributes.fraction.is_finite() {
            return Err(SimulationError::InvalidInput {
                reason: "agent position must be finite",
                value: attributes.fraction,
            });
        }
        Ok(self
            .agents
            .insert_with_key(|id| Agent::new(id, attributes)))
    }

    /// Starts or resumes the simulation. No-op if already running.
    pub fn start(&mut self) {
        if self.state != SimState::Running {
            log::debug!("simulation started from {:?}", self.state);
            self.state = SimState::Running;
        }
    }

    /// Pauses a running simulation, preserving all agent positions.
    /// No-op in any other state; in particular it does not clear a brake.
    pub fn pause(&mut self) {
        if self.state == SimState::Running {
            log::debug!("simulation paused");
            self.state = SimState::Idle;
        }
    }

    /// Stops the simulation and restores every agent to its configured
    /// initial position and direction. Speeds are left unchanged.
    pub fn reset(&mut self) {
        for (_, agent) in &mut self.agents {
            agent.reset();
        }
        log::debug!("simulation reset from {:?}", self.state);
        self.state = SimState::Idle;
    }

    /// Flips the direction of travel of every agent.
    /// Valid in any state; takes effect on the next advance.
    pub fn swap_directions(&mut self) {
        for (_, agent) in &mut self.agents {
            agent.swap_direction();
        }
    }

    /// Sets an agent's speed, as a fraction of the track length per second.
    pub fn set_speed(&mut self, agent_id: AgentId, speed: f64) -> SimResult<()> {
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(SimulationError::InvalidInput {
                reason: "agent speed must be non-negative and finite",
                value: speed,
            });
        }
        let agent = self
            .agents
            .get_mut(agent_id)
            .ok_or(SimulationError::UnknownAgent(agent_id))?;
        agent.set_speed(speed);
        Ok(())
    }

    /// Configures the maximum accepted time step and the policy applied
    /// when a larger step arrives. The default clamps at 1 s.
    pub fn set_dt_limit(&mut self, max_dt: f64, policy: DtPolicy) -> SimResult<()> {
        if !(max_dt.is_finite() && max_dt > 0.0) {
            return Err(SimulationError::InvalidInput {
                reason: "maximum time step must be positive and finite",
                value: max_dt,
            });
        }
        self.max_dt = max_dt;
        self.dt_policy = policy;
        Ok(())
    }

    /// Randomly assigns a speed adjustment factor to each agent,
    /// which is sampled from a normal distribution with a mean of 1 (no adjustment)
    /// and standard deviation of `stddev`, clamped to [0.75, 1.25].
    ///
    /// The factor multiplies the agent's base speed during integration; a
    /// repeated call replaces each agent's factor rather than compounding it.
    pub fn randomise_speed_adjusts(&mut self, stddev: f64) -> SimResult<()> {
        if !(stddev.is_finite() && stddev >= 0.0) {
            return Err(SimulationError::InvalidInput {
                reason: "standard deviation must be non-negative and finite",
                value: stddev,
            });
        }
        let distr = rand_distr::Normal::new(1.0, stddev).map_err(|_| {
            SimulationError::InvalidInput {
                reason: "standard deviation must be non-negative and finite",
                value: stddev,
            }
        })?;
        let mut rand = rand::thread_rng();
        for (_, agent) in &mut self.agents {
            let factor = distr.sample(&mut rand).clamp(0.75, 1.25);
            agent.set_speed_adjust(factor);
        }
        Ok(())
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Only valid while [SimState::Running]; fails with
    /// [`SimulationError::InvalidState`] otherwise, leaving everything
    /// unchanged. A negative or non-finite `dt` fails with
    /// [`SimulationError::InvalidInput`]. A `dt` above the configured maximum
    /// is clamped or rejected according to the [DtPolicy].
    ///
    /// After moving every agent, the minimum pairwise shortest-arc distance
    /// is measured; if it is strictly below the safe distance the simulation
    /// transitions to [SimState::Braked] and this tick reports a
    /// [SeparationEvent::Violation].
    pub fn advance(&mut self, dt: f64) -> SimResult<TickOutput> {
        if self.state != SimState::Running {
            return Err(SimulationError::InvalidState {
                command: "advance",
                state: self.state,
            });
        }
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(SimulationError::InvalidInput {
                reason: "time step must be non-negative and finite",
                value: dt,
            });
        }
        let dt = if dt > self.max_dt {
            match self.dt_policy {
                DtPolicy::Clamp => self.max_dt,
                DtPolicy::Reject => {
                    return Err(SimulationError::InvalidInput {
                        reason: "time step exceeds the configured maximum",
                        value: dt,
                    });
                }
            }
        } else {
            dt
        };

        for (id, agent) in &mut self.agents {
            agent.integrate(dt);
            debug_agent(id, agent.fraction());
        }

        let event = self.measure_separation();
        match event {
            SeparationEvent::Violation(sep) => {
                log::warn!(
                    "separation violation: {:?} at {:.2} m (safe distance {:.2} m)",
                    sep.pair,
                    sep.distance,
                    self.safe_distance
                );
                debug_separation(sep.pair, sep.distance);
                self.state = SimState::Braked;
            }
            SeparationEvent::Ok(Some(sep)) => {
                log::trace!("closest pair {:?} at {:.2} m", sep.pair, sep.distance);
                debug_separation(sep.pair, sep.distance);
            }
            SeparationEvent::Ok(None) => {}
        }

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }

        Ok(TickOutput {
            state: self.state,
            agents: self.snapshots(),
            event,
        })
    }

    /// Gets a read-only snapshot of the simulation. No mutation.
    pub fn current_status(&self) -> SimStatus {
        let min_distance = match self.measure_separation() {
            SeparationEvent::Ok(sep) => sep.map(|s| s.distance),
            SeparationEvent::Violation(sep) => Some(sep.distance),
        };
        SimStatus {
            state: self.state,
            min_distance,
            positions: self.snapshots(),
        }
    }

    /// Gets the current lifecycle state.
    pub fn state(&self) -> SimState {
        self.state
    }

    /// Gets the configured safe distance in m.
    pub fn safe_distance(&self) -> f64 {
        self.safe_distance
    }

    /// Gets the track the agents move along.
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Returns an iterator over all the agents in the simulation.
    pub fn iter_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Gets a reference to the agent with the given ID.
    pub fn get_agent(&self, agent_id: AgentId) -> &Agent {
        &self.agents[agent_id]
    }

    /// Gets the debugging information for the previously simulated tick as a JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Computes the safety verdict from the current agent positions.
    fn measure_separation(&self) -> SeparationEvent {
        let fracs = self
            .agents
            .iter()
            .map(|(id, agent)| (id, agent.fraction()))
            .collect::<SmallVec<[_; 8]>>();

        let closest = fracs
            .iter()
            .tuple_combinations()
            .map(|((id1, f1), (id2, f2))| Separation {
                pair: [*id1, *id2],
                distance: self.track.metric_distance(shortest_arc(*f1, *f2)),
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        match closest {
            Some(sep) if sep.distance < self.safe_distance => SeparationEvent::Violation(sep),
            other => SeparationEvent::Ok(other),
        }
    }

    fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.values().map(Agent::snapshot).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use crate::Direction;

    fn sim_with_safe_distance(safe_distance: f64) -> Simulation {
        let track = Track::circle(Point2d::new(0.0, 0.0), 1000.0 / std::f64::consts::TAU).unwrap();
        Simulation::new(track, safe_distance).unwrap()
    }

    fn agent(fraction: f64, direction: Direction, speed: f64) -> AgentAttributes {
        AgentAttributes {
            fraction,
            direction,
            speed,
        }
    }

    #[test]
    fn oversized_step_is_clamped_by_default() {
        let mut sim = sim_with_safe_distance(0.0);
        let id = sim
            .add_agent(&agent(0.0, Direction::Forward, 0.1))
            .unwrap();
        sim.start();
        sim.advance(100.0).unwrap();
        // Clamped to the default 1 s maximum: 0.1 of the track, not 10 laps
        assert_eq!(sim.get_agent(id).fraction(), 0.1);
    }

    #[test]
    fn oversized_step_can_be_rejected() {
        let mut sim = sim_with_safe_distance(0.0);
        let id = sim
            .add_agent(&agent(0.25, Direction::Forward, 0.1))
            .unwrap();
        sim.set_dt_limit(0.5, DtPolicy::Reject).unwrap();
        sim.start();
        let err = sim.advance(0.6).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidInput { .. }));
        assert_eq!(sim.get_agent(id).fraction(), 0.25);
        assert_eq!(sim.state(), SimState::Running);
    }

    #[test]
    fn agents_cannot_be_added_while_running() {
        let mut sim = sim_with_safe_distance(10.0);
        sim.add_agent(&agent(0.0, Direction::Forward, 0.01))
            .unwrap();
        sim.start();
        let err = sim
            .add_agent(&agent(0.5, Direction::Forward, 0.01))
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidState { .. }));
    }

    #[test]
    fn fewer_than_two_agents_never_violates() {
        let mut sim = sim_with_safe_distance(500.0);
        sim.add_agent(&agent(0.0, Direction::Forward, 0.1))
            .unwrap();
        sim.start();
        let tick = sim.advance(1.0).unwrap();
        assert_eq!(tick.event, SeparationEvent::Ok(None));
        assert_eq!(tick.state, SimState::Running);
    }

    #[test]
    fn pause_preserves_positions() {
        let mut sim = sim_with_safe_distance(0.0);
        let id = sim
            .add_agent(&agent(0.0, Direction::Forward, 0.1))
            .unwrap();
        sim.start();
        sim.advance(1.0).unwrap();
        sim.pause();
        assert_eq!(sim.state(), SimState::Idle);
        assert_eq!(sim.get_agent(id).fraction(), 0.1);
    }

    #[test]
    fn speed_adjusts_replace_rather_than_compound() {
        let mut sim = sim_with_safe_distance(0.0);
        let id = sim
            .add_agent(&agent(0.0, Direction::Forward, 0.1))
            .unwrap();
        sim.randomise_speed_adjusts(10.0).unwrap();
        sim.randomise_speed_adjusts(10.0).unwrap();
        // The base speed is untouched and the factor stays inside the clamp,
        // however many times the adjusts are re-rolled
        let agent = sim.get_agent(id);
        assert_eq!(agent.speed(), 0.1);
        assert!((0.75..=1.25).contains(&agent.speed_adjust()));
    }

    #[test]
    fn speed_adjust_rejects_bad_stddev() {
        let mut sim = sim_with_safe_distance(0.0);
        let id = sim
            .add_agent(&agent(0.0, Direction::Forward, 0.1))
            .unwrap();
        for stddev in [-1.0, f64::NAN, f64::INFINITY] {
            let err = sim.randomise_speed_adjusts(stddev).unwrap_err();
            assert!(matches!(err, SimulationError::InvalidInput { .. }));
        }
        assert_eq!(sim.get_agent(id).speed_adjust(), 1.0);
    }

    #[test]
    fn set_speed_rejects_bad_values() {
        let mut sim = sim_with_safe_distance(0.0);
        let id = sim
            .add_agent(&agent(0.0, Direction::Forward, 0.1))
            .unwrap();
        let err = sim.set_speed(id, -0.5).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidInput { .. }));
        assert_eq!(sim.get_agent(id).speed(), 0.1);

        let err = sim.set_speed(AgentId::default(), 0.2).unwrap_err();
        assert!(matches!(err, SimulationError::UnknownAgent(_)));
    }
}
