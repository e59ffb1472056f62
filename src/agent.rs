use crate::math::wrap_unit;
use crate::AgentId;

/// The direction of travel around the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Travel in the direction of increasing fraction.
    Forward,
    /// Travel in the direction of decreasing fraction.
    Reverse,
}

impl Direction {
    /// The sign applied to position updates: `+1.0` or `-1.0`.
    pub fn signum(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// A simulated agent on the track.
#[derive(Clone, Debug)]
pub struct Agent {
    /// The agent's ID
    pub(crate) id: AgentId,
    /// The position along the track as a fraction of its length, in [0, 1).
    frac: f64,
    /// The current direction of travel.
    dir: Direction,
    /// The speed as a fraction of the track length per second.
    speed: f64,
    /// The speed adjustment factor, multiplied with `speed` during integration.
    speed_adjust: f64,
    /// The configured starting position, restored by a reset.
    init_frac: f64,
    /// The configured starting direction, restored by a reset.
    init_dir: Direction,
}

/// The attributes of a simulated agent.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentAttributes {
    /// The initial position as a fraction of the track length, in [0, 1).
    pub fraction: f64,
    /// The initial direction of travel.
    pub direction: Direction,
    /// The speed as a fraction of the track length per second.
    pub speed: f64,
}

/// The public per-tick view of an agent's position.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub fraction: f64,
    pub direction: Direction,
}

impl Agent {
    /// Creates a new agent.
    pub(crate) fn new(id: AgentId, attributes: &AgentAttributes) -> Self {
        let frac = wrap_unit(attributes.fraction);
        Self {
            id,
            frac,
            dir: attributes.direction,
            speed: attributes.speed,
            speed_adjust: 1.0,
            init_frac: frac,
            init_dir: attributes.direction,
        }
    }

    /// Gets the agent's ID.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's position as a fraction of the track length, in [0, 1).
    pub fn fraction(&self) -> f64 {
        self.frac
    }

    /// The agent's current direction of travel.
    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// The agent's base speed as a fraction of the track length per second.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The agent's current speed adjustment factor. [Read more](crate::Simulation::randomise_speed_adjusts).
    pub fn speed_adjust(&self) -> f64 {
        self.speed_adjust
    }

    /// Integrates the agent's position over `dt` seconds,
    /// wrapping it back onto [0, 1).
    pub(crate) fn integrate(&mut self, dt: f64) {
        let speed = self.speed * self.speed_adjust;
        self.frac = wrap_unit(self.frac + self.dir.signum() * speed * dt);
    }

    /// Restores the agent to its configured initial position and direction.
    /// The speed is left unchanged.
    pub(crate) fn reset(&mut self) {
        self.frac = self.init_frac;
        self.dir = self.init_dir;
    }

    /// Flips the agent's direction of travel.
    pub(crate) fn swap_direction(&mut self) {
        self.dir = self.dir.reversed();
    }

    pub(crate) fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Sets the agent's speed adjustment factor. The base speed is untouched,
    /// so a new factor replaces the previous one rather than compounding.
    pub(crate) fn set_speed_adjust(&mut self, factor: f64) {
        self.speed_adjust = factor;
    }

    pub(crate) fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            fraction: self.frac,
            direction: self.dir,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use slotmap::Key;

    #[test]
    fn integration_wraps_in_both_directions() {
        let mut agent = Agent::new(
            AgentId::null(),
            &AgentAttributes {
                fraction: 0.95,
                direction: Direction::Forward,
                speed: 0.02,
            },
        );
        agent.integrate(5.0);
        assert_approx_eq!(agent.fraction(), 0.05);

        agent.swap_direction();
        agent.integrate(10.0);
        assert_approx_eq!(agent.fraction(), 0.85);
    }

    #[test]
    fn speed_adjust_replaces_and_scales_integration() {
        let mut agent = Agent::new(
            AgentId::null(),
            &AgentAttributes {
                fraction: 0.0,
                direction: Direction::Forward,
                speed: 0.1,
            },
        );
        agent.set_speed_adjust(0.5);
        agent.integrate(1.0);
        assert_approx_eq!(agent.fraction(), 0.05);

        // A new factor replaces the old one, it does not compound
        agent.set_speed_adjust(1.25);
        assert_eq!(agent.speed_adjust(), 1.25);
        agent.integrate(1.0);
        assert_approx_eq!(agent.fraction(), 0.175);
        assert_eq!(agent.speed(), 0.1);
    }

    #[test]
    fn reset_restores_initial_state_but_not_speed() {
        let mut agent = Agent::new(
            AgentId::null(),
            &AgentAttributes {
                fraction: 0.25,
                direction: Direction::Reverse,
                speed: 0.01,
            },
        );
        agent.integrate(3.0);
        agent.swap_direction();
        agent.set_speed(0.5);
        agent.reset();
        assert_eq!(agent.fraction(), 0.25);
        assert_eq!(agent.direction(), Direction::Reverse);
        assert_eq!(agent.speed(), 0.5);
    }
}
