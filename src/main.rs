use loop_sim::math::Point2d;
use loop_sim::{AgentAttributes, Direction, SeparationEvent, Simulation, Track};

fn main() {
    // A circular track 1000 m around, two agents approaching head-on.
    let radius = 1000.0 / std::f64::consts::TAU;
    let track = Track::circle(Point2d::new(0.0, 0.0), radius).unwrap();
    let mut sim = Simulation::new(track, 120.0).unwrap();

    sim.add_agent(&AgentAttributes {
        fraction: 0.0,
        direction: Direction::Forward,
        speed: 0.02,
    })
    .unwrap();
    sim.add_agent(&AgentAttributes {
        fraction: 0.5,
        direction: Direction::Reverse,
        speed: 0.02,
    })
    .unwrap();

    sim.start();

    let mut elapsed = 0.0;
    loop {
        let tick = sim.advance(0.05).unwrap();
        elapsed += 0.05;

        match tick.event {
            SeparationEvent::Ok(Some(sep)) => {
                println!("t={:6.2}s  min distance {:7.2} m", elapsed, sep.distance);
            }
            SeparationEvent::Ok(None) => {}
            SeparationEvent::Violation(sep) => {
                println!(
                    "t={:6.2}s  BRAKED: pair {:?} at {:.2} m (< {:.0} m)",
                    elapsed,
                    sep.pair,
                    sep.distance,
                    sim.safe_distance()
                );
                for agent in &tick.agents {
                    let sample = sim.track().sample(agent.fraction);
                    println!(
                        "  agent {:?} at fraction {:.4} -> ({:.1}, {:.1})",
                        agent.id, agent.fraction, sample.pos.x, sample.pos.y
                    );
                }
                break;
            }
        }
    }
}
