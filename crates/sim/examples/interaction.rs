//! Interaction Diagnostic
//!
//! Drip jittered rows of particles from an emitter while pulsing the
//! repulsion and attraction operators at a fixed point, the way the game
//! layer does on mouse input. Prints how the fluid responds.
//! Run with: cargo run -p sim --example interaction

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim::{physics, SphConfig, SphSimulation};

const FRAMES: usize = 1200;
const DRIP_EVERY: usize = 100;
const PULSE_EVERY: usize = 300;

fn main() {
    env_logger::init();

    let config = SphConfig::default();
    let domain = config.domain;
    let border = config.border;
    let mut sim = SphSimulation::new(config);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let emitter = Vec2::new(domain.x / 2.0, border + 16.0);
    let poke = Vec2::new(domain.x / 2.0, domain.y - border - 32.0);

    for frame in 0..FRAMES {
        if frame % DRIP_EVERY == 0 {
            let spawned = sim.spawn_row(emitter, 40, 4.0, 8.0, &mut rng);
            if spawned < 40 {
                println!("Frame {:4}: emitter spawned only {}/40", frame, spawned);
            }
        }

        // Alternate a repulsion pulse and an attraction pulse near the
        // floor, where the fluid piles up.
        if frame % PULSE_EVERY == PULSE_EVERY / 2 {
            sim.repulsion(poke);
        } else if frame > 0 && frame % PULSE_EVERY == 0 {
            sim.attraction(poke);
        }

        sim.step(physics::TIMESTEP);

        if frame % 120 == 0 {
            let near_poke = sim
                .neighbors_within(poke, 3.0 * physics::KERNEL_RANGE)
                .count();
            println!(
                "Frame {:4}: live={:5} near_poke={:3}",
                frame,
                sim.live_count(),
                near_poke
            );
        }
    }

    println!();
    println!("Final live count: {}", sim.live_count());
}
