//! Dam Break Diagnostic
//!
//! Seed a column of fluid on one side of the domain, let it collapse, and
//! track particle counts and velocity stats frame by frame.
//! Run with: cargo run -p sim --example dam_break

use glam::Vec2;
use sim::{physics, SphConfig, SphSimulation};

const FRAMES: usize = 600;

fn main() {
    env_logger::init();

    let config = SphConfig::default();
    let domain = config.domain;
    let border = config.border;
    let mut sim = SphSimulation::new(config);

    // Water column against the left wall, reaching halfway across.
    let spawned = sim.spawn_block(
        Vec2::new(border + 8.0, border + 8.0),
        Vec2::new(domain.x / 2.0, domain.y - border - 8.0),
        8.0,
    );
    println!("Spawned {} particles ({} live)", spawned, sim.live_count());
    println!(
        "Domain {}x{} px, border {} px, kernel range {} px",
        domain.x, domain.y, border, physics::KERNEL_RANGE
    );
    println!();

    let initial = sim.live_count();
    for frame in 0..FRAMES {
        sim.step(physics::TIMESTEP);

        if frame % 60 == 0 {
            let (avg_vel, max_vel) = velocity_stats(&sim);
            let avg_density = average_density(&sim);
            println!(
                "Frame {:4}: live={:5} avg_density={:10.1} avg_vel={:8.1} max_vel={:9.1}",
                frame,
                sim.live_count(),
                avg_density,
                avg_vel,
                max_vel
            );
        }
    }

    let lost = initial - sim.live_count();
    println!();
    println!(
        "Final count: {} / {} ({} dropped by crowded cells)",
        sim.live_count(),
        initial,
        lost
    );
}

fn velocity_stats(sim: &SphSimulation) -> (f32, f32) {
    let mut sum = 0.0;
    let mut max = 0.0f32;
    let mut count = 0;
    for (_, p) in sim.live_particles() {
        let v = p.velocity.length();
        sum += v;
        max = max.max(v);
        count += 1;
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    (sum / count as f32, max)
}

fn average_density(sim: &SphSimulation) -> f32 {
    let mut sum = 0.0;
    let mut count = 0;
    for (_, p) in sim.live_particles() {
        sum += p.density;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f32
}
