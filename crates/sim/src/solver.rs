//! SPH solver: the per-step pipeline over the particle pool and spatial
//! grid.
//!
//! Each `step` runs, in order:
//! 1. Gather neighbors per live particle (cached lists, buffers reused)
//! 2. Density, then pressure (clamped non-negative, no suction)
//! 3. Force accumulation: pressure + viscosity + density-weighted gravity
//! 4. Semi-implicit Euler integration
//! 5. Incremental grid updates as particles move
//! 6. Boundary collision: per-axis clamp and damped reflection
//!
//! The ordering is the contract; densities must be complete before any
//! force reads them.
//!
//! Reference: Muller et al. 2003, "Particle-Based Fluid Simulation for
//! Interactive Applications"

use glam::Vec2;
use rand::Rng;

use crate::config::SphConfig;
use crate::grid::SpatialGrid;
use crate::kernels::{poly6, spiky_gradient, viscosity_laplacian};
use crate::particle::{Particle, ParticleId, ParticlePool};

/// A complete SPH simulation: configuration, particle pool, spatial grid,
/// and the per-step scratch buffers. Everything is owned here and mutated
/// only through `&mut self`, never through globals.
pub struct SphSimulation {
    config: SphConfig,
    pool: ParticlePool,
    grid: SpatialGrid,
    /// Cached neighbor list per pool slot, reused across steps.
    neighborhoods: Vec<Vec<ParticleId>>,
    /// Snapshot of live ids for the current step, reused across steps.
    scratch_live: Vec<ParticleId>,
}

impl SphSimulation {
    pub fn new(config: SphConfig) -> Self {
        assert!(config.kernel_range > 0.0, "kernel range must be positive");
        assert!(
            config.domain.x > 0.0 && config.domain.y > 0.0,
            "domain must have positive extent"
        );
        let pool = ParticlePool::new(config.max_particles);
        let grid = SpatialGrid::new(
            config.domain,
            config.kernel_range,
            config.grid_border_cells,
            config.slots_per_cell,
        );
        let neighborhoods = vec![Vec::new(); config.max_particles];
        Self {
            config,
            pool,
            grid,
            neighborhoods,
            scratch_live: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &SphConfig {
        &self.config
    }

    /// Number of live particles.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.pool.live_count()
    }

    /// Read-only view of the live particles for rendering: position,
    /// velocity, density, and pressure are all exposed on [`Particle`].
    pub fn live_particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.pool.iter_live()
    }

    /// Borrow one particle, or `None` when the id is stale.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.pool.is_live(id).then(|| self.pool.get(id))
    }

    /// Ids of live particles within `radius` of `pos`, lazily enumerated
    /// from the grid's cell block around the position.
    pub fn neighbors_within(
        &self,
        pos: Vec2,
        radius: f32,
    ) -> impl Iterator<Item = ParticleId> + '_ {
        self.grid.neighbors_within(&self.pool, pos, radius)
    }

    /// True when `pos` lies outside the `[0, domain)` half-open box.
    ///
    /// Spawn-culling helper only: simulated particles are contained by
    /// boundary collision, not deleted for leaving the domain.
    pub fn is_out_of_bounds(&self, pos: Vec2) -> bool {
        pos.x < 0.0
            || pos.y < 0.0
            || pos.x >= self.config.domain.x
            || pos.y >= self.config.domain.y
    }

    /// Spawn a particle at `pos` with zeroed velocity and the configured
    /// mass.
    ///
    /// Soft-fails with `None` when the pool has no free slot or the target
    /// cell's slot array is saturated; existing particles are untouched
    /// either way.
    pub fn spawn(&mut self, pos: Vec2) -> Option<ParticleId> {
        let Some(id) = self.pool.alloc(pos, self.config.particle_mass) else {
            log::debug!("particle pool exhausted, spawn at ({}, {}) dropped", pos.x, pos.y);
            return None;
        };
        let cell = self.grid.cell_for(pos);
        self.pool.get_mut(id).cell = cell;
        if !self.grid.attach(id, cell) {
            log::warn!(
                "cell ({}, {}) out of slots, dropping spawn",
                cell.x,
                cell.y
            );
            self.pool.free(id);
            return None;
        }
        Some(id)
    }

    /// Despawn a particle: detach from the grid, free the pool slot.
    /// No-op when the id is already free. Other live ids stay valid.
    pub fn despawn(&mut self, id: ParticleId) {
        if !self.pool.is_live(id) {
            return;
        }
        let cell = self.pool.get(id).cell;
        self.grid.detach(id, cell);
        self.pool.free(id);
    }

    /// Despawn everything, restoring the just-constructed state without
    /// reallocating.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.grid.clear();
        for list in &mut self.neighborhoods {
            list.clear();
        }
        self.scratch_live.clear();
    }

    /// Fill an axis-aligned rectangle with particles at fixed spacing.
    ///
    /// Out-of-domain positions are culled; pool or cell exhaustion skips
    /// the affected spawns. Returns how many particles were created.
    pub fn spawn_block(&mut self, min: Vec2, max: Vec2, spacing: f32) -> usize {
        assert!(spacing > 0.0, "spacing must be positive");
        let mut spawned = 0;
        let mut y = min.y;
        while y <= max.y {
            let mut x = min.x;
            while x <= max.x {
                let pos = Vec2::new(x, y);
                if !self.is_out_of_bounds(pos) && self.spawn(pos).is_some() {
                    spawned += 1;
                }
                x += spacing;
            }
            y += spacing;
        }
        spawned
    }

    /// Spawn a jittered horizontal row of `count` particles starting at
    /// `origin` (the drip-emitter shape). Returns how many spawned.
    pub fn spawn_row<R: Rng>(
        &mut self,
        origin: Vec2,
        count: usize,
        spacing: f32,
        jitter: f32,
        rng: &mut R,
    ) -> usize {
        let mut spawned = 0;
        for i in 0..count {
            let pos = Vec2::new(
                origin.x + i as f32 * spacing + (rng.gen::<f32>() - 0.5) * jitter,
                origin.y + (rng.gen::<f32>() - 0.5) * jitter,
            );
            if !self.is_out_of_bounds(pos) && self.spawn(pos).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    /// Advance the simulation by `dt`.
    pub fn step(&mut self, dt: f32) {
        debug_assert!(dt > 0.0 && dt.is_finite(), "invalid timestep: {}", dt);
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        self.snapshot_live();
        self.find_neighborhoods();
        self.compute_density_pressure();
        self.accumulate_forces();
        self.integrate(dt);
        // Accumulators start clean for the next step. Point forces applied
        // between steps land after this reset and survive into the next
        // accumulation.
        self.reset_forces();
    }

    /// Push every live particle within reach away from `point`.
    ///
    /// Full O(n) scan over the pool, not grid-accelerated: these operators
    /// run on user interaction, not every step.
    pub fn repulsion(&mut self, point: Vec2) {
        self.point_force(point, 1.0);
    }

    /// Pull every live particle within reach toward `point`.
    pub fn attraction(&mut self, point: Vec2) {
        self.point_force(point, -1.0);
    }

    fn point_force(&mut self, point: Vec2, sign: f32) {
        let reach_sq = 3.0 * self.config.kernel_range * self.config.kernel_range;
        let coeff = sign * self.config.repulsion;
        for (_, p) in self.pool.iter_live_mut() {
            let x = p.position - point;
            if x.length_squared() < reach_sq {
                p.force += coeff * p.density * x;
            }
        }
    }

    fn snapshot_live(&mut self) {
        let Self {
            pool, scratch_live, ..
        } = self;
        scratch_live.clear();
        scratch_live.extend(pool.iter_live().map(|(id, _)| id));
    }

    /// Step 1: cache the neighbor list of every live particle.
    fn find_neighborhoods(&mut self) {
        let h = self.config.kernel_range;
        let Self {
            pool,
            grid,
            neighborhoods,
            scratch_live,
            ..
        } = self;
        for &id in scratch_live.iter() {
            let list = &mut neighborhoods[id.index()];
            list.clear();
            list.extend(grid.neighbors_within(pool, pool.get(id).position, h));
        }
    }

    /// Step 2: kernel-weighted density, then clamped pressure. The
    /// neighbor list includes the particle itself, so every live particle
    /// ends the pass with a strictly positive density.
    fn compute_density_pressure(&mut self) {
        let h = self.config.kernel_range;
        let stiffness = self.config.stiffness;
        let rest_density = self.config.rest_density;
        for k in 0..self.scratch_live.len() {
            let id = self.scratch_live[k];
            let pos = self.pool.get(id).position;
            let mut density = 0.0;
            for &j in &self.neighborhoods[id.index()] {
                let q = self.pool.get(j);
                density += q.mass * poly6(pos - q.position, h);
            }
            let p = self.pool.get_mut(id);
            p.density = density;
            // No suction: pressure only pushes once density exceeds rest.
            p.pressure = (stiffness * (density - rest_density)).max(0.0);
        }
    }

    /// Step 3: accumulate pressure, viscosity, and gravity force
    /// densities.
    fn accumulate_forces(&mut self) {
        let h = self.config.kernel_range;
        let viscosity = self.config.viscosity;
        let gravity = self.config.gravity;
        for k in 0..self.scratch_live.len() {
            let id = self.scratch_live[k];
            let p = *self.pool.get(id);
            let mut f_pressure = Vec2::ZERO;
            let mut f_viscosity = Vec2::ZERO;
            for &j in &self.neighborhoods[id.index()] {
                let q = self.pool.get(j);
                let x = p.position - q.position;

                // Symmetrized pressure force density. q.density is never
                // zero here: the density pass always includes the self
                // term.
                f_pressure += q.mass * (p.pressure + q.pressure) / (2.0 * q.density)
                    * spiky_gradient(x, h);

                f_viscosity +=
                    q.mass / q.density * viscosity_laplacian(x, h) * (q.velocity - p.velocity);
            }
            // Gravity is weighted by density, not mass, so dividing by
            // density at integration turns it into a uniform acceleration.
            let f_gravity = p.density * gravity;
            self.pool.get_mut(id).force += -f_pressure + viscosity * f_viscosity + f_gravity;
        }
    }

    /// Steps 4-6: integrate, keep the grid consistent, collide with the
    /// domain boundary.
    fn integrate(&mut self, dt: f32) {
        let border = self.config.border;
        let extent = self.config.domain;
        let restitution = self.config.restitution;
        for k in 0..self.scratch_live.len() {
            let id = self.scratch_live[k];
            let p = *self.pool.get(id);

            let mut velocity = p.velocity;
            if p.density > 0.0 {
                velocity += dt * p.force / p.density;
            }
            // else: zero density would divide to NaN; the particle keeps
            // its velocity for this step.
            self.pool.get_mut(id).velocity = velocity;

            let mut pos = p.position + dt * velocity;
            self.move_live(id, pos);
            if !self.pool.is_live(id) {
                // Dropped by a saturated destination cell.
                continue;
            }

            // Boundary collision, each axis independently.
            let mut bounced = false;
            if pos.x < border {
                pos.x = border;
                velocity.x = -restitution * velocity.x;
                bounced = true;
            } else if pos.x > extent.x - border {
                pos.x = extent.x - border;
                velocity.x = -restitution * velocity.x;
                bounced = true;
            }
            if pos.y < border {
                pos.y = border;
                velocity.y = -restitution * velocity.y;
                bounced = true;
            } else if pos.y > extent.y - border {
                pos.y = extent.y - border;
                velocity.y = -restitution * velocity.y;
                bounced = true;
            }
            if bounced {
                self.pool.get_mut(id).velocity = velocity;
                self.move_live(id, pos);
            }
        }
    }

    fn reset_forces(&mut self) {
        for k in 0..self.scratch_live.len() {
            let id = self.scratch_live[k];
            if self.pool.is_live(id) {
                self.pool.get_mut(id).force = Vec2::ZERO;
            }
        }
    }

    /// Apply a new position while keeping the grid registration
    /// consistent.
    ///
    /// Same-cell moves touch only the position. Cross-cell moves detach
    /// and re-attach; when the destination cell has no free slot the
    /// particle is dropped and a diagnostic logged.
    fn move_live(&mut self, id: ParticleId, to: Vec2) {
        let new_cell = self.grid.cell_for(to);
        let old_cell = self.pool.get(id).cell;
        if new_cell == old_cell {
            self.pool.get_mut(id).position = to;
            return;
        }
        self.grid.detach(id, old_cell);
        {
            let p = self.pool.get_mut(id);
            p.position = to;
            p.cell = new_cell;
        }
        if !self.grid.attach(id, new_cell) {
            log::warn!(
                "cell ({}, {}) out of slots, dropping particle {}",
                new_cell.x,
                new_cell.y,
                id.index()
            );
            self.pool.free(id);
        }
    }
}
