//! Construction-time solver parameters.
//!
//! Everything the solver needs is fixed when the simulation is built:
//! domain geometry comes from the embedding application (window or display
//! configuration), the physical constants default from [`crate::physics`].
//! Nothing here is loaded from files at runtime.

use glam::Vec2;

use crate::physics;

/// Parameters for an SPH simulation, fixed at construction.
///
/// Build one with struct-update syntax over the defaults:
///
/// ```
/// use glam::Vec2;
/// use sim::SphConfig;
///
/// let config = SphConfig {
///     domain: Vec2::new(800.0, 600.0),
///     ..SphConfig::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct SphConfig {
    /// Simulation domain size in world units.
    pub domain: Vec2,

    /// Collision margin: boundary collision keeps every particle inside
    /// `[border, domain - border]` on both axes.
    pub border: f32,

    /// Extra rings of grid cells past the domain edges. Positions near
    /// but outside the domain clamp onto these instead of going out of
    /// bounds.
    pub grid_border_cells: i32,

    /// Kernel support radius h. Also the grid cell size.
    pub kernel_range: f32,

    /// Density the fluid relaxes toward.
    pub rest_density: f32,

    /// Gas stiffness: pressure per unit of density above rest.
    pub stiffness: f32,

    /// Viscosity coefficient.
    pub viscosity: f32,

    /// Gravity as a force density per unit of particle density; integrates
    /// as a uniform acceleration. Defaults to downward in screen
    /// coordinates (positive y).
    pub gravity: Vec2,

    /// Mass given to every spawned particle.
    pub particle_mass: f32,

    /// Velocity fraction retained (with flipped sign) on boundary
    /// collision, in `[0, 1]`.
    pub restitution: f32,

    /// Strength of the repulsion/attraction point forces.
    pub repulsion: f32,

    /// Particle pool capacity.
    pub max_particles: usize,

    /// Slot-array length per grid cell.
    pub slots_per_cell: usize,
}

impl Default for SphConfig {
    fn default() -> Self {
        Self {
            domain: Vec2::new(1024.0, 768.0),
            border: physics::BORDER,
            grid_border_cells: physics::GRID_BORDER_CELLS,
            kernel_range: physics::KERNEL_RANGE,
            rest_density: physics::REST_DENSITY,
            stiffness: physics::STIFFNESS,
            viscosity: physics::VISCOSITY,
            gravity: Vec2::new(0.0, physics::GRAVITY),
            particle_mass: physics::PARTICLE_MASS,
            restitution: physics::RESTITUTION,
            repulsion: physics::REPULSION,
            max_particles: physics::MAX_PARTICLES,
            slots_per_cell: physics::SLOTS_PER_CELL,
        }
    }
}
