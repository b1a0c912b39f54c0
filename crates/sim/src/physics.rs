//! Unified physics constants for the SPH solver.
//!
//! All simulation modules should use these constants instead of defining
//! their own. This prevents drift between subsystems and makes tuning
//! easier. `SphConfig::default()` is built from them.
//!
//! The values are tuned as a set for a pixel-space domain stepped at
//! [`TIMESTEP`]; change them together, not individually.

/// Kernel support radius h in world units. Also the grid cell size, so a
/// 3x3 cell block always covers the full support of a particle.
pub const KERNEL_RANGE: f32 = 16.0;

/// Density the fluid relaxes toward. Pressure only appears once local
/// density exceeds this.
pub const REST_DENSITY: f32 = 10_000.0;

/// Gas stiffness: pressure per unit of density above rest.
pub const STIFFNESS: f32 = 1.44e9;

/// Viscosity coefficient scaling the velocity-diffusion force.
pub const VISCOSITY: f32 = 1.44e9;

/// Gravity force density per unit of particle density, y growing downward
/// in screen coordinates. Integrates as a uniform acceleration.
pub const GRAVITY: f32 = 3.0e7;

/// Mass given to every spawned particle.
pub const PARTICLE_MASS: f32 = 2.46914e7;

/// Point-force strength for the repulsion/attraction operators.
pub const REPULSION: f32 = 800_000.0;

/// Velocity fraction retained (with flipped sign) after a wall hit.
pub const RESTITUTION: f32 = 0.5;

/// Reference fixed timestep the constants above are tuned for.
pub const TIMESTEP: f32 = 1.0e-4;

/// Particle pool capacity.
pub const MAX_PARTICLES: usize = 5_000;

/// Slot-array length per grid cell. Local crowding past this drops
/// particles rather than growing the cell.
pub const SLOTS_PER_CELL: usize = 10;

/// Collision margin in world units: particles are kept inside
/// `[BORDER, domain - BORDER]` on both axes.
pub const BORDER: f32 = 100.0;

/// Extra rings of grid cells past the domain edges, so positions near but
/// outside the domain still map to a valid cell.
pub const GRID_BORDER_CELLS: i32 = 2;
