//! 2D SPH fluid solver with a bucketed spatial grid.
//!
//! Smoothed-particle hydrodynamics: kernel-weighted density and pressure
//! over grid-indexed neighbors, pressure/viscosity/gravity force
//! accumulation, semi-implicit Euler integration, damped boundary
//! reflection. A fixed-capacity particle pool and an incrementally
//! maintained cell index keep the per-step work allocation-free.
//!
//! This crate is framework-agnostic - it handles simulation only.
//! Renderers draw from the read-only [`SphSimulation::live_particles`]
//! view; window size and input events stay on the embedding side.

pub mod config;
pub mod grid;
pub mod kernels;
pub mod particle;
pub mod physics;
pub mod solver;

pub use config::SphConfig;
pub use grid::{Neighbors, SpatialGrid};
pub use particle::{Particle, ParticleId, ParticlePool};
pub use solver::SphSimulation;
