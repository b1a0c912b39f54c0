//! Bucketed spatial grid over particle ids.
//!
//! Cells are sized to the kernel support radius, so a 3x3 block around a
//! particle's cell covers its entire interaction neighborhood. Each cell
//! holds a fixed slot array of particle ids; the grid is kept consistent
//! incrementally through attach/detach/move as particles travel, never by
//! per-frame rebuild.
//!
//! The grid carries a border margin of extra cells past the domain, so
//! positions near (but outside) the physical domain still clamp onto a
//! valid cell instead of indexing out of bounds.

use std::ops::Range;

use glam::{IVec2, Vec2};

use crate::particle::{ParticleId, ParticlePool};

/// Spatial index mapping grid cells to the particles inside them.
pub struct SpatialGrid {
    /// Cell edge length; equals the kernel support radius.
    cell_size: f32,
    /// Cells covering the domain proper, before the border margin.
    domain_cells: IVec2,
    /// Rings of extra cells on every side of the domain.
    border_cells: i32,
    slots_per_cell: usize,
    /// Flat slot storage: one `slots_per_cell` run per cell, row-major
    /// over the bordered grid.
    slots: Vec<Option<ParticleId>>,
}

impl SpatialGrid {
    pub fn new(domain: Vec2, cell_size: f32, border_cells: i32, slots_per_cell: usize) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        assert!(border_cells >= 0, "border margin cannot be negative");
        assert!(slots_per_cell > 0, "cells need at least one slot");
        let domain_cells = IVec2::new(
            (domain.x / cell_size).ceil() as i32,
            (domain.y / cell_size).ceil() as i32,
        )
        .max(IVec2::ONE);
        let total = domain_cells + IVec2::splat(border_cells * 2);
        let cell_count = (total.x as usize) * (total.y as usize);
        Self {
            cell_size,
            domain_cells,
            border_cells,
            slots_per_cell,
            slots: vec![None; cell_count * slots_per_cell],
        }
    }

    /// Cell containing `pos`: `floor(pos / cell_size)` on both axes, no
    /// clamping. Positions exactly on a cell boundary belong to the cell
    /// `floor` gives; no special tie-break.
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> IVec2 {
        IVec2::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Cell of `pos`, clamped into the bordered grid. This is the cell a
    /// particle at `pos` gets registered under, even when `pos` is
    /// physically out of range.
    #[inline]
    pub fn cell_for(&self, pos: Vec2) -> IVec2 {
        self.cell_of(pos).clamp(self.min_cell(), self.max_cell())
    }

    #[inline]
    fn min_cell(&self) -> IVec2 {
        IVec2::splat(-self.border_cells)
    }

    #[inline]
    fn max_cell(&self) -> IVec2 {
        self.domain_cells + IVec2::splat(self.border_cells - 1)
    }

    /// Slot storage range for an in-bounds cell.
    #[inline]
    fn slot_range(&self, cell: IVec2) -> Range<usize> {
        debug_assert!(
            cell.clamp(self.min_cell(), self.max_cell()) == cell,
            "cell ({}, {}) outside the bordered grid",
            cell.x,
            cell.y
        );
        let total_x = (self.domain_cells.x + 2 * self.border_cells) as usize;
        let col = (cell.x + self.border_cells) as usize;
        let row = (cell.y + self.border_cells) as usize;
        let base = (row * total_x + col) * self.slots_per_cell;
        base..base + self.slots_per_cell
    }

    /// Register `id` in `cell`'s slot array.
    ///
    /// Returns false when every slot is taken. The caller must then drop
    /// the particle: cells never grow, local crowding past the slot count
    /// is deliberately lossy.
    #[must_use]
    pub fn attach(&mut self, id: ParticleId, cell: IVec2) -> bool {
        let range = self.slot_range(cell);
        for slot in &mut self.slots[range] {
            if slot.is_none() {
                *slot = Some(id);
                return true;
            }
        }
        false
    }

    /// Remove `id` from `cell`'s slot array.
    ///
    /// Panics when the id is not there: grid and particle state have
    /// desynchronized, which is a bug to surface, not a runtime condition
    /// to recover from.
    pub fn detach(&mut self, id: ParticleId, cell: IVec2) {
        let range = self.slot_range(cell);
        for slot in &mut self.slots[range] {
            if *slot == Some(id) {
                *slot = None;
                return;
            }
        }
        panic!(
            "grid desync: particle {} not attached at cell ({}, {})",
            id.index(),
            cell.x,
            cell.y
        );
    }

    /// Lazily enumerate ids of particles within `radius` of `pos`.
    ///
    /// Walks the block of cells covering the query circle (3x3 for a
    /// kernel-range query) and distance-filters each occupied slot by
    /// squared distance. A zero radius degenerates to the single cell of
    /// `pos` and exact-position matches.
    pub fn neighbors_within<'a>(
        &'a self,
        pool: &'a ParticlePool,
        pos: Vec2,
        radius: f32,
    ) -> Neighbors<'a> {
        let center = self.cell_for(pos);
        let reach = if radius > 0.0 {
            (radius / self.cell_size).ceil() as i32
        } else {
            0
        };
        let min = (center - IVec2::splat(reach)).max(self.min_cell());
        let max = (center + IVec2::splat(reach)).min(self.max_cell());
        Neighbors {
            grid: self,
            pool,
            origin: pos,
            radius_sq: radius * radius,
            min,
            max,
            cursor: min,
            slot: 0,
        }
    }

    /// Empty every cell, without reallocating.
    pub(crate) fn clear(&mut self) {
        self.slots.fill(None);
    }
}

/// Lazy neighbor query over a block of cells. Restartable: building one is
/// cheap and holds no heap state.
pub struct Neighbors<'a> {
    grid: &'a SpatialGrid,
    pool: &'a ParticlePool,
    origin: Vec2,
    radius_sq: f32,
    min: IVec2,
    max: IVec2,
    cursor: IVec2,
    slot: usize,
}

impl Iterator for Neighbors<'_> {
    type Item = ParticleId;

    fn next(&mut self) -> Option<ParticleId> {
        loop {
            if self.cursor.y > self.max.y {
                return None;
            }
            if self.slot >= self.grid.slots_per_cell {
                self.slot = 0;
                self.cursor.x += 1;
                if self.cursor.x > self.max.x {
                    self.cursor.x = self.min.x;
                    self.cursor.y += 1;
                }
                continue;
            }
            let range = self.grid.slot_range(self.cursor);
            let occupant = self.grid.slots[range.start + self.slot];
            self.slot += 1;
            if let Some(id) = occupant {
                let d = self.pool.get(id).position - self.origin;
                if d.length_squared() <= self.radius_sq {
                    return Some(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_grid() -> SpatialGrid {
        SpatialGrid::new(Vec2::new(100.0, 100.0), 10.0, 2, 4)
    }

    #[test]
    fn test_cell_of_floors_both_axes() {
        let grid = test_grid();
        assert_eq!(grid.cell_of(Vec2::new(5.0, 5.0)), IVec2::new(0, 0));
        assert_eq!(grid.cell_of(Vec2::new(15.0, 25.0)), IVec2::new(1, 2));
        // Boundary positions belong to the cell floor gives.
        assert_eq!(grid.cell_of(Vec2::new(10.0, 10.0)), IVec2::new(1, 1));
        // Negative positions floor toward negative infinity.
        assert_eq!(grid.cell_of(Vec2::new(-0.5, -10.5)), IVec2::new(-1, -2));
    }

    #[test]
    fn test_cell_for_clamps_out_of_range_positions() {
        let grid = test_grid();
        assert_eq!(grid.cell_for(Vec2::new(-500.0, 50.0)), IVec2::new(-2, 5));
        assert_eq!(grid.cell_for(Vec2::new(50.0, 1e6)), IVec2::new(5, 11));
    }

    #[test]
    fn test_attach_detach_roundtrip() {
        let mut grid = test_grid();
        let mut pool = ParticlePool::new(4);
        let pos = Vec2::new(33.0, 44.0);
        let id = pool.alloc(pos, 1.0).unwrap();
        let cell = grid.cell_for(pos);
        assert!(grid.attach(id, cell));
        pool.get_mut(id).cell = cell;

        let found: Vec<_> = grid.neighbors_within(&pool, pos, 0.0).collect();
        assert_eq!(found, vec![id]);

        grid.detach(id, cell);
        assert_eq!(grid.neighbors_within(&pool, pos, 0.0).count(), 0);
    }

    #[test]
    fn test_attach_fails_when_cell_saturated() {
        let mut grid = test_grid();
        let mut pool = ParticlePool::new(8);
        let pos = Vec2::new(5.0, 5.0);
        let cell = grid.cell_for(pos);
        for _ in 0..4 {
            let id = pool.alloc(pos, 1.0).unwrap();
            assert!(grid.attach(id, cell));
        }
        let extra = pool.alloc(pos, 1.0).unwrap();
        assert!(!grid.attach(extra, cell));
    }

    #[test]
    #[should_panic(expected = "grid desync")]
    fn test_detach_of_unattached_id_panics() {
        let mut grid = test_grid();
        let mut pool = ParticlePool::new(2);
        let id = pool.alloc(Vec2::new(5.0, 5.0), 1.0).unwrap();
        grid.detach(id, grid.cell_for(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_neighbors_within_filters_by_distance() {
        let mut grid = test_grid();
        let mut pool = ParticlePool::new(8);
        let center = Vec2::new(50.0, 50.0);
        let offsets = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(0.0, 9.0),
            Vec2::new(25.0, 0.0), // outside a radius-10 query
        ];
        let mut ids = Vec::new();
        for off in offsets {
            let pos = center + off;
            let id = pool.alloc(pos, 1.0).unwrap();
            let cell = grid.cell_for(pos);
            assert!(grid.attach(id, cell));
            pool.get_mut(id).cell = cell;
            ids.push(id);
        }

        let near: Vec<_> = grid.neighbors_within(&pool, center, 10.0).collect();
        assert!(near.contains(&ids[0]));
        assert!(near.contains(&ids[1]));
        assert!(near.contains(&ids[2]));
        assert!(!near.contains(&ids[3]));
    }

    #[test]
    fn test_neighbors_query_at_grid_corner_stays_in_bounds() {
        let mut grid = test_grid();
        let mut pool = ParticlePool::new(2);
        let pos = Vec2::new(0.5, 0.5);
        let id = pool.alloc(pos, 1.0).unwrap();
        assert!(grid.attach(id, grid.cell_for(pos)));
        // The 3x3 block around the corner cell overlaps the border ring;
        // enumeration must neither skip the particle nor index outside.
        let found: Vec<_> = grid.neighbors_within(&pool, pos, 10.0).collect();
        assert_eq!(found, vec![id]);
    }

    #[test]
    fn test_neighbors_yields_each_occupant_once() {
        let mut grid = test_grid();
        let mut pool = ParticlePool::new(4);
        let pos = Vec2::new(95.0, 95.0);
        let id = pool.alloc(pos, 1.0).unwrap();
        assert!(grid.attach(id, grid.cell_for(pos)));
        let hits = grid
            .neighbors_within(&pool, pos, 30.0)
            .filter(|&q| q == id)
            .count();
        assert_eq!(hits, 1);
    }
}
