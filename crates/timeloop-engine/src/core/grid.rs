use std::collections::HashMap;

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// Fixed-size cell grid over the play area with single-occupant cells.
///
/// The grid only records which entity sits in a cell; the level owns the
/// entities themselves.
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: u32,
    screen_width: u32,
    screen_height: u32,
    horizontal_cells: i32,
    vertical_cells: i32,
    occupancy: HashMap<(i32, i32), EntityId>,
}

impl Grid {
    pub fn new(screen_width: u32, screen_height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        Self {
            cell_size,
            screen_width,
            screen_height,
            horizontal_cells: (screen_width / cell_size) as i32,
            vertical_cells: (screen_height / cell_size) as i32,
            occupancy: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn horizontal_cells(&self) -> i32 {
        self.horizontal_cells
    }

    pub fn vertical_cells(&self) -> i32 {
        self.vertical_cells
    }

    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.screen_width as f32, self.screen_height as f32)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        (0..self.horizontal_cells).contains(&x) && (0..self.vertical_cells).contains(&y)
    }

    /// Occupy cell (x, y) with `entity` and move it to the cell's origin.
    /// Fails without touching anything if the cell is taken or outside the grid.
    pub fn place_entity(&mut self, entity: &mut Entity, x: i32, y: i32) -> bool {
        self.place_spanning(entity, x, y, 1, 1)
    }

    /// Whether every cell of the `cells_w` x `cells_h` block at (x, y) is
    /// inside the grid and free.
    pub fn is_span_free(&self, x: i32, y: i32, cells_w: i32, cells_h: i32) -> bool {
        span(x, y, cells_w, cells_h)
            .all(|(cx, cy)| self.in_bounds(cx, cy) && !self.occupancy.contains_key(&(cx, cy)))
    }

    /// Occupy a block of cells with its top-left at (x, y). All or nothing.
    pub fn place_spanning(
        &mut self,
        entity: &mut Entity,
        x: i32,
        y: i32,
        cells_w: i32,
        cells_h: i32,
    ) -> bool {
        if cells_w < 1 || cells_h < 1 || !self.is_span_free(x, y, cells_w, cells_h) {
            return false;
        }
        for cell in span(x, y, cells_w, cells_h) {
            self.occupancy.insert(cell, entity.id);
        }
        entity.pos = self.grid_to_screen(x, y);
        true
    }

    /// Cells a body of `width` x `height` pixels covers, at least one each way.
    pub fn cells_for(&self, width: u32, height: u32) -> (i32, i32) {
        let cells = |px: u32| px.div_ceil(self.cell_size).max(1) as i32;
        (cells(width), cells(height))
    }

    pub fn remove_entity(&mut self, x: i32, y: i32) -> Option<EntityId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.occupancy.remove(&(x, y))
    }

    pub fn entity_at(&self, x: i32, y: i32) -> Option<EntityId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.occupancy.get(&(x, y)).copied()
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.entity_at(x, y).is_some()
    }

    /// Pixel origin (top-left) of a cell.
    pub fn grid_to_screen(&self, x: i32, y: i32) -> Vec2 {
        let cs = self.cell_size as i32;
        Vec2::new((x * cs) as f32, (y * cs) as f32)
    }

    /// Cell containing a pixel. Floors, so negative pixels map to negative cells.
    pub fn screen_to_grid(&self, px: i32, py: i32) -> (i32, i32) {
        let cs = self.cell_size as i32;
        (px.div_euclid(cs), py.div_euclid(cs))
    }

    /// Recompute cell counts for a new screen size. Existing placements are
    /// not migrated; any that fall outside the new bounds stay recorded but
    /// are unreachable until the grid grows again.
    pub fn resize(&mut self, screen_width: u32, screen_height: u32) {
        self.screen_width = screen_width;
        self.screen_height = screen_height;
        self.horizontal_cells = (screen_width / self.cell_size) as i32;
        self.vertical_cells = (screen_height / self.cell_size) as i32;
        log::debug!(
            "grid resized to {}x{} cells",
            self.horizontal_cells,
            self.vertical_cells
        );
    }

    pub fn clear(&mut self) {
        self.occupancy.clear();
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.len()
    }
}

fn span(x: i32, y: i32, w: i32, h: i32) -> impl Iterator<Item = (i32, i32)> {
    (y..y + h).flat_map(move |cy| (x..x + w).map(move |cx| (cx, cy)))
}
