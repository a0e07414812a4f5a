use rand::Rng;
use tracing::{debug, warn};

use crate::infra::{Cell, ConfigError, FloorBounds, GridError, Role, WorldPoint};

/// Identifier handed out by an `ObjectPool`. Unique within that pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What sits in an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Obstacle(EntityId),
    Target(EntityId),
    /// Spawn pocket held for an agent while the arena is being generated.
    Reserved(Role),
}

impl Occupant {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Occupant::Obstacle(id) | Occupant::Target(id) => Some(*id),
            Occupant::Reserved(_) => None,
        }
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Occupant::Obstacle(_))
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Occupant::Target(_))
    }
}

/// Fixed-size occupancy table with a visited layer and an indexed set of
/// empty cells for constant-time uniform sampling.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    rows: i32,
    cols: i32,
    cell_size: f32,
    origin: WorldPoint,
    occupants: Vec<Option<Occupant>>,
    visited: Vec<bool>,
    empty_cells: Vec<Cell>,
    /// Position of each cell inside `empty_cells`, `None` while occupied.
    empty_slots: Vec<Option<usize>>,
}

impl OccupancyGrid {
    pub fn new(rows: i32, cols: i32, cell_size: f32, origin: WorldPoint) -> Self {
        let rows = rows.max(0);
        let cols = cols.max(0);
        let len = (rows * cols) as usize;
        let mut grid = Self {
            rows,
            cols,
            cell_size,
            origin,
            occupants: vec![None; len],
            visited: vec![false; len],
            empty_cells: Vec::with_capacity(len),
            empty_slots: vec![None; len],
        };
        grid.rebuild_empty_cells();
        grid
    }

    /// Derive the grid from a floor rectangle, keeping `padding` cells free on each side.
    pub fn from_floor(
        floor: &FloorBounds,
        cell_size: f32,
        padding: i32,
    ) -> Result<Self, ConfigError> {
        if cell_size.is_nan() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        let rows = (floor.size_x / cell_size).floor() as i32 - padding * 2;
        let cols = (floor.size_z / cell_size).floor() as i32 - padding * 2;
        if rows <= 0 || cols <= 0 {
            return Err(ConfigError::EmptyGrid { rows, cols });
        }
        let inset = padding as f32 * cell_size;
        let origin = floor.min.translate(inset, inset);
        debug!(rows, cols, cell_size, "Grid derived from floor bounds");
        Ok(Self::new(rows, cols, cell_size, origin))
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    fn index(&self, cell: &Cell) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.row * self.cols + cell.col) as usize)
        } else {
            None
        }
    }

    pub fn world_to_cell(&self, pos: WorldPoint) -> Cell {
        let row = ((pos.x - self.origin.x) / self.cell_size).round() as i32;
        let col = ((pos.z - self.origin.z) / self.cell_size).round() as i32;
        Cell::new(row, col)
    }

    pub fn cell_to_world(&self, cell: Cell) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + cell.row as f32 * self.cell_size,
            0.0,
            self.origin.z + cell.col as f32 * self.cell_size,
        )
    }

    /// Store `occupant` in `cell`. Out-of-range cells are ignored; an occupied
    /// cell is reported and left as it is.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn mark_occupied(&mut self, cell: Cell, occupant: Occupant) -> Result<(), GridError> {
        let Some(idx) = self.index(&cell) else {
            return Ok(());
        };
        if let Some(existing) = self.occupants[idx] {
            return Err(GridError::AlreadyOccupied { cell, existing });
        }
        self.occupants[idx] = Some(occupant);
        self.remove_empty(idx);
        Ok(())
    }

    /// Vacate `cell`, returning whatever was there.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn mark_empty(&mut self, cell: Cell) -> Option<Occupant> {
        let idx = self.index(&cell)?;
        let previous = self.occupants[idx].take();
        self.insert_empty(idx, cell);
        previous
    }

    pub fn get_occupant(&self, cell: Cell) -> Option<Occupant> {
        self.index(&cell).and_then(|idx| self.occupants[idx])
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.get_occupant(cell).is_some()
    }

    pub fn random_empty_cell<R: Rng>(&self, rng: &mut R) -> Option<Cell> {
        if self.empty_cells.is_empty() {
            return None;
        }
        let pick = rng.random_range(0..self.empty_cells.len());
        Some(self.empty_cells[pick])
    }

    pub fn empty_cells(&self) -> &[Cell] {
        &self.empty_cells
    }

    pub fn empty_count(&self) -> usize {
        self.empty_cells.len()
    }

    pub fn mark_visited(&mut self, cell: Cell) {
        if let Some(idx) = self.index(&cell) {
            self.visited[idx] = true;
        }
    }

    pub fn has_been_visited(&self, cell: Cell) -> bool {
        self.index(&cell).is_some_and(|idx| self.visited[idx])
    }

    pub fn reset_visitation(&mut self) {
        self.visited.fill(false);
    }

    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|v| **v).count()
    }

    /// Recompute the empty-set from the occupant table.
    pub fn rebuild_empty_cells(&mut self) {
        self.empty_cells.clear();
        self.empty_slots.fill(None);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = (row * self.cols + col) as usize;
                if self.occupants[idx].is_none() {
                    self.empty_slots[idx] = Some(self.empty_cells.len());
                    self.empty_cells.push(Cell::new(row, col));
                }
            }
        }
    }

    fn insert_empty(&mut self, idx: usize, cell: Cell) {
        if self.empty_slots[idx].is_some() {
            return;
        }
        self.empty_slots[idx] = Some(self.empty_cells.len());
        self.empty_cells.push(cell);
    }

    fn remove_empty(&mut self, idx: usize) {
        let Some(slot) = self.empty_slots[idx].take() else {
            warn!(idx, "Occupied cell was missing from the empty set");
            return;
        };
        self.empty_cells.swap_remove(slot);
        if let Some(moved) = self.empty_cells.get(slot).copied() {
            let moved_idx = (moved.row * self.cols + moved.col) as usize;
            self.empty_slots[moved_idx] = Some(slot);
        }
    }
}
