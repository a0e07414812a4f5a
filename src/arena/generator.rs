//! Procedural placement of obstacles and targets.
//!
//! Every entity taken from the pool is recorded as a [`Placement`]; clearing
//! walks that list, so the list and the pool's outstanding acquisitions always
//! match.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::arena::EpisodeMode;
use crate::infra::{ArenaError, Cell, ConfigError, GridError, PoolError, Role};
use crate::state::{EntityKind, OccupancyGrid, Occupant, ObjectPool, PooledEntity};

/// Wall segments are stretched by this many cells along the wall.
pub const WALL_EXTENSION: f32 = 1.5;

#[derive(Debug)]
pub struct Placement {
    pub cell: Cell,
    pub entity: PooledEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthAxis {
    /// Along the world x axis (rows).
    Rows,
    /// Along the world z axis (columns).
    Cols,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObstacleLayout {
    /// Obstacles scattered on uniformly random empty cells.
    #[default]
    Scatter,
    /// Straight horizontal or vertical walls.
    Walls,
}

impl ObstacleLayout {
    pub fn strategy(self) -> Box<dyn LayoutStrategy> {
        match self {
            ObstacleLayout::Scatter => Box::new(ScatterLayout),
            ObstacleLayout::Walls => Box::new(WallLayout),
        }
    }
}

impl fmt::Display for ObstacleLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObstacleLayout::Scatter => f.write_str("scatter"),
            ObstacleLayout::Walls => f.write_str("walls"),
        }
    }
}

impl FromStr for ObstacleLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scatter" | "random" => Ok(ObstacleLayout::Scatter),
            "walls" | "wall" => Ok(ObstacleLayout::Walls),
            _ => Err(ConfigError::InvalidValue {
                key: "layout".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Mutable view of everything a layout strategy needs to place entities.
pub struct PlacementSite<'a> {
    pub grid: &'a mut OccupancyGrid,
    pub pool: &'a mut ObjectPool,
    pub rng: &'a mut StdRng,
    placements: &'a mut Vec<Placement>,
}

impl PlacementSite<'_> {
    /// Put a pooled entity of `kind` on `cell`. Returns `Ok(false)` when the
    /// cell is outside the grid or already taken.
    pub fn place(
        &mut self,
        kind: EntityKind,
        cell: Cell,
        stretch: Option<GrowthAxis>,
    ) -> Result<bool, PoolError> {
        if !self.grid.contains(&cell) || self.grid.is_occupied(cell) {
            return Ok(false);
        }

        let mut entity = self.pool.acquire(kind)?;
        entity.transform.position = self.grid.cell_to_world(cell);
        match stretch {
            Some(GrowthAxis::Rows) => {
                entity.transform.scale.x *= WALL_EXTENSION * self.grid.cell_size()
            }
            Some(GrowthAxis::Cols) => {
                entity.transform.scale.z *= WALL_EXTENSION * self.grid.cell_size()
            }
            None => {}
        }

        let occupant = match kind {
            EntityKind::Obstacle => Occupant::Obstacle(entity.id()),
            EntityKind::Target => Occupant::Target(entity.id()),
        };
        if let Err(GridError::AlreadyOccupied { existing, .. }) =
            self.grid.mark_occupied(cell, occupant)
        {
            warn!(%cell, ?existing, "Placement collided with an occupant, returning entity");
            self.pool.release(entity)?;
            return Ok(false);
        }

        self.placements.push(Placement { cell, entity });
        Ok(true)
    }

    /// Place up to `count` entities on random empty cells. Stops early when
    /// the grid has no empty cell left.
    pub fn scatter(&mut self, kind: EntityKind, count: usize) -> Result<usize, PoolError> {
        let mut placed = 0;
        for i in 0..count {
            let Some(cell) = self.grid.random_empty_cell(&mut *self.rng) else {
                debug!(?kind, skipped = count - i, "No empty cell left, skipping placements");
                break;
            };
            if self.place(kind, cell, None)? {
                placed += 1;
            }
        }
        Ok(placed)
    }
}

/// Obstacle placement strategy.
pub trait LayoutStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Place at most `budget` obstacles, returning how many were placed.
    fn place_obstacles(&self, site: &mut PlacementSite<'_>, budget: usize)
    -> Result<usize, PoolError>;
}

pub struct ScatterLayout;

impl LayoutStrategy for ScatterLayout {
    fn name(&self) -> &'static str {
        "scatter"
    }

    fn place_obstacles(
        &self,
        site: &mut PlacementSite<'_>,
        budget: usize,
    ) -> Result<usize, PoolError> {
        site.scatter(EntityKind::Obstacle, budget)
    }
}

pub struct WallLayout;

impl WallLayout {
    fn random_below(rng: &mut StdRng, upper: i32) -> i32 {
        if upper <= 0 { 0 } else { rng.random_range(0..upper) }
    }
}

impl LayoutStrategy for WallLayout {
    fn name(&self) -> &'static str {
        "walls"
    }

    fn place_obstacles(
        &self,
        site: &mut PlacementSite<'_>,
        budget: usize,
    ) -> Result<usize, PoolError> {
        let rows = site.grid.rows();
        let cols = site.grid.cols();
        let mut used = 0;

        for _ in 0..budget {
            if used >= budget {
                break;
            }

            // Horizontal walls grow along the columns, vertical ones along the rows.
            let horizontal = site.rng.random_bool(0.5);
            let (along_extent, across_extent) = if horizontal { (cols, rows) } else { (rows, cols) };
            let max_length = along_extent - along_extent / 2;
            let length = if max_length > 1 {
                site.rng.random_range(1..max_length)
            } else {
                1
            };
            let start_along = Self::random_below(site.rng, along_extent - length + 1);
            let across = Self::random_below(site.rng, across_extent);
            let axis = if horizontal {
                GrowthAxis::Cols
            } else {
                GrowthAxis::Rows
            };
            debug!(horizontal, length, start_along, across, "Laying wall");

            for j in 0..length {
                if used >= budget {
                    break;
                }
                let along = start_along + j;
                let cell = if horizontal {
                    Cell::new(across, along)
                } else {
                    Cell::new(along, across)
                };
                if site.place(EntityKind::Obstacle, cell, Some(axis))? {
                    used += 1;
                }
            }
        }
        Ok(used)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub obstacles: usize,
    pub targets: usize,
}

pub struct ArenaGenerator {
    layout: ObstacleLayout,
    strategy: Box<dyn LayoutStrategy>,
    obstacle_count: usize,
    target_count: usize,
    placements: Vec<Placement>,
}

impl ArenaGenerator {
    pub fn new(layout: ObstacleLayout, obstacle_count: usize, target_count: usize) -> Self {
        Self {
            layout,
            strategy: layout.strategy(),
            obstacle_count,
            target_count,
            placements: Vec::new(),
        }
    }

    pub fn layout(&self) -> ObstacleLayout {
        self.layout
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placed(&self, kind: EntityKind) -> usize {
        self.placements
            .iter()
            .filter(|p| p.entity.kind() == kind)
            .count()
    }

    /// Populate the arena: obstacles with the configured layout, then targets
    /// when the mode hunts them.
    #[tracing::instrument(level = "trace", skip(self, grid, pool, rng))]
    pub fn generate(
        &mut self,
        mode: EpisodeMode,
        grid: &mut OccupancyGrid,
        pool: &mut ObjectPool,
        rng: &mut StdRng,
    ) -> Result<GenerationReport, ArenaError> {
        let mut site = PlacementSite {
            grid,
            pool,
            rng,
            placements: &mut self.placements,
        };

        let obstacles = self.strategy.place_obstacles(&mut site, self.obstacle_count)?;
        let targets = if mode.places_targets() {
            site.scatter(EntityKind::Target, self.target_count)?
        } else {
            0
        };

        debug!(
            layout = self.strategy.name(),
            obstacles,
            targets,
            empty = site.grid.empty_count(),
            "Arena generated"
        );
        Ok(GenerationReport { obstacles, targets })
    }

    /// Return every placed entity to the pool and vacate its cell.
    pub fn clear(&mut self, grid: &mut OccupancyGrid, pool: &mut ObjectPool) -> Result<usize, PoolError> {
        let placements = std::mem::take(&mut self.placements);
        let count = placements.len();
        let mut first_error = None;
        for placement in placements {
            if let Err(err) = Self::release_placement(grid, pool, placement) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }

    /// Vacate the Chebyshev neighbourhood of `center`, releasing placed
    /// entities and lifting spawn reservations.
    #[tracing::instrument(level = "trace", skip(self, grid, pool))]
    pub fn clear_radius(
        &mut self,
        grid: &mut OccupancyGrid,
        pool: &mut ObjectPool,
        center: Cell,
        radius: i32,
    ) -> Result<usize, PoolError> {
        let mut released = 0;
        for cell in center.neighborhood(radius) {
            match grid.get_occupant(cell) {
                None => {}
                Some(Occupant::Reserved(_)) => {
                    grid.mark_empty(cell);
                }
                Some(occupant) => {
                    let position = self
                        .placements
                        .iter()
                        .position(|p| p.cell == cell && Some(p.entity.id()) == occupant.entity());
                    match position {
                        Some(idx) => {
                            let placement = self.placements.swap_remove(idx);
                            Self::release_placement(grid, pool, placement)?;
                            released += 1;
                        }
                        None => {
                            warn!(%cell, ?occupant, "Untracked occupant inside spawn radius");
                            grid.mark_empty(cell);
                        }
                    }
                }
            }
        }
        if released > 0 {
            debug!(%center, radius, released, "Cleared spawn radius");
        }
        Ok(released)
    }

    /// Remove a single target, e.g. once it has been found.
    pub fn clear_target_at(
        &mut self,
        grid: &mut OccupancyGrid,
        pool: &mut ObjectPool,
        cell: Cell,
    ) -> Result<bool, PoolError> {
        let position = self
            .placements
            .iter()
            .position(|p| p.cell == cell && p.entity.kind() == EntityKind::Target);
        match position {
            Some(idx) => {
                let placement = self.placements.swap_remove(idx);
                Self::release_placement(grid, pool, placement)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Hold every empty cell around `center` for `role` so generation leaves
    /// the spawn pocket free. Returns the reserved cells.
    pub fn reserve_pocket(grid: &mut OccupancyGrid, center: Cell, radius: i32, role: Role) -> Vec<Cell> {
        let mut reserved = Vec::new();
        for cell in center.neighborhood(radius) {
            if grid.contains(&cell) && grid.mark_occupied(cell, Occupant::Reserved(role)).is_ok() {
                reserved.push(cell);
            }
        }
        reserved
    }

    pub fn lift_reservations(grid: &mut OccupancyGrid, cells: &[Cell]) {
        for cell in cells {
            if let Some(Occupant::Reserved(_)) = grid.get_occupant(*cell) {
                grid.mark_empty(*cell);
            }
        }
    }

    fn release_placement(
        grid: &mut OccupancyGrid,
        pool: &mut ObjectPool,
        placement: Placement,
    ) -> Result<(), PoolError> {
        let Placement { cell, entity } = placement;
        if grid.get_occupant(cell).and_then(|o| o.entity()) == Some(entity.id()) {
            grid.mark_empty(cell);
        } else {
            warn!(%cell, id = %entity.id(), "Placement no longer owns its cell");
        }
        pool.release(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::WorldPoint;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn empty_set(grid: &OccupancyGrid) -> HashSet<Cell> {
        grid.empty_cells().iter().copied().collect()
    }

    fn setup(rows: i32, cols: i32, obstacles: usize, targets: usize) -> (OccupancyGrid, ObjectPool, StdRng) {
        (
            OccupancyGrid::new(rows, cols, 1.0, WorldPoint::ZERO),
            ObjectPool::new(obstacles, targets),
            StdRng::seed_from_u64(7),
        )
    }

    #[test]
    fn test_clear_restores_empty_set_for_each_layout() {
        for layout in [ObstacleLayout::Scatter, ObstacleLayout::Walls] {
            let (mut grid, mut pool, mut rng) = setup(12, 10, 20, 2);
            grid.mark_occupied(Cell::new(0, 0), Occupant::Reserved(Role::Hider))
                .unwrap();
            let before = empty_set(&grid);

            let mut generator = ArenaGenerator::new(layout, 20, 2);
            let report = generator
                .generate(EpisodeMode::SeekerTraining, &mut grid, &mut pool, &mut rng)
                .unwrap();
            assert!(report.obstacles > 0);
            assert_eq!(report.targets, 2);
            assert_eq!(generator.placements().len(), report.obstacles + report.targets);
            assert_eq!(pool.in_use(EntityKind::Obstacle), report.obstacles);

            let released = generator.clear(&mut grid, &mut pool).unwrap();
            assert_eq!(released, report.obstacles + report.targets);
            assert_eq!(empty_set(&grid), before);
            assert_eq!(grid.empty_count(), before.len());
            assert_eq!(pool.in_use(EntityKind::Obstacle), 0);
            assert_eq!(pool.in_use(EntityKind::Target), 0);

            // Clearing twice is a no-op.
            assert_eq!(generator.clear(&mut grid, &mut pool).unwrap(), 0);
            assert_eq!(empty_set(&grid), before);
        }
    }

    #[test]
    fn test_scatter_stops_when_grid_is_full() {
        let (mut grid, mut pool, mut rng) = setup(2, 2, 10, 1);
        let mut generator = ArenaGenerator::new(ObstacleLayout::Scatter, 10, 1);
        let report = generator
            .generate(EpisodeMode::SeekerTraining, &mut grid, &mut pool, &mut rng)
            .unwrap();
        assert_eq!(report.obstacles, 4);
        assert_eq!(report.targets, 0);
        assert_eq!(grid.empty_count(), 0);
        assert_eq!(pool.in_use(EntityKind::Obstacle), 4);
    }

    #[test]
    fn test_pool_exhaustion_is_fatal() {
        let (mut grid, mut pool, mut rng) = setup(6, 6, 2, 1);
        let mut generator = ArenaGenerator::new(ObstacleLayout::Scatter, 5, 1);
        let result = generator.generate(EpisodeMode::SeekerTraining, &mut grid, &mut pool, &mut rng);
        assert!(matches!(
            result,
            Err(ArenaError::Pool(PoolError::PoolExhausted {
                kind: EntityKind::Obstacle
            }))
        ));
        // What was placed before the failure is still tracked and clearable.
        assert_eq!(generator.placements().len(), 2);
        generator.clear(&mut grid, &mut pool).unwrap();
        assert_eq!(grid.empty_count(), 36);
    }

    #[test]
    fn test_walls_respect_budget_and_stretch() {
        let (mut grid, mut pool, mut rng) = setup(10, 10, 15, 0);
        let mut generator = ArenaGenerator::new(ObstacleLayout::Walls, 15, 0);
        let report = generator
            .generate(EpisodeMode::SelfPlay, &mut grid, &mut pool, &mut rng)
            .unwrap();
        assert!(report.obstacles <= 15);
        assert_eq!(report.targets, 0);
        assert_eq!(grid.empty_count(), 100 - report.obstacles);
        for placement in generator.placements() {
            let scale = placement.entity.transform.scale;
            assert!((scale.x - 1.5).abs() < 1e-6 || (scale.z - 1.5).abs() < 1e-6);
            assert_eq!(
                grid.get_occupant(placement.cell),
                Some(Occupant::Obstacle(placement.entity.id()))
            );
        }
    }

    #[test]
    fn test_no_targets_outside_seeker_training() {
        let (mut grid, mut pool, mut rng) = setup(8, 8, 4, 2);
        let mut generator = ArenaGenerator::new(ObstacleLayout::Scatter, 4, 2);
        let report = generator
            .generate(EpisodeMode::HiderTraining, &mut grid, &mut pool, &mut rng)
            .unwrap();
        assert_eq!(report.targets, 0);
        assert_eq!(generator.placed(EntityKind::Target), 0);
    }

    #[test]
    fn test_clear_radius_releases_neighbourhood() {
        let (mut grid, mut pool, mut rng) = setup(5, 5, 25, 0);
        let mut generator = ArenaGenerator::new(ObstacleLayout::Scatter, 25, 0);
        generator
            .generate(EpisodeMode::SelfPlay, &mut grid, &mut pool, &mut rng)
            .unwrap();
        assert_eq!(grid.empty_count(), 0);

        let released = generator
            .clear_radius(&mut grid, &mut pool, Cell::new(0, 0), 1)
            .unwrap();
        assert_eq!(released, 4);
        for cell in [Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)] {
            assert!(!grid.is_occupied(cell));
        }
        assert_eq!(generator.placements().len(), 21);
        assert_eq!(pool.in_use(EntityKind::Obstacle), 21);

        generator.clear(&mut grid, &mut pool).unwrap();
        assert_eq!(grid.empty_count(), 25);
    }

    #[test]
    fn test_reserved_pocket_survives_generation() {
        let (mut grid, mut pool, mut rng) = setup(6, 6, 36, 0);
        let center = Cell::new(3, 3);
        let reserved = ArenaGenerator::reserve_pocket(&mut grid, center, 1, Role::Seeker);
        assert_eq!(reserved.len(), 9);

        let mut generator = ArenaGenerator::new(ObstacleLayout::Scatter, 36, 0);
        let report = generator
            .generate(EpisodeMode::SelfPlay, &mut grid, &mut pool, &mut rng)
            .unwrap();
        assert_eq!(report.obstacles, 27);

        ArenaGenerator::lift_reservations(&mut grid, &reserved);
        for cell in center.neighborhood(1) {
            assert!(!grid.is_occupied(cell));
        }
    }

    #[test]
    fn test_clear_target_at() {
        let (mut grid, mut pool, mut rng) = setup(4, 4, 0, 1);
        let mut generator = ArenaGenerator::new(ObstacleLayout::Scatter, 0, 1);
        generator
            .generate(EpisodeMode::SeekerTraining, &mut grid, &mut pool, &mut rng)
            .unwrap();
        let cell = generator.placements()[0].cell;
        assert!(generator.clear_target_at(&mut grid, &mut pool, cell).unwrap());
        assert!(!grid.is_occupied(cell));
        assert!(!generator.clear_target_at(&mut grid, &mut pool, cell).unwrap());
        assert_eq!(pool.available(EntityKind::Target), 1);
    }
}
