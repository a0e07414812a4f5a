use std::env;
use std::str::FromStr;

use crate::arena::{EpisodeMode, MotionConfig, ObstacleLayout, RewardConfig};
use crate::infra::{ConfigError, FloorBounds, WorldPoint};
use crate::state::EntityKind;

/// Everything an arena needs at construction. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub floor: FloorBounds,
    pub cell_size: f32,
    /// Cells kept free between the floor edge and the grid.
    pub padding: i32,
    pub layout: ObstacleLayout,
    pub obstacle_count: usize,
    pub target_count: usize,
    pub obstacle_pool_capacity: usize,
    pub target_pool_capacity: usize,
    /// Chebyshev radius kept clear around each spawn cell.
    pub clear_radius: i32,
    pub mode: EpisodeMode,
    /// Step budget per episode, 0 for none.
    pub max_steps: usize,
    /// Ticks a floor flash stays visible.
    pub flash_ticks: u32,
    pub rewards: RewardConfig,
    pub motion: MotionConfig,
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            floor: FloorBounds::centered_at(WorldPoint::ZERO, 20.0, 20.0),
            cell_size: 1.0,
            padding: 1,
            layout: ObstacleLayout::Scatter,
            obstacle_count: 10,
            target_count: 1,
            obstacle_pool_capacity: 10,
            target_pool_capacity: 1,
            clear_radius: 2,
            mode: EpisodeMode::SeekerTraining,
            max_steps: 1000,
            flash_ticks: 25,
            rewards: RewardConfig::default(),
            motion: MotionConfig::default(),
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Pools must cover the worst case; they are never grown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size.is_nan() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if self.obstacle_pool_capacity < self.obstacle_count {
            return Err(ConfigError::PoolTooSmall {
                kind: EntityKind::Obstacle,
                capacity: self.obstacle_pool_capacity,
                count: self.obstacle_count,
            });
        }
        if self.mode.places_targets() && self.target_pool_capacity < self.target_count {
            return Err(ConfigError::PoolTooSmall {
                kind: EntityKind::Target,
                capacity: self.target_pool_capacity,
                count: self.target_count,
            });
        }
        if self.clear_radius < 0 {
            return Err(ConfigError::InvalidValue {
                key: "clear_radius".to_string(),
                value: self.clear_radius.to_string(),
            });
        }
        Ok(())
    }

    pub fn with_mode(mut self, mode: EpisodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_floor(mut self, floor: FloorBounds) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set obstacle/target counts and size the pools to match.
    pub fn with_counts(mut self, obstacles: usize, targets: usize) -> Self {
        self.obstacle_count = obstacles;
        self.target_count = targets;
        self.obstacle_pool_capacity = self.obstacle_pool_capacity.max(obstacles);
        self.target_pool_capacity = self.target_pool_capacity.max(targets);
        self
    }
}

/// Settings for the batch runner, read from `HIDESEEK_*` variables.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub arena_count: usize,
    pub episodes: usize,
    pub arena: ArenaConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            arena_count: 9,
            episodes: 20,
            arena: ArenaConfig::default(),
        }
    }
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = RunConfig::default();

        if let Some(count) = env_value("HIDESEEK_ARENAS")? {
            config.arena_count = count;
        }
        if let Some(episodes) = env_value("HIDESEEK_EPISODES")? {
            config.episodes = episodes;
        }

        let arena = &mut config.arena;
        if let Some(mode) = env_value::<String>("HIDESEEK_MODE")? {
            arena.mode = mode.parse()?;
        }
        if let Some(layout) = env_value::<String>("HIDESEEK_LAYOUT")? {
            arena.layout = layout.parse()?;
        }
        if let Some(cell_size) = env_value("HIDESEEK_CELL_SIZE")? {
            arena.cell_size = cell_size;
        }
        if let Some(obstacles) = env_value("HIDESEEK_OBSTACLES")? {
            arena.obstacle_count = obstacles;
            arena.obstacle_pool_capacity = arena.obstacle_pool_capacity.max(obstacles);
        }
        if let Some(targets) = env_value("HIDESEEK_TARGETS")? {
            arena.target_count = targets;
            arena.target_pool_capacity = arena.target_pool_capacity.max(targets);
        }
        if let Some(radius) = env_value("HIDESEEK_CLEAR_RADIUS")? {
            arena.clear_radius = radius;
        }
        if let Some(max_steps) = env_value("HIDESEEK_MAX_STEPS")? {
            arena.max_steps = max_steps;
        }
        if let Some(seed) = env_value("HIDESEEK_SEED")? {
            arena.seed = Some(seed);
        }

        config.arena.validate()?;
        Ok(config)
    }
}
