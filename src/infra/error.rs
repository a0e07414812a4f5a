use thiserror::Error;

use crate::infra::Cell;
use crate::state::{EntityKind, Occupant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {cell} is already occupied by {existing:?}")]
    AlreadyOccupied { cell: Cell, existing: Occupant },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("{kind:?} pool is empty")]
    PoolExhausted { kind: EntityKind },
    #[error("entity {id} does not belong to this pool")]
    ForeignEntity { id: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    #[error("floor is too small for a grid: {rows}x{cols}")]
    EmptyGrid { rows: i32, cols: i32 },
    #[error("{kind:?} pool capacity {capacity} is smaller than the configured count {count}")]
    PoolTooSmall {
        kind: EntityKind,
        capacity: usize,
        count: usize,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("arena {arena_id} has no active episode")]
    EpisodeNotActive { arena_id: usize },
}
