pub mod arena;
pub mod infra;
pub mod state;

// Re-export commonly used types for convenience
pub use arena::{Arena, ArenaConfig, EpisodeMode, RunConfig};
pub use infra::{Cell, Role};
pub use state::OccupancyGrid;
