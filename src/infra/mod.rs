mod arena_observer;
mod composite_observer;
mod default_observer;
mod error;
mod metrics;
mod types;

pub use arena_observer::ArenaObserver;
pub use composite_observer::CompositeObserver;
pub use default_observer::DefaultObserver;
pub use error::{ArenaError, ConfigError, GridError, PoolError};
pub use metrics::{ArenaStats, EpisodeMetrics, MetricsObserver, MovingAverage};
pub use types::{Cell, FloorBounds, Pose, Role, WorldPoint};
