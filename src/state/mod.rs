mod agent_state;
mod grid;
mod pool;

pub use agent_state::{AgentState, Reward};
pub use grid::{EntityId, OccupancyGrid, Occupant};
pub use pool::{EntityKind, ObjectPool, PooledEntity, Scale, Transform};
