mod config;
mod coordinator;
mod episode;
mod generator;
mod layout;
mod mode;
mod motion;
mod reward;
mod runner;

pub use config::{ArenaConfig, RunConfig};
pub use coordinator::{Arena, OBSERVATION_SIZE, TickReport};
pub use episode::{EpisodeState, EpisodeSummary, FloorColor, FloorIndicator, Found, Outcome};
pub use generator::{
    ArenaGenerator, GenerationReport, GrowthAxis, LayoutStrategy, ObstacleLayout, Placement,
    PlacementSite, ScatterLayout, WALL_EXTENSION, WallLayout,
};
pub use layout::{ARENA_GAP, ArenaLayout};
pub use mode::{EpisodeMode, WallResponse};
pub use motion::{
    AgentAction, Contact, ContactSensor, GridContactSensor, KinematicMotion, MotionConfig,
    MotionModel,
};
pub use reward::{RewardConfig, RewardEvent, RewardPolicy};
pub use runner::{ArenaRunner, Policy, RandomPolicy};
