//! Reward shaping for both roles.
//!
//! Step-wise time reward is fixed per role: the seeker pays a constant
//! penalty every step so that stalling never pays, the hider earns
//! `1 / max_steps` for every step it stays free.

use crate::arena::{EpisodeMode, WallResponse};
use crate::infra::Role;
use crate::state::Reward;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RewardEvent {
    /// Entered a previously visited cell that differs from the last one.
    Revisit,
    Step,
    /// The seeker found what it was looking for.
    Capture,
    WallCollision,
}

#[derive(Debug, Clone)]
pub struct RewardConfig {
    pub revisit_penalty: f32,
    pub seeker_step_penalty: f32,
    pub capture_reward: f32,
    pub wall_penalty: f32,
    pub light_reset_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            revisit_penalty: -0.01,
            seeker_step_penalty: -0.0025,
            capture_reward: 1.0,
            wall_penalty: -1.0,
            light_reset_penalty: -0.25,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardPolicy {
    config: RewardConfig,
    max_steps: usize,
}

impl RewardPolicy {
    pub fn new(config: RewardConfig, max_steps: usize) -> Self {
        Self { config, max_steps }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Reward for `role` when `event` happens under `mode`, if any.
    pub fn reward_for(&self, event: RewardEvent, role: Role, mode: EpisodeMode) -> Option<Reward> {
        match event {
            RewardEvent::Revisit => self.revisit(role, mode),
            RewardEvent::Step => self.step(role),
            RewardEvent::Capture => Some(match role {
                Role::Seeker => Reward::Set(self.config.capture_reward),
                Role::Hider => Reward::Set(-self.config.capture_reward),
            }),
            RewardEvent::WallCollision => Some(match mode.wall_response() {
                WallResponse::Terminal => Reward::Set(self.config.wall_penalty),
                WallResponse::LightReset => Reward::Add(self.config.light_reset_penalty),
            }),
        }
    }

    fn revisit(&self, role: Role, mode: EpisodeMode) -> Option<Reward> {
        match (role, mode) {
            (Role::Seeker, _) | (Role::Hider, EpisodeMode::HiderTraining) => {
                Some(Reward::Add(self.config.revisit_penalty))
            }
            (Role::Hider, _) => None,
        }
    }

    fn step(&self, role: Role) -> Option<Reward> {
        match role {
            Role::Seeker => Some(Reward::Add(self.config.seeker_step_penalty)),
            Role::Hider if self.max_steps > 0 => Some(Reward::Add(1.0 / self.max_steps as f32)),
            Role::Hider => None,
        }
    }
}
