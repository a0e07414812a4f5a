use std::fmt;
use std::str::FromStr;

use crate::infra::{ConfigError, Role};

/// Which agents an arena trains and how their episodes interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EpisodeMode {
    #[default]
    SeekerTraining,
    HiderTraining,
    SelfPlay,
}

/// What a wall collision does to the colliding agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallResponse {
    /// Episode ends for both agents.
    Terminal,
    /// Agent goes back to its spawn cell, episode continues.
    LightReset,
}

impl EpisodeMode {
    pub fn is_active(self, role: Role) -> bool {
        match self {
            EpisodeMode::SeekerTraining => role == Role::Seeker,
            EpisodeMode::HiderTraining | EpisodeMode::SelfPlay => true,
        }
    }

    pub fn active_roles(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.is_active(*role))
    }

    /// Targets are only worth placing when the seeker hunts them.
    pub fn places_targets(self) -> bool {
        matches!(self, EpisodeMode::SeekerTraining)
    }

    /// The single role whose movement feeds the visited layer.
    pub fn visit_tracker(self) -> Role {
        match self {
            EpisodeMode::SeekerTraining | EpisodeMode::SelfPlay => Role::Seeker,
            EpisodeMode::HiderTraining => Role::Hider,
        }
    }

    pub fn wall_response(self) -> WallResponse {
        match self {
            EpisodeMode::SelfPlay => WallResponse::LightReset,
            EpisodeMode::SeekerTraining | EpisodeMode::HiderTraining => WallResponse::Terminal,
        }
    }

    /// Role whose success the floor flash reports.
    pub fn trained_role(self) -> Role {
        match self {
            EpisodeMode::HiderTraining => Role::Hider,
            EpisodeMode::SeekerTraining | EpisodeMode::SelfPlay => Role::Seeker,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeMode::SeekerTraining => "seeker",
            EpisodeMode::HiderTraining => "hider",
            EpisodeMode::SelfPlay => "self-play",
        }
    }
}

impl fmt::Display for EpisodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpisodeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seeker" | "seeker-training" => Ok(EpisodeMode::SeekerTraining),
            "hider" | "hider-training" => Ok(EpisodeMode::HiderTraining),
            "self-play" | "selfplay" | "self_play" => Ok(EpisodeMode::SelfPlay),
            _ => Err(ConfigError::InvalidValue {
                key: "mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
