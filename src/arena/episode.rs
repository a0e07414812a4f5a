use crate::infra::{Cell, Role};

/// What the seeker found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Target(Cell),
    Hider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Captured(Found),
    WallCollision { role: Role },
    /// Step budget ran out, or the episode was restarted while running.
    Truncated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeState {
    #[default]
    Idle,
    Resetting,
    Active,
    Terminated(Outcome),
}

impl EpisodeState {
    pub fn is_active(&self) -> bool {
        matches!(self, EpisodeState::Active)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, EpisodeState::Terminated(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            EpisodeState::Terminated(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorColor {
    Gray,
    Green,
    Red,
}

/// Floor colour signal for observers: a flash that fades back to grey.
#[derive(Debug, Clone)]
pub struct FloorIndicator {
    color: FloorColor,
    remaining: u32,
    flash_ticks: u32,
}

impl FloorIndicator {
    pub fn new(flash_ticks: u32) -> Self {
        Self {
            color: FloorColor::Gray,
            remaining: 0,
            flash_ticks,
        }
    }

    pub fn color(&self) -> FloorColor {
        self.color
    }

    pub fn flash(&mut self, color: FloorColor) {
        self.color = color;
        self.remaining = self.flash_ticks;
    }

    /// Drop any running flash. Returns true when a flash was showing.
    pub fn reset(&mut self) -> bool {
        let was_flashing = self.color != FloorColor::Gray;
        self.color = FloorColor::Gray;
        self.remaining = 0;
        was_flashing
    }

    /// Advance one tick. Returns true when the flash just faded.
    pub fn tick(&mut self) -> bool {
        if self.color == FloorColor::Gray {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.color = FloorColor::Gray;
            return true;
        }
        false
    }
}

/// Reported to observers once per finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub outcome: Outcome,
    pub steps: usize,
    pub seeker_reward: f32,
    pub hider_reward: f32,
    pub light_resets: u32,
}
