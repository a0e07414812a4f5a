use tracing::{debug, info};

use crate::arena::{EpisodeMode, EpisodeSummary, FloorColor};
use crate::infra::{ArenaObserver, Cell, Role};

pub struct DefaultObserver;

impl ArenaObserver for DefaultObserver {
    fn on_episode_start(
        &mut self,
        arena_id: usize,
        episode: u32,
        mode: EpisodeMode,
        spawns: &[(Role, Option<Cell>)],
    ) {
        info!("Arena {} episode {} started ({})", arena_id, episode, mode);
        for (role, cell) in spawns {
            match cell {
                Some(cell) => debug!("- {} spawn: {}", role, cell),
                None => debug!("- {} spawn: kept previous position", role),
            }
        }
    }

    fn on_light_reset(&mut self, arena_id: usize, role: Role, cell: Option<Cell>) {
        debug!("Arena {}: {} hit a wall, back to {:?}", arena_id, role, cell);
    }

    fn on_floor_flash(&mut self, arena_id: usize, color: FloorColor) {
        debug!("Arena {} floor: {:?}", arena_id, color);
    }

    fn on_episode_end(&mut self, arena_id: usize, summary: &EpisodeSummary) {
        info!(
            "Arena {} episode {} finished: {:?} after {} steps (seeker {:.3}, hider {:.3})",
            arena_id,
            summary.episode,
            summary.outcome,
            summary.steps,
            summary.seeker_reward,
            summary.hider_reward,
        );
    }
}
