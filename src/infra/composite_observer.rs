use crate::arena::{EpisodeMode, EpisodeSummary, FloorColor};
use crate::infra::{ArenaObserver, Cell, Role};

pub struct CompositeObserver {
    observers: Vec<Box<dyn ArenaObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Box<dyn ArenaObserver>>) -> Self {
        Self { observers }
    }
}

impl ArenaObserver for CompositeObserver {
    fn on_episode_start(
        &mut self,
        arena_id: usize,
        episode: u32,
        mode: EpisodeMode,
        spawns: &[(Role, Option<Cell>)],
    ) {
        for observer in &mut self.observers {
            observer.on_episode_start(arena_id, episode, mode, spawns);
        }
    }

    fn on_light_reset(&mut self, arena_id: usize, role: Role, cell: Option<Cell>) {
        for observer in &mut self.observers {
            observer.on_light_reset(arena_id, role, cell);
        }
    }

    fn on_floor_flash(&mut self, arena_id: usize, color: FloorColor) {
        for observer in &mut self.observers {
            observer.on_floor_flash(arena_id, color);
        }
    }

    fn on_floor_revert(&mut self, arena_id: usize) {
        for observer in &mut self.observers {
            observer.on_floor_revert(arena_id);
        }
    }

    fn on_episode_end(&mut self, arena_id: usize, summary: &EpisodeSummary) {
        for observer in &mut self.observers {
            observer.on_episode_end(arena_id, summary);
        }
    }
}
