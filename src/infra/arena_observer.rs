use crate::arena::{EpisodeMode, EpisodeSummary, FloorColor};
use crate::infra::{Cell, Role};

/// Trait for observing arena events. Observers are notified synchronously
/// and cannot change arena state.
pub trait ArenaObserver: Send {
    /// Called once an episode is set up and about to run
    fn on_episode_start(
        &mut self,
        arena_id: usize,
        episode: u32,
        mode: EpisodeMode,
        spawns: &[(Role, Option<Cell>)],
    );

    /// Called when an agent is sent back to its spawn cell mid-episode
    fn on_light_reset(&mut self, _arena_id: usize, _role: Role, _cell: Option<Cell>) {}

    /// Called when the floor flashes a success or failure colour
    fn on_floor_flash(&mut self, _arena_id: usize, _color: FloorColor) {}

    /// Called when the floor fades back to grey
    fn on_floor_revert(&mut self, _arena_id: usize) {}

    /// Called when both agents' episodes have ended
    fn on_episode_end(&mut self, arena_id: usize, summary: &EpisodeSummary);
}
