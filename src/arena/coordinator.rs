//! Per-arena episode state machine.
//!
//! ```text
//!   Idle ──start──► Resetting ──► Active ──tick──► Active
//!    ▲                               │
//!    │                               ├─ capture / terminal wall ─► Terminated
//!    └──────────── start ◄───────────┴─ step budget ─────────────► Terminated
//! ```
//!
//! Agents never touch each other. Contacts are queued as events and drained
//! right after the reporting agent's step, so a terminal event ends both
//! agents' episodes before the other agent can step again.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::arena::{
    AgentAction, ArenaConfig, ArenaGenerator, Contact, ContactSensor, EpisodeMode,
    EpisodeState, EpisodeSummary, FloorColor, FloorIndicator, Found, GridContactSensor,
    KinematicMotion, MotionModel, Outcome, RewardEvent, RewardPolicy, WallResponse,
};
use crate::infra::{ArenaError, ArenaObserver, Cell, DefaultObserver, Pose, Role};
use crate::state::{AgentState, ObjectPool, OccupancyGrid};

/// Length of the observation vector produced by [`Arena::observe`].
pub const OBSERVATION_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ContactEvent {
    FoundTarget(Cell),
    FoundOpponent,
    HitWall,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArenaEvent {
    role: Role,
    contact: ContactEvent,
}

/// Result of one simulation tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Reward earned this tick, indexed by `Role::index`.
    pub rewards: [f32; 2],
    pub state: EpisodeState,
}

impl TickReport {
    pub fn done(&self) -> bool {
        self.state.is_terminated()
    }
}

pub struct Arena {
    id: usize,
    config: ArenaConfig,
    grid: OccupancyGrid,
    pool: ObjectPool,
    generator: ArenaGenerator,
    agents: [AgentState; 2],
    rewards: RewardPolicy,
    motion: Box<dyn MotionModel>,
    sensor: Box<dyn ContactSensor>,
    observer: Box<dyn ArenaObserver>,
    rng: StdRng,
    state: EpisodeState,
    events: VecDeque<ArenaEvent>,
    floor: FloorIndicator,
    episode_steps: usize,
    episode_count: u32,
    light_resets: u32,
}

impl Arena {
    pub fn new(id: usize, config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let grid = OccupancyGrid::from_floor(&config.floor, config.cell_size, config.padding)?;

        let cell_count = (grid.rows() * grid.cols()) as usize;
        let obstacle_count = config.obstacle_count.min(cell_count);
        let target_count = if config.mode.places_targets() {
            config.target_count
        } else {
            0
        };
        let pool = ObjectPool::with_tag(
            id as u32,
            config.obstacle_pool_capacity,
            config.target_pool_capacity,
        );
        let generator = ArenaGenerator::new(config.layout, obstacle_count, target_count);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_os_rng(),
        };

        let center = grid.cell_to_world(Cell::new(grid.rows() / 2, grid.cols() / 2));
        let mut agents = [AgentState::new(Role::Seeker), AgentState::new(Role::Hider)];
        for agent in agents.iter_mut() {
            agent.pose = Pose::new(center, 0.0);
            agent.is_active = config.mode.is_active(agent.role);
        }

        info!(
            "Arena {} ready: {}x{} grid, mode {}, layout {}",
            id,
            grid.rows(),
            grid.cols(),
            config.mode,
            config.layout
        );

        Ok(Self {
            id,
            rewards: RewardPolicy::new(config.rewards.clone(), config.max_steps),
            motion: Box::new(KinematicMotion::new(config.motion.clone())),
            sensor: Box::new(GridContactSensor),
            observer: Box::new(DefaultObserver),
            floor: FloorIndicator::new(config.flash_ticks),
            config,
            grid,
            pool,
            generator,
            agents,
            rng,
            state: EpisodeState::Idle,
            events: VecDeque::new(),
            episode_steps: 0,
            episode_count: 0,
            light_resets: 0,
        })
    }

    pub fn with_observer(mut self, observer: impl ArenaObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_motion(mut self, motion: impl MotionModel + 'static) -> Self {
        self.motion = Box::new(motion);
        self
    }

    pub fn with_sensor(mut self, sensor: impl ContactSensor + 'static) -> Self {
        self.sensor = Box::new(sensor);
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn mode(&self) -> EpisodeMode {
        self.config.mode
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn generator(&self) -> &ArenaGenerator {
        &self.generator
    }

    pub fn agent(&self, role: Role) -> &AgentState {
        &self.agents[role.index()]
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn floor_color(&self) -> FloorColor {
        self.floor.color()
    }

    pub fn episode_count(&self) -> u32 {
        self.episode_count
    }

    pub fn episode_steps(&self) -> usize {
        self.episode_steps
    }

    /// Light resets in the current episode.
    pub fn light_resets(&self) -> u32 {
        self.light_resets
    }

    /// Move an agent without touching its spawn cell or the grid.
    #[cfg(test)]
    pub(crate) fn teleport(&mut self, role: Role, pose: Pose) {
        self.agents[role.index()].pose = pose;
    }

    /// Reset the arena for a new episode. A running episode is ended as
    /// truncated first so both agents' counters stay aligned.
    #[tracing::instrument(level = "trace", skip(self), fields(arena = self.id))]
    pub fn start_episode(&mut self) -> Result<(), ArenaError> {
        if self.state.is_active() {
            debug!("Arena {} restarted mid-episode", self.id);
            self.truncate();
        }

        self.state = EpisodeState::Resetting;
        self.events.clear();
        self.light_resets = 0;
        self.grid.reset_visitation();
        self.generator.clear(&mut self.grid, &mut self.pool)?;

        let mode = self.config.mode;
        let radius = self.config.clear_radius;
        let mut reserved = Vec::new();
        let mut spawns = Vec::new();

        for role in mode.active_roles() {
            let cell = self.choose_spawn(role);
            let position = match cell {
                Some(cell) => self.grid.cell_to_world(cell),
                None => self.agents[role.index()].pose.position,
            };
            let heading = self.rng.random_range(0.0..360.0);

            if let Some(cell) = cell {
                self.generator
                    .clear_radius(&mut self.grid, &mut self.pool, cell, radius)?;
                reserved.extend(ArenaGenerator::reserve_pocket(&mut self.grid, cell, radius, role));
            }
            spawns.push((role, cell, Pose::new(position, heading)));
        }

        let generated = self
            .generator
            .generate(mode, &mut self.grid, &mut self.pool, &mut self.rng);
        ArenaGenerator::lift_reservations(&mut self.grid, &reserved);
        let report = match generated {
            Ok(report) => report,
            Err(err) => {
                warn!("Arena {}: generation failed: {}", self.id, err);
                self.state = EpisodeState::Idle;
                return Err(err);
            }
        };

        // Agents only enter the episode once the arena is fully built.
        for (role, cell, pose) in &spawns {
            self.agents[role.index()].begin_episode(*pose, *cell);
        }
        if self.floor.reset() {
            self.observer.on_floor_revert(self.id);
        }

        self.episode_steps = 0;
        self.episode_count += 1;
        self.state = EpisodeState::Active;
        debug!(
            "Arena {} episode {}: {} obstacles, {} targets, {} empty cells",
            self.id,
            self.episode_count,
            report.obstacles,
            report.targets,
            self.grid.empty_count()
        );
        let spawns: Vec<_> = spawns.into_iter().map(|(role, cell, _)| (role, cell)).collect();
        self.observer
            .on_episode_start(self.id, self.episode_count, mode, &spawns);
        Ok(())
    }

    /// Pick a random empty spawn cell, or fall back to the agent's current
    /// cell when the grid is full.
    fn choose_spawn(&mut self, role: Role) -> Option<Cell> {
        if let Some(cell) = self.grid.random_empty_cell(&mut self.rng) {
            return Some(cell);
        }
        let current = self.grid.world_to_cell(self.agents[role.index()].pose.position);
        warn!(
            "Arena {}: no empty cell to spawn {}, keeping it at {}",
            self.id, role, current
        );
        if self.grid.contains(&current) {
            Some(current)
        } else {
            None
        }
    }

    /// End a running episode as truncated and report it. No-op otherwise.
    pub fn truncate(&mut self) {
        if self.state.is_active() {
            self.terminate(Outcome::Truncated);
            self.report_episode_end();
        }
    }

    /// Step every active agent once, in fixed order.
    pub fn tick(&mut self, actions: [AgentAction; 2]) -> Result<TickReport, ArenaError> {
        if !self.state.is_active() {
            return Err(ArenaError::EpisodeNotActive { arena_id: self.id });
        }

        self.episode_steps += 1;
        for agent in self.agents.iter_mut() {
            agent.begin_step();
        }

        for role in Role::ALL {
            if !self.agents[role.index()].is_active {
                continue;
            }
            self.step_agent(role, actions[role.index()]);
            self.agents[role.index()].episode_steps += 1;
            self.resolve_events()?;
            if !self.state.is_active() {
                break;
            }
        }

        if self.state.is_active()
            && self.config.max_steps > 0
            && self.episode_steps >= self.config.max_steps
        {
            self.terminate(Outcome::Truncated);
        }

        let mut rewards = [0.0; 2];
        for agent in self.agents.iter_mut().filter(|a| a.is_active) {
            rewards[agent.role.index()] = agent.commit_step();
        }

        if self.state.is_terminated() {
            self.report_episode_end();
        }
        if self.floor.tick() {
            self.observer.on_floor_revert(self.id);
        }

        Ok(TickReport {
            rewards,
            state: self.state,
        })
    }

    fn step_agent(&mut self, role: Role, action: AgentAction) {
        let idx = role.index();
        let opponent = &self.agents[role.opponent().index()];
        let opponent_pose = if opponent.is_active {
            Some(opponent.pose)
        } else {
            None
        };

        let current = self.agents[idx].pose;
        let proposed = self
            .motion
            .apply_motion(current, action.forward, action.turn);
        let contact = self
            .sensor
            .probe(&self.grid, role, &proposed, opponent_pose.as_ref());

        // Blocking contacts keep the rotation but not the translation.
        let (pose, event) = match contact {
            Contact::None => (proposed, None),
            Contact::Blocked => (Pose::new(current.position, proposed.heading_deg), None),
            Contact::Wall => (
                Pose::new(current.position, proposed.heading_deg),
                Some(ContactEvent::HitWall),
            ),
            Contact::Target { cell } => (proposed, Some(ContactEvent::FoundTarget(cell))),
            Contact::Opponent => (proposed, Some(ContactEvent::FoundOpponent)),
        };

        let mode = self.config.mode;
        let cell = self.grid.world_to_cell(pose.position);
        let mut revisited = false;
        if mode.visit_tracker() == role {
            if self.grid.has_been_visited(cell) {
                revisited = self.agents[idx].previous_cell != Some(cell);
            } else {
                self.grid.mark_visited(cell);
            }
        }

        let agent = &mut self.agents[idx];
        agent.pose = pose;
        agent.forward_amount = action.forward.clamp(0.0, 1.0);
        agent.previous_cell = Some(cell);
        if revisited {
            if let Some(reward) = self.rewards.reward_for(RewardEvent::Revisit, role, mode) {
                agent.apply(reward);
            }
        }
        if let Some(reward) = self.rewards.reward_for(RewardEvent::Step, role, mode) {
            agent.apply(reward);
        }

        if let Some(contact) = event {
            self.events.push_back(ArenaEvent { role, contact });
        }
    }

    fn resolve_events(&mut self) -> Result<(), ArenaError> {
        while let Some(event) = self.events.pop_front() {
            if !self.state.is_active() {
                self.events.clear();
                break;
            }
            match event.contact {
                ContactEvent::FoundTarget(cell) => {
                    self.generator
                        .clear_target_at(&mut self.grid, &mut self.pool, cell)?;
                    self.capture(Found::Target(cell));
                }
                ContactEvent::FoundOpponent => self.capture(Found::Hider),
                ContactEvent::HitWall => self.wall_collision(event.role)?,
            }
        }
        Ok(())
    }

    fn capture(&mut self, found: Found) {
        let mode = self.config.mode;
        for role in mode.active_roles() {
            if let Some(reward) = self.rewards.reward_for(RewardEvent::Capture, role, mode) {
                self.agents[role.index()].apply(reward);
            }
        }
        let color = if mode.trained_role() == Role::Seeker {
            FloorColor::Green
        } else {
            FloorColor::Red
        };
        self.flash(color);
        self.terminate(Outcome::Captured(found));
    }

    fn wall_collision(&mut self, role: Role) -> Result<(), ArenaError> {
        let mode = self.config.mode;
        if let Some(reward) = self.rewards.reward_for(RewardEvent::WallCollision, role, mode) {
            self.agents[role.index()].apply(reward);
        }
        match mode.wall_response() {
            WallResponse::Terminal => {
                self.flash(FloorColor::Red);
                self.terminate(Outcome::WallCollision { role });
                Ok(())
            }
            WallResponse::LightReset => self.light_reset(role),
        }
    }

    /// Send `role` back to its spawn cell without ending the episode.
    pub fn light_reset(&mut self, role: Role) -> Result<(), ArenaError> {
        let spawn = self.agents[role.index()].spawn_cell;
        let position = match spawn {
            Some(cell) => {
                self.generator.clear_radius(
                    &mut self.grid,
                    &mut self.pool,
                    cell,
                    self.config.clear_radius,
                )?;
                self.grid.cell_to_world(cell)
            }
            None => {
                warn!("Arena {}: {} has no spawn cell, staying put", self.id, role);
                self.agents[role.index()].pose.position
            }
        };

        let heading = self.rng.random_range(0.0..360.0);
        let agent = &mut self.agents[role.index()];
        agent.pose = Pose::new(position, heading);
        agent.previous_cell = spawn;
        self.light_resets += 1;
        debug!("Arena {}: light reset for {}", self.id, role);
        self.observer.on_light_reset(self.id, role, spawn);
        Ok(())
    }

    fn flash(&mut self, color: FloorColor) {
        self.floor.flash(color);
        self.observer.on_floor_flash(self.id, color);
    }

    fn terminate(&mut self, outcome: Outcome) {
        self.state = EpisodeState::Terminated(outcome);
        self.events.clear();
        for agent in self.agents.iter_mut().filter(|a| a.is_active) {
            agent.end_episode();
        }
    }

    fn report_episode_end(&mut self) {
        let Some(outcome) = self.state.outcome() else {
            return;
        };
        let summary = EpisodeSummary {
            episode: self.episode_count,
            outcome,
            steps: self.episode_steps,
            seeker_reward: self.agents[Role::Seeker.index()].episode_reward,
            hider_reward: self.agents[Role::Hider.index()].episode_reward,
            light_resets: self.light_resets,
        };
        self.observer.on_episode_end(self.id, &summary);
    }

    /// `[heading/360, (forward+1)/2, row/rows, col/cols]` for `role`.
    pub fn observe(&self, role: Role) -> Vec<f32> {
        let agent = &self.agents[role.index()];
        let cell = self.grid.world_to_cell(agent.pose.position);
        vec![
            agent.pose.heading_deg / 360.0,
            (agent.forward_amount + 1.0) / 2.0,
            cell.row as f32 / self.grid.rows() as f32,
            cell.col as f32 / self.grid.cols() as f32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ObstacleLayout;
    use crate::infra::{FloorBounds, PoolError, WorldPoint};
    use crate::state::EntityKind;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        starts: Vec<u32>,
        ends: Vec<EpisodeSummary>,
        light_resets: Vec<(Role, Option<Cell>)>,
        flashes: Vec<FloorColor>,
        reverts: u32,
    }

    struct RecordingObserver(Arc<Mutex<Recorded>>);

    impl ArenaObserver for RecordingObserver {
        fn on_episode_start(
            &mut self,
            _arena_id: usize,
            episode: u32,
            _mode: EpisodeMode,
            _spawns: &[(Role, Option<Cell>)],
        ) {
            self.0.lock().unwrap().starts.push(episode);
        }

        fn on_light_reset(&mut self, _arena_id: usize, role: Role, cell: Option<Cell>) {
            self.0.lock().unwrap().light_resets.push((role, cell));
        }

        fn on_floor_flash(&mut self, _arena_id: usize, color: FloorColor) {
            self.0.lock().unwrap().flashes.push(color);
        }

        fn on_floor_revert(&mut self, _arena_id: usize) {
            self.0.lock().unwrap().reverts += 1;
        }

        fn on_episode_end(&mut self, _arena_id: usize, summary: &EpisodeSummary) {
            self.0.lock().unwrap().ends.push(summary.clone());
        }
    }

    /// 5x5 grid with cell size 1 and origin at the world origin.
    fn config(mode: EpisodeMode, obstacles: usize, targets: usize) -> ArenaConfig {
        let mut config = ArenaConfig::default()
            .with_mode(mode)
            .with_floor(FloorBounds::new(WorldPoint::new(-1.0, 0.0, -1.0), 7.0, 7.0))
            .with_seed(11)
            .with_counts(obstacles, targets);
        config.clear_radius = 1;
        config
    }

    fn arena(mode: EpisodeMode, obstacles: usize, targets: usize) -> (Arena, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let arena = Arena::new(0, config(mode, obstacles, targets))
            .unwrap()
            .with_observer(RecordingObserver(Arc::clone(&recorded)));
        (arena, recorded)
    }

    fn at(row: f32, col: f32, heading: f32) -> Pose {
        Pose::new(WorldPoint::on_floor(row, col), heading)
    }

    const IDLE: [AgentAction; 2] = [
        AgentAction {
            forward: 0.0,
            turn: 0.0,
        },
        AgentAction {
            forward: 0.0,
            turn: 0.0,
        },
    ];

    #[test]
    fn test_tick_requires_active_episode() {
        let (mut arena, _) = arena(EpisodeMode::SelfPlay, 0, 0);
        assert_eq!(arena.state(), EpisodeState::Idle);
        assert!(matches!(
            arena.tick(IDLE),
            Err(ArenaError::EpisodeNotActive { arena_id: 0 })
        ));
    }

    #[test]
    fn test_start_episode_spawns_in_free_pockets() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 4, 0);
        arena.start_episode().unwrap();
        assert_eq!(arena.state(), EpisodeState::Active);

        let seeker = arena.agent(Role::Seeker).spawn_cell.unwrap();
        let hider = arena.agent(Role::Hider).spawn_cell.unwrap();
        assert!(seeker.chebyshev_distance(&hider) > 1);
        for spawn in [seeker, hider] {
            for cell in spawn.neighborhood(1) {
                assert!(!arena.grid().is_occupied(cell));
            }
        }
        assert_eq!(
            arena.agent(Role::Seeker).episodes_started,
            arena.agent(Role::Hider).episodes_started
        );
        assert_eq!(recorded.lock().unwrap().starts, vec![1]);
    }

    #[test]
    fn test_self_play_capture_ends_both_episodes() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 0, 0);
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(2.0, 2.0, 0.0));
        arena.teleport(Role::Hider, at(2.0, 3.0, 0.0));

        let chase = [AgentAction::new(1.0, 0.0), AgentAction::default()];
        let first = arena.tick(chase).unwrap();
        assert!(!first.done());
        let second = arena.tick(chase).unwrap();
        assert!(!second.done());

        let report = arena.tick(chase).unwrap();
        assert!(report.done());
        assert_eq!(
            report.state,
            EpisodeState::Terminated(Outcome::Captured(Found::Hider))
        );
        assert!((report.rewards[Role::Seeker.index()] - 1.0).abs() < 1e-6);
        assert!((report.rewards[Role::Hider.index()] + 1.0).abs() < 1e-6);
        assert!(!arena.agent(Role::Seeker).episode_running);
        assert!(!arena.agent(Role::Hider).episode_running);
        assert_eq!(arena.floor_color(), FloorColor::Green);

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.ends.len(), 1);
        assert_eq!(recorded.ends[0].steps, 3);
        assert!(matches!(arena.tick(IDLE), Err(ArenaError::EpisodeNotActive { .. })));
    }

    #[test]
    fn test_self_play_wall_is_light_reset() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 4, 0);
        arena.start_episode().unwrap();
        let seeker_spawn = arena.agent(Role::Seeker).spawn_cell.unwrap();
        let hider_spawn = arena.agent(Role::Hider).spawn_cell.unwrap();

        // Both agents idle on their spawn cells for one tick.
        arena.tick(IDLE).unwrap();

        let snapshot = |arena: &Arena| {
            let occupants: Vec<_> = (0..5)
                .flat_map(|row| (0..5).map(move |col| Cell::new(row, col)))
                .map(|cell| arena.grid().get_occupant(cell))
                .collect();
            let empty: HashSet<Cell> = arena.grid().empty_cells().iter().copied().collect();
            (occupants, empty, arena.grid().visited_count())
        };
        let before = snapshot(&arena);

        // Drive the hider off the low-column edge from a free edge cell.
        let edge = (0..5)
            .map(|row| Cell::new(row, 0))
            .find(|cell| !arena.grid().is_occupied(*cell) && *cell != seeker_spawn)
            .unwrap();
        let start = arena.grid().cell_to_world(edge);
        arena.teleport(Role::Hider, Pose::new(start, 180.0));

        let flee = [AgentAction::default(), AgentAction::new(1.0, 0.0)];
        let mut report = arena.tick(flee).unwrap();
        while recorded.lock().unwrap().light_resets.is_empty() {
            report = arena.tick(flee).unwrap();
        }

        assert_eq!(report.state, EpisodeState::Active);
        let expected = -0.25 + 1.0 / 1000.0;
        assert!((report.rewards[Role::Hider.index()] - expected).abs() < 1e-6);
        let hider = arena.agent(Role::Hider);
        assert_eq!(arena.grid().world_to_cell(hider.pose.position), hider_spawn);
        assert!(hider.episode_running);

        assert_eq!(snapshot(&arena), before);
        assert_eq!(
            recorded.lock().unwrap().light_resets,
            vec![(Role::Hider, Some(hider_spawn))]
        );
    }

    #[test]
    fn test_seeker_training_wall_is_terminal() {
        let (mut arena, recorded) = arena(EpisodeMode::SeekerTraining, 0, 1);
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(4.0, 4.4, 0.0));

        let report = arena.tick([AgentAction::new(1.0, 0.0), AgentAction::default()]).unwrap();
        assert_eq!(
            report.state,
            EpisodeState::Terminated(Outcome::WallCollision { role: Role::Seeker })
        );
        assert!((report.rewards[Role::Seeker.index()] + 1.0).abs() < 1e-6);
        assert_eq!(report.rewards[Role::Hider.index()], 0.0);
        assert_eq!(recorded.lock().unwrap().flashes, vec![FloorColor::Red]);
    }

    #[test]
    fn test_hider_training_wall_ends_both() {
        let (mut arena, recorded) = arena(EpisodeMode::HiderTraining, 0, 0);
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(0.0, 0.0, 0.0));
        arena.teleport(Role::Hider, at(4.0, 4.4, 0.0));

        let report = arena.tick([AgentAction::default(), AgentAction::new(1.0, 0.0)]).unwrap();
        assert_eq!(
            report.state,
            EpisodeState::Terminated(Outcome::WallCollision { role: Role::Hider })
        );
        assert!((report.rewards[Role::Seeker.index()] + 0.0025).abs() < 1e-6);
        assert!((report.rewards[Role::Hider.index()] + 1.0).abs() < 1e-6);
        assert!(!arena.agent(Role::Seeker).episode_running);
        assert!(!arena.agent(Role::Hider).episode_running);
        assert_eq!(recorded.lock().unwrap().flashes, vec![FloorColor::Red]);
        assert_eq!(recorded.lock().unwrap().ends.len(), 1);
    }

    #[test]
    fn test_hider_training_capture_ends_both() {
        let (mut arena, recorded) = arena(EpisodeMode::HiderTraining, 0, 0);
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(2.0, 2.0, 0.0));
        arena.teleport(Role::Hider, at(2.0, 3.0, 180.0));

        // The hider walks into the idle seeker on the third tick.
        let wander = [AgentAction::default(), AgentAction::new(1.0, 0.0)];
        assert!(!arena.tick(wander).unwrap().done());
        assert!(!arena.tick(wander).unwrap().done());
        let report = arena.tick(wander).unwrap();

        assert_eq!(
            report.state,
            EpisodeState::Terminated(Outcome::Captured(Found::Hider))
        );
        assert!((report.rewards[Role::Seeker.index()] - 1.0).abs() < 1e-6);
        assert!((report.rewards[Role::Hider.index()] + 1.0).abs() < 1e-6);
        assert!(!arena.agent(Role::Seeker).episode_running);
        assert!(!arena.agent(Role::Hider).episode_running);
        assert_eq!(arena.floor_color(), FloorColor::Red);
        assert_eq!(recorded.lock().unwrap().ends[0].steps, 3);
    }

    #[test]
    fn test_self_play_seeker_wall_is_light_reset() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 0, 0);
        arena.start_episode().unwrap();
        let spawn = arena.agent(Role::Seeker).spawn_cell.unwrap();

        // Park the hider away from the seeker's spawn so the reset cannot land on it.
        let parking = if spawn == Cell::new(0, 0) {
            Cell::new(0, 4)
        } else {
            Cell::new(0, 0)
        };
        let parked = Pose::new(arena.grid().cell_to_world(parking), 0.0);
        arena.teleport(Role::Hider, parked);
        arena.teleport(Role::Seeker, at(4.0, 4.4, 0.0));

        let report = arena.tick([AgentAction::new(1.0, 0.0), AgentAction::default()]).unwrap();
        assert_eq!(report.state, EpisodeState::Active);
        let expected = -0.0025 - 0.25;
        assert!((report.rewards[Role::Seeker.index()] - expected).abs() < 1e-6);
        assert!((report.rewards[Role::Hider.index()] - 1.0 / 1000.0).abs() < 1e-6);

        let seeker = arena.agent(Role::Seeker);
        assert_eq!(arena.grid().world_to_cell(seeker.pose.position), spawn);
        assert!(seeker.episode_running);
        assert!(arena.agent(Role::Hider).episode_running);
        assert_eq!(arena.light_resets(), 1);
        assert_eq!(
            recorded.lock().unwrap().light_resets,
            vec![(Role::Seeker, Some(spawn))]
        );
        assert!(recorded.lock().unwrap().flashes.is_empty());
    }

    #[test]
    fn test_new_episode_clears_floor_flash() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 0, 0);
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(2.0, 2.0, 0.0));
        arena.teleport(Role::Hider, at(2.0, 2.2, 0.0));
        assert!(arena.tick(IDLE).unwrap().done());
        assert_eq!(arena.floor_color(), FloorColor::Green);

        arena.start_episode().unwrap();
        assert_eq!(arena.floor_color(), FloorColor::Gray);
        assert_eq!(recorded.lock().unwrap().reverts, 1);

        // Nothing left to revert on a clean restart.
        arena.start_episode().unwrap();
        assert_eq!(recorded.lock().unwrap().reverts, 1);
    }

    #[test]
    fn test_failed_generation_leaves_agents_idle() {
        let (mut arena, recorded) = arena(EpisodeMode::SeekerTraining, 3, 1);
        arena.pool = ObjectPool::with_tag(0, 0, 0);

        let result = arena.start_episode();
        assert!(matches!(
            result,
            Err(ArenaError::Pool(PoolError::PoolExhausted { .. }))
        ));
        assert_eq!(arena.state(), EpisodeState::Idle);
        assert_eq!(arena.episode_count(), 0);
        let seeker = arena.agent(Role::Seeker);
        assert_eq!(seeker.episodes_started, 0);
        assert!(!seeker.episode_running);
        assert_eq!(arena.grid().empty_count(), 25);
        assert!(recorded.lock().unwrap().starts.is_empty());
        assert!(matches!(arena.tick(IDLE), Err(ArenaError::EpisodeNotActive { .. })));
    }

    #[test]
    fn test_truncate_reports_running_episode() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 0, 0);
        arena.truncate();
        assert_eq!(arena.state(), EpisodeState::Idle);

        arena.start_episode().unwrap();
        arena.tick(IDLE).ok();
        arena.truncate();
        assert_eq!(arena.state(), EpisodeState::Terminated(Outcome::Truncated));
        assert!(!arena.agent(Role::Seeker).episode_running);

        arena.truncate();
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.ends.len(), 1);
        assert_eq!(recorded.ends[0].outcome, Outcome::Truncated);
    }

    #[test]
    fn test_seeker_finds_target() {
        let (mut arena, _) = arena(EpisodeMode::SeekerTraining, 0, 1);
        arena.start_episode().unwrap();
        let target = arena.generator().placements()[0].cell;
        let world = arena.grid().cell_to_world(target);
        arena.teleport(Role::Seeker, Pose::new(world.translate(0.0, -0.3), 0.0));

        let report = arena.tick([AgentAction::new(1.0, 0.0), AgentAction::default()]).unwrap();
        assert_eq!(
            report.state,
            EpisodeState::Terminated(Outcome::Captured(Found::Target(target)))
        );
        assert!((report.rewards[Role::Seeker.index()] - 1.0).abs() < 1e-6);
        assert!(!arena.grid().is_occupied(target));
        assert_eq!(arena.pool().in_use(EntityKind::Target), 0);
    }

    #[test]
    fn test_step_budget_truncates() {
        let mut config = config(EpisodeMode::HiderTraining, 0, 0);
        config.max_steps = 3;
        let mut arena = Arena::new(1, config).unwrap();
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(0.0, 0.0, 0.0));
        arena.teleport(Role::Hider, at(4.0, 4.0, 0.0));

        for _ in 0..2 {
            assert!(!arena.tick(IDLE).unwrap().done());
        }
        let report = arena.tick(IDLE).unwrap();
        assert_eq!(report.state, EpisodeState::Terminated(Outcome::Truncated));
        assert!((report.rewards[Role::Hider.index()] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_revisit_penalty_applies_on_return() {
        let mut config = config(EpisodeMode::SeekerTraining, 0, 0);
        config.target_count = 0;
        let mut arena = Arena::new(2, config).unwrap();
        arena.start_episode().unwrap();
        arena.teleport(Role::Seeker, at(2.0, 2.0, 0.0));

        let step = -0.0025;
        // Standing still on a fresh cell only marks it.
        let report = arena.tick(IDLE).unwrap();
        assert!((report.rewards[0] - step).abs() < 1e-6);
        // Staying on the same visited cell is not a revisit.
        let report = arena.tick(IDLE).unwrap();
        assert!((report.rewards[0] - step).abs() < 1e-6);

        arena.teleport(Role::Seeker, at(3.0, 2.0, 0.0));
        arena.tick(IDLE).unwrap();
        arena.teleport(Role::Seeker, at(2.0, 2.0, 0.0));
        let report = arena.tick(IDLE).unwrap();
        assert!((report.rewards[0] - (step - 0.01)).abs() < 1e-6);
    }

    #[test]
    fn test_restart_keeps_counters_in_sync() {
        let (mut arena, recorded) = arena(EpisodeMode::SelfPlay, 3, 0);
        arena.start_episode().unwrap();
        arena.tick(IDLE).ok();
        arena.start_episode().unwrap();

        assert_eq!(arena.episode_count(), 2);
        assert_eq!(arena.agent(Role::Seeker).episodes_started, 2);
        assert_eq!(arena.agent(Role::Hider).episodes_started, 2);
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.starts, vec![1, 2]);
        assert_eq!(recorded.ends.len(), 1);
        assert_eq!(recorded.ends[0].outcome, Outcome::Truncated);
    }

    #[test]
    fn test_regeneration_does_not_leak_pool_entities() {
        let mut config = config(EpisodeMode::SeekerTraining, 6, 1);
        config.layout = ObstacleLayout::Walls;
        let mut arena = Arena::new(3, config).unwrap();
        for _ in 0..20 {
            arena.start_episode().unwrap();
            let placed = arena.generator().placements().len();
            let in_use = arena.pool().in_use(EntityKind::Obstacle)
                + arena.pool().in_use(EntityKind::Target);
            assert_eq!(placed, in_use);
            assert_eq!(arena.grid().empty_count(), 25 - placed);
        }
    }

    #[test]
    fn test_full_grid_spawn_falls_back() {
        let mut config = ArenaConfig::default()
            .with_mode(EpisodeMode::SelfPlay)
            .with_floor(FloorBounds::new(WorldPoint::new(-1.0, 0.0, -1.0), 3.0, 3.0))
            .with_seed(5)
            .with_counts(0, 0);
        config.clear_radius = 0;
        let mut arena = Arena::new(4, config).unwrap();
        arena.start_episode().unwrap();
        assert_eq!(arena.state(), EpisodeState::Active);
        assert_eq!(arena.agent(Role::Seeker).spawn_cell, Some(Cell::new(0, 0)));
        assert_eq!(arena.agent(Role::Hider).spawn_cell, Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_observation_is_normalized() {
        let (mut arena, _) = arena(EpisodeMode::SelfPlay, 0, 0);
        arena.start_episode().unwrap();
        arena.teleport(Role::Hider, at(4.0, 1.0, 90.0));
        let obs = arena.observe(Role::Hider);
        assert_eq!(obs.len(), OBSERVATION_SIZE);
        assert!((obs[0] - 0.25).abs() < 1e-6);
        assert!((obs[1] - 0.5).abs() < 1e-6);
        assert!((obs[2] - 0.8).abs() < 1e-6);
        assert!((obs[3] - 0.2).abs() < 1e-6);
    }
}
