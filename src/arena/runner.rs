//! Drives an arena with a pair of policies

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::arena::{AgentAction, Arena, EpisodeSummary, Outcome};
use crate::infra::{ArenaError, Role};

/// Chooses an action for `role` from its observation.
pub trait Policy: Send {
    fn act(&mut self, role: Role, observation: &[f32]) -> AgentAction;
}

/// Uniform random forward/turn inputs.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _role: Role, _observation: &[f32]) -> AgentAction {
        AgentAction::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        )
    }
}

/// Runs full episodes on one arena. Inactive roles get an idle action.
pub struct ArenaRunner<P: Policy> {
    arena: Arena,
    policies: [P; 2],
    /// Tick cap for arenas configured without a step budget.
    max_ticks: usize,
}

impl<P: Policy> ArenaRunner<P> {
    pub fn new(arena: Arena, seeker: P, hider: P) -> Self {
        Self {
            arena,
            policies: [seeker, hider],
            max_ticks: 10_000,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: usize) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Play one episode to its end and return what happened.
    pub fn run_episode(&mut self) -> Result<EpisodeSummary, ArenaError> {
        self.arena.start_episode()?;
        let mut rewards = [0.0f32; 2];
        let mut steps = 0;

        loop {
            let mut actions = [AgentAction::default(); 2];
            for role in self.arena.mode().active_roles() {
                let observation = self.arena.observe(role);
                actions[role.index()] = self.policies[role.index()].act(role, &observation);
            }

            let report = self.arena.tick(actions)?;
            steps += 1;
            for role in Role::ALL {
                rewards[role.index()] += report.rewards[role.index()];
            }

            if let Some(outcome) = report.state.outcome() {
                return Ok(self.summary(outcome, steps, rewards));
            }
            if steps >= self.max_ticks {
                debug!("Arena {} hit the runner tick cap", self.arena.id());
                self.arena.truncate();
                return Ok(self.summary(Outcome::Truncated, steps, rewards));
            }
        }
    }

    /// Play `episodes` episodes back to back.
    pub fn run(&mut self, episodes: usize) -> Result<Vec<EpisodeSummary>, ArenaError> {
        (0..episodes).map(|_| self.run_episode()).collect()
    }

    fn summary(&self, outcome: Outcome, steps: usize, rewards: [f32; 2]) -> EpisodeSummary {
        EpisodeSummary {
            episode: self.arena.episode_count(),
            outcome,
            steps,
            seeker_reward: rewards[Role::Seeker.index()],
            hider_reward: rewards[Role::Hider.index()],
            light_resets: self.arena.light_resets(),
        }
    }
}
