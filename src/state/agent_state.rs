use crate::infra::{Cell, Pose, Role};

/// How a reward is applied to the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reward {
    /// Accumulate onto the step reward.
    Add(f32),
    /// Replace whatever the step has accumulated so far.
    Set(f32),
}

impl Reward {
    pub fn value(&self) -> f32 {
        match self {
            Reward::Add(v) | Reward::Set(v) => *v,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentState {
    pub role: Role,
    pub pose: Pose,
    /// Whether the current mode steps and scores this agent.
    pub is_active: bool,
    /// Cell designated at episode start, used by light resets.
    pub spawn_cell: Option<Cell>,
    pub previous_cell: Option<Cell>,
    /// Last clamped forward input, reported in observations.
    pub forward_amount: f32,
    pub step_reward: f32,
    pub episode_reward: f32,
    pub episode_steps: usize,
    pub episodes_started: u32,
    pub episode_running: bool,
}

impl AgentState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            pose: Pose::default(),
            is_active: false,
            spawn_cell: None,
            previous_cell: None,
            forward_amount: 0.0,
            step_reward: 0.0,
            episode_reward: 0.0,
            episode_steps: 0,
            episodes_started: 0,
            episode_running: false,
        }
    }

    pub fn begin_episode(&mut self, pose: Pose, spawn_cell: Option<Cell>) {
        self.pose = pose;
        self.spawn_cell = spawn_cell;
        self.previous_cell = spawn_cell;
        self.forward_amount = 0.0;
        self.step_reward = 0.0;
        self.episode_reward = 0.0;
        self.episode_steps = 0;
        self.episodes_started += 1;
        self.episode_running = true;
    }

    pub fn begin_step(&mut self) {
        self.step_reward = 0.0;
    }

    pub fn apply(&mut self, reward: Reward) {
        match reward {
            Reward::Add(v) => self.step_reward += v,
            Reward::Set(v) => self.step_reward = v,
        }
    }

    /// Fold the step reward into the episode total and return it.
    pub fn commit_step(&mut self) -> f32 {
        self.episode_reward += self.step_reward;
        self.step_reward
    }

    pub fn end_episode(&mut self) {
        self.episode_running = false;
    }
}
