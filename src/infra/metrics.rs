//! Episode statistics across arenas

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::arena::{EpisodeMode, EpisodeSummary, Found, Outcome};
use crate::infra::{ArenaObserver, Cell, Role};

/// Moving average calculator
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f32>,
    window_size: usize,
    sum: f32,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.window_size {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f32 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f32
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArenaStats {
    pub episodes: usize,
    pub captures: usize,
    pub total_steps: usize,
}

/// Aggregate outcome counters and reward averages
#[derive(Debug, Clone)]
pub struct EpisodeMetrics {
    pub num_episodes: usize,
    pub target_captures: usize,
    pub hider_captures: usize,
    pub wall_failures: usize,
    pub truncations: usize,
    pub light_resets: usize,
    pub total_steps: usize,
    pub seeker_rewards: MovingAverage,
    pub hider_rewards: MovingAverage,
    pub arena_stats: HashMap<usize, ArenaStats>,
}

impl EpisodeMetrics {
    pub fn new(window_size: usize) -> Self {
        Self {
            num_episodes: 0,
            target_captures: 0,
            hider_captures: 0,
            wall_failures: 0,
            truncations: 0,
            light_resets: 0,
            total_steps: 0,
            seeker_rewards: MovingAverage::new(window_size),
            hider_rewards: MovingAverage::new(window_size),
            arena_stats: HashMap::new(),
        }
    }

    pub fn record_episode(&mut self, arena_id: usize, summary: &EpisodeSummary) {
        self.num_episodes += 1;
        self.total_steps += summary.steps;
        self.light_resets += summary.light_resets as usize;
        self.seeker_rewards.push(summary.seeker_reward);
        self.hider_rewards.push(summary.hider_reward);

        let captured = matches!(summary.outcome, Outcome::Captured(_));
        match summary.outcome {
            Outcome::Captured(Found::Target(_)) => self.target_captures += 1,
            Outcome::Captured(Found::Hider) => self.hider_captures += 1,
            Outcome::WallCollision { .. } => self.wall_failures += 1,
            Outcome::Truncated => self.truncations += 1,
        }

        let stats = self.arena_stats.entry(arena_id).or_default();
        stats.episodes += 1;
        stats.total_steps += summary.steps;
        if captured {
            stats.captures += 1;
        }
    }

    pub fn capture_rate(&self) -> f32 {
        if self.num_episodes > 0 {
            (self.target_captures + self.hider_captures) as f32 / self.num_episodes as f32
        } else {
            0.0
        }
    }

    pub fn avg_steps(&self) -> f32 {
        if self.num_episodes > 0 {
            self.total_steps as f32 / self.num_episodes as f32
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        tracing::info!("=== Episode Summary ===");
        tracing::info!("Episodes: {}", self.num_episodes);
        tracing::info!("Capture Rate: {:.1}%", self.capture_rate() * 100.0);
        tracing::info!(
            "Outcomes: {} targets, {} hiders, {} walls, {} truncated",
            self.target_captures,
            self.hider_captures,
            self.wall_failures,
            self.truncations
        );
        tracing::info!("Light Resets: {}", self.light_resets);
        tracing::info!("Avg Steps: {:.1}", self.avg_steps());
        tracing::info!(
            "Avg Reward: seeker={:.3}, hider={:.3}",
            self.seeker_rewards.average(),
            self.hider_rewards.average()
        );

        let mut arenas: Vec<_> = self.arena_stats.keys().collect();
        arenas.sort();
        for &arena in &arenas {
            let stats = &self.arena_stats[arena];
            tracing::info!(
                "  Arena {}: {} episodes, {} captures, {} steps",
                arena,
                stats.episodes,
                stats.captures,
                stats.total_steps
            );
        }
    }
}

impl Default for EpisodeMetrics {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Observer that feeds finished episodes into shared metrics
pub struct MetricsObserver {
    shared: Arc<Mutex<EpisodeMetrics>>,
}

impl MetricsObserver {
    pub fn new(shared: Arc<Mutex<EpisodeMetrics>>) -> Self {
        Self { shared }
    }
}

impl ArenaObserver for MetricsObserver {
    fn on_episode_start(
        &mut self,
        _arena_id: usize,
        _episode: u32,
        _mode: EpisodeMode,
        _spawns: &[(Role, Option<Cell>)],
    ) {
    }

    fn on_episode_end(&mut self, arena_id: usize, summary: &EpisodeSummary) {
        if let Ok(mut metrics) = self.shared.lock() {
            metrics.record_episode(arena_id, summary);
        }
    }
}
