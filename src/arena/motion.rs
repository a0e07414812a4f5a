//! Seams to the physics layer: the motion primitive and contact detection.

use crate::infra::{Cell, Pose, Role};
use crate::state::OccupancyGrid;

/// Continuous action for one agent: forward drive and turn, both in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AgentAction {
    pub forward: f32,
    pub turn: f32,
}

impl AgentAction {
    pub fn new(forward: f32, turn: f32) -> Self {
        Self { forward, turn }
    }
}

pub trait MotionModel: Send {
    /// Move the agent by `forward` along its heading and rotate by `turn`.
    fn apply_motion(&self, pose: Pose, forward: f32, turn: f32) -> Pose;
}

#[derive(Debug, Clone)]
pub struct MotionConfig {
    pub move_speed: f32,
    /// Degrees per second at full turn input.
    pub rotation_speed: f32,
    pub delta_time: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            rotation_speed: 100.0,
            delta_time: 0.02,
        }
    }
}

/// Integrates position along the current heading, then applies the turn.
/// Agents cannot reverse: negative forward input is clamped to zero.
#[derive(Debug, Clone, Default)]
pub struct KinematicMotion {
    config: MotionConfig,
}

impl KinematicMotion {
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }
}

impl MotionModel for KinematicMotion {
    fn apply_motion(&self, pose: Pose, forward: f32, turn: f32) -> Pose {
        let forward = forward.clamp(0.0, 1.0);
        let turn = turn.clamp(-1.0, 1.0);
        let (dx, dz) = pose.forward();
        let distance = forward * self.config.move_speed * self.config.delta_time;
        let position = pose.position.translate(dx * distance, dz * distance);
        let heading = pose.heading_deg + turn * self.config.rotation_speed * self.config.delta_time;
        Pose::new(position, heading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    /// Ran into an obstacle; the move does not happen.
    Blocked,
    /// Left the playable grid and hit the arena wall.
    Wall,
    /// Seeker touched a target placed in `cell`.
    Target { cell: Cell },
    /// Seeker and hider share a cell, whichever of them moved.
    Opponent,
}

pub trait ContactSensor: Send {
    /// Classify what `role` touches at `pose`. `opponent` is the other
    /// agent's pose when it is taking part in the episode.
    fn probe(&self, grid: &OccupancyGrid, role: Role, pose: &Pose, opponent: Option<&Pose>)
    -> Contact;
}

/// Cell-level contact detection against the occupancy grid.
#[derive(Debug, Clone, Default)]
pub struct GridContactSensor;

impl ContactSensor for GridContactSensor {
    fn probe(
        &self,
        grid: &OccupancyGrid,
        role: Role,
        pose: &Pose,
        opponent: Option<&Pose>,
    ) -> Contact {
        let cell = grid.world_to_cell(pose.position);
        if !grid.contains(&cell) {
            return Contact::Wall;
        }

        if let Some(other) = opponent {
            if grid.world_to_cell(other.position) == cell {
                return Contact::Opponent;
            }
        }

        match grid.get_occupant(cell) {
            Some(occupant) if occupant.is_obstacle() => Contact::Blocked,
            // Only the seeker can pick up a target; it is solid for the hider.
            Some(occupant) if occupant.is_target() => match role {
                Role::Seeker => Contact::Target { cell },
                Role::Hider => Contact::Blocked,
            },
            _ => Contact::None,
        }
    }
}
