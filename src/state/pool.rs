use std::collections::VecDeque;

use tracing::trace;

use crate::infra::{PoolError, WorldPoint};
use crate::state::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Obstacle,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Scale {
    pub const ONE: Scale = Scale {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: WorldPoint,
    pub scale: Scale,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: WorldPoint::ZERO,
            scale: Scale::ONE,
        }
    }
}

/// A reusable obstacle or target. Only an `ObjectPool` can create one, and
/// releasing consumes it, so an acquisition can be returned at most once.
#[derive(Debug, PartialEq)]
pub struct PooledEntity {
    id: EntityId,
    kind: EntityKind,
    pool_tag: u32,
    active: bool,
    pub transform: Transform,
}

impl PooledEntity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Arena-owned obstacle and target queues, filled once and never grown.
#[derive(Debug)]
pub struct ObjectPool {
    tag: u32,
    obstacles: VecDeque<PooledEntity>,
    targets: VecDeque<PooledEntity>,
    obstacle_capacity: usize,
    target_capacity: usize,
}

impl ObjectPool {
    pub fn new(obstacle_capacity: usize, target_capacity: usize) -> Self {
        Self::with_tag(0, obstacle_capacity, target_capacity)
    }

    /// `tag` distinguishes pools of different arenas; entities remember it.
    pub fn with_tag(tag: u32, obstacle_capacity: usize, target_capacity: usize) -> Self {
        let make = |kind: EntityKind, offset: usize, count: usize| -> VecDeque<PooledEntity> {
            (0..count)
                .map(|i| PooledEntity {
                    id: EntityId((offset + i) as u32),
                    kind,
                    pool_tag: tag,
                    active: false,
                    transform: Transform::default(),
                })
                .collect()
        };

        Self {
            tag,
            obstacles: make(EntityKind::Obstacle, 0, obstacle_capacity),
            targets: make(EntityKind::Target, obstacle_capacity, target_capacity),
            obstacle_capacity,
            target_capacity,
        }
    }

    pub fn acquire_obstacle(&mut self) -> Result<PooledEntity, PoolError> {
        self.acquire(EntityKind::Obstacle)
    }

    pub fn acquire_target(&mut self) -> Result<PooledEntity, PoolError> {
        self.acquire(EntityKind::Target)
    }

    pub fn acquire(&mut self, kind: EntityKind) -> Result<PooledEntity, PoolError> {
        let mut entity = self
            .queue_mut(kind)
            .pop_front()
            .ok_or(PoolError::PoolExhausted { kind })?;
        entity.active = true;
        trace!(id = %entity.id, ?kind, "Acquired pooled entity");
        Ok(entity)
    }

    /// Reset the entity and put it back in its queue.
    pub fn release(&mut self, mut entity: PooledEntity) -> Result<(), PoolError> {
        if entity.pool_tag != self.tag {
            return Err(PoolError::ForeignEntity { id: entity.id.0 });
        }
        entity.transform = Transform::default();
        entity.active = false;
        trace!(id = %entity.id, kind = ?entity.kind, "Released pooled entity");
        let kind = entity.kind;
        self.queue_mut(kind).push_back(entity);
        Ok(())
    }

    pub fn available(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Obstacle => self.obstacles.len(),
            EntityKind::Target => self.targets.len(),
        }
    }

    pub fn capacity(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Obstacle => self.obstacle_capacity,
            EntityKind::Target => self.target_capacity,
        }
    }

    pub fn in_use(&self, kind: EntityKind) -> usize {
        self.capacity(kind) - self.available(kind)
    }

    fn queue_mut(&mut self, kind: EntityKind) -> &mut VecDeque<PooledEntity> {
        match kind {
            EntityKind::Obstacle => &mut self.obstacles,
            EntityKind::Target => &mut self.targets,
        }
    }
}
