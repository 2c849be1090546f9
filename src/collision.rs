//! Collision classification for a single candidate box.
//!
//! Checks run cheapest first: room boundary, then walls, then furniture.  The
//! first hit wins.  Queries never mutate anything.

use crate::error::RequestError;
use crate::spatial::{Obstacle, SpatialIndex};
use crate::types::{Aabb, InstanceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollisionType {
    None,
    Boundary,
    Wall,
    Furniture,
}

impl std::fmt::Display for CollisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CollisionType::None => "none",
            CollisionType::Boundary => "boundary",
            CollisionType::Wall => "wall",
            CollisionType::Furniture => "furniture",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    pub collision_type: CollisionType,
    /// The obstacle that was hit (walls and furniture only).
    pub collider: Option<Obstacle>,
}

impl CollisionResult {
    pub fn none() -> Self {
        Self {
            collision_type: CollisionType::None,
            collider: None,
        }
    }

    fn boundary() -> Self {
        Self {
            collision_type: CollisionType::Boundary,
            collider: None,
        }
    }

    fn hit(collision_type: CollisionType, obstacle: &Obstacle) -> Self {
        Self {
            collision_type,
            collider: Some(*obstacle),
        }
    }

    pub fn is_colliding(&self) -> bool {
        self.collision_type != CollisionType::None
    }

    /// Registry id of the furniture that was hit, if any.
    pub fn collider_id(&self) -> Option<InstanceId> {
        self.collider.and_then(|o| o.instance_id())
    }
}

/// Read-only collision queries against a [`SpatialIndex`].
#[derive(Clone, Copy)]
pub struct CollisionEngine<'a> {
    index: &'a SpatialIndex,
}

impl<'a> CollisionEngine<'a> {
    pub fn new(index: &'a SpatialIndex) -> Self {
        Self { index }
    }

    /// Classify `moving` against the room, skipping the instance `exclude`.
    pub fn check_collision(
        &self,
        moving: &Aabb,
        exclude: Option<InstanceId>,
    ) -> Result<CollisionResult, RequestError> {
        match exclude {
            Some(id) => self.check_collision_excluding(moving, &[id]),
            None => self.check_collision_excluding(moving, &[]),
        }
    }

    /// Like [`check_collision`](Self::check_collision) but skips every
    /// furniture obstacle whose id is listed.
    pub fn check_collision_excluding(
        &self,
        moving: &Aabb,
        exclude: &[InstanceId],
    ) -> Result<CollisionResult, RequestError> {
        if !moving.is_well_formed() {
            return Err(RequestError::MalformedBox);
        }

        if !self.index.contains(moving) {
            return Ok(CollisionResult::boundary());
        }

        if let Some(wall) = self.index.first_wall_hit(moving) {
            return Ok(CollisionResult::hit(CollisionType::Wall, wall));
        }

        if let Some(obstacle) = self.index.first_furniture_hit(moving, exclude) {
            return Ok(CollisionResult::hit(CollisionType::Furniture, obstacle));
        }

        Ok(CollisionResult::none())
    }
}
