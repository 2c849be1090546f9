//! Spatial index: the obstacle set every collision query scans.
//!
//! Walls and committed furniture are kept as two flat lists that are rebuilt
//! from scratch on every change.  Queries are linear scans.  At tens of
//! objects (and comfortably up to a few hundred) this is faster than keeping a
//! tree up to date, and a full rebuild can never leave a stale entry behind.

use crate::registry::Registry;
use crate::types::{Aabb, InstanceId};

// ---------------------------------------------------------------------------
// Obstacles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Wall,
    /// Furniture, identified by the registry id of its instance.  The id is a
    /// lookup key only; the registry owns the instance.
    Furniture(InstanceId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub bounds: Aabb,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn wall(bounds: Aabb) -> Self {
        Self {
            bounds,
            kind: ObstacleKind::Wall,
        }
    }

    pub fn furniture(id: InstanceId, bounds: Aabb) -> Self {
        Self {
            bounds,
            kind: ObstacleKind::Furniture(id),
        }
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        match self.kind {
            ObstacleKind::Furniture(id) => Some(id),
            ObstacleKind::Wall => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpatialIndex {
    walls: Vec<Obstacle>,
    furniture: Vec<Obstacle>,
    half_width: f64,
    half_depth: f64,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every wall obstacle and the room half-extents.
    pub fn rebuild_walls(&mut self, walls: &[Aabb], width: f64, depth: f64) {
        self.walls = walls.iter().copied().map(Obstacle::wall).collect();
        self.half_width = width / 2.0;
        self.half_depth = depth / 2.0;
    }

    /// Recompute the obstacle box of every committed instance.
    pub fn rebuild_furniture_obstacles(&mut self, registry: &Registry) {
        self.furniture = registry
            .instances()
            .map(|f| Obstacle::furniture(f.id, f.bounds))
            .collect();
    }

    pub fn walls(&self) -> &[Obstacle] {
        &self.walls
    }

    pub fn furniture(&self) -> &[Obstacle] {
        &self.furniture
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn half_depth(&self) -> f64 {
        self.half_depth
    }

    /// True if the box's X/Z footprint lies inside the room half-extents.
    pub fn contains(&self, bounds: &Aabb) -> bool {
        bounds.min.x >= -self.half_width
            && bounds.max.x <= self.half_width
            && bounds.min.z >= -self.half_depth
            && bounds.max.z <= self.half_depth
    }

    pub fn first_wall_hit(&self, bounds: &Aabb) -> Option<&Obstacle> {
        self.walls.iter().find(|w| w.bounds.intersects(bounds))
    }

    /// First furniture obstacle overlapping `bounds` whose id is not in
    /// `exclude`.
    pub fn first_furniture_hit(&self, bounds: &Aabb, exclude: &[InstanceId]) -> Option<&Obstacle> {
        self.furniture.iter().find(|o| {
            !matches!(o.kind, ObstacleKind::Furniture(id) if exclude.contains(&id))
                && o.bounds.intersects(bounds)
        })
    }
}
