//! Room dimensions, wall geometry, and the room state every placement reads.

use crate::collision::{CollisionEngine, CollisionResult};
use crate::error::RequestError;
use crate::registry::{FurnitureInstance, Registry};
use crate::spatial::SpatialIndex;
use crate::types::{Aabb, InstanceId, RoomConfig, RoomStats, Vec3};

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Room {
    pub width: f64,
    pub depth: f64,
}

impl Room {
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_depth(&self) -> f64 {
        self.depth / 2.0
    }
}

/// Four walls centred on the room edges: back, front, left, right.
pub fn wall_geometry(room: &Room, thickness: f64, height: f64) -> Vec<Aabb> {
    let (hw, hd) = (room.half_width(), room.half_depth());
    [
        (room.width, thickness, 0.0, -hd),
        (room.width, thickness, 0.0, hd),
        (thickness, room.depth, -hw, 0.0),
        (thickness, room.depth, hw, 0.0),
    ]
    .into_iter()
    .map(|(w, d, x, z)| {
        Aabb::from_center_size(Vec3::new(x, height / 2.0, z), Vec3::new(w, height, d))
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Room manager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RoomManager {
    room: Room,
    wall_thickness: f64,
    wall_height: f64,
    walls: Vec<Aabb>,
}

impl RoomManager {
    pub fn new(config: &RoomConfig) -> Result<Self, RequestError> {
        let room = validate_room(config.width, config.depth)?;
        for (field, v) in [
            ("wall_thickness", config.wall_thickness),
            ("wall_height", config.wall_height),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(RequestError::InvalidConfig { field });
            }
        }
        let walls = wall_geometry(&room, config.wall_thickness, config.wall_height);
        Ok(Self {
            room,
            wall_thickness: config.wall_thickness,
            wall_height: config.wall_height,
            walls,
        })
    }

    pub fn room(&self) -> Room {
        self.room
    }

    pub fn walls(&self) -> &[Aabb] {
        &self.walls
    }

    pub fn wall_thickness(&self) -> f64 {
        self.wall_thickness
    }

    /// Regenerate the walls for new dimensions and push them into `index`.
    pub fn resize(
        &mut self,
        width: f64,
        depth: f64,
        index: &mut SpatialIndex,
    ) -> Result<(), RequestError> {
        self.room = validate_room(width, depth)?;
        self.walls = wall_geometry(&self.room, self.wall_thickness, self.wall_height);
        index.rebuild_walls(&self.walls, width, depth);
        log::info!("Room resized to {:.2} x {:.2}", width, depth);
        Ok(())
    }
}

fn validate_room(width: f64, depth: f64) -> Result<Room, RequestError> {
    if !(width.is_finite() && depth.is_finite() && width > 0.0 && depth > 0.0) {
        return Err(RequestError::InvalidRoom { width, depth });
    }
    Ok(Room { width, depth })
}

// ---------------------------------------------------------------------------
// Room state
// ---------------------------------------------------------------------------

/// Room, registry and spatial index bundled together.
///
/// All mutation funnels through `commit`, `deregister`, `move_instance` and
/// `resize`, each of which leaves the index matching the registry.  Hold a
/// `&mut RoomState` (or the service lock) for the whole of a placement.
#[derive(Debug)]
pub struct RoomState {
    manager: RoomManager,
    registry: Registry,
    index: SpatialIndex,
}

impl RoomState {
    pub fn new(config: &RoomConfig) -> Result<Self, RequestError> {
        let manager = RoomManager::new(config)?;
        let mut index = SpatialIndex::new();
        let room = manager.room();
        index.rebuild_walls(manager.walls(), room.width, room.depth);
        Ok(Self {
            manager,
            registry: Registry::new(),
            index,
        })
    }

    pub fn room(&self) -> Room {
        self.manager.room()
    }

    pub fn manager(&self) -> &RoomManager {
        &self.manager
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn collision(&self) -> CollisionEngine<'_> {
        CollisionEngine::new(&self.index)
    }

    pub(crate) fn allocate_id(&mut self) -> InstanceId {
        self.registry.allocate_id()
    }

    /// Register a resolved, collision-free instance.
    pub(crate) fn commit(&mut self, instance: FurnitureInstance) {
        log::info!(
            "Committed {} '{}' at {}",
            instance.id,
            instance.asset_id,
            instance.position
        );
        self.registry.insert(instance);
        self.index.rebuild_furniture_obstacles(&self.registry);
    }

    /// Drop an instance from the registry and the obstacle set.
    ///
    /// Items that rested on it keep their position but lose their support.
    pub fn deregister(&mut self, id: InstanceId) -> Option<FurnitureInstance> {
        let removed = self.registry.remove(id)?;
        let orphaned = self.registry.clear_support(id);
        self.index.rebuild_furniture_obstacles(&self.registry);
        log::info!("Deregistered {} '{}'", id, removed.asset_id);
        if orphaned > 0 {
            log::warn!("{} item(s) that rested on {} are now unsupported", orphaned, id);
        }
        Some(removed)
    }

    /// Move an instance if the new transform is collision-free.
    ///
    /// The instance's own obstacle and its support are ignored.  When the
    /// result is colliding nothing changes.  Height and support are kept as
    /// they are: a moved accessory is not re-resolved, and items resting on a
    /// moved instance stay where they were.
    pub fn move_instance(
        &mut self,
        id: InstanceId,
        x: f64,
        z: f64,
        rotation_y: f64,
    ) -> Result<CollisionResult, RequestError> {
        for (field, v) in [("x", x), ("z", z), ("rotation_y", rotation_y)] {
            if !v.is_finite() {
                return Err(RequestError::NonFinite { field });
            }
        }
        let current = self
            .registry
            .get(id)
            .ok_or(RequestError::UnknownInstance(id))?;

        let mut moved = current.clone();
        moved.position.x = x;
        moved.position.z = z;
        moved.rotation_y = rotation_y;
        moved.refresh_bounds();

        let exclude: Vec<InstanceId> = std::iter::once(id).chain(moved.support).collect();
        let result = self
            .collision()
            .check_collision_excluding(&moved.bounds, &exclude)?;
        if result.is_colliding() {
            log::debug!("Move of {} rejected: {}", id, result.collision_type);
            return Ok(result);
        }

        if let Some(slot) = self.registry.get_mut(id) {
            *slot = moved;
        }
        self.index.rebuild_furniture_obstacles(&self.registry);
        Ok(result)
    }

    /// Resize the room.  Returns the instances that no longer fit inside it.
    pub fn resize(&mut self, width: f64, depth: f64) -> Result<Vec<InstanceId>, RequestError> {
        self.manager.resize(width, depth, &mut self.index)?;
        let outside: Vec<InstanceId> = self
            .registry
            .instances()
            .filter(|f| !self.index.contains(&f.bounds))
            .map(|f| f.id)
            .collect();
        if !outside.is_empty() {
            log::warn!("{} instance(s) now lie outside the room", outside.len());
        }
        Ok(outside)
    }

    pub fn stats(&self) -> RoomStats {
        let room = self.room();
        RoomStats {
            width: room.width,
            depth: room.depth,
            instances: self.registry.len(),
            wall_obstacles: self.index.walls().len(),
            furniture_obstacles: self.index.furniture().len(),
        }
    }
}
