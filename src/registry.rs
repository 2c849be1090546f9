//! Furniture registry: committed instances, owned in one place.

use crate::types::{Aabb, InstanceId, Vec3};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Furniture instance
// ---------------------------------------------------------------------------

/// A piece of furniture committed to the room.
#[derive(Debug, Clone, PartialEq)]
pub struct FurnitureInstance {
    pub id: InstanceId,
    pub asset_id: String,
    pub category: String,
    /// World position of the asset origin.
    pub position: Vec3,
    /// Rotation about +Y in radians.
    pub rotation_y: f64,
    pub placeable: bool,
    /// Physical width the asset was normalised to.
    pub declared_width: f64,
    /// Uniform scale applied to the raw geometry.
    pub scale: f64,
    /// Raw, unscaled local bounds the world box is derived from.
    pub local_bounds: Aabb,
    /// Current world-space box.
    pub bounds: Aabb,
    /// Instance this one rested on when committed.  Cleared when that
    /// instance is deregistered; moves do not re-resolve it.
    pub support: Option<InstanceId>,
}

impl FurnitureInstance {
    /// Recompute `bounds` from the current transform.
    pub fn refresh_bounds(&mut self) {
        self.bounds = self
            .local_bounds
            .transformed(self.scale, self.rotation_y, self.position);
    }

    /// Height of the top face.
    pub fn top(&self) -> f64 {
        self.bounds.max.y
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds every committed instance, keyed by id in commit order.
///
/// Mutation goes through `RoomState`, which keeps the spatial index in step.
#[derive(Debug, Default)]
pub struct Registry {
    instances: BTreeMap<InstanceId, FurnitureInstance>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the id the next committed instance will receive.
    pub(crate) fn allocate_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    pub(crate) fn insert(&mut self, instance: FurnitureInstance) {
        self.instances.insert(instance.id, instance);
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<FurnitureInstance> {
        self.instances.remove(&id)
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut FurnitureInstance> {
        self.instances.get_mut(&id)
    }

    /// Detach every instance resting on `support`.  Returns how many were.
    pub(crate) fn clear_support(&mut self, support: InstanceId) -> usize {
        let mut count = 0;
        for f in self.instances.values_mut() {
            if f.support == Some(support) {
                f.support = None;
                count += 1;
            }
        }
        count
    }

    pub fn get(&self, id: InstanceId) -> Option<&FurnitureInstance> {
        self.instances.get(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// All instances in commit order.
    pub fn instances(&self) -> impl Iterator<Item = &FurnitureInstance> {
        self.instances.values()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
