//! Surface resolution: which committed instance a placeable item rests on.

use crate::catalog::AssetMetadata;
use crate::placement::PlacementRequest;
use crate::registry::{FurnitureInstance, Registry};
use crate::types::{InstanceId, SurfacePolicy};

/// Where a request should rest.  `support == None` means the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceResolution {
    pub support: Option<InstanceId>,
    pub target_height: f64,
}

impl SurfaceResolution {
    pub fn floor() -> Self {
        Self {
            support: None,
            target_height: 0.0,
        }
    }

    fn on(instance: &FurnitureInstance) -> Self {
        Self {
            support: Some(instance.id),
            target_height: instance.top(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceResolver {
    policy: SurfacePolicy,
}

impl SurfaceResolver {
    pub fn new(policy: SurfacePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SurfacePolicy {
        &self.policy
    }

    /// Pick a support for `request`.
    ///
    /// Non-placeable assets always go to the floor.  Otherwise the uppermost
    /// surface whose footprint contains the requested point wins; failing
    /// that, the nearest footprint within the search radius.  No candidate
    /// is a valid outcome and resolves to the floor.
    pub fn resolve_surface(
        &self,
        request: &PlacementRequest,
        asset: &AssetMetadata,
        registry: &Registry,
    ) -> SurfaceResolution {
        if !asset.placeable {
            return SurfaceResolution::floor();
        }

        let (x, z) = (request.x, request.z);
        let zone = self.policy.zone_of(asset.display_name());
        let candidates = || {
            registry
                .instances()
                .filter(move |f| !f.placeable && self.policy.accepts(&f.category, zone))
        };

        // Strict comparisons keep the earliest-committed candidate on ties.
        let mut best: Option<&FurnitureInstance> = None;
        for f in candidates() {
            if !f.bounds.footprint_contains(x, z, self.policy.contain_tolerance) {
                continue;
            }
            if best.map_or(true, |b| f.top() > b.top()) {
                best = Some(f);
            }
        }
        if let Some(f) = best {
            log::debug!("'{}' rests on {} (contains point)", asset.id, f.id);
            return SurfaceResolution::on(f);
        }

        let mut nearest: Option<(&FurnitureInstance, f64)> = None;
        for f in candidates() {
            let d = f.bounds.footprint_distance(x, z);
            if d > self.policy.search_radius {
                continue;
            }
            if nearest.map_or(true, |(_, nd)| d < nd) {
                nearest = Some((f, d));
            }
        }
        match nearest {
            Some((f, d)) => {
                log::debug!("'{}' rests on {} ({:.2} m away)", asset.id, f.id, d);
                SurfaceResolution::on(f)
            }
            None => {
                log::debug!("'{}' found no surface near ({:.2}, {:.2})", asset.id, x, z);
                SurfaceResolution::floor()
            }
        }
    }

    /// Spot and rotation for `asset` once it is known to rest on `support`.
    ///
    /// Known accessories are offset by a fraction of the support's footprint
    /// so a desk ends up arranged rather than stacked in one place: screens
    /// to the back, keyboards to the front, mice and phones to the right,
    /// lamps into the back-left corner.  The item always takes the support's
    /// rotation.
    pub fn arrange(
        &self,
        asset: &AssetMetadata,
        x: f64,
        z: f64,
        support: &FurnitureInstance,
    ) -> (f64, f64, f64) {
        let size = support.bounds.size();
        let name = asset.display_name().to_lowercase();
        let (dx, dz) = match name.as_str() {
            "monitor" => (0.0, -0.25),
            "keyboard" | "laptop" => (0.0, 0.2),
            "mouse" | "phone" => (0.3, 0.0),
            n if n.contains("tv") => (0.0, -0.25),
            n if n.contains("lamp") => (-0.35, -0.3),
            _ => (0.0, 0.0),
        };
        (x + dx * size.x, z + dz * size.z, support.rotation_y)
    }
}
