//! Placement engine: turn a request into a committed instance or a failure.
//!
//! ```text
//! Pending → Resolving(surface) → Searching(attempt 1..N) → Committed | Failed
//! ```
//!
//! Each attempt builds the candidate box, runs exactly one collision query
//! and either commits or nudges the candidate.  Nothing in the room state
//! changes unless the request commits.

use crate::catalog::AssetMetadata;
use crate::collision::CollisionType;
use crate::error::RequestError;
use crate::registry::FurnitureInstance;
use crate::room::RoomState;
use crate::surface::{SurfaceResolution, SurfaceResolver};
use crate::types::{Aabb, Geometry, InstanceId, PlacementConfig, UnsupportedPolicy, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// A proposed transform for one asset.  Consumed by a single `place` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub asset_id: String,
    pub x: f64,
    pub z: f64,
    /// Stacking height hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Rotation about +Y in radians.
    #[serde(default)]
    pub rotation_y: f64,
}

impl PlacementRequest {
    pub fn new(asset_id: impl Into<String>, x: f64, z: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            x,
            z,
            y: None,
            rotation_y: 0.0,
        }
    }

    pub fn with_height(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_rotation(mut self, rotation_y: f64) -> Self {
        self.rotation_y = rotation_y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureReason {
    /// Every attempt collided; `last_collision` is what the final one hit.
    Exhausted { last_collision: CollisionType },
    /// A placeable item found no surface and the policy forbids the floor.
    NoSupport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementFailure {
    pub asset_id: String,
    /// Collision queries spent before giving up.
    pub attempts: u32,
    pub reason: FailureReason,
}

impl std::fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            FailureReason::Exhausted { last_collision } => write!(
                f,
                "'{}' found no free spot after {} attempts (last hit: {})",
                self.asset_id, self.attempts, last_collision
            ),
            FailureReason::NoSupport => write!(f, "'{}' has no surface to rest on", self.asset_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    Committed {
        instance: FurnitureInstance,
        attempts: u32,
    },
    Failed(PlacementFailure),
}

impl PlacementOutcome {
    pub fn instance(&self) -> Option<&FurnitureInstance> {
        match self {
            PlacementOutcome::Committed { instance, .. } => Some(instance),
            PlacementOutcome::Failed(_) => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PlacementOutcome::Committed { attempts, .. } => *attempts,
            PlacementOutcome::Failed(f) => f.attempts,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, PlacementOutcome::Committed { .. })
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
    surfaces: SurfaceResolver,
}

impl PlacementEngine {
    /// Rejects configurations the search cannot run with (negative or
    /// non-finite distances).
    pub fn new(config: PlacementConfig, surfaces: SurfaceResolver) -> Result<Self, RequestError> {
        config.validate()?;
        surfaces.policy().validate()?;
        Ok(Self { config, surfaces })
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &SurfaceResolver {
        &self.surfaces
    }

    /// Place one asset.
    ///
    /// Returns `Err` only for malformed input.  Search failures come back as
    /// [`PlacementOutcome::Failed`] with the room state untouched.
    pub fn place<R: Rng + ?Sized>(
        &self,
        request: &PlacementRequest,
        asset: &AssetMetadata,
        geometry: &Geometry,
        state: &mut RoomState,
        rng: &mut R,
    ) -> Result<PlacementOutcome, RequestError> {
        validate(request, asset, geometry)?;

        let scale = geometry.scale_for_width(asset.declared_width());

        log::debug!("'{}': resolving surface", asset.id);
        let resolution = match self.resolve(request, asset, state) {
            Some(r) => r,
            None => {
                log::warn!("'{}' rejected: no supporting surface", asset.id);
                return Ok(PlacementOutcome::Failed(PlacementFailure {
                    asset_id: asset.id.clone(),
                    attempts: 0,
                    reason: FailureReason::NoSupport,
                }));
            }
        };

        let (mut px, mut pz) = (request.x, request.z);
        let mut rotation = request.rotation_y;
        let support = resolution.support.and_then(|id| state.registry().get(id));
        if let Some(s) = support.filter(|_| self.surfaces.policy().arrange_on_surface) {
            (px, pz, rotation) = self.surfaces.arrange(asset, px, pz, s);
        }

        let local = geometry.bounds;
        let at_origin = local.transformed(scale, rotation, Vec3::zero());
        let y = resolution.target_height - at_origin.min.y;

        let (range_x, range_z) = self.interior(state, &at_origin, resolution.support);
        let exclude: Vec<InstanceId> = resolution.support.into_iter().collect();
        let snap = if asset.placeable { 0.0 } else { self.config.snap };
        let half_nudge = self.config.nudge_range.abs() / 2.0;

        let mut last_collision = CollisionType::None;

        for attempt in 1..=self.config.max_attempts {
            let (mut cx, mut cz) = (snap_to(px, snap), snap_to(pz, snap));
            // A supported item never leaves its support's footprint.
            if attempt > 1 || resolution.support.is_some() {
                cx = range_x.clamp(cx);
                cz = range_z.clamp(cz);
            }

            let position = Vec3::new(cx, y, cz);
            let bounds = local.transformed(scale, rotation, position);
            let result = state
                .collision()
                .check_collision_excluding(&bounds, &exclude)?;

            if !result.is_colliding() {
                let instance = FurnitureInstance {
                    id: state.allocate_id(),
                    asset_id: asset.id.clone(),
                    category: asset.category.clone(),
                    position,
                    rotation_y: rotation,
                    placeable: asset.placeable,
                    declared_width: asset.declared_width(),
                    scale,
                    local_bounds: local,
                    bounds,
                    support: resolution.support,
                };
                state.commit(instance.clone());
                return Ok(PlacementOutcome::Committed { instance, attempts: attempt });
            }

            log::debug!(
                "'{}': attempt {}/{} at ({:.2}, {:.2}) hit {}",
                asset.id,
                attempt,
                self.config.max_attempts,
                cx,
                cz,
                result.collision_type
            );
            last_collision = result.collision_type;

            px = range_x.clamp(px + rng.gen_range(-half_nudge..=half_nudge));
            pz = range_z.clamp(pz + rng.gen_range(-half_nudge..=half_nudge));
        }

        let failure = PlacementFailure {
            asset_id: asset.id.clone(),
            attempts: self.config.max_attempts,
            reason: FailureReason::Exhausted { last_collision },
        };
        log::warn!("Placement failed: {}", failure);
        Ok(PlacementOutcome::Failed(failure))
    }

    /// Surface resolution plus the unsupported-item policy.  `None` means the
    /// request must be rejected.
    fn resolve(
        &self,
        request: &PlacementRequest,
        asset: &AssetMetadata,
        state: &RoomState,
    ) -> Option<SurfaceResolution> {
        let resolution = self
            .surfaces
            .resolve_surface(request, asset, state.registry());
        if !asset.placeable || resolution.support.is_some() {
            return Some(resolution);
        }
        match self.config.unsupported {
            UnsupportedPolicy::Floor => Some(resolution),
            UnsupportedPolicy::Hint => Some(SurfaceResolution {
                support: None,
                target_height: request.y.unwrap_or(resolution.target_height),
            }),
            UnsupportedPolicy::Reject => None,
        }
    }

    /// Positions for which `at_origin` (the object's box at the origin) stays
    /// inside the inner wall faces, narrowed to the support's footprint when
    /// there is one.
    fn interior(
        &self,
        state: &RoomState,
        at_origin: &Aabb,
        support: Option<InstanceId>,
    ) -> (Interval, Interval) {
        let room = state.room();
        let inset = state.manager().wall_thickness() / 2.0 + self.config.clearance;

        let mut x = Interval::new(
            -room.half_width() + inset - at_origin.min.x,
            room.half_width() - inset - at_origin.max.x,
        );
        let mut z = Interval::new(
            -room.half_depth() + inset - at_origin.min.z,
            room.half_depth() - inset - at_origin.max.z,
        );

        if let Some(s) = support.and_then(|id| state.registry().get(id)) {
            x = x.narrowed(s.bounds.min.x, s.bounds.max.x);
            z = z.narrowed(s.bounds.min.z, s.bounds.max.z);
        }
        (x, z)
    }
}

fn validate(
    request: &PlacementRequest,
    asset: &AssetMetadata,
    geometry: &Geometry,
) -> Result<(), RequestError> {
    if request.asset_id != asset.id {
        return Err(RequestError::AssetMismatch {
            requested: request.asset_id.clone(),
            provided: asset.id.clone(),
        });
    }
    let fields = [
        ("x", Some(request.x)),
        ("z", Some(request.z)),
        ("y", request.y),
        ("rotation_y", Some(request.rotation_y)),
    ];
    for (field, v) in fields {
        if v.is_some_and(|v| !v.is_finite()) {
            return Err(RequestError::NonFinite { field });
        }
    }
    let w = asset.declared_width();
    if !(w.is_finite() && w > 0.0) {
        return Err(RequestError::InvalidDimensions(asset.id.clone()));
    }
    if !geometry.bounds.is_well_formed() {
        return Err(RequestError::MalformedBox);
    }
    Ok(())
}

fn snap_to(v: f64, step: f64) -> f64 {
    if step > 0.0 {
        (v / step).round() * step
    } else {
        v
    }
}

/// Closed range of legal coordinates along one axis.
#[derive(Debug, Clone, Copy)]
struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    /// An inverted range (object wider than the room) collapses to its
    /// midpoint.
    fn new(lo: f64, hi: f64) -> Self {
        if lo <= hi {
            Self { lo, hi }
        } else {
            let mid = (lo + hi) / 2.0;
            Self { lo: mid, hi: mid }
        }
    }

    /// Intersect with `[lo, hi]`, keeping `self` if they are disjoint.
    fn narrowed(self, lo: f64, hi: f64) -> Self {
        let (nlo, nhi) = (self.lo.max(lo), self.hi.min(hi));
        if nlo <= nhi {
            Self { lo: nlo, hi: nhi }
        } else {
            self
        }
    }

    fn clamp(&self, v: f64) -> f64 {
        v.max(self.lo).min(self.hi)
    }
}
