//! Core geometric types and configuration shared across all modules.

use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Axis-aligned bounding box
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box, the only collision primitive the engine uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given full size centred on `center`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let h = Vec3::new(size.x / 2.0, size.y / 2.0, size.z / 2.0);
        Self::new(
            Vec3::new(center.x - h.x, center.y - h.y, center.z - h.z),
            Vec3::new(center.x + h.x, center.y + h.y, center.z + h.z),
        )
    }

    /// Finite corners with `min <= max` on every axis.
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// True if the interiors overlap on all three axes.
    /// Touching faces are NOT counted as overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// True if the X/Z footprint, grown by `margin`, contains the point.
    pub fn footprint_contains(&self, x: f64, z: f64, margin: f64) -> bool {
        x >= self.min.x - margin
            && x <= self.max.x + margin
            && z >= self.min.z - margin
            && z <= self.max.z + margin
    }

    /// Horizontal distance from a point to the nearest point of the footprint
    /// (zero when the point lies inside it).
    pub fn footprint_distance(&self, x: f64, z: f64) -> f64 {
        let cx = x.clamp(self.min.x, self.max.x);
        let cz = z.clamp(self.min.z, self.max.z);
        ((x - cx).powi(2) + (z - cz).powi(2)).sqrt()
    }

    /// Uniformly scale a local box, rotate it about +Y and move it to
    /// `position`.  The result bounds the rotated corners.
    pub fn transformed(&self, scale: f64, rotation_y: f64, position: Vec3) -> Aabb {
        let (sin, cos) = rotation_y.sin_cos();
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_z = f64::INFINITY;
        let mut max_z = f64::NEG_INFINITY;
        for lx in [self.min.x, self.max.x] {
            for lz in [self.min.z, self.max.z] {
                let (sx, sz) = (lx * scale, lz * scale);
                let wx = sx * cos + sz * sin;
                let wz = -sx * sin + sz * cos;
                min_x = min_x.min(wx);
                max_x = max_x.max(wx);
                min_z = min_z.min(wz);
                max_z = max_z.max(wz);
            }
        }
        Aabb::new(
            Vec3::new(
                position.x + min_x,
                position.y + self.min.y * scale,
                position.z + min_z,
            ),
            Vec3::new(
                position.x + max_x,
                position.y + self.max.y * scale,
                position.z + max_z,
            ),
        )
    }
}

impl std::fmt::Display for Aabb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Identity & geometry
// ---------------------------------------------------------------------------

/// Registry-assigned identity of a committed furniture instance.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw, unscaled bounds of an asset as delivered by a geometry provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    pub bounds: Aabb,
}

impl Geometry {
    pub fn new(bounds: Aabb) -> Self {
        Self { bounds }
    }

    /// Box resting on its origin: X/Z centred, Y from 0 to `height`.
    pub fn from_dimensions(width: f64, height: f64, depth: f64) -> Self {
        Self::new(Aabb::new(
            Vec3::new(-width / 2.0, 0.0, -depth / 2.0),
            Vec3::new(width / 2.0, height, depth / 2.0),
        ))
    }

    /// Uniform scale that brings the raw width to `declared_width`.
    pub fn scale_for_width(&self, declared_width: f64) -> f64 {
        let raw = self.bounds.size().x;
        if raw > 0.0 {
            declared_width / raw
        } else {
            1.0
        }
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomStats {
    pub width: f64,
    pub depth: f64,
    pub instances: usize,
    pub wall_obstacles: usize,
    pub furniture_obstacles: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoomConfig {
    /// Room extent along X in meters.
    pub width: f64,
    /// Room extent along Z in meters.
    pub depth: f64,
    pub wall_thickness: f64,
    pub wall_height: f64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            depth: 10.0,
            wall_thickness: 0.1,
            wall_height: 2.5,
        }
    }
}

/// What to do with a placeable item that finds no surface to rest on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedPolicy {
    /// Rest on the floor.
    #[default]
    Floor,
    /// Use the request's height hint, or the floor when there is none.
    Hint,
    /// Fail the request without searching.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementConfig {
    /// Collision queries allowed per request.
    pub max_attempts: u32,
    /// Full width of the random nudge applied between attempts.
    pub nudge_range: f64,
    /// Grid step for floor furniture; 0 disables snapping.
    pub snap: f64,
    /// Spare distance kept from the inner wall faces when clamping.
    pub clearance: f64,
    pub unsupported: UnsupportedPolicy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            nudge_range: 1.5,
            snap: 0.5,
            clearance: 0.01,
            unsupported: UnsupportedPolicy::Floor,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<(), RequestError> {
        require_non_negative("nudge_range", self.nudge_range)?;
        require_non_negative("snap", self.snap)?;
        require_non_negative("clearance", self.clearance)
    }
}

fn require_non_negative(field: &'static str, v: f64) -> Result<(), RequestError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(RequestError::InvalidConfig { field })
    }
}

/// Which committed instances may carry a placeable item.
///
/// Items named in `zones` follow the zone rules: only categories listed in
/// `zone_surfaces` for that zone can host them.  Every other item may rest on
/// any category in `surface_categories`.  All names match case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfacePolicy {
    /// Asset categories whose tops can carry placeable items.
    pub surface_categories: Vec<String>,
    /// Zone name -> item names (asset display names) that belong to it.
    pub zones: BTreeMap<String, Vec<String>>,
    /// Surface category -> zones it may host.
    pub zone_surfaces: BTreeMap<String, Vec<String>>,
    /// Margin added to a footprint when testing point containment.
    pub contain_tolerance: f64,
    /// Largest footprint distance considered by the nearest-surface fallback.
    pub search_radius: f64,
    /// Offset known accessories on their support and copy its rotation.
    pub arrange_on_surface: bool,
}

impl SurfacePolicy {
    pub fn is_surface_bearing(&self, category: &str) -> bool {
        self.surface_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    /// Zone an item belongs to, looked up by its display name.
    pub fn zone_of(&self, item_name: &str) -> Option<&str> {
        self.zones
            .iter()
            .find(|(_, items)| items.iter().any(|i| i.eq_ignore_ascii_case(item_name)))
            .map(|(zone, _)| zone.as_str())
    }

    /// Whether an instance of `category` may carry an item from `zone`.
    pub fn hosts(&self, category: &str, zone: &str) -> bool {
        self.zone_surfaces
            .iter()
            .filter(|(c, _)| c.eq_ignore_ascii_case(category))
            .any(|(_, zones)| zones.iter().any(|z| z.eq_ignore_ascii_case(zone)))
    }

    /// Candidate filter for an item of the given zone (`None` when unzoned).
    pub fn accepts(&self, category: &str, zone: Option<&str>) -> bool {
        match zone {
            Some(z) => self.hosts(category, z),
            None => self.is_surface_bearing(category),
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        require_non_negative("contain_tolerance", self.contain_tolerance)?;
        require_non_negative("search_radius", self.search_radius)
    }
}

fn table(rows: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    rows.iter()
        .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
        .collect()
}

impl Default for SurfacePolicy {
    fn default() -> Self {
        Self {
            surface_categories: ["Tables", "Desks", "Drawers", "Consoles", "Counters", "Shelves"]
                .into_iter()
                .map(String::from)
                .collect(),
            zones: table(&[
                ("WORK_RIG", &["Monitor", "Keyboard", "Laptop", "Pc", "Mouse", "Lamp A"]),
                (
                    "MEDIA_CENTER",
                    &["TV A", "TV B", "Speaker", "Console A", "Console B", "Console C"],
                ),
                ("BEDSIDE", &["Alarm Clock", "Lamp C", "Phone", "Tablet", "Mug"]),
                ("DINING", &["Plate", "Glass", "Pan", "Bowl", "Kettle"]),
            ]),
            zone_surfaces: table(&[
                ("Tables", &["WORK_RIG", "MEDIA_CENTER", "DINING", "BEDSIDE"]),
                ("Drawers", &["BEDSIDE", "MEDIA_CENTER"]),
                ("Shelves", &["MEDIA_CENTER", "DINING"]),
                ("Electronics", &["MEDIA_CENTER"]),
            ]),
            contain_tolerance: 0.05,
            search_radius: 1.2,
            arrange_on_surface: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub room: RoomConfig,
    pub placement: PlacementConfig,
    pub surfaces: SurfacePolicy,
    /// Seed for the placement search.
    pub seed: u64,
    /// Extra sequential passes over items that failed in a layout.
    pub retry_passes: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            room: RoomConfig::default(),
            placement: PlacementConfig::default(),
            surfaces: SurfacePolicy::default(),
            seed: 42,
            retry_passes: 0,
        }
    }
}
