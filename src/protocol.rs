//! JSON shapes exchanged with the world outside the engine.
//!
//! | Type              | Direction            | Producer / consumer           |
//! |-------------------|----------------------|-------------------------------|
//! | `LayoutItem`      | generator → engine   | layout generator output       |
//! | `RoomSnapshot`    | engine → renderer/UI | re-read after placements      |
//! | `FailureSummary`  | engine → UI          | per-item failure reporting    |
//!
//! Every struct is `Serialize + Deserialize` with snake_case JSON, except
//! `LayoutItem`, which keeps the generator's own field names.

use crate::error::LayoutError;
use crate::placement::{PlacementFailure, PlacementRequest};
use crate::registry::FurnitureInstance;
use crate::room::RoomState;
use crate::types::{Aabb, InstanceId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Generator output
// ---------------------------------------------------------------------------

/// One element of a generator layout, e.g.
/// `{"file":"Desk.fbx","x":2.0,"z":0.0,"y":0,"rotate":0}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutItem {
    pub file: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Rotation about +Y in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
}

impl From<LayoutItem> for PlacementRequest {
    fn from(item: LayoutItem) -> Self {
        PlacementRequest {
            asset_id: item.file,
            x: item.x,
            z: item.z,
            y: item.y,
            rotation_y: item.rotate.unwrap_or(0.0),
        }
    }
}

/// Decode generator output into placement requests.
///
/// Generators tend to wrap the JSON array in prose, so only the text between
/// the first `[` and the last `]` is decoded.
pub fn parse_layout(raw: &str) -> Result<Vec<PlacementRequest>, LayoutError> {
    let start = raw.find('[').ok_or(LayoutError::NoArray)?;
    let end = raw.rfind(']').ok_or(LayoutError::NoArray)?;
    if end < start {
        return Err(LayoutError::NoArray);
    }
    let items: Vec<LayoutItem> = serde_json::from_str(&raw[start..=end])?;
    Ok(items.into_iter().map(PlacementRequest::from).collect())
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedFurniture {
    pub instance_id: InstanceId,
    pub asset_id: String,
    pub category: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rotation_y: f64,
    pub scale: f64,
    pub bounds: Aabb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<InstanceId>,
}

impl From<&FurnitureInstance> for PlacedFurniture {
    fn from(f: &FurnitureInstance) -> Self {
        Self {
            instance_id: f.id,
            asset_id: f.asset_id.clone(),
            category: f.category.clone(),
            x: f.position.x,
            y: f.position.y,
            z: f.position.z,
            rotation_y: f.rotation_y,
            scale: f.scale,
            bounds: f.bounds,
            support: f.support,
        }
    }
}

/// Full room state for a renderer or UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshot {
    pub width: f64,
    pub depth: f64,
    pub instances: Vec<PlacedFurniture>,
}

impl From<&RoomState> for RoomSnapshot {
    fn from(state: &RoomState) -> Self {
        let room = state.room();
        Self {
            width: room.width,
            depth: room.depth,
            instances: state
                .registry()
                .instances()
                .map(PlacedFurniture::from)
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Why one layout item did not make it into the room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum FailureSummary {
    /// The search ran and found nothing.
    Failed {
        index: usize,
        failure: PlacementFailure,
    },
    /// The request itself was malformed.
    Rejected {
        index: usize,
        asset_id: String,
        error: String,
    },
}
