//! External collaborators the engine consumes: geometry and layout sources.
//!
//! Both are asynchronous.  Loading geometry is the only real suspension point
//! in a placement; everything after it runs synchronously under the room lock
//! (see `service`).

use crate::catalog::AssetCatalog;
use crate::error::{LayoutError, RequestError};
use crate::placement::PlacementRequest;
use crate::protocol::parse_layout;
use crate::types::Geometry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Supplies the raw bounds of an asset's model.
#[async_trait]
pub trait GeometryProvider: Send + Sync {
    async fn load(&self, asset_id: &str) -> Result<Geometry, RequestError>;
}

/// Geometry derived from the catalog's declared dimensions.
///
/// Useful when no mesh loader is attached: the box is already at physical
/// size, so the derived scale is 1.
pub struct CatalogGeometry {
    catalog: Arc<AssetCatalog>,
}

impl CatalogGeometry {
    pub fn new(catalog: Arc<AssetCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl GeometryProvider for CatalogGeometry {
    async fn load(&self, asset_id: &str) -> Result<Geometry, RequestError> {
        self.catalog
            .find(asset_id)
            .map(|a| a.declared_geometry())
            .ok_or_else(|| RequestError::UnknownAsset(asset_id.to_string()))
    }
}

/// Fixed raw bounds per asset id, as a mesh loader would report them.
#[derive(Default)]
pub struct StaticGeometry {
    bounds: HashMap<String, Geometry>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, asset_id: impl Into<String>, geometry: Geometry) -> Self {
        self.bounds.insert(asset_id.into(), geometry);
        self
    }
}

#[async_trait]
impl GeometryProvider for StaticGeometry {
    async fn load(&self, asset_id: &str) -> Result<Geometry, RequestError> {
        self.bounds
            .get(asset_id)
            .copied()
            .ok_or_else(|| RequestError::GeometryUnavailable(asset_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Layout generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    /// Tell the generator the real room size instead of a default room.
    pub use_room_context: bool,
    /// Room type hint (e.g. "bedroom", "office").
    pub room_type: Option<String>,
}

/// Produces an ordered list of placement requests from free text.
///
/// The engine treats the output as plain input data; whether the layout
/// makes sense as a room is the generator's concern.
#[async_trait]
pub trait LayoutGenerator: Send + Sync {
    async fn generate(
        &self,
        user_text: &str,
        options: &LayoutOptions,
    ) -> Result<Vec<PlacementRequest>, LayoutError>;
}

/// Replays a fixed generator response (e.g. a cached one).
pub struct StaticLayout {
    raw: String,
}

impl StaticLayout {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[async_trait]
impl LayoutGenerator for StaticLayout {
    async fn generate(
        &self,
        user_text: &str,
        _options: &LayoutOptions,
    ) -> Result<Vec<PlacementRequest>, LayoutError> {
        if user_text.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_layout(&self.raw)
    }
}
