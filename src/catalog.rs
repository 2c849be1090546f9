//! Asset catalog: metadata for every furniture asset the engine can place.

use crate::error::CatalogError;
use crate::types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// One catalog entry, as stored in `furniture_library`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetMetadata {
    /// Asset identifier (the model file name, e.g. `Desk.fbx`).
    #[serde(rename = "file")]
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    pub category: String,
    /// Small accessory that rests on another object rather than the floor.
    #[serde(default)]
    pub placeable: bool,
    pub dimensions: Dimensions,
}

impl AssetMetadata {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        placeable: bool,
        dimensions: Dimensions,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.trim_end_matches(".fbx").to_string(),
            id,
            category: category.into(),
            placeable,
            dimensions,
        }
    }

    /// Display name, falling back to the file name without `.fbx`.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.trim_end_matches(".fbx")
        } else {
            &self.name
        }
    }

    pub fn declared_width(&self) -> f64 {
        self.dimensions.width
    }

    pub fn declared_height(&self) -> f64 {
        self.dimensions.height
    }

    /// Geometry implied by the declared dimensions alone.
    pub fn declared_geometry(&self) -> Geometry {
        Geometry::from_dimensions(
            self.dimensions.width,
            self.dimensions.height,
            self.dimensions.depth,
        )
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    furniture_library: Vec<AssetMetadata>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Asset lookup with the same tolerance generators need: exact file name,
/// case-insensitive file name, extension-less name, or display name.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    assets: Vec<AssetMetadata>,
    by_key: HashMap<String, usize>,
}

impl AssetCatalog {
    pub fn new(assets: Vec<AssetMetadata>) -> Self {
        let mut by_key = HashMap::new();
        for (i, a) in assets.iter().enumerate() {
            by_key.entry(a.id.clone()).or_insert(i);
            by_key.entry(a.id.to_lowercase()).or_insert(i);
            if !a.name.is_empty() {
                by_key.entry(a.name.to_lowercase()).or_insert(i);
            }
        }
        Self { assets, by_key }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        log::debug!("Loaded {} catalog assets", file.furniture_library.len());
        Ok(Self::new(file.furniture_library))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Resolve a generator- or user-supplied key to an asset.
    pub fn find(&self, key: &str) -> Option<&AssetMetadata> {
        if let Some(&i) = self.by_key.get(key) {
            return Some(&self.assets[i]);
        }
        let lower = key.trim().to_lowercase();
        if let Some(&i) = self.by_key.get(&lower) {
            return Some(&self.assets[i]);
        }
        let base = lower.trim_end_matches(".fbx").trim();
        self.by_key
            .get(&format!("{base}.fbx"))
            .or_else(|| self.by_key.get(base))
            .map(|&i| &self.assets[i])
    }

    pub fn assets(&self) -> &[AssetMetadata] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
