//! Error types.
//!
//! Only contract violations are errors.  Collision, boundary, surface and
//! exhaustion outcomes are ordinary values (see `collision` and `placement`).

use crate::types::InstanceId;
use thiserror::Error;

/// A malformed request: the caller broke the engine's input contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("unknown asset '{0}'")]
    UnknownAsset(String),

    #[error("request names asset '{requested}' but metadata is for '{provided}'")]
    AssetMismatch { requested: String, provided: String },

    #[error("field '{field}' is not a finite number")]
    NonFinite { field: &'static str },

    #[error("asset '{0}' declares non-positive or non-finite dimensions")]
    InvalidDimensions(String),

    #[error("bounding box is malformed (non-finite or inverted)")]
    MalformedBox,

    #[error("geometry for asset '{0}' is unavailable")]
    GeometryUnavailable(String),

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),

    #[error("invalid room dimensions {width} x {depth}")]
    InvalidRoom { width: f64, depth: f64 },

    #[error("configuration value '{field}' must be finite and non-negative")]
    InvalidConfig { field: &'static str },
}

/// Failure to load an asset catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to obtain a layout from a generator.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("generator output contains no JSON array")]
    NoArray,

    #[error("generator output is not a valid layout: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("layout generator failed: {0}")]
    Generator(String),
}
