//! Roomfit placement engine
//!
//! Arranges furniture inside a rectangular room without illegal overlaps,
//! starting from placement hints produced by a layout generator or a user.
//!
//! ## Architecture
//!
//! ```text
//! PlacementService  (service.rs)   ← exclusive room-state section, batches
//!   └── PlacementEngine  (placement.rs) ← surface → randomized search → commit
//!         ├── SurfaceResolver  (surface.rs)
//!         ├── CollisionEngine  (collision.rs)
//!         └── RoomState        (room.rs)
//!               ├── RoomManager   (room.rs)     ← dimensions + walls
//!               ├── Registry      (registry.rs) ← committed instances
//!               └── SpatialIndex  (spatial.rs)  ← obstacle set
//! ```
//!
//! Everything is approximated by axis-aligned boxes.  Collision outcomes are
//! values; only malformed input is an error.

// Core modules are always available.
pub mod catalog;
pub mod collision;
pub mod error;
pub mod placement;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod spatial;
pub mod surface;
pub mod types;

// Async providers and the service layer require the `server` feature.
#[cfg(feature = "server")]
pub mod provider;
#[cfg(feature = "server")]
pub mod service;

// Convenience re-exports
pub use catalog::{AssetCatalog, AssetMetadata, Dimensions};
pub use collision::{CollisionEngine, CollisionResult, CollisionType};
pub use error::{CatalogError, LayoutError, RequestError};
pub use placement::{
    FailureReason, PlacementEngine, PlacementFailure, PlacementOutcome, PlacementRequest,
};
pub use registry::{FurnitureInstance, Registry};
pub use room::{Room, RoomManager, RoomState};
pub use spatial::{Obstacle, ObstacleKind, SpatialIndex};
pub use surface::{SurfaceResolution, SurfaceResolver};
pub use types::{
    Aabb, Geometry, InstanceId, PlacementConfig, RoomConfig, ServiceConfig, SurfacePolicy,
    UnsupportedPolicy, Vec3,
};
#[cfg(feature = "server")]
pub use provider::{GeometryProvider, LayoutGenerator, LayoutOptions};
#[cfg(feature = "server")]
pub use service::{LayoutReport, PlacementService};
