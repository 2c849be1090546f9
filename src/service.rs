//! PlacementService – owns the room state and serialises every placement.
//!
//! Events are logged through `log` like the rest of the crate.  A layout run
//! additionally opens a `tracing` span so that every commit and failure
//! logged while it runs carries the layout's item count.

use crate::catalog::AssetCatalog;
use crate::collision::CollisionResult;
use crate::error::{LayoutError, RequestError};
use crate::placement::{PlacementEngine, PlacementFailure, PlacementOutcome, PlacementRequest};
use crate::protocol::{FailureSummary, RoomSnapshot};
use crate::provider::{GeometryProvider, LayoutGenerator, LayoutOptions};
use crate::registry::FurnitureInstance;
use crate::room::RoomState;
use crate::surface::SurfaceResolver;
use crate::types::{Aabb, InstanceId, RoomStats, ServiceConfig};
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::Instrument;

// ---------------------------------------------------------------------------
// Layout report
// ---------------------------------------------------------------------------

/// Result of placing a whole layout.  One bad item never aborts the rest.
#[derive(Debug, Clone, Default)]
pub struct LayoutReport {
    /// Committed instances, in commit order.
    pub placed: Vec<FurnitureInstance>,
    /// Items that failed or were rejected, ordered by layout index.
    pub failures: Vec<FailureSummary>,
}

impl LayoutReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Room state plus the search's random source, guarded together.
struct Session {
    state: RoomState,
    rng: StdRng,
}

/// Front door for placements, resizes and ad hoc collision queries.
///
/// The room state sits behind a single mutex: the exclusive room-state
/// section.  Geometry is loaded with the lock released; the synchronous
/// placement step then runs to completion under it, so no query ever sees a
/// half-rebuilt obstacle set and no two placements share a stale view.
pub struct PlacementService {
    config: ServiceConfig,
    engine: PlacementEngine,
    catalog: Arc<AssetCatalog>,
    geometry: Arc<dyn GeometryProvider>,
    session: Mutex<Session>,
}

impl PlacementService {
    pub fn new(
        config: ServiceConfig,
        catalog: Arc<AssetCatalog>,
        geometry: Arc<dyn GeometryProvider>,
    ) -> Result<Self, RequestError> {
        let state = RoomState::new(&config.room)?;
        let engine = PlacementEngine::new(
            config.placement.clone(),
            SurfaceResolver::new(config.surfaces.clone()),
        )?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            engine,
            catalog,
            geometry,
            session: Mutex::new(Session { state, rng }),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Place a single request.
    pub async fn place(&self, request: &PlacementRequest) -> Result<PlacementOutcome, RequestError> {
        let asset = self
            .catalog
            .find(&request.asset_id)
            .cloned()
            .ok_or_else(|| RequestError::UnknownAsset(request.asset_id.clone()))?;

        let geometry = self.geometry.load(&asset.id).await?;

        let request = PlacementRequest {
            asset_id: asset.id.clone(),
            ..request.clone()
        };

        let mut session = self.session.lock();
        let Session { state, rng } = &mut *session;
        self.engine.place(&request, &asset, &geometry, state, rng)
    }

    /// Place a layout strictly in order, each item finishing before the next
    /// starts.  Items that fail are retried in up to `retry_passes` further
    /// passes.
    pub async fn place_layout(&self, requests: Vec<PlacementRequest>) -> LayoutReport {
        let span = tracing::info_span!("layout", items = requests.len());
        self.run_layout(requests).instrument(span).await
    }

    async fn run_layout(&self, requests: Vec<PlacementRequest>) -> LayoutReport {
        let mut report = LayoutReport::default();
        let mut pending: Vec<(usize, PlacementRequest)> =
            requests.into_iter().enumerate().collect();
        let mut failed: Vec<(usize, PlacementFailure)> = Vec::new();

        for pass in 0..=self.config.retry_passes {
            if pending.is_empty() {
                break;
            }
            if pass > 0 {
                info!("Retry pass {} for {} item(s)", pass, pending.len());
            }

            failed.clear();
            let mut retry = Vec::new();
            for (index, request) in pending {
                match self.place(&request).await {
                    Ok(PlacementOutcome::Committed { instance, .. }) => report.placed.push(instance),
                    Ok(PlacementOutcome::Failed(failure)) => {
                        failed.push((index, failure));
                        retry.push((index, request));
                    }
                    Err(e) => {
                        warn!("Rejected layout item {} ('{}'): {}", index, request.asset_id, e);
                        report.failures.push(FailureSummary::Rejected {
                            index,
                            asset_id: request.asset_id,
                            error: e.to_string(),
                        });
                    }
                }
            }
            pending = retry;
        }

        report.failures.extend(
            failed
                .into_iter()
                .map(|(index, failure)| FailureSummary::Failed { index, failure }),
        );
        report.failures.sort_by_key(|f| match f {
            FailureSummary::Failed { index, .. } | FailureSummary::Rejected { index, .. } => *index,
        });

        info!(
            "Layout finished: {} placed, {} not placed",
            report.placed.len(),
            report.failures.len()
        );
        report
    }

    /// Ask `generator` for a layout and place it.
    pub async fn generate_and_place(
        &self,
        generator: &dyn LayoutGenerator,
        user_text: &str,
        options: &LayoutOptions,
    ) -> Result<LayoutReport, LayoutError> {
        let requests = generator.generate(user_text, options).await?;
        Ok(self.place_layout(requests).await)
    }

    // -----------------------------------------------------------------------
    // Room & registry
    // -----------------------------------------------------------------------

    /// Resize the room; returns instances left outside the new bounds.
    pub fn resize(&self, width: f64, depth: f64) -> Result<Vec<InstanceId>, RequestError> {
        self.session.lock().state.resize(width, depth)
    }

    /// Ad hoc query, e.g. for live drag feedback.
    pub fn check_collision(
        &self,
        bounds: &Aabb,
        exclude: Option<InstanceId>,
    ) -> Result<CollisionResult, RequestError> {
        self.session
            .lock()
            .state
            .collision()
            .check_collision(bounds, exclude)
    }

    pub fn move_instance(
        &self,
        id: InstanceId,
        x: f64,
        z: f64,
        rotation_y: f64,
    ) -> Result<CollisionResult, RequestError> {
        self.session.lock().state.move_instance(id, x, z, rotation_y)
    }

    pub fn deregister(&self, id: InstanceId) -> Option<FurnitureInstance> {
        self.session.lock().state.deregister(id)
    }

    pub fn instance(&self, id: InstanceId) -> Option<FurnitureInstance> {
        self.session.lock().state.registry().get(id).cloned()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::from(&self.session.lock().state)
    }

    pub fn stats(&self) -> RoomStats {
        self.session.lock().state.stats()
    }
}
