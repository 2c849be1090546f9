//! PlacementService tests

#[cfg(test)]
mod tests {
    use roomfit::protocol::FailureSummary;
    use roomfit::provider::{CatalogGeometry, StaticGeometry, StaticLayout};
    use roomfit::{
        Aabb, AssetCatalog, CollisionType, FailureReason, Geometry, LayoutOptions,
        PlacementRequest, PlacementService, RequestError, ServiceConfig, Vec3,
    };
    use std::sync::Arc;
    use tokio_test::block_on;

    const CATALOG: &str = r#"{
        "furniture_library": [
            {"file": "Desk.fbx", "category": "Tables",
             "dimensions": {"width": 1.2, "height": 0.75, "depth": 0.6}},
            {"file": "Monitor.fbx", "category": "Electronics", "placeable": true,
             "dimensions": {"width": 0.5, "height": 0.4, "depth": 0.2}},
            {"file": "Cube.fbx", "category": "Boxes",
             "dimensions": {"width": 1.0, "height": 1.0, "depth": 1.0}},
            {"file": "Rug.fbx", "category": "Rugs",
             "dimensions": {"width": 9.8, "height": 0.5, "depth": 9.8}}
        ]
    }"#;

    fn catalog() -> Arc<AssetCatalog> {
        Arc::new(AssetCatalog::from_json(CATALOG).unwrap())
    }

    fn make_service_with(config: ServiceConfig) -> PlacementService {
        let catalog = catalog();
        let geometry = Arc::new(CatalogGeometry::new(catalog.clone()));
        PlacementService::new(config, catalog, geometry).unwrap()
    }

    fn make_service() -> PlacementService {
        make_service_with(ServiceConfig::default())
    }

    fn failure_index(f: &FailureSummary) -> usize {
        match f {
            FailureSummary::Failed { index, .. } | FailureSummary::Rejected { index, .. } => *index,
        }
    }

    #[test]
    fn unusable_config_is_rejected() {
        let catalog = catalog();
        let geometry = Arc::new(CatalogGeometry::new(catalog.clone()));
        let mut config = ServiceConfig::default();
        config.placement.nudge_range = f64::INFINITY;

        let err = PlacementService::new(config, catalog, geometry).err();
        assert_eq!(
            err,
            Some(RequestError::InvalidConfig {
                field: "nudge_range"
            })
        );
    }

    // -----------------------------------------------------------------------
    // Single placements
    // -----------------------------------------------------------------------

    #[test]
    fn place_resolves_tolerant_asset_key() {
        let svc = make_service();
        let outcome = block_on(svc.place(&PlacementRequest::new("desk", 0.0, 0.0))).unwrap();
        let desk = outcome.instance().unwrap();
        assert_eq!(desk.asset_id, "Desk.fbx");
        assert_eq!(desk.category, "Tables");
    }

    #[test]
    fn place_unknown_asset_is_rejected() {
        let svc = make_service();
        let err = block_on(svc.place(&PlacementRequest::new("Sofa.fbx", 0.0, 0.0))).unwrap_err();
        assert_eq!(err, RequestError::UnknownAsset("Sofa.fbx".into()));
        assert_eq!(svc.stats().instances, 0);
    }

    #[test]
    fn monitor_lands_on_desk() {
        let svc = make_service();
        let desk = block_on(svc.place(&PlacementRequest::new("Desk.fbx", 2.0, 3.0)))
            .unwrap()
            .instance()
            .cloned()
            .unwrap();
        let monitor = block_on(svc.place(&PlacementRequest::new("Monitor.fbx", 2.0, 3.0)))
            .unwrap()
            .instance()
            .cloned()
            .unwrap();

        assert_eq!(monitor.support, Some(desk.id));
        assert!((monitor.bounds.min.y - 0.75).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // Layouts
    // -----------------------------------------------------------------------

    #[test]
    fn layout_places_valid_items_and_reports_unknown_ones() {
        let svc = make_service();
        let requests = vec![
            PlacementRequest::new("Desk.fbx", 0.0, 0.0),
            PlacementRequest::new("Monitor.fbx", 0.0, 0.0),
            PlacementRequest::new("Sofa.fbx", 1.0, 1.0),
        ];
        let report = block_on(svc.place_layout(requests));

        assert_eq!(report.placed.len(), 2);
        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        match &report.failures[0] {
            FailureSummary::Rejected { index, asset_id, .. } => {
                assert_eq!(*index, 2);
                assert_eq!(asset_id, "Sofa.fbx");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(report.placed[1].support, Some(report.placed[0].id));
    }

    #[test]
    fn batch_continues_past_failures_in_index_order() {
        let svc = make_service();
        let requests = vec![
            PlacementRequest::new("Rug.fbx", 0.0, 0.0),
            PlacementRequest::new("Cube.fbx", 1.0, 1.0),
            PlacementRequest::new("Ghost.fbx", 0.0, 0.0),
        ];
        let report = block_on(svc.place_layout(requests));

        assert_eq!(report.placed.len(), 1);
        let indices: Vec<usize> = report.failures.iter().map(failure_index).collect();
        assert_eq!(indices, vec![1, 2]);

        match &report.failures[0] {
            FailureSummary::Failed { failure, .. } => {
                assert_eq!(failure.asset_id, "Cube.fbx");
                assert_eq!(failure.attempts, 15);
                assert_eq!(
                    failure.reason,
                    FailureReason::Exhausted {
                        last_collision: CollisionType::Furniture
                    }
                );
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert!(matches!(report.failures[1], FailureSummary::Rejected { .. }));
    }

    #[test]
    fn retry_passes_report_each_failure_once() {
        let svc = make_service_with(ServiceConfig {
            retry_passes: 2,
            ..ServiceConfig::default()
        });
        let report = block_on(svc.place_layout(vec![
            PlacementRequest::new("Rug.fbx", 0.0, 0.0),
            PlacementRequest::new("Cube.fbx", 1.0, 1.0),
        ]));

        assert_eq!(report.placed.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(failure_index(&report.failures[0]), 1);
        assert_eq!(svc.stats().instances, 1);
    }

    #[test]
    fn same_seed_gives_same_room() {
        let layout = || {
            (0..8)
                .map(|i| PlacementRequest::new("Cube.fbx", (i % 3) as f64, 0.0))
                .collect::<Vec<_>>()
        };
        let a = make_service();
        let b = make_service();
        block_on(a.place_layout(layout()));
        block_on(b.place_layout(layout()));
        assert_eq!(a.snapshot(), b.snapshot());
    }

    // -----------------------------------------------------------------------
    // Generators
    // -----------------------------------------------------------------------

    #[test]
    fn generated_layout_is_placed() {
        let svc = make_service();
        let generator = StaticLayout::new(
            "Sure! [{\"file\":\"Desk.fbx\",\"x\":-2,\"z\":2,\"rotate\":0},\
             {\"file\":\"Monitor.fbx\",\"x\":-2,\"z\":2,\"y\":0.75}]",
        );
        let report =
            block_on(svc.generate_and_place(&generator, "a small office", &LayoutOptions::default()))
                .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.placed[0].position, Vec3::new(-2.0, 0.0, 2.0));
    }

    #[test]
    fn empty_request_text_places_nothing() {
        let svc = make_service();
        let generator = StaticLayout::new("[{\"file\":\"Desk.fbx\",\"x\":0,\"z\":0}]");
        let report =
            block_on(svc.generate_and_place(&generator, "   ", &LayoutOptions::default())).unwrap();
        assert!(report.placed.is_empty());
        assert!(report.is_complete());
        assert_eq!(svc.stats().instances, 0);
    }

    #[test]
    fn undecodable_generator_output_is_an_error() {
        let svc = make_service();
        let generator = StaticLayout::new("I cannot help with that.");
        let result = block_on(svc.generate_and_place(&generator, "bedroom", &LayoutOptions::default()));
        assert!(result.is_err());
    }

    // -----------------------------------------------------------------------
    // Geometry providers
    // -----------------------------------------------------------------------

    #[test]
    fn raw_geometry_is_scaled_to_declared_width() {
        let catalog = catalog();
        let geometry = Arc::new(
            StaticGeometry::new().with("Desk.fbx", Geometry::from_dimensions(2.4, 1.5, 1.2)),
        );
        let svc = PlacementService::new(ServiceConfig::default(), catalog, geometry).unwrap();

        let report = block_on(svc.place_layout(vec![
            PlacementRequest::new("Desk.fbx", 0.0, 0.0),
            PlacementRequest::new("Monitor.fbx", 3.0, 3.0),
        ]));

        let desk = &report.placed[0];
        assert!((desk.scale - 0.5).abs() < 1e-9);
        assert!((desk.bounds.size().x - 1.2).abs() < 1e-9);
        assert!((desk.bounds.size().y - 0.75).abs() < 1e-9);

        match &report.failures[..] {
            [FailureSummary::Rejected { index, error, .. }] => {
                assert_eq!(*index, 1);
                assert!(error.contains("unavailable"));
            }
            other => panic!("expected one rejection, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Room & registry
    // -----------------------------------------------------------------------

    #[test]
    fn check_collision_sees_committed_furniture() {
        let svc = make_service();
        let desk = block_on(svc.place(&PlacementRequest::new("Desk.fbx", 0.0, 0.0)))
            .unwrap()
            .instance()
            .cloned()
            .unwrap();

        let probe = Aabb::new(Vec3::new(0.3, 0.0, -0.2), Vec3::new(1.0, 1.0, 0.2));
        let hit = svc.check_collision(&probe, None).unwrap();
        assert_eq!(hit.collider_id(), Some(desk.id));

        let excluded = svc.check_collision(&probe, Some(desk.id)).unwrap();
        assert!(!excluded.is_colliding());
    }

    #[test]
    fn resize_reports_and_snapshot_follows() {
        let svc = make_service();
        let corner = block_on(svc.place(&PlacementRequest::new("Cube.fbx", 4.0, 4.0)))
            .unwrap()
            .instance()
            .cloned()
            .unwrap();

        let outside = svc.resize(6.0, 6.0).unwrap();
        assert_eq!(outside, vec![corner.id]);

        let snapshot = svc.snapshot();
        assert_eq!(snapshot.width, 6.0);
        assert_eq!(snapshot.depth, 6.0);
        assert_eq!(snapshot.instances.len(), 1);

        assert!(svc.resize(-1.0, 6.0).is_err());
        assert_eq!(svc.stats().width, 6.0);
    }

    #[test]
    fn move_and_deregister() {
        let svc = make_service();
        let cube = block_on(svc.place(&PlacementRequest::new("Cube.fbx", 0.0, 0.0)))
            .unwrap()
            .instance()
            .cloned()
            .unwrap();

        let r = svc.move_instance(cube.id, 2.0, -2.0, 0.0).unwrap();
        assert!(!r.is_colliding());
        assert_eq!(
            svc.instance(cube.id).map(|f| f.position),
            Some(Vec3::new(2.0, 0.0, -2.0))
        );

        assert!(svc.deregister(cube.id).is_some());
        assert!(svc.instance(cube.id).is_none());
        assert_eq!(svc.stats().instances, 0);
        assert_eq!(svc.stats().furniture_obstacles, 0);
    }
}
