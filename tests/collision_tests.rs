//! Collision engine and spatial index tests

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use roomfit::{
        Aabb, AssetMetadata, CollisionType, Dimensions, ObstacleKind, PlacementEngine,
        PlacementRequest, RequestError, RoomConfig, RoomState, Vec3,
    };

    fn make_state() -> RoomState {
        RoomState::new(&RoomConfig::default()).unwrap()
    }

    fn unit_box_at(x: f64, z: f64) -> Aabb {
        Aabb::new(Vec3::new(x - 0.5, 0.0, z - 0.5), Vec3::new(x + 0.5, 1.0, z + 0.5))
    }

    fn cube() -> AssetMetadata {
        AssetMetadata::new(
            "Cube.fbx",
            "Boxes",
            false,
            Dimensions {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
        )
    }

    fn commit_cube(state: &mut RoomState, x: f64, z: f64) -> roomfit::FurnitureInstance {
        let asset = cube();
        let mut rng = StdRng::seed_from_u64(1);
        PlacementEngine::default()
            .place(
                &PlacementRequest::new(&asset.id, x, z),
                &asset,
                &asset.declared_geometry(),
                state,
                &mut rng,
            )
            .unwrap()
            .instance()
            .cloned()
            .expect("cube should commit")
    }

    // -----------------------------------------------------------------------
    // AABB predicate
    // -----------------------------------------------------------------------

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(1.0, 0.0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(0.9, 0.2);
        assert!(a.intersects(&b));
    }

    #[test]
    fn stacked_boxes_touching_on_y_do_not_intersect() {
        let a = unit_box_at(0.0, 0.0);
        let b = Aabb::new(Vec3::new(-0.5, 1.0, -0.5), Vec3::new(0.5, 2.0, 0.5));
        assert!(!a.intersects(&b));
    }

    // -----------------------------------------------------------------------
    // Classification order
    // -----------------------------------------------------------------------

    #[test]
    fn empty_room_reports_no_collision() {
        let state = make_state();
        let r = state
            .collision()
            .check_collision(&unit_box_at(0.0, 0.0), None)
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::None);
        assert!(!r.is_colliding());
        assert!(r.collider.is_none());
    }

    #[test]
    fn box_outside_room_is_boundary() {
        let state = make_state();
        let r = state
            .collision()
            .check_collision(&unit_box_at(4.9, 0.0), None)
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::Boundary);
        assert!(r.collider.is_none());
    }

    #[test]
    fn boundary_is_reported_before_wall() {
        let state = make_state();
        // Straddles the right wall and the room edge.
        let r = state
            .collision()
            .check_collision(&unit_box_at(5.0, 0.0), None)
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::Boundary);
    }

    #[test]
    fn box_inside_wall_thickness_is_wall() {
        let state = make_state();
        let b = Aabb::new(Vec3::new(4.46, 0.0, -0.5), Vec3::new(4.96, 1.0, 0.5));
        let r = state.collision().check_collision(&b, None).unwrap();
        assert_eq!(r.collision_type, CollisionType::Wall);
        assert_eq!(r.collider.map(|o| o.kind), Some(ObstacleKind::Wall));
    }

    #[test]
    fn box_flush_against_wall_is_legal() {
        let state = make_state();
        // Walls are generated back, front, left, right.
        let inner_face = state.index().walls()[3].bounds.min.x;
        let b = Aabb::new(
            Vec3::new(inner_face - 1.0, 0.0, -0.5),
            Vec3::new(inner_face, 1.0, 0.5),
        );
        let r = state.collision().check_collision(&b, None).unwrap();
        assert_eq!(r.collision_type, CollisionType::None);
    }

    #[test]
    fn furniture_hit_carries_collider() {
        let mut state = make_state();
        let placed = commit_cube(&mut state, 0.0, 0.0);

        let r = state
            .collision()
            .check_collision(&unit_box_at(0.5, 0.0), None)
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::Furniture);
        assert_eq!(r.collider_id(), Some(placed.id));
    }

    // -----------------------------------------------------------------------
    // Exclusion
    // -----------------------------------------------------------------------

    #[test]
    fn instance_never_collides_with_itself() {
        let mut state = make_state();
        let placed = commit_cube(&mut state, 1.0, 1.0);

        let r = state
            .collision()
            .check_collision(&placed.bounds, Some(placed.id))
            .unwrap();
        assert_ne!(r.collision_type, CollisionType::Furniture);

        let unexcluded = state
            .collision()
            .check_collision(&placed.bounds, None)
            .unwrap();
        assert_eq!(unexcluded.collider_id(), Some(placed.id));
    }

    #[test]
    fn exclusion_only_skips_the_named_instance() {
        let mut state = make_state();
        let a = commit_cube(&mut state, 0.0, 0.0);
        let b = commit_cube(&mut state, 1.0, 0.0);

        // Spans both cubes.
        let probe = Aabb::new(Vec3::new(0.2, 0.0, -0.2), Vec3::new(0.8, 1.0, 0.2));
        let r = state
            .collision()
            .check_collision_excluding(&probe, &[a.id])
            .unwrap();
        assert_eq!(r.collider_id(), Some(b.id));

        let r = state
            .collision()
            .check_collision_excluding(&probe, &[a.id, b.id])
            .unwrap();
        assert!(!r.is_colliding());
    }

    // -----------------------------------------------------------------------
    // Support exception
    // -----------------------------------------------------------------------

    fn commit_desk(state: &mut RoomState) -> roomfit::FurnitureInstance {
        let desk = AssetMetadata::new(
            "Desk.fbx",
            "Tables",
            false,
            Dimensions {
                width: 1.2,
                height: 0.75,
                depth: 0.6,
            },
        );
        let mut rng = StdRng::seed_from_u64(1);
        PlacementEngine::default()
            .place(
                &PlacementRequest::new(&desk.id, 0.0, 0.0),
                &desk,
                &desk.declared_geometry(),
                state,
                &mut rng,
            )
            .unwrap()
            .instance()
            .cloned()
            .expect("desk should commit")
    }

    #[test]
    fn box_sunk_into_excluded_support_is_free() {
        let mut state = make_state();
        let desk = commit_desk(&mut state);

        // 1 cm below the desk top.
        let resting = Aabb::new(Vec3::new(-0.25, 0.74, -0.1), Vec3::new(0.25, 1.14, 0.1));
        assert!(resting.intersects(&desk.bounds));

        let r = state
            .collision()
            .check_collision_excluding(&resting, &[desk.id])
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::None);

        let r = state
            .collision()
            .check_collision_excluding(&resting, &[])
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::Furniture);
        assert_eq!(r.collider_id(), Some(desk.id));
    }

    #[test]
    fn excluded_support_does_not_hide_other_furniture() {
        let mut state = make_state();
        let desk = commit_desk(&mut state);
        // Beside the desk, clear of it.
        let cube = commit_cube(&mut state, 1.5, 0.0);
        assert_eq!(cube.bounds.min.x, 1.0);

        let straddling = Aabb::new(Vec3::new(0.4, 0.74, -0.1), Vec3::new(1.2, 1.14, 0.1));
        assert!(straddling.intersects(&desk.bounds));
        let r = state
            .collision()
            .check_collision_excluding(&straddling, &[desk.id])
            .unwrap();
        assert_eq!(r.collision_type, CollisionType::Furniture);
        assert_eq!(r.collider_id(), Some(cube.id));
    }

    // -----------------------------------------------------------------------
    // Contract violations
    // -----------------------------------------------------------------------

    #[test]
    fn inverted_box_is_rejected() {
        let state = make_state();
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(
            state.collision().check_collision(&b, None),
            Err(RequestError::MalformedBox)
        );
    }

    #[test]
    fn non_finite_box_is_rejected() {
        let state = make_state();
        let b = Aabb::new(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(state.collision().check_collision(&b, None).is_err());
    }

    // -----------------------------------------------------------------------
    // Index maintenance
    // -----------------------------------------------------------------------

    #[test]
    fn furniture_rebuild_is_idempotent() {
        let mut state = make_state();
        commit_cube(&mut state, 0.0, 0.0);
        commit_cube(&mut state, 2.0, 2.0);

        let mut index = state.index().clone();
        index.rebuild_furniture_obstacles(state.registry());
        let once = index.clone();
        index.rebuild_furniture_obstacles(state.registry());

        assert_eq!(once, index);
        assert_eq!(&index, state.index());
        assert_eq!(index.furniture().len(), 2);
    }

    #[test]
    fn queries_do_not_mutate_state() {
        let mut state = make_state();
        commit_cube(&mut state, 0.0, 0.0);
        let before = state.index().clone();

        let _ = state.collision().check_collision(&unit_box_at(0.0, 0.0), None);
        let _ = state.collision().check_collision(&unit_box_at(9.0, 0.0), None);

        assert_eq!(&before, state.index());
        assert_eq!(state.registry().len(), 1);
    }
}
