use nalgebra::Point3;
use std::rc::Rc;

use wayfarer::game::assets::MeshHandle;
use wayfarer::game::collider::{ColliderConfig, ColliderFactory, ColliderKind, ColliderParams, PhysicalProps};
use wayfarer::game::constants::physics::TIMESTEP;
use wayfarer::game::error::ConfigurationError;
use wayfarer::game::physics::{PhysicsBody, PhysicsWorld, SharedPhysicsWorld};

fn world_with_ground() -> SharedPhysicsWorld {
    let world = PhysicsWorld::new().shared();
    world.borrow_mut().add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0]);
    world
}

fn humanoid(y: f32) -> MeshHandle {
    MeshHandle::cuboid("guy", Point3::new(-0.35, 0.0, -0.35), Point3::new(0.35, 2.0, 0.35), Point3::new(0.0, y, 0.0))
}

fn step(world: &SharedPhysicsWorld, frames: usize) {
    for _ in 0..frames {
        world.borrow_mut().step(TIMESTEP);
    }
}

#[test]
fn test_capsule_player_rests_upright_on_ground() {
    let world = world_with_ground();
    let config = ColliderConfig::capsule([0.0, 0.35, 0.0], [0.0, 1.65, 0.0], 0.35, 80.0)
        .with_inertia([0.0, 1.0, 0.0])
        .with_friction(0.0, 0.0);
    let body = ColliderFactory::build(&world, &humanoid(1.0), &config).unwrap();

    step(&world, 120);

    assert!((body.mass() - 80.0).abs() < 1.0e-3, "mass {}", body.mass());
    let y = body.position().y;
    assert!(y.abs() < 0.1, "capsule bottom should sit on the ground, y = {y}");
    let up = body.rotation() * nalgebra::Vector3::y();
    assert!(up.y > 0.99, "rotation about X/Z must stay locked, up = {up:?}");
}

#[test]
fn test_auto_box_falls_onto_ground() {
    let world = world_with_ground();
    let crate_mesh = MeshHandle::cuboid("crate", Point3::new(-0.5, 0.0, -0.5), Point3::new(0.5, 1.0, 0.5), Point3::new(0.0, 3.0, 0.0));
    let body = ColliderFactory::build(&world, &crate_mesh, &ColliderConfig::auto(ColliderKind::Box, 10.0)).unwrap();

    step(&world, 180);

    assert!(!body.is_fixed());
    assert!(body.position().y.abs() < 0.05, "box should settle at y = 0, got {}", body.position().y);
}

#[test]
fn test_mesh_collider_is_static_even_with_mass() {
    let world = world_with_ground();
    let rock = MeshHandle::cuboid("rock", Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 1.0, 1.0), Point3::new(4.0, 5.0, 0.0));
    let body = ColliderFactory::build(&world, &rock, &ColliderConfig::auto(ColliderKind::Mesh, 50.0)).unwrap();

    step(&world, 30);

    assert!(body.is_fixed());
    assert_eq!(body.position(), Point3::new(4.0, 5.0, 0.0));
}

#[test]
fn test_rejected_configs_create_nothing() {
    let world = world_with_ground();
    let bodies_before = world.borrow().rigid_body_set.len();
    let mesh = humanoid(1.0);

    let missing_radius = ColliderConfig {
        kind: ColliderKind::Capsule,
        params: ColliderParams {
            auto: false,
            point_a: Some([0.0, 0.35, 0.0]),
            point_b: Some([0.0, 1.65, 0.0]),
            ..ColliderParams::default()
        },
        props: PhysicalProps::default(),
    };
    let err = ColliderFactory::build(&world, &mesh, &missing_radius).err().unwrap();
    assert_eq!(err.field(), "radius");
    assert!(err.to_string().contains("radius"));

    let flat_box = ColliderConfig {
        kind: ColliderKind::Box,
        params: ColliderParams {
            auto: false,
            width: Some(0.0),
            height: Some(1.0),
            depth: Some(1.0),
            ..ColliderParams::default()
        },
        props: PhysicalProps::default(),
    };
    let err = ColliderFactory::build(&world, &mesh, &flat_box).err().unwrap();
    assert!(matches!(err, ConfigurationError::NonPositive { field: "width", .. }));

    assert_eq!(world.borrow().rigid_body_set.len(), bodies_before);
}

#[test]
fn test_explicit_mesh_param_overrides_owner_mesh() {
    let world = world_with_ground();
    let ramp = Rc::new(MeshHandle::cuboid("ramp", Point3::new(-2.0, 0.0, -2.0), Point3::new(2.0, 0.5, 2.0), Point3::origin()));
    let config = ColliderConfig {
        kind: ColliderKind::Mesh,
        params: ColliderParams {
            auto: false,
            mesh: Some(Rc::clone(&ramp)),
            ..ColliderParams::default()
        },
        props: PhysicalProps::default(),
    };
    let spec = ColliderFactory::validate(&config, &humanoid(0.0)).unwrap();
    assert!(spec.is_static());
    assert!(ColliderFactory::build(&world, &humanoid(0.0), &config).is_ok());
}
