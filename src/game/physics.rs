use crossbeam_channel::{Receiver, Sender};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::assets::MeshHandle;
use super::collider::ColliderKind;
use super::constants::physics as consts;
use super::contact_events::{compute_contact_transitions, ContactEvent};
use super::error::ConfigurationError;

/// Rigid-body contract the motion layer drives. One body per character.
///
/// The engine behind it is opaque: motion code only reads and writes
/// velocities, applies impulses and sets the kinematic facing. Contact
/// notifications arrive through the channel returned by `subscribe_contacts`
/// and are drained once per frame by the owner.
pub trait PhysicsBody {
    fn linear_velocity(&self) -> Vector3<f32>;
    fn set_linear_velocity(&mut self, velocity: Vector3<f32>);
    fn angular_velocity(&self) -> Vector3<f32>;
    fn set_angular_velocity(&mut self, velocity: Vector3<f32>);
    /// Instantaneous momentum change applied at a world-space point.
    fn apply_impulse(&mut self, impulse: Vector3<f32>, point: Point3<f32>);
    fn position(&self) -> Point3<f32>;
    fn rotation(&self) -> UnitQuaternion<f32>;
    fn set_rotation(&mut self, rotation: UnitQuaternion<f32>);
    fn mass(&self) -> f32;
    /// False for fixed bodies, which ignore velocities and impulses.
    fn is_dynamic(&self) -> bool;
    /// Overrides mass distribution. A zero inertia component locks that axis.
    fn set_mass_properties(&mut self, mass: f32, inertia: Vector3<f32>);
    fn subscribe_contacts(&mut self) -> Receiver<ContactEvent>;
    /// Gap between the bottom of the body and the first surface below it,
    /// or None when nothing lies within `max_distance`.
    fn ground_distance(&self, max_distance: f32) -> Option<f32>;
}

pub type SharedPhysicsWorld = Rc<RefCell<PhysicsWorld>>;

struct ContactSubscription {
    senders: Vec<Sender<ContactEvent>>,
    previous: HashSet<u64>,
}

/// Wrapper around the Rapier3D pipeline.
/// Characters, props and level geometry all live here; contact transitions for
/// subscribed colliders are published after every step.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Maps Rapier collider handle to the stable id reported in contact events
    pub collider_ids: HashMap<ColliderHandle, u64>,
    next_collider_id: u64,
    contact_subscriptions: HashMap<ColliderHandle, ContactSubscription>,
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, -consts::DEFAULT_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collider_ids: HashMap::new(),
            next_collider_id: 1,
            contact_subscriptions: HashMap::new(),
        }
    }

    /// Wraps the world for shared single-threaded access by body handles.
    pub fn shared(self) -> SharedPhysicsWorld {
        Rc::new(RefCell::new(self))
    }

    /// Sets the gravity magnitude (pointing down)
    pub fn set_gravity(&mut self, gravity_y: f32) {
        self.gravity = vector![0.0, -gravity_y, 0.0];
    }

    /// Steps the physics simulation forward by dt seconds, then publishes contacts
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        // Ground queries read positions as of this step.
        self.query_pipeline.update(&self.collider_set);
        self.publish_contacts();
    }

    /// Inserts a body with its collider and assigns the collider a stable id.
    pub fn insert_body(&mut self, body: RigidBody, collider: Collider) -> (RigidBodyHandle, ColliderHandle, u64) {
        let body_handle = self.rigid_body_set.insert(body);
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        let id = self.next_collider_id;
        self.next_collider_id += 1;
        self.collider_ids.insert(collider_handle, id);

        (body_handle, collider_handle, id)
    }

    /// Adds a fixed box (ground slab, wall) centered at `position`.
    pub fn add_static_box(&mut self, position: [f32; 3], half_extents: [f32; 3]) -> u64 {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
            .friction(consts::DEFAULT_FRICTION)
            .build();
        let (_, _, id) = self.insert_body(body, collider);
        id
    }

    /// Adds fixed triangle-mesh geometry (props, level pieces) at `position`.
    pub fn add_static_mesh(&mut self, mesh: &MeshHandle) -> Result<u64, ConfigurationError> {
        if mesh.triangles.is_empty() {
            return Err(ConfigurationError::InvalidMesh {
                kind: ColliderKind::Mesh,
                reason: format!("mesh '{}' has no triangles", mesh.name),
            });
        }
        let shape = SharedShape::trimesh(mesh.vertices.clone(), mesh.triangles.clone()).map_err(|e| {
            ConfigurationError::InvalidMesh {
                kind: ColliderKind::Mesh,
                reason: format!("{e:?}"),
            }
        })?;
        let body = RigidBodyBuilder::fixed()
            .translation(mesh.position.coords)
            .build();
        let collider = ColliderBuilder::new(shape)
            .friction(consts::DEFAULT_FRICTION)
            .build();
        let (_, _, id) = self.insert_body(body, collider);
        Ok(id)
    }

    /// Removes a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let Some(body) = self.rigid_body_set.get(handle) else {
            return false;
        };
        for ch in body.colliders() {
            self.collider_ids.remove(ch);
            self.contact_subscriptions.remove(ch);
        }
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        true
    }

    /// Opens a contact event stream for a collider.
    pub fn subscribe_contacts(&mut self, collider: ColliderHandle) -> Receiver<ContactEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.contact_subscriptions
            .entry(collider)
            .or_insert_with(|| ContactSubscription {
                senders: Vec::new(),
                previous: HashSet::new(),
            })
            .senders
            .push(sender);
        receiver
    }

    /// Ids of every collider currently in active contact with `collider`.
    pub fn contacts_of(&self, collider: ColliderHandle) -> HashSet<u64> {
        self.narrow_phase
            .contact_pairs_with(collider)
            .filter(|pair| pair.has_any_active_contact)
            .filter_map(|pair| {
                let other = if pair.collider1 == collider {
                    pair.collider2
                } else {
                    pair.collider1
                };
                self.collider_ids.get(&other).copied()
            })
            .collect()
    }

    fn publish_contacts(&mut self) {
        let handles: Vec<ColliderHandle> = self.contact_subscriptions.keys().copied().collect();
        for handle in handles {
            let current = self.contacts_of(handle);
            let Some(subscription) = self.contact_subscriptions.get_mut(&handle) else {
                continue;
            };
            let transitions = compute_contact_transitions(&current, &subscription.previous);
            subscription.previous = current;
            if transitions.is_empty() {
                continue;
            }
            for event in transitions.into_events() {
                // Receivers that were dropped are pruned here.
                subscription.senders.retain(|sender| sender.send(event).is_ok());
            }
        }
        self.contact_subscriptions
            .retain(|_, subscription| !subscription.senders.is_empty());
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Casts a ray downward from a position to detect ground.
    /// Returns the hit distance if ground is found within max_distance.
    pub fn raycast_down(&self, origin: [f32; 3], max_distance: f32, exclude_body: Option<RigidBodyHandle>) -> Option<f32> {
        let ray = Ray::new(point![origin[0], origin[1], origin[2]], vector![0.0, -1.0, 0.0]);

        let filter = if let Some(body_handle) = exclude_body {
            QueryFilter::default().exclude_rigid_body(body_handle)
        } else {
            QueryFilter::default()
        };

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(_, toi)| toi)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// A character's rigid body inside a shared `PhysicsWorld`.
/// The body is removed from the world when the handle is dropped.
pub struct RapierBody {
    world: SharedPhysicsWorld,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    collider_id: u64,
}

impl RapierBody {
    pub fn new(world: SharedPhysicsWorld, body: RigidBodyHandle, collider: ColliderHandle, collider_id: u64) -> Self {
        Self {
            world,
            body,
            collider,
            collider_id,
        }
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// Id this body's collider reports in other bodies' contact events.
    pub fn collider_id(&self) -> u64 {
        self.collider_id
    }

    pub fn is_fixed(&self) -> bool {
        self.read(|body| body.is_fixed()).unwrap_or(true)
    }

    fn read<T>(&self, f: impl FnOnce(&RigidBody) -> T) -> Option<T> {
        let world = self.world.borrow();
        world.rigid_body_set.get(self.body).map(f)
    }

    fn write(&self, f: impl FnOnce(&mut RigidBody)) {
        let mut world = self.world.borrow_mut();
        if let Some(body) = world.rigid_body_set.get_mut(self.body) {
            f(body);
        }
    }
}

impl PhysicsBody for RapierBody {
    fn linear_velocity(&self) -> Vector3<f32> {
        self.read(|body| *body.linvel()).unwrap_or_else(Vector3::zeros)
    }

    fn set_linear_velocity(&mut self, velocity: Vector3<f32>) {
        self.write(|body| {
            if body.is_dynamic() {
                body.set_linvel(velocity, true);
            }
        });
    }

    fn angular_velocity(&self) -> Vector3<f32> {
        self.read(|body| *body.angvel()).unwrap_or_else(Vector3::zeros)
    }

    fn set_angular_velocity(&mut self, velocity: Vector3<f32>) {
        self.write(|body| {
            if body.is_dynamic() {
                body.set_angvel(velocity, true);
            }
        });
    }

    fn apply_impulse(&mut self, impulse: Vector3<f32>, point: Point3<f32>) {
        self.write(|body| {
            if body.is_dynamic() {
                body.apply_impulse_at_point(impulse, point, true);
            }
        });
    }

    fn position(&self) -> Point3<f32> {
        self.read(|body| Point3::from(*body.translation()))
            .unwrap_or_else(Point3::origin)
    }

    fn rotation(&self) -> UnitQuaternion<f32> {
        self.read(|body| *body.rotation())
            .unwrap_or_else(UnitQuaternion::identity)
    }

    fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.write(|body| body.set_rotation(rotation, true));
    }

    fn mass(&self) -> f32 {
        self.read(|body| body.mass()).unwrap_or(0.0)
    }

    fn is_dynamic(&self) -> bool {
        self.read(|body| body.is_dynamic()).unwrap_or(false)
    }

    fn set_mass_properties(&mut self, mass: f32, inertia: Vector3<f32>) {
        self.write(|body| {
            if body.is_dynamic() {
                let props = MassProperties::new(Point3::origin(), mass, inertia);
                body.set_additional_mass_properties(props, true);
            }
        });
    }

    fn subscribe_contacts(&mut self) -> Receiver<ContactEvent> {
        self.world.borrow_mut().subscribe_contacts(self.collider)
    }

    fn ground_distance(&self, max_distance: f32) -> Option<f32> {
        let world = self.world.borrow();
        let aabb = world.collider_set.get(self.collider)?.compute_aabb();
        let center = aabb.center();
        // The ray starts just inside the body's own collider, which is excluded.
        let lift = consts::GROUND_RAY_LIFT;
        let origin = [center.x, aabb.mins.y + lift, center.z];
        world
            .raycast_down(origin, max_distance + lift, Some(self.body))
            .map(|toi| (toi - lift).max(0.0))
    }
}

impl Drop for RapierBody {
    fn drop(&mut self) {
        if let Ok(mut world) = self.world.try_borrow_mut() {
            world.remove_body(self.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_ball(world: &SharedPhysicsWorld, y: f32) -> RapierBody {
        let body = RigidBodyBuilder::dynamic().translation(vector![0.0, y, 0.0]).build();
        let collider = ColliderBuilder::ball(0.5).mass(10.0).build();
        let (bh, ch, id) = world.borrow_mut().insert_body(body, collider);
        RapierBody::new(Rc::clone(world), bh, ch, id)
    }

    #[test]
    fn test_physics_world_creation() {
        let world = PhysicsWorld::new();
        assert_eq!(world.gravity.y, -consts::DEFAULT_GRAVITY);
    }

    #[test]
    fn test_dynamic_body_falls() {
        let world = PhysicsWorld::new().shared();
        let ball = dynamic_ball(&world, 10.0);

        let initial = ball.position();
        for _ in 0..10 {
            world.borrow_mut().step(consts::TIMESTEP);
        }

        assert!(ball.position().y < initial.y);
    }

    #[test]
    fn test_contact_started_when_landing() {
        let world = PhysicsWorld::new().shared();
        let ground = world.borrow_mut().add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0]);
        let mut ball = dynamic_ball(&world, 2.0);
        let contacts = ball.subscribe_contacts();

        let mut started = false;
        for _ in 0..120 {
            world.borrow_mut().step(consts::TIMESTEP);
            for event in contacts.try_iter() {
                if event == (ContactEvent::Started { other: ground }) {
                    started = true;
                }
            }
        }

        assert!(started, "ball resting on the ground should report a contact");
    }

    #[test]
    fn test_impulse_launches_body() {
        let world = PhysicsWorld::new().shared();
        let mut ball = dynamic_ball(&world, 0.0);
        world.borrow_mut().set_gravity(0.0);
        world.borrow_mut().step(consts::TIMESTEP);

        let center = ball.position();
        ball.apply_impulse(Vector3::new(0.0, 50.0, 0.0), center);

        assert!(ball.linear_velocity().y > 0.0);
        assert!(ball.linear_velocity().x.abs() < consts::EPSILON);
    }

    #[test]
    fn test_ball_rests_on_static_mesh() {
        let world = PhysicsWorld::new().shared();
        let slab = MeshHandle::cuboid("slab", Point3::new(-5.0, -1.0, -5.0), Point3::new(5.0, 0.0, 5.0), Point3::origin());
        let slab_id = world.borrow_mut().add_static_mesh(&slab).unwrap();
        let mut ball = dynamic_ball(&world, 2.0);
        let contacts = ball.subscribe_contacts();

        for _ in 0..120 {
            world.borrow_mut().step(consts::TIMESTEP);
        }

        assert!(contacts.try_iter().any(|e| e == ContactEvent::Started { other: slab_id }));
        assert!(ball.position().y > 0.0);
    }

    #[test]
    fn test_empty_static_mesh_rejected() {
        let mut world = PhysicsWorld::new();
        let empty = MeshHandle {
            name: "empty".to_string(),
            vertices: Vec::new(),
            triangles: Vec::new(),
            position: Point3::origin(),
        };
        assert!(world.add_static_mesh(&empty).is_err());
    }

    #[test]
    fn test_ground_distance_tracks_the_floor() {
        let world = PhysicsWorld::new().shared();
        world.borrow_mut().add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0]);
        let ball = dynamic_ball(&world, 3.0);
        world.borrow_mut().step(consts::TIMESTEP);

        // Ball bottom sits about 2.5 m above the floor.
        assert!(ball.ground_distance(0.5).is_none());
        let gap = ball.ground_distance(5.0).unwrap();
        assert!((gap - 2.5).abs() < 0.1, "gap = {gap}");

        for _ in 0..120 {
            world.borrow_mut().step(consts::TIMESTEP);
        }
        let gap = ball.ground_distance(0.5).unwrap();
        assert!(gap < 0.05, "resting ball should touch the floor, gap = {gap}");
    }

    #[test]
    fn test_wall_beside_body_is_not_ground() {
        let world = PhysicsWorld::new().shared();
        world.borrow_mut().set_gravity(0.0);
        world.borrow_mut().add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0]);
        world.borrow_mut().add_static_box([1.0, 5.0, 0.0], [0.5, 5.0, 2.0]);
        let ball = dynamic_ball(&world, 5.0);
        world.borrow_mut().step(consts::TIMESTEP);

        assert!(ball.ground_distance(0.5).is_none());
        assert!(ball.is_dynamic());
    }

    #[test]
    fn test_dropping_body_removes_it() {
        let world = PhysicsWorld::new().shared();
        let handle = {
            let ball = dynamic_ball(&world, 1.0);
            ball.handle()
        };
        assert!(world.borrow().get_position(handle).is_none());
    }
}
