//! In-memory `PhysicsBody` for unit tests that should not need a rapier world.

use crossbeam_channel::{Receiver, Sender};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::contact_events::ContactEvent;
use super::physics::PhysicsBody;

#[derive(Debug, Clone)]
pub struct BodyState {
    pub linear_velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub mass: f32,
    pub inertia: Option<Vector3<f32>>,
    pub impulses: Vec<(Vector3<f32>, Point3<f32>)>,
    pub velocity_writes: usize,
    /// Gap reported by `ground_distance`; None means nothing below
    pub ground_gap: Option<f32>,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            mass: 1.0,
            inertia: None,
            impulses: Vec::new(),
            velocity_writes: 0,
            ground_gap: Some(0.0),
        }
    }
}

/// Records every call; clones share state so a test can keep a handle after
/// boxing one into a controller. Impulses change velocity by `impulse / mass`.
#[derive(Clone)]
pub struct RecordingBody {
    state: Rc<RefCell<BodyState>>,
    contacts_tx: Sender<ContactEvent>,
    contacts_rx: Receiver<ContactEvent>,
}

impl RecordingBody {
    pub fn new(mass: f32) -> Self {
        let (contacts_tx, contacts_rx) = crossbeam_channel::unbounded();
        Self {
            state: Rc::new(RefCell::new(BodyState {
                mass,
                ..BodyState::default()
            })),
            contacts_tx,
            contacts_rx,
        }
    }

    pub fn state(&self) -> Ref<'_, BodyState> {
        self.state.borrow()
    }

    pub fn boxed(&self) -> Box<dyn PhysicsBody> {
        Box::new(self.clone())
    }

    /// Sender standing in for the physics engine's contact stream.
    pub fn contact_sender(&self) -> Sender<ContactEvent> {
        self.contacts_tx.clone()
    }

    pub fn set_velocity(&self, velocity: Vector3<f32>) {
        self.state.borrow_mut().linear_velocity = velocity;
    }

    pub fn set_position(&self, position: Point3<f32>) {
        self.state.borrow_mut().position = position;
    }

    pub fn set_ground_gap(&self, gap: Option<f32>) {
        self.state.borrow_mut().ground_gap = gap;
    }
}

impl PhysicsBody for RecordingBody {
    fn linear_velocity(&self) -> Vector3<f32> {
        self.state.borrow().linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vector3<f32>) {
        let mut state = self.state.borrow_mut();
        state.linear_velocity = velocity;
        state.velocity_writes += 1;
    }

    fn angular_velocity(&self) -> Vector3<f32> {
        self.state.borrow().angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: Vector3<f32>) {
        self.state.borrow_mut().angular_velocity = velocity;
    }

    fn apply_impulse(&mut self, impulse: Vector3<f32>, point: Point3<f32>) {
        let mut state = self.state.borrow_mut();
        let mass = state.mass;
        if mass > 0.0 {
            state.linear_velocity += impulse / mass;
        }
        state.impulses.push((impulse, point));
    }

    fn position(&self) -> Point3<f32> {
        self.state.borrow().position
    }

    fn rotation(&self) -> UnitQuaternion<f32> {
        self.state.borrow().rotation
    }

    fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.state.borrow_mut().rotation = rotation;
    }

    fn mass(&self) -> f32 {
        self.state.borrow().mass
    }

    fn is_dynamic(&self) -> bool {
        self.state.borrow().mass > 0.0
    }

    fn set_mass_properties(&mut self, mass: f32, inertia: Vector3<f32>) {
        let mut state = self.state.borrow_mut();
        state.mass = mass;
        state.inertia = Some(inertia);
    }

    fn subscribe_contacts(&mut self) -> Receiver<ContactEvent> {
        self.contacts_rx.clone()
    }

    fn ground_distance(&self, max_distance: f32) -> Option<f32> {
        self.state.borrow().ground_gap.filter(|gap| *gap <= max_distance)
    }
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1.0e-4
}

pub fn approx_vec(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
    (a - b).norm() < 1.0e-4
}
