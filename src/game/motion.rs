use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::{debug, trace};

use super::constants::motion as consts;
use super::constants::physics;
use super::orientation::{self, world_up};
use super::physics::PhysicsBody;
use crate::config::MotionConfig;

/// Turns directional intent into velocity and facing for one rigid body.
///
/// `forward` is the authoritative facing state and is either unit length or
/// zero. Locomotion moves the body along `-forward`, matching how the rig's
/// meshes are authored. Facing is applied kinematically: every orientation
/// change writes the rotation and zeroes angular velocity so the solver never
/// spins the capsule.
pub struct MotionController {
    body: Option<Box<dyn PhysicsBody>>,
    forward: Vector3<f32>,
    facing: UnitQuaternion<f32>,
    movement_enabled: bool,
    diagonal_facing: bool,
    airborne: bool,
    jump_impulse: f32,
}

impl MotionController {
    pub fn new(body: Option<Box<dyn PhysicsBody>>, settings: &MotionConfig) -> Self {
        let forward = Vector3::from(settings.initial_forward)
            .try_normalize(1.0e-6)
            .unwrap_or_else(Vector3::zeros);
        let mut controller = Self {
            body,
            forward,
            facing: UnitQuaternion::identity(),
            movement_enabled: true,
            diagonal_facing: settings.diagonal_facing,
            airborne: false,
            jump_impulse: settings.jump_impulse,
        };
        if controller.body.is_none() {
            debug!("motion controller created without a physics body");
        }
        controller.orient_to_forward();
        controller
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn facing(&self) -> UnitQuaternion<f32> {
        self.facing
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    /// True when a surface lies directly below the body within the ground
    /// check distance. Bodiless controllers are never grounded.
    pub fn is_grounded(&self) -> bool {
        self.body
            .as_ref()
            .is_some_and(|body| body.ground_distance(physics::GROUND_CHECK_DISTANCE).is_some())
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body(&self) -> Option<&dyn PhysicsBody> {
        self.body.as_deref()
    }

    pub fn position(&self) -> Option<Point3<f32>> {
        self.body.as_ref().map(|body| body.position())
    }

    pub fn velocity(&self) -> Option<Vector3<f32>> {
        self.body.as_ref().map(|body| body.linear_velocity())
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
    }

    pub fn set_diagonal_facing(&mut self, enabled: bool) {
        self.diagonal_facing = enabled;
    }

    pub fn diagonal_facing(&self) -> bool {
        self.diagonal_facing
    }

    pub fn move_forward(&mut self, speed: f32) {
        let forward = self.forward;
        self.locomote(speed, |f| -f, forward);
    }

    pub fn back_pedal(&mut self, speed: f32) {
        let forward = self.forward;
        self.locomote(speed, |f| f, forward);
    }

    pub fn strafe_left(&mut self, speed: f32) {
        let forward = self.forward;
        self.locomote(speed, |f| -Self::right_of(f), forward);
    }

    pub fn strafe_right(&mut self, speed: f32) {
        let forward = self.forward;
        self.locomote(speed, Self::right_of, forward);
    }

    pub fn move_diagonally_left(&mut self, speed: f32) {
        let dir = (self.forward + self.forward.cross(&world_up()))
            .try_normalize(1.0e-6)
            .unwrap_or_else(Vector3::zeros);
        let facing = if self.diagonal_facing { dir } else { self.forward };
        self.locomote(speed, move |_| -dir, facing);
    }

    pub fn move_diagonally_right(&mut self, speed: f32) {
        let dir = (self.forward + world_up().cross(&self.forward))
            .try_normalize(1.0e-6)
            .unwrap_or_else(Vector3::zeros);
        let facing = if self.diagonal_facing { dir } else { self.forward };
        self.locomote(speed, move |_| -dir, facing);
    }

    pub fn rotate_left(&mut self, yaw: f32) {
        self.rotate(-yaw);
    }

    pub fn rotate_right(&mut self, yaw: f32) {
        self.rotate(yaw);
    }

    /// Faces away from the camera look direction.
    pub fn sync_rotation_with_camera(&mut self, camera_yaw: f32) {
        if !self.can_move() {
            return;
        }
        self.forward = orientation::forward_from_camera_yaw(camera_yaw);
        // Diagonal-facing mode owns the facing while moving diagonally.
        if !self.diagonal_facing {
            self.orient_to_forward();
        }
    }

    /// Applies the jump impulse at the body centre. Returns false when no
    /// impulse was applied (already airborne, disabled, no body or a fixed body).
    pub fn apply_jump_force(&mut self) -> bool {
        if self.airborne || !self.movement_enabled {
            return false;
        }
        let impulse = Vector3::new(0.0, self.jump_impulse, 0.0);
        let Some(body) = self.body.as_mut() else {
            return false;
        };
        if !body.is_dynamic() {
            debug!("jump ignored, body is fixed");
            return false;
        }
        let center = body.position();
        body.apply_impulse(impulse, center);
        self.airborne = true;
        debug!(impulse = self.jump_impulse, "jump impulse applied");
        true
    }

    /// Clears the airborne flag once landing has been confirmed.
    pub fn land(&mut self) {
        if self.airborne {
            debug!("landed");
        }
        self.airborne = false;
    }

    /// Steers across the XZ plane toward `target`, facing it. Returns true
    /// (and stops) once within `threshold`. Forward becomes the travel direction.
    pub fn move_toward(&mut self, target: Point3<f32>, speed: f32, threshold: f32) -> bool {
        let Some(position) = self.position() else {
            return false;
        };
        let delta = Vector3::new(target.x - position.x, 0.0, target.z - position.z);
        let distance = delta.norm();
        if distance <= threshold.max(consts::MOVE_TO_REACHED_DISTANCE) {
            self.stop();
            return true;
        }
        if !self.can_move() {
            return false;
        }
        let direction = delta / distance;
        self.forward = direction;
        if let Some(body) = self.body.as_mut() {
            Self::write_horizontal(body.as_mut(), direction * speed);
        }
        self.orient_to(direction);
        false
    }

    /// Zeroes horizontal velocity, keeping the fall.
    pub fn stop(&mut self) {
        if let Some(body) = self.body.as_mut() {
            Self::write_horizontal(body.as_mut(), Vector3::zeros());
        }
    }

    fn can_move(&self) -> bool {
        self.movement_enabled && self.body.is_some()
    }

    fn right_of(forward: Vector3<f32>) -> Vector3<f32> {
        forward
            .cross(&world_up())
            .try_normalize(1.0e-6)
            .unwrap_or_else(Vector3::zeros)
    }

    fn locomote(&mut self, speed: f32, direction: impl FnOnce(Vector3<f32>) -> Vector3<f32>, facing: Vector3<f32>) {
        if !self.can_move() {
            return;
        }
        let idle = speed == 0.0 || self.forward.norm_squared() < consts::MIN_FORWARD_LENGTH_SQ;
        let horizontal = if idle {
            Vector3::zeros()
        } else {
            direction(self.forward) * speed
        };
        if let Some(body) = self.body.as_mut() {
            Self::write_horizontal(body.as_mut(), horizontal);
        }
        if !idle {
            self.orient_to(facing);
        }
        trace!(vx = horizontal.x, vz = horizontal.z, "locomotion");
    }

    fn rotate(&mut self, yaw: f32) {
        if !self.can_move() || yaw == 0.0 {
            return;
        }
        let rotated = orientation::rotate_local_yaw(&self.facing, yaw);
        self.forward = orientation::forward_from_rotation(&rotated);
        self.orient_to_forward();
    }

    fn write_horizontal(body: &mut dyn PhysicsBody, horizontal: Vector3<f32>) {
        let current = body.linear_velocity();
        let next = Vector3::new(horizontal.x, current.y, horizontal.z);
        if next != current {
            body.set_linear_velocity(next);
        }
    }

    fn orient_to_forward(&mut self) {
        let forward = self.forward;
        self.orient_to(forward);
    }

    fn orient_to(&mut self, direction: Vector3<f32>) {
        // Zero direction keeps the last facing.
        if direction.norm_squared() < consts::MIN_FORWARD_LENGTH_SQ {
            return;
        }
        self.facing = orientation::facing_rotation(&direction);
        if let Some(body) = self.body.as_mut() {
            body.set_rotation(self.facing);
            body.set_angular_velocity(Vector3::zeros());
        }
    }
}
