use crossbeam_channel::Receiver;
use nalgebra::Point3;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::animation::{AnimationBlendEngine, AnimationEvent};
use super::contact_events::ContactEvent;
use super::motion::MotionController;
use crate::config::{AnimationConfig, ClipBinding, ClipBindings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Idle,
    Locomoting,
    Airborne,
    OneShotAction,
}

/// Clip bound to each coordinator action. Locomotion and idle clips loop
/// unless their binding says otherwise; jump and attack play once.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorClips {
    pub idle: ClipBinding,
    pub walk: ClipBinding,
    pub back_pedal: ClipBinding,
    pub strafe_left: ClipBinding,
    pub strafe_right: ClipBinding,
    pub jump: ClipBinding,
    pub attack: ClipBinding,
}

impl CoordinatorClips {
    /// Resolves the bindings; a jump without its own frames plays `jump_frames`.
    pub fn new(bindings: &ClipBindings, animation: &AnimationConfig) -> Self {
        let mut jump = bindings.jump.clone();
        jump.from_frame = jump.from_frame.or(Some(animation.jump_frames[0]));
        jump.to_frame = jump.to_frame.or(Some(animation.jump_frames[1]));
        Self {
            idle: bindings.idle.clone(),
            walk: bindings.walk.clone(),
            back_pedal: bindings.back_pedal.clone(),
            strafe_left: bindings.strafe_left.clone(),
            strafe_right: bindings.strafe_right.clone(),
            jump,
            attack: bindings.attack.clone(),
        }
    }
}

impl Default for CoordinatorClips {
    fn default() -> Self {
        Self::new(&ClipBindings::default(), &AnimationConfig::default())
    }
}

/// Binds one character's motion, animation and contact stream.
///
/// Movement calls hit the body first and then pick the clip. Airborne is left
/// only when the jump clip has ended, a contact has started since the jump and
/// there is ground right below the body. Touching a wall in mid-air never lands.
pub struct CharacterMotionCoordinator {
    motion: MotionController,
    animation: AnimationBlendEngine,
    contacts: Option<Receiver<ContactEvent>>,
    clips: CoordinatorClips,
    state: MotionState,
    /// State resumed when the running one-shot ends
    resume: MotionState,
    one_shot: Option<String>,
    touching: HashSet<u64>,
    contact_since_jump: bool,
}

impl CharacterMotionCoordinator {
    pub fn new(
        motion: MotionController,
        animation: AnimationBlendEngine,
        contacts: Option<Receiver<ContactEvent>>,
        clips: CoordinatorClips,
    ) -> Self {
        Self {
            motion,
            animation,
            contacts,
            clips,
            state: MotionState::Idle,
            resume: MotionState::Idle,
            one_shot: None,
            touching: HashSet::new(),
            contact_since_jump: false,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionController {
        &mut self.motion
    }

    pub fn animation(&self) -> &AnimationBlendEngine {
        &self.animation
    }

    pub fn clips(&self) -> &CoordinatorClips {
        &self.clips
    }

    pub fn is_touching(&self) -> bool {
        !self.touching.is_empty()
    }

    pub fn move_forward(&mut self, speed: f32) {
        let clip = self.clips.walk.clone();
        self.locomote(&clip, |motion| motion.move_forward(speed));
    }

    pub fn back_pedal(&mut self, speed: f32) {
        let clip = self.clips.back_pedal.clone();
        self.locomote(&clip, |motion| motion.back_pedal(speed));
    }

    pub fn strafe_left(&mut self, speed: f32) {
        let clip = self.clips.strafe_left.clone();
        self.locomote(&clip, |motion| motion.strafe_left(speed));
    }

    pub fn strafe_right(&mut self, speed: f32) {
        let clip = self.clips.strafe_right.clone();
        self.locomote(&clip, |motion| motion.strafe_right(speed));
    }

    pub fn move_diagonally_left(&mut self, speed: f32) {
        let clip = self.clips.walk.clone();
        self.locomote(&clip, |motion| motion.move_diagonally_left(speed));
    }

    pub fn move_diagonally_right(&mut self, speed: f32) {
        let clip = self.clips.walk.clone();
        self.locomote(&clip, |motion| motion.move_diagonally_right(speed));
    }

    /// Walks toward `target`; settles into idle once within `threshold`.
    pub fn move_to(&mut self, target: Point3<f32>, speed: f32, threshold: f32) -> bool {
        if !self.motion.movement_enabled() {
            return false;
        }
        if self.motion.move_toward(target, speed, threshold) {
            self.idle();
            return true;
        }
        let clip = self.clips.walk.clone();
        self.locomote(&clip, |_| {});
        false
    }

    /// Turning in place changes facing only.
    pub fn rotate_left(&mut self, yaw: f32) {
        self.motion.rotate_left(yaw);
    }

    pub fn rotate_right(&mut self, yaw: f32) {
        self.motion.rotate_right(yaw);
    }

    pub fn sync_rotation_with_camera(&mut self, camera_yaw: f32) {
        self.motion.sync_rotation_with_camera(camera_yaw);
    }

    /// Triggers the jump clip and the jump impulse together. A second jump
    /// while airborne retriggers nothing physical; the body rejects the impulse.
    pub fn jump(&mut self) {
        self.animation.play(&self.clips.jump.name, self.clips.jump.options(false));

        if self.motion.apply_jump_force() {
            self.contact_since_jump = false;
            self.one_shot = None;
            self.transition(MotionState::Airborne);
        }
    }

    /// Plays a one-shot action clip (`None` uses the bound attack clip).
    pub fn attack(&mut self, clip: Option<&str>) {
        let binding = match clip {
            Some(name) => ClipBinding::named(name),
            None => self.clips.attack.clone(),
        };
        if !self.animation.play(&binding.name, binding.options(false)) {
            return;
        }
        if self.state != MotionState::OneShotAction {
            self.resume = self.state;
        }
        self.one_shot = Some(binding.name);
        self.transition(MotionState::OneShotAction);
    }

    /// No directional input this frame.
    pub fn idle(&mut self) {
        match self.state {
            // Keep jump momentum.
            MotionState::Airborne => {}
            MotionState::OneShotAction => {
                if !self.motion.is_airborne() {
                    self.motion.stop();
                    self.resume = MotionState::Idle;
                }
            }
            MotionState::Idle | MotionState::Locomoting => {
                self.motion.stop();
                self.animation.play(&self.clips.idle.name, self.clips.idle.options(true));
                self.transition(MotionState::Idle);
            }
        }
    }

    /// Per-frame bookkeeping after the physics step: drains contacts, advances
    /// animation, resolves landing and one-shot completion.
    pub fn update(&mut self, dt: f32) -> Vec<AnimationEvent> {
        self.drain_contacts();

        let events = self.animation.tick(dt);
        for AnimationEvent::Ended(name) in &events {
            if self.one_shot.as_deref() == Some(name.as_str()) {
                self.finish_one_shot();
            }
        }

        if self.motion.is_airborne() && self.landing_confirmed() {
            self.motion.land();
            if self.state == MotionState::Airborne {
                self.animation.play(&self.clips.idle.name, self.clips.idle.options(true));
                self.transition(MotionState::Idle);
            } else if self.resume == MotionState::Airborne {
                self.resume = MotionState::Idle;
            }
        }
        events
    }

    /// Stops animation and motion; the coordinator is inert afterwards.
    pub fn dispose(&mut self) {
        self.animation.dispose();
        self.motion.stop();
        self.motion.set_movement_enabled(false);
        self.contacts = None;
    }

    fn locomote(&mut self, clip: &ClipBinding, apply: impl FnOnce(&mut MotionController)) {
        if !self.motion.movement_enabled() {
            return;
        }
        apply(&mut self.motion);
        match self.state {
            MotionState::Airborne => {}
            MotionState::OneShotAction => {
                if !self.motion.is_airborne() {
                    self.resume = MotionState::Locomoting;
                }
            }
            MotionState::Idle | MotionState::Locomoting => {
                self.animation.play(&clip.name, clip.options(true));
                self.transition(MotionState::Locomoting);
            }
        }
    }

    fn finish_one_shot(&mut self) {
        self.one_shot = None;
        let next = if self.motion.is_airborne() {
            MotionState::Airborne
        } else {
            self.resume
        };
        let clip = match next {
            MotionState::Idle => Some(self.clips.idle.clone()),
            MotionState::Locomoting => Some(self.clips.walk.clone()),
            MotionState::Airborne | MotionState::OneShotAction => None,
        };
        if let Some(clip) = clip {
            self.animation.play(&clip.name, clip.options(true));
        }
        self.transition(next);
    }

    fn drain_contacts(&mut self) {
        let Some(contacts) = self.contacts.as_ref() else {
            return;
        };
        for event in contacts.try_iter() {
            match event {
                ContactEvent::Started { other } => {
                    self.touching.insert(other);
                    if self.motion.is_airborne() {
                        self.contact_since_jump = true;
                    }
                }
                ContactEvent::Stopped { other } => {
                    self.touching.remove(&other);
                }
            }
        }
    }

    fn landing_confirmed(&self) -> bool {
        let jump = &self.clips.jump.name;
        let clip_done = !self.animation.has_clip(jump) || self.animation.has_ended(jump);
        clip_done && self.contact_since_jump && self.motion.is_grounded()
    }

    fn transition(&mut self, next: MotionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "motion state");
            self.state = next;
        }
    }
}
