use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use tracing::trace;

use super::constants::motion as consts;
use super::coordinator::CharacterMotionCoordinator;
use crate::config::WanderConfig;

/// Random-walk steering for an NPC.
///
/// Picks an XZ target `min_distance..max_distance` away, walks there and picks
/// the next one once the body has come to rest (arrived or stuck).
pub struct Wanderer {
    min_distance: f32,
    max_distance: f32,
    speed: f32,
    target: Option<Point3<f32>>,
    active: bool,
    /// Frames spent steering toward the current target
    steps: u32,
    rng: StdRng,
}

impl Wanderer {
    pub fn new(settings: &WanderConfig, speed: f32) -> Self {
        Self::with_rng(settings, speed, StdRng::from_entropy())
    }

    pub fn with_rng(settings: &WanderConfig, speed: f32, rng: StdRng) -> Self {
        Self {
            min_distance: settings.min_distance.max(0.0),
            max_distance: settings.max_distance,
            speed,
            target: None,
            active: false,
            steps: 0,
            rng,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
        self.target = None;
    }

    pub fn stop(&mut self, coordinator: &mut CharacterMotionCoordinator) {
        self.active = false;
        self.target = None;
        coordinator.idle();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target(&self) -> Option<Point3<f32>> {
        self.target
    }

    /// Steers one frame. Call before the physics step.
    pub fn update(&mut self, coordinator: &mut CharacterMotionCoordinator) {
        if !self.active {
            return;
        }
        let Some(position) = coordinator.motion().position() else {
            return;
        };

        if self.target.is_some() && self.steps > 0 {
            let velocity = coordinator.motion().velocity().unwrap_or_else(Vector3::zeros);
            let horizontal = Vector3::new(velocity.x, 0.0, velocity.z);
            if horizontal.norm_squared() < consts::NPC_STOPPED_SPEED_SQ {
                self.target = None;
            }
        }

        let target = match self.target {
            Some(target) => target,
            None => {
                let target = self.next_target(position);
                trace!(x = target.x, z = target.z, "wander target");
                self.target = Some(target);
                self.steps = 0;
                target
            }
        };

        self.steps += 1;
        if coordinator.move_to(target, self.speed, consts::MOVE_TO_REACHED_DISTANCE) {
            self.target = None;
        }
    }

    fn next_target(&mut self, from: Point3<f32>) -> Point3<f32> {
        let angle = self.rng.gen_range(0.0..TAU);
        let distance = if self.max_distance > self.min_distance {
            self.rng.gen_range(self.min_distance..self.max_distance)
        } else {
            self.min_distance
        };
        Point3::new(from.x + angle.cos() * distance, from.y, from.z + angle.sin() * distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnimationConfig, ClipBinding, ClipBindings, MotionConfig};
    use crate::game::animation::{AnimationBlendEngine, AnimationClip};
    use crate::game::coordinator::{CoordinatorClips, MotionState};
    use crate::game::motion::MotionController;
    use crate::game::test_support::RecordingBody;

    fn npc() -> (CharacterMotionCoordinator, RecordingBody) {
        let body = RecordingBody::new(75.0);
        let motion = MotionController::new(Some(body.boxed()), &MotionConfig::default());
        let settings = AnimationConfig {
            idle_clip: "Idle".to_string(),
            ..AnimationConfig::default()
        };
        let mut animation = AnimationBlendEngine::new(settings.clone());
        animation.initialize(vec![
            AnimationClip::new("Idle", 0.0, 120.0, 60.0),
            AnimationClip::new("Walk", 0.0, 60.0, 60.0),
        ]);
        let bindings = ClipBindings {
            idle: ClipBinding::named("Idle"),
            ..ClipBindings::default()
        };
        let coordinator = CharacterMotionCoordinator::new(motion, animation, None, CoordinatorClips::new(&bindings, &settings));
        (coordinator, body)
    }

    fn wanderer() -> Wanderer {
        Wanderer::with_rng(&WanderConfig::default(), 2.0, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_target_within_wander_ring() {
        let mut wanderer = wanderer();
        for _ in 0..50 {
            let target = wanderer.next_target(Point3::new(5.0, 1.0, 5.0));
            let distance = ((target.x - 5.0).powi(2) + (target.z - 5.0).powi(2)).sqrt();
            assert!((4.999..=10.001).contains(&distance), "distance {distance}");
            assert_eq!(target.y, 1.0);
        }
    }

    #[test]
    fn test_walks_toward_target_with_walk_clip() {
        let (mut coordinator, body) = npc();
        let mut wanderer = wanderer();
        wanderer.start();
        wanderer.update(&mut coordinator);

        let target = wanderer.target().unwrap();
        let velocity = body.state().linear_velocity;
        let heading = Vector3::new(target.x, 0.0, target.z).normalize();
        assert!((velocity.norm() - 2.0).abs() < 1.0e-4);
        assert!((velocity.normalize() - heading).norm() < 1.0e-4);
        assert_eq!(coordinator.state(), MotionState::Locomoting);
        assert_eq!(coordinator.animation().current(), Some("Walk"));
    }

    #[test]
    fn test_arrival_idles_and_repicks() {
        let (mut coordinator, body) = npc();
        let mut wanderer = wanderer();
        wanderer.start();
        wanderer.update(&mut coordinator);
        let first = wanderer.target().unwrap();

        body.set_position(first);
        wanderer.update(&mut coordinator);
        assert!(wanderer.target().is_none());
        assert_eq!(coordinator.state(), MotionState::Idle);
        assert_eq!(body.state().linear_velocity, Vector3::zeros());

        wanderer.update(&mut coordinator);
        assert!(wanderer.target().is_some());
        assert_ne!(wanderer.target(), Some(first));
    }

    #[test]
    fn test_stuck_npc_picks_new_target() {
        let (mut coordinator, body) = npc();
        let mut wanderer = wanderer();
        wanderer.start();
        wanderer.update(&mut coordinator);
        let first = wanderer.target();

        // A wall zeroed the velocity during the step.
        body.set_velocity(Vector3::zeros());
        wanderer.update(&mut coordinator);
        assert_ne!(wanderer.target(), first);
    }

    #[test]
    fn test_stop_halts_wandering() {
        let (mut coordinator, body) = npc();
        let mut wanderer = wanderer();
        wanderer.start();
        wanderer.update(&mut coordinator);
        wanderer.stop(&mut coordinator);

        assert!(!wanderer.is_active());
        assert_eq!(body.state().linear_velocity, Vector3::zeros());
        wanderer.update(&mut coordinator);
        assert_eq!(body.state().linear_velocity, Vector3::zeros());
    }
}
