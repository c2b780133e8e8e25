//! Input resolution: held keys to one dominant intent per frame.
//!
//! Pure, testable mapping from raw key state to coordinator calls. Keyboard
//! layout lives entirely in `KeyBindings`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::coordinator::CharacterMotionCoordinator;
use crate::config::MotionConfig;

/// Bindable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveForward,
    BackPedal,
    StrafeLeft,
    StrafeRight,
    DiagonalLeft,
    DiagonalRight,
    RotateLeft,
    RotateRight,
    Jump,
    Attack,
    ToggleSheathe,
    SwitchScene,
}

/// Key name to action table. Key names are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, Action>", into = "HashMap<String, Action>")]
pub struct KeyBindings {
    keys: HashMap<String, Action>,
}

impl From<HashMap<String, Action>> for KeyBindings {
    fn from(keys: HashMap<String, Action>) -> Self {
        Self {
            keys: keys.into_iter().map(|(k, a)| (k.to_lowercase(), a)).collect(),
        }
    }
}

impl From<KeyBindings> for HashMap<String, Action> {
    fn from(bindings: KeyBindings) -> Self {
        bindings.keys
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::azerty()
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self { keys: HashMap::new() }
    }

    pub fn azerty() -> Self {
        let mut bindings = Self::empty();
        bindings
            .bind("z", Action::MoveForward)
            .bind("s", Action::BackPedal)
            .bind("a", Action::StrafeLeft)
            .bind("e", Action::StrafeRight)
            .bind("q", Action::RotateLeft)
            .bind("d", Action::RotateRight)
            .bind("space", Action::Jump)
            .bind("f", Action::Attack)
            .bind("x", Action::ToggleSheathe)
            .bind("tab", Action::SwitchScene);
        bindings
    }

    pub fn bind(&mut self, key: &str, action: Action) -> &mut Self {
        self.keys.insert(key.to_lowercase(), action);
        self
    }

    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.keys.get(&key.to_lowercase()).copied()
    }

    pub fn keys_for(&self, action: Action) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .keys
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Raw input state sampled once per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub held: HashSet<String>,
    /// Secondary pointer button held (free-look)
    pub free_look: bool,
    pub camera_yaw: f32,
}

impl InputSnapshot {
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            held: keys.iter().map(|k| k.to_lowercase()).collect(),
            ..Self::default()
        }
    }

    pub fn free_look(mut self, camera_yaw: f32) -> Self {
        self.free_look = true;
        self.camera_yaw = camera_yaw;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionIntent {
    Idle,
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    DiagonalLeft,
    DiagonalRight,
    Jump,
    RotateLeft,
    RotateRight,
}

/// Commands the scene handles itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneCommand {
    ToggleSheathe,
    SwitchScene,
}

/// Everything one frame of input asks for, fully resolved before any call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameIntent {
    /// `Idle` or exactly one directional intent
    pub movement: MotionIntent,
    /// `RotateLeft`, `RotateRight` or nothing
    pub rotation: Option<MotionIntent>,
    pub jump: bool,
    pub attack: bool,
    pub camera_yaw: Option<f32>,
    pub speed: f32,
    pub yaw: f32,
    pub commands: Vec<SceneCommand>,
}

impl FrameIntent {
    pub fn idle(speed: f32, yaw: f32) -> Self {
        Self {
            movement: MotionIntent::Idle,
            rotation: None,
            jump: false,
            attack: false,
            camera_yaw: None,
            speed,
            yaw,
            commands: Vec::new(),
        }
    }

    /// Motion intents in dispatch order.
    pub fn intents(&self) -> Vec<MotionIntent> {
        let mut intents: Vec<MotionIntent> = self.rotation.into_iter().collect();
        intents.push(self.movement);
        if self.jump {
            intents.push(MotionIntent::Jump);
        }
        intents
    }
}

/// Resolves snapshots into `FrameIntent`s. Remembers last frame's actions so
/// jump and one-shot commands fire on press, not while held.
pub struct InputTranslator {
    move_speed: f32,
    rotation_speed: f32,
    previous: HashSet<Action>,
}

impl InputTranslator {
    pub fn new(settings: &MotionConfig) -> Self {
        Self {
            move_speed: settings.move_speed,
            rotation_speed: settings.rotation_speed,
            previous: HashSet::new(),
        }
    }

    pub fn resolve(&mut self, snapshot: &InputSnapshot, bindings: &KeyBindings) -> FrameIntent {
        let held: HashSet<Action> = snapshot
            .held
            .iter()
            .filter_map(|key| bindings.action_for(key))
            .collect();
        let pressed = |action: Action| held.contains(&action) && !self.previous.contains(&action);

        let forward = held.contains(&Action::MoveForward);
        let left = held.contains(&Action::StrafeLeft);
        let right = held.contains(&Action::StrafeRight);
        let diagonal_left = held.contains(&Action::DiagonalLeft) || (forward && left && !right);
        let diagonal_right = held.contains(&Action::DiagonalRight) || (forward && right && !left);

        let movement = if diagonal_left {
            MotionIntent::DiagonalLeft
        } else if diagonal_right {
            MotionIntent::DiagonalRight
        } else if forward {
            MotionIntent::Forward
        } else if held.contains(&Action::BackPedal) {
            MotionIntent::Backward
        } else if left {
            MotionIntent::StrafeLeft
        } else if right {
            MotionIntent::StrafeRight
        } else {
            MotionIntent::Idle
        };

        let rotation = match (held.contains(&Action::RotateLeft), held.contains(&Action::RotateRight)) {
            (true, false) => Some(MotionIntent::RotateLeft),
            (false, true) => Some(MotionIntent::RotateRight),
            _ => None,
        };

        let mut commands = Vec::new();
        if pressed(Action::ToggleSheathe) {
            commands.push(SceneCommand::ToggleSheathe);
        }
        if pressed(Action::SwitchScene) {
            commands.push(SceneCommand::SwitchScene);
        }

        let intent = FrameIntent {
            movement,
            rotation,
            jump: pressed(Action::Jump),
            attack: pressed(Action::Attack),
            camera_yaw: snapshot.free_look.then_some(snapshot.camera_yaw),
            speed: self.move_speed,
            yaw: self.rotation_speed,
            commands,
        };
        self.previous = held;
        intent
    }

    /// Issues the frame's calls: facing first, then exactly one directional
    /// call (or `idle`), then jump and attack. Scene commands are returned.
    pub fn dispatch(intent: &FrameIntent, coordinator: &mut CharacterMotionCoordinator) -> Vec<SceneCommand> {
        if let Some(camera_yaw) = intent.camera_yaw {
            coordinator.sync_rotation_with_camera(camera_yaw);
        }
        match intent.rotation {
            Some(MotionIntent::RotateLeft) => coordinator.rotate_left(intent.yaw),
            Some(MotionIntent::RotateRight) => coordinator.rotate_right(intent.yaw),
            _ => {}
        }

        let speed = intent.speed;
        match intent.movement {
            MotionIntent::Forward => coordinator.move_forward(speed),
            MotionIntent::Backward => coordinator.back_pedal(speed),
            MotionIntent::StrafeLeft => coordinator.strafe_left(speed),
            MotionIntent::StrafeRight => coordinator.strafe_right(speed),
            MotionIntent::DiagonalLeft => coordinator.move_diagonally_left(speed),
            MotionIntent::DiagonalRight => coordinator.move_diagonally_right(speed),
            MotionIntent::Idle | MotionIntent::Jump | MotionIntent::RotateLeft | MotionIntent::RotateRight => {
                coordinator.idle()
            }
        }

        if intent.jump {
            coordinator.jump();
        }
        if intent.attack {
            coordinator.attack(None);
        }
        intent.commands.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimationConfig;
    use crate::game::animation::{AnimationBlendEngine, AnimationClip};
    use crate::game::coordinator::{CoordinatorClips, MotionState};
    use crate::game::motion::MotionController;
    use crate::game::test_support::RecordingBody;

    fn translator() -> InputTranslator {
        InputTranslator::new(&MotionConfig::default())
    }

    fn resolve(translator: &mut InputTranslator, keys: &[&str]) -> FrameIntent {
        translator.resolve(&InputSnapshot::with_keys(keys), &KeyBindings::azerty())
    }

    #[test]
    fn test_forward_and_strafe_become_diagonal() {
        let mut t = translator();
        assert_eq!(resolve(&mut t, &["z", "a"]).movement, MotionIntent::DiagonalLeft);
        assert_eq!(resolve(&mut t, &["z", "e"]).movement, MotionIntent::DiagonalRight);
        // Opposite strafes cancel the diagonal.
        assert_eq!(resolve(&mut t, &["z", "a", "e"]).movement, MotionIntent::Forward);
    }

    #[test]
    fn test_priority_order() {
        let mut t = translator();
        assert_eq!(resolve(&mut t, &["z", "s"]).movement, MotionIntent::Forward);
        assert_eq!(resolve(&mut t, &["s", "a"]).movement, MotionIntent::Backward);
        assert_eq!(resolve(&mut t, &["a", "e"]).movement, MotionIntent::StrafeLeft);
        assert_eq!(resolve(&mut t, &["e"]).movement, MotionIntent::StrafeRight);
        assert_eq!(resolve(&mut t, &[]).movement, MotionIntent::Idle);
        assert_eq!(resolve(&mut t, &["k"]).movement, MotionIntent::Idle);
    }

    #[test]
    fn test_rotation_is_independent_and_exclusive() {
        let mut t = translator();
        let intent = resolve(&mut t, &["z", "q"]);
        assert_eq!(intent.movement, MotionIntent::Forward);
        assert_eq!(intent.rotation, Some(MotionIntent::RotateLeft));
        assert_eq!(resolve(&mut t, &["q", "d"]).rotation, None);
        assert_eq!(
            resolve(&mut t, &["d"]).intents(),
            vec![MotionIntent::RotateRight, MotionIntent::Idle]
        );
    }

    #[test]
    fn test_jump_and_commands_are_edge_triggered() {
        let mut t = translator();
        let first = resolve(&mut t, &["space", "x", "f"]);
        assert!(first.jump);
        assert!(first.attack);
        assert_eq!(first.commands, vec![SceneCommand::ToggleSheathe]);

        let held = resolve(&mut t, &["space", "x", "f"]);
        assert!(!held.jump);
        assert!(!held.attack);
        assert!(held.commands.is_empty());

        resolve(&mut t, &[]);
        assert!(resolve(&mut t, &["SPACE"]).jump);
    }

    #[test]
    fn test_free_look_carries_camera_yaw() {
        let mut t = translator();
        let snapshot = InputSnapshot::with_keys(&["z"]).free_look(1.25);
        let intent = t.resolve(&snapshot, &KeyBindings::azerty());
        assert_eq!(intent.camera_yaw, Some(1.25));
        assert_eq!(resolve(&mut t, &["z"]).camera_yaw, None);
    }

    #[test]
    fn test_bindings_from_toml_are_case_insensitive() {
        let bindings: KeyBindings = toml::from_str("W = \"move_forward\"\nspace = \"jump\"").unwrap();
        assert_eq!(bindings.action_for("w"), Some(Action::MoveForward));
        assert_eq!(bindings.keys_for(Action::Jump), vec!["space"]);
        assert_eq!(bindings.action_for("z"), None);
    }

    #[test]
    fn test_dispatch_sets_velocity_once_per_frame() {
        let body = RecordingBody::new(80.0);
        let motion = MotionController::new(Some(body.boxed()), &MotionConfig::default());
        let mut animation = AnimationBlendEngine::new(AnimationConfig::default());
        animation.initialize(vec![
            AnimationClip::new("IdleGreatSword", 0.0, 120.0, 60.0),
            AnimationClip::new("Walk", 0.0, 60.0, 60.0),
        ]);
        let mut coordinator = CharacterMotionCoordinator::new(motion, animation, None, CoordinatorClips::default());

        let mut t = translator();
        let writes = body.state().velocity_writes;
        let intent = resolve(&mut t, &["z", "e"]);
        let commands = InputTranslator::dispatch(&intent, &mut coordinator);

        assert!(commands.is_empty());
        assert_eq!(body.state().velocity_writes, writes + 1);
        assert_eq!(coordinator.state(), MotionState::Locomoting);

        let intent = resolve(&mut t, &[]);
        InputTranslator::dispatch(&intent, &mut coordinator);
        assert_eq!(coordinator.state(), MotionState::Idle);
        assert_eq!(body.state().linear_velocity.x, 0.0);
        assert_eq!(body.state().linear_velocity.z, 0.0);
    }
}
