//! Game configuration parsing from TOML files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::animation::PlayOptions;
use crate::game::collider::{ColliderConfig, ColliderParams, ColliderKind, PhysicalProps};
use crate::game::constants::{animation as anim, bones, motion, physics};
use crate::game::input::KeyBindings;

/// Locomotion tuning shared by every character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Player locomotion speed (m/s)
    pub move_speed: f32,
    /// Keyboard yaw per frame while a rotate key is held (radians)
    pub rotation_speed: f32,
    pub jump_impulse: f32,
    pub initial_forward: [f32; 3],
    /// Face the movement direction while moving diagonally
    pub diagonal_facing: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_speed: motion::DEFAULT_MOVE_SPEED,
            rotation_speed: motion::DEFAULT_ROTATION_SPEED,
            jump_impulse: motion::DEFAULT_JUMP_IMPULSE,
            initial_forward: [0.0, 0.0, 1.0],
            diagonal_facing: false,
        }
    }
}

/// Clip playback and crossfade tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub blend_duration_ms: u64,
    pub frame_rate: f32,
    pub idle_clip: String,
    pub jump_clip: String,
    /// Frame window of the jump clip actually played
    pub jump_frames: [f32; 2],
    /// Clips that never loop and report an end
    pub one_shot_clips: Vec<String>,
    /// One-shots that cut the current clip instead of crossfading
    pub preempting_clips: Vec<String>,
}

impl AnimationConfig {
    pub fn blend_duration_secs(&self) -> f32 {
        self.blend_duration_ms as f32 / 1000.0
    }

    pub fn is_one_shot(&self, clip: &str) -> bool {
        self.one_shot_clips.iter().any(|c| c == clip)
    }

    pub fn preempts(&self, clip: &str) -> bool {
        self.preempting_clips.iter().any(|c| c == clip)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            blend_duration_ms: anim::DEFAULT_BLEND_DURATION_MS,
            frame_rate: anim::DEFAULT_FRAME_RATE,
            idle_clip: anim::IDLE_CLIP.to_string(),
            jump_clip: anim::JUMP_CLIP.to_string(),
            jump_frames: [anim::JUMP_FROM_FRAME, anim::JUMP_TO_FRAME],
            one_shot_clips: vec![anim::JUMP_CLIP.to_string(), anim::ATTACK_CLIP.to_string()],
            preempting_clips: vec![anim::ATTACK_CLIP.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude (m/s², pointing down)
    pub gravity: f32,
    /// Fixed physics step (seconds)
    pub timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: physics::DEFAULT_GRAVITY,
            timestep: physics::TIMESTEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_distance: motion::WANDER_MIN_DISTANCE,
            max_distance: motion::WANDER_MAX_DISTANCE,
        }
    }
}

/// What to do when a character's configured collider is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderFallback {
    /// Character creation fails
    Abort,
    /// Retry with a capsule inferred from the mesh
    Auto,
}

/// Clip played for one action, with optional playback overrides.
///
/// Either a bare name (`walk = "Walk"`) or a table
/// (`walk = { name = "Walk", speed = 1.5 }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClipBindingRepr")]
pub struct ClipBinding {
    pub name: String,
    /// Overrides whether the action loops its clip
    pub looped: Option<bool>,
    pub speed: f32,
    pub from_frame: Option<f32>,
    pub to_frame: Option<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClipBindingRepr {
    Name(String),
    Table {
        name: String,
        #[serde(default)]
        looped: Option<bool>,
        #[serde(default = "default_clip_speed")]
        speed: f32,
        #[serde(default)]
        from_frame: Option<f32>,
        #[serde(default)]
        to_frame: Option<f32>,
    },
}

fn default_clip_speed() -> f32 {
    1.0
}

impl From<ClipBindingRepr> for ClipBinding {
    fn from(repr: ClipBindingRepr) -> Self {
        match repr {
            ClipBindingRepr::Name(name) => Self::named(&name),
            ClipBindingRepr::Table {
                name,
                looped,
                speed,
                from_frame,
                to_frame,
            } => Self {
                name,
                looped,
                speed,
                from_frame,
                to_frame,
            },
        }
    }
}

impl ClipBinding {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            looped: None,
            speed: default_clip_speed(),
            from_frame: None,
            to_frame: None,
        }
    }

    /// Play request for this clip. `looped` is the action's own default.
    pub fn options(&self, looped: bool) -> PlayOptions {
        PlayOptions {
            speed: self.speed,
            from_frame: self.from_frame,
            to_frame: self.to_frame,
            looped: self.looped.unwrap_or(looped),
        }
    }
}

/// Clip bound to each character action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipBindings {
    pub idle: ClipBinding,
    pub walk: ClipBinding,
    pub back_pedal: ClipBinding,
    pub strafe_left: ClipBinding,
    pub strafe_right: ClipBinding,
    /// Frames default to `[animation].jump_frames`
    pub jump: ClipBinding,
    pub attack: ClipBinding,
}

impl Default for ClipBindings {
    fn default() -> Self {
        Self {
            idle: ClipBinding::named(anim::IDLE_CLIP),
            walk: ClipBinding::named(anim::WALK_CLIP),
            back_pedal: ClipBinding::named(anim::BACKPEDAL_CLIP),
            strafe_left: ClipBinding::named(anim::STRAFE_LEFT_CLIP),
            strafe_right: ClipBinding::named(anim::STRAFE_RIGHT_CLIP),
            jump: ClipBinding::named(anim::JUMP_CLIP),
            attack: ClipBinding::named(anim::ATTACK_CLIP),
        }
    }
}

/// Weapon carried by a character and the bones it moves between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub item: String,
    #[serde(default = "default_hand_bone")]
    pub hand_bone: String,
    #[serde(default = "default_sheath_bone")]
    pub sheath_bone: String,
}

fn default_hand_bone() -> String {
    bones::RIGHT_HAND.to_string()
}

fn default_sheath_bone() -> String {
    bones::SPINE.to_string()
}

/// Per-archetype character setup (`[player]`, `[npc]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Asset name handed to the loader
    pub asset: String,
    pub collider: ColliderConfig,
    #[serde(default = "default_fallback")]
    pub fallback: ColliderFallback,
    /// Overrides `[motion].move_speed` for this archetype
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub clips: ClipBindings,
    #[serde(default)]
    pub weapon: Option<WeaponProfile>,
    #[serde(default)]
    pub spawn: [f32; 3],
}

fn default_fallback() -> ColliderFallback {
    ColliderFallback::Auto
}

impl CharacterProfile {
    pub fn default_player() -> Self {
        Self {
            asset: "guy".to_string(),
            collider: ColliderConfig {
                kind: ColliderKind::Capsule,
                params: ColliderParams {
                    auto: false,
                    point_a: Some([0.0, 0.35, 0.0]),
                    point_b: Some([0.0, 1.65, 0.0]),
                    radius: Some(0.35),
                    ..ColliderParams::default()
                },
                props: PhysicalProps {
                    mass: 80.0,
                    friction: Some(0.0),
                    restitution: Some(0.0),
                    inertia: Some([0.0, 1.0, 0.0]),
                },
            },
            fallback: ColliderFallback::Abort,
            speed: None,
            clips: ClipBindings::default(),
            weapon: Some(WeaponProfile {
                item: "sword".to_string(),
                hand_bone: default_hand_bone(),
                sheath_bone: default_sheath_bone(),
            }),
            spawn: [13.0, 2.0, 0.0],
        }
    }

    pub fn default_npc() -> Self {
        Self {
            asset: "npc".to_string(),
            collider: ColliderConfig {
                kind: ColliderKind::Capsule,
                params: ColliderParams {
                    auto: false,
                    point_a: Some([0.0, 0.2, 0.0]),
                    point_b: Some([0.0, 1.75, 0.0]),
                    radius: Some(0.2),
                    ..ColliderParams::default()
                },
                props: PhysicalProps {
                    mass: 75.0,
                    friction: Some(1.0),
                    restitution: Some(0.0),
                    inertia: Some([0.0, 1.0, 0.0]),
                },
            },
            fallback: ColliderFallback::Auto,
            speed: Some(motion::NPC_SPEED),
            clips: ClipBindings {
                idle: ClipBinding::named(anim::NPC_IDLE_CLIP),
                ..ClipBindings::default()
            },
            weapon: None,
            spawn: [5.0, 2.0, 5.0],
        }
    }
}

fn default_player() -> CharacterProfile {
    CharacterProfile::default_player()
}

fn default_npc() -> CharacterProfile {
    CharacterProfile::default_npc()
}

/// Game configuration from a TOML file. Every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub wander: WanderConfig,
    #[serde(default = "default_player")]
    pub player: CharacterProfile,
    #[serde(default = "default_npc")]
    pub npc: CharacterProfile,
    #[serde(default)]
    pub bindings: KeyBindings,
    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            animation: AnimationConfig::default(),
            physics: PhysicsConfig::default(),
            wander: WanderConfig::default(),
            player: default_player(),
            npc: default_npc(),
            bindings: KeyBindings::default(),
            log_filter: None,
        }
    }
}

impl GameConfig {
    /// Load game configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        Self::from_toml(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Speed used by the given profile
    pub fn speed_for(&self, profile: &CharacterProfile) -> f32 {
        profile.speed.unwrap_or(self.motion.move_speed)
    }
}

/// Errors that can occur when loading game configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse {path}: {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),
}
