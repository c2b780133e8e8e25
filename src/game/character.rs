use nalgebra::Point3;
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::animation::AnimationBlendEngine;
use super::assets::{CharacterLoader, MeshHandle, Skeleton};
use super::attachment::{ItemAttachments, WeaponState};
use super::collider::{ColliderConfig, ColliderFactory, ColliderKind, PhysicalProps};
use super::coordinator::{CharacterMotionCoordinator, CoordinatorClips, MotionState};
use super::error::SpawnError;
use super::motion::MotionController;
use super::npc::Wanderer;
use super::physics::{PhysicsBody, SharedPhysicsWorld};
use crate::config::{AnimationConfig, CharacterProfile, ColliderFallback, GameConfig, WeaponProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterKind {
    Player,
    Npc,
}

/// A spawned character: its motion core plus the loaded assets it animates.
pub struct Character {
    id: Uuid,
    kind: CharacterKind,
    speed: f32,
    coordinator: CharacterMotionCoordinator,
    mesh: Rc<MeshHandle>,
    skeleton: Rc<Skeleton>,
    attachments: ItemAttachments,
    weapon: Option<WeaponProfile>,
    wanderer: Option<Wanderer>,
}

/// Serializable per-frame view of a character.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterSnapshot {
    pub id: Uuid,
    pub kind: CharacterKind,
    pub state: MotionState,
    pub position: Option<[f32; 3]>,
    pub velocity: Option<[f32; 3]>,
    pub forward: [f32; 3],
    pub airborne: bool,
    pub clip: Option<String>,
    pub weapon: Option<WeaponState>,
}

/// Loads a character and wires its collider, contacts, clips and weapon.
///
/// A rejected collider either aborts the spawn or, when the profile allows it,
/// falls back to a capsule inferred from the mesh. If even that fails the
/// character is spawned without a body and stands still.
pub fn spawn_character(
    world: &SharedPhysicsWorld,
    loader: &mut dyn CharacterLoader,
    kind: CharacterKind,
    profile: &CharacterProfile,
    config: &GameConfig,
) -> Result<Character, SpawnError> {
    let position = Point3::from(profile.spawn);
    let assets = loader.load(&profile.asset, position).inspect_err(|e| {
        error!(asset = %profile.asset, error = %e, "character assets unavailable");
    })?;

    let body = match ColliderFactory::build(world, &assets.mesh, &profile.collider) {
        Ok(body) => Some(body),
        Err(e) => match profile.fallback {
            ColliderFallback::Abort => {
                error!(asset = %profile.asset, field = e.field(), error = %e, "collider rejected, spawn aborted");
                return Err(e.into());
            }
            ColliderFallback::Auto => {
                warn!(asset = %profile.asset, field = e.field(), error = %e, "collider rejected, inferring capsule from mesh");
                let fallback = auto_capsule(&profile.collider);
                match ColliderFactory::build(world, &assets.mesh, &fallback) {
                    Ok(body) => Some(body),
                    Err(e) => {
                        error!(asset = %profile.asset, error = %e, "inferred collider rejected, character has no body");
                        None
                    }
                }
            }
        },
    };

    let mut body: Option<Box<dyn PhysicsBody>> = body.map(|b| Box::new(b) as Box<dyn PhysicsBody>);
    let contacts = body.as_mut().map(|b| b.subscribe_contacts());
    let motion = MotionController::new(body, &config.motion);

    let settings = AnimationConfig {
        idle_clip: profile.clips.idle.name.clone(),
        jump_clip: profile.clips.jump.name.clone(),
        ..config.animation.clone()
    };
    let clips = CoordinatorClips::new(&profile.clips, &settings);
    let mut animation = AnimationBlendEngine::new(settings);
    animation.initialize_from(&assets.clips);

    let coordinator = CharacterMotionCoordinator::new(motion, animation, contacts, clips);

    let mut attachments = ItemAttachments::new();
    if let Some(weapon) = &profile.weapon {
        if let Err(e) = attachments.attach(&weapon.item, &weapon.hand_bone, &assets.skeleton) {
            debug!(asset = %profile.asset, item = %weapon.item, error = %e, "weapon left unattached");
        }
    }

    let speed = config.speed_for(profile);
    let wanderer = match kind {
        CharacterKind::Npc => {
            let mut wanderer = Wanderer::new(&config.wander, speed);
            wanderer.start();
            Some(wanderer)
        }
        CharacterKind::Player => None,
    };

    let id = Uuid::new_v4();
    info!(%id, ?kind, asset = %profile.asset, x = position.x, y = position.y, z = position.z, "character spawned");

    Ok(Character {
        id,
        kind,
        speed,
        coordinator,
        mesh: assets.mesh,
        skeleton: assets.skeleton,
        attachments,
        weapon: profile.weapon.clone(),
        wanderer,
    })
}

fn auto_capsule(rejected: &ColliderConfig) -> ColliderConfig {
    let mut config = ColliderConfig::auto(ColliderKind::Capsule, rejected.props.mass.max(0.0));
    config.props = PhysicalProps {
        mass: config.props.mass,
        ..rejected.props.clone()
    };
    config
}

impl Character {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> CharacterKind {
        self.kind
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn coordinator(&self) -> &CharacterMotionCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut CharacterMotionCoordinator {
        &mut self.coordinator
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn attachments(&self) -> &ItemAttachments {
        &self.attachments
    }

    pub fn wanderer(&self) -> Option<&Wanderer> {
        self.wanderer.as_ref()
    }

    pub fn weapon_state(&self) -> Option<WeaponState> {
        self.weapon.as_ref().and_then(|w| self.attachments.weapon_state(w))
    }

    /// Moves the weapon between hand and sheath. No-op without a weapon.
    pub fn toggle_sheathe(&mut self) -> Option<WeaponState> {
        let weapon = self.weapon.as_ref()?;
        let state = self.attachments.toggle_sheathe(weapon, &self.skeleton);
        info!(id = %self.id, ?state, "weapon toggled");
        state
    }

    /// Runs autonomous steering, if any. Call before the physics step.
    pub fn steer(&mut self) {
        if let Some(wanderer) = self.wanderer.as_mut() {
            wanderer.update(&mut self.coordinator);
        }
    }

    pub fn stop_wandering(&mut self) {
        if let Some(wanderer) = self.wanderer.as_mut() {
            wanderer.stop(&mut self.coordinator);
        }
    }

    pub fn snapshot(&self) -> CharacterSnapshot {
        let motion = self.coordinator.motion();
        let forward = motion.forward();
        CharacterSnapshot {
            id: self.id,
            kind: self.kind,
            state: self.coordinator.state(),
            position: motion.position().map(|p| [p.x, p.y, p.z]),
            velocity: motion.velocity().map(|v| [v.x, v.y, v.z]),
            forward: [forward.x, forward.y, forward.z],
            airborne: motion.is_airborne(),
            clip: self.coordinator.animation().current().map(str::to_string),
            weapon: self.weapon_state(),
        }
    }

    pub fn dispose(&mut self) {
        self.stop_wandering();
        self.coordinator.dispose();
        info!(id = %self.id, "character disposed");
    }
}
