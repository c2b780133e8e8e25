pub mod animation;
pub mod assets;
pub mod attachment;
pub mod character;
pub mod collider;
pub mod constants;
pub mod contact_events;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod motion;
pub mod npc;
pub mod orientation;
pub mod physics;
pub mod registry;
pub mod tick_pipeline;

#[cfg(test)]
mod test_support;

use nalgebra::Point3;
use tracing::{info, warn};

use crate::config::GameConfig;
use assets::{CharacterLoader, ProceduralLoader, Skeleton};
use character::{spawn_character, Character, CharacterKind};
use constants::scene;
use error::SpawnError;
use input::{InputSnapshot, InputTranslator};
use physics::{PhysicsWorld, SharedPhysicsWorld};
use registry::SharedRegistry;
use tick_pipeline::FrameReport;

/// One running scene: a ground slab, the player and any NPCs.
///
/// The session is the only place the physics world is stepped. Everything is
/// single-threaded; `frame` is called once per render tick.
pub struct GameSession {
    config: GameConfig,
    world: SharedPhysicsWorld,
    skeletons: SharedRegistry<String, Skeleton>,
    loader: Box<dyn CharacterLoader>,
    translator: InputTranslator,
    player: Option<Character>,
    npcs: Vec<Character>,
    frame: u64,
    elapsed: f32,
    scene_switches: u32,
}

impl GameSession {
    /// Builds the scene with the built-in procedural loader and spawns the player.
    pub fn new(config: GameConfig) -> Result<Self, SpawnError> {
        let skeletons = SharedRegistry::new();
        let loader = Box::new(ProceduralLoader::new(skeletons.clone()));
        Self::with_loader(config, loader, skeletons)
    }

    pub fn with_loader(
        config: GameConfig,
        mut loader: Box<dyn CharacterLoader>,
        skeletons: SharedRegistry<String, Skeleton>,
    ) -> Result<Self, SpawnError> {
        let mut world = PhysicsWorld::new();
        world.set_gravity(config.physics.gravity);
        world.add_static_box(
            [0.0, -scene::GROUND_HALF_THICKNESS, 0.0],
            [scene::GROUND_HALF_EXTENT, scene::GROUND_HALF_THICKNESS, scene::GROUND_HALF_EXTENT],
        );
        let world = world.shared();

        let player = spawn_character(&world, loader.as_mut(), CharacterKind::Player, &config.player, &config)?;
        info!(id = %player.id(), "session started");

        Ok(Self {
            translator: InputTranslator::new(&config.motion),
            config,
            world,
            skeletons,
            loader,
            player: Some(player),
            npcs: Vec::new(),
            frame: 0,
            elapsed: 0.0,
            scene_switches: 0,
        })
    }

    /// Spawns `count` NPCs spaced along X from the profile's spawn point.
    /// Failed spawns are logged and skipped; returns how many were created.
    pub fn spawn_npcs(&mut self, count: usize) -> usize {
        let mut spawned = 0;
        for _ in 0..count {
            let mut profile = self.config.npc.clone();
            profile.spawn[0] += scene::NPC_SPACING * self.npcs.len() as f32;
            match spawn_character(&self.world, self.loader.as_mut(), CharacterKind::Npc, &profile, &self.config) {
                Ok(npc) => {
                    self.npcs.push(npc);
                    spawned += 1;
                }
                Err(e) => warn!(error = %e, "npc spawn failed"),
            }
        }
        spawned
    }

    /// Runs one frame of `dt` seconds against the given input.
    pub fn frame(&mut self, snapshot: &InputSnapshot, dt: f32) -> FrameReport {
        tick_pipeline::run_frame_phases(self, snapshot, dt)
    }

    pub fn player(&self) -> Option<&Character> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Character> {
        self.player.as_mut()
    }

    pub fn npcs(&self) -> &[Character] {
        &self.npcs
    }

    pub fn world(&self) -> &SharedPhysicsWorld {
        &self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn skeletons(&self) -> &SharedRegistry<String, Skeleton> {
        &self.skeletons
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn scene_switches(&self) -> u32 {
        self.scene_switches
    }

    /// Position of the player body, if it has one.
    pub fn player_position(&self) -> Option<Point3<f32>> {
        self.player.as_ref()?.coordinator().motion().position()
    }

    /// Disposes every character and releases their bodies.
    pub fn dispose(&mut self) {
        for character in self.player.iter_mut().chain(self.npcs.iter_mut()) {
            character.dispose();
        }
        self.npcs.clear();
        self.player = None;
        self.skeletons.prune();
        info!(frames = self.frame, "session disposed");
    }
}
