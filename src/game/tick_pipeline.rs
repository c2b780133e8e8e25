use serde::Serialize;
use tracing::{debug, info};

use super::animation::AnimationEvent;
use super::character::CharacterSnapshot;
use super::input::{InputSnapshot, InputTranslator, MotionIntent, SceneCommand};
use super::GameSession;

/// What one frame did, for logs and the `--json` stream.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: f32,
    pub intent: MotionIntent,
    pub commands: Vec<SceneCommand>,
    pub player: Option<CharacterSnapshot>,
    pub npcs: Vec<CharacterSnapshot>,
    /// One-shot clips that finished this frame
    pub ended: Vec<String>,
}

/// Executes one frame in a fixed order:
/// input -> player calls -> scene commands -> NPC steering -> physics -> updates.
///
/// Every directional decision is made before the first physics or animation
/// call, so each body has its velocity written at most once per frame.
pub(super) fn run_frame_phases(session: &mut GameSession, snapshot: &InputSnapshot, dt: f32) -> FrameReport {
    // Resolve input into a single dominant intent.
    let mut intent = session.translator.resolve(snapshot, &session.config.bindings);

    // Drive the player.
    let commands = match session.player.as_mut() {
        Some(player) => {
            intent.speed = player.speed();
            InputTranslator::dispatch(&intent, player.coordinator_mut())
        }
        None => intent.commands.clone(),
    };

    // Scene commands.
    for command in &commands {
        match command {
            SceneCommand::ToggleSheathe => {
                if let Some(player) = session.player.as_mut() {
                    player.toggle_sheathe();
                }
            }
            SceneCommand::SwitchScene => {
                session.scene_switches += 1;
                info!(count = session.scene_switches, "scene switch requested");
            }
        }
    }

    // NPC steering sets velocities before the step.
    for npc in session.npcs.iter_mut() {
        npc.steer();
    }

    // Step physics; contact transitions are queued for each body.
    session.world.borrow_mut().step(dt);

    // Drain contacts, advance animation, resolve landing.
    let mut ended = Vec::new();
    for character in session.player.iter_mut().chain(session.npcs.iter_mut()) {
        for AnimationEvent::Ended(clip) in character.coordinator_mut().update(dt) {
            debug!(id = %character.id(), %clip, "clip ended");
            ended.push(clip);
        }
    }

    session.frame += 1;
    session.elapsed += dt;

    FrameReport {
        frame: session.frame,
        elapsed: session.elapsed,
        intent: intent.movement,
        commands,
        player: session.player.as_ref().map(|p| p.snapshot()),
        npcs: session.npcs.iter().map(|n| n.snapshot()).collect(),
        ended,
    }
}
