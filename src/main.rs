//! Wayfarer headless demo - drives a scripted player (and wandering NPCs)
//! across a ground plane and logs every motion transition.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

use wayfarer::config::GameConfig;
use wayfarer::game::input::{Action, InputSnapshot, KeyBindings};
use wayfarer::game::GameSession;
use wayfarer::logging;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Headless character motion demo", long_about = None)]
struct Cli {
    /// Game configuration (TOML). Defaults are used when omitted.
    #[arg(long, env = "WAYFARER_CONFIG")]
    config: Option<PathBuf>,
    /// Number of frames to simulate
    #[arg(long, default_value = "600")]
    frames: u64,
    /// NPCs to spawn next to the player
    #[arg(long, default_value = "0")]
    npcs: usize,
    /// Scripted player input
    #[arg(long, value_enum, default_value_t = Script::Forward)]
    script: Script,
    /// Print one JSON line per frame instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Script {
    /// Hold forward
    Forward,
    /// Stand still and jump every 1.5 s
    Jump,
    /// Hold forward while turning right
    Circle,
    /// No input
    Idle,
}

/// Frames between scripted jump presses
const JUMP_PERIOD: u64 = 90;

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match GameConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    logging::init_tracing(config.log_filter.as_deref());

    let dt = config.physics.timestep;
    let bindings = config.bindings.clone();
    let mut session = match GameSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "player spawn failed");
            std::process::exit(1);
        }
    };
    let spawned = session.spawn_npcs(cli.npcs);
    info!(npcs = spawned, frames = cli.frames, script = ?cli.script, "running");

    for frame in 0..cli.frames {
        let snapshot = scripted_input(cli.script, frame, &bindings);
        let report = session.frame(&snapshot, dt);
        if cli.json {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{}", line),
                Err(e) => error!(error = %e, "failed to serialize frame report"),
            }
        }
    }

    if let Some(player) = session.player() {
        let snapshot = player.snapshot();
        info!(
            state = ?snapshot.state,
            position = ?snapshot.position,
            clip = ?snapshot.clip,
            "final player state"
        );
    }
    session.dispose();
}

fn scripted_input(script: Script, frame: u64, bindings: &KeyBindings) -> InputSnapshot {
    let actions: &[Action] = match script {
        Script::Forward => &[Action::MoveForward],
        Script::Circle => &[Action::MoveForward, Action::RotateRight],
        Script::Jump if frame % JUMP_PERIOD == JUMP_PERIOD - 1 => &[Action::Jump],
        Script::Jump | Script::Idle => &[],
    };
    let keys: Vec<&str> = actions
        .iter()
        .filter_map(|action| bindings.keys_for(*action).first().copied())
        .collect();
    InputSnapshot::with_keys(&keys)
}
