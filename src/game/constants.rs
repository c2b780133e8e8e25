//! Default tuning constants for motion, animation and physics.
//! Every value here can be overridden through `GameConfig`.

/// Physics constants
pub mod physics {
    /// Gravity in m/s² (downwards)
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Friction used when a collider config omits it
    pub const DEFAULT_FRICTION: f32 = 0.5;

    /// Restitution used when a collider config omits it
    pub const DEFAULT_RESTITUTION: f32 = 0.0;

    /// Ground below a character within this gap counts as standing on it (m)
    pub const GROUND_CHECK_DISTANCE: f32 = 0.15;

    /// Height inside the collider bottom the ground ray starts from (m)
    pub const GROUND_RAY_LIFT: f32 = 0.05;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Headless scene layout
pub mod scene {
    /// Half width of the square ground slab (m)
    pub const GROUND_HALF_EXTENT: f32 = 100.0;

    /// Half thickness of the ground slab; its top face sits at y = 0
    pub const GROUND_HALF_THICKNESS: f32 = 0.5;

    /// X spacing between successive NPC spawn points (m)
    pub const NPC_SPACING: f32 = 5.0;
}

/// Character motion defaults
pub mod motion {
    /// Player locomotion speed (m/s)
    pub const DEFAULT_MOVE_SPEED: f32 = 5.0;

    /// Keyboard yaw applied per frame while a rotate key is held (radians)
    pub const DEFAULT_ROTATION_SPEED: f32 = 0.05;

    /// Vertical impulse applied on jump (N·s). About 6 m/s of lift on the 80 kg player capsule.
    pub const DEFAULT_JUMP_IMPULSE: f32 = 500.0;

    /// Forward vectors shorter than this (squared) count as "no intended motion"
    pub const MIN_FORWARD_LENGTH_SQ: f32 = 0.01;

    /// NPC walking speed (m/s)
    pub const NPC_SPEED: f32 = 2.0;

    /// Distance at which a move-to target counts as reached
    pub const MOVE_TO_REACHED_DISTANCE: f32 = 0.1;

    /// Horizontal speed below which a wandering NPC counts as stopped
    pub const NPC_STOPPED_SPEED_SQ: f32 = 0.01;

    /// Minimum distance of a random wander target
    pub const WANDER_MIN_DISTANCE: f32 = 5.0;

    /// Default maximum distance of a random wander target
    pub const WANDER_MAX_DISTANCE: f32 = 10.0;
}

/// Animation defaults
pub mod animation {
    /// Crossfade window between two clips (milliseconds)
    pub const DEFAULT_BLEND_DURATION_MS: u64 = 300;

    /// Frame rate clips are authored at
    pub const DEFAULT_FRAME_RATE: f32 = 60.0;

    /// Clip names used by the standard rig
    pub const IDLE_CLIP: &str = "IdleGreatSword";
    pub const JUMP_CLIP: &str = "Jump";
    pub const WALK_CLIP: &str = "Walk";
    pub const BACKPEDAL_CLIP: &str = "BackPedal";
    pub const STRAFE_LEFT_CLIP: &str = "StrafeLeft";
    pub const STRAFE_RIGHT_CLIP: &str = "StrafeRight";
    pub const ATTACK_CLIP: &str = "Slash";
    pub const NPC_IDLE_CLIP: &str = "Idle";

    /// Jump clip window that skips the crouch wind-up
    pub const JUMP_FROM_FRAME: f32 = 8.0;
    pub const JUMP_TO_FRAME: f32 = 95.0;
}

/// Skeleton bone names (mixamo rig namespace)
pub mod bones {
    pub const RIGHT_HAND: &str = "mixamorig:RightHand";
    pub const LEFT_HAND: &str = "mixamorig:LeftHand";
    pub const SPINE: &str = "mixamorig:Spine";
}
