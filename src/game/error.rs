use thiserror::Error;

use super::collider::ColliderKind;

/// Invalid or missing collider parameters. Raised before any physics call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{kind} collider requires `{field}` when auto is false")]
    MissingField { kind: ColliderKind, field: &'static str },
    #[error("{kind} collider `{field}` must be positive (got {value})")]
    NonPositive {
        kind: ColliderKind,
        field: &'static str,
        value: f32,
    },
    #[error("{kind} collider cannot be derived from mesh: {reason}")]
    InvalidMesh { kind: ColliderKind, reason: String },
}

impl ConfigurationError {
    /// Name of the offending parameter.
    pub fn field(&self) -> &str {
        match self {
            ConfigurationError::MissingField { field, .. } => field,
            ConfigurationError::NonPositive { field, .. } => field,
            ConfigurationError::InvalidMesh { .. } => "mesh",
        }
    }
}

/// Bone, clip, skeleton or asset not found. Logged and swallowed per frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("bone '{name}' not found (available: {available})")]
    Bone { name: String, available: String },
    #[error("animation clip '{0}' not found")]
    Clip(String),
    #[error("skeleton '{0}' not found")]
    Skeleton(String),
    #[error("asset '{0}' not found")]
    Asset(String),
}

/// Character creation failure.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("collider setup failed: {0}")]
    Collider(#[from] ConfigurationError),
    #[error("asset lookup failed: {0}")]
    Lookup(#[from] LookupError),
}
