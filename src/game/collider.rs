use nalgebra::{Point3, Vector3};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use super::assets::MeshHandle;
use super::constants::physics as consts;
use super::error::ConfigurationError;
use super::physics::{PhysicsBody, RapierBody, SharedPhysicsWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderKind {
    Capsule,
    Box,
    Sphere,
    Mesh,
    Cylinder,
}

impl fmt::Display for ColliderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColliderKind::Capsule => "capsule",
            ColliderKind::Box => "box",
            ColliderKind::Sphere => "sphere",
            ColliderKind::Mesh => "mesh",
            ColliderKind::Cylinder => "cylinder",
        };
        f.write_str(name)
    }
}

/// Geometric parameters. With `auto = true` everything is derived from the
/// owning mesh and the explicit fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderParams {
    #[serde(default = "default_auto")]
    pub auto: bool,
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub point_a: Option<[f32; 3]>,
    #[serde(default)]
    pub point_b: Option<[f32; 3]>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub depth: Option<f32>,
    /// Mesh used by a mesh collider instead of the owning mesh
    #[serde(skip)]
    pub mesh: Option<Rc<MeshHandle>>,
}

fn default_auto() -> bool {
    true
}

impl Default for ColliderParams {
    fn default() -> Self {
        Self {
            auto: true,
            radius: None,
            height: None,
            point_a: None,
            point_b: None,
            width: None,
            depth: None,
            mesh: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProps {
    /// Zero or less builds a fixed body
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub friction: Option<f32>,
    #[serde(default)]
    pub restitution: Option<f32>,
    /// Principal inertia override; zero components lock rotation on that axis
    #[serde(default)]
    pub inertia: Option<[f32; 3]>,
}

fn default_mass() -> f32 {
    1.0
}

impl Default for PhysicalProps {
    fn default() -> Self {
        Self {
            mass: default_mass(),
            friction: None,
            restitution: None,
            inertia: None,
        }
    }
}

/// Declarative collider description, immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderConfig {
    pub kind: ColliderKind,
    #[serde(default)]
    pub params: ColliderParams,
    #[serde(default)]
    pub props: PhysicalProps,
}

impl ColliderConfig {
    /// Explicit capsule between two end points.
    pub fn capsule(point_a: [f32; 3], point_b: [f32; 3], radius: f32, mass: f32) -> Self {
        Self {
            kind: ColliderKind::Capsule,
            params: ColliderParams {
                auto: false,
                point_a: Some(point_a),
                point_b: Some(point_b),
                radius: Some(radius),
                ..ColliderParams::default()
            },
            props: PhysicalProps {
                mass,
                ..PhysicalProps::default()
            },
        }
    }

    /// Shape inferred from the owning mesh's bounds.
    pub fn auto(kind: ColliderKind, mass: f32) -> Self {
        Self {
            kind,
            params: ColliderParams::default(),
            props: PhysicalProps {
                mass,
                ..PhysicalProps::default()
            },
        }
    }

    pub fn with_inertia(mut self, inertia: [f32; 3]) -> Self {
        self.props.inertia = Some(inertia);
        self
    }

    pub fn with_friction(mut self, friction: f32, restitution: f32) -> Self {
        self.props.friction = Some(friction);
        self.props.restitution = Some(restitution);
        self
    }
}

/// Validated collider geometry in mesh-local space.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Capsule { a: Point3<f32>, b: Point3<f32>, radius: f32 },
    Box { center: Point3<f32>, half_extents: Vector3<f32> },
    Sphere { center: Point3<f32>, radius: f32 },
    Cylinder { center: Point3<f32>, half_height: f32, radius: f32 },
    TriMesh { vertices: Vec<Point3<f32>>, triangles: Vec<[u32; 3]> },
}

/// Output of validation: everything needed to create the body.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderSpec {
    pub kind: ColliderKind,
    pub shape: ColliderShape,
    /// Effective mass. Zero means a fixed body.
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub inertia: Option<Vector3<f32>>,
}

impl ColliderSpec {
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }
}

pub struct ColliderFactory;

impl ColliderFactory {
    /// Checks a config against its owning mesh without touching the physics engine.
    pub fn validate(config: &ColliderConfig, mesh: &MeshHandle) -> Result<ColliderSpec, ConfigurationError> {
        let kind = config.kind;
        let props = &config.props;

        if props.mass < 0.0 {
            return Err(ConfigurationError::NonPositive {
                kind,
                field: "mass",
                value: props.mass,
            });
        }

        let shape = if config.params.auto {
            Self::shape_from_bounds(kind, mesh)?
        } else {
            Self::shape_from_params(kind, &config.params, mesh)?
        };

        // Mesh colliders are geometry-exact but immovable.
        let mass = if kind == ColliderKind::Mesh { 0.0 } else { props.mass };
        let inertia = match kind {
            ColliderKind::Mesh => None,
            _ => props.inertia.map(Vector3::from),
        };

        Ok(ColliderSpec {
            kind,
            shape,
            mass,
            friction: props.friction.unwrap_or(consts::DEFAULT_FRICTION).max(0.0),
            restitution: props.restitution.unwrap_or(consts::DEFAULT_RESTITUTION).max(0.0),
            inertia,
        })
    }

    /// Validates, then creates the body and collider inside `world`.
    pub fn build(
        world: &SharedPhysicsWorld,
        mesh: &MeshHandle,
        config: &ColliderConfig,
    ) -> Result<RapierBody, ConfigurationError> {
        let spec = Self::validate(config, mesh)?;
        let collider = Self::collider_for(&spec)?;

        let position = mesh.position;
        let body = if spec.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic().ccd_enabled(true)
        }
        .translation(vector![position.x, position.y, position.z])
        .build();

        let (body_handle, collider_handle, collider_id) = world.borrow_mut().insert_body(body, collider);
        let mut handle = RapierBody::new(Rc::clone(world), body_handle, collider_handle, collider_id);

        if let Some(inertia) = spec.inertia {
            if !spec.is_static() {
                handle.set_mass_properties(spec.mass, inertia);
            }
        }

        debug!(
            mesh = %mesh.name,
            kind = %spec.kind,
            mass = spec.mass,
            "collider built"
        );
        Ok(handle)
    }

    fn collider_for(spec: &ColliderSpec) -> Result<Collider, ConfigurationError> {
        let builder = match &spec.shape {
            ColliderShape::Capsule { a, b, radius } => ColliderBuilder::capsule_from_endpoints(*a, *b, *radius),
            ColliderShape::Box { center, half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).translation(center.coords)
            }
            ColliderShape::Sphere { center, radius } => ColliderBuilder::ball(*radius).translation(center.coords),
            ColliderShape::Cylinder {
                center,
                half_height,
                radius,
            } => ColliderBuilder::cylinder(*half_height, *radius).translation(center.coords),
            ColliderShape::TriMesh { vertices, triangles } => {
                let shape = SharedShape::trimesh(vertices.clone(), triangles.clone()).map_err(|e| {
                    ConfigurationError::InvalidMesh {
                        kind: spec.kind,
                        reason: format!("{e:?}"),
                    }
                })?;
                ColliderBuilder::new(shape)
            }
        };

        let builder = builder.friction(spec.friction).restitution(spec.restitution);
        // An inertia override supplies the whole mass distribution.
        let builder = if spec.inertia.is_some() || spec.is_static() {
            builder.density(0.0)
        } else {
            builder.mass(spec.mass)
        };
        Ok(builder.build())
    }

    fn shape_from_params(
        kind: ColliderKind,
        params: &ColliderParams,
        mesh: &MeshHandle,
    ) -> Result<ColliderShape, ConfigurationError> {
        match kind {
            ColliderKind::Capsule => {
                let a = required(kind, "point_a", params.point_a)?;
                let b = required(kind, "point_b", params.point_b)?;
                let radius = positive(kind, "radius", params.radius)?;
                Ok(ColliderShape::Capsule {
                    a: Point3::from(a),
                    b: Point3::from(b),
                    radius,
                })
            }
            ColliderKind::Box => {
                let width = positive(kind, "width", params.width)?;
                let height = positive(kind, "height", params.height)?;
                let depth = positive(kind, "depth", params.depth)?;
                Ok(ColliderShape::Box {
                    center: Point3::new(0.0, height / 2.0, 0.0),
                    half_extents: Vector3::new(width / 2.0, height / 2.0, depth / 2.0),
                })
            }
            ColliderKind::Sphere => {
                let radius = positive(kind, "radius", params.radius)?;
                Ok(ColliderShape::Sphere {
                    center: Point3::origin(),
                    radius,
                })
            }
            ColliderKind::Mesh => {
                let target = params.mesh.as_deref().unwrap_or(mesh);
                trimesh_of(kind, target)
            }
            ColliderKind::Cylinder => {
                let height = positive(kind, "height", params.height)?;
                let radius = positive(kind, "radius", params.radius)?;
                Ok(ColliderShape::Cylinder {
                    center: Point3::origin(),
                    half_height: height / 2.0,
                    radius,
                })
            }
        }
    }

    fn shape_from_bounds(kind: ColliderKind, mesh: &MeshHandle) -> Result<ColliderShape, ConfigurationError> {
        if kind == ColliderKind::Mesh {
            return trimesh_of(kind, mesh);
        }

        let bounds = mesh.bounds().ok_or_else(|| ConfigurationError::InvalidMesh {
            kind,
            reason: format!("mesh '{}' has no vertices", mesh.name),
        })?;
        let ext = bounds.extents();
        let center = bounds.center();
        let degenerate = |what: &str| ConfigurationError::InvalidMesh {
            kind,
            reason: format!("mesh '{}' has a degenerate {}", mesh.name, what),
        };

        match kind {
            ColliderKind::Capsule => {
                let radius = ext.x.min(ext.z) / 2.0;
                if radius <= 0.0 {
                    return Err(degenerate("footprint"));
                }
                let half_segment = (ext.y / 2.0 - radius).max(0.0);
                Ok(ColliderShape::Capsule {
                    a: center - Vector3::new(0.0, half_segment, 0.0),
                    b: center + Vector3::new(0.0, half_segment, 0.0),
                    radius,
                })
            }
            ColliderKind::Box => {
                if ext.x <= 0.0 || ext.y <= 0.0 || ext.z <= 0.0 {
                    return Err(degenerate("bounding box"));
                }
                Ok(ColliderShape::Box {
                    center,
                    half_extents: ext / 2.0,
                })
            }
            ColliderKind::Sphere => {
                let radius = ext.max() / 2.0;
                if radius <= 0.0 {
                    return Err(degenerate("bounding box"));
                }
                Ok(ColliderShape::Sphere { center, radius })
            }
            ColliderKind::Cylinder => {
                let radius = ext.x.max(ext.z) / 2.0;
                if radius <= 0.0 || ext.y <= 0.0 {
                    return Err(degenerate("bounding box"));
                }
                Ok(ColliderShape::Cylinder {
                    center,
                    half_height: ext.y / 2.0,
                    radius,
                })
            }
            ColliderKind::Mesh => unreachable!("mesh colliders return early"),
        }
    }
}

fn required<T>(kind: ColliderKind, field: &'static str, value: Option<T>) -> Result<T, ConfigurationError> {
    value.ok_or(ConfigurationError::MissingField { kind, field })
}

fn positive(kind: ColliderKind, field: &'static str, value: Option<f32>) -> Result<f32, ConfigurationError> {
    let value = required(kind, field, value)?;
    // NaN fails this check as well.
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::NonPositive { kind, field, value })
    }
}

fn trimesh_of(kind: ColliderKind, mesh: &MeshHandle) -> Result<ColliderShape, ConfigurationError> {
    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return Err(ConfigurationError::InvalidMesh {
            kind,
            reason: format!("mesh '{}' has no triangles", mesh.name),
        });
    }
    let count = mesh.vertices.len() as u32;
    if mesh.triangles.iter().flatten().any(|&i| i >= count) {
        return Err(ConfigurationError::InvalidMesh {
            kind,
            reason: format!("mesh '{}' indexes past its vertex buffer", mesh.name),
        });
    }
    Ok(ColliderShape::TriMesh {
        vertices: mesh.vertices.clone(),
        triangles: mesh.triangles.clone(),
    })
}
