//! Loader boundary: meshes, skeletons and clip lists handed to the core once a
//! character's assets are available.

use nalgebra::{Point3, Vector3};
use std::rc::Rc;

use super::constants::{animation as anim_consts, bones};
use super::error::LookupError;
use super::registry::SharedRegistry;

/// Geometry and placement of a loaded character or prop mesh.
#[derive(Debug, Clone)]
pub struct MeshHandle {
    pub name: String,
    /// Vertices in mesh-local space
    pub vertices: Vec<Point3<f32>>,
    pub triangles: Vec<[u32; 3]>,
    /// World-space position of the mesh origin
    pub position: Point3<f32>,
}

/// Local-space axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }
}

impl MeshHandle {
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for v in &self.vertices[1..] {
            min = min.inf(v);
            max = max.sup(v);
        }
        Some(Bounds { min, max })
    }

    /// Axis-aligned box mesh spanning `min..max` in local space.
    pub fn cuboid(name: &str, min: Point3<f32>, max: Point3<f32>, position: Point3<f32>) -> Self {
        let vertices = vec![
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ];
        let triangles = vec![
            [0, 2, 1], [0, 3, 2], // back
            [4, 5, 6], [4, 6, 7], // front
            [0, 4, 7], [0, 7, 3], // left
            [1, 2, 6], [1, 6, 5], // right
            [3, 7, 6], [3, 6, 2], // top
            [0, 1, 5], [0, 5, 4], // bottom
        ];
        Self {
            name: name.to_string(),
            vertices,
            triangles,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
}

/// Read-only bone hierarchy shared by every instance of a rig.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn bone(&self, name: &str) -> Result<&Bone, LookupError> {
        self.bones
            .iter()
            .find(|bone| bone.name == name)
            .ok_or_else(|| LookupError::Bone {
                name: name.to_string(),
                available: self
                    .bones
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Named clip as imported with the character.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipDescriptor {
    pub name: String,
    pub from_frame: f32,
    pub to_frame: f32,
}

impl ClipDescriptor {
    pub fn new(name: &str, from_frame: f32, to_frame: f32) -> Self {
        Self {
            name: name.to_string(),
            from_frame,
            to_frame,
        }
    }
}

/// Everything the motion core needs once a character has loaded.
#[derive(Debug, Clone)]
pub struct CharacterAssets {
    pub mesh: Rc<MeshHandle>,
    pub skeleton: Rc<Skeleton>,
    pub clips: Vec<ClipDescriptor>,
}

/// Source of character assets. Import formats live behind this trait.
pub trait CharacterLoader {
    fn load(&mut self, name: &str, position: Point3<f32>) -> Result<CharacterAssets, LookupError>;
}

/// Built-in loader producing a capsule-sized humanoid with the standard rig and
/// clip set. Skeletons are shared through the scene registry.
pub struct ProceduralLoader {
    skeletons: SharedRegistry<String, Skeleton>,
}

impl ProceduralLoader {
    pub fn new(skeletons: SharedRegistry<String, Skeleton>) -> Self {
        Self { skeletons }
    }

    fn humanoid_skeleton(name: &str) -> Skeleton {
        let names = [
            "mixamorig:Hips",
            bones::SPINE,
            "mixamorig:Spine1",
            "mixamorig:Neck",
            "mixamorig:Head",
            "mixamorig:LeftShoulder",
            "mixamorig:LeftArm",
            bones::LEFT_HAND,
            "mixamorig:RightShoulder",
            "mixamorig:RightArm",
            bones::RIGHT_HAND,
        ];
        let parents = [None, Some(0), Some(1), Some(2), Some(3), Some(2), Some(5), Some(6), Some(2), Some(8), Some(9)];
        Skeleton {
            name: name.to_string(),
            bones: names
                .iter()
                .zip(parents)
                .map(|(bone, parent)| Bone {
                    name: bone.to_string(),
                    parent,
                })
                .collect(),
        }
    }

    fn standard_clips(name: &str) -> Vec<ClipDescriptor> {
        if name == "npc" {
            return vec![
                ClipDescriptor::new(anim_consts::NPC_IDLE_CLIP, 0.0, 120.0),
                ClipDescriptor::new(anim_consts::WALK_CLIP, 0.0, 60.0),
            ];
        }
        vec![
            ClipDescriptor::new(anim_consts::IDLE_CLIP, 0.0, 120.0),
            ClipDescriptor::new(anim_consts::JUMP_CLIP, 0.0, 110.0),
            ClipDescriptor::new(anim_consts::WALK_CLIP, 0.0, 60.0),
            ClipDescriptor::new(anim_consts::BACKPEDAL_CLIP, 0.0, 60.0),
            ClipDescriptor::new(anim_consts::STRAFE_LEFT_CLIP, 0.0, 50.0),
            ClipDescriptor::new(anim_consts::STRAFE_RIGHT_CLIP, 0.0, 50.0),
            ClipDescriptor::new(anim_consts::ATTACK_CLIP, 0.0, 70.0),
        ]
    }
}

impl CharacterLoader for ProceduralLoader {
    fn load(&mut self, name: &str, position: Point3<f32>) -> Result<CharacterAssets, LookupError> {
        let (radius, height) = match name {
            "guy" => (0.35, 2.0),
            "npc" => (0.2, 1.75),
            other => return Err(LookupError::Asset(other.to_string())),
        };
        let mesh = MeshHandle::cuboid(
            name,
            Point3::new(-radius, 0.0, -radius),
            Point3::new(radius, height, radius),
            position,
        );
        let skeleton = self
            .skeletons
            .acquire(name.to_string(), || Self::humanoid_skeleton(name));
        Ok(CharacterAssets {
            mesh: Rc::new(mesh),
            skeleton,
            clips: Self::standard_clips(name),
        })
    }
}
