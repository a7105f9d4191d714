//! Scene Source interface
//!
//! The exporter never reads authoring files itself. Everything it needs is
//! pulled through [`SceneSource`]: the skeleton, a pose evaluator driven by a
//! time cursor, armature and object transforms, and triangulated meshes.
//! [`SceneDocument`] is the JSON-backed implementation used by the CLI.

pub mod document;

pub use document::SceneDocument;

use glam::{Mat4, Vec3};
use hashbrown::{HashMap, HashSet};

use crate::config::VertexLayers;
use crate::error::{ExportError, Result};

/// Type of a named scene object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Armature,
    Mesh,
    /// Anything else, with the type name reported by the scene
    Other(String),
}

/// One bone of an armature in its bind pose
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBone {
    pub name: String,
    pub parent: Option<String>,
    /// Bind-pose local-to-armature matrix
    pub bind_matrix: Mat4,
}

/// Bones of an armature, in the scene's enumeration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<SceneBone>,
}

impl Skeleton {
    pub fn get(&self, name: &str) -> Option<&SceneBone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Bones ordered so every parent comes before its children
    ///
    /// Fails on a parent that is not part of the skeleton and on cycles.
    pub fn parent_first(&self) -> Result<Vec<&SceneBone>> {
        let mut ordered = Vec::with_capacity(self.bones.len());
        let mut done: HashSet<&str> = HashSet::with_capacity(self.bones.len());

        for bone in &self.bones {
            let mut chain = vec![bone];
            while let Some(&current) = chain.last() {
                if done.contains(current.name.as_str()) {
                    chain.pop();
                    continue;
                }
                match current.parent.as_deref() {
                    Some(parent) if !done.contains(parent) => {
                        if chain.iter().any(|b| b.name == parent) {
                            return Err(ExportError::BoneCycle(parent.to_string()));
                        }
                        let parent_bone =
                            self.get(parent).ok_or_else(|| ExportError::MissingParent {
                                bone: current.name.clone(),
                                parent: parent.to_string(),
                            })?;
                        chain.push(parent_bone);
                    }
                    _ => {
                        chain.pop();
                        done.insert(current.name.as_str());
                        ordered.push(current);
                    }
                }
            }
        }

        Ok(ordered)
    }
}

/// Bone name to local-to-armature matrix for the current time
pub type Pose = HashMap<String, Mat4>;

/// Weight of one vertex group on a vertex
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWeight {
    pub group: String,
    pub weight: f32,
}

/// One triangle corner with its vertex data
#[derive(Debug, Clone, PartialEq)]
pub struct MeshCorner {
    /// Object-space position
    pub position: Vec3,
    /// Object-space normal
    pub normal: Vec3,
    pub groups: Vec<GroupWeight>,
}

/// A mesh already split into triangles, three corners per triangle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangulatedMesh {
    pub name: String,
    pub corners: Vec<MeshCorner>,
    /// Per-corner RGB in `[0, 1]`, if the mesh has a color layer
    pub colors: Option<Vec<[f32; 3]>>,
    /// Per-corner parameter in `[0, 1]`, if the mesh has a parameter layer
    pub parameters: Option<Vec<f32>>,
}

impl TriangulatedMesh {
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }
}

/// Scene data consumed by the exporter
///
/// Implementations hold a single time cursor, so pose queries are not
/// reentrant: the cursor must be positioned with [`SceneSource::set_pose_time`]
/// before every [`SceneSource::evaluate_pose`].
pub trait SceneSource {
    fn object_kind(&self, name: &str) -> Option<ObjectKind>;

    /// Armature deforming a mesh object
    fn armature_of(&self, mesh: &str) -> Option<String>;

    /// Mesh objects deformed by an armature, in scene order
    fn meshes_using(&self, armature: &str) -> Vec<String>;

    fn skeleton(&self, armature: &str) -> Result<Skeleton>;

    /// Natural `(first, last)` frame range of an authored action
    fn action_frame_range(&self, action: &str) -> Option<(f32, f32)>;

    /// Make `action` drive the armature's pose
    fn set_active_action(&mut self, armature: &str, action: &str) -> Result<()>;

    /// Move the time cursor
    fn set_pose_time(&mut self, frame: i32, subframe: f32);

    /// Move the time cursor to the scene start and put armatures in rest pose
    fn set_rest_pose(&mut self);

    /// Local-to-armature matrix of every bone at the cursor
    fn evaluate_pose(&self, armature: &str) -> Result<Pose>;

    /// Armature-to-world matrix at the cursor
    fn armature_world_transform(&self, armature: &str) -> Result<Mat4>;

    /// Object-to-world matrix at the cursor
    fn object_world_transform(&self, object: &str) -> Result<Mat4>;

    fn triangulated_mesh(&self, object: &str, layers: &VertexLayers) -> Result<TriangulatedMesh>;
}
