//! JSON scene document
//!
//! A self-contained stand-in for an authoring tool's scene: objects with
//! static transforms and optional keyframed motion, armatures with bind-pose
//! bones, keyframed actions, and meshes that are already triangulated.
//!
//! ```json
//! {
//!   "frame_start": 1,
//!   "objects": [
//!     { "name": "Rig", "type": "armature", "action": "Walk",
//!       "bones": [ { "name": "Root", "bind": { "translation": [0, 0, 0] } },
//!                  { "name": "Spine", "parent": "Root", "bind": { "translation": [0, 1, 0] } } ],
//!       "motion": [ { "frame": 1, "translation": [0, 0, 0] }, { "frame": 20, "translation": [0, 0, 4] } ] },
//!     { "name": "Body", "type": "mesh", "armature": "Rig",
//!       "mesh": { "vertices": [ { "position": [0, 0, 0], "normal": [0, 0, 1], "groups": { "Root": 1.0 } } ],
//!                 "triangles": [ [0, 0, 0] ],
//!                 "color_layers": { "Col": [ [1, 0, 0], [1, 0, 0], [1, 0, 0] ] } } }
//!   ],
//!   "actions": [
//!     { "name": "Walk", "frame_range": [1, 20],
//!       "tracks": { "Spine": [ { "frame": 1, "rotation": [0, 0, 0, 1] } ] } }
//!   ]
//! }
//! ```
//!
//! Bind transforms are in armature space. Track keyframes are the bone's
//! basis relative to its rest pose; translation and scale interpolate
//! linearly, rotation with slerp, and values hold past the first and last key.

use anyhow::Context;
use glam::{Mat4, Quat, Vec3};
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{
    GroupWeight, MeshCorner, ObjectKind, Pose, SceneBone, SceneSource, Skeleton, TriangulatedMesh,
};
use crate::config::VertexLayers;
use crate::error::{ExportError, Result};

const ARMATURE: &str = "armature";
const MESH: &str = "mesh";

/// Translation, rotation (quaternion x, y, z, w) and scale
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TransformDef {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl TransformDef {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation).normalize(),
            Vec3::from(self.translation),
        )
    }
}

/// A keyframe; channels left out are not keyed at this frame
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Keyframe {
    pub frame: f32,
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneDef {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Bind pose in armature space
    #[serde(default)]
    pub bind: TransformDef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VertexDef {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Vertex group name to weight
    #[serde(default)]
    pub groups: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshDef {
    pub vertices: Vec<VertexDef>,
    #[serde(default)]
    pub triangles: Vec<[u32; 3]>,
    /// Layer name to per-corner RGB (three entries per triangle)
    #[serde(default)]
    pub color_layers: BTreeMap<String, Vec<[f32; 3]>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub transform: TransformDef,
    /// Keyframed object-to-world motion; unkeyed channels use `transform`
    #[serde(default)]
    pub motion: Vec<Keyframe>,
    #[serde(default)]
    pub bones: Vec<BoneDef>,
    /// Action active when the document is loaded (armatures)
    #[serde(default)]
    pub action: Option<String>,
    /// Deforming armature (meshes)
    #[serde(default)]
    pub armature: Option<String>,
    #[serde(default)]
    pub mesh: Option<MeshDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDef {
    pub name: String,
    /// Natural frame range; derived from the keyframes when left out
    #[serde(default)]
    pub frame_range: Option<[f32; 2]>,
    /// Bone name to keyframes
    #[serde(default)]
    pub tracks: BTreeMap<String, Vec<Keyframe>>,
}

impl ActionDef {
    pub fn frame_range(&self) -> (f32, f32) {
        if let Some([first, last]) = self.frame_range {
            return (first, last);
        }
        let frames = self.tracks.values().flatten().map(|k| k.frame);
        let first = frames.clone().reduce(f32::min);
        let last = frames.reduce(f32::max);
        (first.unwrap_or(0.0), last.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Default)]
struct Cursor {
    frame: f32,
    rest: bool,
    /// Armature name to active action name
    active: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    #[serde(default)]
    frame_start: i32,
    objects: Vec<ObjectDef>,
    #[serde(default)]
    actions: Vec<ActionDef>,
    #[serde(skip)]
    cursor: Cursor,
}

impl SceneDocument {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Failed to load scene: {:?}", path))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let mut document: Self = serde_json::from_str(content)?;
        document.prepare()?;
        Ok(document)
    }

    pub fn frame_start(&self) -> i32 {
        self.frame_start
    }

    pub fn objects(&self) -> &[ObjectDef] {
        &self.objects
    }

    pub fn actions(&self) -> &[ActionDef] {
        &self.actions
    }

    /// Validate references, sort keyframes and reset the cursor
    fn prepare(&mut self) -> Result<()> {
        self.validate()?;

        for object in &mut self.objects {
            sort_keys(&mut object.motion);
        }
        for action in &mut self.actions {
            action.tracks.values_mut().for_each(|keys| sort_keys(keys));
        }

        self.cursor = Cursor {
            frame: self.frame_start as f32,
            rest: false,
            active: self
                .objects
                .iter()
                .filter_map(|o| Some((o.name.clone(), o.action.clone()?)))
                .collect(),
        };
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut object_names = HashSet::new();
        for object in &self.objects {
            if !object_names.insert(object.name.as_str()) {
                return Err(invalid(format!("duplicate object '{}'", object.name)));
            }
        }

        let mut action_names = HashSet::new();
        for action in &self.actions {
            if !action_names.insert(action.name.as_str()) {
                return Err(invalid(format!("duplicate action '{}'", action.name)));
            }
            for (bone, keys) in &action.tracks {
                check_keys(keys, &format!("action '{}' bone '{}'", action.name, bone))?;
            }
        }

        for object in &self.objects {
            check_transform(&object.transform, &format!("object '{}'", object.name))?;
            check_keys(&object.motion, &format!("object '{}' motion", object.name))?;

            let mut bone_names = HashSet::new();
            for bone in &object.bones {
                if !bone_names.insert(bone.name.as_str()) {
                    return Err(invalid(format!(
                        "duplicate bone '{}' in '{}'",
                        bone.name, object.name
                    )));
                }
                check_transform(&bone.bind, &format!("bone '{}'", bone.name))?;
            }

            if let Some(action) = object
                .action
                .as_ref()
                .filter(|a| !action_names.contains(a.as_str()))
            {
                return Err(ExportError::ActionNotFound(action.clone()));
            }

            if let Some(armature) = &object.armature {
                let bound = self
                    .objects
                    .iter()
                    .any(|o| &o.name == armature && o.kind == ARMATURE);
                if !bound {
                    return Err(invalid(format!(
                        "object '{}' references missing armature '{}'",
                        object.name, armature
                    )));
                }
            }

            if let Some(mesh) = &object.mesh {
                check_mesh(mesh, &object.name)?;
            }
        }
        Ok(())
    }

    fn object(&self, name: &str) -> Result<&ObjectDef> {
        self.objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| ExportError::ObjectNotFound(name.to_string()))
    }

    fn object_of_kind(&self, name: &str, kind: &str) -> Result<&ObjectDef> {
        let object = self.object(name)?;
        if object.kind != kind {
            return Err(ExportError::UnsupportedObject {
                name: name.to_string(),
                kind: object.kind.clone(),
            });
        }
        Ok(object)
    }

    fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Object-to-world matrix of `object` at the cursor
    fn world_matrix(&self, object: &ObjectDef) -> Mat4 {
        if object.motion.is_empty() {
            object.transform.matrix()
        } else {
            sample_keys(&object.motion, self.cursor.frame, &object.transform).matrix()
        }
    }
}

impl SceneSource for SceneDocument {
    fn object_kind(&self, name: &str) -> Option<ObjectKind> {
        let object = self.objects.iter().find(|o| o.name == name)?;
        Some(match object.kind.as_str() {
            ARMATURE => ObjectKind::Armature,
            MESH => ObjectKind::Mesh,
            other => ObjectKind::Other(other.to_string()),
        })
    }

    fn armature_of(&self, mesh: &str) -> Option<String> {
        self.objects
            .iter()
            .find(|o| o.name == mesh && o.kind == MESH)
            .and_then(|o| o.armature.clone())
    }

    fn meshes_using(&self, armature: &str) -> Vec<String> {
        self.objects
            .iter()
            .filter(|o| o.kind == MESH && o.armature.as_deref() == Some(armature))
            .map(|o| o.name.clone())
            .collect()
    }

    fn skeleton(&self, armature: &str) -> Result<Skeleton> {
        let object = self.object_of_kind(armature, ARMATURE)?;
        Ok(Skeleton {
            bones: object
                .bones
                .iter()
                .map(|b| SceneBone {
                    name: b.name.clone(),
                    parent: b.parent.clone(),
                    bind_matrix: b.bind.matrix(),
                })
                .collect(),
        })
    }

    fn action_frame_range(&self, action: &str) -> Option<(f32, f32)> {
        self.action(action).map(ActionDef::frame_range)
    }

    fn set_active_action(&mut self, armature: &str, action: &str) -> Result<()> {
        self.object_of_kind(armature, ARMATURE)?;
        if self.action(action).is_none() {
            return Err(ExportError::ActionNotFound(action.to_string()));
        }
        self.cursor
            .active
            .insert(armature.to_string(), action.to_string());
        Ok(())
    }

    fn set_pose_time(&mut self, frame: i32, subframe: f32) {
        self.cursor.frame = frame as f32 + subframe;
        self.cursor.rest = false;
    }

    fn set_rest_pose(&mut self) {
        self.cursor.frame = self.frame_start as f32;
        self.cursor.rest = true;
    }

    fn evaluate_pose(&self, armature: &str) -> Result<Pose> {
        let skeleton = self.skeleton(armature)?;
        let action = if self.cursor.rest {
            None
        } else {
            self.cursor
                .active
                .get(armature)
                .and_then(|name| self.action(name))
        };

        let mut pose = Pose::with_capacity(skeleton.bones.len());
        for bone in skeleton.parent_first()? {
            let basis = action
                .and_then(|a| a.tracks.get(&bone.name))
                .map(|keys| sample_keys(keys, self.cursor.frame, &TransformDef::default()).matrix())
                .unwrap_or(Mat4::IDENTITY);

            let matrix = match bone.parent.as_deref() {
                Some(parent) => {
                    let parent_pose = pose
                        .get(parent)
                        .copied()
                        .ok_or_else(|| ExportError::MissingPoseBone(parent.to_string()))?;
                    let parent_bind = skeleton
                        .get(parent)
                        .map(|b| b.bind_matrix)
                        .ok_or_else(|| ExportError::BoneNotFound(parent.to_string()))?;
                    parent_pose * parent_bind.inverse() * bone.bind_matrix * basis
                }
                None => bone.bind_matrix * basis,
            };
            pose.insert(bone.name.clone(), matrix);
        }

        Ok(pose)
    }

    fn armature_world_transform(&self, armature: &str) -> Result<Mat4> {
        let object = self.object_of_kind(armature, ARMATURE)?;
        Ok(self.world_matrix(object))
    }

    fn object_world_transform(&self, object: &str) -> Result<Mat4> {
        let object = self.object(object)?;
        Ok(self.world_matrix(object))
    }

    fn triangulated_mesh(&self, object: &str, layers: &VertexLayers) -> Result<TriangulatedMesh> {
        let def = self.object_of_kind(object, MESH)?;
        let mesh = def
            .mesh
            .as_ref()
            .ok_or_else(|| invalid(format!("mesh object '{}' has no mesh data", object)))?;

        let corners = mesh
            .triangles
            .iter()
            .flatten()
            .map(|&index| -> Result<MeshCorner> {
                let vertex = mesh.vertices.get(index as usize).ok_or_else(|| {
                    invalid(format!(
                        "mesh '{}' references vertex {} but has {} vertices",
                        object,
                        index,
                        mesh.vertices.len()
                    ))
                })?;
                Ok(MeshCorner {
                    position: Vec3::from(vertex.position),
                    normal: Vec3::from(vertex.normal),
                    groups: vertex
                        .groups
                        .iter()
                        .map(|(group, &weight)| GroupWeight {
                            group: group.clone(),
                            weight,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (colors, parameters) = match (
            mesh.color_layers.get(&layers.color),
            mesh.color_layers.get(&layers.parameter),
        ) {
            (Some(colors), Some(parameters)) => (
                Some(colors.clone()),
                Some(parameters.iter().map(|rgb| rgb[0]).collect()),
            ),
            _ if mesh.color_layers.len() == 1 => (mesh.color_layers.values().next().cloned(), None),
            _ => (None, None),
        };

        Ok(TriangulatedMesh {
            name: object.to_string(),
            corners,
            colors,
            parameters,
        })
    }
}

fn invalid(message: String) -> ExportError {
    ExportError::InvalidScene(message)
}

fn check_transform(transform: &TransformDef, what: &str) -> Result<()> {
    let rotation = Quat::from_array(transform.rotation);
    if !rotation.is_finite() || rotation.length_squared() == 0.0 {
        return Err(invalid(format!("{} has an invalid rotation", what)));
    }
    Ok(())
}

fn check_keys(keys: &[Keyframe], what: &str) -> Result<()> {
    for key in keys {
        if !key.frame.is_finite() {
            return Err(invalid(format!("{} has a non-finite keyframe time", what)));
        }
        if let Some(rotation) = key.rotation {
            let rotation = Quat::from_array(rotation);
            if !rotation.is_finite() || rotation.length_squared() == 0.0 {
                return Err(invalid(format!(
                    "{} has an invalid rotation at frame {}",
                    what, key.frame
                )));
            }
        }
    }
    Ok(())
}

fn check_mesh(mesh: &MeshDef, object: &str) -> Result<()> {
    let vertex_count = mesh.vertices.len();
    if let Some(index) = mesh
        .triangles
        .iter()
        .flatten()
        .find(|&&i| i as usize >= vertex_count)
    {
        return Err(invalid(format!(
            "mesh '{}' references vertex {} but has {} vertices",
            object, index, vertex_count
        )));
    }

    let corner_count = mesh.triangles.len() * 3;
    for (name, layer) in &mesh.color_layers {
        if layer.len() != corner_count {
            return Err(invalid(format!(
                "color layer '{}' of mesh '{}' has {} entries, expected {}",
                name,
                object,
                layer.len(),
                corner_count
            )));
        }
    }
    Ok(())
}

fn sort_keys(keys: &mut [Keyframe]) {
    keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
}

/// Sample every channel of a keyframe track; unkeyed channels use `fallback`
fn sample_keys(keys: &[Keyframe], frame: f32, fallback: &TransformDef) -> TransformDef {
    let translations: Vec<_> = keys
        .iter()
        .filter_map(|k| Some((k.frame, Vec3::from(k.translation?))))
        .collect();
    let rotations: Vec<_> = keys
        .iter()
        .filter_map(|k| Some((k.frame, Quat::from_array(k.rotation?).normalize())))
        .collect();
    let scales: Vec<_> = keys
        .iter()
        .filter_map(|k| Some((k.frame, Vec3::from(k.scale?))))
        .collect();

    TransformDef {
        translation: sample_channel(&translations, frame, Vec3::lerp)
            .map(|v| v.to_array())
            .unwrap_or(fallback.translation),
        rotation: sample_channel(&rotations, frame, Quat::slerp)
            .map(|q| q.to_array())
            .unwrap_or(fallback.rotation),
        scale: sample_channel(&scales, frame, Vec3::lerp)
            .map(|v| v.to_array())
            .unwrap_or(fallback.scale),
    }
}

/// Interpolate a sorted channel at `frame`, holding the end values outside it
fn sample_channel<T: Copy>(
    keys: &[(f32, T)],
    frame: f32,
    mix: impl Fn(T, T, f32) -> T,
) -> Option<T> {
    let (first, last) = (keys.first()?, keys.last()?);
    if frame <= first.0 {
        return Some(first.1);
    }
    if frame >= last.0 {
        return Some(last.1);
    }

    // first key strictly after `frame`; 1 <= next < len here
    let next = keys.partition_point(|(t, _)| *t <= frame);
    let (t0, v0) = keys[next - 1];
    let (t1, v1) = keys[next];
    let factor = if t1 > t0 { (frame - t0) / (t1 - t0) } else { 0.0 };
    Some(mix(v0, v1, factor.clamp(0.0, 1.0)))
}
