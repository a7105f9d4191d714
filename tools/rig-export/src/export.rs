//! Export pipeline
//!
//! Runs the stages in a fixed order against a [`SceneSource`]:
//!
//! 1. parse every clip selector (a bad selector aborts before any work)
//! 2. resolve the export target to an armature and its meshes
//! 3. build the bone table
//! 4. sample the clips, literal frame ranges first
//! 5. reset the scene to rest and build each mesh's vertices
//!
//! Everything accumulates in an [`AssetBuilder`]; nothing touches the disk
//! until [`write_asset_file`] is called on the finished asset.

use anyhow::Context;
use rig_common::AssetBuilder;
use rig_common::formats::AssetSummary;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::bones::BoneTable;
use crate::clip::{parse_selector_list, resolve_requests};
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::sampler::sample_clip;
use crate::scene::{ObjectKind, SceneSource};
use crate::skin::build_vertices;
use crate::warnings::{DataWarning, WarningLog};

/// A finished, not yet written asset
#[derive(Debug)]
pub struct ExportOutput {
    pub asset: AssetBuilder,
    pub warnings: Vec<DataWarning>,
    pub armature: String,
    /// Exported mesh objects, in vertex order
    pub meshes: Vec<String>,
}

/// Armature and meshes selected by the export target name
fn resolve_target<S: SceneSource + ?Sized>(scene: &S, object: &str) -> Result<(String, Vec<String>)> {
    match scene.object_kind(object) {
        None => Err(ExportError::ObjectNotFound(object.to_string())),
        Some(ObjectKind::Armature) => {
            let meshes = scene.meshes_using(object);
            tracing::info!("'{}' is an armature; exporting {} meshes that reference it", object, meshes.len());
            for mesh in &meshes {
                tracing::info!("  '{}'", mesh);
            }
            Ok((object.to_string(), meshes))
        }
        Some(ObjectKind::Mesh) => {
            let armature = scene
                .armature_of(object)
                .ok_or_else(|| ExportError::MissingArmature(object.to_string()))?;
            Ok((armature, vec![object.to_string()]))
        }
        Some(ObjectKind::Other(kind)) => Err(ExportError::UnsupportedObject {
            name: object.to_string(),
            kind,
        }),
    }
}

/// Export `object` (an armature, or a mesh bound to one) with the given clips
///
/// `clips` is a `;`-separated selector list (see [`crate::clip`]).
pub fn export_scene<S: SceneSource + ?Sized>(
    scene: &mut S,
    object: &str,
    clips: &str,
    config: &ExportConfig,
) -> Result<ExportOutput> {
    let selectors = parse_selector_list(clips)?;
    let (armature, meshes) = resolve_target(&*scene, object)?;

    let mut asset = AssetBuilder::new();
    let mut warnings = WarningLog::new();

    let skeleton = scene.skeleton(&armature)?;
    let table = BoneTable::build(&skeleton, &mut asset)?;
    tracing::info!("Armature '{}': {} bones", armature, table.len());

    let requests = resolve_requests(&selectors, |name| scene.action_frame_range(name))?;
    for request in &requests {
        tracing::debug!(
            "Clip '{}' from {:?}, frames [{}, {}]",
            request.output_name,
            request.source,
            request.first_frame,
            request.last_frame
        );
        sample_clip(scene, &armature, &table, request, &mut asset)?;
    }

    scene.set_rest_pose();
    let armature_to_world = scene.armature_world_transform(&armature)?;
    let world_to_armature = armature_to_world.inverse();
    for mesh_name in &meshes {
        let mesh = scene.triangulated_mesh(mesh_name, &config.layers)?;
        let mesh_to_armature = world_to_armature * scene.object_world_transform(mesh_name)?;
        let vertices = build_vertices(&mesh, mesh_to_armature, &table, &mut warnings)?;
        tracing::info!("Mesh '{}': {} triangles", mesh_name, mesh.triangle_count());
        asset.push_vertices(&vertices);
    }

    Ok(ExportOutput {
        asset,
        warnings: warnings.into_vec(),
        armature,
        meshes,
    })
}

/// Write a finished asset to `path`
pub fn write_asset_file(asset: &AssetBuilder, path: &Path) -> anyhow::Result<AssetSummary> {
    let file =
        File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    let summary = asset.write_to(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write output: {:?}", path))?;

    tracing::info!(
        "Wrote {} bytes [== {} bytes of strings + {} bytes of bone info + {} bytes of frames + {} bytes of action info + {} bytes of mesh] to {:?}",
        summary.total(),
        summary.strings,
        summary.bones,
        summary.frames,
        summary.actions,
        summary.mesh,
        path
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneDocument;
    use rig_common::DecodedAsset;
    use serde_json::{Value, json};

    fn scene_json() -> Value {
        json!({
            "objects": [
                {
                    "name": "Rig",
                    "type": "armature",
                    "transform": { "translation": [0.0, 0.0, 2.0] },
                    "bones": [
                        { "name": "Root" },
                        { "name": "Spine", "parent": "Root", "bind": { "translation": [0.0, 1.0, 0.0] } }
                    ]
                },
                {
                    "name": "Body",
                    "type": "mesh",
                    "armature": "Rig",
                    "transform": { "translation": [1.0, 0.0, 2.0] },
                    "mesh": {
                        "vertices": [
                            { "position": [0.0, 0.0, 0.0], "normal": [0.0, 0.0, 1.0], "groups": { "Root": 1.0 } },
                            { "position": [0.0, 1.0, 0.0], "normal": [0.0, 0.0, 1.0], "groups": { "Spine": 1.0 } },
                            { "position": [1.0, 0.0, 0.0], "normal": [0.0, 0.0, 1.0], "groups": { "Root": 0.5, "Spine": 0.5 } }
                        ],
                        "triangles": [[0, 1, 2]],
                        "color_layers": {
                            "Col": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                            "Pro": [[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [1.0, 0.0, 0.0]]
                        }
                    }
                },
                { "name": "Prop", "type": "mesh" },
                { "name": "Sun", "type": "light" }
            ],
            "actions": [
                {
                    "name": "Bow",
                    "frame_range": [1.0, 4.0],
                    "tracks": { "Spine": [ { "frame": 4.0, "rotation": [0.38268343, 0.0, 0.0, 0.9238795] } ] }
                }
            ]
        })
    }

    fn scene() -> SceneDocument {
        SceneDocument::from_json(&scene_json().to_string()).unwrap()
    }

    fn decode(output: &ExportOutput) -> DecodedAsset {
        DecodedAsset::parse(&output.asset.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_literal_ranges_precede_actions() {
        let mut scene = scene();
        let output =
            export_scene(&mut scene, "Rig", "Bow!first;[0,2]Still", &ExportConfig::default()).unwrap();
        let asset = decode(&output);

        assert_eq!(asset.action_name(0), Some("Still!local"));
        assert_eq!(asset.action_name(1), Some("Bow!first"));
        assert_eq!((asset.actions[0].start_frame, asset.actions[0].end_frame), (0, 3));
        assert_eq!((asset.actions[1].start_frame, asset.actions[1].end_frame), (3, 7));
        assert_eq!(asset.frame_count(), 7);
    }

    #[test]
    fn test_string_table_order() {
        let mut scene = scene();
        let output = export_scene(&mut scene, "Rig", "Bow", &ExportConfig::default()).unwrap();
        assert_eq!(output.asset.strings().as_bytes(), b"RootSpineBow!local");
    }

    #[test]
    fn test_armature_target_exports_bound_meshes() {
        let mut scene = scene();
        let output = export_scene(&mut scene, "Rig", "Bow", &ExportConfig::default()).unwrap();

        assert_eq!(output.armature, "Rig");
        assert_eq!(output.meshes, ["Body"]);
        assert!(output.warnings.is_empty());

        let asset = decode(&output);
        assert_eq!(asset.vertices.len(), 3);
        // mesh sits one unit along +X from the armature
        let position = glam::Vec3::from(asset.vertices[0].position);
        assert!(position.abs_diff_eq(glam::Vec3::X, 1e-6));
        assert_eq!(asset.vertices[0].color, [255, 0, 0]);
        assert_eq!(asset.vertices[1].parameter, 127);
        assert_eq!(asset.vertices[1].bone_indices[0], 1);
        assert_eq!(asset.vertices[2].weights, [0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_mesh_target_uses_its_armature() {
        let mut scene = scene();
        let output = export_scene(&mut scene, "Body", "[1,1]Pose", &ExportConfig::default()).unwrap();
        assert_eq!(output.armature, "Rig");
        assert_eq!(output.meshes, ["Body"]);
    }

    #[test]
    fn test_configured_layer_names() {
        let mut value = scene_json();
        let layers = value["objects"][1]["mesh"]["color_layers"].take();
        value["objects"][1]["mesh"]["color_layers"] =
            json!({ "Paint": layers["Col"].clone(), "Params": layers["Pro"].clone() });
        let mut scene = SceneDocument::from_json(&value.to_string()).unwrap();

        let default = export_scene(&mut scene, "Rig", "Bow", &ExportConfig::default()).unwrap();
        assert!(matches!(
            default.warnings.as_slice(),
            [DataWarning::MissingColors { .. }]
        ));

        let config = ExportConfig::from_toml("[layers]\ncolor = \"Paint\"\nparameter = \"Params\"\n")
            .unwrap();
        let configured = export_scene(&mut scene, "Rig", "Bow", &config).unwrap();
        assert!(configured.warnings.is_empty());
    }

    #[test]
    fn test_target_errors() {
        let config = ExportConfig::default();
        assert!(matches!(
            export_scene(&mut scene(), "Ghost", "Bow", &config),
            Err(ExportError::ObjectNotFound(_))
        ));
        assert!(matches!(
            export_scene(&mut scene(), "Sun", "Bow", &config),
            Err(ExportError::UnsupportedObject { kind, .. }) if kind == "light"
        ));
        assert!(matches!(
            export_scene(&mut scene(), "Prop", "Bow", &config),
            Err(ExportError::MissingArmature(_))
        ));
    }

    #[test]
    fn test_selectors_checked_before_target() {
        let config = ExportConfig::default();
        assert!(matches!(
            export_scene(&mut scene(), "Ghost", "Bow!sideways", &config),
            Err(ExportError::UnknownRootMotion(_))
        ));
    }

    #[test]
    fn test_unknown_action() {
        assert!(matches!(
            export_scene(&mut scene(), "Rig", "Bow;Jump", &ExportConfig::default()),
            Err(ExportError::ActionNotFound(name)) if name == "Jump"
        ));
    }

    #[test]
    fn test_write_asset_file() {
        let mut scene = scene();
        let output = export_scene(&mut scene, "Rig", "Bow", &ExportConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.asset");
        let summary = write_asset_file(&output.asset, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), summary.total());
        assert_eq!(&bytes[..4], b"str0");
    }
}
