//! Frame sampler
//!
//! Samples clips into the global frame stream. Each frame holds one
//! parent-relative [`BoneTrs`] per bone, in bone-table order; root bones are
//! expressed relative to the clip's [`RootReference`].

use glam::Mat4;
use rig_common::formats::{ActionRecord, AssetBuilder, BoneTrs};

use crate::bones::BoneTable;
use crate::clip::{ClipRequest, ClipSource, RootMotion};
use crate::error::{ExportError, Result};
use crate::scene::{Pose, SceneSource};

/// Per-clip transform applied to root bones
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RootReference {
    /// Root bones stay in armature space
    Identity,
    /// Armature world transform captured at the clip's first frame
    Baked(Mat4),
    /// Armature motion since the clip's first frame
    RelativeToFirst { first_inverse: Mat4 },
}

impl RootReference {
    /// Capture the reference for a clip starting at `first_frame`
    ///
    /// Moves the scene's time cursor for the modes that need the armature's
    /// world transform.
    pub fn begin<S: SceneSource + ?Sized>(
        mode: RootMotion,
        scene: &mut S,
        armature: &str,
        first_frame: i32,
    ) -> Result<Self> {
        match mode {
            RootMotion::Local => Ok(RootReference::Identity),
            RootMotion::Global => {
                scene.set_pose_time(first_frame, 0.0);
                Ok(RootReference::Baked(scene.armature_world_transform(armature)?))
            }
            RootMotion::First => {
                scene.set_pose_time(first_frame, 0.0);
                let world = scene.armature_world_transform(armature)?;
                Ok(RootReference::RelativeToFirst {
                    first_inverse: world.inverse(),
                })
            }
        }
    }

    /// Root transform at the scene's current time
    pub fn transform_at<S: SceneSource + ?Sized>(&self, scene: &S, armature: &str) -> Result<Mat4> {
        match self {
            RootReference::Identity => Ok(Mat4::IDENTITY),
            RootReference::Baked(world) => Ok(*world),
            RootReference::RelativeToFirst { first_inverse } => {
                Ok(*first_inverse * scene.armature_world_transform(armature)?)
            }
        }
    }
}

/// Decompose every bone of `pose` into a parent-relative transform
pub fn sample_frame(pose: &Pose, table: &BoneTable, root: Mat4) -> Result<Vec<BoneTrs>> {
    let matrix_of = |name: &str| {
        pose.get(name)
            .copied()
            .ok_or_else(|| ExportError::MissingPoseBone(name.to_string()))
    };

    table
        .entries()
        .iter()
        .map(|entry| -> Result<BoneTrs> {
            let matrix = matrix_of(&entry.name)?;
            let local = match entry.parent.and_then(|p| table.get(p)) {
                Some(parent) => matrix_of(&parent.name)?.inverse() * matrix,
                None => root * matrix,
            };
            let (scale, rotation, translation) = local.to_scale_rotation_translation();
            Ok(BoneTrs {
                translation: translation.to_array(),
                rotation: rotation.normalize().to_array(),
                scale: scale.to_array(),
            })
        })
        .collect()
}

/// Sample one clip and append its frames and action record to `asset`
///
/// Named actions are made the armature's active action first; literal ranges
/// sample whatever is already playing.
pub fn sample_clip<S: SceneSource + ?Sized>(
    scene: &mut S,
    armature: &str,
    table: &BoneTable,
    request: &ClipRequest,
    asset: &mut AssetBuilder,
) -> Result<ActionRecord> {
    if let ClipSource::Action(action) = &request.source {
        scene.set_active_action(armature, action)?;
    }

    let action_name = request.action_name();
    let name = asset.write_string(&action_name)?;
    let start_frame = asset.frame_count();

    let root = RootReference::begin(request.root_motion, scene, armature, request.first_frame)?;
    for frame in request.first_frame..=request.last_frame {
        scene.set_pose_time(frame, 0.0);
        let pose = scene.evaluate_pose(armature)?;
        let root_transform = root.transform_at(scene, armature)?;
        asset.push_frame(&sample_frame(&pose, table, root_transform)?)?;
    }

    let record = ActionRecord::new(name, start_frame, asset.frame_count());
    asset.push_action(record)?;

    tracing::info!(
        "Wrote '{}' frames [{}, {}] mode '{}'",
        request.output_name,
        request.first_frame,
        request.last_frame,
        request.root_motion
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{parse_selector, resolve_requests};
    use crate::scene::SceneDocument;
    use glam::{Quat, Vec3};
    use rig_common::DecodedAsset;
    use serde_json::json;

    /// Armature sliding along +X one unit per frame, with a keyed child bone
    fn sliding_scene() -> SceneDocument {
        let quarter = std::f32::consts::FRAC_1_SQRT_2;
        let scene = json!({
            "objects": [{
                "name": "Rig",
                "type": "armature",
                "bones": [
                    { "name": "Root" },
                    { "name": "Head", "parent": "Root", "bind": { "translation": [0.0, 1.0, 0.0] } }
                ],
                "motion": [
                    { "frame": 0.0, "translation": [0.0, 0.0, 0.0] },
                    { "frame": 10.0, "translation": [10.0, 0.0, 0.0] }
                ]
            }],
            "actions": [{
                "name": "Nod",
                "tracks": {
                    "Head": [
                        { "frame": 0.0, "rotation": [0.0, 0.0, 0.0, 1.0] },
                        { "frame": 10.0, "rotation": [0.0, 0.0, quarter, quarter] }
                    ]
                }
            }]
        });
        SceneDocument::from_json(&scene.to_string()).unwrap()
    }

    fn export(scene: &mut SceneDocument, selectors: &[&str]) -> DecodedAsset {
        let mut asset = AssetBuilder::new();
        let table = BoneTable::build(&scene.skeleton("Rig").unwrap(), &mut asset).unwrap();
        let selectors: Vec<_> = selectors.iter().map(|s| parse_selector(s).unwrap()).collect();
        let requests = resolve_requests(&selectors, |name| scene.action_frame_range(name)).unwrap();
        for request in &requests {
            sample_clip(scene, "Rig", &table, request, &mut asset).unwrap();
        }
        DecodedAsset::parse(&asset.to_bytes().unwrap()).unwrap()
    }

    fn root_translation(asset: &DecodedAsset, frame: usize) -> Vec3 {
        Vec3::from(asset.frame(frame).unwrap()[0].translation)
    }

    #[test]
    fn test_local_root_ignores_armature_motion() {
        let mut scene = sliding_scene();
        let asset = export(&mut scene, &["[2,6]Slide"]);

        assert_eq!(asset.frame_count(), 5);
        for frame in 0..5 {
            let root = asset.frame(frame).unwrap()[0];
            assert!(Vec3::from(root.translation).abs_diff_eq(Vec3::ZERO, 1e-6));
            assert!(Quat::from_array(root.rotation).abs_diff_eq(Quat::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn test_global_root_is_fixed_at_first_frame() {
        let mut scene = sliding_scene();
        let asset = export(&mut scene, &["[2,6]Slide!global"]);

        for frame in 0..5 {
            assert!(root_translation(&asset, frame).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        }
    }

    #[test]
    fn test_first_root_tracks_motion_since_first_frame() {
        let mut scene = sliding_scene();
        let asset = export(&mut scene, &["[2,6]Slide!first"]);

        for frame in 0..5 {
            let expected = Vec3::new(frame as f32, 0.0, 0.0);
            assert!(root_translation(&asset, frame).abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn test_child_is_parent_relative() {
        let mut scene = sliding_scene();
        let asset = export(&mut scene, &["Nod!global"]);

        assert_eq!(asset.frame_count(), 11);
        let last = asset.frame(10).unwrap();
        let head = last[1];
        assert!(Vec3::from(head.translation).abs_diff_eq(Vec3::Y, 1e-5));
        assert!(
            Quat::from_array(head.rotation)
                .abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-5)
        );
        assert!(Vec3::from(head.scale).abs_diff_eq(Vec3::ONE, 1e-5));
    }

    #[test]
    fn test_action_records_share_one_frame_counter() {
        let mut scene = sliding_scene();
        let asset = export(&mut scene, &["[0,1]Start", "Nod", "[3,3]Hold!first"]);

        let names: Vec<_> = (0..3).map(|i| asset.action_name(i).unwrap()).collect();
        assert_eq!(names, ["Start!local", "Hold!first", "Nod!local"]);

        let ranges: Vec<_> = asset
            .actions
            .iter()
            .map(|a| (a.start_frame, a.end_frame))
            .collect();
        assert_eq!(ranges, [(0, 2), (2, 3), (3, 14)]);
        assert_eq!(asset.frame_count(), 14);
    }

    #[test]
    fn test_missing_pose_bone() {
        let mut scene = sliding_scene();
        let mut asset = AssetBuilder::new();
        let table = BoneTable::build(&scene.skeleton("Rig").unwrap(), &mut asset).unwrap();

        scene.set_rest_pose();
        let mut pose = scene.evaluate_pose("Rig").unwrap();
        pose.remove("Head");
        assert!(matches!(
            sample_frame(&pose, &table, Mat4::IDENTITY),
            Err(ExportError::MissingPoseBone(name)) if name == "Head"
        ));
    }
}
