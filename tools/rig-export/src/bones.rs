//! Bone table builder
//!
//! Linearizes an armature's hierarchy into the `bon0` chunk. Bones are
//! appended in the skeleton's enumeration order, except that a bone's parent
//! is always appended first, so every parent index is smaller than its
//! child's. Each bone name is written to the string table as the bone is
//! appended.

use glam::Mat4;
use hashbrown::HashMap;
use rig_common::AssetBuilder;
use rig_common::formats::{BoneRecord, NO_PARENT};

use crate::error::{ExportError, Result};
use crate::scene::{SceneBone, Skeleton};

/// A bone as it was written to the asset
#[derive(Debug, Clone, PartialEq)]
pub struct BoneEntry {
    pub name: String,
    /// Index of the parent entry, `None` for roots
    pub parent: Option<u32>,
    /// Bind-pose local-to-armature matrix
    pub bind_matrix: Mat4,
}

/// Index-stable bone table with a name to index map
#[derive(Debug, Clone, Default)]
pub struct BoneTable {
    entries: Vec<BoneEntry>,
    indices: HashMap<String, u32>,
}

impl BoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every bone of `skeleton` and write the records to `asset`
    pub fn build(skeleton: &Skeleton, asset: &mut AssetBuilder) -> Result<Self> {
        let mut table = Self::new();
        for bone in &skeleton.bones {
            table.insert(skeleton, Some(&bone.name), asset)?;
        }
        tracing::debug!("Bone table: {} bones", table.len());
        Ok(table)
    }

    /// Insert a bone (and any missing ancestors) and return its index
    ///
    /// `None` yields [`NO_PARENT`]. A bone already in the table returns its
    /// cached index without touching `asset`.
    pub fn insert(
        &mut self,
        skeleton: &Skeleton,
        name: Option<&str>,
        asset: &mut AssetBuilder,
    ) -> Result<i32> {
        let Some(name) = name else {
            return Ok(NO_PARENT);
        };
        if let Some(&index) = self.indices.get(name) {
            return Ok(index as i32);
        }

        let bone = skeleton
            .get(name)
            .ok_or_else(|| ExportError::BoneNotFound(name.to_string()))?;

        // Ancestors still waiting to be appended, innermost last
        let mut pending: Vec<&SceneBone> = vec![bone];
        while let Some(&current) = pending.last() {
            let parent = match current.parent.as_deref() {
                None => None,
                Some(parent) => match self.indices.get(parent) {
                    Some(&index) => Some(index),
                    None => {
                        if pending.iter().any(|b| b.name == parent) {
                            return Err(ExportError::BoneCycle(parent.to_string()));
                        }
                        let parent_bone =
                            skeleton.get(parent).ok_or_else(|| ExportError::MissingParent {
                                bone: current.name.clone(),
                                parent: parent.to_string(),
                            })?;
                        pending.push(parent_bone);
                        continue;
                    }
                },
            };
            pending.pop();
            self.append(current, parent, asset)?;
        }

        self.index_of(name)
            .map(|index| index as i32)
            .ok_or_else(|| ExportError::BoneNotFound(name.to_string()))
    }

    fn append(
        &mut self,
        bone: &SceneBone,
        parent: Option<u32>,
        asset: &mut AssetBuilder,
    ) -> Result<u32> {
        let determinant = bone.bind_matrix.determinant();
        if !determinant.is_finite() || determinant == 0.0 {
            return Err(ExportError::SingularBindMatrix(bone.name.clone()));
        }
        let bind_inverse = bone.bind_matrix.inverse().to_cols_array();

        let name = asset.write_string(&bone.name)?;
        let parent_index = parent.map_or(NO_PARENT, |p| p as i32);
        let index = asset.push_bone(BoneRecord::new(
            name,
            parent_index,
            BoneRecord::truncate_cols(&bind_inverse),
        ))?;
        if index as usize != self.entries.len() {
            return Err(anyhow::anyhow!(
                "Bone '{}' written at index {} but the table has {} entries",
                bone.name,
                index,
                self.entries.len()
            )
            .into());
        }

        tracing::debug!("  bone {} '{}' parent {}", index, bone.name, parent_index);
        self.entries.push(BoneEntry {
            name: bone.name.clone(),
            parent,
            bind_matrix: bone.bind_matrix,
        });
        self.indices.insert(bone.name.clone(), index);
        Ok(index)
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.indices.get(name).copied()
    }

    pub fn get(&self, index: u32) -> Option<&BoneEntry> {
        self.entries.get(index as usize)
    }

    /// Entries in index order
    pub fn entries(&self) -> &[BoneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn bone(name: &str, parent: Option<&str>, bind_matrix: Mat4) -> SceneBone {
        SceneBone {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            bind_matrix,
        }
    }

    fn arm_skeleton() -> Skeleton {
        Skeleton {
            bones: vec![
                bone("Hand", Some("Forearm"), Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0))),
                bone("Root", None, Mat4::IDENTITY),
                bone("Forearm", Some("Upper"), Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))),
                bone("Upper", Some("Root"), Mat4::from_translation(Vec3::Y)),
            ],
        }
    }

    #[test]
    fn test_parents_precede_children() {
        let mut asset = AssetBuilder::new();
        let table = BoneTable::build(&arm_skeleton(), &mut asset).unwrap();

        let names: Vec<_> = table.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Root", "Upper", "Forearm", "Hand"]);

        for (index, entry) in table.entries().iter().enumerate() {
            if let Some(parent) = entry.parent {
                assert!((parent as usize) < index, "{} before its parent", entry.name);
            }
        }
        assert_eq!(asset.bones().len(), 4);
        assert_eq!(asset.bones()[0].parent, NO_PARENT);
        assert_eq!(asset.bones()[3].parent, 2);
    }

    #[test]
    fn test_names_written_in_bone_order() {
        let mut asset = AssetBuilder::new();
        BoneTable::build(&arm_skeleton(), &mut asset).unwrap();
        assert_eq!(asset.strings().as_bytes(), b"RootUpperForearmHand");

        let hand = asset.bones()[3];
        assert_eq!(asset.strings().get(hand.name), Some("Hand"));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let skeleton = arm_skeleton();
        let mut asset = AssetBuilder::new();
        let mut table = BoneTable::build(&skeleton, &mut asset).unwrap();

        assert_eq!(table.insert(&skeleton, Some("Hand"), &mut asset).unwrap(), 3);
        assert_eq!(table.insert(&skeleton, None, &mut asset).unwrap(), NO_PARENT);
        assert_eq!(table.len(), 4);
        assert_eq!(asset.bones().len(), 4);

        let mut again = AssetBuilder::new();
        let rebuilt = BoneTable::build(&skeleton, &mut again).unwrap();
        assert_eq!(rebuilt.entries(), table.entries());
    }

    #[test]
    fn test_bind_inverse_is_stored() {
        let bind = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(0.3),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let skeleton = Skeleton {
            bones: vec![bone("Root", None, bind)],
        };
        let mut asset = AssetBuilder::new();
        BoneTable::build(&skeleton, &mut asset).unwrap();

        let stored = Mat4::from_cols_array(&asset.bones()[0].bind_inverse_cols());
        assert!(stored.inverse().abs_diff_eq(bind, 1e-5));
    }

    #[test]
    fn test_cycle_rejected() {
        let skeleton = Skeleton {
            bones: vec![
                bone("A", Some("B"), Mat4::IDENTITY),
                bone("B", Some("A"), Mat4::IDENTITY),
            ],
        };
        let result = BoneTable::build(&skeleton, &mut AssetBuilder::new());
        assert!(matches!(result, Err(ExportError::BoneCycle(_))));
    }

    #[test]
    fn test_self_parent_rejected() {
        let skeleton = Skeleton {
            bones: vec![bone("A", Some("A"), Mat4::IDENTITY)],
        };
        let result = BoneTable::build(&skeleton, &mut AssetBuilder::new());
        assert!(matches!(result, Err(ExportError::BoneCycle(name)) if name == "A"));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let skeleton = Skeleton {
            bones: vec![bone("Tail", Some("Hips"), Mat4::IDENTITY)],
        };
        let result = BoneTable::build(&skeleton, &mut AssetBuilder::new());
        assert!(matches!(
            result,
            Err(ExportError::MissingParent { bone, parent }) if bone == "Tail" && parent == "Hips"
        ));
    }

    #[test]
    fn test_singular_bind_rejected() {
        let skeleton = Skeleton {
            bones: vec![bone("Flat", None, Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)))],
        };
        let result = BoneTable::build(&skeleton, &mut AssetBuilder::new());
        assert!(matches!(result, Err(ExportError::SingularBindMatrix(_))));
    }
}
