//! Asset inspection

use anyhow::{Context, Result};
use rig_common::DecodedAsset;
use std::path::Path;

/// Decode an asset file and log its contents
pub fn inspect_asset(path: &Path) -> Result<DecodedAsset> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read asset: {:?}", path))?;
    let asset =
        DecodedAsset::parse(&data).with_context(|| format!("Failed to decode asset: {:?}", path))?;

    tracing::info!("{:?}: {} bytes", path, data.len());
    tracing::info!("Bones ({}):", asset.bones.len());
    for (index, bone) in asset.bones.iter().enumerate() {
        tracing::info!(
            "  [{}] '{}' parent {}",
            index,
            asset.bone_name(index).unwrap_or("?"),
            bone.parent
        );
    }

    tracing::info!("Actions ({}):", asset.actions.len());
    for (index, action) in asset.actions.iter().enumerate() {
        tracing::info!(
            "  '{}' frames [{}, {}) ({} frames)",
            asset.action_name(index).unwrap_or("?"),
            action.start_frame,
            action.end_frame,
            action.frame_count()
        );
    }

    tracing::info!(
        "{} frames, {} vertices ({} triangles)",
        asset.frame_count(),
        asset.vertices.len(),
        asset.vertices.len() / 3
    );
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_common::AssetBuilder;

    #[test]
    fn test_inspect_written_asset() {
        let mut builder = AssetBuilder::new();
        builder.write_string("Root").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.asset");
        std::fs::write(&path, builder.to_bytes().unwrap()).unwrap();

        let asset = inspect_asset(&path).unwrap();
        assert_eq!(asset.strings, b"Root");
        assert_eq!(asset.frame_count(), 0);
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.asset");
        std::fs::write(&path, b"not an asset").unwrap();
        assert!(inspect_asset(&path).is_err());
    }
}
