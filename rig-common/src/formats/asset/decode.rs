//! Asset decoder

use anyhow::{Context, Result, bail};

use crate::formats::{
    ActionRecord, BinarySerializable, BoneRecord, BoneTrs, ChunkTag, SkinVertex, StringRef,
    read_chunks, resolve_string,
};

/// A fully parsed rig asset
#[derive(Debug, Clone, Default)]
pub struct DecodedAsset {
    pub strings: Vec<u8>,
    pub bones: Vec<BoneRecord>,
    /// Flattened frame stream, `bones.len()` transforms per frame
    pub frames: Vec<BoneTrs>,
    pub actions: Vec<ActionRecord>,
    pub vertices: Vec<SkinVertex>,
}

impl DecodedAsset {
    /// Parse an asset; all five chunks must be present in their fixed order
    pub fn parse(data: &[u8]) -> Result<Self> {
        let chunks = read_chunks(data)?;
        if chunks.len() != ChunkTag::ORDER.len() {
            bail!(
                "Expected {} chunks, found {}",
                ChunkTag::ORDER.len(),
                chunks.len()
            );
        }
        for (chunk, expected) in chunks.iter().zip(ChunkTag::ORDER) {
            if chunk.tag() != Some(expected) {
                bail!(
                    "Expected chunk '{}', found '{}'",
                    expected,
                    String::from_utf8_lossy(&chunk.magic)
                );
            }
        }

        let asset = Self {
            strings: chunks[0].payload.to_vec(),
            bones: decode_records(ChunkTag::Bones, chunks[1].payload)?,
            frames: decode_records(ChunkTag::Frames, chunks[2].payload)?,
            actions: decode_records(ChunkTag::Actions, chunks[3].payload)?,
            vertices: decode_records(ChunkTag::Mesh, chunks[4].payload)?,
        };

        if !asset.bones.is_empty() && asset.frames.len() % asset.bones.len() != 0 {
            bail!(
                "Frame stream holds {} transforms, not a multiple of {} bones",
                asset.frames.len(),
                asset.bones.len()
            );
        }

        Ok(asset)
    }

    pub fn string(&self, r: StringRef) -> Option<&str> {
        resolve_string(&self.strings, r)
    }

    pub fn bone_name(&self, index: usize) -> Option<&str> {
        self.bones.get(index).and_then(|b| self.string(b.name))
    }

    pub fn action_name(&self, index: usize) -> Option<&str> {
        self.actions.get(index).and_then(|a| self.string(a.name))
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        (0..self.bones.len()).find(|&i| self.bone_name(i) == Some(name))
    }

    pub fn find_action(&self, name: &str) -> Option<&ActionRecord> {
        (0..self.actions.len())
            .find(|&i| self.action_name(i) == Some(name))
            .map(|i| &self.actions[i])
    }

    /// Number of frames in the frame stream (0 for a bone-less asset)
    pub fn frame_count(&self) -> usize {
        if self.bones.is_empty() {
            0
        } else {
            self.frames.len() / self.bones.len()
        }
    }

    /// Transforms of one frame in bone-index order
    pub fn frame(&self, index: usize) -> Option<&[BoneTrs]> {
        let bone_count = self.bones.len();
        let start = index.checked_mul(bone_count)?;
        self.frames.get(start..start.checked_add(bone_count)?)
    }
}

fn decode_records<T: BinarySerializable>(tag: ChunkTag, payload: &[u8]) -> Result<Vec<T>> {
    T::deserialize_all(payload).with_context(|| {
        format!(
            "Chunk '{}' length {} is not a multiple of the {}-byte record size",
            tag,
            payload.len(),
            T::SIZE
        )
    })
}
