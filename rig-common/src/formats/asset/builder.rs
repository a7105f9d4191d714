//! Asset builder

use anyhow::{Result, bail};
use std::io::Write;

use crate::formats::{
    ActionRecord, BoneRecord, BoneTrs, CHUNK_HEADER_SIZE, ChunkTag, SkinVertex, StringRef,
    StringTable, write_chunk,
};

/// Append-only buffers for one asset
#[derive(Debug, Clone, Default)]
pub struct AssetBuilder {
    strings: StringTable,
    bones: Vec<BoneRecord>,
    frames: Vec<BoneTrs>,
    frame_count: u32,
    actions: Vec<ActionRecord>,
    vertices: Vec<SkinVertex>,
}

/// Payload sizes of a finished asset, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetSummary {
    pub strings: usize,
    pub bones: usize,
    pub frames: usize,
    pub actions: usize,
    pub mesh: usize,
}

impl AssetSummary {
    /// Total file size including chunk headers
    pub fn total(&self) -> usize {
        ChunkTag::ORDER.len() * CHUNK_HEADER_SIZE
            + self.strings
            + self.bones
            + self.frames
            + self.actions
            + self.mesh
    }
}

impl AssetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_string(&mut self, s: &str) -> Result<StringRef> {
        self.strings.write_string(s)
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Append a bone and return its index
    ///
    /// Bones must be complete before the first frame is pushed, since every
    /// frame holds one transform per bone.
    pub fn push_bone(&mut self, bone: BoneRecord) -> Result<u32> {
        if self.frame_count > 0 {
            bail!("Cannot add bones after frames have been written");
        }
        let index = self.bones.len() as u32;
        if bone.parent_index().is_some_and(|parent| parent >= index) {
            bail!(
                "Bone {} references parent {} which is not written yet",
                index,
                bone.parent
            );
        }
        self.bones.push(bone);
        Ok(index)
    }

    pub fn bones(&self) -> &[BoneRecord] {
        &self.bones
    }

    /// Append one frame (one transform per bone) and return the new frame count
    pub fn push_frame(&mut self, frame: &[BoneTrs]) -> Result<u32> {
        if frame.len() != self.bones.len() {
            bail!(
                "Frame has {} bones, expected {}",
                frame.len(),
                self.bones.len()
            );
        }
        self.frames.extend_from_slice(frame);
        self.frame_count += 1;
        Ok(self.frame_count)
    }

    /// Number of frames in the global frame stream
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn push_action(&mut self, action: ActionRecord) -> Result<()> {
        if action.start_frame > action.end_frame || action.end_frame > self.frame_count {
            bail!(
                "Action frames [{}, {}) fall outside the frame stream of {} frames",
                action.start_frame,
                action.end_frame,
                self.frame_count
            );
        }
        self.actions.push(action);
        Ok(())
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    pub fn push_vertices(&mut self, vertices: &[SkinVertex]) {
        self.vertices.extend_from_slice(vertices);
    }

    pub fn vertices(&self) -> &[SkinVertex] {
        &self.vertices
    }

    /// Encode the payload of one chunk
    pub fn chunk_payload(&self, tag: ChunkTag) -> Vec<u8> {
        match tag {
            ChunkTag::Strings => self.strings.as_bytes().to_vec(),
            ChunkTag::Bones => self.bones.iter().flat_map(|b| b.to_bytes()).collect(),
            ChunkTag::Frames => self.frames.iter().flat_map(|f| f.to_bytes()).collect(),
            ChunkTag::Actions => self.actions.iter().flat_map(|a| a.to_bytes()).collect(),
            ChunkTag::Mesh => self.vertices.iter().flat_map(|v| v.to_bytes()).collect(),
        }
    }

    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            strings: self.strings.len(),
            bones: self.bones.len() * BoneRecord::SIZE,
            frames: self.frames.len() * BoneTrs::SIZE,
            actions: self.actions.len() * ActionRecord::SIZE,
            mesh: self.vertices.len() * SkinVertex::SIZE,
        }
    }

    /// Write all chunks in their fixed order
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<AssetSummary> {
        for tag in ChunkTag::ORDER {
            write_chunk(w, tag, &self.chunk_payload(tag))?;
        }
        Ok(self.summary())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.summary().total());
        self.write_to(&mut out)?;
        Ok(out)
    }
}
