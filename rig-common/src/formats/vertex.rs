//! Skinned vertex records (`msh0` chunk)
//!
//! Vertices are stored unindexed, three per triangle, in armature space.
//!
//! # Layout (60 bytes)
//! ```text
//! 0x00: position [f32; 3]
//! 0x0C: normal [f32; 3]
//! 0x18: color [u8; 3]
//! 0x1B: parameter u8
//! 0x1C: weights [f32; 4]       (descending, sum 1.0 or all zero)
//! 0x2C: bone_indices [u32; 4]
//! ```

use super::serialization::{read_f32s, read_u32, write_f32s};

/// Maximum number of bone influences per vertex
pub const MAX_INFLUENCES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct SkinVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 3],
    pub parameter: u8,
    pub weights: [f32; MAX_INFLUENCES],
    pub bone_indices: [u32; MAX_INFLUENCES],
}

impl SkinVertex {
    pub const SIZE: usize = 60;

    /// Color used when a mesh has no color layer
    pub const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

    /// Parameter used when a mesh has no parameter layer
    pub const DEFAULT_PARAMETER: u8 = 255;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        write_f32s(&mut bytes, 0, &self.position);
        write_f32s(&mut bytes, 12, &self.normal);
        bytes[24..27].copy_from_slice(&self.color);
        bytes[27] = self.parameter;
        write_f32s(&mut bytes, 28, &self.weights);
        for (i, index) in self.bone_indices.iter().enumerate() {
            bytes[44 + i * 4..48 + i * 4].copy_from_slice(&index.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            position: read_f32s(bytes, 0),
            normal: read_f32s(bytes, 12),
            color: [bytes[24], bytes[25], bytes[26]],
            parameter: bytes[27],
            weights: read_f32s(bytes, 28),
            bone_indices: std::array::from_fn(|i| read_u32(bytes, 44 + i * 4)),
        })
    }
}
