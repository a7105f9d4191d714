//! Bone records (`bon0` chunk)
//!
//! # Layout (60 bytes)
//! ```text
//! 0x00: name StringRef           (begin u32, end u32)
//! 0x08: parent i32               (-1 for root bones)
//! 0x0C: bind_inverse [f32; 12]   (3×4 column-major)
//! ```
//!
//! The bind inverse is the inverse of the bone's bind-pose local-to-armature
//! matrix with the constant bottom row `[0, 0, 0, 1]` dropped:
//! [col0.x, col0.y, col0.z, col1.x, col1.y, col1.z, col2.x, col2.y, col2.z, tx, ty, tz]

use super::StringRef;
use super::serialization::{read_f32s, read_i32, write_f32s};

/// Parent index stored for bones without a parent
pub const NO_PARENT: i32 = -1;

/// Size of one bind inverse matrix in bytes (12 floats × 4 bytes = 48)
pub const BIND_INVERSE_SIZE: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct BoneRecord {
    pub name: StringRef,
    /// Index of the parent bone, or [`NO_PARENT`]
    pub parent: i32,
    pub bind_inverse: [f32; 12],
}

impl BoneRecord {
    pub const SIZE: usize = 60;

    pub fn new(name: StringRef, parent: i32, bind_inverse: [f32; 12]) -> Self {
        Self {
            name,
            parent,
            bind_inverse,
        }
    }

    /// Parent index, `None` for roots
    pub fn parent_index(&self) -> Option<u32> {
        u32::try_from(self.parent).ok()
    }

    /// Expand the 3×4 bind inverse to a column-major 4×4 matrix
    pub fn bind_inverse_cols(&self) -> [f32; 16] {
        let m = &self.bind_inverse;
        [
            m[0], m[1], m[2], 0.0, // col0
            m[3], m[4], m[5], 0.0, // col1
            m[6], m[7], m[8], 0.0, // col2
            m[9], m[10], m[11], 1.0, // col3 (translation)
        ]
    }

    /// Truncate a column-major 4×4 affine matrix to the stored 3×4 form
    pub fn truncate_cols(cols: &[f32; 16]) -> [f32; 12] {
        [
            cols[0], cols[1], cols[2], // col0.xyz
            cols[4], cols[5], cols[6], // col1.xyz
            cols[8], cols[9], cols[10], // col2.xyz
            cols[12], cols[13], cols[14], // col3.xyz (translation)
        ]
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.name.to_bytes());
        bytes[8..12].copy_from_slice(&self.parent.to_le_bytes());
        write_f32s(&mut bytes, 12, &self.bind_inverse);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            name: StringRef::from_bytes(&bytes[0..8])?,
            parent: read_i32(bytes, 8),
            bind_inverse: read_f32s(bytes, 12),
        })
    }
}
