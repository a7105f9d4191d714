//! Frame records (`frm0` chunk)
//!
//! One [`BoneTrs`] per bone per frame, stored frame-major then in bone-index
//! order: [frame0_bone0, frame0_bone1, ..., frame1_bone0, ...]
//!
//! # Layout (40 bytes)
//! ```text
//! 0x00: translation [f32; 3]
//! 0x0C: rotation [f32; 4]     (quaternion x, y, z, w)
//! 0x1C: scale [f32; 3]
//! ```

use super::serialization::{read_f32s, write_f32s};

/// Parent-relative bone transform (TRS) for a single bone in a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct BoneTrs {
    pub translation: [f32; 3],
    /// Quaternion rotation [x, y, z, w]
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for BoneTrs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTrs {
    /// Identity transform (no rotation, no translation, unit scale)
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    pub const SIZE: usize = 40;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        write_f32s(&mut bytes, 0, &self.translation);
        write_f32s(&mut bytes, 12, &self.rotation);
        write_f32s(&mut bytes, 28, &self.scale);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            translation: read_f32s(bytes, 0),
            rotation: read_f32s(bytes, 12),
            scale: read_f32s(bytes, 28),
        })
    }
}
