//! Action records (`act0` chunk)
//!
//! # Layout (16 bytes)
//! ```text
//! 0x00: name StringRef     ("<name>!<root motion mode>")
//! 0x08: start_frame u32    (index into the global frame stream)
//! 0x0C: end_frame u32      (one past the last frame of the action)
//! ```

use super::StringRef;
use super::serialization::read_u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ActionRecord {
    pub name: StringRef,
    pub start_frame: u32,
    pub end_frame: u32,
}

impl ActionRecord {
    pub const SIZE: usize = 16;

    pub fn new(name: StringRef, start_frame: u32, end_frame: u32) -> Self {
        Self {
            name,
            start_frame,
            end_frame,
        }
    }

    /// Number of frames covered by this action
    pub fn frame_count(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.name.to_bytes());
        bytes[8..12].copy_from_slice(&self.start_frame.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.end_frame.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            name: StringRef::from_bytes(&bytes[0..8])?,
            start_frame: read_u32(bytes, 8),
            end_frame: read_u32(bytes, 12),
        })
    }
}
