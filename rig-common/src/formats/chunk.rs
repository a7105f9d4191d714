//! Tagged, length-prefixed chunks
//!
//! # Layout
//! ```text
//! 0x00: tag [u8; 4]       ASCII, e.g. b"bon0"
//! 0x04: length u32 LE     payload size in bytes
//! 0x08: payload [u8; length]
//! ```

use anyhow::{Context, Result, bail};
use std::fmt;
use std::io::Write;

use super::serialization::read_u32;

/// Size of a chunk header (tag + length)
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Chunks of a rig asset, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    Strings,
    Bones,
    Frames,
    Actions,
    Mesh,
}

impl ChunkTag {
    /// Fixed write order of an asset
    pub const ORDER: [ChunkTag; 5] = [
        ChunkTag::Strings,
        ChunkTag::Bones,
        ChunkTag::Frames,
        ChunkTag::Actions,
        ChunkTag::Mesh,
    ];

    pub const fn magic(self) -> [u8; 4] {
        match self {
            ChunkTag::Strings => *b"str0",
            ChunkTag::Bones => *b"bon0",
            ChunkTag::Frames => *b"frm0",
            ChunkTag::Actions => *b"act0",
            ChunkTag::Mesh => *b"msh0",
        }
    }

    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        Self::ORDER.into_iter().find(|tag| tag.magic() == magic)
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magic = self.magic();
        write!(f, "{}", String::from_utf8_lossy(&magic))
    }
}

/// Write one chunk: tag, little-endian length, payload
pub fn write_chunk<W: Write>(w: &mut W, tag: ChunkTag, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len())
        .with_context(|| format!("Chunk '{}' payload too large: {} bytes", tag, payload.len()))?;
    w.write_all(&tag.magic())?;
    w.write_all(&length.to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// A chunk borrowed from an asset buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    pub magic: [u8; 4],
    pub payload: &'a [u8],
}

impl RawChunk<'_> {
    pub fn tag(&self) -> Option<ChunkTag> {
        ChunkTag::from_magic(self.magic)
    }
}

/// Split an asset buffer into its chunks
///
/// Unknown tags are returned as-is; truncated headers or payloads are errors.
pub fn read_chunks(data: &[u8]) -> Result<Vec<RawChunk<'_>>> {
    let mut chunks = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        if data.len() - offset < CHUNK_HEADER_SIZE {
            bail!(
                "Truncated chunk header at offset {}: {} bytes left",
                offset,
                data.len() - offset
            );
        }
        let magic = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        let length = read_u32(data, offset + 4) as usize;
        let start = offset + CHUNK_HEADER_SIZE;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .with_context(|| {
                format!(
                    "Chunk '{}' at offset {} claims {} bytes, only {} available",
                    String::from_utf8_lossy(&magic),
                    offset,
                    length,
                    data.len() - start
                )
            })?;

        chunks.push(RawChunk {
            magic,
            payload: &data[start..end],
        });
        offset = end;
    }

    Ok(chunks)
}
