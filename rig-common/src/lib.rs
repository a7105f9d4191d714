//! Shared types for rig assets
//!
//! This crate provides the binary asset format shared between:
//! - `rig-export` (asset pipeline)
//! - runtime players that map the chunks onto fixed-layout structures
//!
//! # Modules
//!
//! - [`formats`] - Chunk codec, string table and fixed-size records

pub mod formats;

// Re-export commonly used format items
pub use formats::{
    // Records
    ActionRecord,
    // Asset
    AssetBuilder,
    AssetSummary,
    BinarySerializable,
    BoneRecord,
    BoneTrs,
    // Chunks
    ChunkTag,
    DecodedAsset,
    SkinVertex,
    StringRef,
    StringTable,
    read_chunks,
    write_chunk,
};
