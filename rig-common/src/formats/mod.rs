//! Rig asset binary format
//!
//! A rig asset is a sequence of tagged, length-prefixed chunks written in a
//! fixed order. Every chunk payload is a flat array of fixed-size records (or
//! raw UTF-8 for the string table), so a runtime can map it directly onto
//! its own structures.
//!
//! # Layout
//! ```text
//! chunk := tag [u8; 4] | length u32 LE | payload [u8; length]
//!
//! str0: raw UTF-8 bytes, referenced by (begin u32, end u32) pairs
//! bon0: BoneRecord × bone_count      (60 bytes each)
//! frm0: BoneTrs × frames × bones     (40 bytes each, frame-major)
//! act0: ActionRecord × action_count  (16 bytes each)
//! msh0: SkinVertex × vertex_count    (60 bytes each)
//! ```
//!
//! All numbers are little-endian, floats are IEEE-754 f32 and matrices are
//! column-major. There are no checksums and no compression.
//!
//! All records implement the [`BinarySerializable`] trait.

pub mod action;
pub mod asset;
pub mod bone;
pub mod chunk;
pub mod frame;
mod serialization;
pub mod strings;
pub mod vertex;

pub use action::*;
pub use asset::*;
pub use bone::*;
pub use chunk::*;
pub use frame::*;
pub use serialization::BinarySerializable;
pub use strings::*;
pub use vertex::*;
