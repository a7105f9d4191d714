//! rig-export library
//!
//! Converts an armature, its skinned meshes and a selection of animation
//! clips into a single chunked binary asset (see [`rig_common::formats`]).
//!
//! Scene data is read through the [`scene::SceneSource`] trait;
//! [`scene::SceneDocument`] implements it for JSON scene files.

pub mod bones;
pub mod clip;
pub mod config;
pub mod error;
pub mod export;
pub mod inspect;
pub mod sampler;
pub mod scene;
pub mod skin;
pub mod warnings;

pub use bones::{BoneEntry, BoneTable};
pub use clip::{ClipRequest, ClipSelector, ClipSource, RootMotion, parse_selector_list};
pub use config::{ExportConfig, VertexLayers};
pub use error::{ErrorKind, ExportError};
pub use export::{ExportOutput, export_scene, write_asset_file};
pub use inspect::inspect_asset;
pub use scene::{SceneDocument, SceneSource};
pub use warnings::{DataWarning, WarningLog};
