//! Export configuration (optional `export.toml`)
//!
//! ```toml
//! [layers]
//! color = "Col"      # color layer name
//! parameter = "Pro"  # parameter layer name (red channel is used)
//! ```
//!
//! Every field has a default, so an empty file is valid.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    #[serde(default)]
    pub layers: VertexLayers,
}

/// Names of the per-corner color layers read from meshes
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct VertexLayers {
    pub color: String,
    pub parameter: String,
}

impl Default for VertexLayers {
    fn default() -> Self {
        Self {
            color: "Col".to_string(),
            parameter: "Pro".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config: {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
