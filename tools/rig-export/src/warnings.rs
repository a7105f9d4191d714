//! Non-fatal data quality warnings
//!
//! Warnings never stop an export; a documented default or clamp is applied
//! instead. They are logged as they happen and collected so callers can
//! inspect them afterwards.

use std::fmt;

/// A problem in the source data that was worked around
#[derive(Debug, Clone, PartialEq)]
pub enum DataWarning {
    /// More than four bones influence a vertex; the smallest weights were dropped
    TooManyInfluences {
        mesh: String,
        vertex: usize,
        /// Dropped (bone, weight) pairs, largest first
        discarded: Vec<(String, f32)>,
    },
    /// No bone contributes to a vertex; all weights are written as zero
    NoBoneWeights { mesh: String, vertex: usize },
    /// Mesh has no usable color layer; color and parameter default to 0xff
    MissingColors { mesh: String },
    /// Mesh has a color layer but no parameter layer; parameter defaults to 0xff
    MissingParameters { mesh: String },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::TooManyInfluences {
                mesh,
                vertex,
                discarded,
            } => {
                write!(
                    f,
                    "clamping vertex {} of mesh '{}' to 4 bones, discarding",
                    vertex, mesh
                )?;
                for (bone, weight) in discarded {
                    write!(f, " {} for '{}'", weight, bone)?;
                }
                Ok(())
            }
            DataWarning::NoBoneWeights { mesh, vertex } => {
                write!(f, "vertex {} of mesh '{}' has no bone weights", vertex, mesh)
            }
            DataWarning::MissingColors { mesh } => write!(
                f,
                "mesh '{}' does not have color data; will output 0xffffffff",
                mesh
            ),
            DataWarning::MissingParameters { mesh } => write!(
                f,
                "mesh '{}' does not have parameter data; will output 0xff",
                mesh
            ),
        }
    }
}

/// Collects warnings and logs each one as it arrives
#[derive(Debug, Default)]
pub struct WarningLog {
    warnings: Vec<DataWarning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: DataWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn as_slice(&self) -> &[DataWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_vec(self) -> Vec<DataWarning> {
        self.warnings
    }
}
