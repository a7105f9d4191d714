//! Skin vertex builder
//!
//! Turns a triangulated mesh into `msh0` vertices in armature space, with at
//! most four bone influences per vertex.

use glam::{Mat3, Mat4};
use rig_common::formats::{MAX_INFLUENCES, SkinVertex};

use crate::bones::BoneTable;
use crate::error::{ExportError, Result};
use crate::scene::{GroupWeight, TriangulatedMesh};
use crate::warnings::{DataWarning, WarningLog};

/// Weights and bone indices of one vertex
///
/// Influences are sorted by weight, largest first (ties by bone name,
/// descending), clamped to [`MAX_INFLUENCES`] and normalized to sum to 1.
/// Unused slots are `(0.0, 0)`. A vertex with no contributing weight gets all
/// zeros and a warning.
pub fn resolve_weights(
    groups: &[GroupWeight],
    table: &BoneTable,
    mesh: &str,
    vertex: usize,
    warnings: &mut WarningLog,
) -> Result<([f32; MAX_INFLUENCES], [u32; MAX_INFLUENCES])> {
    let mut influences = groups
        .iter()
        .map(|g| -> Result<_> {
            let index = table
                .index_of(&g.group)
                .ok_or_else(|| ExportError::UnknownVertexGroup {
                    mesh: mesh.to_string(),
                    group: g.group.clone(),
                })?;
            Ok((g.weight, g.group.as_str(), index))
        })
        .collect::<Result<Vec<_>>>()?;

    influences.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(a.1)));

    if influences.len() > MAX_INFLUENCES {
        let discarded = influences
            .split_off(MAX_INFLUENCES)
            .into_iter()
            .map(|(weight, bone, _)| (bone.to_string(), weight))
            .collect();
        warnings.push(DataWarning::TooManyInfluences {
            mesh: mesh.to_string(),
            vertex,
            discarded,
        });
    }

    let mut weights = [0.0; MAX_INFLUENCES];
    let mut indices = [0; MAX_INFLUENCES];

    let total: f32 = influences.iter().map(|(weight, _, _)| weight).sum();
    if influences.is_empty() || total <= 0.0 || !total.is_finite() {
        warnings.push(DataWarning::NoBoneWeights {
            mesh: mesh.to_string(),
            vertex,
        });
        return Ok((weights, indices));
    }

    for (slot, (weight, _, index)) in influences.into_iter().enumerate() {
        weights[slot] = weight / total;
        indices[slot] = index;
    }
    Ok((weights, indices))
}

/// Build one vertex per triangle corner
///
/// Positions go through `mesh_to_armature`, normals through its
/// inverse-transpose and are renormalized.
pub fn build_vertices(
    mesh: &TriangulatedMesh,
    mesh_to_armature: Mat4,
    table: &BoneTable,
    warnings: &mut WarningLog,
) -> Result<Vec<SkinVertex>> {
    let corner_count = mesh.corners.len();
    let layer_lengths = [
        ("color", mesh.colors.as_ref().map(Vec::len)),
        ("parameter", mesh.parameters.as_ref().map(Vec::len)),
    ];
    for (layer, len) in layer_lengths {
        if let Some(len) = len.filter(|&len| len != corner_count) {
            return Err(ExportError::InvalidScene(format!(
                "{} layer of mesh '{}' has {} entries for {} corners",
                layer, mesh.name, len, corner_count
            )));
        }
    }

    match (&mesh.colors, &mesh.parameters) {
        (None, _) => warnings.push(DataWarning::MissingColors {
            mesh: mesh.name.clone(),
        }),
        (Some(_), None) => warnings.push(DataWarning::MissingParameters {
            mesh: mesh.name.clone(),
        }),
        (Some(_), Some(_)) => {}
    }

    let normal_matrix = Mat3::from_mat4(mesh_to_armature).inverse().transpose();

    let mut vertices = Vec::with_capacity(corner_count);
    for (index, corner) in mesh.corners.iter().enumerate() {
        let (weights, bone_indices) =
            resolve_weights(&corner.groups, table, &mesh.name, index, warnings)?;

        let color = match &mesh.colors {
            Some(colors) => colors[index].map(unit_to_byte),
            None => SkinVertex::DEFAULT_COLOR,
        };
        let parameter = match &mesh.parameters {
            Some(parameters) => unit_to_byte(parameters[index]),
            None => SkinVertex::DEFAULT_PARAMETER,
        };

        vertices.push(SkinVertex {
            position: mesh_to_armature.transform_point3(corner.position).to_array(),
            normal: (normal_matrix * corner.normal).normalize_or_zero().to_array(),
            color,
            parameter,
            weights,
            bone_indices,
        });
    }

    tracing::debug!(
        "Mesh '{}': {} triangles, {} vertices",
        mesh.name,
        mesh.triangle_count(),
        vertices.len()
    );
    Ok(vertices)
}

/// `[0, 1]` to a byte, truncating
fn unit_to_byte(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}
