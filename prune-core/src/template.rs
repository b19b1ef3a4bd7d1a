//! External segment shapes.
//!
//! A template is any triangle mesh rescaled so that its height is one unit
//! and its pivot sits at the centre of its base. The solid view stretches
//! it to each segment's length and radius.

use crate::error::TemplateError;
use glam::Vec3;

/// Raw triangle mesh as loaded from disk or built in code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// What [`SegmentTemplate::normalize`] did to the input mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeInfo {
    pub original_dims: Vec3,
    pub scale_factor: f32,
    /// Offset applied after scaling to move the base centre to the origin.
    pub pivot: Vec3,
}

/// A mesh of height 1 whose base centre is the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentTemplate {
    pub name: String,
    pub mesh: Mesh,
    /// Local bounds after normalization.
    pub min: Vec3,
    pub max: Vec3,
}

impl SegmentTemplate {
    /// Rescales `mesh` to unit height and moves its base centre to the origin.
    pub fn normalize(
        name: impl Into<String>,
        mut mesh: Mesh,
    ) -> Result<(Self, NormalizeInfo), TemplateError> {
        if mesh.indices.len() < 3 || mesh.positions.is_empty() {
            return Err(TemplateError::EmptyMesh);
        }
        if let Some(&index) = mesh
            .indices
            .iter()
            .find(|&&i| i as usize >= mesh.positions.len())
        {
            return Err(TemplateError::IndexOutOfRange {
                index,
                vertices: mesh.positions.len(),
            });
        }

        let (min, max) = bounds(&mesh.positions);
        let dims = max - min;
        if dims.y <= f32::EPSILON {
            return Err(TemplateError::ZeroHeight);
        }

        let scale_factor = 1.0 / dims.y;
        let base_center = Vec3::new((min.x + max.x) * 0.5, min.y, (min.z + max.z) * 0.5);
        let pivot = -base_center * scale_factor;
        for p in &mut mesh.positions {
            *p = *p * scale_factor + pivot;
        }
        let (min, max) = bounds(&mesh.positions);

        let info = NormalizeInfo {
            original_dims: dims,
            scale_factor,
            pivot,
        };
        Ok((
            Self {
                name: name.into(),
                mesh,
                min,
                max,
            },
            info,
        ))
    }

    /// A closed tapered prism, wider at the base, used when no external
    /// mesh is available.
    pub fn tapered(sides: u32, top_ratio: f32) -> Result<(Self, NormalizeInfo), TemplateError> {
        let sides = sides.max(3);
        let mut positions = Vec::with_capacity(sides as usize * 2 + 2);
        for ring in 0..2 {
            let (y, r) = if ring == 0 { (0.0, 1.0) } else { (2.0, top_ratio) };
            for i in 0..sides {
                let a = i as f32 / sides as f32 * std::f32::consts::TAU;
                positions.push(Vec3::new(a.cos() * r, y, a.sin() * r));
            }
        }
        let bottom = positions.len() as u32;
        positions.push(Vec3::ZERO);
        positions.push(Vec3::new(0.0, 2.0, 0.0));
        let top = bottom + 1;

        let mut indices = Vec::with_capacity(sides as usize * 12);
        for i in 0..sides {
            let j = (i + 1) % sides;
            let (b0, b1, t0, t1) = (i, j, i + sides, j + sides);
            indices.extend_from_slice(&[b0, t0, b1, b1, t0, t1]);
            indices.extend_from_slice(&[bottom, b1, b0]);
            indices.extend_from_slice(&[top, t0, t1]);
        }

        Self::normalize("tapered", Mesh { positions, indices })
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.mesh.indices.chunks_exact(3).map(|t| {
            [
                self.mesh.positions[t[0] as usize],
                self.mesh.positions[t[1] as usize],
                self.mesh.positions[t[2] as usize],
            ]
        })
    }
}

fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
    points.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(lo, hi), &p| (lo.min(p), hi.max(p)),
    )
}
