//! Per-patch random sampling transforms.
//!
//! Each hex patch reads the texture through its own rotation and offset so
//! neighbouring patches never show the same aligned content. The randomness
//! comes from an integer permutation hash (PCG3D, Jarzynski & Olano 2020),
//! so results are identical on every platform and cost a handful of integer
//! multiplies with no branches.

use std::f32::consts::TAU;

use crate::lattice::CellId;

/// Third hash lane input, fixed so each cell maps to one triple of values
const HASH_SALT: u32 = 0x9E37_79B9;

/// Determinants smaller than this are treated as singular
const DET_EPSILON: f32 = 1e-8;

/// PCG3D permutation of three 32-bit lanes.
#[inline]
fn pcg3d(mut v: [u32; 3]) -> [u32; 3] {
    for lane in v.iter_mut() {
        *lane = lane.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    v[0] = v[0].wrapping_add(v[1].wrapping_mul(v[2]));
    v[1] = v[1].wrapping_add(v[2].wrapping_mul(v[0]));
    v[2] = v[2].wrapping_add(v[0].wrapping_mul(v[1]));
    for lane in v.iter_mut() {
        *lane ^= *lane >> 16;
    }
    v[0] = v[0].wrapping_add(v[1].wrapping_mul(v[2]));
    v[1] = v[1].wrapping_add(v[2].wrapping_mul(v[0]));
    v[2] = v[2].wrapping_add(v[0].wrapping_mul(v[1]));
    v
}

/// Map the top 24 bits of a hash to [0, 1). Every result is exactly
/// representable, so 1.0 is never produced.
#[inline]
fn unit_float(h: u32) -> f32 {
    (h >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Three pseudo-random values in [0, 1) for a lattice cell.
pub fn hash_cell(id: CellId) -> [f32; 3] {
    let h = pcg3d([id.x as u32, id.y as u32, HASH_SALT]);
    [unit_float(h[0]), unit_float(h[1]), unit_float(h[2])]
}

/// Affine map applied to texture coordinates: `uv' = matrix * uv + translation`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellTransform {
    /// Rotation angle in [0, 2π)
    pub angle: f32,
    /// Row-major 2x2 linear part
    pub matrix: [[f32; 2]; 2],
    pub translation: [f32; 2],
}

impl CellTransform {
    pub const IDENTITY: CellTransform = CellTransform {
        angle: 0.0,
        matrix: [[1.0, 0.0], [0.0, 1.0]],
        translation: [0.0, 0.0],
    };

    /// Rotation by `angle` about `pivot`, followed by a shift of `offset`.
    pub fn rotation_about(angle: f32, pivot: [f32; 2], offset: [f32; 2]) -> Self {
        let (sin, cos) = angle.sin_cos();
        let matrix = [[cos, -sin], [sin, cos]];
        let rotated_pivot = mul(matrix, pivot);
        Self {
            angle,
            matrix,
            translation: [
                pivot[0] - rotated_pivot[0] + offset[0],
                pivot[1] - rotated_pivot[1] + offset[1],
            ],
        }
    }

    #[inline]
    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        let p = mul(self.matrix, uv);
        [p[0] + self.translation[0], p[1] + self.translation[1]]
    }

    pub fn determinant(&self) -> f32 {
        let m = self.matrix;
        m[0][0] * m[1][1] - m[0][1] * m[1][0]
    }

    /// The inverse map. A singular matrix yields the identity.
    pub fn inverse(&self) -> CellTransform {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < DET_EPSILON {
            return CellTransform::IDENTITY;
        }
        let m = self.matrix;
        let inv = [
            [m[1][1] / det, -m[0][1] / det],
            [-m[1][0] / det, m[0][0] / det],
        ];
        let t = mul(inv, self.translation);
        CellTransform {
            angle: (TAU - self.angle) % TAU,
            matrix: inv,
            translation: [-t[0], -t[1]],
        }
    }
}

#[inline]
fn mul(m: [[f32; 2]; 2], v: [f32; 2]) -> [f32; 2] {
    [m[0][0] * v[0] + m[0][1] * v[1], m[1][0] * v[0] + m[1][1] * v[1]]
}

/// Sampling transform for a lattice cell: a random rotation about the cell's
/// centroid plus a random offset of at most one texture period.
pub fn cell_transform(id: CellId, patch_scale: f32) -> CellTransform {
    let [r_angle, r_x, r_y] = hash_cell(id);
    let angle = r_angle * TAU;
    // r_angle < 1 but the product can round up to TAU itself
    let angle = if angle >= TAU { 0.0 } else { angle };
    CellTransform::rotation_about(angle, id.centroid(patch_scale), [r_x, r_y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids() -> impl Iterator<Item = CellId> {
        (-20..20).flat_map(|y| (-20..20).map(move |x| CellId::new(x, y)))
    }

    #[test]
    fn test_deterministic() {
        for id in ids() {
            assert_eq!(hash_cell(id), hash_cell(id));
            assert_eq!(cell_transform(id, 2.0), cell_transform(id, 2.0));
        }
        let far = CellId::new(i32::MAX, i32::MIN);
        assert_eq!(cell_transform(far, 0.5), cell_transform(far, 0.5));
    }

    #[test]
    fn test_neighbours_differ() {
        let a = hash_cell(CellId::new(0, 0));
        let b = hash_cell(CellId::new(0, 0));
        assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));
        assert_ne!(hash_cell(CellId::new(0, 0)), hash_cell(CellId::new(1, 0)));
        assert_ne!(hash_cell(CellId::new(1, 0)), hash_cell(CellId::new(0, 1)));
    }

    #[test]
    fn test_values_in_unit_range() {
        assert_eq!(unit_float(u32::MAX), 16_777_215.0 / 16_777_216.0);
        assert_eq!(unit_float(0), 0.0);
        for id in ids() {
            for v in hash_cell(id) {
                assert!((0.0..1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_values_are_spread_out() {
        let values: Vec<[f32; 3]> = ids().map(hash_cell).collect();
        let n = values.len() as f32;
        for lane in 0..3 {
            let mean = values.iter().map(|v| v[lane]).sum::<f32>() / n;
            assert!((mean - 0.5).abs() < 0.05, "lane {} mean {}", lane, mean);
        }
        let distinct: HashSet<u32> = values.iter().map(|v| v[0].to_bits()).collect();
        assert!(distinct.len() as f32 > 0.95 * n);
    }

    #[test]
    fn test_transform_bounds() {
        for id in ids() {
            let t = cell_transform(id, 2.0);
            assert!((0.0..TAU).contains(&t.angle));
            assert!((t.determinant() - 1.0).abs() < 1e-5);

            // The centroid moves by the offset alone, which is within one period
            let c = id.centroid(2.0);
            let moved = t.apply(c);
            let dx = moved[0] - c[0];
            let dy = moved[1] - c[1];
            assert!((-1e-3..1.0 + 1e-3).contains(&dx), "{:?}: dx {}", id, dx);
            assert!((-1e-3..1.0 + 1e-3).contains(&dy), "{:?}: dy {}", id, dy);
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        for id in ids().step_by(7) {
            let t = cell_transform(id, 3.0);
            let inv = t.inverse();
            for p in [[0.1f32, 0.2f32], [-3.5, 7.25], [10.0, -10.0]] {
                let back = inv.apply(t.apply(p));
                assert!((back[0] - p[0]).abs() < 1e-3 && (back[1] - p[1]).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_singular_inverse_is_identity() {
        let singular = CellTransform {
            angle: 0.0,
            matrix: [[1.0, 2.0], [2.0, 4.0]],
            translation: [1.0, 1.0],
        };
        assert_eq!(singular.inverse(), CellTransform::IDENTITY);
    }
}
