//! Hexagonal lattice decomposition.
//!
//! A hexagonal tiling is the dual of a triangular grid: every vertex of the
//! triangular grid is the center of one hex patch. A point therefore always
//! lies in exactly one triangle and blends the three patches centered on that
//! triangle's corners, weighted by its barycentric coordinates.
//!
//! Coordinates are scaled by the patch scale and mapped into a skewed space
//! where the triangular grid becomes the unit square grid split along its
//! anti-diagonal:
//!
//! ```text
//!   lattice basis:  e1 = (1, 0)   e2 = (1/2, sqrt(3)/2)
//! ```

use crate::params::MIN_PATCH_SCALE;

const INV_SQRT_3: f32 = 0.577_350_27;
const TWO_OVER_SQRT_3: f32 = 1.154_700_5;
const HALF_SQRT_3: f32 = 0.866_025_4;

/// Weight sums below this are treated as degenerate
const WEIGHT_EPSILON: f32 = 1e-12;

/// Integer identity of a lattice vertex (one hex patch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CellId {
    pub x: i32,
    pub y: i32,
}

impl CellId {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }

    /// Vertex position in scaled (unskewed) lattice space.
    #[inline]
    pub fn lattice_position(self) -> [f32; 2] {
        let x = self.x as f32;
        let y = self.y as f32;
        [x + 0.5 * y, HALF_SQRT_3 * y]
    }

    /// Patch center in texture coordinate space for a given patch scale.
    #[inline]
    pub fn centroid(self, patch_scale: f32) -> [f32; 2] {
        let p = self.lattice_position();
        [p[0] / patch_scale, p[1] / patch_scale]
    }
}

/// One candidate patch and its blend weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedCell {
    pub id: CellId,
    /// Patch center in texture coordinate space
    pub centroid: [f32; 2],
    pub weight: f32,
}

/// The three candidate patches covering a coordinate.
///
/// Weights are non-negative and sum to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeSample {
    pub cells: [WeightedCell; 3],
    /// Patch scale the decomposition was made with (after clamping)
    pub patch_scale: f32,
}

impl LatticeSample {
    pub fn weights(&self) -> [f32; 3] {
        [self.cells[0].weight, self.cells[1].weight, self.cells[2].weight]
    }

    /// Index of the highest-weight candidate (first one on ties).
    pub fn dominant_index(&self) -> usize {
        let w = self.weights();
        let mut best = 0;
        for i in 1..3 {
            if w[i] > w[best] {
                best = i;
            }
        }
        best
    }

    pub fn dominant(&self) -> &WeightedCell {
        &self.cells[self.dominant_index()]
    }

    /// Weight of a given patch, 0 if it is not a candidate here.
    pub fn weight_of(&self, id: CellId) -> f32 {
        self.cells
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.weight)
            .unwrap_or(0.0)
    }
}

/// Map a scaled coordinate into skewed lattice space (inverse of the basis).
#[inline]
fn to_skewed(u: [f32; 2]) -> [f32; 2] {
    [u[0] - u[1] * INV_SQRT_3, u[1] * TWO_OVER_SQRT_3]
}

/// Clamp to non-negative and renormalize to a unit sum.
#[inline]
fn normalize_weights(raw: [f32; 3]) -> [f32; 3] {
    let w = [raw[0].max(0.0), raw[1].max(0.0), raw[2].max(0.0)];
    let sum = w[0] + w[1] + w[2];
    if sum > WEIGHT_EPSILON {
        [w[0] / sum, w[1] / sum, w[2] / sum]
    } else {
        [1.0, 0.0, 0.0]
    }
}

/// Decompose a texture coordinate into its three candidate hex patches.
///
/// Larger `patch_scale` means more, smaller patches per texture period.
/// Non-positive or non-finite scales are clamped to the smallest accepted
/// value.
pub fn decompose(uv: [f32; 2], patch_scale: f32) -> LatticeSample {
    let scale = if patch_scale.is_finite() {
        patch_scale.max(MIN_PATCH_SCALE)
    } else {
        MIN_PATCH_SCALE
    };

    let v = to_skewed([uv[0] * scale, uv[1] * scale]);
    let bx = v[0].floor();
    let by = v[1].floor();
    let fx = v[0] - bx;
    let fy = v[1] - by;
    let fz = 1.0 - fx - fy;
    let base = CellId::new(bx as i32, by as i32);

    // Lower triangle has its right angle at `base`, upper one at base + (1, 1)
    let (ids, raw) = if fz > 0.0 {
        ([base, base.offset(1, 0), base.offset(0, 1)], [fz, fx, fy])
    } else {
        (
            [base.offset(1, 1), base.offset(1, 0), base.offset(0, 1)],
            [-fz, 1.0 - fy, 1.0 - fx],
        )
    };
    let weights = normalize_weights(raw);

    let cell = |i: usize| WeightedCell {
        id: ids[i],
        centroid: ids[i].centroid(scale),
        weight: weights[i],
    };

    LatticeSample {
        cells: [cell(0), cell(1), cell(2)],
        patch_scale: scale,
    }
}
