//! Sample selection and blending.
//!
//! Blending happens in two steps so several textures can share the lattice
//! work of a pixel:
//!
//! 1. [`plan`] turns a lattice decomposition into a [`SamplePlan`]: the
//!    transformed sample coordinate of every candidate, which candidates are
//!    worth a texture lookup, and their renormalized weights.
//! 2. [`blend`] performs the lookups a plan asks for on one texture and
//!    composites them, either as a plain weighted average or with the
//!    contrast-preserving blend from Neyret's tile-breaking shader
//!    (<https://www.shadertoy.com/view/4dcSDr>).

use crate::hash::cell_transform;
use crate::lattice::{decompose, LatticeSample};
use crate::params::HexTilingConfig;
use crate::texture::{Rgba, Texture};

/// Retained weight sums below this fall back to the single dominant sample
const MIN_RETAINED_WEIGHT: f32 = 1e-6;

/// Which lookups to perform for one pixel and how to weight them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplePlan {
    /// Transformed coordinate for each candidate
    pub uvs: [[f32; 2]; 3],
    /// Blend weights renormalized over the retained candidates, 0 for skipped ones
    pub weights: [f32; 3],
    pub retained: [bool; 3],
    pub contrast_corrected: bool,
}

impl SamplePlan {
    pub fn lookups(&self) -> u8 {
        self.retained.iter().filter(|&&r| r).count() as u8
    }
}

/// Result of blending one texture at one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendOutput {
    pub color: Rgba,
    /// Texture lookups actually performed (1..=3)
    pub lookups: u8,
}

/// Decide which candidates to sample.
///
/// Each weight is raised to the coefficient exponent and the results are
/// normalized to sum to 1. Candidates whose coefficient falls below the skip
/// threshold are dropped and the remaining blend weights are renormalized,
/// so skipping redistributes weight rather than darkening the result. If
/// nothing survives, the dominant candidate is kept alone.
///
/// The contrast-preserving blend weights by the coefficients themselves, so
/// the exponent sharpens or softens cell borders. The plain average uses the
/// lattice weights. The config is clamped to its valid ranges first.
pub fn plan(uv: [f32; 2], lattice: &LatticeSample, config: &HexTilingConfig) -> SamplePlan {
    let config = config.clamped();
    let weights = lattice.weights();
    let exponent = config.texture_sample_coefficient_exponent;

    let mut coefficients = weights.map(|w| w.max(0.0).powf(exponent));
    let coefficient_sum: f32 = coefficients.iter().sum();
    if coefficient_sum > 0.0 && coefficient_sum.is_finite() {
        for c in coefficients.iter_mut() {
            *c /= coefficient_sum;
        }
    } else {
        coefficients = [0.0; 3];
    }

    let mut retained = [false; 3];
    for i in 0..3 {
        retained[i] = coefficients[i] >= config.lookup_skip_threshold;
    }

    let blend_weights = if config.use_contrast_corrected_blending { coefficients } else { weights };
    let retained_sum: f32 = (0..3).filter(|&i| retained[i]).map(|i| blend_weights[i]).sum();
    let mut normalized = [0.0f32; 3];
    if retained_sum >= MIN_RETAINED_WEIGHT {
        for i in 0..3 {
            if retained[i] {
                normalized[i] = blend_weights[i] / retained_sum;
            }
        }
    } else {
        let dominant = lattice.dominant_index();
        retained = [false; 3];
        retained[dominant] = true;
        normalized[dominant] = 1.0;
    }

    let mut uvs = [uv; 3];
    for i in 0..3 {
        if retained[i] {
            let cell = &lattice.cells[i];
            uvs[i] = cell_transform(cell.id, lattice.patch_scale).apply(uv);
        }
    }

    SamplePlan {
        uvs,
        weights: normalized,
        retained,
        contrast_corrected: config.use_contrast_corrected_blending,
    }
}

/// Perform the lookups of `plan` on `texture` and composite them.
pub fn blend<T: Texture + ?Sized>(texture: &T, plan: &SamplePlan) -> BlendOutput {
    let lookups = plan.lookups();

    // A lone sample skips the blend but gets the same clamp
    if lookups == 1 {
        let i = plan.retained.iter().position(|&r| r).unwrap_or(0);
        let color = texture.sample(plan.uvs[i]).map(|c| c.clamp(0.0, 1.0));
        return BlendOutput { color, lookups };
    }

    let color_space = texture.color_space();
    let mut samples = [[0.0f32; 4]; 3];
    for i in 0..3 {
        if plan.retained[i] {
            samples[i] = color_space.decode(texture.sample(plan.uvs[i]));
        }
    }

    let linear = if plan.contrast_corrected {
        contrast_preserving(&samples, &plan.weights, texture.mean())
    } else {
        weighted_average(&samples, &plan.weights)
    };

    let clamped = linear.map(|c| c.clamp(0.0, 1.0));
    BlendOutput { color: color_space.encode(clamped), lookups }
}

/// Plain weighted average. Weights already sum to 1.
fn weighted_average(samples: &[Rgba; 3], weights: &[f32; 3]) -> Rgba {
    let mut out = [0.0f32; 4];
    for i in 0..3 {
        for c in 0..4 {
            out[c] += weights[i] * samples[i][c];
        }
    }
    out
}

/// Blend deviations from the texture mean and rescale them by the weight
/// norm, so the blended signal keeps the variance of a single sample.
fn contrast_preserving(samples: &[Rgba; 3], weights: &[f32; 3], mean: Rgba) -> Rgba {
    let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
    if norm < MIN_RETAINED_WEIGHT {
        return weighted_average(samples, weights);
    }

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let mut deviation = 0.0;
        for i in 0..3 {
            deviation += weights[i] * (samples[i][c] - mean[c]);
        }
        out[c] = mean[c] + deviation / norm;
    }
    out
}

/// Detiled lookup of `texture` at `uv`.
pub fn evaluate<T: Texture + ?Sized>(texture: &T, uv: [f32; 2], config: &HexTilingConfig) -> Rgba {
    evaluate_with_stats(texture, uv, config).color
}

/// Like [`evaluate`], also reporting how many lookups were made.
pub fn evaluate_with_stats<T: Texture + ?Sized>(
    texture: &T,
    uv: [f32; 2],
    config: &HexTilingConfig,
) -> BlendOutput {
    let config = config.clamped();
    let lattice = decompose(uv, config.patch_scale);
    blend(texture, &plan(uv, &lattice, &config))
}
