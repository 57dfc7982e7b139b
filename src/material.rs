//! Multi-channel surface material with hex tiling.
//!
//! A material owns its resolved tiling configuration and up to four texture
//! channels. Shading a pixel decomposes the coordinate once and reuses that
//! sample plan for every channel that is present; absent channels are simply
//! never sampled.

use crate::blend::{blend, plan, SamplePlan};
use crate::lattice::decompose;
use crate::params::{HexTilingConfig, HexTilingParams};
use crate::texture::{Rgba, Texture};

/// Per-pixel surface values. `None` for channels the material does not have.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceSample {
    pub base_color: Option<Rgba>,
    /// Unit tangent-space normal
    pub normal: Option<[f32; 3]>,
    pub roughness: Option<f32>,
    pub metalness: Option<f32>,
    /// Texture lookups made across all channels
    pub lookups: u32,
}

/// A texture channel of a material. Channels may be of different texture types.
pub type Channel = Box<dyn Texture + Send + Sync>;

/// Textured material whose lookups go through the hex tiling blend.
///
/// Built without tiling parameters it samples every channel directly, which
/// reproduces plain repeated tiling.
pub struct HexTiledMaterial {
    tiling: Option<HexTilingConfig>,
    pub base_color: Option<Channel>,
    pub normal: Option<Channel>,
    /// Roughness is read from the green channel
    pub roughness: Option<Channel>,
    /// Metalness is read from the blue channel
    pub metalness: Option<Channel>,
}

impl HexTiledMaterial {
    /// Material with hex tiling. Parameters are resolved here, once.
    pub fn new(params: &HexTilingParams) -> Self {
        Self::with_config(params.resolve())
    }

    pub fn with_config(config: HexTilingConfig) -> Self {
        Self {
            tiling: Some(config),
            base_color: None,
            normal: None,
            roughness: None,
            metalness: None,
        }
    }

    /// Material that samples its channels without hex tiling.
    pub fn plain() -> Self {
        Self {
            tiling: None,
            base_color: None,
            normal: None,
            roughness: None,
            metalness: None,
        }
    }

    pub fn base_color_map(mut self, texture: impl Texture + Send + Sync + 'static) -> Self {
        self.base_color = Some(Box::new(texture));
        self
    }

    pub fn normal_map(mut self, texture: impl Texture + Send + Sync + 'static) -> Self {
        self.normal = Some(Box::new(texture));
        self
    }

    pub fn roughness_map(mut self, texture: impl Texture + Send + Sync + 'static) -> Self {
        self.roughness = Some(Box::new(texture));
        self
    }

    pub fn metalness_map(mut self, texture: impl Texture + Send + Sync + 'static) -> Self {
        self.metalness = Some(Box::new(texture));
        self
    }

    pub fn tiling(&self) -> Option<&HexTilingConfig> {
        self.tiling.as_ref()
    }

    /// Sample every present channel at `uv`.
    pub fn shade(&self, uv: [f32; 2]) -> SurfaceSample {
        let channels = [&self.base_color, &self.normal, &self.roughness, &self.metalness];
        if channels.iter().all(|c| c.is_none()) {
            return SurfaceSample::default();
        }

        let sample_plan = self.tiling.as_ref().map(|config| {
            let lattice = decompose(uv, config.patch_scale);
            plan(uv, &lattice, config)
        });

        let mut lookups = 0u32;
        let mut lookup = |texture: &Channel| -> Rgba {
            let (color, n) = sample_channel(texture.as_ref(), uv, sample_plan.as_ref());
            lookups += n as u32;
            color
        };

        let base_color = self.base_color.as_ref().map(&mut lookup);
        let normal = self.normal.as_ref().map(&mut lookup).map(decode_normal);
        let roughness = self.roughness.as_ref().map(&mut lookup).map(|c| c[1]);
        let metalness = self.metalness.as_ref().map(&mut lookup).map(|c| c[2]);

        SurfaceSample { base_color, normal, roughness, metalness, lookups }
    }
}

fn sample_channel(texture: &dyn Texture, uv: [f32; 2], sample_plan: Option<&SamplePlan>) -> (Rgba, u8) {
    match sample_plan {
        Some(p) => {
            let out = blend(texture, p);
            (out.color, out.lookups)
        }
        None => (texture.sample(uv), 1),
    }
}

/// Unpack a normal map texel from 0..1 to a unit vector.
///
/// Blending shortens normals, so the result is always renormalized. A
/// degenerate texel decodes to the unperturbed normal.
pub fn decode_normal(texel: Rgba) -> [f32; 3] {
    let n = [texel[0] * 2.0 - 1.0, texel[1] * 2.0 - 1.0, texel[2] * 2.0 - 1.0];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-6 && len.is_finite() {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}
