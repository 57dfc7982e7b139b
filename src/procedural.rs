//! Seamless procedural texture for demos and profiling.
//!
//! Noise is sampled on a torus embedded in 4D, so the result wraps exactly in
//! both directions and is a fair stand-in for an artist-made tileable map:
//! plain repetition of it is clearly visible, which is what hex tiling has to
//! hide.

use image::{Rgba, RgbaImage};
use noise::{NoiseFn, Perlin, Seedable};
use std::f64::consts::TAU;

use crate::texture::{ColorSpace, ImageTexture};

/// Look of the generated texture.
#[derive(Clone, Debug, PartialEq)]
pub struct ProceduralConfig {
    /// Edge length in texels
    pub size: u32,
    /// Base noise frequency (features per period)
    pub frequency: f64,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    /// Color of low noise values (sRGB, 0..1)
    pub dark: [f32; 3],
    /// Color of high noise values (sRGB, 0..1)
    pub light: [f32; 3],
    /// Tint mixed into patches picked by a second noise layer
    pub accent: [f32; 3],
}

impl Default for ProceduralConfig {
    fn default() -> Self {
        Self {
            size: 256,
            frequency: 3.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            dark: [0.22, 0.18, 0.15],
            light: [0.72, 0.66, 0.58],
            accent: [0.32, 0.42, 0.18],
        }
    }
}

/// Fractal noise on a 4D torus point.
fn fbm_noise_4d(noise: &impl NoiseFn<f64, 4>, p: [f64; 4], octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([p[0] * frequency, p[1] * frequency, p[2] * frequency, p[3] * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if max_value > 0.0 {
        total / max_value
    } else {
        0.0
    }
}

/// Map a point of the unit square onto a torus of the given radius.
#[inline]
fn torus_point(u: f64, v: f64, radius: f64) -> [f64; 4] {
    let (su, cu) = (u * TAU).sin_cos();
    let (sv, cv) = (v * TAU).sin_cos();
    [cu * radius, su * radius, cv * radius, sv * radius]
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Generate the texture as an 8-bit sRGB image.
pub fn generate_image(config: &ProceduralConfig, seed: u64) -> RgbaImage {
    let base = Perlin::new(1).set_seed(seed as u32);
    let accent = Perlin::new(1).set_seed((seed as u32).wrapping_add(7777));
    let radius = config.frequency / TAU;
    let size = config.size.max(1);

    RgbaImage::from_fn(size, size, |x, y| {
        let u = x as f64 / size as f64;
        let v = y as f64 / size as f64;

        let n = fbm_noise_4d(&base, torus_point(u, v, radius), config.octaves, config.persistence, config.lacunarity);
        // Sharper contrast than raw fbm so repetition is easy to spot
        let t = ((n * 1.6 + 0.5).clamp(0.0, 1.0)) as f32;
        let mut color = lerp3(config.dark, config.light, t);

        let a = accent.get(torus_point(u, v, radius * 0.5));
        let patch = (((a - 0.1) * 3.0).clamp(0.0, 1.0)) as f32;
        color = lerp3(color, config.accent, patch * 0.7);

        Rgba([
            (color[0].clamp(0.0, 1.0) * 255.0).round() as u8,
            (color[1].clamp(0.0, 1.0) * 255.0).round() as u8,
            (color[2].clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ])
    })
}

/// Generate the texture ready for sampling.
pub fn generate_texture(config: &ProceduralConfig, seed: u64) -> Option<ImageTexture> {
    ImageTexture::from_rgba8(&generate_image(config, seed), ColorSpace::Srgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ProceduralConfig {
        ProceduralConfig {
            size: 32,
            ..ProceduralConfig::default()
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = generate_image(&small(), 42);
        let b = generate_image(&small(), 42);
        assert_eq!(a.as_raw(), b.as_raw());

        let c = generate_image(&small(), 43);
        assert_ne!(a.as_raw(), c.as_raw());
    }

    #[test]
    fn test_wraps_seamlessly() {
        // The torus mapping makes u = 0 and u = 1 the same point
        let radius = 3.0 / TAU;
        let base = Perlin::new(1).set_seed(5);
        let a = fbm_noise_4d(&base, torus_point(0.0, 0.3, radius), 4, 0.5, 2.0);
        let b = fbm_noise_4d(&base, torus_point(1.0, 0.3, radius), 4, 0.5, 2.0);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_has_contrast() {
        let img = generate_image(&small(), 1);
        let min = img.pixels().map(|p| p[0]).min().unwrap();
        let max = img.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 40);
    }

    #[test]
    fn test_texture_is_srgb() {
        let tex = generate_texture(&small(), 9).unwrap();
        assert_eq!(crate::texture::Texture::color_space(&tex), ColorSpace::Srgb);
        assert_eq!(tex.width, 32);
    }
}
