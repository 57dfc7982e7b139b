//! Surface rendering over an output image.
//!
//! Every output pixel maps to a texture coordinate and is evaluated
//! independently, so rows are filled in parallel with rayon. The result is
//! identical to evaluating pixel by pixel.

use image::{Rgba as Pixel, RgbaImage};
use rayon::prelude::*;
use std::path::Path;

use crate::blend::evaluate_with_stats;
use crate::error::DetileError;
use crate::params::HexTilingConfig;
use crate::texture::{to_rgba8, Texture};

/// Output size and how many texture periods span it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Texture periods across the output width. Pixels stay square, so the
    /// vertical count follows from the aspect ratio.
    pub repeat: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            repeat: 8.0,
        }
    }
}

impl RenderSettings {
    /// Texture coordinate at the center of pixel (x, y).
    #[inline]
    pub fn pixel_uv(&self, x: u32, y: u32) -> [f32; 2] {
        let per_pixel = self.repeat / self.width.max(1) as f32;
        [(x as f32 + 0.5) * per_pixel, (y as f32 + 0.5) * per_pixel]
    }
}

/// Lookup counts gathered during a render
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub pixels: u64,
    pub lookups: u64,
}

impl RenderStats {
    pub fn average_lookups(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.lookups as f64 / self.pixels as f64
        }
    }
}

/// Fill an image in parallel rows. `shade` returns a color and the number of
/// lookups it made.
fn render_with<F>(settings: &RenderSettings, shade: F) -> (RgbaImage, RenderStats)
where
    F: Fn([f32; 2]) -> ([f32; 4], u8) + Sync,
{
    let mut img = RgbaImage::new(settings.width, settings.height);
    if settings.width == 0 || settings.height == 0 {
        return (img, RenderStats::default());
    }

    let row_len = settings.width as usize * 4;
    let lookups: u64 = img
        .par_chunks_mut(row_len)
        .enumerate()
        .map(|(y, row)| {
            let mut row_lookups = 0u64;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let (color, n) = shade(settings.pixel_uv(x as u32, y as u32));
                px.copy_from_slice(&to_rgba8(color));
                row_lookups += n as u64;
            }
            row_lookups
        })
        .sum();

    let stats = RenderStats {
        pixels: settings.width as u64 * settings.height as u64,
        lookups,
    };
    (img, stats)
}

/// Render `texture` with hex tiling.
pub fn render_detiled<T: Texture + Sync + ?Sized>(
    texture: &T,
    settings: &RenderSettings,
    config: &HexTilingConfig,
) -> (RgbaImage, RenderStats) {
    render_with(settings, |uv| {
        let out = evaluate_with_stats(texture, uv, config);
        (out.color, out.lookups)
    })
}

/// Render `texture` with plain repeat tiling, for comparison.
pub fn render_plain<T: Texture + Sync + ?Sized>(texture: &T, settings: &RenderSettings) -> RgbaImage {
    render_with(settings, |uv| (texture.sample(uv), 1)).0
}

/// Place two renders next to each other with a dark gutter between them.
pub fn side_by_side(left: &RgbaImage, right: &RgbaImage, gutter: u32) -> RgbaImage {
    let width = left.width() + gutter + right.width();
    let height = left.height().max(right.height());
    let mut img = RgbaImage::from_pixel(width, height, Pixel([30, 30, 35, 255]));

    for (x, y, px) in left.enumerate_pixels() {
        img.put_pixel(x, y, *px);
    }
    let offset = left.width() + gutter;
    for (x, y, px) in right.enumerate_pixels() {
        img.put_pixel(offset + x, y, *px);
    }
    img
}

/// Save an image, format chosen from the file extension.
pub fn save_image(img: &RgbaImage, path: impl AsRef<Path>) -> Result<(), DetileError> {
    img.save(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::evaluate;
    use crate::texture::{ColorSpace, ImageTexture, SolidTexture};

    fn small_texture() -> ImageTexture {
        let texels = (0..4 * 4)
            .map(|i| {
                let v = (i as f32) / 15.0;
                [v, 1.0 - v, 0.5, 1.0]
            })
            .collect();
        ImageTexture::from_texels(4, 4, texels, ColorSpace::Srgb).unwrap()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let texture = small_texture();
        let config = HexTilingConfig::default();
        let settings = RenderSettings { width: 40, height: 24, repeat: 3.0 };
        let (img, stats) = render_detiled(&texture, &settings, &config);

        assert_eq!(stats.pixels, 40 * 24);
        assert!(stats.lookups >= stats.pixels && stats.lookups <= 3 * stats.pixels);
        for y in 0..settings.height {
            for x in 0..settings.width {
                let expected = to_rgba8(evaluate(&texture, settings.pixel_uv(x, y), &config));
                assert_eq!(img.get_pixel(x, y).0, expected);
            }
        }
    }

    #[test]
    fn test_uniform_render() {
        let texture = SolidTexture::srgb([0.4, 0.6, 0.2, 1.0]);
        let settings = RenderSettings { width: 32, height: 32, repeat: 10.0 };
        let (img, _) = render_detiled(&texture, &settings, &HexTilingConfig::default());
        let expected = to_rgba8([0.4, 0.6, 0.2, 1.0]);
        assert!(img.pixels().all(|p| p.0 == expected));
    }

    #[test]
    fn test_plain_render_repeats() {
        let texture = small_texture();
        // Four texels per period and one period every four pixels
        let settings = RenderSettings { width: 16, height: 8, repeat: 4.0 };
        let img = render_plain(&texture, &settings);
        for y in 0..8 {
            for x in 0..4 {
                assert_eq!(img.get_pixel(x, y), img.get_pixel(x + 4, y));
                assert_eq!(img.get_pixel(x, y), img.get_pixel(x + 12, y));
            }
        }
    }

    #[test]
    fn test_empty_render() {
        let settings = RenderSettings { width: 0, height: 10, repeat: 1.0 };
        let (img, stats) = render_detiled(&small_texture(), &settings, &HexTilingConfig::default());
        assert_eq!(img.width(), 0);
        assert_eq!(stats.average_lookups(), 0.0);
    }

    #[test]
    fn test_side_by_side() {
        let a = RgbaImage::from_pixel(3, 2, Pixel([255, 0, 0, 255]));
        let b = RgbaImage::from_pixel(2, 4, Pixel([0, 255, 0, 255]));
        let img = side_by_side(&a, &b, 1);
        assert_eq!(img.dimensions(), (6, 4));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 0).0, [30, 30, 35, 255]);
        assert_eq!(img.get_pixel(5, 3).0, [0, 255, 0, 255]);
    }
}
