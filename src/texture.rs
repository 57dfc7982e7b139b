//! Texture lookup with repeat addressing.
//!
//! The detiling code only ever needs three things from a texture: a filtered
//! sample at a continuous coordinate (wrapping in both axes), the mean color
//! of the whole texture, and whether its values are sRGB-encoded.

use image::{DynamicImage, RgbaImage};

/// RGBA color with channels in 0..1. RGB sources carry alpha 1.
pub type Rgba = [f32; 4];

/// Gamma used for the sRGB <-> linear approximation.
const GAMMA: f32 = 2.2;

/// Encoding of the values a texture returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorSpace {
    /// Color data (albedo maps). Blended in linear light.
    Srgb,
    /// Non-color data (normal, roughness, metalness maps).
    #[default]
    Linear,
}

impl ColorSpace {
    /// Convert an encoded color to linear light. Alpha is left untouched.
    #[inline]
    pub fn decode(self, c: Rgba) -> Rgba {
        match self {
            ColorSpace::Srgb => [
                c[0].max(0.0).powf(GAMMA),
                c[1].max(0.0).powf(GAMMA),
                c[2].max(0.0).powf(GAMMA),
                c[3],
            ],
            ColorSpace::Linear => c,
        }
    }

    /// Convert a linear color back to this encoding. Alpha is left untouched.
    #[inline]
    pub fn encode(self, c: Rgba) -> Rgba {
        match self {
            ColorSpace::Srgb => [
                c[0].max(0.0).powf(1.0 / GAMMA),
                c[1].max(0.0).powf(1.0 / GAMMA),
                c[2].max(0.0).powf(1.0 / GAMMA),
                c[3],
            ],
            ColorSpace::Linear => c,
        }
    }
}

/// A texture addressable by continuous coordinate under repeat addressing.
///
/// One texture period spans `0..1` in both axes; coordinates outside that
/// range wrap.
pub trait Texture {
    /// Filtered sample at `uv`, in the texture's own encoding.
    fn sample(&self, uv: [f32; 2]) -> Rgba;

    /// Mean color over the whole texture, in linear light.
    fn mean(&self) -> Rgba;

    fn color_space(&self) -> ColorSpace {
        ColorSpace::Linear
    }
}

impl<T: Texture + ?Sized> Texture for &T {
    fn sample(&self, uv: [f32; 2]) -> Rgba {
        (**self).sample(uv)
    }

    fn mean(&self) -> Rgba {
        (**self).mean()
    }

    fn color_space(&self) -> ColorSpace {
        (**self).color_space()
    }
}

/// A texture with the same value everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidTexture {
    pub color: Rgba,
    pub color_space: ColorSpace,
}

impl SolidTexture {
    pub fn new(color: Rgba) -> Self {
        Self { color, color_space: ColorSpace::Linear }
    }

    pub fn srgb(color: Rgba) -> Self {
        Self { color, color_space: ColorSpace::Srgb }
    }
}

impl Texture for SolidTexture {
    fn sample(&self, _uv: [f32; 2]) -> Rgba {
        self.color
    }

    fn mean(&self) -> Rgba {
        self.color_space.decode(self.color)
    }

    fn color_space(&self) -> ColorSpace {
        self.color_space
    }
}

/// A texel grid sampled bilinearly with wrapping in both axes.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    pub width: usize,
    pub height: usize,
    texels: Vec<Rgba>,
    color_space: ColorSpace,
    mean: Rgba,
}

impl ImageTexture {
    /// Build from row-major texels. Returns `None` when the dimensions are
    /// zero or do not match the texel count.
    pub fn from_texels(
        width: usize,
        height: usize,
        texels: Vec<Rgba>,
        color_space: ColorSpace,
    ) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != width * height {
            return None;
        }
        let mean = linear_mean(&texels, color_space);
        Some(Self { width, height, texels, color_space, mean })
    }

    /// Build from an 8-bit RGBA image.
    pub fn from_rgba8(img: &RgbaImage, color_space: ColorSpace) -> Option<Self> {
        let texels = img
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self::from_texels(img.width() as usize, img.height() as usize, texels, color_space)
    }

    /// Build from any decoded image (RGB images get alpha 1).
    pub fn from_image(img: &DynamicImage, color_space: ColorSpace) -> Option<Self> {
        Self::from_rgba8(&img.to_rgba8(), color_space)
    }

    #[inline]
    fn texel(&self, x: i32, y: i32) -> Rgba {
        let tx = x.rem_euclid(self.width as i32) as usize;
        let ty = y.rem_euclid(self.height as i32) as usize;
        self.texels[ty * self.width + tx]
    }
}

impl Texture for ImageTexture {
    fn sample(&self, uv: [f32; 2]) -> Rgba {
        // Texel centers sit at half-integer positions
        let x = uv[0] * self.width as f32 - 0.5;
        let y = uv[1] * self.height as f32 - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        // Large coordinates lose the fractional part entirely; keep the lookup finite
        let (x0, y0) = (x0 as i32, y0 as i32);

        let v00 = self.texel(x0, y0);
        let v10 = self.texel(x0 + 1, y0);
        let v01 = self.texel(x0, y0 + 1);
        let v11 = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0f32; 4];
        for c in 0..4 {
            let v0 = v00[c] * (1.0 - fx) + v10[c] * fx;
            let v1 = v01[c] * (1.0 - fx) + v11[c] * fx;
            out[c] = v0 * (1.0 - fy) + v1 * fy;
        }
        out
    }

    fn mean(&self) -> Rgba {
        self.mean
    }

    fn color_space(&self) -> ColorSpace {
        self.color_space
    }
}

/// Average of all texels in linear light, accumulated in f64.
fn linear_mean(texels: &[Rgba], color_space: ColorSpace) -> Rgba {
    let mut sum = [0.0f64; 4];
    for &t in texels {
        let lin = color_space.decode(t);
        for c in 0..4 {
            sum[c] += lin[c] as f64;
        }
    }
    let n = texels.len().max(1) as f64;
    [
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
        (sum[3] / n) as f32,
    ]
}

/// Convert a color in 0..1 to 8-bit RGBA.
#[inline]
pub fn to_rgba8(c: Rgba) -> [u8; 4] {
    [
        (c[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_2x2() -> ImageTexture {
        let texels = vec![
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        ImageTexture::from_texels(2, 2, texels, ColorSpace::Linear).unwrap()
    }

    #[test]
    fn test_sample_hits_texel_centers() {
        let tex = checker_2x2();
        assert_eq!(tex.sample([0.25, 0.25]), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(tex.sample([0.75, 0.25]), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sample_wraps_both_axes() {
        let tex = checker_2x2();
        assert_eq!(tex.sample([0.25, 0.25]), tex.sample([3.25, -1.75]));
        assert_eq!(tex.sample([0.75, 0.25]), tex.sample([-0.25, 5.25]));
    }

    #[test]
    fn test_bilinear_midpoint() {
        let tex = checker_2x2();
        // Texel corner: equal mix of all four texels
        let c = tex.sample([0.5, 0.5]);
        assert!((c[0] - 0.5).abs() < 1e-6);
        assert!((c[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean() {
        let tex = checker_2x2();
        let m = tex.mean();
        assert!((m[0] - 0.5).abs() < 1e-6);
        assert!((m[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_srgb_mean_is_linear() {
        let texels = vec![[0.5, 0.5, 0.5, 1.0]; 4];
        let tex = ImageTexture::from_texels(2, 2, texels, ColorSpace::Srgb).unwrap();
        let expected = 0.5f32.powf(2.2);
        assert!((tex.mean()[0] - expected).abs() < 1e-6);
        assert_eq!(tex.mean()[3], 1.0);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(ImageTexture::from_texels(0, 2, vec![], ColorSpace::Linear).is_none());
        assert!(ImageTexture::from_texels(2, 2, vec![[0.0; 4]; 3], ColorSpace::Linear).is_none());
    }

    #[test]
    fn test_from_rgb_image_has_opaque_alpha() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0])));
        let tex = ImageTexture::from_image(&img, ColorSpace::Srgb).unwrap();
        let c = tex.sample([0.3, 0.6]);
        assert!((c[0] - 1.0).abs() < 1e-6);
        assert_eq!(c[1], 0.0);
        assert!((c[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gamma_round_trip() {
        let c = [0.2, 0.5, 0.9, 0.4];
        let back = ColorSpace::Srgb.encode(ColorSpace::Srgb.decode(c));
        for i in 0..4 {
            assert!((back[i] - c[i]).abs() < 1e-5);
        }
        assert_eq!(ColorSpace::Srgb.decode(c)[3], 0.4);
    }

    #[test]
    fn test_to_rgba8_clamps() {
        assert_eq!(to_rgba8([-0.5, 0.5, 2.0, 1.0]), [0, 128, 255, 255]);
    }
}
