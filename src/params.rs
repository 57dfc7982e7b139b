//! Hex tiling parameters and their resolution to a concrete configuration.
//!
//! `HexTilingParams` is the user-facing form: every field optional, loadable
//! from camelCase JSON. It is resolved once into a `HexTilingConfig` whose
//! fields are all present and clamped to their valid ranges. Evaluation only
//! ever sees the resolved form.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DetileError;

/// Smallest accepted patch scale
pub const MIN_PATCH_SCALE: f32 = 1e-4;
pub const MAX_SKIP_THRESHOLD: f32 = 0.5;
pub const MIN_COEFFICIENT_EXPONENT: f32 = 0.5;
pub const MAX_COEFFICIENT_EXPONENT: f32 = 32.0;

/// Partially specified parameters. Missing fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HexTilingParams {
    /// Density of the hex lattice. Larger values create smaller cells.
    /// Usually between 0.1 and 16 depending on the texture. (default: 2)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_scale: Option<f32>,

    /// Blend with mean-subtracted, variance-preserving weights instead of a
    /// plain average. Keeps contrast at cell borders but can create very
    /// bright or dark patches on high-contrast textures. (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_contrast_corrected_blending: Option<bool>,

    /// Normalized coefficient under which a texture lookup is skipped.
    /// (default: 0.01, range 0..=0.5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_skip_threshold: Option<f32>,

    /// Exponent applied to the blend weights before comparing against the
    /// skip threshold. Higher values skip more lookups.
    /// (default: 8, range 0.5..=32)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_sample_coefficient_exponent: Option<f32>,
}

/// Fully resolved, immutable tiling configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexTilingConfig {
    pub patch_scale: f32,
    pub use_contrast_corrected_blending: bool,
    pub lookup_skip_threshold: f32,
    pub texture_sample_coefficient_exponent: f32,
}

impl Default for HexTilingConfig {
    fn default() -> Self {
        Self {
            patch_scale: 2.0,
            use_contrast_corrected_blending: true,
            lookup_skip_threshold: 0.01,
            texture_sample_coefficient_exponent: 8.0,
        }
    }
}

impl HexTilingConfig {
    /// Plain weighted averaging, otherwise defaults.
    pub fn plain_blend() -> Self {
        Self {
            use_contrast_corrected_blending: false,
            ..Default::default()
        }
    }

    /// Never skip a lookup.
    pub fn exhaustive() -> Self {
        Self {
            lookup_skip_threshold: 0.0,
            ..Default::default()
        }
    }

    /// Same config with every field forced into its valid range.
    ///
    /// Configs built through `resolve` are already in range and come back
    /// unchanged. Struct literals can carry anything, so evaluation goes
    /// through this before using a config.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            patch_scale: clamp_field(self.patch_scale, defaults.patch_scale, MIN_PATCH_SCALE, f32::MAX),
            use_contrast_corrected_blending: self.use_contrast_corrected_blending,
            lookup_skip_threshold: clamp_field(
                self.lookup_skip_threshold,
                defaults.lookup_skip_threshold,
                0.0,
                MAX_SKIP_THRESHOLD,
            ),
            texture_sample_coefficient_exponent: clamp_field(
                self.texture_sample_coefficient_exponent,
                defaults.texture_sample_coefficient_exponent,
                MIN_COEFFICIENT_EXPONENT,
                MAX_COEFFICIENT_EXPONENT,
            ),
        }
    }

    pub fn with_patch_scale(self, patch_scale: f32) -> Self {
        HexTilingParams::from(self)
            .patch_scale(patch_scale)
            .resolve()
    }
}

/// A parameter value that was replaced during resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamAdjustment {
    pub field: &'static str,
    pub given: f32,
    pub used: f32,
}

impl std::fmt::Display for ParamAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} is out of range, using {}", self.field, self.given, self.used)
    }
}

impl HexTilingParams {
    /// Parse parameters from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DetileError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DetileError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn patch_scale(mut self, value: f32) -> Self {
        self.patch_scale = Some(value);
        self
    }

    pub fn contrast_corrected(mut self, value: bool) -> Self {
        self.use_contrast_corrected_blending = Some(value);
        self
    }

    pub fn lookup_skip_threshold(mut self, value: f32) -> Self {
        self.lookup_skip_threshold = Some(value);
        self
    }

    pub fn coefficient_exponent(mut self, value: f32) -> Self {
        self.texture_sample_coefficient_exponent = Some(value);
        self
    }

    /// Fill unset fields from `fallback`. Fields already set win.
    pub fn or(self, fallback: HexTilingParams) -> Self {
        Self {
            patch_scale: self.patch_scale.or(fallback.patch_scale),
            use_contrast_corrected_blending: self
                .use_contrast_corrected_blending
                .or(fallback.use_contrast_corrected_blending),
            lookup_skip_threshold: self.lookup_skip_threshold.or(fallback.lookup_skip_threshold),
            texture_sample_coefficient_exponent: self
                .texture_sample_coefficient_exponent
                .or(fallback.texture_sample_coefficient_exponent),
        }
    }

    /// Resolve to a concrete configuration, clamping invalid values.
    pub fn resolve(&self) -> HexTilingConfig {
        self.resolve_with_report().0
    }

    /// Resolve and list every value that had to be replaced.
    pub fn resolve_with_report(&self) -> (HexTilingConfig, Vec<ParamAdjustment>) {
        let defaults = HexTilingConfig::default();
        let mut adjustments = Vec::new();

        let patch_scale = resolve_field(
            "patchScale",
            self.patch_scale,
            defaults.patch_scale,
            MIN_PATCH_SCALE,
            f32::MAX,
            &mut adjustments,
        );
        let lookup_skip_threshold = resolve_field(
            "lookupSkipThreshold",
            self.lookup_skip_threshold,
            defaults.lookup_skip_threshold,
            0.0,
            MAX_SKIP_THRESHOLD,
            &mut adjustments,
        );
        let texture_sample_coefficient_exponent = resolve_field(
            "textureSampleCoefficientExponent",
            self.texture_sample_coefficient_exponent,
            defaults.texture_sample_coefficient_exponent,
            MIN_COEFFICIENT_EXPONENT,
            MAX_COEFFICIENT_EXPONENT,
            &mut adjustments,
        );

        let config = HexTilingConfig {
            patch_scale,
            use_contrast_corrected_blending: self
                .use_contrast_corrected_blending
                .unwrap_or(defaults.use_contrast_corrected_blending),
            lookup_skip_threshold,
            texture_sample_coefficient_exponent,
        };
        (config, adjustments)
    }
}

impl From<HexTilingConfig> for HexTilingParams {
    fn from(config: HexTilingConfig) -> Self {
        Self {
            patch_scale: Some(config.patch_scale),
            use_contrast_corrected_blending: Some(config.use_contrast_corrected_blending),
            lookup_skip_threshold: Some(config.lookup_skip_threshold),
            texture_sample_coefficient_exponent: Some(config.texture_sample_coefficient_exponent),
        }
    }
}

/// Non-finite values fall back to the default; finite ones clamp to range.
fn resolve_field(
    field: &'static str,
    given: Option<f32>,
    default: f32,
    min: f32,
    max: f32,
    adjustments: &mut Vec<ParamAdjustment>,
) -> f32 {
    let Some(value) = given else {
        return default;
    };
    let used = clamp_field(value, default, min, max);
    if used != value {
        adjustments.push(ParamAdjustment { field, given: value, used });
    }
    used
}

fn clamp_field(value: f32, default: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HexTilingParams::default().resolve();
        assert_eq!(config, HexTilingConfig::default());
        assert_eq!(config.patch_scale, 2.0);
        assert!(config.use_contrast_corrected_blending);
        assert_eq!(config.lookup_skip_threshold, 0.01);
        assert_eq!(config.texture_sample_coefficient_exponent, 8.0);
    }

    #[test]
    fn test_partial_json_uses_per_field_defaults() {
        let params = HexTilingParams::from_json(r#"{ "patchScale": 6, "useContrastCorrectedBlending": false }"#)
            .unwrap();
        let config = params.resolve();
        assert_eq!(config.patch_scale, 6.0);
        assert!(!config.use_contrast_corrected_blending);
        assert_eq!(config.lookup_skip_threshold, 0.01);
        assert_eq!(config.texture_sample_coefficient_exponent, 8.0);
    }

    #[test]
    fn test_empty_json_object() {
        let params = HexTilingParams::from_json("{}").unwrap();
        assert_eq!(params, HexTilingParams::default());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(HexTilingParams::from_json(r#"{ "patchScale": "big" }"#).is_err());
    }

    #[test]
    fn test_clamping() {
        let (config, adjustments) = HexTilingParams::default()
            .patch_scale(-3.0)
            .lookup_skip_threshold(0.9)
            .coefficient_exponent(100.0)
            .resolve_with_report();
        assert_eq!(config.patch_scale, MIN_PATCH_SCALE);
        assert_eq!(config.lookup_skip_threshold, MAX_SKIP_THRESHOLD);
        assert_eq!(config.texture_sample_coefficient_exponent, MAX_COEFFICIENT_EXPONENT);
        assert_eq!(adjustments.len(), 3);
        assert_eq!(adjustments[0].field, "patchScale");
    }

    #[test]
    fn test_non_finite_falls_back_to_default() {
        let (config, adjustments) = HexTilingParams::default()
            .patch_scale(f32::NAN)
            .coefficient_exponent(f32::INFINITY)
            .resolve_with_report();
        assert_eq!(config.patch_scale, 2.0);
        assert_eq!(config.texture_sample_coefficient_exponent, 8.0);
        assert_eq!(adjustments.len(), 2);
    }

    #[test]
    fn test_valid_values_not_reported() {
        let (_, adjustments) = HexTilingParams::default()
            .patch_scale(0.02)
            .lookup_skip_threshold(0.0)
            .coefficient_exponent(0.5)
            .resolve_with_report();
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_or_prefers_set_fields() {
        let flags = HexTilingParams::default().patch_scale(4.0);
        let file = HexTilingParams::default().patch_scale(1.0).lookup_skip_threshold(0.1);
        let merged = flags.or(file);
        assert_eq!(merged.patch_scale, Some(4.0));
        assert_eq!(merged.lookup_skip_threshold, Some(0.1));
        assert_eq!(merged.use_contrast_corrected_blending, None);
    }

    #[test]
    fn test_serialized_names_are_camel_case() {
        let json = serde_json::to_string(&HexTilingConfig::default()).unwrap();
        assert!(json.contains("\"patchScale\""));
        assert!(json.contains("\"textureSampleCoefficientExponent\""));
    }

    #[test]
    fn test_with_patch_scale_clamps() {
        let config = HexTilingConfig::default().with_patch_scale(0.0);
        assert_eq!(config.patch_scale, MIN_PATCH_SCALE);
    }

    #[test]
    fn test_clamped_config_literal() {
        let wild = HexTilingConfig {
            patch_scale: f32::NAN,
            use_contrast_corrected_blending: false,
            lookup_skip_threshold: -0.2,
            texture_sample_coefficient_exponent: -1.0,
        };
        let config = wild.clamped();
        assert_eq!(config.patch_scale, 2.0);
        assert!(!config.use_contrast_corrected_blending);
        assert_eq!(config.lookup_skip_threshold, 0.0);
        assert_eq!(config.texture_sample_coefficient_exponent, MIN_COEFFICIENT_EXPONENT);

        let nan_threshold = HexTilingConfig { lookup_skip_threshold: f32::NAN, ..HexTilingConfig::default() };
        assert_eq!(nan_threshold.clamped(), HexTilingConfig::default());
        assert_eq!(HexTilingConfig::exhaustive().clamped(), HexTilingConfig::exhaustive());
    }
}
