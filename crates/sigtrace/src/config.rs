//! Pipeline parameters.
//!
//! Every stage parameter lives here with its default. The two presets,
//! [`SignatureConfig::simple`] and [`SignatureConfig::extended`], differ only
//! in the resize policy, the pre-blur toggle and the median toggle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{
        ClaheEnhancer, ComponentConnector, ContourPathExtractor, GaussianSmoother, MedianDenoiser,
        MorphologicalCloser, AdaptiveGaussianBinarizer, ResizePolicy, SizeNormalizer,
    },
    error::{Result, SignatureError},
};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Smooth with a small Gaussian before equalizing
    pub pre_blur: bool,
    #[schemars(range(min = 1))]
    pub pre_blur_kernel: u32,
    /// CLAHE tiles across and down
    pub tile_grid: [u32; 2],
    pub clip_limit: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            pre_blur: true,
            pre_blur_kernel: 3,
            tile_grid: [8, 8],
            clip_limit: 2.0,
        }
    }
}

impl EnhanceConfig {
    pub fn smoother(&self) -> Option<GaussianSmoother> {
        self.pre_blur.then(|| GaussianSmoother {
            kernel_size: self.pre_blur_kernel,
        })
    }

    pub fn clahe(&self) -> ClaheEnhancer {
        ClaheEnhancer {
            tile_grid: self.tile_grid,
            clip_limit: self.clip_limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Side of the Gaussian neighbourhood, odd
    #[schemars(range(min = 1))]
    pub window: u32,
    /// Subtracted from the local mean
    pub offset: f32,
    /// Median-filter the mask right after thresholding
    pub median_denoise: bool,
    #[schemars(range(min = 1))]
    pub median_window: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            window: 11,
            offset: 2.0,
            median_denoise: false,
            median_window: 3,
        }
    }
}

impl ThresholdConfig {
    pub fn binarizer(&self) -> AdaptiveGaussianBinarizer {
        AdaptiveGaussianBinarizer {
            window: self.window,
            offset: self.offset,
        }
    }

    pub fn denoiser(&self) -> Option<MedianDenoiser> {
        self.median_denoise.then(|| MedianDenoiser {
            window: self.median_window,
        })
    }
}

/// Full set of pipeline parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SignatureConfig {
    pub normalize: SizeNormalizer,
    pub enhance: EnhanceConfig,
    pub threshold: ThresholdConfig,
    pub components: ComponentConnector,
    pub morphology: MorphologicalCloser,
    pub contours: ContourPathExtractor,
}

fn odd(what: &str, value: u32) -> Result<()> {
    if value % 2 == 1 {
        Ok(())
    } else {
        Err(SignatureError::InvalidConfig(format!(
            "{what} must be a positive odd number, got {value}"
        )))
    }
}

fn invalid(message: String) -> Result<()> {
    Err(SignatureError::InvalidConfig(message))
}

impl SignatureConfig {
    /// Downscale-only, no pre-blur, 3x3 median after thresholding
    pub fn simple() -> Self {
        Self {
            enhance: EnhanceConfig {
                pre_blur: false,
                ..EnhanceConfig::default()
            },
            threshold: ThresholdConfig {
                median_denoise: true,
                ..ThresholdConfig::default()
            },
            ..Self::default()
        }
    }

    /// Always fit to the bound, 3x3 pre-blur, no median
    pub fn extended() -> Self {
        Self {
            normalize: SizeNormalizer {
                policy: ResizePolicy::AlwaysFit,
                ..SizeNormalizer::default()
            },
            ..Self::default()
        }
    }

    /// JSON schema of the configuration file format
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SignatureConfig)
    }

    pub fn validate(&self) -> Result<()> {
        if self.normalize.max_dimension == 0 {
            return invalid("max dimension must be positive".to_string());
        }
        if self.enhance.pre_blur {
            odd("blur kernel", self.enhance.pre_blur_kernel)?;
        }
        if self.enhance.tile_grid.contains(&0) {
            return invalid(format!("tile grid must be non-empty, got {:?}", self.enhance.tile_grid));
        }
        if self.enhance.clip_limit.is_nan() || self.enhance.clip_limit <= 0.0 {
            return invalid(format!("clip limit must be positive, got {}", self.enhance.clip_limit));
        }
        odd("threshold window", self.threshold.window)?;
        if !self.threshold.offset.is_finite() {
            return invalid(format!("threshold offset must be finite, got {}", self.threshold.offset));
        }
        if self.threshold.median_denoise {
            odd("median window", self.threshold.median_window)?;
        }
        let bridge = self.components.max_bridge_distance;
        if bridge.is_nan() || bridge < 0.0 {
            return invalid(format!("bridge distance must be non-negative, got {bridge}"));
        }
        if self.morphology.kernel_size == 0 {
            return invalid("morphology kernel must be non-empty".to_string());
        }
        let area = self.contours.min_area;
        if area.is_nan() || area < 0.0 {
            return invalid(format!("contour area must be non-negative, got {area}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_parameters() {
        let config = SignatureConfig::default();
        assert_eq!(config.normalize.max_dimension, 800);
        assert_eq!(config.normalize.policy, ResizePolicy::DownscaleOnly);
        assert_eq!(config.enhance.tile_grid, [8, 8]);
        assert_eq!(config.enhance.clip_limit, 2.0);
        assert_eq!(config.threshold.window, 11);
        assert_eq!(config.threshold.offset, 2.0);
        assert_eq!(config.components.min_area, 20);
        assert_eq!(config.components.max_bridge_distance, 30.0);
        assert_eq!(config.morphology.kernel_size, 2);
        assert_eq!(config.contours.min_area, 10.0);
        config.validate().expect("Defaults should be valid");
    }

    #[test]
    fn test_presets_differ_only_in_toggles() {
        let simple = SignatureConfig::simple();
        let extended = SignatureConfig::extended();

        assert_eq!(simple.normalize.policy, ResizePolicy::DownscaleOnly);
        assert!(simple.enhance.smoother().is_none());
        assert!(simple.threshold.denoiser().is_some());

        assert_eq!(extended.normalize.policy, ResizePolicy::AlwaysFit);
        assert!(extended.enhance.smoother().is_some());
        assert!(extended.threshold.denoiser().is_none());

        assert_eq!(simple.components, extended.components);
        assert_eq!(simple.contours, extended.contours);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut config = SignatureConfig::default();
        config.threshold.window = 10;
        assert!(config.validate().is_err());

        let mut config = SignatureConfig::default();
        config.enhance.tile_grid = [8, 0];
        assert!(config.validate().is_err());

        let mut config = SignatureConfig::default();
        config.components.max_bridge_distance = -5.0;
        assert!(config.validate().is_err());

        // An even median window only matters when the median pass is on
        let mut config = SignatureConfig::default();
        config.threshold.median_window = 4;
        assert!(config.validate().is_ok());
        config.threshold.median_denoise = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: SignatureConfig = toml::from_str(
            r#"
            [normalize]
            policy = "always_fit"

            [components]
            max_bridge_distance = 12.5
            "#,
        )
        .expect("Should parse partial config");

        assert_eq!(config.normalize.policy, ResizePolicy::AlwaysFit);
        assert_eq!(config.normalize.max_dimension, 800);
        assert_eq!(config.components.max_bridge_distance, 12.5);
        assert_eq!(config.components.min_area, 20);
        assert_eq!(config.threshold, ThresholdConfig::default());
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = serde_json::to_value(SignatureConfig::schema()).expect("Should serialize schema");
        let properties = &schema["properties"];
        for section in ["normalize", "enhance", "threshold", "components", "morphology", "contours"] {
            assert!(properties.get(section).is_some(), "missing {section}");
        }
    }
}
