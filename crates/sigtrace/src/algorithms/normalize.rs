use image::{imageops::FilterType, GrayImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;

use crate::{error::Result, traits::RasterStage};

/// When the normalizer rescales the input
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResizePolicy {
    /// Rescale only rasters whose longer side exceeds the bound
    #[default]
    DownscaleOnly,
    /// Rescale every raster so its longer side equals the bound, enlarging small ones
    AlwaysFit,
}

/// Uniform rescale bounding the longer side of the raster
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SizeNormalizer {
    #[schemars(range(min = 1))]
    pub max_dimension: u32,
    pub policy: ResizePolicy,
}

impl Default for SizeNormalizer {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            policy: ResizePolicy::DownscaleOnly,
        }
    }
}

impl SizeNormalizer {
    /// Output size for a `width` x `height` input, or `None` when the raster is left untouched.
    pub fn target_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let longer = width.max(height);
        if width == 0 || height == 0 || longer == self.max_dimension {
            return None;
        }
        if self.policy == ResizePolicy::DownscaleOnly && longer < self.max_dimension {
            return None;
        }

        let scale = self.max_dimension as f64 / longer as f64;
        let scaled = |side: u32| {
            if side == longer {
                self.max_dimension
            } else {
                ((side as f64 * scale).round() as u32).max(1)
            }
        };
        Some((scaled(width), scaled(height)))
    }
}

impl RasterStage for SizeNormalizer {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        match self.target_size(image.width(), image.height()) {
            Some((width, height)) => {
                debug!(
                    from = ?image.dimensions(),
                    to = ?(width, height),
                    "Rescaling raster"
                );
                Ok(image::imageops::resize(image, width, height, FilterType::Triangle))
            }
            None => Ok(image.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "normalize"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspect(w: u32, h: u32) -> f64 {
        w as f64 / h as f64
    }

    #[test]
    fn test_large_raster_is_bounded() {
        let normalizer = SizeNormalizer::default();
        let image = GrayImage::new(1600, 1000);

        let resized = normalizer.apply(&image).expect("Should resize");
        assert_eq!(resized.dimensions(), (800, 500));

        let resized = normalizer.apply(&GrayImage::new(333, 1234)).expect("Should resize");
        assert_eq!(resized.height(), 800);
        assert!((aspect(resized.width(), resized.height()) - aspect(333, 1234)).abs() < 0.01);
    }

    #[test]
    fn test_downscale_only_keeps_small_raster() {
        let normalizer = SizeNormalizer::default();
        let image = GrayImage::new(300, 120);

        let result = normalizer.apply(&image).expect("Should pass through");
        assert_eq!(result.dimensions(), (300, 120));
    }

    #[test]
    fn test_always_fit_enlarges_small_raster() {
        let normalizer = SizeNormalizer {
            max_dimension: 800,
            policy: ResizePolicy::AlwaysFit,
        };

        assert_eq!(normalizer.target_size(400, 100), Some((800, 200)));
        assert_eq!(normalizer.target_size(800, 100), None);
    }

    #[test]
    fn test_policy_parses_from_snake_case() {
        let policy: ResizePolicy = "always_fit".parse().expect("Should parse policy");
        assert_eq!(policy, ResizePolicy::AlwaysFit);
        assert_eq!(ResizePolicy::DownscaleOnly.to_string(), "downscale_only");
    }
}
