use image::GrayImage;
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::debug;

use crate::{
    algorithms::enhancement::{check_odd_window, gaussian_kernel},
    error::Result,
    traits::{Binarizer, MaskStage},
    types::BinaryMask,
};

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel is ink when it is no brighter than the weighted mean of its
/// `window` x `window` neighbourhood minus `offset`. The result is inverted
/// with respect to the scan: dark ink becomes foreground.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AdaptiveGaussianBinarizer {
    pub window: u32,
    pub offset: f32,
}

impl Default for AdaptiveGaussianBinarizer {
    fn default() -> Self {
        Self {
            window: 11,
            offset: 2.0,
        }
    }
}

impl Binarizer for AdaptiveGaussianBinarizer {
    fn binarize(&self, image: &GrayImage) -> Result<BinaryMask> {
        check_odd_window("threshold window", self.window)?;

        let kernel = gaussian_kernel(self.window);
        let local_mean = imageproc::filter::separable_filter_equal(image, &kernel);

        let mask = BinaryMask::from_fn(image.width(), image.height(), |x, y| {
            let value = image.get_pixel(x, y)[0] as f32;
            let threshold = local_mean.get_pixel(x, y)[0] as f32 - self.offset;
            value <= threshold
        });
        debug!(foreground = mask.foreground_count(), "Binarized raster");
        Ok(mask)
    }
}

/// Median filter over the mask, removing isolated salt-and-pepper pixels
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MedianDenoiser {
    pub window: u32,
}

impl Default for MedianDenoiser {
    fn default() -> Self {
        Self { window: 3 }
    }
}

impl MaskStage for MedianDenoiser {
    fn apply(&self, mask: &BinaryMask) -> Result<BinaryMask> {
        check_odd_window("median window", self.window)?;
        let radius = self.window / 2;
        // The median of two-valued samples is one of those values
        let filtered = imageproc::filter::median_filter(mask.as_image(), radius, radius);
        Ok(BinaryMask::from_gray(&filtered))
    }

    fn name(&self) -> &'static str {
        "median"
    }
}
