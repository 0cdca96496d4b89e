use image::GrayImage;
use crate::{error::Result, types::{BinaryMask, VectorPath}};

/// Trait for grayscale-to-grayscale stages (resizing, smoothing, contrast)
pub trait RasterStage: Send + Sync {
    /// Produce a new raster from the input
    fn apply(&self, image: &GrayImage) -> Result<GrayImage>;

    /// Short stage name used in logs
    fn name(&self) -> &'static str;
}

/// Trait for binarization algorithms
pub trait Binarizer: Send + Sync {
    /// Split the raster into ink (foreground) and paper (background)
    fn binarize(&self, image: &GrayImage) -> Result<BinaryMask>;
}

/// Trait for mask-to-mask refinement stages
pub trait MaskStage: Send + Sync {
    /// Produce a new mask from the input
    fn apply(&self, mask: &BinaryMask) -> Result<BinaryMask>;

    /// Short stage name used in logs
    fn name(&self) -> &'static str;
}

/// Trait for vectorization algorithms
pub trait PathExtractor: Send + Sync {
    /// Trace the mask into closed paths
    fn extract_paths(&self, mask: &BinaryMask) -> Result<Vec<VectorPath>>;
}
