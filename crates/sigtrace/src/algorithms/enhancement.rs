use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::debug;

use crate::{error::{Result, SignatureError}, traits::RasterStage};

const BINS: usize = 256;

/// Binomial weights used for windows of up to seven taps.
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Normalized 1-D Gaussian weights for an odd window.
///
/// Windows of up to seven taps use fixed binomial weights (`[1, 2, 1] / 4` for
/// three taps). Larger windows derive sigma as `0.3 * ((size - 1) / 2 - 1) + 0.8`,
/// so an 11-tap window gets sigma 2.0.
pub(crate) fn gaussian_kernel(size: u32) -> Vec<f32> {
    if let Some(fixed) = SMALL_KERNELS.get((size / 2) as usize).filter(|k| k.len() == size as usize) {
        return fixed.to_vec();
    }
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

pub(crate) fn check_odd_window(what: &str, size: u32) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(SignatureError::InvalidConfig(format!(
            "{what} must be a positive odd number, got {size}"
        )));
    }
    Ok(())
}

/// Gaussian smoothing over a small odd window, applied before equalization
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GaussianSmoother {
    pub kernel_size: u32,
}

impl Default for GaussianSmoother {
    fn default() -> Self {
        Self { kernel_size: 3 }
    }
}

impl RasterStage for GaussianSmoother {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        check_odd_window("blur kernel", self.kernel_size)?;
        if self.kernel_size == 1 {
            return Ok(image.clone());
        }
        let kernel = gaussian_kernel(self.kernel_size);
        Ok(imageproc::filter::separable_filter_equal(image, &kernel))
    }

    fn name(&self) -> &'static str {
        "pre_blur"
    }
}

/// Contrast-limited adaptive histogram equalization.
///
/// The raster is split into a `tile_grid` of tiles. Each tile gets its own
/// equalization curve from a histogram whose bins are capped at
/// `clip_limit * tile_area / 256`; the clipped excess is spread evenly over
/// all bins. Pixels are mapped by bilinear interpolation between the curves
/// of the four nearest tile centers, so no seams appear at tile borders.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ClaheEnhancer {
    /// Tiles across and down
    pub tile_grid: [u32; 2],
    pub clip_limit: f32,
}

impl Default for ClaheEnhancer {
    fn default() -> Self {
        Self {
            tile_grid: [8, 8],
            clip_limit: 2.0,
        }
    }
}

/// Tile layout along one axis: `(tile_size, tile_count)`.
/// Never yields more tiles than pixels, and never an empty trailing tile.
fn tile_layout(len: u32, requested: u32) -> (u32, u32) {
    let count = requested.min(len).max(1);
    let size = len.div_ceil(count);
    (size, len.div_ceil(size))
}

impl ClaheEnhancer {
    fn tile_lut(&self, image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) -> [u8; BINS] {
        let mut hist = [0u32; BINS];
        for y in y0..y1 {
            for x in x0..x1 {
                hist[image.get_pixel(x, y)[0] as usize] += 1;
            }
        }
        let area = (x1 - x0) * (y1 - y0);

        let clip = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }
        let per_bin = excess / BINS as u32;
        let residual = (excess % BINS as u32) as usize;
        for bin in hist.iter_mut() {
            *bin += per_bin;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for bin in hist.iter_mut().step_by(step).take(residual) {
                *bin += 1;
            }
        }

        let scale = 255.0 / area as f32;
        let mut lut = [0u8; BINS];
        let mut cumulative = 0u32;
        for (value, count) in hist.iter().enumerate() {
            cumulative += count;
            lut[value] = (cumulative as f32 * scale).round().min(255.0) as u8;
        }
        lut
    }
}

impl RasterStage for ClaheEnhancer {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        let [grid_x, grid_y] = self.tile_grid;
        if grid_x == 0 || grid_y == 0 {
            return Err(SignatureError::InvalidConfig("tile grid must be non-empty".to_string()));
        }
        if self.clip_limit <= 0.0 {
            return Err(SignatureError::InvalidConfig(format!(
                "clip limit must be positive, got {}",
                self.clip_limit
            )));
        }

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(image.clone());
        }
        let (tile_w, tiles_x) = tile_layout(width, grid_x);
        let (tile_h, tiles_y) = tile_layout(height, grid_y);

        let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x0 = tx * tile_w;
                let y0 = ty * tile_h;
                let x1 = (x0 + tile_w).min(width);
                let y1 = (y0 + tile_h).min(height);
                luts.push(self.tile_lut(image, x0, y0, x1, y1));
            }
        }
        debug!(tiles_x, tiles_y, tile_w, tile_h, "Equalizing tiles");

        let last_x = tiles_x as i64 - 1;
        let last_y = tiles_y as i64 - 1;
        let lut_at = |tx: i64, ty: i64| &luts[(ty * tiles_x as i64 + tx) as usize];

        Ok(GrayImage::from_fn(width, height, |x, y| {
            let value = image.get_pixel(x, y)[0] as usize;

            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
            let tx0 = (fx.floor() as i64).clamp(0, last_x);
            let tx1 = (fx.floor() as i64 + 1).clamp(0, last_x);
            let ty0 = (fy.floor() as i64).clamp(0, last_y);
            let ty1 = (fy.floor() as i64 + 1).clamp(0, last_y);
            let ax = fx - fx.floor();
            let ay = fy - fy.floor();

            let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty0)[value] as f32 * ax;
            let bottom = lut_at(tx0, ty1)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty1)[value] as f32 * ax;
            let mapped = top * (1.0 - ay) + bottom * ay;

            Luma([mapped.round().clamp(0.0, 255.0) as u8])
        }))
    }

    fn name(&self) -> &'static str {
        "clahe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(11);
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[10]).abs() < 1e-7);
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn test_small_kernels_use_binomial_weights() {
        assert_eq!(gaussian_kernel(1), vec![1.0]);
        assert_eq!(gaussian_kernel(3), vec![0.25, 0.5, 0.25]);
        assert_eq!(gaussian_kernel(5), vec![0.0625, 0.25, 0.375, 0.25, 0.0625]);
        assert!((gaussian_kernel(7).iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(gaussian_kernel(9).len(), 9);
    }

    #[test]
    fn test_tile_layout_never_leaves_empty_tiles() {
        assert_eq!(tile_layout(800, 8), (100, 8));
        assert_eq!(tile_layout(9, 8), (2, 5));
        assert_eq!(tile_layout(3, 8), (1, 3));
    }

    fn striped(x: u32) -> Luma<u8> {
        // Two grey levels squeezed into a narrow band, present in every tile
        Luma([if x % 4 < 2 { 120 } else { 136 }])
    }

    #[test]
    fn test_clahe_stretches_low_contrast_scan() {
        let image = GrayImage::from_fn(256, 256, |x, _| striped(x));
        let enhancer = ClaheEnhancer { tile_grid: [8, 8], clip_limit: 40.0 };
        let enhanced = enhancer.apply(&image).expect("Should enhance");

        assert_eq!(enhanced.dimensions(), (256, 256));
        let dark = enhanced.get_pixel(100, 100)[0] as i32;
        let light = enhanced.get_pixel(102, 100)[0] as i32;
        assert!(light - dark > 32, "contrast should grow: {dark} vs {light}");
    }

    #[test]
    fn test_clip_limit_bounds_amplification() {
        let image = GrayImage::from_fn(256, 256, |x, _| striped(x));
        let spread = |clip_limit: f32| {
            let enhanced = ClaheEnhancer { tile_grid: [8, 8], clip_limit }
                .apply(&image)
                .expect("Should enhance");
            enhanced.get_pixel(102, 100)[0] as i32 - enhanced.get_pixel(100, 100)[0] as i32
        };
        assert!(spread(2.0) < spread(40.0));
    }

    #[test]
    fn test_clahe_handles_raster_smaller_than_grid() {
        let image = GrayImage::from_fn(5, 3, |x, y| Luma([(x * 30 + y * 10) as u8]));
        let enhanced = ClaheEnhancer::default().apply(&image).expect("Should enhance tiny raster");
        assert_eq!(enhanced.dimensions(), (5, 3));
    }

    #[test]
    fn test_even_blur_kernel_is_rejected() {
        let err = GaussianSmoother { kernel_size: 4 }.apply(&GrayImage::new(8, 8)).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidConfig(_)));
    }
}
