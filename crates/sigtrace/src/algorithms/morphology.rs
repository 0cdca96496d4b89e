use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::{
    error::{Result, SignatureError},
    traits::MaskStage,
    types::BinaryMask,
};

/// Dilation: foreground if any pixel at `p - b` is foreground, `b` in `[0, k)^2`.
fn dilate(mask: &BinaryMask, k: u32) -> BinaryMask {
    BinaryMask::from_fn(mask.width(), mask.height(), |x, y| {
        (0..k).any(|dy| {
            (0..k).any(|dx| x >= dx && y >= dy && mask.is_foreground(x - dx, y - dy))
        })
    })
}

/// Erosion: foreground if every in-bounds pixel at `p + b` is foreground, `b` in `[0, k)^2`.
///
/// Out-of-bounds samples are ignored, which makes this the exact adjoint of
/// [`dilate`] on a finite raster.
fn erode(mask: &BinaryMask, k: u32) -> BinaryMask {
    let (width, height) = (mask.width(), mask.height());
    BinaryMask::from_fn(width, height, |x, y| {
        (0..k).all(|dy| {
            (0..k).all(|dx| {
                let (sx, sy) = (x + dx, y + dy);
                sx >= width || sy >= height || mask.is_foreground(sx, sy)
            })
        })
    })
}

/// Morphological closing with a `kernel_size` x `kernel_size` square.
///
/// Fills pinholes and hairline gaps narrower than the kernel while every
/// original foreground pixel is kept. Because dilation and erosion are
/// adjoint, closing twice gives the same mask as closing once.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MorphologicalCloser {
    pub kernel_size: u32,
}

impl Default for MorphologicalCloser {
    fn default() -> Self {
        Self { kernel_size: 2 }
    }
}

impl MaskStage for MorphologicalCloser {
    fn apply(&self, mask: &BinaryMask) -> Result<BinaryMask> {
        if self.kernel_size == 0 {
            return Err(SignatureError::InvalidConfig("morphology kernel must be non-empty".to_string()));
        }
        Ok(erode(&dilate(mask, self.kernel_size), self.kernel_size))
    }

    fn name(&self) -> &'static str {
        "closing"
    }
}
