use std::path::Path;

use image::{GrayImage, ImageFormat};
use tracing::{debug, info};

use crate::{
    error::{Result, SignatureError},
    io::ensure_parent_dir,
    types::BinaryMask,
};

/// Decode an image file of any supported format as single-channel 8-bit intensity.
pub fn load_grayscale(path: impl AsRef<Path>) -> Result<GrayImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| SignatureError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let gray = image.to_luma8();
    debug!(path = %path.display(), width = gray.width(), height = gray.height(), "Loaded raster");
    Ok(gray)
}

impl BinaryMask {
    /// Write the mask as PNG, whatever the extension, creating parent directories.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        self.as_image()
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| SignatureError::MaskWrite {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "Saved mask");
        Ok(())
    }
}
