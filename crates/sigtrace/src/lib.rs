//! # Signature Cleanup and Vectorization Library
//!
//! Turns a noisy scanned signature into a clean binary mask and a filled
//! vector outline of each ink region.
//!
//! ## Stages
//!
//! 1. **Normalize**: bound the longer side of the raster (800 by default)
//! 2. **Enhance**: optional Gaussian pre-blur, then CLAHE for uneven lighting
//! 3. **Binarize**: Gaussian adaptive threshold, ink becomes foreground
//! 4. **Filter & connect**: drop speckles, bridge nearby stroke fragments
//! 5. **Refine**: morphological closing
//! 6. **Vectorize**: trace outer contours into closed, filled paths
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sigtrace::{process_signature, SignatureConfig};
//! use std::path::Path;
//!
//! let outputs = process_signature(
//!     "scan.jpg",
//!     "out/clean.png",
//!     Some(Path::new("out/clean.svg")),
//!     &SignatureConfig::default(),
//! )?;
//! println!("mask written to {}", outputs.mask_path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use sigtrace::{Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .with_normalizer(SizeNormalizer::default())
//!     .with_clahe([8, 8], 2.0)
//!     .set_binarizer(AdaptiveGaussianBinarizer { window: 15, offset: 4.0 })
//!     .with_component_filter(ComponentConnector { min_area: 40, max_bridge_distance: 20.0 })
//!     .with_closing(3)
//!     .build();
//!
//! let image = sigtrace::load_grayscale("scan.jpg")?;
//! let result = pipeline.process(&image)?;
//! result.drawing.save_svg("outline.svg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod config;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{FailureReason, Result, SignatureError};
pub use types::{BinaryMask, ConnectedComponent, Drawing, ProcessedSignature, SignatureOutputs, VectorPath};
pub use traits::*;
pub use config::SignatureConfig;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use io::load_grayscale;

/// Clean up one scanned signature and write its artifacts.
///
/// Reads `input`, runs the pipeline described by `config`, writes the binary
/// mask as PNG to `mask_output` and, when given, the outline drawing as SVG to
/// `vector_output`. Missing parent directories are created right before the
/// writes, so a failed decode leaves the file system untouched.
///
/// Failures are logged here with their [`FailureReason`] and returned as values.
pub fn process_signature(
    input: impl AsRef<Path>,
    mask_output: impl AsRef<Path>,
    vector_output: Option<&Path>,
    config: &SignatureConfig,
) -> Result<SignatureOutputs> {
    let input = input.as_ref();
    let result = PipelineBuilder::from_config(config)
        .and_then(|pipeline| pipeline.process_file(input, mask_output.as_ref(), vector_output));

    if let Err(err) = &result {
        tracing::error!(input = %input.display(), reason = %err.reason(), "Error processing signature: {err}");
    }
    result
}
