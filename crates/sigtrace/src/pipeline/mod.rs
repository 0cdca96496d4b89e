pub mod builder;

use std::path::Path;

use image::GrayImage;
use tracing::{debug, info};

use crate::{
    error::Result,
    io::{discard_outputs, load_grayscale, missing_ancestors},
    traits::{Binarizer, MaskStage, PathExtractor, RasterStage},
    types::{Drawing, ProcessedSignature, SignatureOutputs},
};

/// Sequential signature pipeline: raster stages, binarization, mask stages, vectorization.
///
/// Each stage consumes the previous stage's output and returns a new raster or
/// mask; nothing is modified in place.
pub struct Pipeline {
    raster_stages: Vec<Box<dyn RasterStage>>,
    binarizer: Box<dyn Binarizer>,
    mask_stages: Vec<Box<dyn MaskStage>>,
    extractor: Box<dyn PathExtractor>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        raster_stages: Vec<Box<dyn RasterStage>>,
        binarizer: Box<dyn Binarizer>,
        mask_stages: Vec<Box<dyn MaskStage>>,
        extractor: Box<dyn PathExtractor>,
    ) -> Self {
        Self {
            raster_stages,
            binarizer,
            mask_stages,
            extractor,
        }
    }

    /// Run every stage over an in-memory raster
    pub fn process(&self, image: &GrayImage) -> Result<ProcessedSignature> {
        let mut raster = image.clone();
        for stage in &self.raster_stages {
            raster = stage.apply(&raster)?;
            debug!(stage = stage.name(), width = raster.width(), height = raster.height(), "Raster stage done");
        }

        let mut mask = self.binarizer.binarize(&raster)?;
        for stage in &self.mask_stages {
            mask = stage.apply(&mask)?;
            debug!(stage = stage.name(), foreground = mask.foreground_count(), "Mask stage done");
        }

        let paths = self.extractor.extract_paths(&mask)?;
        let drawing = Drawing::new(mask.width(), mask.height(), paths);

        Ok(ProcessedSignature { mask, drawing })
    }

    /// Load `input`, run the pipeline and write the mask (and optionally the drawing).
    ///
    /// Nothing is written unless decoding and processing succeed. If a write
    /// fails, the artifacts and the directories this call created are removed
    /// again, so a failed run leaves no output behind.
    pub fn process_file(
        &self,
        input: &Path,
        mask_output: &Path,
        vector_output: Option<&Path>,
    ) -> Result<SignatureOutputs> {
        let image = load_grayscale(input)?;
        let processed = self.process(&image)?;
        info!(
            input = %input.display(),
            paths = processed.drawing.paths.len(),
            points = processed.drawing.point_count(),
            "Processed signature"
        );

        let mut created_dirs = missing_ancestors(mask_output);
        if let Some(vector_output) = vector_output {
            created_dirs.extend(missing_ancestors(vector_output));
        }

        let written = processed.mask.save_png(mask_output).and_then(|()| match vector_output {
            Some(vector_output) => processed.drawing.save_svg(vector_output),
            None => Ok(()),
        });
        if let Err(err) = written {
            let files: Vec<&Path> = std::iter::once(mask_output).chain(vector_output).collect();
            discard_outputs(&files, &created_dirs);
            return Err(err);
        }

        Ok(SignatureOutputs {
            mask_path: mask_output.to_path_buf(),
            vector_path: vector_output.map(Path::to_path_buf),
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let raster: Vec<&str> = self.raster_stages.iter().map(|s| s.name()).collect();
        let mask: Vec<&str> = self.mask_stages.iter().map(|s| s.name()).collect();
        format!(
            "Pipeline: [{}] -> threshold -> [{}] -> contours",
            raster.join(", "),
            mask.join(", ")
        )
    }
}
