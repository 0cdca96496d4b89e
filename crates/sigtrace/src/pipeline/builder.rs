use crate::{
    algorithms::{
        AdaptiveGaussianBinarizer, ClaheEnhancer, ComponentConnector, ContourPathExtractor,
        GaussianSmoother, MedianDenoiser, MorphologicalCloser, SizeNormalizer,
    },
    config::SignatureConfig,
    error::Result,
    pipeline::Pipeline,
    traits::{Binarizer, MaskStage, PathExtractor, RasterStage},
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    raster_stages: Vec<Box<dyn RasterStage>>,
    binarizer: Option<Box<dyn Binarizer>>,
    mask_stages: Vec<Box<dyn MaskStage>>,
    extractor: Option<Box<dyn PathExtractor>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            raster_stages: Vec::new(),
            binarizer: None,
            mask_stages: Vec::new(),
            extractor: None,
        }
    }

    /// Add a grayscale stage; stages run in insertion order
    pub fn add_raster_stage<S>(mut self, stage: S) -> Self
    where
        S: RasterStage + 'static,
    {
        self.raster_stages.push(Box::new(stage));
        self
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Add a mask stage; stages run in insertion order
    pub fn add_mask_stage<S>(mut self, stage: S) -> Self
    where
        S: MaskStage + 'static,
    {
        self.mask_stages.push(Box::new(stage));
        self
    }

    /// Set the path extractor (replaces any existing one)
    pub fn set_extractor<E>(mut self, extractor: E) -> Self
    where
        E: PathExtractor + 'static,
    {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn with_normalizer(self, normalizer: SizeNormalizer) -> Self {
        self.add_raster_stage(normalizer)
    }

    pub fn with_pre_blur(self, kernel_size: u32) -> Self {
        self.add_raster_stage(GaussianSmoother { kernel_size })
    }

    pub fn with_clahe(self, tile_grid: [u32; 2], clip_limit: f32) -> Self {
        self.add_raster_stage(ClaheEnhancer { tile_grid, clip_limit })
    }

    pub fn with_median(self, window: u32) -> Self {
        self.add_mask_stage(MedianDenoiser { window })
    }

    pub fn with_component_filter(self, connector: ComponentConnector) -> Self {
        self.add_mask_stage(connector)
    }

    pub fn with_closing(self, kernel_size: u32) -> Self {
        self.add_mask_stage(MorphologicalCloser { kernel_size })
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let binarizer = self
            .binarizer
            .unwrap_or_else(|| Box::new(AdaptiveGaussianBinarizer::default()));
        let extractor = self
            .extractor
            .unwrap_or_else(|| Box::new(ContourPathExtractor::default()));

        Pipeline::new(self.raster_stages, binarizer, self.mask_stages, extractor)
    }

    /// The full signature pipeline described by `config`, after validating it
    pub fn from_config(config: &SignatureConfig) -> Result<Pipeline> {
        config.validate()?;

        let mut builder = Self::new().with_normalizer(config.normalize.clone());
        if let Some(smoother) = config.enhance.smoother() {
            builder = builder.add_raster_stage(smoother);
        }
        builder = builder
            .add_raster_stage(config.enhance.clahe())
            .set_binarizer(config.threshold.binarizer());
        if let Some(denoiser) = config.threshold.denoiser() {
            builder = builder.add_mask_stage(denoiser);
        }

        Ok(builder
            .with_component_filter(config.components.clone())
            .add_mask_stage(config.morphology.clone())
            .set_extractor(config.contours.clone())
            .build())
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
