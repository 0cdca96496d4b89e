use std::collections::HashSet;
use std::path::PathBuf;

use geo_types::{Coord, LineString, Polygon};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignatureError};

/// Sample value of an ink pixel in a [`BinaryMask`].
pub const FOREGROUND: u8 = 255;
/// Sample value of a paper pixel in a [`BinaryMask`].
pub const BACKGROUND: u8 = 0;

/// A two-valued raster: every sample is either [`FOREGROUND`] or [`BACKGROUND`].
///
/// The wrapped image is only reachable read-only, so the invariant holds for
/// every mask a stage hands to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Any nonzero sample becomes foreground.
    pub fn from_gray(image: &GrayImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y)[0] != 0)
    }

    pub fn from_fn<F>(width: u32, height: u32, mut is_foreground: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let image = GrayImage::from_fn(width, height, |x, y| {
            if is_foreground(x, y) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] == FOREGROUND
    }

    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let value = if foreground { FOREGROUND } else { BACKGROUND };
        self.image.put_pixel(x, y, Luma([value]));
    }

    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    pub fn is_empty(&self) -> bool {
        self.foreground_count() == 0
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

/// One 8-connected foreground region, as seen by the component filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedComponent {
    pub label: u32,
    /// Pixel count
    pub area: u32,
    /// Mean pixel position `[x, y]`
    pub centroid: [f64; 2],
    /// Inclusive bounds `([min_x, min_y], [max_x, max_y])`
    pub bounds: ([u32; 2], [u32; 2]),
}

impl ConnectedComponent {
    pub fn bounding_size(&self) -> [u32; 2] {
        let (min, max) = self.bounds;
        [max[0] - min[0] + 1, max[1] - min[1] + 1]
    }
}

/// A closed polygon traced around one ink region. The last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    points: Vec<[f32; 2]>,
}

impl VectorPath {
    pub const MIN_POINTS: usize = 3;

    /// Fails with [`SignatureError::DegenerateGeometry`] unless at least three distinct points are given.
    pub fn new(points: Vec<[f32; 2]>) -> Result<Self> {
        let distinct: HashSet<(u32, u32)> = points
            .iter()
            .map(|&[x, y]| (x.to_bits(), y.to_bits()))
            .collect();
        if distinct.len() < Self::MIN_POINTS {
            return Err(SignatureError::DegenerateGeometry {
                points: distinct.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_geo_polygon(&self) -> Polygon<f32> {
        let coords: Vec<Coord<f32>> = self.points.iter().map(|&[x, y]| Coord { x, y }).collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed area of the closed polygon
    pub fn area(&self) -> f32 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }
}

/// The vector output: traced paths on a canvas the size of the processed raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub width: u32,
    pub height: u32,
    pub paths: Vec<VectorPath>,
}

impl Drawing {
    pub fn new(width: u32, height: u32, paths: Vec<VectorPath>) -> Self {
        Self {
            width,
            height,
            paths,
        }
    }

    pub fn point_count(&self) -> usize {
        self.paths.iter().map(VectorPath::len).sum()
    }
}

/// In-memory result of running the pipeline over one raster.
#[derive(Debug, Clone)]
pub struct ProcessedSignature {
    pub mask: BinaryMask,
    pub drawing: Drawing,
}

/// Paths of the artifacts written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureOutputs {
    pub mask_path: PathBuf,
    pub vector_path: Option<PathBuf>,
}
