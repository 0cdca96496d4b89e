use std::collections::HashMap;

use geo::EuclideanDistance;
use geo_types::Point;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::debug;

use crate::{
    error::{Result, SignatureError},
    traits::MaskStage,
    types::{BinaryMask, ConnectedComponent, BACKGROUND, FOREGROUND},
};

/// A straight segment drawn between the centroids of two retained components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub from: u32,
    pub to: u32,
    pub length: f64,
}

/// Everything the component filter computed for one mask
#[derive(Debug, Clone)]
pub struct ComponentAnalysis {
    /// Every labelled region, in label order
    pub components: Vec<ConnectedComponent>,
    /// Labels of the regions that passed the area filter
    pub retained: Vec<u32>,
    pub bridges: Vec<Bridge>,
    pub mask: BinaryMask,
}

/// Drops speckle regions and joins stroke fragments whose centroids lie close together.
///
/// Regions are 8-connected. A region survives when its pixel count is at least
/// `min_area`. Every pair of survivors whose centroids are strictly closer than
/// `max_bridge_distance` gets a one-pixel line between the centroids. Candidate
/// pairs come from a uniform grid with cells `max_bridge_distance` wide, so
/// only centroids in neighbouring cells are compared.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ComponentConnector {
    pub min_area: u32,
    pub max_bridge_distance: f64,
}

impl Default for ComponentConnector {
    fn default() -> Self {
        Self {
            min_area: 20,
            max_bridge_distance: 30.0,
        }
    }
}

#[derive(Default, Clone, Copy)]
struct RegionStats {
    area: u32,
    sum_x: u64,
    sum_y: u64,
    min: [u32; 2],
    max: [u32; 2],
}

impl RegionStats {
    fn add(&mut self, x: u32, y: u32) {
        if self.area == 0 {
            self.min = [x, y];
            self.max = [x, y];
        } else {
            self.min = [self.min[0].min(x), self.min[1].min(y)];
            self.max = [self.max[0].max(x), self.max[1].max(y)];
        }
        self.area += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;
    }

    fn into_component(self, label: u32) -> ConnectedComponent {
        ConnectedComponent {
            label,
            area: self.area,
            centroid: [
                self.sum_x as f64 / self.area as f64,
                self.sum_y as f64 / self.area as f64,
            ],
            bounds: (self.min, self.max),
        }
    }
}

/// Label 8-connected foreground regions and measure each one.
pub fn label_components(mask: &BinaryMask) -> (ImageBuffer<Luma<u32>, Vec<u32>>, Vec<ConnectedComponent>) {
    let labels = connected_components(mask.as_image(), Connectivity::Eight, Luma([BACKGROUND]));

    let mut stats: Vec<RegionStats> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if stats.len() <= label {
            stats.resize(label + 1, RegionStats::default());
        }
        stats[label].add(x, y);
    }

    let components = stats
        .into_iter()
        .enumerate()
        .filter(|(_, s)| s.area > 0)
        .map(|(label, s)| s.into_component(label as u32))
        .collect();

    (labels, components)
}

/// All pairs of components whose centroids are strictly closer than `max_distance`,
/// ordered by `(from, to)` with `from < to`.
pub fn find_bridges(components: &[ConnectedComponent], max_distance: f64) -> Vec<Bridge> {
    if max_distance <= 0.0 || components.len() < 2 {
        return Vec::new();
    }

    let cell_of = |c: &ConnectedComponent| {
        (
            (c.centroid[0] / max_distance).floor() as i64,
            (c.centroid[1] / max_distance).floor() as i64,
        )
    };
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, component) in components.iter().enumerate() {
        grid.entry(cell_of(component)).or_default().push(i);
    }

    let mut bridges = Vec::new();
    for (i, a) in components.iter().enumerate() {
        let (cx, cy) = cell_of(a);
        let pa = Point::new(a.centroid[0], a.centroid[1]);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(bucket) = grid.get(&(cx.saturating_add(dx), cy.saturating_add(dy))) else {
                    continue;
                };
                for &j in bucket.iter().filter(|&&j| j > i) {
                    let b = &components[j];
                    let length = pa.euclidean_distance(&Point::new(b.centroid[0], b.centroid[1]));
                    if length < max_distance {
                        bridges.push(Bridge {
                            from: a.label.min(b.label),
                            to: a.label.max(b.label),
                            length,
                        });
                    }
                }
            }
        }
    }

    bridges.sort_by_key(|b| (b.from, b.to));
    bridges
}

impl ComponentConnector {
    fn validate(&self) -> Result<()> {
        if self.max_bridge_distance.is_nan() || self.max_bridge_distance < 0.0 {
            return Err(SignatureError::InvalidConfig(format!(
                "bridge distance must be non-negative, got {}",
                self.max_bridge_distance
            )));
        }
        Ok(())
    }

    /// Run the filter and report the intermediate measurements along with the output mask.
    pub fn analyze(&self, mask: &BinaryMask) -> Result<ComponentAnalysis> {
        self.validate()?;
        let (labels, components) = label_components(mask);

        let mut keep = vec![false; components.last().map_or(0, |c| c.label as usize + 1)];
        let survivors: Vec<ConnectedComponent> = components
            .iter()
            .filter(|c| c.area >= self.min_area)
            .cloned()
            .collect();
        for component in &survivors {
            keep[component.label as usize] = true;
        }

        let mut output = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            let label = labels.get_pixel(x, y)[0] as usize;
            if label != 0 && keep[label] {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });

        let bridges = find_bridges(&survivors, self.max_bridge_distance);
        let by_label: HashMap<u32, &ConnectedComponent> =
            survivors.iter().map(|c| (c.label, c)).collect();
        for bridge in &bridges {
            let (a, b) = (by_label[&bridge.from], by_label[&bridge.to]);
            draw_line_segment_mut(
                &mut output,
                (a.centroid[0] as f32, a.centroid[1] as f32),
                (b.centroid[0] as f32, b.centroid[1] as f32),
                Luma([FOREGROUND]),
            );
        }

        debug!(
            components = components.len(),
            retained = survivors.len(),
            bridges = bridges.len(),
            "Filtered components"
        );

        Ok(ComponentAnalysis {
            retained: survivors.iter().map(|c| c.label).collect(),
            components,
            bridges,
            mask: BinaryMask::from_gray(&output),
        })
    }
}

impl MaskStage for ComponentConnector {
    fn apply(&self, mask: &BinaryMask) -> Result<BinaryMask> {
        Ok(self.analyze(mask)?.mask)
    }

    fn name(&self) -> &'static str {
        "components"
    }
}
