use imageproc::contours::{find_contours, BorderType};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::{debug, trace};

use crate::{
    error::{Result, SignatureError},
    traits::PathExtractor,
    types::{BinaryMask, VectorPath},
};

/// Drop points that lie on a straight run between their neighbours.
///
/// The ring is treated as closed. Repeated points are removed first; a point
/// where the trace doubles back on itself is kept.
pub fn merge_collinear(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut ring: Vec<[f32; 2]> = Vec::with_capacity(points.len());
    for &p in points {
        if ring.last() != Some(&p) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return ring;
    }

    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let [px, py] = ring[(i + n - 1) % n];
            let [cx, cy] = ring[i];
            let [nx, ny] = ring[(i + 1) % n];
            let (ax, ay) = (cx - px, cy - py);
            let (bx, by) = (nx - cx, ny - cy);
            let cross = ax * by - ay * bx;
            let dot = ax * bx + ay * by;
            cross != 0.0 || dot <= 0.0
        })
        .map(|i| ring[i])
        .collect()
}

/// Traces the outer border of each ink region into a closed polygon.
///
/// Only outermost borders are traced: holes, and regions sitting inside
/// holes, produce no paths. Traces enclosing `min_area` or less are dropped,
/// as are traces with fewer than three distinct corners.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ContourPathExtractor {
    pub min_area: f32,
}

impl Default for ContourPathExtractor {
    fn default() -> Self {
        Self { min_area: 10.0 }
    }
}

impl PathExtractor for ContourPathExtractor {
    fn extract_paths(&self, mask: &BinaryMask) -> Result<Vec<VectorPath>> {
        if self.min_area.is_nan() || self.min_area < 0.0 {
            return Err(SignatureError::InvalidConfig(format!(
                "contour area must be non-negative, got {}",
                self.min_area
            )));
        }

        let contours = find_contours::<i32>(mask.as_image());
        let mut paths = Vec::new();
        let mut skipped = 0usize;

        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            let traced: Vec<[f32; 2]> = contour
                .points
                .iter()
                .map(|p| [p.x as f32, p.y as f32])
                .collect();
            let corners = merge_collinear(&traced);

            match VectorPath::new(corners) {
                Ok(path) if path.area() > self.min_area => paths.push(path),
                Ok(path) => {
                    trace!(area = path.area(), "Dropping small contour");
                    skipped += 1;
                }
                Err(err) => {
                    trace!(reason = %err.reason(), "Skipping contour: {err}");
                    skipped += 1;
                }
            }
        }

        debug!(contours = contours.len(), paths = paths.len(), skipped, "Traced contours");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::fill_rect;

    #[test]
    fn test_merge_collinear_keeps_corners() {
        let square = [
            [0.0, 0.0], [1.0, 0.0], [2.0, 0.0],
            [2.0, 1.0], [2.0, 2.0],
            [1.0, 2.0], [0.0, 2.0],
            [0.0, 1.0],
        ];
        assert_eq!(
            merge_collinear(&square),
            vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]
        );
    }

    #[test]
    fn test_merge_collinear_collapses_hairline() {
        let hairline = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [2.0, 0.0], [1.0, 0.0]];
        assert_eq!(merge_collinear(&hairline), vec![[0.0, 0.0], [3.0, 0.0]]);
        assert_eq!(merge_collinear(&[[4.0, 4.0]]), vec![[4.0, 4.0]]);
    }

    #[test]
    fn test_rectangle_becomes_four_corner_path() {
        let mut mask = BinaryMask::new(30, 30);
        fill_rect(&mut mask, 5, 5, 10, 6);

        let paths = ContourPathExtractor::default().extract_paths(&mask).expect("Should trace");
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 4);
        assert!((paths[0].area() - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_holes_and_inner_islands_are_not_traced() {
        let mut mask = BinaryMask::new(40, 40);
        fill_rect(&mut mask, 2, 2, 30, 30);
        for y in 8..26 {
            for x in 8..26 {
                mask.set(x, y, false);
            }
        }
        fill_rect(&mut mask, 12, 12, 8, 8);

        let paths = ContourPathExtractor::default().extract_paths(&mask).expect("Should trace");
        assert_eq!(paths.len(), 1);
        assert!((paths[0].area() - 29.0 * 29.0).abs() < 1e-3);
    }

    #[test]
    fn test_small_and_degenerate_traces_are_skipped() {
        let mut mask = BinaryMask::new(40, 20);
        // Hairline and single pixel: no enclosed area
        fill_rect(&mut mask, 2, 2, 12, 1);
        mask.set(30, 10, true);
        // 3x3 block encloses 4 square units
        fill_rect(&mut mask, 20, 12, 3, 3);

        let paths = ContourPathExtractor::default().extract_paths(&mask).expect("Should trace");
        assert!(paths.is_empty());
    }

    #[test]
    fn test_emitted_paths_have_three_points() {
        let mut mask = BinaryMask::new(60, 60);
        fill_rect(&mut mask, 3, 3, 5, 5);
        fill_rect(&mut mask, 20, 20, 14, 3);
        for i in 0..20 {
            fill_rect(&mut mask, 35 + i, 35 + i, 4, 4);
        }

        let paths = ContourPathExtractor { min_area: 0.0 }
            .extract_paths(&mask)
            .expect("Should trace");
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.len() >= VectorPath::MIN_POINTS));
    }
}
