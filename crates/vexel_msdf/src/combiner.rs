//! Overlapping-contour combination.
//!
//! Each contour gets its own selector per pixel; this module merges them
//! into the final three-channel distance, classifying contours as inner
//! (positive winding) or outer (negative winding) so overlapping and nested
//! loops resolve the way a non-zero fill would.

use glam::DVec2;
use vexel_geometry::median;

use crate::selector::{EdgeList, MultiSelector};

#[inline]
fn resolve(d: [f64; 3]) -> f64 {
    median(d[0], d[1], d[2])
}

/// Scratch space for one row's worth of per-contour selectors.  Reused
/// across the pixels of a row; rows own separate instances so the generator
/// can process rows in parallel.
pub struct ContourCombiner {
    pub selectors: Vec<MultiSelector>,
    distances: Vec<[f64; 3]>,
}

impl ContourCombiner {
    pub fn new(contour_count: usize) -> Self {
        Self {
            selectors: vec![MultiSelector::default(); contour_count],
            distances: vec![[0.0; 3]; contour_count],
        }
    }

    pub fn reset(&mut self) {
        for selector in &mut self.selectors {
            selector.reset();
        }
    }

    /// Combine the per-contour selectors at query point `p`.
    ///
    /// Follows the overlap-aware selection order: inner/outer/shape merges,
    /// then a same-polarity rescan (nested same-sign islands), then an
    /// opposite-polarity rescan (nearer opposite-wound contours win), and
    /// finally an exact snap to the full-shape merge when the medians agree.
    pub fn distance(&mut self, list: &EdgeList, p: DVec2) -> [f64; 3] {
        let contour_count = self.selectors.len();
        let edges = &list.edges;
        let windings = &list.windings;

        let mut shape_selector = MultiSelector::default();
        let mut inner_selector = MultiSelector::default();
        let mut outer_selector = MultiSelector::default();
        for i in 0..contour_count {
            let d = self.selectors[i].distance(p, edges);
            self.distances[i] = d;
            shape_selector.merge(&self.selectors[i]);
            if windings[i] > 0 && resolve(d) >= 0.0 {
                inner_selector.merge(&self.selectors[i]);
            }
            if windings[i] < 0 && resolve(d) <= 0.0 {
                outer_selector.merge(&self.selectors[i]);
            }
        }

        let shape_distance = shape_selector.distance(p, edges);
        let inner_distance = inner_selector.distance(p, edges);
        let outer_distance = outer_selector.distance(p, edges);
        let inner_scalar = resolve(inner_distance);
        let outer_scalar = resolve(outer_distance);

        let mut distance = [-f64::MAX; 3];
        let winding;
        if inner_scalar >= 0.0 && inner_scalar.abs() <= outer_scalar.abs() {
            distance = inner_distance;
            winding = 1;
            for i in 0..contour_count {
                if windings[i] > 0 {
                    let contour_distance = self.distances[i];
                    if resolve(contour_distance).abs() < outer_scalar.abs()
                        && resolve(contour_distance) > resolve(distance)
                    {
                        distance = contour_distance;
                    }
                }
            }
        } else if outer_scalar <= 0.0 && outer_scalar.abs() < inner_scalar.abs() {
            distance = outer_distance;
            winding = -1;
            for i in 0..contour_count {
                if windings[i] < 0 {
                    let contour_distance = self.distances[i];
                    if resolve(contour_distance).abs() < inner_scalar.abs()
                        && resolve(contour_distance) < resolve(distance)
                    {
                        distance = contour_distance;
                    }
                }
            }
        } else {
            return shape_distance;
        }

        for i in 0..contour_count {
            if windings[i] != winding {
                let contour_distance = self.distances[i];
                if resolve(contour_distance) * resolve(distance) >= 0.0
                    && resolve(contour_distance).abs() < resolve(distance).abs()
                {
                    distance = contour_distance;
                }
            }
        }
        if resolve(distance) == resolve(shape_distance) {
            distance = shape_distance;
        }
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use vexel_geometry::{assign_colors, Contour, Edge, Shape};

    fn square(lo: f64, hi: f64, clockwise: bool) -> Contour {
        let mut pts = vec![
            dvec2(lo, lo),
            dvec2(hi, lo),
            dvec2(hi, hi),
            dvec2(lo, hi),
        ];
        if clockwise {
            pts.reverse();
        }
        Contour::new(
            (0..4)
                .map(|i| Edge::line(pts[i], pts[(i + 1) % 4]))
                .collect(),
        )
    }

    fn combined_median(shape: &Shape, p: DVec2) -> f64 {
        let list = EdgeList::new(shape, false);
        let mut combiner = ContourCombiner::new(list.contours.len());
        combiner.reset();
        for (i, &(start, end)) in list.contours.iter().enumerate() {
            let len = end - start;
            for j in 0..len {
                let cur = start + j;
                let prev = start + (j + len - 1) % len;
                let next = start + (j + 1) % len;
                combiner.selectors[i].add_edge(
                    &list.edges,
                    prev as u32,
                    cur as u32,
                    next as u32,
                    p,
                );
            }
        }
        resolve(combiner.distance(&list, p))
    }

    #[test]
    fn ring_with_hole_classifies_correctly() {
        let mut shape = Shape {
            contours: vec![square(0.0, 1.0, false), square(0.25, 0.75, true)],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 3.0, 0);
        assert!(combined_median(&shape, dvec2(0.125, 0.5)) > 0.0); // in the ring
        assert!(combined_median(&shape, dvec2(0.5, 0.5)) < 0.0); // in the hole
        assert!(combined_median(&shape, dvec2(1.5, 0.5)) < 0.0); // outside
    }

    #[test]
    fn overlapping_same_winding_unions() {
        // Two overlapping CCW squares: a point inside either must read as
        // inside, including in the overlap region.
        let mut shape = Shape {
            contours: vec![square(0.0, 1.0, false), square(0.5, 1.5, false)],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 3.0, 0);
        assert!(combined_median(&shape, dvec2(0.25, 0.25)) > 0.0);
        assert!(combined_median(&shape, dvec2(0.75, 0.75)) > 0.0); // overlap
        assert!(combined_median(&shape, dvec2(1.25, 1.25)) > 0.0);
        assert!(combined_median(&shape, dvec2(1.75, 0.5)) < 0.0);
    }
}
