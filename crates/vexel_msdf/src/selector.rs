//! Per-channel distance selectors.
//!
//! A selector tracks, for one pixel and one contour, the best true signed
//! distance per color channel plus the closest-to-zero perpendicular
//! pseudo-distance on each side of the sign divide.  The nearest edge is
//! stored as an index into the shape's flattened edge array so rows can be
//! processed in parallel.

use glam::DVec2;
use vexel_geometry::{cross, Edge, Shape, SignedDistance};

/// Shape flattened into one edge array with per-contour ranges, windings
/// precomputed.  Built once per generation call; selectors index into it.
pub struct EdgeList {
    pub edges: Vec<Edge>,
    /// Half-open index ranges, one per contour.
    pub contours: Vec<(usize, usize)>,
    pub windings: Vec<i32>,
}

impl EdgeList {
    pub fn new(shape: &Shape, invert_winding: bool) -> Self {
        let mut edges = Vec::with_capacity(shape.edge_count());
        let mut contours = Vec::with_capacity(shape.contours.len());
        let mut windings = Vec::with_capacity(shape.contours.len());
        let sign = if invert_winding { -1 } else { 1 };
        for contour in &shape.contours {
            let start = edges.len();
            edges.extend(contour.edges.iter().copied());
            contours.push((start, edges.len()));
            windings.push(sign * contour.winding());
        }
        Self {
            edges,
            contours,
            windings,
        }
    }
}

/// Perpendicular-distance candidate test: accepts `ep` only when it lies
/// "ahead" of the endpoint along `edge_dir`, and keeps the estimate only if
/// it beats the current one.
#[inline]
fn perpendicular_distance(distance: &mut f64, ep: DVec2, edge_dir: DVec2) -> bool {
    let ts = ep.dot(edge_dir);
    if ts > 0.0 {
        let perpendicular = cross(edge_dir, ep);
        if perpendicular.abs() < distance.abs() {
            *distance = perpendicular;
            return true;
        }
    }
    false
}

/// Selector state for a single color channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSelector {
    min_true: SignedDistance,
    near_edge: Option<u32>,
    near_param: f64,
    min_negative_perp: f64,
    min_positive_perp: f64,
}

impl Default for ChannelSelector {
    fn default() -> Self {
        Self {
            min_true: SignedDistance::INFINITE,
            near_edge: None,
            near_param: 0.0,
            min_negative_perp: -f64::MAX,
            min_positive_perp: f64::MAX,
        }
    }
}

impl ChannelSelector {
    fn add_true_distance(&mut self, edge: u32, distance: SignedDistance, param: f64) {
        if distance.closer_than(&self.min_true) {
            self.min_true = distance;
            self.near_edge = Some(edge);
            self.near_param = param;
        }
    }

    fn add_perpendicular_distance(&mut self, distance: f64) {
        if distance <= 0.0 && distance > self.min_negative_perp {
            self.min_negative_perp = distance;
        }
        if distance >= 0.0 && distance < self.min_positive_perp {
            self.min_positive_perp = distance;
        }
    }

    fn merge(&mut self, other: &ChannelSelector) {
        if other.min_true.closer_than(&self.min_true) {
            self.min_true = other.min_true;
            self.near_edge = other.near_edge;
            self.near_param = other.near_param;
        }
        if other.min_negative_perp > self.min_negative_perp {
            self.min_negative_perp = other.min_negative_perp;
        }
        if other.min_positive_perp < self.min_positive_perp {
            self.min_positive_perp = other.min_positive_perp;
        }
    }

    /// Final channel distance: the perpendicular bound on the current sign's
    /// side, unless the perpendicular-corrected true distance is closer.
    fn compute_distance(&self, p: DVec2, edges: &[Edge]) -> f64 {
        let mut min_distance = if self.min_true.distance < 0.0 {
            self.min_negative_perp
        } else {
            self.min_positive_perp
        };
        if let Some(index) = self.near_edge {
            let mut distance = self.min_true;
            edges[index as usize].segment.distance_to_perpendicular_distance(
                &mut distance,
                p,
                self.near_param,
            );
            if distance.distance.abs() < min_distance.abs() {
                min_distance = distance.distance;
            }
        }
        min_distance
    }
}

/// Three-channel selector for one contour at one pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSelector {
    r: ChannelSelector,
    g: ChannelSelector,
    b: ChannelSelector,
}

impl MultiSelector {
    pub fn reset(&mut self) {
        *self = MultiSelector::default();
    }

    /// Feed one edge (with its cyclic neighbors) for query point `p`.
    ///
    /// The true signed distance is routed into whichever channels the edge's
    /// color mask includes.  When `p` projects beyond either endpoint, a
    /// perpendicular pseudo-distance is merged as well, corrected with the
    /// adjoining edge's direction so neighboring fields join smoothly, and
    /// accepted only "ahead" of the joint (the `add`/`bdd > 0` tests) so a
    /// corner is not counted from both sides.
    pub fn add_edge(&mut self, edges: &[Edge], prev: u32, cur: u32, next: u32, p: DVec2) {
        let edge = &edges[cur as usize];
        let (distance, param) = edge.segment.signed_distance(p);
        if edge.color.has_channel(0) {
            self.r.add_true_distance(cur, distance, param);
        }
        if edge.color.has_channel(1) {
            self.g.add_true_distance(cur, distance, param);
        }
        if edge.color.has_channel(2) {
            self.b.add_true_distance(cur, distance, param);
        }

        let ap = p - edge.segment.start();
        let bp = p - edge.segment.end();
        let a_dir = edge.segment.direction(0.0).normalize_or_zero();
        let b_dir = edge.segment.direction(1.0).normalize_or_zero();
        let prev_dir = edges[prev as usize].segment.direction(1.0).normalize_or_zero();
        let next_dir = edges[next as usize].segment.direction(0.0).normalize_or_zero();
        let add = ap.dot((prev_dir + a_dir).normalize_or_zero());
        let bdd = -bp.dot((b_dir + next_dir).normalize_or_zero());
        if add > 0.0 {
            let mut pd = distance.distance;
            if perpendicular_distance(&mut pd, ap, -a_dir) {
                pd = -pd;
                self.route_perpendicular(edge.color, pd);
            }
        }
        if bdd > 0.0 {
            let mut pd = distance.distance;
            if perpendicular_distance(&mut pd, bp, b_dir) {
                self.route_perpendicular(edge.color, pd);
            }
        }
    }

    fn route_perpendicular(&mut self, color: vexel_geometry::EdgeColor, pd: f64) {
        if color.has_channel(0) {
            self.r.add_perpendicular_distance(pd);
        }
        if color.has_channel(1) {
            self.g.add_perpendicular_distance(pd);
        }
        if color.has_channel(2) {
            self.b.add_perpendicular_distance(pd);
        }
    }

    pub fn merge(&mut self, other: &MultiSelector) {
        self.r.merge(&other.r);
        self.g.merge(&other.g);
        self.b.merge(&other.b);
    }

    /// Resolve the three channel distances at `p`.
    pub fn distance(&self, p: DVec2, edges: &[Edge]) -> [f64; 3] {
        [
            self.r.compute_distance(p, edges),
            self.g.compute_distance(p, edges),
            self.b.compute_distance(p, edges),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use vexel_geometry::{assign_colors, median, Contour, Edge};

    fn colored_square() -> (Shape, EdgeList) {
        let pts = [
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(1.0, 1.0),
            dvec2(0.0, 1.0),
        ];
        let mut shape = Shape {
            contours: vec![Contour::new(
                (0..4)
                    .map(|i| Edge::line(pts[i], pts[(i + 1) % 4]))
                    .collect(),
            )],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 3.0, 0);
        let list = EdgeList::new(&shape, false);
        (shape, list)
    }

    fn select_at(list: &EdgeList, p: DVec2) -> [f64; 3] {
        let mut sel = MultiSelector::default();
        let (start, end) = list.contours[0];
        let len = end - start;
        for j in 0..len {
            let cur = start + j;
            let prev = start + (j + len - 1) % len;
            let next = start + (j + 1) % len;
            sel.add_edge(&list.edges, prev as u32, cur as u32, next as u32, p);
        }
        sel.distance(p, &list.edges)
    }

    #[test]
    fn interior_point_positive_median() {
        let (_, list) = colored_square();
        let d = select_at(&list, dvec2(0.5, 0.5));
        assert!(median(d[0], d[1], d[2]) > 0.0);
        // Nearest edge is 0.5 away on all sides.
        assert!((median(d[0], d[1], d[2]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn exterior_point_negative_median() {
        let (_, list) = colored_square();
        let d = select_at(&list, dvec2(-0.25, 0.5));
        let m = median(d[0], d[1], d[2]);
        assert!(m < 0.0);
        assert!((m + 0.25).abs() < 1e-9);
    }

    #[test]
    fn diagonal_exterior_smooth_at_corner() {
        let (_, list) = colored_square();
        // Just outside the (0,0) corner: the perpendicular extension keeps
        // each channel's field finite and negative.
        let d = select_at(&list, dvec2(-0.1, -0.1));
        let m = median(d[0], d[1], d[2]);
        assert!(m < 0.0);
        assert!(m > -0.5);
    }

    #[test]
    fn merge_keeps_closest() {
        let (_, list) = colored_square();
        let p = dvec2(0.5, 0.25);
        let mut a = MultiSelector::default();
        let mut b = MultiSelector::default();
        let (start, end) = list.contours[0];
        let len = end - start;
        for j in 0..len {
            let cur = start + j;
            let prev = start + (j + len - 1) % len;
            let next = start + (j + 1) % len;
            // Feed half the edges to each selector.
            let target = if j % 2 == 0 { &mut a } else { &mut b };
            target.add_edge(&list.edges, prev as u32, cur as u32, next as u32, p);
        }
        a.merge(&b);
        let merged = a.distance(p, &list.edges);
        let full = select_at(&list, p);
        for (m, f) in merged.iter().zip(full.iter()) {
            assert!((m - f).abs() < 1e-12);
        }
    }
}
