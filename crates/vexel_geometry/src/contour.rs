//! A closed loop of chained edges.

use glam::DVec2;

use crate::edge::{Crossing, Edge};

/// One closed loop of connected edges bounding a filled or holed region.
///
/// Edges must chain directionally: `edges[i].segment.end() ==
/// edges[i+1].segment.start()`, wrapping at the end.  A contour with zero
/// edges is tolerated everywhere (it simply contributes nothing).
#[derive(Debug, Clone, Default)]
pub struct Contour {
    pub edges: Vec<Edge>,
}

// Trapezoid form of the shoelace formula, oriented so that a
// counter-clockwise loop sums positive.
#[inline]
fn shoelace(a: DVec2, b: DVec2) -> f64 {
    (a.x - b.x) * (a.y + b.y)
}

impl Contour {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// Signed orientation: +1 counter-clockwise, -1 clockwise, 0 for an
    /// empty contour.  Computed from the shoelace formula over edge start
    /// points, with extra samples when there are too few edges for the
    /// polygonal approximation to be meaningful.
    pub fn winding(&self) -> i32 {
        let mut total = 0.0;
        match self.edges.len() {
            0 => return 0,
            1 => {
                let a = self.edges[0].segment.point(0.0);
                let b = self.edges[0].segment.point(1.0 / 3.0);
                let c = self.edges[0].segment.point(2.0 / 3.0);
                total += shoelace(a, b);
                total += shoelace(b, c);
                total += shoelace(c, a);
            }
            2 => {
                let a = self.edges[0].segment.point(0.0);
                let b = self.edges[0].segment.point(0.5);
                let c = self.edges[1].segment.point(0.0);
                let d = self.edges[1].segment.point(0.5);
                total += shoelace(a, b);
                total += shoelace(b, c);
                total += shoelace(c, d);
                total += shoelace(d, a);
            }
            _ => {
                let mut prev = self.edges.last().unwrap().segment.start();
                for edge in &self.edges {
                    let cur = edge.segment.start();
                    total += shoelace(prev, cur);
                    prev = cur;
                }
            }
        }
        if total > 0.0 {
            1
        } else if total < 0.0 {
            -1
        } else {
            0
        }
    }

    /// Conservative bounding box (includes control points).  `None` for an
    /// empty contour.
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        let mut any = false;
        for edge in &self.edges {
            for p in edge_points(edge) {
                min = min.min(p);
                max = max.max(p);
                any = true;
            }
        }
        any.then_some((min, max))
    }

    /// Append every crossing of this contour with the horizontal line at `y`.
    pub fn add_scanline_intersections(&self, y: f64, out: &mut Vec<Crossing>) {
        for edge in &self.edges {
            edge.segment.add_scanline_intersections(y, out);
        }
    }
}

fn edge_points(edge: &Edge) -> Vec<DVec2> {
    use crate::edge::Segment::*;
    match edge.segment {
        Linear { p0, p1 } => vec![p0, p1],
        Quadratic { p0, ctrl, p1 } => vec![p0, ctrl, p1],
        Cubic {
            p0,
            ctrl0,
            ctrl1,
            p1,
        } => vec![p0, ctrl0, ctrl1, p1],
    }
}
