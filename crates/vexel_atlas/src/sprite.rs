//! Sprite path data to shape conversion.
//!
//! Sprite paths are closed polygons of anchors, each carrying a scalar
//! "curve" bulge: zero means the segment to the next anchor is a straight
//! line, anything else bows it into a quadratic whose control point sits at
//! the segment midpoint, offset perpendicular to the segment by the bulge
//! amount (positive bulges to the left of travel).

use glam::DVec2;
use vexel_geometry::{Contour, Edge, Shape};

#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub pos: DVec2,
    pub curve: f64,
}

impl Anchor {
    pub fn new(x: f64, y: f64, curve: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            curve,
        }
    }
}

pub fn shape_from_anchors(paths: &[Vec<Anchor>]) -> Shape {
    let mut shape = Shape::new();
    for path in paths {
        if path.len() < 2 {
            continue;
        }
        let mut edges = Vec::with_capacity(path.len());
        for (i, anchor) in path.iter().enumerate() {
            let next = path[(i + 1) % path.len()];
            let delta = next.pos - anchor.pos;
            // Coincident anchors contribute nothing.
            if delta.length_squared() == 0.0 {
                continue;
            }
            if anchor.curve == 0.0 {
                edges.push(Edge::line(anchor.pos, next.pos));
            } else {
                let dir = delta.normalize_or_zero();
                let perpendicular = DVec2::new(-dir.y, dir.x);
                let ctrl = (anchor.pos + next.pos) * 0.5 + perpendicular * anchor.curve;
                edges.push(Edge::quadratic(anchor.pos, ctrl, next.pos));
            }
        }
        if !edges.is_empty() {
            shape.contours.push(Contour::new(edges));
        }
    }
    shape
}
