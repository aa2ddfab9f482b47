//! Font glyph outline to shape conversion.
//!
//! Consumes already-parsed TrueType-style outlines: per contour, an ordered
//! list of points tagged on-curve, conic (quadratic control) or cubic
//! control.  Consecutive conic controls imply an on-curve point at their
//! midpoint.  Glyph space is Y-up, so the resulting shape carries the
//! `inverse_y_axis` flag for the generator's row flip.

use glam::DVec2;
use vexel_geometry::{Contour, Edge, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTag {
    OnCurve,
    Conic,
    Cubic,
}

#[derive(Debug, Clone, Copy)]
pub struct OutlinePoint {
    pub pos: DVec2,
    pub tag: PointTag,
}

impl OutlinePoint {
    pub fn on_curve(x: f64, y: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            tag: PointTag::OnCurve,
        }
    }

    pub fn conic(x: f64, y: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            tag: PointTag::Conic,
        }
    }

    pub fn cubic(x: f64, y: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            tag: PointTag::Cubic,
        }
    }
}

/// Convert glyph outline contours into a shape.  Malformed contours (fewer
/// than two points, cubic controls not in pairs) are skipped rather than
/// reported; coloring is left to the caller.
pub fn shape_from_outline(contours: &[Vec<OutlinePoint>]) -> Shape {
    let mut shape = Shape::new();
    shape.inverse_y_axis = true;
    for points in contours {
        if let Some(contour) = build_contour(points) {
            if !contour.edges.is_empty() {
                shape.contours.push(contour);
            }
        }
    }
    shape
}

fn build_contour(points: &[OutlinePoint]) -> Option<Contour> {
    if points.len() < 2 {
        return None;
    }
    // Rotate the contour to begin at an on-curve point; an all-conic contour
    // gets a synthetic start at the midpoint of its wrap-around pair.
    let n = points.len();
    let mut seq: Vec<OutlinePoint> = Vec::with_capacity(n + 2);
    match points.iter().position(|p| p.tag == PointTag::OnCurve) {
        Some(start) => {
            seq.extend(points[start..].iter().chain(points[..start].iter()));
        }
        None => {
            if points.iter().any(|p| p.tag == PointTag::Cubic) {
                return None;
            }
            seq.push(OutlinePoint {
                pos: (points[n - 1].pos + points[0].pos) * 0.5,
                tag: PointTag::OnCurve,
            });
            seq.extend(points.iter());
        }
    }
    let first = seq[0];
    seq.push(first);

    let mut edges = Vec::new();
    let mut cursor = seq[0].pos;
    let mut i = 1;
    while i < seq.len() {
        match seq[i].tag {
            PointTag::OnCurve => {
                if seq[i].pos != cursor {
                    edges.push(Edge::line(cursor, seq[i].pos));
                }
                cursor = seq[i].pos;
                i += 1;
            }
            PointTag::Conic => {
                let ctrl = seq[i].pos;
                let next = seq[i + 1];
                match next.tag {
                    PointTag::OnCurve => {
                        edges.push(Edge::quadratic(cursor, ctrl, next.pos));
                        cursor = next.pos;
                        i += 2;
                    }
                    PointTag::Conic => {
                        let end = (ctrl + next.pos) * 0.5;
                        edges.push(Edge::quadratic(cursor, ctrl, end));
                        cursor = end;
                        i += 1;
                    }
                    PointTag::Cubic => return None,
                }
            }
            PointTag::Cubic => {
                if i + 2 >= seq.len()
                    || seq[i + 1].tag != PointTag::Cubic
                    || seq[i + 2].tag != PointTag::OnCurve
                {
                    return None;
                }
                edges.push(Edge::cubic(cursor, seq[i].pos, seq[i + 1].pos, seq[i + 2].pos));
                cursor = seq[i + 2].pos;
                i += 3;
            }
        }
    }
    Some(Contour::new(edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use vexel_geometry::Segment;

    fn assert_chained(contour: &Contour) {
        let n = contour.edges.len();
        for i in 0..n {
            let end = contour.edges[i].segment.point(1.0);
            let start = contour.edges[(i + 1) % n].segment.point(0.0);
            assert!((end - start).length() < 1e-12);
        }
    }

    #[test]
    fn on_curve_points_make_lines() {
        let shape = shape_from_outline(&[vec![
            OutlinePoint::on_curve(0.0, 0.0),
            OutlinePoint::on_curve(1.0, 0.0),
            OutlinePoint::on_curve(1.0, 1.0),
            OutlinePoint::on_curve(0.0, 1.0),
        ]]);
        assert!(shape.inverse_y_axis);
        assert_eq!(shape.contours.len(), 1);
        let contour = &shape.contours[0];
        assert_eq!(contour.edges.len(), 4);
        assert!(contour
            .edges
            .iter()
            .all(|e| matches!(e.segment, Segment::Linear { .. })));
        assert_chained(contour);
    }

    #[test]
    fn all_conic_contour_synthesizes_midpoints() {
        // A TrueType "circle": four conic controls, no explicit on-curve
        // points.  Reconstruction yields four quadratics joined at implied
        // midpoints.
        let shape = shape_from_outline(&[vec![
            OutlinePoint::conic(2.0, 0.0),
            OutlinePoint::conic(0.0, 2.0),
            OutlinePoint::conic(-2.0, 0.0),
            OutlinePoint::conic(0.0, -2.0),
        ]]);
        let contour = &shape.contours[0];
        assert_eq!(contour.edges.len(), 4);
        assert!(contour
            .edges
            .iter()
            .all(|e| matches!(e.segment, Segment::Quadratic { .. })));
        assert_chained(contour);
        // The synthetic start is the wrap-around midpoint.
        assert_eq!(contour.edges[0].segment.point(0.0), dvec2(1.0, -1.0));
        assert!(shape.filled_at(dvec2(0.0, 0.0)));
    }

    #[test]
    fn mixed_conic_and_on_curve() {
        // Square with one rounded corner.
        let shape = shape_from_outline(&[vec![
            OutlinePoint::on_curve(0.0, 0.0),
            OutlinePoint::on_curve(2.0, 0.0),
            OutlinePoint::conic(2.0, 2.0),
            OutlinePoint::on_curve(0.0, 2.0),
        ]]);
        let contour = &shape.contours[0];
        assert_eq!(contour.edges.len(), 3);
        assert!(matches!(contour.edges[1].segment, Segment::Quadratic { .. }));
        assert_chained(contour);
    }

    #[test]
    fn cubic_pair_builds_a_cubic_edge() {
        let shape = shape_from_outline(&[vec![
            OutlinePoint::on_curve(0.0, 0.0),
            OutlinePoint::on_curve(3.0, 0.0),
            OutlinePoint::cubic(3.0, 2.0),
            OutlinePoint::cubic(1.0, 3.0),
            OutlinePoint::on_curve(0.0, 3.0),
        ]]);
        let contour = &shape.contours[0];
        assert_eq!(contour.edges.len(), 3);
        assert!(matches!(contour.edges[1].segment, Segment::Cubic { .. }));
        assert_chained(contour);
    }

    #[test]
    fn malformed_contours_are_skipped() {
        let shape = shape_from_outline(&[
            vec![OutlinePoint::on_curve(0.0, 0.0)],
            vec![
                OutlinePoint::on_curve(0.0, 0.0),
                OutlinePoint::cubic(1.0, 0.0),
                OutlinePoint::on_curve(2.0, 0.0),
            ],
        ]);
        assert!(shape.contours.is_empty());
    }
}
