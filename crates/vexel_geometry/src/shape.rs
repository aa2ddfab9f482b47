//! Ordered collection of contours forming one drawable shape.

use glam::DVec2;

use crate::contour::Contour;
use crate::edge::Crossing;

/// A complete vector shape: every contour it owns, plus the orientation of
/// its Y axis.
///
/// Font glyph producers are Y-up; bitmap rows are written top-down.  When
/// `inverse_y_axis` is set the generator writes row `y` of shape space into
/// row `height - 1 - y` of the bitmap, leaving the distance math unchanged.
///
/// Shapes are built once (and color-coded once) and then consumed read-only
/// by the generator.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub contours: Vec<Contour>,
    pub inverse_y_axis: bool,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of edges across all contours.
    pub fn edge_count(&self) -> usize {
        self.contours.iter().map(|c| c.edges.len()).sum()
    }

    /// Conservative bounding box over all contours; `None` if the shape has
    /// no edges at all.
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let mut acc: Option<(DVec2, DVec2)> = None;
        for contour in &self.contours {
            if let Some((min, max)) = contour.bounds() {
                acc = Some(match acc {
                    Some((amin, amax)) => (amin.min(min), amax.max(max)),
                    None => (min, max),
                });
            }
        }
        acc
    }

    /// Collect every edge crossing with the horizontal line at `y`, sorted
    /// by x.  This is the exact geometric fill test the sign-correction pass
    /// relies on.
    pub fn scanline_intersections(&self, y: f64, out: &mut Vec<Crossing>) {
        out.clear();
        for contour in &self.contours {
            contour.add_scanline_intersections(y, out);
        }
        out.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    /// Non-zero-winding fill test at a single point, via scanline counting.
    pub fn filled_at(&self, p: DVec2) -> bool {
        let mut crossings = Vec::new();
        self.scanline_intersections(p.y, &mut crossings);
        let mut winding = 0;
        for crossing in &crossings {
            if crossing.x <= p.x {
                winding += crossing.direction;
            }
        }
        winding != 0
    }
}
