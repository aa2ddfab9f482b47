//! Horizontal scanline fill testing, independent of the distance math.

use vexel_geometry::{Crossing, Shape};

/// All crossings of a shape with one horizontal line, sorted by x.
///
/// This is the exact geometric ground truth the sign-correction pass uses to
/// overrule the combiner where degenerate overlaps produced the wrong sign.
pub struct Scanline {
    crossings: Vec<Crossing>,
}

impl Scanline {
    pub fn of(shape: &Shape, y: f64) -> Self {
        let mut crossings = Vec::new();
        shape.scanline_intersections(y, &mut crossings);
        Self { crossings }
    }

    /// Accumulated winding of every crossing at or before `x`.
    pub fn winding_at(&self, x: f64) -> i32 {
        let mut winding = 0;
        for crossing in &self.crossings {
            if crossing.x > x {
                break;
            }
            winding += crossing.direction;
        }
        winding
    }

    /// Non-zero-winding fill state at `x`.
    #[inline]
    pub fn filled(&self, x: f64) -> bool {
        self.winding_at(x) != 0
    }
}
