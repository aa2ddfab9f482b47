//! 2D shape geometry for the Vexel MSDF pipeline.
//!
//! A [`Shape`] is an ordered set of [`Contour`]s, each a closed loop of
//! [`Edge`]s (linear, quadratic or cubic segments).  Everything is
//! double-precision (`glam::DVec2`) because the distance-field generator is
//! sensitive to cancellation near edge joints.
//!
//! The crate is purely computational: no I/O, no globals, and every query is
//! deterministic over its inputs.

pub mod coloring;
pub mod contour;
pub mod edge;
pub mod shape;
pub mod solve;

pub use coloring::assign_colors;
pub use contour::Contour;
pub use edge::{Crossing, Edge, EdgeColor, Segment, SignedDistance};
pub use shape::Shape;
pub use solve::{solve_cubic, solve_quadratic};

use glam::DVec2;

/// Cross product (z component) of two 2D vectors.
#[inline]
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.perp_dot(b)
}

/// Median of three values: the scalar a multi-channel distance resolves to.
#[inline]
pub fn median(a: f64, b: f64, c: f64) -> f64 {
    a.max(b.min(c)).min(b.max(c))
}

/// Sign of `v` that never returns zero (zero maps to -1).  Used where a
/// degenerate zero distance must still pick a side deterministically.
#[inline]
pub fn non_zero_sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_picks_middle() {
        assert_eq!(median(1.0, 3.0, 2.0), 2.0);
        assert_eq!(median(-5.0, 0.0, 5.0), 0.0);
        assert_eq!(median(2.0, 2.0, 7.0), 2.0);
    }

    #[test]
    fn non_zero_sign_never_zero() {
        assert_eq!(non_zero_sign(0.0), -1.0);
        assert_eq!(non_zero_sign(0.5), 1.0);
        assert_eq!(non_zero_sign(-0.5), -1.0);
    }
}
