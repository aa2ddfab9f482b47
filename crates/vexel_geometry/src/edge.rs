//! Edge segments and their distance / scanline queries.
//!
//! Distance-field generators are often written with edges as a class hierarchy
//! with virtual dispatch; here the variant set is a closed enum so the
//! per-pixel hot loop is a plain exhaustive match.

use glam::DVec2;

use crate::solve::{solve_cubic, solve_quadratic};
use crate::{cross, non_zero_sign};

/// How many start positions / refinement steps the cubic nearest-point
/// search uses.
const CUBIC_SEARCH_STARTS: usize = 4;
const CUBIC_SEARCH_STEPS: usize = 4;

/// Channel mask routing an edge's distance contribution into the R/G/B
/// channels of a multi-channel distance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeColor(pub u8);

impl EdgeColor {
    pub const BLACK: Self = Self(0);
    pub const RED: Self = Self(1);
    pub const GREEN: Self = Self(2);
    pub const YELLOW: Self = Self(3);
    pub const BLUE: Self = Self(4);
    pub const MAGENTA: Self = Self(5);
    pub const CYAN: Self = Self(6);
    pub const WHITE: Self = Self(7);

    /// Does this mask include the given channel (0 = R, 1 = G, 2 = B)?
    #[inline]
    pub fn has_channel(self, channel: usize) -> bool {
        self.0 & (1 << channel) != 0
    }

    /// Bits shared with another mask.
    #[inline]
    pub fn common(self, other: Self) -> u8 {
        self.0 & other.0
    }
}

/// A signed distance plus the orthogonality of the approach, which breaks
/// ties between edges meeting at a shared endpoint: the edge the query point
/// is "more perpendicular" to wins.
#[derive(Debug, Clone, Copy)]
pub struct SignedDistance {
    pub distance: f64,
    pub dot: f64,
}

impl SignedDistance {
    /// Sentinel "infinitely far" distance; any real query beats it.
    pub const INFINITE: Self = Self {
        distance: -f64::MAX,
        dot: 1.0,
    };

    /// True when `self` is a strictly better (closer) candidate than `other`.
    #[inline]
    pub fn closer_than(&self, other: &SignedDistance) -> bool {
        self.distance.abs() < other.distance.abs()
            || (self.distance.abs() == other.distance.abs() && self.dot < other.dot)
    }
}

/// One crossing of an edge with a horizontal scanline.
#[derive(Debug, Clone, Copy)]
pub struct Crossing {
    pub x: f64,
    /// +1 when the edge crosses upward, -1 downward.
    pub direction: i32,
}

/// Geometry of one edge segment.  Endpoints of consecutive edges in a
/// contour must chain: `edge[i].end() == edge[i+1].start()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Linear { p0: DVec2, p1: DVec2 },
    Quadratic { p0: DVec2, ctrl: DVec2, p1: DVec2 },
    Cubic { p0: DVec2, ctrl0: DVec2, ctrl1: DVec2, p1: DVec2 },
}

/// An edge segment tagged with its MSDF channel mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub segment: Segment,
    pub color: EdgeColor,
}

impl Edge {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            color: EdgeColor::WHITE,
        }
    }

    pub fn line(p0: DVec2, p1: DVec2) -> Self {
        Self::new(Segment::Linear { p0, p1 })
    }

    pub fn quadratic(p0: DVec2, ctrl: DVec2, p1: DVec2) -> Self {
        Self::new(Segment::Quadratic { p0, ctrl, p1 })
    }

    pub fn cubic(p0: DVec2, ctrl0: DVec2, ctrl1: DVec2, p1: DVec2) -> Self {
        Self::new(Segment::Cubic {
            p0,
            ctrl0,
            ctrl1,
            p1,
        })
    }
}

impl Segment {
    pub fn start(&self) -> DVec2 {
        match *self {
            Segment::Linear { p0, .. }
            | Segment::Quadratic { p0, .. }
            | Segment::Cubic { p0, .. } => p0,
        }
    }

    pub fn end(&self) -> DVec2 {
        match *self {
            Segment::Linear { p1, .. }
            | Segment::Quadratic { p1, .. }
            | Segment::Cubic { p1, .. } => p1,
        }
    }

    /// The same segment shifted by `offset`.
    pub fn translated(&self, offset: DVec2) -> Segment {
        match *self {
            Segment::Linear { p0, p1 } => Segment::Linear {
                p0: p0 + offset,
                p1: p1 + offset,
            },
            Segment::Quadratic { p0, ctrl, p1 } => Segment::Quadratic {
                p0: p0 + offset,
                ctrl: ctrl + offset,
                p1: p1 + offset,
            },
            Segment::Cubic {
                p0,
                ctrl0,
                ctrl1,
                p1,
            } => Segment::Cubic {
                p0: p0 + offset,
                ctrl0: ctrl0 + offset,
                ctrl1: ctrl1 + offset,
                p1: p1 + offset,
            },
        }
    }

    /// Position at parameter `t` in [0, 1].
    pub fn point(&self, t: f64) -> DVec2 {
        match *self {
            Segment::Linear { p0, p1 } => p0.lerp(p1, t),
            Segment::Quadratic { p0, ctrl, p1 } => {
                let a = p0.lerp(ctrl, t);
                let b = ctrl.lerp(p1, t);
                a.lerp(b, t)
            }
            Segment::Cubic {
                p0,
                ctrl0,
                ctrl1,
                p1,
            } => {
                let ab = p0.lerp(ctrl0, t);
                let bc = ctrl0.lerp(ctrl1, t);
                let cd = ctrl1.lerp(p1, t);
                let abc = ab.lerp(bc, t);
                let bcd = bc.lerp(cd, t);
                abc.lerp(bcd, t)
            }
        }
    }

    /// Tangent at parameter `t`.  Degenerate control layouts (tangent of
    /// length zero at an endpoint) fall back to the chord so callers never
    /// see a zero direction.
    pub fn direction(&self, t: f64) -> DVec2 {
        match *self {
            Segment::Linear { p0, p1 } => p1 - p0,
            Segment::Quadratic { p0, ctrl, p1 } => {
                let tangent = (ctrl - p0).lerp(p1 - ctrl, t);
                if tangent.length_squared() == 0.0 {
                    p1 - p0
                } else {
                    tangent
                }
            }
            Segment::Cubic {
                p0,
                ctrl0,
                ctrl1,
                p1,
            } => {
                let tangent = (ctrl0 - p0)
                    .lerp(ctrl1 - ctrl0, t)
                    .lerp((ctrl1 - ctrl0).lerp(p1 - ctrl1, t), t);
                if tangent.length_squared() == 0.0 {
                    if t == 0.0 {
                        return ctrl1 - p0;
                    }
                    if t == 1.0 {
                        return p1 - ctrl0;
                    }
                }
                tangent
            }
        }
    }

    /// Signed distance from `origin` to the segment, together with the
    /// parameter of the nearest point (which may fall outside [0, 1] for a
    /// linear edge, signalling the endpoint domain was exceeded).
    pub fn signed_distance(&self, origin: DVec2) -> (SignedDistance, f64) {
        match *self {
            Segment::Linear { p0, p1 } => {
                let aq = origin - p0;
                let ab = p1 - p0;
                let param = aq.dot(ab) / ab.dot(ab).max(f64::MIN_POSITIVE);
                let eq = (if param > 0.5 { p1 } else { p0 }) - origin;
                let endpoint_distance = eq.length();
                if param > 0.0 && param < 1.0 {
                    // Left normal of ab: positive on the interior side of a
                    // counter-clockwise contour.
                    let ortho = DVec2::new(-ab.y, ab.x).normalize_or_zero();
                    let ortho_distance = ortho.dot(aq);
                    if ortho_distance.abs() < endpoint_distance {
                        return (
                            SignedDistance {
                                distance: ortho_distance,
                                dot: 0.0,
                            },
                            param,
                        );
                    }
                }
                (
                    SignedDistance {
                        distance: non_zero_sign(cross(ab, aq)) * endpoint_distance,
                        dot: ab.normalize_or_zero().dot(eq.normalize_or_zero()).abs(),
                    },
                    param,
                )
            }
            Segment::Quadratic { p0, ctrl, p1 } => {
                let qa = p0 - origin;
                let ab = ctrl - p0;
                let br = p1 - ctrl - ab;
                let a = br.dot(br);
                let b = 3.0 * ab.dot(br);
                let c = 2.0 * ab.dot(ab) + qa.dot(br);
                let d = qa.dot(ab);
                let mut roots = [0.0; 3];
                let solutions = solve_cubic(&mut roots, a, b, c, d);

                let mut ep_dir = self.direction(0.0);
                let mut min_distance = non_zero_sign(cross(qa, ep_dir)) * qa.length();
                let mut param = -qa.dot(ep_dir) / ep_dir.dot(ep_dir).max(f64::MIN_POSITIVE);
                {
                    ep_dir = self.direction(1.0);
                    let distance = (p1 - origin).length();
                    if distance < min_distance.abs() {
                        min_distance = non_zero_sign(cross(p1 - origin, ep_dir)) * distance;
                        param =
                            (origin - ctrl).dot(ep_dir) / ep_dir.dot(ep_dir).max(f64::MIN_POSITIVE);
                    }
                }
                for &t in roots.iter().take(solutions) {
                    if t > 0.0 && t < 1.0 {
                        let qe = qa + 2.0 * t * ab + t * t * br;
                        let distance = qe.length();
                        if distance <= min_distance.abs() {
                            min_distance = non_zero_sign(cross(qe, ab + t * br)) * distance;
                            param = t;
                        }
                    }
                }
                let dot = if (0.0..=1.0).contains(&param) {
                    0.0
                } else if param < 0.5 {
                    self.direction(0.0)
                        .normalize_or_zero()
                        .dot(qa.normalize_or_zero())
                        .abs()
                } else {
                    self.direction(1.0)
                        .normalize_or_zero()
                        .dot((p1 - origin).normalize_or_zero())
                        .abs()
                };
                (
                    SignedDistance {
                        distance: min_distance,
                        dot,
                    },
                    param,
                )
            }
            Segment::Cubic {
                p0,
                ctrl0,
                ctrl1,
                p1,
            } => {
                let qa = p0 - origin;
                let ab = ctrl0 - p0;
                let br = ctrl1 - ctrl0 - ab;
                let as_ = (p1 - ctrl1) - (ctrl1 - ctrl0) - br;

                let mut ep_dir = self.direction(0.0);
                let mut min_distance = non_zero_sign(cross(qa, ep_dir)) * qa.length();
                let mut param = -qa.dot(ep_dir) / ep_dir.dot(ep_dir).max(f64::MIN_POSITIVE);
                {
                    ep_dir = self.direction(1.0);
                    let distance = (p1 - origin).length();
                    if distance < min_distance.abs() {
                        min_distance = non_zero_sign(cross(p1 - origin, ep_dir)) * distance;
                        param = (ep_dir - (p1 - origin)).dot(ep_dir)
                            / ep_dir.dot(ep_dir).max(f64::MIN_POSITIVE);
                    }
                }
                // Iterative nearest-point refinement from a few seed params.
                for start in 0..=CUBIC_SEARCH_STARTS {
                    let mut t = start as f64 / CUBIC_SEARCH_STARTS as f64;
                    let mut qe = qa + 3.0 * t * ab + 3.0 * t * t * br + t * t * t * as_;
                    for _ in 0..CUBIC_SEARCH_STEPS {
                        let d1 = 3.0 * ab + 6.0 * t * br + 3.0 * t * t * as_;
                        let d2 = 6.0 * br + 6.0 * t * as_;
                        let denom = d1.dot(d1) + qe.dot(d2);
                        if denom == 0.0 {
                            break;
                        }
                        t -= qe.dot(d1) / denom;
                        if t <= 0.0 || t >= 1.0 {
                            break;
                        }
                        qe = qa + 3.0 * t * ab + 3.0 * t * t * br + t * t * t * as_;
                        let distance = qe.length();
                        if distance < min_distance.abs() {
                            min_distance = non_zero_sign(cross(qe, d1)) * distance;
                            param = t;
                        }
                    }
                }
                let dot = if (0.0..=1.0).contains(&param) {
                    0.0
                } else if param < 0.5 {
                    self.direction(0.0)
                        .normalize_or_zero()
                        .dot(qa.normalize_or_zero())
                        .abs()
                } else {
                    self.direction(1.0)
                        .normalize_or_zero()
                        .dot((p1 - origin).normalize_or_zero())
                        .abs()
                };
                (
                    SignedDistance {
                        distance: min_distance,
                        dot,
                    },
                    param,
                )
            }
        }
    }

    /// Convert a true signed distance into a perpendicular pseudo-distance
    /// when the nearest parameter fell outside [0, 1].  Keeps the field
    /// smooth past the literal end of the segment.
    pub fn distance_to_perpendicular_distance(
        &self,
        distance: &mut SignedDistance,
        origin: DVec2,
        param: f64,
    ) {
        if param < 0.0 {
            let dir = self.direction(0.0).normalize_or_zero();
            let aq = origin - self.start();
            let ts = aq.dot(dir);
            if ts < 0.0 {
                let perpendicular = cross(dir, aq);
                if perpendicular.abs() <= distance.distance.abs() {
                    distance.distance = perpendicular;
                    distance.dot = 0.0;
                }
            }
        } else if param > 1.0 {
            let dir = self.direction(1.0).normalize_or_zero();
            let bq = origin - self.end();
            let ts = bq.dot(dir);
            if ts > 0.0 {
                let perpendicular = cross(dir, bq);
                if perpendicular.abs() <= distance.distance.abs() {
                    distance.distance = perpendicular;
                    distance.dot = 0.0;
                }
            }
        }
    }

    /// Append this edge's crossings with the horizontal line at `y`.
    ///
    /// Parameters in the half-open range [0, 1) are counted, so a crossing at
    /// a joint is attributed to exactly one of the two edges sharing it.
    /// Tangent grazes (dy/dt == 0 at the root) contribute nothing.
    pub fn add_scanline_intersections(&self, y: f64, out: &mut Vec<Crossing>) {
        match *self {
            Segment::Linear { p0, p1 } => {
                if (p0.y <= y && p1.y > y) || (p1.y <= y && p0.y > y) {
                    let t = (y - p0.y) / (p1.y - p0.y);
                    out.push(Crossing {
                        x: p0.x + t * (p1.x - p0.x),
                        direction: if p1.y > p0.y { 1 } else { -1 },
                    });
                }
            }
            Segment::Quadratic { p0, ctrl, p1 } => {
                let a = p0.y - 2.0 * ctrl.y + p1.y;
                let b = 2.0 * (ctrl.y - p0.y);
                let c = p0.y - y;
                let mut roots = [0.0; 3];
                let n = solve_quadratic(&mut roots, a, b, c);
                for &t in roots.iter().take(n) {
                    if (0.0..1.0).contains(&t) {
                        let dy = 2.0 * (1.0 - t) * (ctrl.y - p0.y) + 2.0 * t * (p1.y - ctrl.y);
                        if dy != 0.0 {
                            out.push(Crossing {
                                x: self.point(t).x,
                                direction: if dy > 0.0 { 1 } else { -1 },
                            });
                        }
                    }
                }
            }
            Segment::Cubic {
                p0,
                ctrl0,
                ctrl1,
                p1,
            } => {
                let a = -p0.y + 3.0 * ctrl0.y - 3.0 * ctrl1.y + p1.y;
                let b = 3.0 * (p0.y - 2.0 * ctrl0.y + ctrl1.y);
                let c = 3.0 * (ctrl0.y - p0.y);
                let d = p0.y - y;
                let mut roots = [0.0; 3];
                let n = solve_cubic(&mut roots, a, b, c, d);
                for &t in roots.iter().take(n) {
                    if (0.0..1.0).contains(&t) {
                        let dy = 3.0 * (1.0 - t) * (1.0 - t) * (ctrl0.y - p0.y)
                            + 6.0 * (1.0 - t) * t * (ctrl1.y - ctrl0.y)
                            + 3.0 * t * t * (p1.y - ctrl1.y);
                        if dy != 0.0 {
                            out.push(Crossing {
                                x: self.point(t).x,
                                direction: if dy > 0.0 { 1 } else { -1 },
                            });
                        }
                    }
                }
            }
        }
    }

    /// Split into three sub-segments covering [0,1/3], [1/3,2/3], [2/3,1].
    /// Needed by the single-corner ("teardrop") edge-coloring case.
    pub fn split_in_thirds(&self) -> [Segment; 3] {
        match *self {
            Segment::Linear { .. } => [
                Segment::Linear {
                    p0: self.point(0.0),
                    p1: self.point(1.0 / 3.0),
                },
                Segment::Linear {
                    p0: self.point(1.0 / 3.0),
                    p1: self.point(2.0 / 3.0),
                },
                Segment::Linear {
                    p0: self.point(2.0 / 3.0),
                    p1: self.point(1.0),
                },
            ],
            Segment::Quadratic { p0, ctrl, p1 } => [
                Segment::Quadratic {
                    p0,
                    ctrl: p0.lerp(ctrl, 1.0 / 3.0),
                    p1: self.point(1.0 / 3.0),
                },
                Segment::Quadratic {
                    p0: self.point(1.0 / 3.0),
                    ctrl: p0.lerp(ctrl, 5.0 / 9.0).lerp(ctrl.lerp(p1, 4.0 / 9.0), 0.5),
                    p1: self.point(2.0 / 3.0),
                },
                Segment::Quadratic {
                    p0: self.point(2.0 / 3.0),
                    ctrl: ctrl.lerp(p1, 2.0 / 3.0),
                    p1,
                },
            ],
            Segment::Cubic {
                p0,
                ctrl0,
                ctrl1,
                p1,
            } => [
                Segment::Cubic {
                    p0,
                    ctrl0: if p0 == ctrl0 { p0 } else { p0.lerp(ctrl0, 1.0 / 3.0) },
                    ctrl1: p0
                        .lerp(ctrl0, 1.0 / 3.0)
                        .lerp(ctrl0.lerp(ctrl1, 1.0 / 3.0), 1.0 / 3.0),
                    p1: self.point(1.0 / 3.0),
                },
                Segment::Cubic {
                    p0: self.point(1.0 / 3.0),
                    ctrl0: p0
                        .lerp(ctrl0, 1.0 / 3.0)
                        .lerp(ctrl0.lerp(ctrl1, 1.0 / 3.0), 1.0 / 3.0)
                        .lerp(
                            ctrl0
                                .lerp(ctrl1, 1.0 / 3.0)
                                .lerp(ctrl1.lerp(p1, 1.0 / 3.0), 1.0 / 3.0),
                            2.0 / 3.0,
                        ),
                    ctrl1: p0
                        .lerp(ctrl0, 2.0 / 3.0)
                        .lerp(ctrl0.lerp(ctrl1, 2.0 / 3.0), 2.0 / 3.0)
                        .lerp(
                            ctrl0
                                .lerp(ctrl1, 2.0 / 3.0)
                                .lerp(ctrl1.lerp(p1, 2.0 / 3.0), 2.0 / 3.0),
                            1.0 / 3.0,
                        ),
                    p1: self.point(2.0 / 3.0),
                },
                Segment::Cubic {
                    p0: self.point(2.0 / 3.0),
                    ctrl0: ctrl0
                        .lerp(ctrl1, 2.0 / 3.0)
                        .lerp(ctrl1.lerp(p1, 2.0 / 3.0), 2.0 / 3.0),
                    ctrl1: if ctrl1 == p1 { p1 } else { ctrl1.lerp(p1, 2.0 / 3.0) },
                    p1,
                },
            ],
        }
    }
}
