//! Interpolation-artifact correction.
//!
//! Between texels whose channels cross each other, the interpolated median
//! can spike or invert, which renders as a clipped corner or a dent.  This
//! pass builds a stencil over the bitmap: corner and edge texels that
//! legitimately carry channel divergence are PROTECTED, texels whose
//! interpolation with a neighbor misbehaves are marked ERROR and flattened
//! to their median.

use glam::DVec2;
use rayon::prelude::*;
use vexel_geometry::{median, solve_quadratic, Shape};

use crate::bitmap::MsdfBitmap;
use crate::generate::MsdfConfig;

const ERROR: u8 = 1;
const PROTECTED: u8 = 2;

// Interpolation parameters closer than this to a texel are treated as the
// texel itself; channel pairs are equal at almost every texel, so t = 0 and
// t = 1 are permanent false positives.
const ARTIFACT_T_EPSILON: f64 = 0.01;
const PROTECTION_RADIUS_TOLERANCE: f64 = 1.001;
// Minimum ratio between the actual and allowed deviation of the
// interpolated median before a texel pair counts as an artifact.
const MIN_DEVIATION_RATIO: f64 = 1.11111111111111111;

const FLAG_CANDIDATE: u8 = 1;
const FLAG_ARTIFACT: u8 = 2;

#[inline]
fn med3(texel: &[f32]) -> f32 {
    median(texel[0] as f64, texel[1] as f64, texel[2] as f64) as f32
}

#[inline]
fn mix(a: f32, b: f32, t: f64) -> f32 {
    (a as f64 + t * (b as f64 - a as f64)) as f32
}

/// Median of the channel values linearly interpolated between two texels.
#[inline]
fn interpolated_median(a: &[f32], b: &[f32], t: f64) -> f32 {
    median(
        mix(a[0], b[0], t) as f64,
        mix(a[1], b[1], t) as f64,
        mix(a[2], b[2], t) as f64,
    ) as f32
}

/// Median along the diagonal of a bilinear patch: channel value at `t` is
/// `a + t*(l + t*q)`.
#[inline]
fn diagonal_median(a: &[f32], l: &[f64; 3], q: &[f64; 3], t: f64) -> f32 {
    median(
        t * (t * q[0] + l[0]) + a[0] as f64,
        t * (t * q[1] + l[1]) + a[1] as f64,
        t * (t * q[2] + l[2]) + a[2] as f64,
    ) as f32
}

/// Decide whether an interpolated median `xm` between endpoint medians `am`
/// (at `at`) and `bm` (at `bt`) is suspect, and if so, whether its deviation
/// exceeds what the distance span between the endpoints allows.
///
/// Protected texels only report inversions (the interpolated median crosses
/// 0.5 while both endpoints sit on the same side); unprotected texels also
/// report any median that escapes the interval between its endpoints.
fn range_test(
    span: f64,
    protected: bool,
    at: f64,
    bt: f64,
    xt: f64,
    am: f32,
    bm: f32,
    xm: f32,
) -> u8 {
    if (am > 0.5 && bm > 0.5 && xm <= 0.5)
        || (am < 0.5 && bm < 0.5 && xm >= 0.5)
        || (!protected && median(am as f64, bm as f64, xm as f64) as f32 != xm)
    {
        let ax_span = span * (xt - at);
        let bx_span = span * (bt - xt);
        let xm = xm as f64;
        let (am, bm) = (am as f64, bm as f64);
        if !(xm >= am - ax_span && xm <= am + ax_span && xm >= bm - bx_span && xm <= bm + bx_span)
        {
            return FLAG_CANDIDATE | FLAG_ARTIFACT;
        }
        return FLAG_CANDIDATE;
    }
    0
}

fn linear_artifact_for_pair(
    span: f64,
    protected: bool,
    am: f32,
    bm: f32,
    a: &[f32],
    b: &[f32],
    d_a: f32,
    d_b: f32,
) -> bool {
    // Ratio at which the two channels meet.
    let t = d_a as f64 / (d_a as f64 - d_b as f64);
    if t > ARTIFACT_T_EPSILON && t < 1.0 - ARTIFACT_T_EPSILON {
        let xm = interpolated_median(a, b, t);
        return range_test(span, protected, 0.0, 1.0, t, am, bm, xm) & FLAG_ARTIFACT != 0;
    }
    false
}

/// Artifact test between two horizontally or vertically adjacent texels.
/// Only the texel further from the edge reports, so a genuine edge between
/// the pair never flags both sides.
fn has_linear_artifact(span: f64, protected: bool, am: f32, a: &[f32], b: &[f32]) -> bool {
    let bm = med3(b);
    (am - 0.5).abs() >= (bm - 0.5).abs()
        && (linear_artifact_for_pair(span, protected, am, bm, a, b, a[1] - a[0], b[1] - b[0])
            || linear_artifact_for_pair(span, protected, am, bm, a, b, a[2] - a[1], b[2] - b[1])
            || linear_artifact_for_pair(span, protected, am, bm, a, b, a[0] - a[2], b[0] - b[2]))
}

#[allow(clippy::too_many_arguments)]
fn diagonal_artifact_for_pair(
    span: f64,
    protected: bool,
    am: f32,
    dm: f32,
    a: &[f32],
    l: &[f64; 3],
    q: &[f64; 3],
    d_a: f64,
    d_bc: f64,
    d_d: f64,
    t_ex0: f64,
    t_ex1: f64,
) -> bool {
    // Parameters along the diagonal where the two channels meet.
    let mut roots = [0.0; 3];
    let n = solve_quadratic(&mut roots, d_d - d_bc + d_a, d_bc - 2.0 * d_a, d_a);
    for &t in &roots[..n] {
        if !(t > ARTIFACT_T_EPSILON && t < 1.0 - ARTIFACT_T_EPSILON) {
            continue;
        }
        let xm = diagonal_median(a, l, q, t);
        let mut flags = range_test(span, protected, 0.0, 1.0, t, am, dm, xm);
        // The bilinear median is not monotone between the corners; also test
        // against the channel extremes that fall between xm and each corner.
        for &t_ex in &[t_ex0, t_ex1] {
            if t_ex > 0.0 && t_ex < 1.0 {
                let em = diagonal_median(a, l, q, t_ex);
                if t_ex > t {
                    flags |= range_test(span, protected, 0.0, t_ex, t, am, em, xm);
                } else {
                    flags |= range_test(span, protected, t_ex, 1.0, t, em, dm, xm);
                }
            }
        }
        if flags & FLAG_ARTIFACT != 0 {
            return true;
        }
    }
    false
}

/// Artifact test across a texel quad's diagonal, from `a` to its diagonal
/// neighbor `d`, with `b` and `c` the two shared orthogonal neighbors.
fn has_diagonal_artifact(
    span: f64,
    protected: bool,
    am: f32,
    a: &[f32],
    b: &[f32],
    c: &[f32],
    d: &[f32],
) -> bool {
    let dm = med3(d);
    if (am - 0.5).abs() < (dm - 0.5).abs() {
        return false;
    }
    let mut l = [0.0; 3];
    let mut q = [0.0; 3];
    let mut t_ex = [0.0; 3];
    for ch in 0..3 {
        l[ch] = b[ch] as f64 + c[ch] as f64 - 2.0 * a[ch] as f64;
        q[ch] = a[ch] as f64 - b[ch] as f64 - c[ch] as f64 + d[ch] as f64;
        t_ex[ch] = -0.5 * l[ch] / q[ch];
    }
    let d_pair = |i: usize, j: usize| {
        (
            (a[j] - a[i]) as f64,
            (b[j] - b[i]) as f64 + (c[j] - c[i]) as f64,
            (d[j] - d[i]) as f64,
        )
    };
    for &(i, j) in &[(0usize, 1usize), (1, 2), (2, 0)] {
        let (d_a, d_bc, d_d) = d_pair(i, j);
        if diagonal_artifact_for_pair(
            span, protected, am, dm, a, &l, &q, d_a, d_bc, d_d, t_ex[i], t_ex[j],
        ) {
            return true;
        }
    }
    false
}

/// Interpolation ratio at which `channel` crosses 0.5 between texels `a` and
/// `b`, confirmed as an actual edge (the crossing channel is the median
/// there).  Returns the channel's mask bit, or 0.
fn edge_between_texels_channel(a: &[f32], b: &[f32], channel: usize) -> u8 {
    let t = (a[channel] as f64 - 0.5) / (a[channel] as f64 - b[channel] as f64);
    if t > 0.0 && t < 1.0 {
        let c = [mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t)];
        if median(c[0] as f64, c[1] as f64, c[2] as f64) as f32 == c[channel] {
            return 1 << channel;
        }
    }
    0
}

fn edge_between_texels(a: &[f32], b: &[f32]) -> u8 {
    edge_between_texels_channel(a, b, 0)
        | edge_between_texels_channel(a, b, 1)
        | edge_between_texels_channel(a, b, 2)
}

/// Stencil of ERROR / PROTECTED flags over a bitmap.
pub struct ErrorCorrection {
    width: usize,
    height: usize,
    stencil: Vec<u8>,
}

impl ErrorCorrection {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stencil: vec![0; width * height],
        }
    }

    #[inline]
    pub fn protected_at(&self, x: usize, y: usize) -> bool {
        self.stencil[y * self.width + x] & PROTECTED != 0
    }

    #[inline]
    pub fn error_at(&self, x: usize, y: usize) -> bool {
        self.stencil[y * self.width + x] & ERROR != 0
    }

    /// Protect every texel; only inversion artifacts will be reported.
    pub fn protect_all(&mut self) {
        for flag in &mut self.stencil {
            *flag |= PROTECTED;
        }
    }

    /// Protect the texel quads containing shape corners, where channel
    /// divergence is the whole point of the encoding.
    ///
    /// A corner is a meeting of two edges whose colors share at most one
    /// channel.
    pub fn protect_corners(&mut self, shape: &Shape, config: &MsdfConfig) {
        for contour in &shape.contours {
            if contour.edges.is_empty() {
                continue;
            }
            let mut prev_color = contour.edges[contour.edges.len() - 1].color;
            for edge in &contour.edges {
                let common = prev_color.0 & edge.color.0;
                prev_color = edge.color;
                if common & common.wrapping_sub(1) != 0 {
                    continue;
                }
                let mut p = config.project(edge.segment.start());
                if shape.inverse_y_axis {
                    p.y = self.height as f64 - p.y;
                }
                // The corner point falls between up to four texel centers.
                let l = (p.x - 0.5).floor() as i64;
                let b = (p.y - 0.5).floor() as i64;
                for (tx, ty) in [(l, b), (l + 1, b), (l, b + 1), (l + 1, b + 1)] {
                    if tx >= 0 && ty >= 0 && (tx as usize) < self.width && (ty as usize) < self.height
                    {
                        self.stencil[ty as usize * self.width + tx as usize] |= PROTECTED;
                    }
                }
            }
        }
    }

    /// Protect the divergent channels of texel pairs that an edge of the
    /// shape passes between.  Flattening either side of such a pair would
    /// move the reconstructed edge.
    pub fn protect_edges(&mut self, bitmap: &MsdfBitmap, config: &MsdfConfig) {
        let (width, height) = (self.width, self.height);
        let inv_range = 1.0 / config.range;

        // Horizontal pairs.
        let radius =
            PROTECTION_RADIUS_TOLERANCE * config.unproject_vector(DVec2::new(inv_range, 0.0)).length();
        for y in 0..height {
            for x in 0..width.saturating_sub(1) {
                let left = bitmap.pixel(x, y);
                let right = bitmap.pixel(x + 1, y);
                let lm = med3(left);
                let rm = med3(right);
                if ((lm - 0.5).abs() + (rm - 0.5).abs()) < radius as f32 {
                    let mask = edge_between_texels(left, right);
                    self.protect_extreme_channels(x, y, left, lm, mask);
                    self.protect_extreme_channels(x + 1, y, right, rm, mask);
                }
            }
        }

        // Vertical pairs.
        let radius =
            PROTECTION_RADIUS_TOLERANCE * config.unproject_vector(DVec2::new(0.0, inv_range)).length();
        for y in 0..height.saturating_sub(1) {
            for x in 0..width {
                let bottom = bitmap.pixel(x, y);
                let top = bitmap.pixel(x, y + 1);
                let bm = med3(bottom);
                let tm = med3(top);
                if ((bm - 0.5).abs() + (tm - 0.5).abs()) < radius as f32 {
                    let mask = edge_between_texels(bottom, top);
                    self.protect_extreme_channels(x, y, bottom, bm, mask);
                    self.protect_extreme_channels(x, y + 1, top, tm, mask);
                }
            }
        }

        // Diagonal pairs.
        let radius =
            PROTECTION_RADIUS_TOLERANCE * inv_range * config.unproject_vector(DVec2::ONE).length();
        for y in 0..height.saturating_sub(1) {
            for x in 0..width.saturating_sub(1) {
                let lb = bitmap.pixel(x, y);
                let rb = bitmap.pixel(x + 1, y);
                let lt = bitmap.pixel(x, y + 1);
                let rt = bitmap.pixel(x + 1, y + 1);
                let mlb = med3(lb);
                let mrb = med3(rb);
                let mlt = med3(lt);
                let mrt = med3(rt);
                if ((mlb - 0.5).abs() + (mrt - 0.5).abs()) < radius as f32 {
                    let mask = edge_between_texels(lb, rt);
                    self.protect_extreme_channels(x, y, lb, mlb, mask);
                    self.protect_extreme_channels(x + 1, y + 1, rt, mrt, mask);
                }
                if ((mrb - 0.5).abs() + (mlt - 0.5).abs()) < radius as f32 {
                    let mask = edge_between_texels(rb, lt);
                    self.protect_extreme_channels(x + 1, y, rb, mrb, mask);
                    self.protect_extreme_channels(x, y + 1, lt, mlt, mask);
                }
            }
        }
    }

    fn protect_extreme_channels(&mut self, x: usize, y: usize, texel: &[f32], m: f32, mask: u8) {
        if (mask & 1 != 0 && texel[0] != m)
            || (mask & 2 != 0 && texel[1] != m)
            || (mask & 4 != 0 && texel[2] != m)
        {
            self.stencil[y * self.width + x] |= PROTECTED;
        }
    }

    /// Mark texels whose interpolation with any of their eight neighbors
    /// produces an artifact.
    pub fn find_errors(&mut self, bitmap: &MsdfBitmap, config: &MsdfConfig) {
        let (width, height) = (self.width, self.height);
        let inv_range = 1.0 / config.range;
        // Allowed median deviation per unit of interpolation, per direction.
        let h_span =
            MIN_DEVIATION_RATIO * config.unproject_vector(DVec2::new(inv_range, 0.0)).length();
        let v_span =
            MIN_DEVIATION_RATIO * config.unproject_vector(DVec2::new(0.0, inv_range)).length();
        let d_span = MIN_DEVIATION_RATIO * inv_range * config.unproject_vector(DVec2::ONE).length();

        self.stencil
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, stencil_row)| {
                for (x, flag) in stencil_row.iter_mut().enumerate() {
                    let c = bitmap.pixel(x, y);
                    let cm = med3(c);
                    let protected = *flag & PROTECTED != 0;
                    let pix = |x: usize, y: usize| bitmap.pixel(x, y);
                    let error = (x > 0
                        && has_linear_artifact(h_span, protected, cm, c, pix(x - 1, y)))
                        || (y > 0 && has_linear_artifact(v_span, protected, cm, c, pix(x, y - 1)))
                        || (x + 1 < width
                            && has_linear_artifact(h_span, protected, cm, c, pix(x + 1, y)))
                        || (y + 1 < height
                            && has_linear_artifact(v_span, protected, cm, c, pix(x, y + 1)))
                        || (x > 0
                            && y > 0
                            && has_diagonal_artifact(
                                d_span,
                                protected,
                                cm,
                                c,
                                pix(x - 1, y),
                                pix(x, y - 1),
                                pix(x - 1, y - 1),
                            ))
                        || (x + 1 < width
                            && y > 0
                            && has_diagonal_artifact(
                                d_span,
                                protected,
                                cm,
                                c,
                                pix(x + 1, y),
                                pix(x, y - 1),
                                pix(x + 1, y - 1),
                            ))
                        || (x > 0
                            && y + 1 < height
                            && has_diagonal_artifact(
                                d_span,
                                protected,
                                cm,
                                c,
                                pix(x - 1, y),
                                pix(x, y + 1),
                                pix(x - 1, y + 1),
                            ))
                        || (x + 1 < width
                            && y + 1 < height
                            && has_diagonal_artifact(
                                d_span,
                                protected,
                                cm,
                                c,
                                pix(x + 1, y),
                                pix(x, y + 1),
                                pix(x + 1, y + 1),
                            ));
                    if error {
                        *flag |= ERROR;
                    }
                }
            });
    }

    /// Flatten every marked texel to its median, making it a plain signed
    /// distance that cannot interpolate into an artifact.
    pub fn apply(&self, bitmap: &mut MsdfBitmap) {
        for (texel, &flag) in bitmap.data.chunks_exact_mut(3).zip(&self.stencil) {
            if flag & ERROR != 0 {
                let m = median(texel[0] as f64, texel[1] as f64, texel[2] as f64) as f32;
                texel[0] = m;
                texel[1] = m;
                texel[2] = m;
            }
        }
    }
}

/// Run the full pass: protect corners and edges, scan for artifacts, then
/// flatten the offenders.
pub fn correct_errors(bitmap: &mut MsdfBitmap, shape: &Shape, config: &MsdfConfig) {
    if bitmap.width == 0 || bitmap.height == 0 {
        return;
    }
    let mut correction = ErrorCorrection::new(bitmap.width, bitmap.height);
    correction.protect_corners(shape, config);
    correction.protect_edges(bitmap, config);
    correction.find_errors(bitmap, config);
    let flattened = correction
        .stencil
        .iter()
        .filter(|&&flag| flag & ERROR != 0)
        .count();
    if flattened > 0 {
        log::debug!(
            "error correction flattened {flattened}/{} texels",
            bitmap.width * bitmap.height
        );
    }
    correction.apply(bitmap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use vexel_geometry::{assign_colors, Contour, Edge};

    use crate::generate::generate_msdf;

    fn config(range: f64, scale: f64) -> MsdfConfig {
        MsdfConfig::new(range, dvec2(scale, scale), dvec2(0.5, 0.5))
    }

    fn unit_square() -> Shape {
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
        shape
    }

    #[test]
    fn corner_quads_are_protected() {
        let shape = unit_square();
        let cfg = config(0.5, 8.0);
        let mut correction = ErrorCorrection::new(16, 16);
        correction.protect_corners(&shape, &cfg);
        // Corner (0,0) projects to bitmap (4,4); its quad is (3,3)..(4,4).
        assert!(correction.protected_at(3, 3));
        assert!(correction.protected_at(4, 3));
        assert!(correction.protected_at(3, 4));
        assert!(correction.protected_at(4, 4));
        assert!(!correction.protected_at(8, 8));
    }

    #[test]
    fn inversion_artifact_is_flattened() {
        // Two adjacent texels whose red and green channels cross midway; the
        // interpolated median there drops to 0.5 although both medians are
        // 0.9, cutting a notch into the reconstructed edge.
        let mut bitmap = MsdfBitmap::new(2, 1);
        bitmap.pixel_mut(0, 0).copy_from_slice(&[1.0, 0.0, 0.9]);
        bitmap.pixel_mut(1, 0).copy_from_slice(&[0.0, 1.0, 0.9]);
        let cfg = config(0.5, 8.0);
        let mut correction = ErrorCorrection::new(2, 1);
        correction.find_errors(&bitmap, &cfg);
        assert!(correction.error_at(0, 0));
        assert!(correction.error_at(1, 0));
        correction.apply(&mut bitmap);
        assert_eq!(bitmap.pixel(0, 0), &[0.9, 0.9, 0.9]);
        assert_eq!(bitmap.pixel(1, 0), &[0.9, 0.9, 0.9]);
    }

    #[test]
    fn protection_suppresses_non_inversion_artifact() {
        // The interpolated median dips but stays above 0.5: an artifact only
        // for unprotected texels.
        let mut bitmap = MsdfBitmap::new(2, 1);
        bitmap.pixel_mut(0, 0).copy_from_slice(&[1.0, 0.0, 0.9]);
        bitmap.pixel_mut(1, 0).copy_from_slice(&[0.6, 0.8, 0.7]);
        let cfg = config(0.5, 32.0);

        let mut unprotected = ErrorCorrection::new(2, 1);
        unprotected.find_errors(&bitmap, &cfg);
        assert!(unprotected.error_at(0, 0));
        // The nearer texel never reports for the pair.
        assert!(!unprotected.error_at(1, 0));

        let mut protected = ErrorCorrection::new(2, 1);
        protected.protect_all();
        protected.find_errors(&bitmap, &cfg);
        assert!(!protected.error_at(0, 0));
        assert!(!protected.error_at(1, 0));
    }

    #[test]
    fn flattened_texels_do_not_reflag() {
        let mut bitmap = MsdfBitmap::new(2, 1);
        bitmap.pixel_mut(0, 0).copy_from_slice(&[1.0, 0.0, 0.9]);
        bitmap.pixel_mut(1, 0).copy_from_slice(&[0.0, 1.0, 0.9]);
        let cfg = config(0.5, 8.0);
        let shape = Shape::new();
        correct_errors(&mut bitmap, &shape, &cfg);
        let after_first = bitmap.data.clone();
        correct_errors(&mut bitmap, &shape, &cfg);
        assert_eq!(after_first, bitmap.data);
    }

    #[test]
    fn correction_preserves_the_median_field() {
        // Flattening only ever replaces channels with their median, so the
        // decoded scalar field must survive the pass texel for texel.
        let shape = unit_square();
        let cfg = config(0.5, 8.0);
        let mut bitmap = generate_msdf(&shape, &cfg, 16, 16);
        let before = bitmap.clone();
        correct_errors(&mut bitmap, &shape, &cfg);
        for y in 0..16 {
            for x in 0..16 {
                assert!((bitmap.median_at(x, y) - before.median_at(x, y)).abs() < 1e-6);
            }
        }
        // Deep interior texels have no channel crossings and stay intact.
        assert_eq!(bitmap.pixel(8, 8), before.pixel(8, 8));
    }
}
