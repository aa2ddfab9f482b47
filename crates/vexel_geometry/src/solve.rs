//! Small polynomial solvers for distance and scanline queries.
//!
//! Roots are written into a caller-provided array; the return value is how
//! many were found.  Degenerate leading coefficients fall through to the
//! lower-degree solver instead of dividing by zero.

const EPSILON: f64 = 1e-14;

/// Solve `a*x^2 + b*x + c = 0`.  Returns the number of real roots written to
/// `roots` (0, 1 or 2).  A double root is reported once.
pub fn solve_quadratic(roots: &mut [f64; 3], a: f64, b: f64, c: f64) -> usize {
    // Degenerates to linear when `a` vanishes.
    if a == 0.0 || b.abs() > 1e12 * a.abs() {
        if b == 0.0 {
            return 0;
        }
        roots[0] = -c / b;
        return 1;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant > 0.0 {
        let sqrt_d = discriminant.sqrt();
        roots[0] = (-b + sqrt_d) / (2.0 * a);
        roots[1] = (-b - sqrt_d) / (2.0 * a);
        2
    } else if discriminant == 0.0 {
        roots[0] = -b / (2.0 * a);
        1
    } else {
        0
    }
}

/// Solve the normalized cubic `x^3 + a*x^2 + b*x + c = 0`.
fn solve_cubic_normed(roots: &mut [f64; 3], a: f64, b: f64, c: f64) -> usize {
    let a2 = a * a;
    let mut q = (a2 - 3.0 * b) / 9.0;
    let r = (a * (2.0 * a2 - 9.0 * b) + 27.0 * c) / 54.0;
    let r2 = r * r;
    let q3 = q * q * q;
    let a_third = a / 3.0;
    if r2 < q3 {
        // Three real roots.
        let mut t = r / q3.sqrt();
        t = t.clamp(-1.0, 1.0);
        t = t.acos();
        q = -2.0 * q.sqrt();
        roots[0] = q * (t / 3.0).cos() - a_third;
        roots[1] = q * ((t + 2.0 * std::f64::consts::PI) / 3.0).cos() - a_third;
        roots[2] = q * ((t - 2.0 * std::f64::consts::PI) / 3.0).cos() - a_third;
        3
    } else {
        let mut u = (r.abs() + (r2 - q3).sqrt()).cbrt();
        if r > 0.0 {
            u = -u;
        }
        let v = if u == 0.0 { 0.0 } else { q / u };
        roots[0] = (u + v) - a_third;
        if (u - v).abs() < EPSILON * (u + v).abs() {
            roots[1] = -0.5 * (u + v) - a_third;
            return 2;
        }
        1
    }
}

/// Solve `a*x^3 + b*x^2 + c*x + d = 0`.  Returns the number of real roots
/// written to `roots` (0–3).  Falls back to the quadratic solver when `a` is
/// negligible relative to the remaining coefficients.
pub fn solve_cubic(roots: &mut [f64; 3], a: f64, b: f64, c: f64, d: f64) -> usize {
    if a != 0.0 {
        let bn = b / a;
        // Only treat as cubic while the normalization stays well-conditioned.
        if bn.abs() < 1e6 && (c / a).abs() < 1e12 && (d / a).abs() < 1e12 {
            return solve_cubic_normed(roots, bn, c / a, d / a);
        }
    }
    solve_quadratic(roots, b, c, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<f64>) -> Vec<f64> {
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    #[test]
    fn quadratic_two_roots() {
        let mut r = [0.0; 3];
        // (x-1)(x-3) = x^2 - 4x + 3
        let n = solve_quadratic(&mut r, 1.0, -4.0, 3.0);
        assert_eq!(n, 2);
        let roots = sorted(r[..n].to_vec());
        assert!((roots[0] - 1.0).abs() < 1e-12);
        assert!((roots[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_degenerate_linear() {
        let mut r = [0.0; 3];
        let n = solve_quadratic(&mut r, 0.0, 2.0, -4.0);
        assert_eq!(n, 1);
        assert!((r[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_no_real_roots() {
        let mut r = [0.0; 3];
        assert_eq!(solve_quadratic(&mut r, 1.0, 0.0, 1.0), 0);
    }

    #[test]
    fn cubic_three_roots() {
        let mut r = [0.0; 3];
        // (x+1)x(x-1) = x^3 - x
        let n = solve_cubic(&mut r, 1.0, 0.0, -1.0, 0.0);
        assert_eq!(n, 3);
        let roots = sorted(r[..n].to_vec());
        assert!((roots[0] + 1.0).abs() < 1e-9);
        assert!(roots[1].abs() < 1e-9);
        assert!((roots[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_single_root() {
        let mut r = [0.0; 3];
        // x^3 - 8 = 0
        let n = solve_cubic(&mut r, 1.0, 0.0, 0.0, -8.0);
        assert!(n >= 1);
        assert!((r[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_degenerate_quadratic() {
        let mut r = [0.0; 3];
        let n = solve_cubic(&mut r, 0.0, 1.0, -4.0, 3.0);
        assert_eq!(n, 2);
    }
}
