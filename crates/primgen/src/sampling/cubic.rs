//! Real roots of monic cubics `x³ + a x² + b x + c = 0`.
//!
//! Closed form: depressed-cubic invariants `q = (a² − 3b)/9`,
//! `r = (2a³ − 9ab + 27c)/54`. Three real roots (trigonometric branch) when
//! `r² < q³`, a repeated root when `r² = q³`, otherwise one real root via
//! Cardano.

/// Real roots, three-root results are sorted ascending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CubicRoots {
    One(f64),
    Three([f64; 3]),
}

impl CubicRoots {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            CubicRoots::One(x) => std::slice::from_ref(x),
            CubicRoots::Three(xs) => xs,
        }
    }
}

pub fn solve_cubic(a: f64, b: f64, c: f64) -> CubicRoots {
    let q = (a * a - 3.0 * b) / 9.0;
    let r = (2.0 * a * a * a - 9.0 * a * b + 27.0 * c) / 54.0;
    let shift = a / 3.0;

    let q3 = q * q * q;
    let r2 = r * r;

    if r == 0.0 && q == 0.0 {
        return CubicRoots::Three([-shift; 3]);
    }
    // Exact comparison mirrors the textbook branch; near-degenerate inputs
    // fall into one of the neighbouring branches with a tiny error.
    if r2 == q3 {
        let sq = q.sqrt();
        return if r > 0.0 {
            CubicRoots::Three([-2.0 * sq - shift, sq - shift, sq - shift])
        } else {
            CubicRoots::Three([-sq - shift, -sq - shift, 2.0 * sq - shift])
        };
    }
    if r2 < q3 {
        let ratio = (r / q3.sqrt()).clamp(-1.0, 1.0);
        let theta = ratio.acos();
        let norm = -2.0 * q.sqrt();
        let two_pi = 2.0 * std::f64::consts::PI;
        let mut xs = [
            norm * (theta / 3.0).cos() - shift,
            norm * ((theta + two_pi) / 3.0).cos() - shift,
            norm * ((theta - two_pi) / 3.0).cos() - shift,
        ];
        xs.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        return CubicRoots::Three(xs);
    }
    let big_a = -r.signum() * (r.abs() + (r2 - q3).sqrt()).cbrt();
    let big_b = if big_a == 0.0 { 0.0 } else { q / big_a };
    CubicRoots::One(big_a + big_b - shift)
}
