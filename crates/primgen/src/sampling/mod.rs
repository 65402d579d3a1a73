//! Sampling primitives shared by the vertex, direction and energy samplers.
//!
//! - `sample_isotropic_direction`: uniform on the unit sphere.
//! - `sample_linear_polarization`: uniform unit vector perpendicular to a direction.
//! - `sample_in_box`: uniform in an axis-aligned box.
//! - `solve_fiducial_shrink`: per-axis shrink that keeps a given volume fraction.
//! - `sample_from_histogram`: inverse-CDF draw from a read-only `Histogram1D`.
//!
//! All entry points take the random source as a parameter; nothing here keeps state.

mod cubic;
mod histogram;

pub use cubic::{solve_cubic, CubicRoots};
pub use histogram::{Histogram1D, HistogramSource};

use nalgebra::{Point3, Vector3};
use rand::Rng;
use std::f64::consts::PI;

pub fn sample_from_histogram<R: Rng + ?Sized>(hist: &Histogram1D, rng: &mut R) -> f64 {
    hist.sample(rng)
}

/// `cosθ ~ U(-1,1)`, `φ ~ U(0,2π)`.
pub fn sample_isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let cos_theta: f64 = rng.gen_range(-1.0..=1.0);
    let phi: f64 = rng.gen_range(0.0..2.0 * PI);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Random linear polarization `cosφ·p0 + sinφ·p1` with `{p0, p1} ⊥ direction`.
///
/// Directions within 0.01 of the polar axis use x as the reference axis
/// instead of z so the cross product does not degenerate.
pub fn sample_linear_polarization<R: Rng + ?Sized>(
    rng: &mut R,
    direction: &Vector3<f64>,
) -> Vector3<f64> {
    let d = direction.normalize();
    let reference = if (1.0 - d.z.abs()) < 0.01 {
        Vector3::x()
    } else {
        Vector3::z()
    };
    let p0 = d.cross(&reference).normalize();
    let p1 = d.cross(&p0);
    let phi: f64 = rng.gen_range(0.0..2.0 * PI);
    p0 * phi.cos() + p1 * phi.sin()
}

/// Uniform point in `[lo, hi]` per axis.
pub fn sample_in_box<R: Rng + ?Sized>(
    rng: &mut R,
    lo: &Point3<f64>,
    hi: &Point3<f64>,
) -> Point3<f64> {
    let mut p = *lo;
    for i in 0..3 {
        let u: f64 = rng.gen();
        p[i] = lo[i] + u * (hi[i] - lo[i]);
    }
    p
}

/// Relative slack when testing candidate roots against `[0, shortest_edge]`.
const ROOT_SLACK: f64 = 1e-9;

/// Uniform per-axis shrink `δ` with `(dx-δ)(dy-δ)(dz-δ) = f·dx·dy·dz`.
///
/// Solves `δ³ − (Σd)δ² + (Σ d_i d_j)δ − dx·dy·dz·(1−f) = 0`. A single real
/// root is returned clamped to `[0, min(d)]`; with three real roots the first
/// (smallest) admissible one wins. No admissible root logs a warning and
/// returns 0 so the caller keeps the unshrunk box.
pub fn solve_fiducial_shrink(dims: &Vector3<f64>, fraction: f64) -> f64 {
    let (dx, dy, dz) = (dims.x, dims.y, dims.z);
    let shortest = dx.min(dy).min(dz);
    let a = -(dx + dy + dz);
    let b = dx * dy + dx * dz + dy * dz;
    let c = -dx * dy * dz * (1.0 - fraction);
    let slack = ROOT_SLACK * dx.max(dy).max(dz);

    match solve_cubic(a, b, c) {
        CubicRoots::One(x) => x.clamp(0.0, shortest),
        CubicRoots::Three(xs) => {
            match xs
                .iter()
                .find(|&&x| x >= -slack && x <= shortest + slack)
            {
                Some(&x) => x.clamp(0.0, shortest),
                None => {
                    tracing::warn!(
                        ?dims,
                        fraction,
                        roots = ?xs,
                        "no admissible fiducial shrink root; using the full volume"
                    );
                    0.0
                }
            }
        }
    }
}
