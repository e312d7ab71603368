//! Cuppen's divide and conquer method for symmetric 3x3 matrices.
//!
//! The Householder tridiagonal form is split at its weakest off diagonal
//! coupling `beta`, giving a 2x2 block and a 1x1 block. The 2x2 block is
//! solved in closed form, then the rank one correction `beta u u^T` is
//! merged back by solving the secular equation
//!
//! ```text
//! 1 + beta * sum_i z_i^2 / (d_i - lambda) = 0
//! ```
//!
//! Each root is searched relative to its closest pole so that the
//! differences `d_i - lambda` keep their full accuracy, and the eigen
//! vectors are computed from a corrected `z` (Gu and Eisenstat) so that they
//! stay orthogonal.
use nalgebra::{Matrix3, Vector3};

use super::householder::{tridiagonalize, Tridiagonal};
use super::{sym2x2, EigenDecomposition};
use crate::error::{EigenError, EigenResult};

const EPS: f64 = f64::EPSILON;
const MAX_SECULAR_ITERATIONS: usize = 400;

/// Only the upper triangle of `a` is read.
pub fn eigen_decomposition(a: &Matrix3<f64>) -> EigenResult<EigenDecomposition> {
    if a.iter().any(|v| !v.is_finite()) {
        return Err(EigenError::NonFiniteInput);
    }
    let Tridiagonal { d, e, q } = tridiagonalize(a);

    let k = if e[0].abs() <= e[1].abs() { 0 } else { 1 };
    // indices of the 2x2 block and of the 1x1 block
    let (i, j, single) = if k == 0 { (1, 2, 0) } else { (0, 1, 2) };
    let mut w = Matrix3::identity();

    if e[k].abs() <= 8.0 * EPS * (d[k].abs() + d[k + 1].abs()) {
        // the tridiagonal matrix already splits
        let s = sym2x2::eigen_decomposition(d[i], e[1 - k], d[j]);
        set_rotation(&mut w, i, j, s.cs, s.sn);
        let mut values = Vector3::zeros();
        values[i] = s.rt1;
        values[j] = s.rt2;
        values[single] = d[single];
        return Ok(EigenDecomposition::new(values, q * w));
    }

    let beta = e[k];
    let mut dh = d;
    dh[k] -= beta;
    dh[k + 1] -= beta;
    let s = sym2x2::eigen_decomposition(dh[i], e[1 - k], dh[j]);
    set_rotation(&mut w, i, j, s.cs, s.sn);
    let mut poles = Vector3::zeros();
    poles[i] = s.rt1;
    poles[j] = s.rt2;
    poles[single] = dh[single];

    let mut u = Vector3::zeros();
    u[k] = 1.0;
    u[k + 1] = 1.0;
    let z = w.transpose() * u;

    let (values, v) = rank_one_update(poles, beta, z);
    Ok(EigenDecomposition::new(values, q * w * v))
}

/// Stores the rotation of the `(i, j)` plane whose columns are `(cs, sn)`
/// and `(-sn, cs)`.
fn set_rotation(w: &mut Matrix3<f64>, i: usize, j: usize, cs: f64, sn: f64) {
    w[(i, i)] = cs;
    w[(j, i)] = sn;
    w[(i, j)] = -sn;
    w[(j, j)] = cs;
}

/// Eigen decomposition of `diag(d) + beta z z^T`.
fn rank_one_update(d: Vector3<f64>, beta: f64, z: Vector3<f64>) -> (Vector3<f64>, Matrix3<f64>) {
    if beta < 0.0 {
        let (values, vectors) = rank_one_update(-d, -beta, z);
        return (-values, vectors);
    }
    let mut z = z;
    let tol = 8.0 * EPS * (d.abs().sum() + beta * z.norm_squared());

    // deflation of (nearly) equal poles: rotate so that only one of them
    // keeps a non zero weight
    let mut h = Matrix3::<f64>::identity();
    for a in 0..3 {
        for b in a + 1..3 {
            if (d[a] - d[b]).abs() <= tol && z[b] != 0.0 {
                let r = z[a].hypot(z[b]);
                let (c, s) = (z[a] / r, z[b] / r);
                for row in 0..3 {
                    let (ha, hb) = (h[(row, a)], h[(row, b)]);
                    h[(row, a)] = c * ha + s * hb;
                    h[(row, b)] = c * hb - s * ha;
                }
                z[a] = r;
                z[b] = 0.0;
            }
        }
    }

    // deflation of negligible weights
    let znorm = z.norm();
    let mut active = [0usize; 3];
    let mut n = 0;
    for x in 0..3 {
        if beta * z[x].abs() * znorm > tol {
            active[n] = x;
            n += 1;
        }
    }
    active[..n].sort_by(|&a, &b| d[a].total_cmp(&d[b]));

    let mut values = d;
    let mut v = Matrix3::identity();
    match n {
        0 => {}
        1 => {
            let x = active[0];
            values[x] = d[x] + beta * z[x] * z[x];
        }
        _ => {
            let mut p = [0.0; 3];
            let mut zz = [0.0; 3];
            for m in 0..n {
                p[m] = d[active[m]];
                zz[m] = z[active[m]] * z[active[m]];
            }
            let (p, zz) = (&p[..n], &zz[..n]);
            let mut origin = [0usize; 3];
            let mut tau = [0.0; 3];
            for root in 0..n {
                (origin[root], tau[root]) = secular_root(p, zz, beta, root);
            }
            // lambda_y - p_x, computed from the closest pole of lambda_y
            let shift = |y: usize, x: usize| (p[origin[y]] - p[x]) + tau[y];

            let mut zhat = [0.0; 3];
            for x in 0..n {
                let mut num = 1.0;
                let mut den = beta;
                for y in 0..n {
                    num *= shift(y, x);
                    if y != x {
                        den *= p[y] - p[x];
                    }
                }
                zhat[x] = (num / den).max(0.0).sqrt().copysign(z[active[x]]);
            }
            for y in 0..n {
                let col = active[y];
                let mut vec = [0.0; 3];
                for x in 0..n {
                    vec[x] = -zhat[x] / shift(y, x);
                }
                let norm = vec[..n].iter().map(|c| c * c).sum::<f64>().sqrt();
                if norm > 0.0 && norm.is_finite() {
                    v.column_mut(col).fill(0.0);
                    for x in 0..n {
                        v[(active[x], col)] = vec[x] / norm;
                    }
                }
                values[col] = p[origin[y]] + tau[y];
            }
        }
    }
    (values, h * v)
}

/// Returns the pole closest to the root of index `root` (poles sorted in
/// ascending order, `beta > 0`) and the distance `tau` from this pole to the
/// root.
fn secular_root(p: &[f64], zz: &[f64], beta: f64, root: usize) -> (usize, f64) {
    let n = p.len();
    let (origin, mut lo, mut hi) = if root + 1 < n {
        let mid = 0.5 * (p[root + 1] - p[root]);
        if secular(p, zz, beta, root, mid).0 >= 0.0 {
            (root, 0.0, mid)
        } else {
            (root + 1, -mid, 0.0)
        }
    } else {
        (root, 0.0, beta * zz.iter().sum::<f64>())
    };

    // safeguarded Newton iterations, the secular function is increasing
    let mut tau = 0.5 * (lo + hi);
    for _ in 0..MAX_SECULAR_ITERATIONS {
        let (f, df) = secular(p, zz, beta, origin, tau);
        if f == 0.0 {
            break;
        }
        if f > 0.0 {
            hi = tau;
        } else {
            lo = tau;
        }
        let mut next = tau - f / df;
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }
        let done = (next - tau).abs() <= 2.0 * EPS * next.abs()
            || hi - lo <= 2.0 * EPS * lo.abs().max(hi.abs());
        tau = next;
        if done {
            break;
        }
    }
    (origin, tau)
}

/// Value and derivative of the secular function at `p[origin] + tau`.
fn secular(p: &[f64], zz: &[f64], beta: f64, origin: usize, tau: f64) -> (f64, f64) {
    let mut f = 1.0;
    let mut df = 0.0;
    for (pi, zi) in p.iter().zip(zz) {
        let den = (pi - p[origin]) - tau;
        f += beta * zi / den;
        df += beta * zi / (den * den);
    }
    (f, df)
}
