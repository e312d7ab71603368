//! Closed form solvers: eigen values from Cardano's formula, eigen vectors
//! from cross products of the columns of `A - lambda I`.
//!
//! `analytic` is the fastest solver of the family but loses accuracy when
//! eigen values are close to each other. `hybrid` checks the analytic
//! result and falls back to the QL solver when it is not accurate.
use nalgebra::{Matrix3, Vector3};
use tracing::trace;

use super::{ql, symmetric_from_upper, EigenDecomposition};
use crate::error::EigenResult;

const EPS: f64 = f64::EPSILON;
const FRAC_1_SQRT_3: f64 = 0.5773502691896258;

/// Eigen values of a symmetric matrix, only the upper triangle is read.
/// They are returned as `w[0] >= w[1] >= w[2]` for exact arithmetic, which is
/// not guaranteed in floating point.
pub fn eigen_values(a: &Matrix3<f64>) -> Vector3<f64> {
    // the roots are computed on the traceless part
    let shift = (a[(0, 0)] + a[(1, 1)] + a[(2, 2)]) / 3.0;
    let mut s = *a;
    for i in 0..3 {
        s[(i, i)] -= shift;
    }
    roots(&s).add_scalar(shift)
}

fn roots(a: &Matrix3<f64>) -> Vector3<f64> {
    let de = a[(0, 1)] * a[(1, 2)];
    let dd = a[(0, 1)] * a[(0, 1)];
    let ee = a[(1, 2)] * a[(1, 2)];
    let ff = a[(0, 2)] * a[(0, 2)];
    let m = a[(0, 0)] + a[(1, 1)] + a[(2, 2)];
    // a*b + a*c + b*c - d^2 - e^2 - f^2
    let c1 = (a[(0, 0)] * a[(1, 1)] + a[(0, 0)] * a[(2, 2)] + a[(1, 1)] * a[(2, 2)]) - (dd + ee + ff);
    // c*d^2 + a*e^2 + b*f^2 - a*b*c - 2*f*d*e
    let c0 = a[(2, 2)] * dd + a[(0, 0)] * ee + a[(1, 1)] * ff
        - a[(0, 0)] * a[(1, 1)] * a[(2, 2)]
        - 2.0 * a[(0, 2)] * de;

    let p = m * m - 3.0 * c1;
    let q = m * (p - 1.5 * c1) - 13.5 * c0;
    let sqrt_p = p.abs().sqrt();

    let phi = 27.0 * (0.25 * c1 * c1 * (p - c1) + c0 * (q + 6.75 * c0));
    let phi = (1.0 / 3.0) * phi.abs().sqrt().atan2(q);

    let c = sqrt_p * phi.cos();
    let s = FRAC_1_SQRT_3 * sqrt_p * phi.sin();

    let w1 = (1.0 / 3.0) * (m - c);
    Vector3::new(w1 + c, w1 - s, w1 + s)
}

/// Purely analytic eigen decomposition. `a` is taken by value because its
/// storage is reused as work space, including the lower triangle which is
/// overwritten when two eigen values coincide.
pub fn analytic(mut a: Matrix3<f64>) -> EigenDecomposition {
    let w = eigen_values(&a);
    let mut q = Matrix3::zeros();

    let wmax = w.amax();
    let thresh = (8.0 * EPS * wmax).powi(2);

    let n0tmp = a[(0, 1)] * a[(0, 1)] + a[(0, 2)] * a[(0, 2)];
    let n1tmp = a[(0, 1)] * a[(0, 1)] + a[(1, 2)] * a[(1, 2)];
    q[(0, 1)] = a[(0, 1)] * a[(1, 2)] - a[(0, 2)] * a[(1, 1)];
    q[(1, 1)] = a[(0, 2)] * a[(0, 1)] - a[(1, 2)] * a[(0, 0)];
    q[(2, 1)] = a[(0, 1)] * a[(0, 1)];

    // v[0] = (A - w[0]).e1 x (A - w[0]).e2
    a[(0, 0)] -= w[0];
    a[(1, 1)] -= w[0];
    q[(0, 0)] = q[(0, 1)] + a[(0, 2)] * w[0];
    q[(1, 0)] = q[(1, 1)] + a[(1, 2)] * w[0];
    q[(2, 0)] = a[(0, 0)] * a[(1, 1)] - q[(2, 1)];
    let norm = q.column(0).norm_squared();
    let n0 = n0tmp + a[(0, 0)] * a[(0, 0)];
    let n1 = n1tmp + a[(1, 1)] * a[(1, 1)];
    column_from_cross_product(&a, &mut q, 0, norm, n0, n1, thresh);

    let t = w[0] - w[1];
    if t.abs() > 8.0 * EPS * wmax {
        // v[1] = (A - w[1]).e1 x (A - w[1]).e2
        a[(0, 0)] += t;
        a[(1, 1)] += t;
        q[(0, 1)] += a[(0, 2)] * w[1];
        q[(1, 1)] += a[(1, 2)] * w[1];
        q[(2, 1)] = a[(0, 0)] * a[(1, 1)] - q[(2, 1)];
        let norm = q.column(1).norm_squared();
        let n0 = n0tmp + a[(0, 0)] * a[(0, 0)];
        let n1 = n1tmp + a[(1, 1)] * a[(1, 1)];
        column_from_cross_product(&a, &mut q, 1, norm, n0, n1, thresh);
    } else {
        // degenerate eigen value: v[1] = v[0] x (A - w[1]).e[i]
        a[(1, 0)] = a[(0, 1)];
        a[(2, 0)] = a[(0, 2)];
        a[(2, 1)] = a[(1, 2)];
        a[(0, 0)] += w[0];
        a[(1, 1)] += w[0];
        let v0: Vector3<f64> = q.column(0).into_owned();
        let mut found = false;
        for i in 0..3 {
            a[(i, i)] -= w[1];
            let col: Vector3<f64> = a.column(i).into_owned();
            let n0 = col.norm_squared();
            if n0 > thresh {
                let v1 = v0.cross(&col);
                let norm = v1.norm_squared();
                // the angle between both vectors must not be too small
                if norm > (256.0 * EPS).powi(2) * n0 {
                    q.set_column(1, &(v1 * (1.0 / norm).sqrt()));
                    found = true;
                    break;
                }
            }
        }
        if !found {
            // any vector orthogonal to v[0] is an eigen vector
            for j in 0..3 {
                if q[(j, 0)] != 0.0 {
                    let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                    let norm = 1.0 / (q[(j, 0)].powi(2) + q[(j1, 0)].powi(2)).sqrt();
                    q[(j, 1)] = q[(j1, 0)] * norm;
                    q[(j1, 1)] = -q[(j, 0)] * norm;
                    q[(j2, 1)] = 0.0;
                    break;
                }
            }
        }
    }

    // v[2] = v[0] x v[1]
    let v2 = q.column(0).cross(&q.column(1));
    q.set_column(2, &v2);
    EigenDecomposition::new(w, q)
}

/// Normalises the cross product stored in column `k` of `q`, or replaces it
/// when one of the columns of `A - w[k] I` vanishes or when both are almost
/// parallel.
fn column_from_cross_product(
    a: &Matrix3<f64>,
    q: &mut Matrix3<f64>,
    k: usize,
    norm: f64,
    n0: f64,
    n1: f64,
    thresh: f64,
) {
    let error = n0 * n1;
    if n0 <= thresh {
        q.set_column(k, &Vector3::x());
    } else if n1 <= thresh {
        q.set_column(k, &Vector3::y());
    } else if norm < (64.0 * EPS).powi(2) * error {
        // v ~ (1, -A0/A1, 0)
        let mut t = a[(0, 1)] * a[(0, 1)];
        let mut f = -a[(0, 0)] / a[(0, 1)];
        if a[(1, 1)] * a[(1, 1)] > t {
            t = a[(1, 1)] * a[(1, 1)];
            f = -a[(0, 1)] / a[(1, 1)];
        }
        if a[(1, 2)] * a[(1, 2)] > t {
            f = -a[(0, 2)] / a[(1, 2)];
        }
        let norm = 1.0 / (1.0 + f * f).sqrt();
        q.set_column(k, &Vector3::new(norm, f * norm, 0.0));
    } else {
        let scaled = q.column(k) * (1.0 / norm).sqrt();
        q.set_column(k, &scaled);
    }
}

/// Analytic eigen vectors when they are well conditioned, QL otherwise.
/// Only the upper triangle of `a` is read.
///
/// QL is used when two eigen values are closer than `sqrt(eps) |A|`, when
/// a cross product suffers from cancellations, or when an analytic pair
/// misses `|A v - w v| <= 256 eps |A|`.
pub fn hybrid(a: &Matrix3<f64>) -> EigenResult<EigenDecomposition> {
    let w = eigen_values(a);
    let full = symmetric_from_upper(a);
    let norm_a = full.norm();
    let gap = (w[0] - w[1]).abs().min((w[0] - w[2]).abs()).min((w[1] - w[2]).abs());
    if !(gap > EPS.sqrt() * norm_a) {
        trace!(gap, norm_a, "close eigen values, falling back to QL");
        return ql::eigen_decomposition(a);
    }

    let t = w.amax();
    let u = if t < 1.0 { t } else { t * t };
    let error = 256.0 * EPS * u * u;

    let mut q = Matrix3::zeros();
    q[(0, 1)] = a[(0, 1)] * a[(1, 2)] - a[(0, 2)] * a[(1, 1)];
    q[(1, 1)] = a[(0, 2)] * a[(0, 1)] - a[(1, 2)] * a[(0, 0)];
    q[(2, 1)] = a[(0, 1)] * a[(0, 1)];

    // v[0] = (A - w[0]).e1 x (A - w[0]).e2
    q[(0, 0)] = q[(0, 1)] + a[(0, 2)] * w[0];
    q[(1, 0)] = q[(1, 1)] + a[(1, 2)] * w[0];
    q[(2, 0)] = (a[(0, 0)] - w[0]) * (a[(1, 1)] - w[0]) - q[(2, 1)];
    let norm = q.column(0).norm_squared();
    // both columns are almost parallel, or A - w[0] I suffered from
    // cancellations
    if norm <= error {
        trace!(norm, error, "ill-conditioned first eigen vector, falling back to QL");
        return ql::eigen_decomposition(a);
    }
    let scaled = q.column(0) * (1.0 / norm).sqrt();
    q.set_column(0, &scaled);

    // v[1] = (A - w[1]).e1 x (A - w[1]).e2
    q[(0, 1)] += a[(0, 2)] * w[1];
    q[(1, 1)] += a[(1, 2)] * w[1];
    q[(2, 1)] = (a[(0, 0)] - w[1]) * (a[(1, 1)] - w[1]) - q[(2, 1)];
    let norm = q.column(1).norm_squared();
    if norm <= error {
        trace!(norm, error, "ill-conditioned second eigen vector, falling back to QL");
        return ql::eigen_decomposition(a);
    }
    let scaled = q.column(1) * (1.0 / norm).sqrt();
    q.set_column(1, &scaled);

    let v2 = q.column(0).cross(&q.column(1));
    q.set_column(2, &v2);

    let tolerance = 256.0 * EPS * norm_a;
    let accurate = q.column(0).dot(&q.column(1)).abs() <= 256.0 * EPS
        && (0..3).all(|k| {
            let v = q.column(k);
            (full * v - v * w[k]).norm() <= tolerance
        });
    if !accurate {
        trace!("inaccurate analytic eigen vectors, falling back to QL");
        return ql::eigen_decomposition(a);
    }
    Ok(EigenDecomposition::new(w, q))
}
