//! QL algorithm with implicit shifts on the Householder tridiagonal form.
//! This is the most robust solver of the family and the fallback of the
//! hybrid one.
use nalgebra::{Matrix3, Vector3};

use super::householder::{tridiagonalize, Tridiagonal};
use super::EigenDecomposition;
use crate::error::{EigenError, EigenResult};

/// Maximum number of QL sweeps for each eigen value.
pub const MAX_ITERATIONS: usize = 50;

/// Only the upper triangle of `a` is read.
pub fn eigen_decomposition(a: &Matrix3<f64>) -> EigenResult<EigenDecomposition> {
    tridiagonal_ql(tridiagonalize(a))
}

/// Diagonalises an already tridiagonal matrix. The Householder transform
/// stored in `t.q` is accumulated into the eigen vectors.
pub fn tridiagonal_ql(t: Tridiagonal) -> EigenResult<EigenDecomposition> {
    const N: usize = 3;
    let Tridiagonal { d: mut w, e: e2, mut q } = t;
    let mut e = [e2[0], e2[1], 0.0];

    for l in 0..N - 1 {
        let mut iterations = 0;
        loop {
            // look for a single small off diagonal element to split the matrix
            let mut m = l;
            while m < N - 1 {
                let g = w[m].abs() + w[m + 1].abs();
                if e[m].abs() + g == g {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            if iterations >= MAX_ITERATIONS {
                return Err(EigenError::NoConvergence {
                    algorithm: "QL",
                    iterations,
                });
            }
            iterations += 1;

            // shift
            let mut g = (w[l + 1] - w[l]) / (e[l] + e[l]);
            let mut r = (g * g + 1.0).sqrt();
            g = if g > 0.0 {
                w[m] - w[l] + e[l] / (g + r)
            } else {
                w[m] - w[l] + e[l] / (g - r)
            };

            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            for i in (l..m).rev() {
                let f = s * e[i];
                let b = c * e[i];
                if f.abs() > g.abs() {
                    c = g / f;
                    r = (c * c + 1.0).sqrt();
                    e[i + 1] = f * r;
                    s = 1.0 / r;
                    c *= s;
                } else {
                    s = f / g;
                    r = (s * s + 1.0).sqrt();
                    e[i + 1] = g * r;
                    c = 1.0 / r;
                    s *= c;
                }
                g = w[i + 1] - p;
                r = (w[i] - g) * s + 2.0 * c * b;
                p = s * r;
                w[i + 1] = g + p;
                g = c * r - b;

                for k in 0..N {
                    let t = q[(k, i + 1)];
                    q[(k, i + 1)] = s * q[(k, i)] + c * t;
                    q[(k, i)] = c * q[(k, i)] - s * t;
                }
            }
            w[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }
    Ok(EigenDecomposition::new(Vector3::from(w), q))
}
