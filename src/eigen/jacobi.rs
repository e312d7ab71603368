//! Cyclic Jacobi method with a threshold during the first sweeps.
use nalgebra::{Matrix3, Vector3};

use super::EigenDecomposition;
use crate::error::{EigenError, EigenResult};

pub const MAX_SWEEPS: usize = 50;

/// The upper triangle of `a` is used as work space, hence `a` is taken by
/// value. The lower triangle is never read.
pub fn eigen_decomposition(mut a: Matrix3<f64>) -> EigenResult<EigenDecomposition> {
    const N: usize = 3;
    let mut q = Matrix3::identity();
    let mut w = [a[(0, 0)], a[(1, 1)], a[(2, 2)]];

    for sweep in 0..MAX_SWEEPS {
        let mut so = 0.0;
        for p in 0..N {
            for r in p + 1..N {
                so += a[(p, r)].abs();
            }
        }
        if so == 0.0 {
            return Ok(EigenDecomposition::new(Vector3::from(w), q));
        }
        let threshold = if sweep < 4 {
            0.2 * so / (N * N) as f64
        } else {
            0.0
        };

        for p in 0..N {
            for r in p + 1..N {
                let g = 100.0 * a[(p, r)].abs();
                if sweep > 4 && w[p].abs() + g == w[p].abs() && w[r].abs() + g == w[r].abs() {
                    a[(p, r)] = 0.0;
                } else if a[(p, r)].abs() > threshold {
                    let h = w[r] - w[p];
                    let t = if h.abs() + g == h.abs() {
                        a[(p, r)] / h
                    } else {
                        let theta = 0.5 * h / a[(p, r)];
                        if theta < 0.0 {
                            -1.0 / ((1.0 + theta * theta).sqrt() - theta)
                        } else {
                            1.0 / ((1.0 + theta * theta).sqrt() + theta)
                        }
                    };
                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = t * c;
                    let z = t * a[(p, r)];

                    a[(p, r)] = 0.0;
                    w[p] -= z;
                    w[r] += z;
                    for k in 0..p {
                        let t = a[(k, p)];
                        a[(k, p)] = c * t - s * a[(k, r)];
                        a[(k, r)] = s * t + c * a[(k, r)];
                    }
                    for k in p + 1..r {
                        let t = a[(p, k)];
                        a[(p, k)] = c * t - s * a[(k, r)];
                        a[(k, r)] = s * t + c * a[(k, r)];
                    }
                    for k in r + 1..N {
                        let t = a[(p, k)];
                        a[(p, k)] = c * t - s * a[(r, k)];
                        a[(r, k)] = s * t + c * a[(r, k)];
                    }
                    for k in 0..N {
                        let t = q[(k, p)];
                        q[(k, p)] = c * t - s * q[(k, r)];
                        q[(k, r)] = s * t + c * q[(k, r)];
                    }
                }
            }
        }
    }
    Err(EigenError::NoConvergence {
        algorithm: "Jacobi",
        iterations: MAX_SWEEPS,
    })
}
