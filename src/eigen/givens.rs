//! Symmetric QR algorithm with Givens reflections, after D. Eberly,
//! "A Robust Eigensolver for 3x3 Symmetric Matrices".
//!
//! A Householder reflection first zeroes the `(0, 2)` entry. The remaining
//! tridiagonal matrix is then reduced by implicit shifted QR steps, each
//! one being a single Givens reflection. The product of all reflections is
//! accumulated in place by the four `update_*` functions.
use nalgebra::{Matrix3, Vector3};

use super::{sorted_indices, EigenDecomposition, SortOrder};

/// Upper bound on the number of QR steps, `2 * (1 + digits - min_exponent)`.
pub const MAX_ITERATIONS: usize = 2 * (1 + f64::MANTISSA_DIGITS as usize + (-f64::MIN_EXP) as usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GivensEigenSolver {
    /// Iterate until the superdiagonal term is exactly zero instead of
    /// negligible with respect to its diagonal neighbours.
    pub aggressive: bool,
    pub sort: SortOrder,
}

impl GivensEigenSolver {
    pub fn new(aggressive: bool, sort: SortOrder) -> Self {
        Self { aggressive, sort }
    }

    /// Only the upper triangle of `a` is read. Returns the decomposition and
    /// the number of QR steps. The eigen vectors always form a direct basis.
    pub fn solve(&self, a: &Matrix3<f64>) -> (EigenDecomposition, usize) {
        let (a00, a01, a02) = (a[(0, 0)], a[(0, 1)], a[(0, 2)]);
        let (a11, a12, a22) = (a[(1, 1)], a[(1, 2)], a[(2, 2)]);

        // Householder reflection H0, B = H0 A H0 has b02 = 0
        let (c, s) = cos_sin(a12, -a02);
        let mut q = Matrix3::new(c, s, 0.0, s, -c, 0.0, 0.0, 0.0, 1.0);
        let mut is_rotation = false;

        let t0 = c * a00 + s * a01;
        let t1 = c * a01 + s * a11;
        let mut b00 = c * t0 + s * t1;
        let mut b01 = s * t0 - c * t1;
        let t0 = s * a00 - c * a01;
        let t1 = s * a01 - c * a11;
        let mut b11 = s * t0 - c * t1;
        let mut b12 = s * a02 - c * a12;
        let mut b22 = a22;

        let mut iterations = MAX_ITERATIONS;
        if b12.abs() <= b01.abs() {
            for i in 0..MAX_ITERATIONS {
                let (c, s) = half_angle(0.5 * (b00 - b11), b01);
                update0(&mut q, c, s);
                is_rotation = !is_rotation;

                let (s00, s01, s11) = (b00, b01, b11);
                let t0 = c * s00 + s * s01;
                let t1 = c * s01 + s * s11;
                b00 = c * t0 + s * t1;
                b11 = b22;
                let t0 = c * s01 - s * s00;
                let t1 = c * s11 - s * s01;
                b22 = c * t1 - s * t0;
                b01 = s * b12;
                b12 *= c;

                if self.converged(b00, b11, b01) {
                    // diagonalise the remaining 2x2 block
                    let (c, s) = half_angle(0.5 * (b00 - b11), b01);
                    update2(&mut q, c, s);
                    is_rotation = !is_rotation;

                    let (s00, s01, s11) = (b00, b01, b11);
                    let t0 = c * s00 + s * s01;
                    let t1 = c * s01 + s * s11;
                    b00 = c * t0 + s * t1;
                    let t0 = s * s00 - c * s01;
                    let t1 = s * s01 - c * s11;
                    b11 = s * t0 - c * t1;
                    iterations = i + 1;
                    break;
                }
            }
        } else {
            for i in 0..MAX_ITERATIONS {
                let (c, s) = half_angle(0.5 * (b22 - b11), b12);
                update1(&mut q, c, s);
                is_rotation = !is_rotation;

                let (s11, s12, s22) = (b11, b12, b22);
                let t0 = c * s22 + s * s12;
                let t1 = c * s12 + s * s11;
                b22 = c * t0 + s * t1;
                b11 = b00;
                let t0 = c * s12 - s * s22;
                let t1 = c * s11 - s * s12;
                b00 = c * t1 - s * t0;
                b12 = s * b01;
                b01 *= c;

                if self.converged(b11, b22, b12) {
                    let (c, s) = half_angle(0.5 * (b11 - b22), b12);
                    update3(&mut q, c, s);
                    is_rotation = !is_rotation;

                    let (s11, s12, s22) = (b11, b12, b22);
                    let t0 = c * s11 + s * s12;
                    let t1 = c * s12 + s * s22;
                    b11 = c * t0 + s * t1;
                    let t0 = s * s11 - c * s12;
                    let t1 = s * s12 - c * s22;
                    b22 = s * t0 - c * t1;
                    iterations = i + 1;
                    break;
                }
            }
        }

        let values = Vector3::new(b00, b11, b22);
        let (i0, i1, i2) = sorted_indices(&values, self.sort);
        let mut vectors = Matrix3::from_columns(&[
            q.column(i0).into_owned(),
            q.column(i1).into_owned(),
            q.column(i2).into_owned(),
        ]);
        // Q is a reflection after an odd number of updates, and so is an odd
        // permutation of its columns
        if is_rotation != is_even_permutation(i0, i1, i2) {
            vectors.column_mut(2).neg_mut();
        }
        let values = Vector3::new(values[i0], values[i1], values[i2]);
        (EigenDecomposition::new(values, vectors), iterations)
    }

    fn converged(&self, d0: f64, d1: f64, sup: f64) -> bool {
        if self.aggressive {
            sup == 0.0
        } else {
            let sum = d0.abs() + d1.abs();
            sum + sup.abs() == sum
        }
    }
}

fn is_even_permutation(i0: usize, i1: usize, i2: usize) -> bool {
    let inversions = (i0 > i1) as u8 + (i0 > i2) as u8 + (i1 > i2) as u8;
    inversions % 2 == 0
}

/// Normalised `(u, v)` oriented so that the cosine is not positive.
/// The null vector gives `(-1, 0)`.
fn cos_sin(u: f64, v: f64) -> (f64, f64) {
    let m = u.abs().max(v.abs());
    if m > 0.0 {
        let (u, v) = (u / m, v / m);
        let length = (u * u + v * v).sqrt();
        let (cs, sn) = (u / length, v / length);
        if cs > 0.0 {
            (-cs, -sn)
        } else {
            (cs, sn)
        }
    } else {
        (-1.0, 0.0)
    }
}

/// Givens reflection of the half angle: `s >= 1/sqrt(2)`.
fn half_angle(u: f64, v: f64) -> (f64, f64) {
    let (c2, s2) = cos_sin(u, v);
    let s = (0.5 * (1.0 - c2)).sqrt();
    (0.5 * s2 / s, s)
}

fn update0(q: &mut Matrix3<f64>, c: f64, s: f64) {
    for r in 0..3 {
        let (q0, q1, q2) = (q[(r, 0)], q[(r, 1)], q[(r, 2)]);
        q[(r, 0)] = c * q0 + s * q1;
        q[(r, 1)] = q2;
        q[(r, 2)] = c * q1 - s * q0;
    }
}

fn update1(q: &mut Matrix3<f64>, c: f64, s: f64) {
    for r in 0..3 {
        let (q0, q1, q2) = (q[(r, 0)], q[(r, 1)], q[(r, 2)]);
        q[(r, 0)] = c * q1 - s * q2;
        q[(r, 1)] = q0;
        q[(r, 2)] = c * q2 + s * q1;
    }
}

fn update2(q: &mut Matrix3<f64>, c: f64, s: f64) {
    for r in 0..3 {
        let (q0, q1) = (q[(r, 0)], q[(r, 1)]);
        q[(r, 0)] = c * q0 + s * q1;
        q[(r, 1)] = s * q0 - c * q1;
    }
}

fn update3(q: &mut Matrix3<f64>, c: f64, s: f64) {
    for r in 0..3 {
        let (q1, q2) = (q[(r, 1)], q[(r, 2)]);
        q[(r, 1)] = c * q1 + s * q2;
        q[(r, 2)] = s * q1 - c * q2;
    }
}
