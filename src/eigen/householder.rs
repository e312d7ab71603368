//! Householder reduction of a symmetric 3x3 matrix to tridiagonal form.
use nalgebra::Matrix3;

/// `A = q * T * q^T` where `T` has diagonal `d` and off diagonal `e`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tridiagonal {
    pub d: [f64; 3],
    pub e: [f64; 2],
    pub q: Matrix3<f64>,
}

impl Tridiagonal {
    pub fn to_matrix(&self) -> Matrix3<f64> {
        let (d, e) = (&self.d, &self.e);
        Matrix3::new(d[0], e[0], 0.0, e[0], d[1], e[1], 0.0, e[1], d[2])
    }
}

/// Only the upper triangle of `a` is read. A single reflection acting on
/// the last two rows is needed in 3D.
pub fn tridiagonalize(a: &Matrix3<f64>) -> Tridiagonal {
    let mut q = Matrix3::identity();
    let mut d = [0.0; 3];
    let mut e = [0.0; 2];
    let mut u = [0.0; 3];
    let mut p = [0.0; 3];

    let h = a[(0, 1)] * a[(0, 1)] + a[(0, 2)] * a[(0, 2)];
    let g = if a[(0, 1)] > 0.0 { -h.sqrt() } else { h.sqrt() };
    e[0] = g;
    let f = g * a[(0, 1)];
    u[1] = a[(0, 1)] - g;
    u[2] = a[(0, 2)];

    let omega = h - f;
    if omega > 0.0 {
        let omega = 1.0 / omega;
        let mut k = 0.0;
        for i in 1..3 {
            let f = a[(1, i)] * u[1] + a[(i, 2)] * u[2];
            p[i] = omega * f;
            k += u[i] * f;
        }
        k *= 0.5 * omega * omega;
        for i in 1..3 {
            p[i] -= k * u[i];
        }
        d[0] = a[(0, 0)];
        d[1] = a[(1, 1)] - 2.0 * p[1] * u[1];
        d[2] = a[(2, 2)] - 2.0 * p[2] * u[2];
        // q = I - omega u u^T
        for j in 1..3 {
            let f = omega * u[j];
            for i in 1..3 {
                q[(i, j)] -= f * u[i];
            }
        }
        e[1] = a[(1, 2)] - p[1] * u[2] - u[1] * p[2];
    } else {
        // already tridiagonal
        for (i, di) in d.iter_mut().enumerate() {
            *di = a[(i, i)];
        }
        e[1] = a[(1, 2)];
    }
    Tridiagonal { d, e, q }
}
