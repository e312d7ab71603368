//! Packed symmetric tensors.
//!
//! Components are stored as `[s00, s11, s22, s01, s02, s12]` and the off
//! diagonal components carry a factor `sqrt(2)` (Mandel notation), so that
//! the euclidean norm of the packed vector is the Frobenius norm of the
//! tensor. In 1D only the three diagonal components are stored, in 2D the
//! in-plane shear `s01` is appended.
use nalgebra::{Matrix3, SVector, Vector3};

use crate::error::{EigenError, EigenResult};

const SQRT2: f64 = std::f64::consts::SQRT_2;
const FACTOR: f64 = std::f64::consts::FRAC_1_SQRT_2; // 1/sqrt(2)

pub type Stensor = SVector<f64, 6>;

pub const STENSOR_IDENTITY: Stensor = Stensor::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);

/// Returns the number of packed components of a symmetric tensor in the
/// given space dimension.
pub fn stensor_size(dimension: usize) -> EigenResult<usize> {
    match dimension {
        1 => Ok(3),
        2 => Ok(4),
        3 => Ok(6),
        _ => Err(EigenError::UnsupportedDimension(dimension)),
    }
}

/// Checks the length of a packed tensor against the space dimension.
pub fn check_stensor(dimension: usize, s: &[f64]) -> EigenResult<()> {
    let expected = stensor_size(dimension)?;
    if s.len() != expected {
        return Err(EigenError::InvalidStensorSize {
            dimension,
            expected,
            found: s.len(),
        });
    }
    if s.iter().any(|v| !v.is_finite()) {
        return Err(EigenError::NonFiniteInput);
    }
    Ok(())
}

pub fn stensor_to_matrix(s: &[f64; 6]) -> Matrix3<f64> {
    Matrix3::new(
        s[0],
        FACTOR * s[3],
        FACTOR * s[4],
        FACTOR * s[3],
        s[1],
        FACTOR * s[5],
        FACTOR * s[4],
        FACTOR * s[5],
        s[2],
    )
}

/// Packs the upper triangle of `m`, the lower triangle is not read.
pub fn matrix_to_stensor(m: &Matrix3<f64>) -> [f64; 6] {
    [
        m.m11,
        m.m22,
        m.m33,
        SQRT2 * m.m12,
        SQRT2 * m.m13,
        SQRT2 * m.m23,
    ]
}

/// Pads a packed tensor of any supported dimension to its 3D form.
pub fn to_3d(s: &[f64]) -> EigenResult<[f64; 6]> {
    match s.len() {
        3 => Ok([s[0], s[1], s[2], 0.0, 0.0, 0.0]),
        4 => Ok([s[0], s[1], s[2], s[3], 0.0, 0.0]),
        6 => Ok([s[0], s[1], s[2], s[3], s[4], s[5]]),
        n => Err(EigenError::InvalidStensorSize {
            dimension: 3,
            expected: 6,
            found: n,
        }),
    }
}

/// Trace of a 3D packed tensor, pad lower dimensions with `to_3d` first.
pub fn trace(s: &[f64; 6]) -> f64 {
    s[0] + s[1] + s[2]
}

/// Rebuilds `V diag(vp) V^T` in packed form. This is the building block of
/// isotropic tensor functions: apply a scalar function to `vp` first.
pub fn stensor_from_eigen_decomposition(vp: &Vector3<f64>, m: &Matrix3<f64>) -> [f64; 6] {
    let t = m * Matrix3::from_diagonal(vp) * m.transpose();
    matrix_to_stensor(&t)
}
