//! Eigen decomposition through the deviatoric invariants, after Harari and
//! Albocher (2022).
//!
//! The eigen value farthest from the two others is the root of the
//! deviatoric characteristic polynomial that stays well conditioned when
//! the two others merge. Its eigen vector is the longest cross product of
//! two columns of `s - d I`, the two remaining pairs come from the
//! restriction of `s` to the orthogonal plane.
use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};

use super::{deflate, symmetric_from_upper, EigenDecomposition};
use crate::error::{EigenError, EigenResult};

/// Only the upper triangle of `a` is read. The eigen values are returned in
/// descending order and the eigen vectors form a direct basis.
pub fn eigen_decomposition(a: &Matrix3<f64>) -> EigenResult<EigenDecomposition> {
    let a = symmetric_from_upper(a);
    let mean = a.trace() / 3.0;
    let s = a - Matrix3::from_diagonal_element(mean);
    let scale = s.amax();
    if scale == 0.0 {
        return Ok(EigenDecomposition::new(Vector3::repeat(mean), Matrix3::identity()));
    }
    let s = s / scale;

    // J2 from the differences of the diagonal terms, free of the
    // cancellation of the deviatoric part
    let j2 = (((a.m11 - a.m22) / scale).powi(2)
        + ((a.m22 - a.m33) / scale).powi(2)
        + ((a.m33 - a.m11) / scale).powi(2))
        / 6.0
        + s.m12 * s.m12
        + s.m13 * s.m13
        + s.m23 * s.m23;
    let j3 = s.determinant();
    let r = (0.5 * j3 * (3.0 / j2).powf(1.5)).clamp(-1.0, 1.0);
    let theta = r.acos() / 3.0;
    let rho = 2.0 * (j2 / 3.0).sqrt();
    // r >= 0: the largest eigen value is the distinct one, the smallest
    // otherwise
    let largest = r >= 0.0;
    let d = if largest {
        rho * theta.cos()
    } else {
        rho * (theta + 2.0 * PI / 3.0).cos()
    };
    if !d.is_finite() {
        return Err(EigenError::EigenValuesComputationFailed);
    }

    let m = s - Matrix3::from_diagonal_element(d);
    let (c0, c1, c2) = (m.column(0), m.column(1), m.column(2));
    let v = [c0.cross(&c1), c0.cross(&c2), c1.cross(&c2)]
        .into_iter()
        .max_by(|x, y| x.norm_squared().total_cmp(&y.norm_squared()))
        .unwrap_or_else(Vector3::zeros);
    let n = v.norm();
    if !(n > 0.0) || !n.is_finite() {
        return Err(EigenError::EigenVectorsComputationFailed(d * scale + mean));
    }
    let v = v / n;

    let [(l1, v1), (l2, v2)] = deflate(&s, &v);
    let (values, columns) = if largest {
        (Vector3::new(d, l1, l2), [v, v1, v2])
    } else {
        (Vector3::new(l1, l2, d), [v1, v2, v])
    };
    let mut vectors = Matrix3::from_columns(&columns);
    if vectors.determinant() < 0.0 {
        vectors.column_mut(2).neg_mut();
    }
    Ok(EigenDecomposition::new(values.map(|x| x * scale + mean), vectors))
}

pub fn eigen_values(a: &Matrix3<f64>) -> EigenResult<Vector3<f64>> {
    Ok(eigen_decomposition(a)?.values)
}
