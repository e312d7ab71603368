//! Legacy solver: eigen values as the roots of the characteristic
//! polynomial, eigen vectors from the cofactors of `A - vp I`.
//!
//! It is the default policy of the stensor dispatch. Only the root farthest
//! from the two others gets a cofactor eigen vector, the two others are
//! deflated in the orthogonal plane. Close roots are only accurate to about
//! `sqrt(eps) |A|`.
use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};

use super::{deflate, symmetric_from_upper, EigenDecomposition};
use crate::error::{EigenError, EigenResult};
use crate::stensor::stensor_to_matrix;

const NEWTON_ITERATIONS: usize = 4;

/// Eigen values of a packed symmetric tensor, in descending order for exact
/// arithmetic. `refine` polishes each root with a few Newton iterations on
/// the characteristic polynomial of the deviatoric part.
pub fn eigen_values(s: &[f64; 6], refine: bool) -> EigenResult<Vector3<f64>> {
    roots(&stensor_to_matrix(s), refine)
}

pub fn eigen_vectors(s: &[f64; 6], refine: bool) -> EigenResult<EigenDecomposition> {
    let a = stensor_to_matrix(s);
    let vp = roots(&a, refine)?;
    Ok(EigenDecomposition::new(vp, eigen_basis(&a, &vp)?))
}

fn roots(a: &Matrix3<f64>, refine: bool) -> EigenResult<Vector3<f64>> {
    let q = a.trace() / 3.0;
    let p1 = a.m12 * a.m12 + a.m13 * a.m13 + a.m23 * a.m23;
    let p2 = (a.m11 - q).powi(2) + (a.m22 - q).powi(2) + (a.m33 - q).powi(2) + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    if !p.is_finite() || !q.is_finite() {
        return Err(EigenError::EigenValuesComputationFailed);
    }
    if p == 0.0 {
        return Ok(Vector3::new(q, q, q));
    }
    let s = symmetric_from_upper(a) - Matrix3::from_diagonal_element(q);
    let r = (0.5 * (s / p).determinant()).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;
    let x1 = 2.0 * p * phi.cos();
    let x3 = 2.0 * p * (phi + 2.0 * PI / 3.0).cos();
    let mut deviatoric = Vector3::new(x1, -x1 - x3, x3);

    if refine {
        // det(x I - s) = x^3 - j2 x - j3
        let j2 = 0.5 * p2;
        let j3 = s.determinant();
        let poly = |x: f64| (x * x - j2) * x - j3;
        let dpoly = |x: f64| 3.0 * x * x - j2;
        for x in deviatoric.iter_mut() {
            for _ in 0..NEWTON_ITERATIONS {
                let d = dpoly(*x);
                if d == 0.0 {
                    break;
                }
                let next = *x - poly(*x) / d;
                if poly(next).abs() < poly(*x).abs() {
                    *x = next;
                } else {
                    break;
                }
            }
        }
    }
    let vp = deviatoric.add_scalar(q);
    if vp.iter().any(|v| !v.is_finite()) {
        return Err(EigenError::EigenValuesComputationFailed);
    }
    Ok(vp)
}

/// Orthonormal eigen vectors matching the eigen values `vp`.
fn eigen_basis(a: &Matrix3<f64>, vp: &Vector3<f64>) -> EigenResult<Matrix3<f64>> {
    let scale = vp.amax();
    let prec = (100.0 * f64::EPSILON * scale).max(100.0 * f64::MIN_POSITIVE);
    if vp.max() - vp.min() < prec {
        return Ok(Matrix3::identity());
    }
    let mean = a.trace() / 3.0;
    let s = symmetric_from_upper(a) - Matrix3::from_diagonal_element(mean);
    // the extreme root farthest from the middle one
    let k = if vp[0] - vp[1] >= vp[1] - vp[2] { 0 } else { 2 };
    let v = cofactor_vector(&s, vp[k] - mean)?;
    let [(_, v1), (_, v2)] = deflate(&s, &v);
    let columns = if k == 0 { [v, v1, v2] } else { [v1, v2, v] };
    Ok(Matrix3::from_columns(&columns))
}

/// Eigen vector associated with the simple eigen value `vp`, taken from the
/// largest 2x2 minor of `A - vp I`.
fn cofactor_vector(m: &Matrix3<f64>, vp: f64) -> EigenResult<Vector3<f64>> {
    let (a, b, c) = (m.m11 - vp, m.m12, m.m13);
    let (d, e, f) = (m.m22 - vp, m.m23, m.m33 - vp);
    let det3 = a * d - b * b;
    let det2 = a * f - c * c;
    let det1 = d * f - e * e;
    let scale = m.upper_triangle().amax();
    let threshold = f64::EPSILON * scale * scale;

    let v = if det3.abs() >= det2.abs() && det3.abs() >= det1.abs() {
        if det3.abs() <= threshold {
            return Err(EigenError::EigenVectorsComputationFailed(vp));
        }
        Vector3::new((b * e - c * d) / det3, (b * c - a * e) / det3, 1.0)
    } else if det2.abs() >= det1.abs() {
        if det2.abs() <= threshold {
            return Err(EigenError::EigenVectorsComputationFailed(vp));
        }
        Vector3::new((c * e - b * f) / det2, 1.0, (b * c - a * e) / det2)
    } else {
        if det1.abs() <= threshold {
            return Err(EigenError::EigenVectorsComputationFailed(vp));
        }
        Vector3::new(1.0, (c * e - b * f) / det1, (b * e - c * d) / det1)
    };
    Ok(v.normalize())
}
