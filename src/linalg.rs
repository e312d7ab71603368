//! Gaussian elimination with partial pivoting on fixed size matrices.
//!
//! The factorisation is stored in place: the strictly lower part holds the
//! multipliers of `L` (unit diagonal), the upper part holds `U`. Row swaps
//! are recorded in a permutation array, `perm[i]` being the row of the
//! original matrix found at row `i` after pivoting.
//!
//! `nalgebra::LU` has no pivot threshold: it only rejects exact zeros,
//! while a pivot below `N * eps * max|a_ij|` must be reported as singular
//! here.
use nalgebra::{SMatrix, SVector};

use crate::error::{SolverError, SolverResult};

pub type Permutation<const N: usize> = [usize; N];

/// Factorises `a` in place. Fails if a pivot is below `N * eps * max|a_ij|`,
/// or if the matrix is null or has non finite entries.
pub fn lu_decompose<const N: usize>(a: &mut SMatrix<f64, N, N>) -> SolverResult<Permutation<N>> {
    let mut perm = [0; N];
    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(SolverError::SingularMatrix);
    }
    let threshold = N as f64 * f64::EPSILON * scale;

    for k in 0..N {
        let mut pivot_row = k;
        let mut pivot = a[(k, k)].abs();
        for i in k + 1..N {
            if a[(i, k)].abs() > pivot {
                pivot = a[(i, k)].abs();
                pivot_row = i;
            }
        }
        if !(pivot > threshold) {
            return Err(SolverError::SingularMatrix);
        }
        if pivot_row != k {
            a.swap_rows(k, pivot_row);
            perm.swap(k, pivot_row);
        }
        let inv = 1.0 / a[(k, k)];
        for i in k + 1..N {
            let l = a[(i, k)] * inv;
            a[(i, k)] = l;
            for j in k + 1..N {
                a[(i, j)] -= l * a[(k, j)];
            }
        }
    }
    Ok(perm)
}

/// Solves `L U x = P b` with the output of `lu_decompose`, `b` is replaced
/// by the solution.
pub fn back_substitute<const N: usize>(
    lu: &SMatrix<f64, N, N>,
    perm: &Permutation<N>,
    b: &mut SVector<f64, N>,
) {
    let mut x = SVector::<f64, N>::from_fn(|i, _| b[perm[i]]);
    for i in 1..N {
        for j in 0..i {
            x[i] -= lu[(i, j)] * x[j];
        }
    }
    for i in (0..N).rev() {
        for j in i + 1..N {
            x[i] -= lu[(i, j)] * x[j];
        }
        x[i] /= lu[(i, i)];
    }
    *b = x;
}

/// Solves `a x = b`, `b` is replaced by the solution. `b` is left untouched
/// on failure.
pub fn solve<const N: usize>(a: &SMatrix<f64, N, N>, b: &mut SVector<f64, N>) -> SolverResult<()> {
    let mut lu = *a;
    let perm = lu_decompose(&mut lu)?;
    back_substitute(&lu, &perm, b);
    Ok(())
}

pub fn invert<const N: usize>(a: &SMatrix<f64, N, N>) -> SolverResult<SMatrix<f64, N, N>> {
    let mut lu = *a;
    let perm = lu_decompose(&mut lu)?;
    let mut inverse = SMatrix::<f64, N, N>::zeros();
    for j in 0..N {
        let mut column = SVector::<f64, N>::zeros();
        column[j] = 1.0;
        back_substitute(&lu, &perm, &mut column);
        inverse.set_column(j, &column);
    }
    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

    #[test]
    fn solution_satisfies_the_system() {
        let a = Matrix4::new(
            4.0, -2.0, 1.0, 0.5, //
            3.0, 6.0, -4.0, 2.0, //
            2.0, 1.0, 8.0, -1.0, //
            -1.0, 0.3, 2.0, 5.0,
        );
        let b = Vector4::new(1.0, -2.0, 3.0, 0.25);
        let mut x = b;
        solve(&a, &mut x).unwrap();
        assert_relative_eq!(a * x, b, epsilon = 1e-14);
    }

    #[test]
    fn pivoting_handles_a_null_leading_entry() {
        let a = Matrix3::new(0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 4.0, -3.0, 8.0);
        let mut lu = a;
        let perm = lu_decompose(&mut lu).unwrap();
        assert_eq!(perm[0], 2);
        let b = Vector3::new(1.0, 2.0, 3.0);
        let mut x = b;
        back_substitute(&lu, &perm, &mut x);
        assert_relative_eq!(a * x, b, epsilon = 1e-14);
    }

    #[test]
    fn singular_matrices_are_reported() {
        let mut b = Vector2::new(1.0, 2.0);
        let singular = Matrix2::new(1.0, 2.0, 2.0, 4.0);
        assert_eq!(solve(&singular, &mut b), Err(SolverError::SingularMatrix));
        assert_eq!(b, Vector2::new(1.0, 2.0));
        assert_eq!(solve(&Matrix2::zeros(), &mut b), Err(SolverError::SingularMatrix));
        let nan = Matrix2::new(1.0, f64::NAN, 0.0, 1.0);
        assert_eq!(solve(&nan, &mut b), Err(SolverError::SingularMatrix));
        // singular up to rounding
        let a = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(invert(&a), Err(SolverError::SingularMatrix));
    }

    #[test]
    fn inverse_of_a_well_conditioned_matrix() {
        let a = Matrix3::new(2.0, -1.0, 0.0, -1.0, 2.0, -1.0, 0.0, -1.0, 2.0);
        let inverse = invert(&a).unwrap();
        assert_relative_eq!(a * inverse, Matrix3::identity(), epsilon = 1e-14);
        assert_relative_eq!(inverse[(0, 0)], 0.75, epsilon = 1e-15);
    }

    #[test]
    fn scalar_system() {
        let mut x = SVector::<f64, 1>::new(3.0);
        solve(&SMatrix::<f64, 1, 1>::new(-2.0), &mut x).unwrap();
        assert_eq!(x[0], -1.5);
    }
}
