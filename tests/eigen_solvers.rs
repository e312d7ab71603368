use std::f64::consts::FRAC_PI_4;

use approx::assert_relative_eq;
use comfe_math::eigen::givens::GivensEigenSolver;
use comfe_math::stensor::{matrix_to_stensor, stensor_from_eigen_decomposition};
use comfe_math::{EigenDecomposition, EigenSolver, SortOrder, StensorEigenSolver};
use nalgebra::{Matrix3, Rotation3, Vector3};
use strum::IntoEnumIterator;

fn from_spectrum(values: [f64; 3], angles: (f64, f64, f64)) -> Matrix3<f64> {
    let r = Rotation3::from_euler_angles(angles.0, angles.1, angles.2).into_inner();
    let a = r * Matrix3::from_diagonal(&Vector3::from(values)) * r.transpose();
    (a + a.transpose()) * 0.5
}

/// Distinct, repeated, tiny, null and widely spread spectra under several
/// rotations, plus a few hand written matrices.
fn matrices() -> Vec<Matrix3<f64>> {
    let spectra = [
        [1.0, 2.0, 3.0],
        [1.0, 1.0, 2.0],
        [2.0, 1.0, 1.0],
        [-5.0, -5.0, 7.0],
        [3.0, 3.0, 3.0],
        [0.0, 0.0, 0.0],
        [1.0, 1.0 + 1e-10, 2.0],
        [1e-8, -1e-8, 1.0],
        [1e6, 1.0, -1e6],
    ];
    let angles = [
        (0.3, 1.1, -0.7),
        (2.0, 0.1, 0.5),
        (0.0, 0.0, 0.0),
        (FRAC_PI_4, 0.0, 0.0),
        (1e-9, 0.0, 0.0),
    ];
    let mut matrices: Vec<_> = spectra
        .iter()
        .flat_map(|s| angles.iter().map(move |a| from_spectrum(*s, *a)))
        .collect();
    matrices.push(Matrix3::new(2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0));
    matrices.push(Matrix3::repeat(1.0));
    matrices.push(Matrix3::new(1.0, 1e-20, 0.0, 1e-20, 1.0, 0.0, 0.0, 0.0, 3.0));
    matrices
}

/// A pair of eigen values `g` apart, `g` going from `1e-16` to `1e-2`.
fn clustered() -> Vec<Matrix3<f64>> {
    let angles = [
        (0.3, 1.1, -0.7),
        (2.0, 0.1, 0.5),
        (0.0, 0.0, 0.0),
        (FRAC_PI_4, 0.0, 0.0),
        (1.3, -0.4, 2.2),
    ];
    let mut matrices = Vec::new();
    for k in 0..15 {
        let g = 10f64.powi(k - 16);
        for s in [
            [1.0, 1.0 + g, 1.007],
            [1.0, 1.0 + g, -0.865],
            [1.0, 1.0 + g, 1.0 + 2.0 * g],
            [-3.0, 2.0, 2.0 + g],
        ] {
            matrices.extend(angles.iter().map(|a| from_spectrum(s, *a)));
        }
    }
    matrices
}

fn well_conditioned() -> Vec<Matrix3<f64>> {
    let mut matrices = Vec::new();
    for (k, s) in [[1.0, 2.0, 3.0], [-4.0, 0.5, 9.0], [10.0, -3.0, 1.0]].iter().enumerate() {
        for a in [(0.3, 1.1, -0.7), (2.0, 0.1, 0.5), (0.7 * k as f64 + 0.2, -0.4, 1.3)] {
            matrices.push(from_spectrum(*s, a));
        }
    }
    matrices
}

/// Largest `|A v - lambda v| / |A|` over the eigen pairs, and largest
/// deviation of `V^T V` from the identity.
fn errors(a: &Matrix3<f64>, r: &EigenDecomposition) -> (f64, f64) {
    let norm = a.norm().max(f64::MIN_POSITIVE);
    let residual = (0..3)
        .map(|k| {
            let v = r.vectors.column(k);
            (a * v - v * r.values[k]).norm() / norm
        })
        .fold(0.0, f64::max);
    let orthogonality = (r.vectors.transpose() * r.vectors - Matrix3::identity()).amax();
    (residual, orthogonality)
}

fn tolerance(solver: EigenSolver) -> f64 {
    match solver {
        EigenSolver::CubicRoots => 1e-7,
        EigenSolver::Analytic => 1e-10,
        _ => 1e-12,
    }
}

#[test]
fn every_solver_decomposes_every_matrix() {
    for solver in EigenSolver::iter() {
        let d = StensorEigenSolver::new(solver, 3).unwrap();
        let matrices = if solver == EigenSolver::Analytic {
            well_conditioned()
        } else {
            matrices()
        };
        for a in &matrices {
            let s = matrix_to_stensor(a);
            let r = d.compute_eigen_vectors(&s, false).unwrap();
            let (residual, orthogonality) = errors(a, &r);
            assert!(residual < tolerance(solver), "{solver}: residual {residual} for {a}");
            assert!(orthogonality < 1e-12, "{solver}: orthogonality {orthogonality} for {a}");
            assert_relative_eq!(r.values.sum(), a.trace(), epsilon = 1e-9 * a.norm().max(1.0));
        }
    }
}

#[test]
fn close_eigen_values() {
    // the purely analytic solver is only meant for well separated spectra
    for solver in EigenSolver::iter().filter(|s| *s != EigenSolver::Analytic) {
        let d = StensorEigenSolver::new(solver, 3).unwrap();
        for refine in [false, true] {
            for a in clustered() {
                let r = d.compute_eigen_vectors(&matrix_to_stensor(&a), refine).unwrap();
                let (residual, orthogonality) = errors(&a, &r);
                assert!(residual < tolerance(solver), "{solver}: residual {residual} for {a}");
                assert!(orthogonality < 1e-12, "{solver}: orthogonality {orthogonality} for {a}");
            }
        }
    }
}

#[test]
fn eigen_values_match_the_eigen_decomposition() {
    for solver in EigenSolver::iter() {
        let d = StensorEigenSolver::new(solver, 3).unwrap();
        for a in well_conditioned() {
            let s = matrix_to_stensor(&a);
            let mut values = d.compute_eigen_values(&s, false).unwrap();
            let mut expected = d.compute_eigen_vectors(&s, false).unwrap().values;
            comfe_math::eigen::sort_eigen_values(&mut values, SortOrder::Ascending);
            comfe_math::eigen::sort_eigen_values(&mut expected, SortOrder::Ascending);
            assert_relative_eq!(values, expected, epsilon = 1e-7 * a.norm());
        }
    }
}

#[test]
fn decomposition_rebuilds_the_tensor() {
    let d = StensorEigenSolver::new(EigenSolver::Jacobi, 3).unwrap();
    for a in well_conditioned() {
        let s = matrix_to_stensor(&a);
        let r = d.compute_sorted_eigen_vectors(&s, false, SortOrder::Descending).unwrap();
        assert!(r.values[0] >= r.values[1] && r.values[1] >= r.values[2]);
        assert_relative_eq!(r.vectors.determinant(), 1.0, epsilon = 1e-12);
        let rebuilt = stensor_from_eigen_decomposition(&r.values, &r.vectors);
        for (x, y) in rebuilt.iter().zip(s.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12 * a.norm());
        }
    }
}

#[test]
fn givens_solver_sorts_and_counts_iterations() {
    for order in [SortOrder::Ascending, SortOrder::Descending] {
        for aggressive in [false, true] {
            let solver = GivensEigenSolver::new(aggressive, order);
            for a in matrices() {
                let (r, iterations) = solver.solve(&a);
                assert!(iterations >= 1);
                let (residual, _) = errors(&a, &r);
                assert!(residual < 1e-12, "residual {residual} for {a}");
                match order {
                    SortOrder::Ascending => assert!(r.values[0] <= r.values[1] && r.values[1] <= r.values[2]),
                    _ => assert!(r.values[0] >= r.values[1] && r.values[1] >= r.values[2]),
                }
            }
        }
    }
}

#[test]
fn plane_tensors_keep_the_out_of_plane_direction() {
    let r = StensorEigenSolver::new(EigenSolver::default(), 2)
        .unwrap()
        .compute_eigen_vectors(&[3.0, 1.0, -2.0, 0.0], false)
        .unwrap();
    assert_eq!(r.values[2], -2.0);
    assert_eq!(r.vectors.column(2).into_owned(), Vector3::z());
}
