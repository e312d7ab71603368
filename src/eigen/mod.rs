//! Eigen solvers for small symmetric matrices.
//!
//! All 3x3 solvers return the eigen vectors as the columns of a matrix.
//! Unless a sort order is requested, the order of the eigen values is the
//! natural one of each algorithm.
use nalgebra::{Matrix3, Vector3};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub mod cardano;
pub mod cubic;
pub mod cuppen;
pub mod dispatch;
pub mod givens;
pub mod harari;
pub mod householder;
pub mod jacobi;
pub mod ql;
pub mod sym2x2;

pub use dispatch::{EigenSolver, StensorEigenSolver};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDecomposition {
    pub values: Vector3<f64>,
    pub vectors: Matrix3<f64>,
}

impl EigenDecomposition {
    pub fn new(values: Vector3<f64>, vectors: Matrix3<f64>) -> Self {
        Self { values, vectors }
    }

    /// Sorts the eigen values and permutes the eigen vectors accordingly.
    /// For `Ascending` and `Descending`, the sign of the last eigen vector is
    /// flipped if needed so that the eigen vectors form a direct basis.
    pub fn sort(&mut self, order: SortOrder) {
        if order == SortOrder::Unsorted {
            return;
        }
        let (i0, i1, i2) = sorted_indices(&self.values, order);
        let values = Vector3::new(self.values[i0], self.values[i1], self.values[i2]);
        let mut vectors = Matrix3::from_columns(&[
            self.vectors.column(i0).into_owned(),
            self.vectors.column(i1).into_owned(),
            self.vectors.column(i2).into_owned(),
        ]);
        if vectors.determinant() < 0.0 {
            vectors.column_mut(2).neg_mut();
        }
        self.values = values;
        self.vectors = vectors;
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort(order);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
    #[default]
    Unsorted,
}

impl SortOrder {
    /// Integer code used by the Givens solver: +1, -1 and 0.
    pub fn code(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
            SortOrder::Unsorted => 0,
        }
    }
}

/// Returns the permutation sorting `values` in the given order.
pub fn sorted_indices(values: &Vector3<f64>, order: SortOrder) -> (usize, usize, usize) {
    let mut idx = [0usize, 1, 2];
    match order {
        SortOrder::Ascending => idx.sort_by(|&a, &b| values[a].total_cmp(&values[b])),
        SortOrder::Descending => idx.sort_by(|&a, &b| values[b].total_cmp(&values[a])),
        SortOrder::Unsorted => {}
    }
    (idx[0], idx[1], idx[2])
}

/// Sorts three eigen values without eigen vectors.
pub fn sort_eigen_values(values: &mut Vector3<f64>, order: SortOrder) {
    let (i0, i1, i2) = sorted_indices(values, order);
    *values = Vector3::new(values[i0], values[i1], values[i2]);
}

/// Returns a unit vector orthogonal to `v`, which must not be null.
pub(crate) fn find_perpendicular_vector(v: &Vector3<f64>) -> Vector3<f64> {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    let e = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&e).normalize()
}

/// Copies the upper triangle of `a` into its lower triangle.
pub(crate) fn symmetric_from_upper(a: &Matrix3<f64>) -> Matrix3<f64> {
    let mut m = *a;
    m.fill_lower_triangle_with_upper_triangle();
    m
}

/// Given the unit eigen vector `v` of the full symmetric matrix `s`, returns
/// the two other eigen pairs as those of the restriction of `s` to the plane
/// orthogonal to `v`, the largest eigen value first. The two eigen values
/// may be arbitrarily close.
pub(crate) fn deflate(s: &Matrix3<f64>, v: &Vector3<f64>) -> [(f64, Vector3<f64>); 2] {
    let u1 = find_perpendicular_vector(v);
    let u2 = v.cross(&u1);
    let (su1, su2) = (s * u1, s * u2);
    let r = sym2x2::eigen_decomposition(
        u1.dot(&su1),
        0.5 * (u1.dot(&su2) + u2.dot(&su1)),
        u2.dot(&su2),
    );
    [(r.rt1, u1 * r.cs + u2 * r.sn), (r.rt2, u2 * r.cs - u1 * r.sn)]
}

#[cfg(test)]
pub(crate) mod test_matrices {
    //! Matrix families shared by the solver tests.
    use nalgebra::{Matrix3, Rotation3, Vector3};

    pub fn from_spectrum(values: [f64; 3], angles: (f64, f64, f64)) -> Matrix3<f64> {
        let r = Rotation3::from_euler_angles(angles.0, angles.1, angles.2).into_inner();
        let a = r * Matrix3::from_diagonal(&Vector3::from(values)) * r.transpose();
        // exact symmetry
        (a + a.transpose()) * 0.5
    }

    pub fn families() -> Vec<Matrix3<f64>> {
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
        let rotations = [
            (0.3, 1.1, -0.7),
            (2.0, 0.1, 0.5),
            (0.0, 0.0, 0.0),
            (std::f64::consts::FRAC_PI_4, 0.0, 0.0),
            (1e-9, 0.0, 0.0),
        ];
        let mut matrices = Vec::new();
        for values in spectra {
            for angles in rotations {
                matrices.push(from_spectrum(values, angles));
            }
        }
        matrices.push(Matrix3::new(2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0));
        matrices.push(Matrix3::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0));
        matrices.push(Matrix3::new(1.0, 1e-20, 0.0, 1e-20, 1.0, 0.0, 0.0, 0.0, 3.0));
        matrices.push(Matrix3::new(
            1.232, 1.1055, 2.3635, 1.1055, 2.5198, 0.6905, 2.3635, 0.6905, 0.234,
        ));
        matrices
    }

    /// Pairs of eigen values `g` apart for `g` from `1e-16` to `1e-2`, the
    /// third one near or far.
    pub fn clustered() -> Vec<Matrix3<f64>> {
        let rotations = [
            (0.3, 1.1, -0.7),
            (2.0, 0.1, 0.5),
            (0.0, 0.0, 0.0),
            (std::f64::consts::FRAC_PI_4, 0.0, 0.0),
            (1.3, -0.4, 2.2),
        ];
        let mut matrices = Vec::new();
        for k in 0..15 {
            let g = 10f64.powi(k - 16);
            for values in [
                [1.0, 1.0 + g, 1.007],
                [1.0, 1.0 + g, -0.865],
                [1.0, 1.0 + g, 1.0 + 2.0 * g],
                [-3.0, 2.0, 2.0 + g],
            ] {
                for angles in rotations {
                    matrices.push(from_spectrum(values, angles));
                }
            }
        }
        matrices
    }

    /// Well separated spectra only.
    pub fn well_conditioned() -> Vec<Matrix3<f64>> {
        let mut matrices = Vec::new();
        for (k, values) in [[1.0, 2.0, 3.0], [-4.0, 0.5, 9.0], [10.0, -3.0, 1.0]]
            .into_iter()
            .enumerate()
        {
            for angles in [(0.3, 1.1, -0.7), (2.0, 0.1, 0.5), (0.7 * k as f64 + 0.2, -0.4, 1.3)] {
                matrices.push(from_spectrum(values, angles));
            }
        }
        matrices
    }

    /// Largest eigen residual relative to the matrix norm, and largest
    /// deviation of `V^T V` from the identity.
    pub fn residuals(a: &Matrix3<f64>, values: &Vector3<f64>, vectors: &Matrix3<f64>) -> (f64, f64) {
        let norm = a.norm().max(f64::MIN_POSITIVE);
        let mut eig: f64 = 0.0;
        for i in 0..3 {
            let v = vectors.column(i);
            eig = eig.max((a * v - values[i] * v).norm() / norm);
        }
        let orth = (vectors.transpose() * vectors - Matrix3::identity()).amax();
        (eig, orth)
    }
}
