//! Eigen decomposition of packed symmetric tensors in 1D, 2D and 3D with a
//! solver chosen at run time.
use nalgebra::{Matrix3, Vector3};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::givens::GivensEigenSolver;
use super::{cardano, cubic, cuppen, harari, jacobi, ql, sym2x2, EigenDecomposition, SortOrder};
use crate::error::{EigenError, EigenResult};
use crate::stensor::{check_stensor, stensor_to_matrix, to_3d};

const FACTOR: f64 = std::f64::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EigenSolver {
    /// Roots of the characteristic polynomial and cofactor eigen vectors.
    #[default]
    CubicRoots,
    Jacobi,
    Ql,
    Cuppen,
    /// Analytic solver falling back to QL when ill-conditioned.
    Hybrid,
    /// Analytic solver without fallback.
    Analytic,
    GivensQr,
    /// Most distinct eigen value from the deviatoric invariants, the two
    /// others by deflation.
    Harari,
}

type ValuesFn = fn(&[f64; 6], bool) -> EigenResult<Vector3<f64>>;
type VectorsFn = fn(&[f64; 6], bool) -> EigenResult<EigenDecomposition>;

/// Eigen solver bound to a space dimension. The `refine` flag is honoured
/// by `CubicRoots` (Newton polishing of the roots) and `GivensQr`
/// (aggressive convergence test), other solvers ignore it.
#[derive(Clone, Copy)]
pub struct StensorEigenSolver {
    solver: EigenSolver,
    dimension: usize,
    values: ValuesFn,
    vectors: VectorsFn,
}

impl StensorEigenSolver {
    pub fn new(solver: EigenSolver, dimension: usize) -> EigenResult<Self> {
        let (values, vectors): (ValuesFn, VectorsFn) = match dimension {
            1 => (values_1d, vectors_1d),
            2 => (values_2d, vectors_2d),
            3 => solver.functions(),
            _ => return Err(EigenError::UnsupportedDimension(dimension)),
        };
        Ok(Self {
            solver,
            dimension,
            values,
            vectors,
        })
    }

    pub fn solver(&self) -> EigenSolver {
        self.solver
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Eigen values in the natural order of the solver. In 1D and 2D the
    /// out of plane values are the diagonal components.
    pub fn compute_eigen_values(&self, s: &[f64], refine: bool) -> EigenResult<Vector3<f64>> {
        check_stensor(self.dimension, s)?;
        (self.values)(&to_3d(s)?, refine)
    }

    pub fn compute_eigen_vectors(&self, s: &[f64], refine: bool) -> EigenResult<EigenDecomposition> {
        check_stensor(self.dimension, s)?;
        (self.vectors)(&to_3d(s)?, refine)
    }

    pub fn compute_sorted_eigen_vectors(
        &self,
        s: &[f64],
        refine: bool,
        order: SortOrder,
    ) -> EigenResult<EigenDecomposition> {
        Ok(self.compute_eigen_vectors(s, refine)?.sorted(order))
    }
}

impl std::fmt::Debug for StensorEigenSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StensorEigenSolver")
            .field("solver", &self.solver)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl EigenSolver {
    fn functions(self) -> (ValuesFn, VectorsFn) {
        match self {
            EigenSolver::CubicRoots => (cubic::eigen_values, cubic::eigen_vectors),
            EigenSolver::Jacobi => (jacobi_values, jacobi_vectors),
            EigenSolver::Ql => (ql_values, ql_vectors),
            EigenSolver::Cuppen => (cuppen_values, cuppen_vectors),
            EigenSolver::Hybrid => (cardano_values, hybrid_vectors),
            EigenSolver::Analytic => (cardano_values, analytic_vectors),
            EigenSolver::GivensQr => (givens_values, givens_vectors),
            EigenSolver::Harari => (harari_values, harari_vectors),
        }
    }
}

fn values_1d(s: &[f64; 6], _refine: bool) -> EigenResult<Vector3<f64>> {
    Ok(Vector3::new(s[0], s[1], s[2]))
}

fn vectors_1d(s: &[f64; 6], refine: bool) -> EigenResult<EigenDecomposition> {
    Ok(EigenDecomposition::new(values_1d(s, refine)?, Matrix3::identity()))
}

fn values_2d(s: &[f64; 6], _refine: bool) -> EigenResult<Vector3<f64>> {
    let (rt1, rt2) = sym2x2::eigen_values(s[0], FACTOR * s[3], s[1]);
    Ok(Vector3::new(rt1, rt2, s[2]))
}

fn vectors_2d(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    let r = sym2x2::eigen_decomposition(s[0], FACTOR * s[3], s[1]);
    #[rustfmt::skip]
    let m = Matrix3::new(
        r.cs, -r.sn, 0.0,
        r.sn,  r.cs, 0.0,
        0.0,   0.0,  1.0,
    );
    Ok(EigenDecomposition::new(Vector3::new(r.rt1, r.rt2, s[2]), m))
}

fn cardano_values(s: &[f64; 6], _refine: bool) -> EigenResult<Vector3<f64>> {
    Ok(cardano::eigen_values(&stensor_to_matrix(s)))
}

fn jacobi_values(s: &[f64; 6], refine: bool) -> EigenResult<Vector3<f64>> {
    Ok(jacobi_vectors(s, refine)?.values)
}

fn jacobi_vectors(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    jacobi::eigen_decomposition(stensor_to_matrix(s))
}

fn ql_values(s: &[f64; 6], refine: bool) -> EigenResult<Vector3<f64>> {
    Ok(ql_vectors(s, refine)?.values)
}

fn ql_vectors(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    ql::eigen_decomposition(&stensor_to_matrix(s))
}

fn cuppen_values(s: &[f64; 6], refine: bool) -> EigenResult<Vector3<f64>> {
    Ok(cuppen_vectors(s, refine)?.values)
}

fn cuppen_vectors(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    cuppen::eigen_decomposition(&stensor_to_matrix(s))
}

fn hybrid_vectors(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    cardano::hybrid(&stensor_to_matrix(s))
}

fn analytic_vectors(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    Ok(cardano::analytic(stensor_to_matrix(s)))
}

fn givens_values(s: &[f64; 6], refine: bool) -> EigenResult<Vector3<f64>> {
    Ok(givens_vectors(s, refine)?.values)
}

fn givens_vectors(s: &[f64; 6], refine: bool) -> EigenResult<EigenDecomposition> {
    let (r, _) = GivensEigenSolver::new(refine, SortOrder::Unsorted).solve(&stensor_to_matrix(s));
    Ok(r)
}

fn harari_values(s: &[f64; 6], _refine: bool) -> EigenResult<Vector3<f64>> {
    harari::eigen_values(&stensor_to_matrix(s))
}

fn harari_vectors(s: &[f64; 6], _refine: bool) -> EigenResult<EigenDecomposition> {
    harari::eigen_decomposition(&stensor_to_matrix(s))
}
