//! Solvers of systems of non linear equations `f(zeros) = 0` with a fixed
//! number of unknowns.
//!
//! A [`NonLinearSolver`] drives the iterations: residual evaluation,
//! convergence test, step halving when the residual can't be evaluated or
//! the correction can't be computed. The correction itself is delegated to
//! a [`CorrectionAlgorithm`].
mod broyden;
mod broyden2;
mod levenberg_marquardt;
mod newton_raphson;
mod numerical_jacobian;
mod options;
mod powell_dogleg;
mod solver;
mod state;
mod system;

pub use broyden::Broyden;
pub use broyden2::Broyden2;
pub use levenberg_marquardt::{LevenbergMarquardt, LevenbergMarquardtParameters};
pub use newton_raphson::NewtonRaphson;
pub use numerical_jacobian::{
    compare_to_numerical_jacobian, numerical_jacobian, JacobianComparison, NumericalJacobian, DEFAULT_PERTURBATION,
};
pub use options::{Relaxation, SolverOptions};
pub use powell_dogleg::{PowellDogLeg, PowellDogLegParameters};
pub use solver::{CorrectionAlgorithm, NonLinearSolver, StepDecision};
pub use state::{SolverState, SolverStatus};
pub use system::{limit_increments, NonLinearSystem};

pub type NewtonRaphsonSolver<const N: usize> = NonLinearSolver<N, NewtonRaphson>;
pub type BroydenSolver<const N: usize> = NonLinearSolver<N, Broyden<N>>;
pub type Broyden2Solver<const N: usize> = NonLinearSolver<N, Broyden2<N>>;
pub type LevenbergMarquardtSolver<const N: usize> = NonLinearSolver<N, LevenbergMarquardt<N>>;
pub type PowellDogLegNewtonRaphsonSolver<const N: usize> = NonLinearSolver<N, PowellDogLeg<N, NewtonRaphson>>;
pub type PowellDogLegBroydenSolver<const N: usize> = NonLinearSolver<N, PowellDogLeg<N, Broyden<N>>>;

#[cfg(test)]
pub(crate) mod test_problems {
    use super::NonLinearSystem;
    use nalgebra::{Matrix1, Matrix2, SMatrix, SVector, Vector1, Vector2};

    /// Intersection of the line `x + 2y = 2` and the ellipse
    /// `x^2 + 4y^2 = 4`, at (0, 1) and (2, 0).
    pub struct Intersection;

    impl NonLinearSystem<2> for Intersection {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 2>,
            f: &mut SVector<f64, 2>,
            jacobian: Option<&mut SMatrix<f64, 2, 2>>,
        ) -> bool {
            *f = Vector2::new(z[0] + 2.0 * z[1] - 2.0, z[0] * z[0] + 4.0 * z[1] * z[1] - 4.0);
            if let Some(j) = jacobian {
                *j = Matrix2::new(1.0, 2.0, 2.0 * z[0], 8.0 * z[1]);
            }
            true
        }
    }

    /// Root at (1, 1).
    pub struct Rosenbrock;

    impl NonLinearSystem<2> for Rosenbrock {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 2>,
            f: &mut SVector<f64, 2>,
            jacobian: Option<&mut SMatrix<f64, 2, 2>>,
        ) -> bool {
            *f = Vector2::new(1.0 - z[0], 10.0 * (z[1] - z[0] * z[0]));
            if let Some(j) = jacobian {
                *j = Matrix2::new(-1.0, 0.0, -20.0 * z[0], 10.0);
            }
            true
        }
    }

    pub struct SquareRoot;

    impl NonLinearSystem<1> for SquareRoot {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 1>,
            f: &mut SVector<f64, 1>,
            jacobian: Option<&mut SMatrix<f64, 1, 1>>,
        ) -> bool {
            *f = Vector1::new(z[0] * z[0] - 2.0);
            if let Some(j) = jacobian {
                *j = Matrix1::new(2.0 * z[0]);
            }
            true
        }
    }

    /// `ln(x) = 1`, undefined for `x <= 0`.
    pub struct Logarithm;

    impl NonLinearSystem<1> for Logarithm {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 1>,
            f: &mut SVector<f64, 1>,
            jacobian: Option<&mut SMatrix<f64, 1, 1>>,
        ) -> bool {
            if z[0] <= 0.0 {
                return false;
            }
            *f = Vector1::new(z[0].ln() - 1.0);
            if let Some(j) = jacobian {
                *j = Matrix1::new(1.0 / z[0]);
            }
            true
        }
    }

    /// `ln(1 - x) = -1/2`, undefined for `x >= 1`.
    pub struct ShiftedLogarithm;

    impl NonLinearSystem<1> for ShiftedLogarithm {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 1>,
            f: &mut SVector<f64, 1>,
            jacobian: Option<&mut SMatrix<f64, 1, 1>>,
        ) -> bool {
            if z[0] >= 1.0 {
                return false;
            }
            *f = Vector1::new((1.0 - z[0]).ln() + 0.5);
            if let Some(j) = jacobian {
                *j = Matrix1::new(-1.0 / (1.0 - z[0]));
            }
            true
        }
    }

    /// Two parallel lines, the jacobian is singular everywhere.
    pub struct Singular;

    impl NonLinearSystem<2> for Singular {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 2>,
            f: &mut SVector<f64, 2>,
            jacobian: Option<&mut SMatrix<f64, 2, 2>>,
        ) -> bool {
            *f = Vector2::new(z[0] + z[1], 2.0 * z[0] + 2.0 * z[1] - 1.0);
            if let Some(j) = jacobian {
                *j = Matrix2::new(1.0, 1.0, 2.0, 2.0);
            }
            true
        }
    }
}
