use nalgebra::{SMatrix, SVector};

use super::solver::CorrectionAlgorithm;
use super::state::SolverState;
use crate::error::SolverResult;

/// Broyden's second method: the inverse of the jacobian is approximated
/// directly, so each correction is a matrix-vector product.
///
/// ```text
/// H += ((delta - H df) (delta^T H)) / (delta . H df)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Broyden2<const N: usize> {
    /// Approximation of the inverse of the jacobian.
    pub inverse_jacobian: SMatrix<f64, N, N>,
    fzeros0: SVector<f64, N>,
}

impl<const N: usize> Broyden2<N> {
    pub fn new(inverse_jacobian: SMatrix<f64, N, N>) -> Self {
        Self {
            inverse_jacobian,
            fzeros0: SVector::zeros(),
        }
    }
}

impl<const N: usize> Default for Broyden2<N> {
    fn default() -> Self {
        Self::new(SMatrix::identity())
    }
}

impl<const N: usize> CorrectionAlgorithm<N> for Broyden2<N> {
    fn name(&self) -> &'static str {
        "Broyden 2"
    }

    fn requires_jacobian(&self) -> bool {
        false
    }

    fn update_or_check_jacobian(&mut self, state: &mut SolverState<N>) {
        if !state.is_delta_zeros_defined {
            return;
        }
        let delta = &state.delta_zeros;
        let h = &self.inverse_jacobian;
        let hdf = h * (state.fzeros - self.fzeros0);
        let den = delta.dot(&hdf);
        if den.abs() > 100.0 * f64::EPSILON * delta.norm() * hdf.norm() {
            let update = (delta - hdf) * (delta.transpose() * h) / den;
            self.inverse_jacobian += update;
        }
    }

    fn compute_new_correction(&mut self, state: &mut SolverState<N>) -> SolverResult<()> {
        state.delta_zeros = -(self.inverse_jacobian * state.fzeros);
        self.fzeros0 = state.fzeros;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonlinear::test_problems::Rosenbrock;
    use crate::nonlinear::{Broyden2Solver, SolverOptions};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix2, Vector2};

    #[test]
    fn converges_from_the_exact_initial_inverse() {
        let options = SolverOptions {
            epsilon: 1e-12,
            ..SolverOptions::default()
        };
        // inverse of the jacobian of the Rosenbrock system at (-1.2, 1)
        let jacobian = Matrix2::new(-1.0, 0.0, 24.0, 10.0);
        let inverse = jacobian.try_inverse().unwrap();
        let mut solver = Broyden2Solver::<2>::new(Vector2::new(-1.2, 1.0), options, Broyden2::new(inverse));
        solver.solve(&mut Rosenbrock).unwrap();
        assert_relative_eq!(*solver.zeros(), Vector2::new(1.0, 1.0), epsilon = 1e-10);
    }

    #[test]
    fn correction_needs_no_linear_solve() {
        let mut broyden = Broyden2::<2>::new(Matrix2::new(0.0, 1.0, 1.0, 0.0));
        let mut state = SolverState::new(Vector2::zeros());
        state.fzeros = Vector2::new(1.0, 2.0);
        broyden.compute_new_correction(&mut state).unwrap();
        assert_eq!(state.delta_zeros, Vector2::new(-2.0, -1.0));
    }
}
