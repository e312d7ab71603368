use nalgebra::SVector;

use super::newton_raphson::newton_step;
use super::solver::CorrectionAlgorithm;
use super::state::SolverState;
use crate::error::SolverResult;

/// Broyden's first method. The jacobian stored in the solver state is
/// updated by the secant formula
///
/// ```text
/// J += ((df - J delta) delta^T) / (delta . delta)
/// ```
///
/// The initial jacobian is the one given to the solver, the identity by
/// default.
#[derive(Debug, Clone, PartialEq)]
pub struct Broyden<const N: usize> {
    /// Residual at the estimate the last correction was computed from.
    fzeros0: SVector<f64, N>,
}

impl<const N: usize> Default for Broyden<N> {
    fn default() -> Self {
        Self {
            fzeros0: SVector::zeros(),
        }
    }
}

impl<const N: usize> CorrectionAlgorithm<N> for Broyden<N> {
    fn name(&self) -> &'static str {
        "Broyden"
    }

    fn requires_jacobian(&self) -> bool {
        false
    }

    fn update_or_check_jacobian(&mut self, state: &mut SolverState<N>) {
        if !state.is_delta_zeros_defined {
            return;
        }
        let delta = &state.delta_zeros;
        let dd = delta.norm_squared();
        // a step below the resolution of the estimate carries no slope
        let resolution = f64::EPSILON * state.zeros.amax().max(delta.amax());
        if dd > resolution * resolution {
            let df = state.fzeros - self.fzeros0;
            let dj = (df - state.jacobian * delta) / dd;
            state.jacobian += dj * delta.transpose();
        }
    }

    fn compute_new_correction(&mut self, state: &mut SolverState<N>) -> SolverResult<()> {
        newton_step(state)?;
        self.fzeros0 = state.fzeros;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonlinear::test_problems::{Intersection, SquareRoot};
    use crate::nonlinear::{BroydenSolver, NonLinearSystem, SolverOptions};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix1, Matrix2, Vector1, Vector2};

    #[test]
    fn secant_update_matches_the_last_step() {
        let mut broyden = Broyden::<2>::default();
        let mut state = SolverState::new(Vector2::new(1.0, 2.0));
        state.fzeros = Vector2::new(3.0, 13.0);
        state.jacobian = Matrix2::new(1.0, 2.0, 2.0, 16.0);
        broyden.compute_new_correction(&mut state).unwrap();
        state.zeros += state.delta_zeros;
        state.is_delta_zeros_defined = true;
        let mut f = Vector2::zeros();
        Intersection.compute_residual(&state.zeros, &mut f, None);
        state.fzeros = f;
        broyden.update_or_check_jacobian(&mut state);
        // the updated jacobian maps the step onto the change of residual
        let df = f - Vector2::new(3.0, 13.0);
        assert_relative_eq!(state.jacobian * state.delta_zeros, df, epsilon = 1e-12);
    }

    #[test]
    fn converges_from_the_exact_initial_jacobian() {
        let options = SolverOptions {
            epsilon: 1e-12,
            ..SolverOptions::default()
        };
        let mut solver = BroydenSolver::<2>::new(Vector2::new(2.0, 0.5), options, Broyden::default())
            .with_jacobian(Matrix2::new(1.0, 2.0, 4.0, 4.0));
        solver.solve(&mut Intersection).unwrap();
        assert_relative_eq!(*solver.zeros(), Vector2::new(2.0, 0.0), epsilon = 1e-10);
    }

    /// `1e10 (x - 1e-9)`: the unknown and its corrections are tiny, the
    /// first secant update must still make the jacobian exact.
    struct SmallScaleLine;

    impl NonLinearSystem<1> for SmallScaleLine {
        fn compute_residual(
            &mut self,
            z: &SVector<f64, 1>,
            f: &mut SVector<f64, 1>,
            _jacobian: Option<&mut nalgebra::SMatrix<f64, 1, 1>>,
        ) -> bool {
            f[0] = 1e10 * (z[0] - 1e-9);
            true
        }
    }

    #[test]
    fn small_corrections_still_update_the_jacobian() {
        for factor in [0.6, 0.1] {
            let options = SolverOptions {
                iter_max: 5,
                ..SolverOptions::default()
            };
            let mut solver = BroydenSolver::<1>::new(Vector1::new(0.0), options, Broyden::default())
                .with_jacobian(Matrix1::new(factor * 1e10));
            let iterations = solver.solve(&mut SmallScaleLine).unwrap();
            assert!(iterations <= 3, "{iterations} iterations");
            assert_relative_eq!(solver.zeros()[0], 1e-9, max_relative = 1e-12);
            assert_relative_eq!(solver.state.jacobian[(0, 0)], 1e10, max_relative = 1e-6);
        }
    }

    #[test]
    fn reduces_to_the_secant_method_in_one_dimension() {
        let options = SolverOptions {
            epsilon: 1e-12,
            ..SolverOptions::default()
        };
        let mut solver = BroydenSolver::<1>::new(Vector1::new(1.0), options, Broyden::default());
        solver.solve(&mut SquareRoot).unwrap();
        assert_relative_eq!(solver.zeros()[0], std::f64::consts::SQRT_2, epsilon = 1e-10);
    }
}
