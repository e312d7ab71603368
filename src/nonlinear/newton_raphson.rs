use super::solver::CorrectionAlgorithm;
use super::state::SolverState;
use crate::error::SolverResult;
use crate::linalg;

/// Newton-Raphson: solves `J delta = -f` with the exact jacobian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewtonRaphson;

impl<const N: usize> CorrectionAlgorithm<N> for NewtonRaphson {
    fn name(&self) -> &'static str {
        "Newton-Raphson"
    }

    fn requires_jacobian(&self) -> bool {
        true
    }

    fn compute_new_correction(&mut self, state: &mut SolverState<N>) -> SolverResult<()> {
        newton_step(state)
    }
}

/// Stores `-J^{-1} f` in `state.delta_zeros`, which is left untouched if
/// the jacobian is singular.
pub(crate) fn newton_step<const N: usize>(state: &mut SolverState<N>) -> SolverResult<()> {
    let mut delta = -state.fzeros;
    linalg::solve(&state.jacobian, &mut delta)?;
    state.delta_zeros = delta;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonlinear::test_problems::Intersection;
    use crate::nonlinear::{NewtonRaphsonSolver, SolverOptions};
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    #[test]
    fn quadratic_convergence_on_a_circle_line_intersection() {
        let options = SolverOptions {
            epsilon: 1e-14,
            ..SolverOptions::default()
        };
        let mut solver = NewtonRaphsonSolver::<2>::new(Vector2::new(1.0, 2.0), options, NewtonRaphson);
        let iterations = solver.solve(&mut Intersection).unwrap();
        assert!(iterations < 10);
        assert_relative_eq!(*solver.zeros(), Vector2::new(0.0, 1.0), epsilon = 1e-13);
    }
}
