use std::collections::HashMap;

use nalgebra::{SMatrix, SVector};

use super::options::value;
use super::system::NonLinearSystem;
use crate::error::SolverError;

pub const DEFAULT_PERTURBATION: f64 = 1e-7;

/// Wraps a system which only evaluates its residual and provides the
/// jacobian by centered finite differences.
#[derive(Debug, Clone)]
pub struct NumericalJacobian<S> {
    pub system: S,
    pub perturbation: f64,
}

impl<S> NumericalJacobian<S> {
    pub fn new(system: S) -> Self {
        Self {
            system,
            perturbation: DEFAULT_PERTURBATION,
        }
    }

    /// Reads the perturbation from the `numerical_jacobian_epsilon` key.
    pub fn from_parameters(system: S, parameters: &HashMap<String, f64>) -> Self {
        Self {
            system,
            perturbation: value(parameters, "numerical_jacobian_epsilon", DEFAULT_PERTURBATION),
        }
    }

    pub fn into_inner(self) -> S {
        self.system
    }
}

/// Centered finite difference approximation of the jacobian of `system` at
/// `zeros`. Returns `None` if a perturbed residual can't be evaluated.
pub fn numerical_jacobian<const N: usize, S: NonLinearSystem<N> + ?Sized>(
    system: &mut S,
    zeros: &SVector<f64, N>,
    perturbation: f64,
) -> Option<SMatrix<f64, N, N>> {
    let mut jacobian = SMatrix::<f64, N, N>::zeros();
    let mut fp = SVector::zeros();
    let mut fm = SVector::zeros();
    for i in 0..N {
        let mut z = *zeros;
        z[i] += perturbation;
        if !system.compute_residual(&z, &mut fp, None) {
            return None;
        }
        z[i] = zeros[i] - perturbation;
        if !system.compute_residual(&z, &mut fm, None) {
            return None;
        }
        jacobian.set_column(i, &((fp - fm) / (2.0 * perturbation)));
    }
    Some(jacobian)
}

impl<const N: usize, S: NonLinearSystem<N>> NonLinearSystem<N> for NumericalJacobian<S> {
    fn compute_residual(
        &mut self,
        zeros: &SVector<f64, N>,
        fzeros: &mut SVector<f64, N>,
        jacobian: Option<&mut SMatrix<f64, N, N>>,
    ) -> bool {
        if !self.system.compute_residual(zeros, fzeros, None) {
            return false;
        }
        if let Some(jacobian) = jacobian {
            match numerical_jacobian(&mut self.system, zeros, self.perturbation) {
                Some(j) => *jacobian = j,
                None => return false,
            }
        }
        true
    }

    fn compute_residual_norm(&self, fzeros: &SVector<f64, N>) -> f64 {
        self.system.compute_residual_norm(fzeros)
    }

    fn check_convergence(&self, error: f64, epsilon: f64) -> bool {
        self.system.check_convergence(error, epsilon)
    }

    fn process_new_correction(&mut self, zeros: &SVector<f64, N>, delta_zeros: &mut SVector<f64, N>) {
        self.system.process_new_correction(zeros, delta_zeros)
    }

    fn process_new_estimate(&mut self, zeros: &mut SVector<f64, N>) {
        self.system.process_new_estimate(zeros)
    }

    fn report_beginning_of_resolution(&self, algorithm: &str) {
        self.system.report_beginning_of_resolution(algorithm)
    }

    fn report_status(&self, iteration: usize, error: f64) {
        self.system.report_status(iteration, error)
    }

    fn report_invalid_residual_evaluation(&self, iteration: usize) {
        self.system.report_invalid_residual_evaluation(iteration)
    }

    fn report_success(&self, iterations: usize, error: f64) {
        self.system.report_success(iterations, error)
    }

    fn report_failure(&self, error: &SolverError) {
        self.system.report_failure(error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JacobianComparison<const N: usize> {
    pub analytical: SMatrix<f64, N, N>,
    pub numerical: SMatrix<f64, N, N>,
    /// Largest absolute difference between both jacobians.
    pub max_difference: f64,
}

/// Compares the jacobian computed by `system` with its finite difference
/// approximation, which helps debugging hand written jacobians. Returns
/// `None` if a residual can't be evaluated.
pub fn compare_to_numerical_jacobian<const N: usize, S: NonLinearSystem<N> + ?Sized>(
    system: &mut S,
    zeros: &SVector<f64, N>,
    perturbation: f64,
) -> Option<JacobianComparison<N>> {
    let mut fzeros = SVector::zeros();
    let mut analytical = SMatrix::zeros();
    if !system.compute_residual(zeros, &mut fzeros, Some(&mut analytical)) {
        return None;
    }
    let numerical = numerical_jacobian(system, zeros, perturbation)?;
    let max_difference = (analytical - numerical).amax();
    Some(JacobianComparison {
        analytical,
        numerical,
        max_difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonlinear::test_problems::{Intersection, Logarithm, Rosenbrock};
    use crate::nonlinear::{NewtonRaphson, NewtonRaphsonSolver, SolverOptions};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix2, Vector1, Vector2};

    #[test]
    fn finite_differences_match_the_exact_jacobian() {
        let c = compare_to_numerical_jacobian(&mut Intersection, &Vector2::new(0.3, -1.2), 1e-6).unwrap();
        assert_eq!(c.analytical, Matrix2::new(1.0, 2.0, 0.6, -9.6));
        assert!(c.max_difference < 1e-8, "{}", c.max_difference);
        // the perturbed estimate 0 is outside the domain
        assert!(compare_to_numerical_jacobian(&mut Logarithm, &Vector1::new(0.5), 1.0).is_none());
    }

    #[test]
    fn newton_raphson_with_a_numerical_jacobian() {
        let options = SolverOptions {
            epsilon: 1e-12,
            ..SolverOptions::default()
        };
        let mut system = NumericalJacobian::new(Rosenbrock);
        let mut solver = NewtonRaphsonSolver::<2>::new(Vector2::new(-1.2, 1.0), options, NewtonRaphson);
        solver.solve(&mut system).unwrap();
        assert_relative_eq!(*solver.zeros(), Vector2::new(1.0, 1.0), epsilon = 1e-10);
    }

    #[test]
    fn perturbation_is_configurable() {
        let parameters = HashMap::from([("numerical_jacobian_epsilon".to_string(), 1e-5)]);
        assert_eq!(NumericalJacobian::from_parameters(Rosenbrock, &parameters).perturbation, 1e-5);
        assert_eq!(NumericalJacobian::new(Rosenbrock).perturbation, DEFAULT_PERTURBATION);
    }
}
