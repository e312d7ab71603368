use nalgebra::{SMatrix, SVector};
use tracing::{debug, trace};

use crate::error::SolverError;

/// A system of `N` non linear equations in `N` unknowns.
///
/// Only `compute_residual` is required. The other methods are hooks with
/// default behaviours that the solver calls at well defined points of each
/// iteration.
pub trait NonLinearSystem<const N: usize> {
    /// Evaluates the residual at `zeros`. The jacobian must be computed when
    /// `jacobian` is `Some`. Returns `false` if the residual is not defined
    /// at `zeros`; the solver then steps back.
    fn compute_residual(
        &mut self,
        zeros: &SVector<f64, N>,
        fzeros: &mut SVector<f64, N>,
        jacobian: Option<&mut SMatrix<f64, N, N>>,
    ) -> bool;

    fn compute_residual_norm(&self, fzeros: &SVector<f64, N>) -> f64 {
        fzeros.norm()
    }

    fn check_convergence(&self, error: f64, epsilon: f64) -> bool {
        error < epsilon
    }

    /// Called before a correction is applied, e.g. to bound it with
    /// `limit_increments`.
    fn process_new_correction(&mut self, _zeros: &SVector<f64, N>, _delta_zeros: &mut SVector<f64, N>) {}

    /// Called after a correction has been applied, e.g. to project the
    /// estimate on its admissible domain.
    fn process_new_estimate(&mut self, _zeros: &mut SVector<f64, N>) {}

    fn report_beginning_of_resolution(&self, algorithm: &str) {
        debug!(algorithm, "beginning of the resolution");
    }

    fn report_status(&self, iteration: usize, error: f64) {
        trace!(iteration, error, "residual evaluated");
    }

    fn report_invalid_residual_evaluation(&self, iteration: usize) {
        debug!(iteration, "invalid residual evaluation");
    }

    fn report_success(&self, iterations: usize, error: f64) {
        debug!(iterations, error, "converged");
    }

    fn report_failure(&self, error: &SolverError) {
        debug!(%error, "resolution failed");
    }
}

impl<const N: usize, S: NonLinearSystem<N> + ?Sized> NonLinearSystem<N> for &mut S {
    fn compute_residual(
        &mut self,
        zeros: &SVector<f64, N>,
        fzeros: &mut SVector<f64, N>,
        jacobian: Option<&mut SMatrix<f64, N, N>>,
    ) -> bool {
        (**self).compute_residual(zeros, fzeros, jacobian)
    }

    fn compute_residual_norm(&self, fzeros: &SVector<f64, N>) -> f64 {
        (**self).compute_residual_norm(fzeros)
    }

    fn check_convergence(&self, error: f64, epsilon: f64) -> bool {
        (**self).check_convergence(error, epsilon)
    }

    fn process_new_correction(&mut self, zeros: &SVector<f64, N>, delta_zeros: &mut SVector<f64, N>) {
        (**self).process_new_correction(zeros, delta_zeros)
    }

    fn process_new_estimate(&mut self, zeros: &mut SVector<f64, N>) {
        (**self).process_new_estimate(zeros)
    }

    fn report_beginning_of_resolution(&self, algorithm: &str) {
        (**self).report_beginning_of_resolution(algorithm)
    }

    fn report_status(&self, iteration: usize, error: f64) {
        (**self).report_status(iteration, error)
    }

    fn report_invalid_residual_evaluation(&self, iteration: usize) {
        (**self).report_invalid_residual_evaluation(iteration)
    }

    fn report_success(&self, iterations: usize, error: f64) {
        (**self).report_success(iterations, error)
    }

    fn report_failure(&self, error: &SolverError) {
        (**self).report_failure(error)
    }
}

/// Scales `delta` down, keeping its direction, so that `|delta[i]| <=
/// bounds[i]` for every component. Non positive bounds leave the component
/// unconstrained.
pub fn limit_increments<const N: usize>(delta: &mut SVector<f64, N>, bounds: &SVector<f64, N>) {
    let mut factor: f64 = 1.0;
    for (d, b) in delta.iter().zip(bounds.iter()) {
        if *b > 0.0 && d.abs() > *b {
            factor = factor.min(b / d.abs());
        }
    }
    if factor < 1.0 {
        *delta *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn increments_are_scaled_as_a_whole() {
        let mut delta = Vector3::new(4.0, -1.0, 0.5);
        limit_increments(&mut delta, &Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(delta, Vector3::new(1.0, -0.25, 0.125));
        let mut small = Vector3::new(0.1, 0.2, -0.3);
        limit_increments(&mut small, &Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(small, Vector3::new(0.1, 0.2, -0.3));
    }
}
