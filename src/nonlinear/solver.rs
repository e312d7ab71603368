use nalgebra::{SMatrix, SVector};
use tracing::warn;

use super::options::SolverOptions;
use super::state::{SolverState, SolverStatus};
use super::system::NonLinearSystem;
use crate::error::{SolverError, SolverResult};

/// Outcome of the test of a new estimate by a correction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    Accept,
    /// The estimate has been restored to its previous value.
    Reject,
}

/// Strategy computing the correction applied to the unknowns at each
/// iteration.
pub trait CorrectionAlgorithm<const N: usize> {
    fn name(&self) -> &'static str;

    /// The residual evaluation must provide the exact jacobian.
    fn requires_jacobian(&self) -> bool;

    /// Called at the beginning of each resolution.
    fn initialize(&mut self, _state: &mut SolverState<N>) {}

    /// Called after each valid residual evaluation. Trust region like
    /// algorithms may reject the last step and restore the previous
    /// estimate, in which case convergence is not tested.
    fn check_new_estimate(&mut self, _state: &mut SolverState<N>) -> StepDecision {
        StepDecision::Accept
    }

    /// Called when the residual can't be evaluated. Returns `true` if the
    /// algorithm recovered by itself, the solver halves the last correction
    /// otherwise.
    fn handle_invalid_residual(&mut self, _state: &mut SolverState<N>) -> bool {
        false
    }

    /// Called for every accepted estimate which is not converged.
    fn update_or_check_jacobian(&mut self, _state: &mut SolverState<N>) {}

    /// Stores the new correction in `state.delta_zeros`.
    fn compute_new_correction(&mut self, state: &mut SolverState<N>) -> SolverResult<()>;
}

/// Iterative solver of `f(zeros) = 0`.
#[derive(Debug, Clone)]
pub struct NonLinearSolver<const N: usize, A: CorrectionAlgorithm<N>> {
    pub state: SolverState<N>,
    pub options: SolverOptions,
    pub algorithm: A,
}

impl<const N: usize, A: CorrectionAlgorithm<N>> NonLinearSolver<N, A> {
    const NON_EMPTY: () = assert!(N > 0, "a non linear system needs at least one unknown");

    pub fn new(zeros: SVector<f64, N>, options: SolverOptions, algorithm: A) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            state: SolverState::new(zeros),
            options,
            algorithm,
        }
    }

    /// Sets the initial jacobian, which is used as is by the Broyden
    /// algorithm.
    pub fn with_jacobian(mut self, jacobian: SMatrix<f64, N, N>) -> Self {
        self.state.jacobian = jacobian;
        self
    }

    pub fn zeros(&self) -> &SVector<f64, N> {
        &self.state.zeros
    }

    pub fn set_zeros(&mut self, zeros: SVector<f64, N>) {
        self.state.zeros = zeros;
    }

    pub fn status(&self) -> SolverStatus {
        self.state.status
    }

    /// Iterates from the current estimate until convergence. Returns the
    /// number of iterations.
    pub fn solve<S: NonLinearSystem<N>>(&mut self, system: &mut S) -> SolverResult<usize> {
        self.options.validate()?;
        let Self {
            state,
            options,
            algorithm,
        } = self;
        state.iter = 0;
        state.error = f64::INFINITY;
        state.delta_zeros = SVector::zeros();
        state.is_delta_zeros_defined = false;
        state.status = SolverStatus::Iterating;
        algorithm.initialize(state);
        system.report_beginning_of_resolution(algorithm.name());

        let result = iterate(state, options, algorithm, system);
        match &result {
            Ok(iterations) => {
                state.status = SolverStatus::Converged;
                system.report_success(*iterations, state.error);
            }
            Err(e) => {
                state.status = SolverStatus::Failed;
                system.report_failure(e);
            }
        }
        result
    }
}

fn iterate<const N: usize, A, S>(
    state: &mut SolverState<N>,
    options: &SolverOptions,
    algorithm: &mut A,
    system: &mut S,
) -> SolverResult<usize>
where
    A: CorrectionAlgorithm<N>,
    S: NonLinearSystem<N>,
{
    let mut halvings = 0;
    loop {
        if state.iter >= options.iter_max {
            return Err(SolverError::MaxIterationsReached { iterations: state.iter });
        }
        let valid = {
            let jacobian = if algorithm.requires_jacobian() {
                Some(&mut state.jacobian)
            } else {
                None
            };
            system.compute_residual(&state.zeros, &mut state.fzeros, jacobian)
        };
        let error = if valid {
            system.compute_residual_norm(&state.fzeros)
        } else {
            f64::NAN
        };
        if !error.is_finite() {
            state.iter += 1;
            system.report_invalid_residual_evaluation(state.iter);
            if !algorithm.handle_invalid_residual(state) {
                step_back(state, options, &mut halvings, SolverError::InvalidInitialResidual)?;
            }
            continue;
        }
        state.error = error;
        system.report_status(state.iter, error);

        if algorithm.check_new_estimate(state) == StepDecision::Accept {
            if system.check_convergence(state.error, options.epsilon) {
                return Ok(state.iter);
            }
            algorithm.update_or_check_jacobian(state);
        }

        state.iter += 1;
        if let Err(e) = algorithm.compute_new_correction(state) {
            step_back(state, options, &mut halvings, e)?;
            continue;
        }
        if let Some(relaxation) = options.relaxation {
            if state.iter > relaxation.trigger {
                state.delta_zeros *= relaxation.coefficient;
            }
        }
        system.process_new_correction(&state.zeros, &mut state.delta_zeros);
        halvings = 0;
        state.zeros += state.delta_zeros;
        state.is_delta_zeros_defined = true;
        system.process_new_estimate(&mut state.zeros);
    }
}

/// Halves the last correction, or the initial guess if no correction was
/// applied yet. `cause` is returned when neither is possible.
fn step_back<const N: usize>(
    state: &mut SolverState<N>,
    options: &SolverOptions,
    halvings: &mut usize,
    cause: SolverError,
) -> SolverResult<()> {
    *halvings += 1;
    if *halvings > options.max_halvings {
        return Err(SolverError::TooManyHalvings { halvings: *halvings });
    }
    if state.is_delta_zeros_defined {
        state.delta_zeros *= 0.5;
        state.zeros -= state.delta_zeros;
        warn!(iteration = state.iter, halvings = *halvings, "halving the last correction");
        Ok(())
    } else if options.halve_initial_guess {
        state.zeros *= 0.5;
        warn!(iteration = state.iter, halvings = *halvings, "halving the initial guess");
        Ok(())
    } else {
        Err(cause)
    }
}
