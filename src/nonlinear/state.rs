use nalgebra::{SMatrix, SVector};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SolverStatus {
    #[default]
    Initialized,
    Iterating,
    Converged,
    Failed,
}

/// Working set of a non linear solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState<const N: usize> {
    /// Current estimate of the unknowns.
    pub zeros: SVector<f64, N>,
    /// Residual at `zeros`.
    pub fzeros: SVector<f64, N>,
    /// Exact jacobian, or its approximation for the Broyden algorithms.
    pub jacobian: SMatrix<f64, N, N>,
    /// Last correction applied to `zeros`.
    pub delta_zeros: SVector<f64, N>,
    pub is_delta_zeros_defined: bool,
    /// Norm of `fzeros`.
    pub error: f64,
    pub iter: usize,
    pub status: SolverStatus,
}

impl<const N: usize> SolverState<N> {
    pub fn new(zeros: SVector<f64, N>) -> Self {
        Self {
            zeros,
            fzeros: SVector::zeros(),
            jacobian: SMatrix::identity(),
            delta_zeros: SVector::zeros(),
            is_delta_zeros_defined: false,
            error: f64::INFINITY,
            iter: 0,
            status: SolverStatus::Initialized,
        }
    }
}

/// Copy of the state taken before a trial step, restored when the step is
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Checkpoint<const N: usize> {
    zeros: SVector<f64, N>,
    fzeros: SVector<f64, N>,
    jacobian: SMatrix<f64, N, N>,
    pub error: f64,
}

impl<const N: usize> Checkpoint<N> {
    pub fn save(state: &SolverState<N>) -> Self {
        Self {
            zeros: state.zeros,
            fzeros: state.fzeros,
            jacobian: state.jacobian,
            error: state.error,
        }
    }

    pub fn restore(&self, state: &mut SolverState<N>) {
        state.zeros = self.zeros;
        state.fzeros = self.fzeros;
        state.jacobian = self.jacobian;
        state.error = self.error;
    }

    /// Norm of the linearised residual `f + J delta` at the saved estimate.
    pub fn linearised_error(&self, delta: &SVector<f64, N>) -> f64 {
        (self.fzeros + self.jacobian * delta).norm()
    }
}
