use thiserror::Error;

pub type EigenResult<T> = Result<T, EigenError>;
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors reported by the symmetric eigen solvers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EigenError {
    #[error("{algorithm} did not converge after {iterations} iterations")]
    NoConvergence {
        algorithm: &'static str,
        iterations: usize,
    },

    #[error("invalid symmetric tensor size in dimension {dimension}: expected {expected} values, found {found}")]
    InvalidStensorSize {
        dimension: usize,
        expected: usize,
        found: usize,
    },

    #[error("unsupported space dimension {0}")]
    UnsupportedDimension(usize),

    #[error("symmetric tensor has non finite components")]
    NonFiniteInput,

    #[error("eigen values computation failed")]
    EigenValuesComputationFailed,

    #[error("eigen vectors computation failed for eigen value {0}")]
    EigenVectorsComputationFailed(f64),
}

/// Errors reported by the dense linear solve and the non linear solvers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("singular or near-singular matrix")]
    SingularMatrix,

    #[error("maximum number of iterations ({iterations}) reached")]
    MaxIterationsReached { iterations: usize },

    #[error("too many consecutive step halvings ({halvings})")]
    TooManyHalvings { halvings: usize },

    #[error("residual can't be evaluated at the initial guess")]
    InvalidInitialResidual,

    #[error("invalid solver options: {0}")]
    InvalidOptions(&'static str),
}
