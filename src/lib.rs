//! Numerical kernels for constitutive models: eigen decompositions of small
//! symmetric tensors and fixed-size non linear solvers.
pub mod eigen;
pub mod error;
pub mod linalg;
pub mod nonlinear;
pub mod stensor;

pub use eigen::{EigenDecomposition, EigenSolver, SortOrder, StensorEigenSolver};
pub use error::{EigenError, EigenResult, SolverError, SolverResult};
pub use nonlinear::{CorrectionAlgorithm, NonLinearSolver, NonLinearSystem, SolverOptions, SolverStatus};
