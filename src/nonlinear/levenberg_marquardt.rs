use std::collections::HashMap;

use nalgebra::SMatrix;
use tracing::trace;

use super::options::value;
use super::solver::{CorrectionAlgorithm, StepDecision};
use super::state::{Checkpoint, SolverState};
use crate::error::{SolverError, SolverResult};
use crate::linalg;

/// Damping and step acceptance parameters of the Levenberg-Marquardt
/// algorithm. `p0 < p1 < p2` are thresholds on the ratio of the actual and
/// predicted reductions of the squared residual norm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardtParameters {
    pub mu0: f64,
    pub p0: f64,
    pub p1: f64,
    pub p2: f64,
    /// Lower bound of the damping parameter.
    pub m: f64,
}

impl Default for LevenbergMarquardtParameters {
    fn default() -> Self {
        Self {
            mu0: 1e-6,
            p0: 1e-4,
            p1: 0.25,
            p2: 0.75,
            m: 1e-8,
        }
    }
}

impl LevenbergMarquardtParameters {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> SolverResult<Self> {
        let d = Self::default();
        let p = Self {
            mu0: value(parameters, "levmar_mu0", d.mu0),
            p0: value(parameters, "levmar_p0", d.p0),
            p1: value(parameters, "levmar_p1", d.p1),
            p2: value(parameters, "levmar_p2", d.p2),
            m: value(parameters, "levmar_m", d.m),
        };
        p.validate()?;
        Ok(p)
    }

    pub fn parameters(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("levmar_mu0".to_string(), self.mu0),
            ("levmar_p0".to_string(), self.p0),
            ("levmar_p1".to_string(), self.p1),
            ("levmar_p2".to_string(), self.p2),
            ("levmar_m".to_string(), self.m),
        ])
    }

    pub fn validate(&self) -> SolverResult<()> {
        if !(0.0 <= self.p0 && self.p0 < self.p1 && self.p1 < self.p2 && self.p2 < 1.0) {
            return Err(SolverError::InvalidOptions(
                "Levenberg-Marquardt thresholds must satisfy 0 <= p0 < p1 < p2 < 1",
            ));
        }
        if !(self.mu0 > 0.0 && self.m > 0.0) {
            return Err(SolverError::InvalidOptions(
                "Levenberg-Marquardt damping parameters must be positive",
            ));
        }
        Ok(())
    }
}

/// Levenberg-Marquardt: the correction solves
///
/// ```text
/// (J^T J + mu |f| I) delta = -J^T f
/// ```
///
/// Each step is a trial: it is rejected, and the damping increased, when the
/// residual does not decrease as predicted by the linearised model.
#[derive(Debug, Clone, PartialEq)]
pub struct LevenbergMarquardt<const N: usize> {
    pub parameters: LevenbergMarquardtParameters,
    mu: f64,
    trial: Option<Trial<N>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Trial<const N: usize> {
    checkpoint: Checkpoint<N>,
    /// Norm of the linearised residual `f + J delta`.
    predicted_error: f64,
}

impl<const N: usize> LevenbergMarquardt<N> {
    pub fn new(parameters: LevenbergMarquardtParameters) -> Self {
        Self {
            parameters,
            mu: parameters.mu0,
            trial: None,
        }
    }

    /// Current damping parameter.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    fn reject(&mut self, trial: &Trial<N>, state: &mut SolverState<N>) {
        trial.checkpoint.restore(state);
        self.mu *= 4.0;
        trace!(iteration = state.iter, mu = self.mu, "step rejected");
    }
}

impl<const N: usize> Default for LevenbergMarquardt<N> {
    fn default() -> Self {
        Self::new(LevenbergMarquardtParameters::default())
    }
}

impl<const N: usize> CorrectionAlgorithm<N> for LevenbergMarquardt<N> {
    fn name(&self) -> &'static str {
        "Levenberg-Marquardt"
    }

    fn requires_jacobian(&self) -> bool {
        true
    }

    fn initialize(&mut self, _state: &mut SolverState<N>) {
        self.mu = self.parameters.mu0;
        self.trial = None;
    }

    fn check_new_estimate(&mut self, state: &mut SolverState<N>) -> StepDecision {
        let Some(trial) = self.trial.take() else {
            return StepDecision::Accept;
        };
        let e1 = trial.checkpoint.error;
        let num = state.error * state.error - e1 * e1;
        let den = trial.predicted_error * trial.predicted_error - e1 * e1;
        if den >= 0.0 {
            // the linearised model predicts no decrease
            if state.error < e1 {
                return StepDecision::Accept;
            }
            self.reject(&trial, state);
            return StepDecision::Reject;
        }
        let r = num / den;
        let p = &self.parameters;
        if r < p.p0 {
            self.reject(&trial, state);
            return StepDecision::Reject;
        }
        if r < p.p1 {
            self.mu *= 4.0;
        } else if r > p.p2 {
            self.mu = (self.mu / 4.0).max(p.m);
        }
        StepDecision::Accept
    }

    fn handle_invalid_residual(&mut self, state: &mut SolverState<N>) -> bool {
        match self.trial.take() {
            Some(trial) => {
                self.reject(&trial, state);
                true
            }
            None => false,
        }
    }

    fn compute_new_correction(&mut self, state: &mut SolverState<N>) -> SolverResult<()> {
        let j = &state.jacobian;
        let lhs = j.transpose() * j + SMatrix::<f64, N, N>::identity() * (self.mu * state.error);
        let mut delta = -(j.transpose() * state.fzeros);
        linalg::solve(&lhs, &mut delta)?;
        state.delta_zeros = delta;
        self.trial = Some(Trial {
            checkpoint: Checkpoint::save(state),
            predicted_error: (state.fzeros + state.jacobian * delta).norm(),
        });
        Ok(())
    }
}
