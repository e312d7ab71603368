use std::collections::HashMap;

use tracing::trace;

use super::options::value;
use super::solver::{CorrectionAlgorithm, StepDecision};
use super::state::{Checkpoint, SolverState};
use crate::error::{SolverError, SolverResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowellDogLegParameters {
    /// Initial radius of the trust region.
    pub trust_region_size: f64,
    pub max_trust_region_size: f64,
    /// Steps whose actual to predicted reduction ratio is below `eta` are
    /// rejected.
    pub eta: f64,
}

impl Default for PowellDogLegParameters {
    fn default() -> Self {
        Self {
            trust_region_size: 1.0,
            max_trust_region_size: 1e10,
            eta: 1e-4,
        }
    }
}

impl PowellDogLegParameters {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> SolverResult<Self> {
        let d = Self::default();
        let p = Self {
            trust_region_size: value(parameters, "trust_region_size", d.trust_region_size),
            max_trust_region_size: value(parameters, "max_trust_region_size", d.max_trust_region_size),
            eta: value(parameters, "eta", d.eta),
        };
        p.validate()?;
        Ok(p)
    }

    pub fn parameters(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("trust_region_size".to_string(), self.trust_region_size),
            ("max_trust_region_size".to_string(), self.max_trust_region_size),
            ("eta".to_string(), self.eta),
        ])
    }

    pub fn validate(&self) -> SolverResult<()> {
        if !(self.trust_region_size > 0.0 && self.max_trust_region_size >= self.trust_region_size) {
            return Err(SolverError::InvalidOptions(
                "the trust region sizes must be positive and ordered",
            ));
        }
        if !(self.eta > 0.0 && self.eta < 0.25) {
            return Err(SolverError::InvalidOptions("eta must be in ]0, 0.25["));
        }
        Ok(())
    }
}

/// Powell's dog-leg trust region method built on top of another correction
/// algorithm, which provides the full step (Newton-Raphson or Broyden).
///
/// When the full step leaves the trust region, the correction follows the
/// path from the Cauchy point (minimiser of the linearised residual along
/// the steepest descent direction) towards the full step, up to the trust
/// region boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct PowellDogLeg<const N: usize, A> {
    pub inner: A,
    pub parameters: PowellDogLegParameters,
    radius: f64,
    trial: Option<Trial<N>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Trial<const N: usize> {
    checkpoint: Checkpoint<N>,
    step: f64,
    /// Predicted decrease of half the squared residual norm.
    predicted: f64,
}

impl<const N: usize, A: CorrectionAlgorithm<N>> PowellDogLeg<N, A> {
    pub fn new(inner: A, parameters: PowellDogLegParameters) -> Self {
        Self {
            inner,
            parameters,
            radius: parameters.trust_region_size,
            trial: None,
        }
    }

    /// Current radius of the trust region.
    pub fn trust_region_size(&self) -> f64 {
        self.radius
    }
}

impl<const N: usize, A: CorrectionAlgorithm<N> + Default> Default for PowellDogLeg<N, A> {
    fn default() -> Self {
        Self::new(A::default(), PowellDogLegParameters::default())
    }
}

impl<const N: usize, A: CorrectionAlgorithm<N>> CorrectionAlgorithm<N> for PowellDogLeg<N, A> {
    fn name(&self) -> &'static str {
        "Powell dog-leg"
    }

    fn requires_jacobian(&self) -> bool {
        self.inner.requires_jacobian()
    }

    fn initialize(&mut self, state: &mut SolverState<N>) {
        self.inner.initialize(state);
        self.radius = self.parameters.trust_region_size;
        self.trial = None;
    }

    fn check_new_estimate(&mut self, state: &mut SolverState<N>) -> StepDecision {
        let Some(trial) = self.trial.take() else {
            return StepDecision::Accept;
        };
        let e1 = trial.checkpoint.error;
        let actual = 0.5 * (e1 * e1 - state.error * state.error);
        let rho = if trial.predicted > 0.0 {
            actual / trial.predicted
        } else if actual > 0.0 {
            1.0
        } else {
            -1.0
        };
        if rho < 0.25 {
            self.radius = 0.25 * trial.step;
        } else if rho > 0.75 && trial.step >= 0.99 * self.radius {
            self.radius = (2.0 * self.radius).min(self.parameters.max_trust_region_size);
        }
        if rho <= self.parameters.eta {
            trial.checkpoint.restore(state);
            trace!(iteration = state.iter, radius = self.radius, "step rejected");
            return StepDecision::Reject;
        }
        StepDecision::Accept
    }

    fn handle_invalid_residual(&mut self, state: &mut SolverState<N>) -> bool {
        match self.trial.take() {
            Some(trial) => {
                self.radius = 0.25 * trial.step;
                trial.checkpoint.restore(state);
                trace!(iteration = state.iter, radius = self.radius, "invalid residual, shrinking the trust region");
                true
            }
            None => false,
        }
    }

    fn update_or_check_jacobian(&mut self, state: &mut SolverState<N>) {
        self.inner.update_or_check_jacobian(state);
    }

    fn compute_new_correction(&mut self, state: &mut SolverState<N>) -> SolverResult<()> {
        self.inner.compute_new_correction(state)?;
        let full = state.delta_zeros;
        let full_norm = full.norm();
        let radius = self.radius;
        let delta = if full_norm <= radius {
            full
        } else {
            let g = state.jacobian.transpose() * state.fzeros;
            let jg = state.jacobian * g;
            let jg2 = jg.norm_squared();
            if jg2 == 0.0 {
                full * (radius / full_norm)
            } else {
                let cauchy = g * (-g.norm_squared() / jg2);
                let cauchy_norm = cauchy.norm();
                if cauchy_norm >= radius {
                    cauchy * (radius / cauchy_norm)
                } else {
                    // |cauchy + tau (full - cauchy)| = radius
                    let d = full - cauchy;
                    let a = d.norm_squared();
                    let b = 2.0 * cauchy.dot(&d);
                    let c = cauchy.norm_squared() - radius * radius;
                    let tau = (-b + (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
                    cauchy + d * tau
                }
            }
        };
        state.delta_zeros = delta;
        let checkpoint = Checkpoint::save(state);
        let linearised = checkpoint.linearised_error(&delta);
        self.trial = Some(Trial {
            predicted: 0.5 * (state.error * state.error - linearised * linearised),
            step: delta.norm(),
            checkpoint,
        });
        Ok(())
    }
}
