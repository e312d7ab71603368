use std::collections::HashMap;

use crate::error::{SolverError, SolverResult};

/// Scales every correction by `coefficient` once `trigger` iterations have
/// been performed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    pub trigger: usize,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Convergence threshold on the norm of the residual.
    pub epsilon: f64,
    pub iter_max: usize,
    /// Maximum number of consecutive step halvings.
    pub max_halvings: usize,
    /// Halve the initial guess when the first residual or the first
    /// correction can't be computed.
    pub halve_initial_guess: bool,
    pub relaxation: Option<Relaxation>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            epsilon: 1e-8,
            iter_max: 100,
            max_halvings: 10,
            halve_initial_guess: true,
            relaxation: None,
        }
    }
}

impl SolverOptions {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> SolverResult<Self> {
        let default = Self::default();
        let relaxation = match (
            parameters.get("relaxation_trigger"),
            parameters.get("relaxation_coefficient"),
        ) {
            (None, None) => None,
            (Some(_), Some(&coefficient)) => Some(Relaxation {
                trigger: count(parameters, "relaxation_trigger", 0)?,
                coefficient,
            }),
            _ => {
                return Err(SolverError::InvalidOptions(
                    "relaxation_trigger and relaxation_coefficient must be given together",
                ))
            }
        };
        let options = Self {
            epsilon: value(parameters, "epsilon", default.epsilon),
            iter_max: count(parameters, "iter_max", default.iter_max)?,
            max_halvings: count(parameters, "max_halvings", default.max_halvings)?,
            halve_initial_guess: value(parameters, "halve_initial_guess", 1.0) != 0.0,
            relaxation,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn parameters(&self) -> HashMap<String, f64> {
        let mut parameters = HashMap::from([
            ("epsilon".to_string(), self.epsilon),
            ("iter_max".to_string(), self.iter_max as f64),
            ("max_halvings".to_string(), self.max_halvings as f64),
            (
                "halve_initial_guess".to_string(),
                if self.halve_initial_guess { 1.0 } else { 0.0 },
            ),
        ]);
        if let Some(r) = self.relaxation {
            parameters.insert("relaxation_trigger".to_string(), r.trigger as f64);
            parameters.insert("relaxation_coefficient".to_string(), r.coefficient);
        }
        parameters
    }

    pub fn validate(&self) -> SolverResult<()> {
        if !(self.epsilon > 0.0) {
            return Err(SolverError::InvalidOptions("epsilon must be positive"));
        }
        if self.iter_max == 0 {
            return Err(SolverError::InvalidOptions("iter_max must be positive"));
        }
        if let Some(r) = self.relaxation {
            if !(r.coefficient > 0.0 && r.coefficient <= 1.0) {
                return Err(SolverError::InvalidOptions(
                    "relaxation_coefficient must be in ]0, 1]",
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn value(parameters: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    parameters.get(key).copied().unwrap_or(default)
}

/// Non negative integer stored as a float.
fn count(parameters: &HashMap<String, f64>, key: &'static str, default: usize) -> SolverResult<usize> {
    match parameters.get(key) {
        None => Ok(default),
        Some(&v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as usize),
        Some(_) => Err(SolverError::InvalidOptions("counters must be non negative integers")),
    }
}
