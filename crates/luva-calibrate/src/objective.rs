//! Objective functions
//!
//! The error of a treatment is
//!
//! $$e = w_{anth} \left(\frac{A - A_{obs}}{A_{obs}}\right)^2 + w_{fw} \left(\frac{F - F_{obs}}{F_{obs}}\right)^2$$
//!
//! and the objective is the weighted mean of `e` over observations. A run
//! that fails, or produces non-finite output, contributes a fixed penalty so
//! optimisers can keep going.

use crate::parameter_space::ParameterSpace;
use crate::report::{CalibrationReport, TreatmentOutcome, TreatmentReport};
use crate::{Error, Result};
use luva_model::catalogue::{ReferenceTarget, ReferenceTreatment};
use luva_model::parameters::ParameterSet;
use luva_model::simulation::Simulation;
use luva_model::treatment::Treatment;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A function to minimise over a bounded space.
pub trait Objective: Sync {
    /// Number of coefficients in a point
    fn dimension(&self) -> usize;

    /// Objective value at `x`. Failures are reported as a large finite value.
    fn evaluate(&self, x: &[f64]) -> f64;

    /// Evaluate many points in parallel, preserving order.
    fn evaluate_batch(&self, points: &[Vec<f64>]) -> Vec<f64> {
        points.par_iter().map(|x| self.evaluate(x)).collect()
    }
}

/// Wraps a plain function as an [`Objective`].
pub struct FnObjective<F> {
    dimension: usize,
    function: F,
}

impl<F: Fn(&[f64]) -> f64 + Sync> FnObjective<F> {
    pub fn new(dimension: usize, function: F) -> Self {
        Self { dimension, function }
    }
}

impl<F: Fn(&[f64]) -> f64 + Sync> Objective for FnObjective<F> {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        (self.function)(x)
    }
}

/// Relative importance of the two observed quantities and the failure penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectiveWeights {
    /// default: 0.3
    pub fresh_weight: f64,
    /// default: 0.7
    pub anthocyanin: f64,
    /// Error assigned to a failed treatment
    /// default: 1e6
    pub failure_penalty: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            fresh_weight: 0.3,
            anthocyanin: 0.7,
            failure_penalty: 1e6,
        }
    }
}

impl ObjectiveWeights {
    /// Combined squared relative error for one treatment.
    pub fn treatment_error(&self, fresh_weight: f64, anthocyanin_ppm: f64, target: &ReferenceTarget) -> f64 {
        let fw = (fresh_weight - target.fresh_weight) / target.fresh_weight;
        let anth = (anthocyanin_ppm - target.anthocyanin_ppm) / target.anthocyanin_ppm;
        self.anthocyanin * anth.powi(2) + self.fresh_weight * fw.powi(2)
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.fresh_weight, self.anthocyanin, self.failure_penalty]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !finite || self.fresh_weight + self.anthocyanin <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "objective weights must be non-negative and not all zero: {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// A treatment with its observed outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub treatment: Treatment,
    pub target: ReferenceTarget,
    /// Relative weight of this observation in the mean
    pub weight: f64,
}

impl Observation {
    pub fn new(treatment: Treatment, target: ReferenceTarget) -> Self {
        Self {
            treatment,
            target,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl From<ReferenceTreatment> for Observation {
    fn from(reference: ReferenceTreatment) -> Self {
        Self::new(reference.treatment, reference.target)
    }
}

/// Fit of model coefficients within a [`ParameterSpace`] to a set of observations.
///
/// Every evaluation starts from the base simulation's parameters, applies the
/// point as overrides and runs each observation from its initial state.
#[derive(Debug, Clone)]
pub struct CalibrationProblem {
    simulation: Simulation,
    space: ParameterSpace,
    observations: Vec<Observation>,
    weights: ObjectiveWeights,
}

impl CalibrationProblem {
    pub fn new(simulation: Simulation, space: ParameterSpace, observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(Error::EmptyProblem("observations".to_string()));
        }
        for observation in &observations {
            let target = &observation.target;
            if !(target.fresh_weight > 0.0 && target.anthocyanin_ppm > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "targets for '{}' must be positive: {:?}",
                    observation.treatment.name, target
                )));
            }
            if !(observation.weight >= 0.0 && observation.weight.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "weight for '{}' must be non-negative, got {}",
                    observation.treatment.name, observation.weight
                )));
            }
            observation.treatment.validate()?;
        }
        if observations.iter().map(|o| o.weight).sum::<f64>() <= 0.0 {
            return Err(Error::InvalidParameter(
                "at least one observation needs a positive weight".to_string(),
            ));
        }
        space.validate_against(simulation.parameters())?;

        Ok(Self {
            simulation,
            space,
            observations,
            weights: ObjectiveWeights::default(),
        })
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Result<Self> {
        weights.validate()?;
        self.weights = weights;
        Ok(self)
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Base parameters with the point applied.
    pub fn parameters_at(&self, x: &[f64]) -> Result<ParameterSet> {
        let overrides = self.space.to_overrides(x)?;
        let parameters = self.simulation.parameters().with_overrides(&overrides)?;
        Ok(parameters)
    }

    fn run_one(simulation: &Simulation, treatment: &Treatment) -> TreatmentOutcome {
        match simulation.run(treatment) {
            Ok(result) => {
                let outputs = result.outputs;
                if outputs.fresh_weight.is_finite() && outputs.anthocyanin_ppm.is_finite() {
                    TreatmentOutcome::Simulated {
                        fresh_weight: outputs.fresh_weight,
                        anthocyanin_ppm: outputs.anthocyanin_ppm,
                        stress: outputs.stress,
                    }
                } else {
                    TreatmentOutcome::Failed {
                        reason: format!("non-finite output: {:?}", outputs),
                    }
                }
            }
            Err(e) => TreatmentOutcome::Failed { reason: e.to_string() },
        }
    }

    /// Simulate every observation at `x`.
    ///
    /// If the parameters themselves are rejected every treatment is reported
    /// as failed with the same reason.
    pub fn outcomes(&self, x: &[f64]) -> Vec<TreatmentOutcome> {
        let simulation = match self.parameters_at(x) {
            Ok(parameters) => self.simulation.clone().with_parameters(parameters),
            Err(e) => {
                let reason = e.to_string();
                return self
                    .observations
                    .iter()
                    .map(|_| TreatmentOutcome::Failed { reason: reason.clone() })
                    .collect();
            }
        };

        self.observations
            .par_iter()
            .map(|o| Self::run_one(&simulation, &o.treatment))
            .collect()
    }

    fn treatment_error(&self, observation: &Observation, outcome: &TreatmentOutcome) -> f64 {
        match outcome {
            TreatmentOutcome::Simulated {
                fresh_weight,
                anthocyanin_ppm,
                ..
            } => self
                .weights
                .treatment_error(*fresh_weight, *anthocyanin_ppm, &observation.target),
            TreatmentOutcome::Failed { reason } => {
                warn!(
                    treatment = %observation.treatment.name,
                    reason = %reason,
                    "Treatment failed; applying penalty"
                );
                self.weights.failure_penalty
            }
        }
    }

    fn weighted_mean(&self, errors: &[f64]) -> f64 {
        let (total, weight) = self
            .observations
            .iter()
            .zip(errors)
            .fold((0.0, 0.0), |(total, weight), (o, e)| (total + o.weight * e, weight + o.weight));
        total / weight
    }

    /// Full per-treatment comparison at `x`.
    pub fn report(&self, x: &[f64]) -> Result<CalibrationReport> {
        let parameters = self.space.to_overrides(x)?;
        let outcomes = self.outcomes(x);
        let treatments: Vec<TreatmentReport> = self
            .observations
            .iter()
            .zip(outcomes)
            .map(|(observation, outcome)| TreatmentReport {
                name: observation.treatment.name.clone(),
                weight: observation.weight,
                target: observation.target,
                error: self.treatment_error(observation, &outcome),
                outcome,
            })
            .collect();
        let errors: Vec<f64> = treatments.iter().map(|t| t.error).collect();

        Ok(CalibrationReport {
            parameters,
            objective: self.weighted_mean(&errors),
            treatments,
        })
    }
}

impl Objective for CalibrationProblem {
    fn dimension(&self) -> usize {
        self.space.len()
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        let outcomes = self.outcomes(x);
        let errors: Vec<f64> = self
            .observations
            .iter()
            .zip(&outcomes)
            .map(|(o, outcome)| self.treatment_error(o, outcome))
            .collect();
        let value = self.weighted_mean(&errors);
        debug!(x = ?x, value, "Evaluated calibration objective");
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use luva_model::catalogue;

    fn target() -> ReferenceTarget {
        ReferenceTarget {
            fresh_weight: 80.0,
            anthocyanin_ppm: 400.0,
        }
    }

    #[test]
    fn test_treatment_error() {
        let weights = ObjectiveWeights::default();
        assert_eq!(weights.treatment_error(80.0, 400.0, &target()), 0.0);
        // 10% high in both
        assert_relative_eq!(weights.treatment_error(88.0, 440.0, &target()), 0.01, max_relative = 1e-12);
        // anthocyanin error dominates
        assert!(weights.treatment_error(80.0, 440.0, &target()) > weights.treatment_error(88.0, 400.0, &target()));
    }

    #[test]
    fn test_weights_validation() {
        let bad = ObjectiveWeights {
            fresh_weight: 0.0,
            anthocyanin: 0.0,
            ..ObjectiveWeights::default()
        };
        assert!(bad.validate().is_err());
        assert!(ObjectiveWeights::default().validate().is_ok());
    }

    #[test]
    fn test_problem_requires_observations() {
        let result = CalibrationProblem::new(Simulation::default(), ParameterSpace::new(), vec![]);
        assert!(matches!(result, Err(Error::EmptyProblem(_))));
    }

    #[test]
    fn test_problem_rejects_unknown_coefficients() {
        let space = ParameterSpace::new().add("not_a_parameter", 0.0, 1.0).unwrap();
        let observations = vec![catalogue::find("CK").unwrap().into()];
        let result = CalibrationProblem::new(Simulation::default(), space, observations);
        assert!(matches!(result, Err(Error::Model(_))));
    }

    #[test]
    fn test_problem_rejects_zero_targets() {
        let observation = Observation::new(
            Treatment::control("CK"),
            ReferenceTarget {
                fresh_weight: 0.0,
                anthocyanin_ppm: 400.0,
            },
        );
        let result = CalibrationProblem::new(Simulation::default(), ParameterSpace::new(), vec![observation]);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_fn_objective_batch_preserves_order() {
        let objective = FnObjective::new(1, |x: &[f64]| x[0] * 2.0);
        let points: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64]).collect();
        let values = objective.evaluate_batch(&points);
        assert_eq!(values, (0..100).map(|i| i as f64 * 2.0).collect::<Vec<_>>());
    }
}
