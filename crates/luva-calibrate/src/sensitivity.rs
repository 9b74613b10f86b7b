//! One-at-a-time sensitivity analysis
//!
//! Each coefficient is scaled up and down by a fixed fraction while all
//! others keep their base values. The normalised index for an output `Y` is
//!
//! $$S = \frac{\Delta Y / Y}{\Delta P / P}$$

use crate::{Error, Result};
use indexmap::IndexMap;
use luva_model::simulation::{Simulation, SimulationResult};
use luva_model::treatment::Treatment;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn sign(&self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }
}

/// Response of one treatment to one perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub parameter: String,
    pub treatment: String,
    pub direction: Direction,
    pub base_value: f64,
    pub perturbed_value: f64,
    pub delta_fresh_weight: f64,
    pub delta_anthocyanin_ppm: f64,
    pub fresh_weight_index: f64,
    pub anthocyanin_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub fraction: f64,
    pub entries: Vec<SensitivityEntry>,
    /// Perturbations whose run failed, with the reason
    pub failures: Vec<String>,
}

impl SensitivityReport {
    /// Largest absolute index of each coefficient over treatments, directions
    /// and outputs, most influential first.
    pub fn ranking(&self) -> Vec<(String, f64)> {
        let mut largest: IndexMap<String, f64> = IndexMap::new();
        for entry in &self.entries {
            let index = entry.fresh_weight_index.abs().max(entry.anthocyanin_index.abs());
            let slot = largest.entry(entry.parameter.clone()).or_insert(0.0);
            *slot = slot.max(index);
        }
        let mut ranking: Vec<(String, f64)> = largest.into_iter().collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }

    pub fn entries_for<'a>(&'a self, parameter: &'a str) -> impl Iterator<Item = &'a SensitivityEntry> + 'a {
        self.entries.iter().filter(move |e| e.parameter == parameter)
    }
}

impl fmt::Display for SensitivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<32} {:<12} {:>5} {:>10} {:>10}",
            "Parameter", "Treatment", "Dir", "S(FW)", "S(Anth)"
        )?;
        for e in &self.entries {
            let direction = match e.direction {
                Direction::Up => "+",
                Direction::Down => "-",
            };
            writeln!(
                f,
                "{:<32} {:<12} {:>5} {:>10.3} {:>10.3}",
                e.parameter, e.treatment, direction, e.fresh_weight_index, e.anthocyanin_index
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "FAILED: {}", failure)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityAnalysis {
    /// Relative perturbation applied in each direction
    /// default: 0.30
    pub fraction: f64,
}

impl Default for SensitivityAnalysis {
    fn default() -> Self {
        Self { fraction: 0.30 }
    }
}

impl SensitivityAnalysis {
    pub fn new(fraction: f64) -> Self {
        Self { fraction }
    }

    fn perturbed_run(
        &self,
        simulation: &Simulation,
        treatment: &Treatment,
        parameter: &str,
        value: f64,
    ) -> Result<SimulationResult> {
        let overrides = IndexMap::from([(parameter.to_string(), value)]);
        let parameters = simulation.parameters().with_overrides(&overrides)?;
        Ok(simulation.clone().with_parameters(parameters).run(treatment)?)
    }

    /// Perturb each of `parameters` around the simulation's base values.
    ///
    /// Base runs must succeed. A failed perturbed run is recorded in
    /// [`SensitivityReport::failures`] and skipped.
    pub fn run(
        &self,
        simulation: &Simulation,
        treatments: &[Treatment],
        parameters: &[String],
    ) -> Result<SensitivityReport> {
        if !(self.fraction > 0.0 && self.fraction < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "fraction must be in (0, 1), got {}",
                self.fraction
            )));
        }
        if treatments.is_empty() {
            return Err(Error::EmptyProblem("treatments".to_string()));
        }
        if parameters.is_empty() {
            return Err(Error::EmptyProblem("parameters to perturb".to_string()));
        }

        let mut base_values = Vec::with_capacity(parameters.len());
        for name in parameters {
            let value = simulation.parameters().get(name)?;
            if value == 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "'{}' is zero so a relative perturbation is undefined",
                    name
                )));
            }
            base_values.push(value);
        }

        let base: Vec<SimulationResult> = treatments
            .par_iter()
            .map(|t| simulation.run(t))
            .collect::<std::result::Result<_, _>>()?;

        let jobs: Vec<(usize, Direction, usize)> = (0..parameters.len())
            .flat_map(|p| {
                [Direction::Up, Direction::Down]
                    .into_iter()
                    .flat_map(move |d| (0..treatments.len()).map(move |t| (p, d, t)))
            })
            .collect();

        let outcomes: Vec<std::result::Result<SensitivityEntry, String>> = jobs
            .par_iter()
            .map(|&(p, direction, t)| -> std::result::Result<SensitivityEntry, String> {
                let name = &parameters[p];
                let treatment = &treatments[t];
                let value = base_values[p] * (1.0 + direction.sign() * self.fraction);
                let result = self
                    .perturbed_run(simulation, treatment, name, value)
                    .map_err(|e| format!("{} {:?} on {}: {}", name, direction, treatment.name, e))?;

                let reference = &base[t].outputs;
                let delta_fresh_weight = result.outputs.fresh_weight - reference.fresh_weight;
                let delta_anthocyanin_ppm = result.outputs.anthocyanin_ppm - reference.anthocyanin_ppm;
                let relative_change = direction.sign() * self.fraction;
                Ok(SensitivityEntry {
                    parameter: name.clone(),
                    treatment: treatment.name.clone(),
                    direction,
                    base_value: base_values[p],
                    perturbed_value: value,
                    delta_fresh_weight,
                    delta_anthocyanin_ppm,
                    fresh_weight_index: delta_fresh_weight / reference.fresh_weight / relative_change,
                    anthocyanin_index: delta_anthocyanin_ppm / reference.anthocyanin_ppm / relative_change,
                })
            })
            .collect();

        let mut entries = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    warn!(reason = %reason, "Perturbed run failed");
                    failures.push(reason);
                }
            }
        }
        info!(
            parameters = parameters.len(),
            treatments = treatments.len(),
            failures = failures.len(),
            "Sensitivity analysis complete"
        );

        Ok(SensitivityReport {
            fraction: self.fraction,
            entries,
            failures,
        })
    }
}
