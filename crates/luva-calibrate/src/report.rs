//! Per-treatment comparison of simulated and observed values

use indexmap::IndexMap;
use luva_model::catalogue::ReferenceTarget;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a single treatment run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TreatmentOutcome {
    Simulated {
        /// g/plant
        fresh_weight: f64,
        anthocyanin_ppm: f64,
        stress: f64,
    },
    /// The run failed or produced non-finite output
    Failed { reason: String },
}

impl TreatmentOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TreatmentOutcome::Failed { .. })
    }
}

/// Signed percentage error of `simulated` relative to `observed`.
pub fn percent_error(simulated: f64, observed: f64) -> f64 {
    100.0 * (simulated - observed) / observed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentReport {
    pub name: String,
    pub weight: f64,
    pub target: ReferenceTarget,
    pub outcome: TreatmentOutcome,
    /// Weighted squared relative error, or the failure penalty
    pub error: f64,
}

impl TreatmentReport {
    pub fn fresh_weight_error_pct(&self) -> Option<f64> {
        match self.outcome {
            TreatmentOutcome::Simulated { fresh_weight, .. } => {
                Some(percent_error(fresh_weight, self.target.fresh_weight))
            }
            TreatmentOutcome::Failed { .. } => None,
        }
    }

    pub fn anthocyanin_error_pct(&self) -> Option<f64> {
        match self.outcome {
            TreatmentOutcome::Simulated { anthocyanin_ppm, .. } => {
                Some(percent_error(anthocyanin_ppm, self.target.anthocyanin_ppm))
            }
            TreatmentOutcome::Failed { .. } => None,
        }
    }
}

/// Result of evaluating one parameter vector against every observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Coefficients that were overridden for this evaluation
    pub parameters: IndexMap<String, f64>,
    pub objective: f64,
    pub treatments: Vec<TreatmentReport>,
}

fn mean_absolute(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v.abs(), n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl CalibrationReport {
    pub fn failures(&self) -> impl Iterator<Item = &TreatmentReport> {
        self.treatments.iter().filter(|t| t.outcome.is_failed())
    }

    /// Mean absolute percentage error in fresh weight over successful runs.
    pub fn fresh_weight_mape(&self) -> Option<f64> {
        mean_absolute(self.treatments.iter().filter_map(|t| t.fresh_weight_error_pct()))
    }

    /// Mean absolute percentage error in anthocyanin over successful runs.
    pub fn anthocyanin_mape(&self) -> Option<f64> {
        mean_absolute(self.treatments.iter().filter_map(|t| t.anthocyanin_error_pct()))
    }

    pub fn treatment(&self, name: &str) -> Option<&TreatmentReport> {
        self.treatments.iter().find(|t| t.name == name)
    }
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>9} {:>9} {:>8} {:>9} {:>9} {:>8}",
            "Treatment", "FW sim", "FW obs", "FW %", "Anth sim", "Anth obs", "Anth %"
        )?;
        for t in &self.treatments {
            match &t.outcome {
                TreatmentOutcome::Simulated {
                    fresh_weight,
                    anthocyanin_ppm,
                    ..
                } => writeln!(
                    f,
                    "{:<12} {:>9.2} {:>9.2} {:>+8.1} {:>9.1} {:>9.1} {:>+8.1}",
                    t.name,
                    fresh_weight,
                    t.target.fresh_weight,
                    percent_error(*fresh_weight, t.target.fresh_weight),
                    anthocyanin_ppm,
                    t.target.anthocyanin_ppm,
                    percent_error(*anthocyanin_ppm, t.target.anthocyanin_ppm),
                )?,
                TreatmentOutcome::Failed { reason } => {
                    writeln!(f, "{:<12} FAILED: {}", t.name, reason)?
                }
            }
        }
        let fmt_mape = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v));
        writeln!(
            f,
            "{:<12} {:>9} {:>9} {:>8} {:>9} {:>9} {:>8}",
            "MAPE",
            "",
            "",
            fmt_mape(self.fresh_weight_mape()),
            "",
            "",
            fmt_mape(self.anthocyanin_mape())
        )?;
        write!(f, "Objective: {:.6e}", self.objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn report() -> CalibrationReport {
        CalibrationReport {
            parameters: IndexMap::from([("damage_coefficient".to_string(), 7e-7)]),
            objective: 0.01,
            treatments: vec![
                TreatmentReport {
                    name: "CK".to_string(),
                    weight: 1.0,
                    target: ReferenceTarget {
                        fresh_weight: 80.0,
                        anthocyanin_ppm: 400.0,
                    },
                    outcome: TreatmentOutcome::Simulated {
                        fresh_weight: 88.0,
                        anthocyanin_ppm: 380.0,
                        stress: 0.0,
                    },
                    error: 0.0,
                },
                TreatmentReport {
                    name: "H12D3".to_string(),
                    weight: 1.0,
                    target: ReferenceTarget {
                        fresh_weight: 60.0,
                        anthocyanin_ppm: 650.0,
                    },
                    outcome: TreatmentOutcome::Failed {
                        reason: "solver stopped".to_string(),
                    },
                    error: 1e6,
                },
            ],
        }
    }

    #[test]
    fn test_percent_errors() {
        let report = report();
        let ck = report.treatment("CK").unwrap();
        assert_relative_eq!(ck.fresh_weight_error_pct().unwrap(), 10.0);
        assert_relative_eq!(ck.anthocyanin_error_pct().unwrap(), -5.0);
        assert_eq!(report.treatment("H12D3").unwrap().fresh_weight_error_pct(), None);
    }

    #[test]
    fn test_mape_skips_failures() {
        let report = report();
        assert_relative_eq!(report.fresh_weight_mape().unwrap(), 10.0);
        assert_relative_eq!(report.anthocyanin_mape().unwrap(), 5.0);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_display() {
        let text = report().to_string();
        assert!(text.starts_with("Treatment"));
        assert!(text.contains("+10.0"));
        assert!(text.contains("H12D3        FAILED: solver stopped"));
        assert!(text.contains("Objective: 1.000000e-2"));
    }

    #[test]
    fn test_serialises_outcome_status() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["treatments"][0]["outcome"]["status"], "simulated");
        assert_eq!(json["treatments"][1]["outcome"]["status"], "failed");
        assert_eq!(json["parameters"]["damage_coefficient"], 7e-7);
    }
}
