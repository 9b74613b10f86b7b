//! Search over daily UV-A schedules that end at harvest
//!
//! Every schedule applies `hours` of UV-A per day for the last `days` days
//! before harvest, which is the end of the simulation window. Each schedule
//! is compared with an untreated control. Total anthocyanin is the
//! concentration times fresh weight, so a schedule that raises concentration
//! by shrinking the plant scores lower than one that keeps it growing.
//!
//! A schedule is *safe* when it loses no more than
//! [`ScheduleSearch::max_fresh_weight_loss`] percent of control fresh weight.

use crate::{Error, Result};
use luva_core::units::HOURS_PER_DAY;
use luva_model::simulation::Simulation;
use luva_model::treatment::Treatment;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Fresh weight and anthocyanin concentration of the untreated control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlOutcome {
    /// g/plant
    pub fresh_weight: f64,
    /// ppm of fresh weight
    pub anthocyanin_ppm: f64,
}

impl ControlOutcome {
    /// µg/plant
    pub fn total_anthocyanin(&self) -> f64 {
        self.anthocyanin_ppm * self.fresh_weight
    }
}

/// Simulated outcome of one schedule relative to the control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub hours_per_day: u32,
    pub days: u32,
    pub treatment: Treatment,
    /// g/plant
    pub fresh_weight: f64,
    /// ppm of fresh weight
    pub anthocyanin_ppm: f64,
    /// Percent change in fresh weight
    pub fresh_weight_change: f64,
    /// Percent change in anthocyanin concentration
    pub anthocyanin_change: f64,
    /// Percent change in anthocyanin per plant
    pub total_anthocyanin_change: f64,
}

impl ScheduleOutcome {
    fn new(
        hours_per_day: u32,
        days: u32,
        treatment: Treatment,
        fresh_weight: f64,
        anthocyanin_ppm: f64,
        control: &ControlOutcome,
    ) -> Self {
        let percent = |value: f64, reference: f64| (value - reference) / reference * 100.0;
        Self {
            hours_per_day,
            days,
            treatment,
            fresh_weight,
            anthocyanin_ppm,
            fresh_weight_change: percent(fresh_weight, control.fresh_weight),
            anthocyanin_change: percent(anthocyanin_ppm, control.anthocyanin_ppm),
            total_anthocyanin_change: percent(anthocyanin_ppm * fresh_weight, control.total_anthocyanin()),
        }
    }

    /// µg/plant
    pub fn total_anthocyanin(&self) -> f64 {
        self.anthocyanin_ppm * self.fresh_weight
    }

    pub fn total_hours(&self) -> u32 {
        self.hours_per_day * self.days
    }

    /// Whether fresh weight stays within `max_loss` percent of the control.
    pub fn is_safe(&self, max_loss: f64) -> bool {
        self.fresh_weight_change >= -max_loss
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub harvest_day: u32,
    pub max_fresh_weight_loss: f64,
    pub control: ControlOutcome,
    pub outcomes: Vec<ScheduleOutcome>,
    /// Schedules whose run failed, with the reason
    pub failures: Vec<String>,
}

fn best_by<'a>(
    outcomes: impl Iterator<Item = &'a ScheduleOutcome>,
    key: impl Fn(&ScheduleOutcome) -> f64,
) -> Option<&'a ScheduleOutcome> {
    // first schedule wins ties
    outcomes.fold(None, |best, o| match best {
        Some(b) if key(b) >= key(o) => Some(b),
        _ => Some(o),
    })
}

impl ScheduleReport {
    /// Schedule with the largest gain in anthocyanin per plant.
    pub fn best_total(&self) -> Option<&ScheduleOutcome> {
        best_by(self.outcomes.iter(), |o| o.total_anthocyanin_change)
    }

    /// Largest gain in anthocyanin per plant among safe schedules.
    pub fn best_safe(&self) -> Option<&ScheduleOutcome> {
        best_by(self.safe().into_iter(), |o| o.total_anthocyanin_change)
    }

    /// Schedule with the largest gain in concentration, ignoring fresh weight.
    pub fn best_concentration(&self) -> Option<&ScheduleOutcome> {
        best_by(self.outcomes.iter(), |o| o.anthocyanin_change)
    }

    pub fn safe(&self) -> Vec<&ScheduleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.is_safe(self.max_fresh_weight_loss))
            .collect()
    }

    /// Outcomes ordered by gain in anthocyanin per plant, best first.
    pub fn ranked(&self) -> Vec<&ScheduleOutcome> {
        let mut ranked: Vec<&ScheduleOutcome> = self.outcomes.iter().collect();
        ranked.sort_by(|a, b| b.total_anthocyanin_change.total_cmp(&a.total_anthocyanin_change));
        ranked
    }

    pub fn find(&self, hours_per_day: u32, days: u32) -> Option<&ScheduleOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.hours_per_day == hours_per_day && o.days == days)
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Control: FW = {:.1} g, Anth = {:.1} ppm, Total = {:.0} ug/plant",
            self.control.fresh_weight,
            self.control.anthocyanin_ppm,
            self.control.total_anthocyanin()
        )?;
        writeln!(
            f,
            "{:>5} {:>5} {:>6} {:>8} {:>10} {:>9} {:>9} {:>5}",
            "h/day", "Days", "Start", "FW(g)", "Anth(ppm)", "dFW%", "dTotal%", "Safe"
        )?;
        for o in self.ranked() {
            writeln!(
                f,
                "{:>5} {:>5} {:>6} {:>8.1} {:>10.1} {:>+9.1} {:>+9.1} {:>5}",
                o.hours_per_day,
                o.days,
                o.treatment.start_day,
                o.fresh_weight,
                o.anthocyanin_ppm,
                o.fresh_weight_change,
                o.total_anthocyanin_change,
                if o.is_safe(self.max_fresh_weight_loss) { "yes" } else { "no" }
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "FAILED: {}", failure)?;
        }
        Ok(())
    }
}

/// Grid of UV-A schedules to compare with the control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSearch {
    /// default: 1 to 12
    pub hours_per_day: Vec<u32>,
    /// default: 2 to 12
    pub days: Vec<u32>,
    /// Hour of day at which each session opens. Sessions that run past
    /// midnight wrap.
    /// default: 10
    pub hour_on: f64,
    /// unit: W/m²
    /// default: 11
    pub intensity: f64,
    /// Largest fresh weight loss, in percent of the control, for a safe
    /// schedule
    /// default: 5
    pub max_fresh_weight_loss: f64,
}

impl Default for ScheduleSearch {
    fn default() -> Self {
        Self {
            hours_per_day: (1..=12).collect(),
            days: (2..=12).collect(),
            hour_on: 10.0,
            intensity: 11.0,
            max_fresh_weight_loss: 5.0,
        }
    }
}

impl ScheduleSearch {
    /// Treatment applying `hours` per day for the last `days` days before
    /// `harvest_day`.
    pub fn schedule(&self, hours: u32, days: u32, harvest_day: u32) -> Treatment {
        let hour_off = (self.hour_on + hours as f64) % HOURS_PER_DAY;
        Treatment::new(
            format!("{}h x {}d", hours, days),
            self.intensity,
            harvest_day.saturating_sub(days),
            harvest_day,
            self.hour_on,
            hour_off,
        )
    }

    fn check(&self, simulation: &Simulation) -> Result<u32> {
        if self.hours_per_day.is_empty() || self.days.is_empty() {
            return Err(Error::EmptyProblem("schedules to search".to_string()));
        }
        if let Some(h) = self.hours_per_day.iter().find(|&&h| h == 0 || h >= 24) {
            return Err(Error::InvalidParameter(format!(
                "hours per day must be in [1, 23], got {}",
                h
            )));
        }
        if !(self.intensity > 0.0 && self.intensity.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "intensity must be positive, got {}",
                self.intensity
            )));
        }
        if !(self.max_fresh_weight_loss >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "max_fresh_weight_loss must be non-negative, got {}",
                self.max_fresh_weight_loss
            )));
        }
        let window = simulation.window();
        let harvest_day = window.transplant_day + window.duration_days;
        if let Some(d) = self.days.iter().find(|&&d| d == 0 || d > window.duration_days) {
            return Err(Error::InvalidParameter(format!(
                "days must be in [1, {}] to fit between transplant and harvest, got {}",
                window.duration_days, d
            )));
        }
        Ok(harvest_day)
    }

    /// Simulate the control and every schedule.
    ///
    /// The control must succeed. A failed schedule is recorded in
    /// [`ScheduleReport::failures`] and skipped.
    pub fn run(&self, simulation: &Simulation) -> Result<ScheduleReport> {
        let harvest_day = self.check(simulation)?;
        let treatments: Vec<(u32, u32, Treatment)> = self
            .hours_per_day
            .iter()
            .flat_map(|&h| self.days.iter().map(move |&d| (h, d)))
            .map(|(h, d)| (h, d, self.schedule(h, d, harvest_day)))
            .collect();
        for (_, _, treatment) in &treatments {
            treatment.validate()?;
        }
        info!(schedules = treatments.len(), harvest_day, "Schedule search started");

        let control = simulation.run(&Treatment::control("CK"))?;
        let control = ControlOutcome {
            fresh_weight: control.fresh_weight(),
            anthocyanin_ppm: control.anthocyanin_ppm(),
        };

        let runs: Vec<std::result::Result<ScheduleOutcome, String>> = treatments
            .into_par_iter()
            .map(|(hours, days, treatment)| -> std::result::Result<ScheduleOutcome, String> {
                let result = simulation
                    .run(&treatment)
                    .map_err(|e| format!("{}: {}", treatment.name, e))?;
                Ok(ScheduleOutcome::new(
                    hours,
                    days,
                    treatment,
                    result.fresh_weight(),
                    result.anthocyanin_ppm(),
                    &control,
                ))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(runs.len());
        let mut failures = Vec::new();
        for run in runs {
            match run {
                Ok(outcome) => outcomes.push(outcome),
                Err(reason) => {
                    warn!(reason = %reason, "Schedule run failed");
                    failures.push(reason);
                }
            }
        }

        let report = ScheduleReport {
            harvest_day,
            max_fresh_weight_loss: self.max_fresh_weight_loss,
            control,
            outcomes,
            failures,
        };
        info!(
            evaluated = report.outcomes.len(),
            failures = report.failures.len(),
            safe = report.safe().len(),
            "Schedule search complete"
        );
        Ok(report)
    }
}
