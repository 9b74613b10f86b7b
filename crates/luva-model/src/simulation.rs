//! Running the model for a treatment
//!
//! A [`Simulation`] holds everything that stays fixed across treatments:
//! environment baseline, simulation window, solver options and parameters.
//! Each call to [`Simulation::run`] builds a fresh model and state vector, so
//! runs share nothing and can execute concurrently.

use crate::environment::Environment;
use crate::growth::{CarbonState, GrowthDrivers, GrowthModel, SunGrowthModel};
use crate::model::{clamp_state, ModelState, PlantState, UvaModel, ANTHOCYANIN, DRY_MASS, ROS, STRESS};
use crate::modulation::GrowthModulation;
use crate::parameters::ParameterSet;
use crate::treatment::Treatment;
use luva_core::errors::{LuvaError, LuvaResult};
use luva_core::ivp::{IVPBuilder, SolverOptions, SolverStats, IVP};
use luva_core::units::{GRAMS_PER_KG, PPM, SECONDS_PER_DAY};
use luva_core::{FloatValue, Time};
use ndarray::{Array1, Array2};
use ode_solvers::Vector3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Growth period and seedling size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationWindow {
    /// Day after sowing on which simulation starts
    /// default: 14
    pub transplant_day: u32,

    /// Length of the simulated growth period
    /// unit: days
    /// default: 21
    pub duration_days: u32,

    /// Seedling fresh weight at transplant
    /// unit: g/plant
    /// default: 10
    pub initial_fresh_weight: FloatValue,

    /// Initial carbon buffer as a fraction of dry mass
    /// default: 0.1
    pub initial_buffer_fraction: FloatValue,

    /// Leaf area index per gram of plant dry mass at transplant
    /// default: 4.0
    pub initial_lai_per_dry_gram: FloatValue,
}

impl Default for SimulationWindow {
    fn default() -> Self {
        Self {
            transplant_day: 14,
            duration_days: 21,
            initial_fresh_weight: 10.0,
            initial_buffer_fraction: 0.1,
            initial_lai_per_dry_gram: 4.0,
        }
    }
}

impl SimulationWindow {
    pub fn t_start(&self) -> Time {
        self.transplant_day as FloatValue * SECONDS_PER_DAY
    }

    pub fn t_end(&self) -> Time {
        (self.transplant_day + self.duration_days) as FloatValue * SECONDS_PER_DAY
    }
}

/// Per-plant quantities derived from a state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    /// g/plant
    pub fresh_weight: FloatValue,
    /// g/plant
    pub dry_weight: FloatValue,
    /// Anthocyanin per fresh weight (ppm)
    pub anthocyanin_ppm: FloatValue,
    pub dw_fw_ratio: FloatValue,
    pub stress: FloatValue,
    pub ros: FloatValue,
}

/// Sampled time series of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Seconds since sowing
    pub times: Array1<FloatValue>,
    /// One row per time, columns in state vector order
    pub states: Array2<FloatValue>,
    /// g/plant
    pub fresh_weight: Array1<FloatValue>,
    pub anthocyanin_ppm: Array1<FloatValue>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Linearly interpolate onto a uniform grid with spacing `interval`.
    ///
    /// The grid starts at the first time and always includes the last.
    pub fn resample(&self, interval: Time) -> LuvaResult<Self> {
        if !(interval > 0.0) {
            return Err(LuvaError::Error(format!(
                "resample interval must be positive, got {}",
                interval
            )));
        }
        if self.times.is_empty() {
            return Ok(self.clone());
        }
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];

        let n = ((last - first) / interval).floor() as usize;
        let mut grid: Vec<Time> = (0..=n).map(|i| first + i as FloatValue * interval).collect();
        if grid.last().is_some_and(|t| *t < last) {
            grid.push(last);
        }

        let columns = self.states.ncols();
        let mut states = Array2::zeros((grid.len(), columns));
        let mut fresh_weight = Array1::zeros(grid.len());
        let mut anthocyanin_ppm = Array1::zeros(grid.len());
        let mut j = 0;
        for (i, &t) in grid.iter().enumerate() {
            while j + 1 < self.times.len() - 1 && self.times[j + 1] < t {
                j += 1;
            }
            let (t0, t1) = (self.times[j], self.times[(j + 1).min(self.times.len() - 1)]);
            let w = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
            let k = (j + 1).min(self.times.len() - 1);
            let lerp = |a: FloatValue, b: FloatValue| a + w * (b - a);
            for c in 0..columns {
                states[[i, c]] = lerp(self.states[[j, c]], self.states[[k, c]]);
            }
            fresh_weight[i] = lerp(self.fresh_weight[j], self.fresh_weight[k]);
            anthocyanin_ppm[i] = lerp(self.anthocyanin_ppm[j], self.anthocyanin_ppm[k]);
        }

        Ok(Self {
            times: Array1::from(grid),
            states,
            fresh_weight,
            anthocyanin_ppm,
        })
    }
}

/// How much of the solution a run keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Recording {
    /// Final state only
    #[default]
    FinalState,
    /// Every accepted solver step
    Steps,
    /// Interpolated onto a uniform grid with this interval (s)
    Sampled(Time),
}

/// Result of simulating one treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub treatment: String,
    pub final_state: PlantState,
    pub outputs: Outputs,
    pub stats: SolverStats,
    pub trajectory: Option<Trajectory>,
}

impl SimulationResult {
    pub fn fresh_weight(&self) -> FloatValue {
        self.outputs.fresh_weight
    }

    pub fn anthocyanin_ppm(&self) -> FloatValue {
        self.outputs.anthocyanin_ppm
    }

    pub fn stress(&self) -> FloatValue {
        self.outputs.stress
    }
}

/// Result of the unstressed growth-only model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineResult {
    pub dry_mass: FloatValue,
    pub buffer: FloatValue,
    pub lai: FloatValue,
    /// g/plant at the baseline dry matter content
    pub fresh_weight: FloatValue,
}

/// Growth-only IVP over `[X_d, C_buf, LAI]`.
struct BaselineGrowth {
    environment: Environment,
    growth: SunGrowthModel,
}

impl IVP<Time, Vector3<FloatValue>> for BaselineGrowth {
    fn calculate_dy_dt(&self, t: Time, y: &Vector3<FloatValue>, dy_dt: &mut Vector3<FloatValue>) {
        let climate = self.environment.climate(t);
        let rates = self.growth.rates(
            &CarbonState {
                dry_mass: y[0],
                buffer: y[1],
                lai: y[2],
            },
            &GrowthDrivers {
                irradiance: climate.par,
                temperature: climate.temperature,
                co2: climate.co2,
                humidity: climate.humidity,
                plant_density: self.environment.plant_density,
            },
        );
        *dy_dt = Vector3::new(rates.dry_mass, rates.buffer, rates.lai);
    }
}

/// Runs treatments against a fixed environment and parameter set.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    environment: Environment,
    window: SimulationWindow,
    solver_options: SolverOptions,
    parameters: ParameterSet,
}

impl Simulation {
    pub fn new(parameters: ParameterSet) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_window(mut self, window: SimulationWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_solver_options(mut self, solver_options: SolverOptions) -> Self {
        self.solver_options = solver_options;
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn window(&self) -> &SimulationWindow {
        &self.window
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// State at transplant, derived from the seedling fresh weight.
    pub fn initial_state(&self) -> PlantState {
        let density = self.environment.plant_density;
        let fresh_weight = self.window.initial_fresh_weight;
        let dry_weight = fresh_weight * self.parameters.ldmc.dw_fw_ratio_base;
        let dry_mass = dry_weight / GRAMS_PER_KG * density;
        let canopy_fresh_weight = fresh_weight * density / GRAMS_PER_KG;
        PlantState {
            dry_mass,
            buffer: self.window.initial_buffer_fraction * dry_mass,
            lai: dry_weight * self.window.initial_lai_per_dry_gram,
            anthocyanin: self.parameters.pigment.initial_concentration * canopy_fresh_weight / PPM,
            stress: 0.0,
            ros: 0.0,
        }
    }

    fn check_inputs(&self, treatment: &Treatment) -> LuvaResult<()> {
        self.parameters.validate()?;
        if !(self.environment.plant_density > 0.0) {
            return Err(LuvaError::InvalidParameter(format!(
                "plant_density must be positive, got {}",
                self.environment.plant_density
            )));
        }
        if self.window.duration_days == 0 {
            return Err(LuvaError::InvalidParameter(
                "duration_days must be at least 1".to_string(),
            ));
        }
        treatment.validate_values()?;
        if treatment.intensity > 0.0 {
            if let Some(reason) = treatment.window_issue() {
                warn!(
                    treatment = %treatment.name,
                    reason = %reason,
                    "Treatment window never opens; simulating without UV-A"
                );
            }
        }
        Ok(())
    }

    /// Per-plant outputs for a state.
    pub fn outputs(&self, state: &ModelState) -> Outputs {
        let y = clamp_state(state);
        let density = self.environment.plant_density;
        let stress = y[STRESS];
        let ratio = GrowthModulation::new(self.parameters.stress.clone(), self.parameters.ldmc.clone())
            .dw_fw_ratio(stress);
        let dry_weight = y[DRY_MASS] / density * GRAMS_PER_KG;
        let fresh_weight = dry_weight / ratio;
        let canopy_fresh_weight = fresh_weight * density / GRAMS_PER_KG;
        Outputs {
            fresh_weight,
            dry_weight,
            anthocyanin_ppm: y[ANTHOCYANIN] / canopy_fresh_weight * PPM,
            dw_fw_ratio: ratio,
            stress,
            ros: y[ROS],
        }
    }

    /// Simulate a treatment over the whole window and report the final state.
    pub fn run(&self, treatment: &Treatment) -> LuvaResult<SimulationResult> {
        self.run_from(
            treatment,
            self.window.t_start(),
            self.initial_state(),
            Recording::FinalState,
        )
    }

    /// Simulate a treatment and keep the trajectory.
    ///
    /// Trajectory states are clamped to the physical domain. With
    /// `sample_interval` the trajectory is interpolated onto a uniform grid;
    /// otherwise every accepted solver step is kept.
    pub fn run_with_trajectory(
        &self,
        treatment: &Treatment,
        sample_interval: Option<Time>,
    ) -> LuvaResult<SimulationResult> {
        let recording = match sample_interval {
            Some(interval) => Recording::Sampled(interval),
            None => Recording::Steps,
        };
        self.run_from(treatment, self.window.t_start(), self.initial_state(), recording)
    }

    /// Simulate from an arbitrary state and start time up to the window end.
    pub fn run_from(
        &self,
        treatment: &Treatment,
        t_start: Time,
        initial: PlantState,
        recording: Recording,
    ) -> LuvaResult<SimulationResult> {
        self.check_inputs(treatment)?;
        if !initial.is_non_negative() {
            return Err(LuvaError::InvalidState(format!(
                "initial state must be non-negative: {:?}",
                initial
            )));
        }
        let t_end = self.window.t_end();

        let model = UvaModel::new(self.environment.clone(), treatment.clone(), &self.parameters);
        let solution =
            IVPBuilder::new(Arc::new(model), ModelState::from(initial)).solve(t_start, t_end, &self.solver_options)?;
        let last = solution.last_step(t_end)?;
        let final_state = clamp_state(last);

        let trajectory = match recording {
            Recording::FinalState => None,
            Recording::Steps | Recording::Sampled(_) => {
                let n = solution.times.len();
                let mut states = Array2::zeros((n, 6));
                let mut fresh_weight = Array1::zeros(n);
                let mut anthocyanin_ppm = Array1::zeros(n);
                for (i, y) in solution.states.iter().enumerate() {
                    let y = clamp_state(y);
                    let outputs = self.outputs(&y);
                    for c in 0..6 {
                        states[[i, c]] = y[c];
                    }
                    fresh_weight[i] = outputs.fresh_weight;
                    anthocyanin_ppm[i] = outputs.anthocyanin_ppm;
                }
                let full = Trajectory {
                    times: Array1::from(solution.times.clone()),
                    states,
                    fresh_weight,
                    anthocyanin_ppm,
                };
                Some(match recording {
                    Recording::Sampled(interval) => full.resample(interval)?,
                    _ => full,
                })
            }
        };

        Ok(SimulationResult {
            treatment: treatment.name.clone(),
            final_state: PlantState::from(&final_state),
            outputs: self.outputs(&final_state),
            stats: solution.stats,
            trajectory,
        })
    }

    /// Simulate the growth-only model with no Stress, pigment or UV-A.
    pub fn run_baseline(&self) -> LuvaResult<BaselineResult> {
        self.parameters.validate()?;
        let initial = self.initial_state();
        let system = BaselineGrowth {
            environment: self.environment.clone(),
            growth: SunGrowthModel::from_parameters(self.parameters.growth.clone()),
        };
        let t_end = self.window.t_end();
        let solution = IVPBuilder::new(
            Arc::new(system),
            Vector3::new(initial.dry_mass, initial.buffer, initial.lai),
        )
        .solve(self.window.t_start(), t_end, &self.solver_options)?;
        let last = solution.last_step(t_end)?;

        let dry_mass = last[0].max(0.0);
        Ok(BaselineResult {
            dry_mass,
            buffer: last[1].max(0.0),
            lai: last[2].max(0.0),
            fresh_weight: dry_mass / self.environment.plant_density * GRAMS_PER_KG
                / self.parameters.ldmc.dw_fw_ratio_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_state() {
        let state = Simulation::default().initial_state();
        // 10 g at 5% dry matter, 36 plants/m²
        assert_relative_eq!(state.dry_mass, 0.018, max_relative = 1e-12);
        assert_relative_eq!(state.buffer, 0.0018, max_relative = 1e-12);
        assert_relative_eq!(state.lai, 2.0, max_relative = 1e-12);
        assert_relative_eq!(state.anthocyanin, 5.0 * 0.36 / 1e6, max_relative = 1e-12);
        assert_eq!(state.stress, 0.0);
    }

    #[test]
    fn test_initial_outputs_recover_seedling() {
        let sim = Simulation::default();
        let outputs = sim.outputs(&ModelState::from(sim.initial_state()));
        assert_relative_eq!(outputs.fresh_weight, 10.0, max_relative = 1e-12);
        assert_relative_eq!(outputs.dry_weight, 0.5, max_relative = 1e-12);
        assert_relative_eq!(outputs.anthocyanin_ppm, 5.0, max_relative = 1e-12);
    }

    #[test]
    fn test_window_times() {
        let window = SimulationWindow::default();
        assert_eq!(window.t_start(), 14.0 * 86400.0);
        assert_eq!(window.t_end(), 35.0 * 86400.0);
    }

    #[test]
    fn test_negative_initial_state_is_rejected() {
        let sim = Simulation::default();
        let mut initial = sim.initial_state();
        initial.buffer = -1.0;
        let result = sim.run_from(&Treatment::control("CK"), sim.window().t_start(), initial, Recording::FinalState);
        assert!(matches!(result, Err(LuvaError::InvalidState(_))));
    }

    #[test]
    fn test_recording_controls_trajectory() {
        let sim = Simulation::default().with_window(SimulationWindow {
            duration_days: 2,
            ..SimulationWindow::default()
        });
        let control = Treatment::control("CK");
        let t_start = sim.window().t_start();
        let initial = sim.initial_state();

        let final_only = sim.run_from(&control, t_start, initial, Recording::FinalState).unwrap();
        assert!(final_only.trajectory.is_none());

        let steps = sim.run_from(&control, t_start, initial, Recording::Steps).unwrap();
        assert!(steps.trajectory.as_ref().unwrap().len() > 3);

        let hourly = sim
            .run_from(&control, t_start, initial, Recording::Sampled(3600.0))
            .unwrap();
        let trajectory = hourly.trajectory.unwrap();
        assert_eq!(trajectory.len(), 49);
        assert_eq!(trajectory.times[0], t_start);
        assert_eq!(final_only.final_state, hourly.final_state);
    }

    #[test]
    fn test_invalid_treatment_values_are_rejected() {
        let sim = Simulation::default();
        let treatment = Treatment::new("bad", f64::NAN, 29, 35, 10.0, 16.0);
        assert!(matches!(sim.run(&treatment), Err(LuvaError::InvalidTreatment { .. })));
    }

    #[test]
    fn test_resample() {
        let trajectory = Trajectory {
            times: Array1::from(vec![0.0, 10.0, 25.0]),
            states: Array2::from_shape_fn((3, 6), |(i, _)| i as FloatValue),
            fresh_weight: Array1::from(vec![1.0, 2.0, 3.0]),
            anthocyanin_ppm: Array1::from(vec![0.0, 10.0, 40.0]),
        };
        let resampled = trajectory.resample(5.0).unwrap();
        assert_eq!(resampled.times.to_vec(), vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0]);
        assert_relative_eq!(resampled.fresh_weight[1], 1.5);
        assert_relative_eq!(resampled.anthocyanin_ppm[3], 20.0);
        assert_relative_eq!(resampled.states[[5, 0]], 2.0);
        assert!(trajectory.resample(0.0).is_err());
    }
}
