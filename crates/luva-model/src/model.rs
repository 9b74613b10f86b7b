//! Coupled growth, Stress, ROS and pigment model
//!
//! # State vector
//!
//! | index | variable      | unit  |
//! |-------|---------------|-------|
//! | 0     | `X_d`         | kg/m² |
//! | 1     | `C_buf`       | kg/m² |
//! | 2     | `LAI`         | m²/m² |
//! | 3     | `Anth`        | kg/m² |
//! | 4     | `Stress`      | -     |
//! | 5     | `ROS`         | mM    |
//!
//! The state is clamped to its physical domain at the start of every
//! derivative evaluation, so the solver never sees a rate computed from a
//! negative quantity. `ROS` is held at its initial value when the ROS
//! mechanism is disabled.

use crate::environment::{Conditions, Environment, EnvironmentModel};
use crate::growth::{CarbonState, GrowthDrivers, GrowthModel, GrowthRates, SunGrowthModel};
use crate::modulation::GrowthModulation;
use crate::parameters::ParameterSet;
use crate::pigment::{PigmentRates, PigmentSynthesis};
use crate::stress::{StressDynamics, StressInputs, StressRates};
use crate::treatment::Treatment;
use luva_core::ivp::IVP;
use luva_core::{FloatValue, Time};
use ode_solvers::Vector6;
use serde::{Deserialize, Serialize};

pub type ModelState = Vector6<FloatValue>;

pub const DRY_MASS: usize = 0;
pub const BUFFER: usize = 1;
pub const LAI: usize = 2;
pub const ANTHOCYANIN: usize = 3;
pub const STRESS: usize = 4;
pub const ROS: usize = 5;

const MIN_DRY_MASS: FloatValue = 1e-9;
const MIN_LAI: FloatValue = 0.1;

/// Named view of [`ModelState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    pub dry_mass: FloatValue,
    pub buffer: FloatValue,
    pub lai: FloatValue,
    pub anthocyanin: FloatValue,
    pub stress: FloatValue,
    pub ros: FloatValue,
}

impl From<&ModelState> for PlantState {
    fn from(y: &ModelState) -> Self {
        Self {
            dry_mass: y[DRY_MASS],
            buffer: y[BUFFER],
            lai: y[LAI],
            anthocyanin: y[ANTHOCYANIN],
            stress: y[STRESS],
            ros: y[ROS],
        }
    }
}

impl From<PlantState> for ModelState {
    fn from(s: PlantState) -> Self {
        Vector6::new(s.dry_mass, s.buffer, s.lai, s.anthocyanin, s.stress, s.ros)
    }
}

impl PlantState {
    pub fn is_non_negative(&self) -> bool {
        [self.dry_mass, self.buffer, self.lai, self.anthocyanin, self.stress, self.ros]
            .iter()
            .all(|v| *v >= 0.0)
    }
}

/// Clamp a state to the physical domain used by the derivative function.
pub fn clamp_state(y: &ModelState) -> ModelState {
    Vector6::new(
        y[DRY_MASS].max(MIN_DRY_MASS),
        y[BUFFER].max(0.0),
        y[LAI].max(MIN_LAI),
        y[ANTHOCYANIN].max(0.0),
        y[STRESS].max(0.0),
        y[ROS].max(0.0),
    )
}

/// Full breakdown of one derivative evaluation.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub conditions: Conditions,
    pub base_growth: GrowthRates,
    pub growth: GrowthRates,
    pub stress: StressRates,
    pub pigment: PigmentRates,
    pub dw_fw_ratio: FloatValue,
    /// Canopy fresh weight (kg/m²)
    pub fresh_weight: FloatValue,
    pub derivative: ModelState,
}

#[derive(Debug)]
pub struct UvaModel {
    environment: EnvironmentModel,
    growth: SunGrowthModel,
    stress: StressDynamics,
    modulation: GrowthModulation,
    pigment: PigmentSynthesis,
}

impl UvaModel {
    pub fn new(environment: Environment, treatment: Treatment, parameters: &ParameterSet) -> Self {
        let mechanisms = &parameters.mechanisms;
        Self {
            environment: EnvironmentModel::new(environment, treatment),
            growth: SunGrowthModel::from_parameters(parameters.growth.clone()),
            stress: StressDynamics::new(
                parameters.stress.clone(),
                &parameters.intraday,
                parameters.ros.clone(),
                mechanisms,
            ),
            modulation: GrowthModulation::new(parameters.stress.clone(), parameters.ldmc.clone()),
            pigment: PigmentSynthesis::new(parameters.pigment.clone(), mechanisms.pigment_induction),
        }
    }

    pub fn environment_model(&self) -> &EnvironmentModel {
        &self.environment
    }

    pub fn modulation(&self) -> &GrowthModulation {
        &self.modulation
    }

    pub fn pigment(&self) -> &PigmentSynthesis {
        &self.pigment
    }

    fn plant_density(&self) -> FloatValue {
        self.environment.environment().plant_density
    }

    /// Evaluate every term of the right-hand side at `(t, y)`.
    pub fn diagnostics(&self, t: Time, y: &ModelState) -> Diagnostics {
        let y = clamp_state(y);
        let (dry_mass, buffer, lai) = (y[DRY_MASS], y[BUFFER], y[LAI]);
        let (anthocyanin, stress, ros) = (y[ANTHOCYANIN], y[STRESS], y[ROS]);

        let conditions = self.environment.conditions(t);
        let drivers = GrowthDrivers {
            irradiance: conditions.effective_irradiance,
            temperature: conditions.climate.temperature,
            co2: conditions.climate.co2,
            humidity: conditions.climate.humidity,
            plant_density: self.plant_density(),
        };
        let base_growth = self.growth.rates(
            &CarbonState {
                dry_mass,
                buffer,
                lai,
            },
            &drivers,
        );

        let stress_rates = self.stress.rates(&StressInputs {
            exposure: conditions.uva,
            night_uva: conditions.is_night_uva(),
            lai,
            buffer,
            stress,
            ros,
        });

        let growth = self.modulation.apply(base_growth, stress);
        let dw_fw_ratio = self.modulation.dw_fw_ratio(stress);
        let fresh_weight = dry_mass / dw_fw_ratio;
        let pigment = self
            .pigment
            .rates(fresh_weight, stress, anthocyanin, conditions.climate.is_day);

        // Growth rates already carry the buffer limiter; only the costs need it.
        let mut carbon_costs =
            stress_rates.repair * self.stress.repair_carbon_cost() + pigment.carbon_cost;
        let floor = self.growth.buffer_floor();
        if buffer <= floor {
            carbon_costs *= if floor > 0.0 { (buffer / floor).powi(2) } else { 0.0 };
        }
        let d_buffer = growth.buffer - carbon_costs;

        let derivative = Vector6::new(
            growth.dry_mass,
            d_buffer,
            growth.lai,
            pigment.d_anthocyanin,
            stress_rates.d_stress,
            stress_rates.d_ros,
        );

        Diagnostics {
            conditions,
            base_growth,
            growth,
            stress: stress_rates,
            pigment,
            dw_fw_ratio,
            fresh_weight,
            derivative,
        }
    }
}

impl IVP<Time, ModelState> for UvaModel {
    fn calculate_dy_dt(&self, t: Time, y: &ModelState, dy_dt: &mut ModelState) {
        *dy_dt = self.diagnostics(t, y).derivative;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Mechanisms;
    use luva_core::units::{SECONDS_PER_DAY, SECONDS_PER_HOUR};

    fn at(day: FloatValue, hour: FloatValue) -> Time {
        day * SECONDS_PER_DAY + hour * SECONDS_PER_HOUR
    }

    fn state() -> ModelState {
        let dry_mass = 0.02;
        Vector6::new(dry_mass, 0.1 * dry_mass, 2.0, 1e-5, 0.0, 0.0)
    }

    fn model(treatment: Treatment, parameters: &ParameterSet) -> UvaModel {
        UvaModel::new(Environment::default(), treatment, parameters)
    }

    #[test]
    fn test_clamp_state() {
        let clamped = clamp_state(&Vector6::new(-1.0, -1.0, 0.0, -1.0, -1.0, -1.0));
        assert_eq!(clamped, Vector6::new(1e-9, 0.0, 0.1, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_control_has_no_stress_derivative() {
        let parameters = ParameterSet::default();
        let model = model(Treatment::control("CK"), &parameters);
        for hour in [0.0, 6.0, 12.0, 21.9, 22.0, 23.5] {
            let d = model.diagnostics(at(30.0, hour), &state());
            assert_eq!(d.derivative[STRESS], 0.0);
            assert_eq!(d.derivative[ROS], 0.0);
            assert_eq!(d.growth, d.base_growth);
        }
    }

    #[test]
    fn test_uva_drives_stress() {
        let parameters = ParameterSet::default();
        let model = model(Treatment::new("L6D6", 11.0, 29, 35, 10.0, 16.0), &parameters);
        let inside = model.diagnostics(at(30.0, 12.0), &state());
        let outside = model.diagnostics(at(30.0, 18.0), &state());
        assert!(inside.derivative[STRESS] > 0.0);
        assert_eq!(outside.derivative[STRESS], 0.0);
        // UV-A also contributes to photosynthesis
        assert!(inside.conditions.effective_irradiance > outside.conditions.effective_irradiance);
    }

    #[test]
    fn test_repair_consumes_carbon() {
        let mut parameters = ParameterSet::default();
        parameters.stress.repair_carbon_cost = 1e-3;
        let model = model(Treatment::control("CK"), &parameters);
        let mut stressed = state();
        stressed[STRESS] = 5.0;

        let d = model.diagnostics(at(30.0, 12.0), &stressed);
        assert!(d.stress.repair > 0.0);
        let expected = d.growth.buffer - d.stress.repair * 1e-3;
        assert!((d.derivative[BUFFER] - expected).abs() < 1e-18);
    }

    #[test]
    fn test_empty_buffer_is_not_drawn_below_zero() {
        let mut parameters = ParameterSet::default();
        parameters.stress.repair_carbon_cost = 1.0;
        let model = model(Treatment::control("CK"), &parameters);
        let mut y = state();
        y[BUFFER] = 0.0;
        y[STRESS] = 5.0;
        let d = model.diagnostics(at(30.0, 23.0), &y);
        assert!(d.derivative[BUFFER] >= 0.0, "Buffer drawn down from empty: {}", d.derivative[BUFFER]);
    }

    #[test]
    fn test_zero_buffer_floor_stays_finite() {
        let mut parameters = ParameterSet::default();
        parameters.growth.buffer_floor = 0.0;
        let model = model(Treatment::new("H12D3", 11.0, 32, 35, 6.0, 18.0), &parameters);
        let mut y = state();
        y[BUFFER] = 0.0;
        y[STRESS] = 5.0;
        let d = model.diagnostics(at(33.0, 12.0), &y);
        assert!(d.derivative.iter().all(|v| v.is_finite()), "{:?}", d.derivative);
        assert!(d.derivative[BUFFER] >= 0.0);
    }

    #[test]
    fn test_ros_state_only_moves_when_enabled() {
        let treatment = Treatment::new("H12D3", 11.0, 32, 35, 6.0, 18.0);
        let disabled = model(treatment.clone(), &ParameterSet::default());
        assert_eq!(disabled.diagnostics(at(33.0, 12.0), &state()).derivative[ROS], 0.0);

        let parameters = ParameterSet::default().with_mechanisms(Mechanisms {
            ros_enabled: true,
            ..Mechanisms::default()
        });
        let enabled = model(treatment, &parameters);
        assert!(enabled.diagnostics(at(33.0, 12.0), &state()).derivative[ROS] > 0.0);
    }

    #[test]
    fn test_plant_state_conversion() {
        let y = state();
        let named = PlantState::from(&y);
        assert_eq!(named.lai, 2.0);
        assert_eq!(ModelState::from(named), y);
        assert!(named.is_non_negative());
    }
}
