//! Base growth model
//!
//! Photosynthesis and carbon allocation without any UV-A stress. The stress
//! layer only talks to this module through [`GrowthModel`]: it passes an
//! effective irradiance (PAR plus weighted UV-A) and the ambient climate, and
//! receives the unstressed rates of change of dry mass, carbon buffer and LAI.
//!
//! # Physics Overview
//!
//! Leaf gross assimilation saturates with absorbed PAR:
//!
//! $$A_L(l) = A_{sat} \left(1 - e^{-\varepsilon PAR_a(l) / A_{sat}}\right)$$
//!
//! where the light saturated rate $A_{sat}$ is the lesser of a CO2 supply
//! limit (resistance network) and an electron transport limit ($J_{max}$).
//! Assimilate is routed through a carbon buffer; growth draws on the buffer
//! at the temperature dependent maximum relative growth rate and surplus
//! assimilation is down-regulated once the buffer is full.

use crate::parameters::GrowthParameters;
use luva_core::units::GRAMS_PER_KG;
use luva_core::FloatValue;

/// Molar mass of CO2 (kg/mol)
const M_CO2: FloatValue = 44e-3;
/// Gas constant (J/mol/K)
const R_GAS: FloatValue = 8.314;
const T0_K: FloatValue = 273.15;
const T25_K: FloatValue = 298.15;

const EPS: FloatValue = 1e-9;

/// Drivers of the base growth model at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthDrivers {
    /// Irradiance available for photosynthesis (W/m²)
    pub irradiance: FloatValue,
    /// Air temperature (°C)
    pub temperature: FloatValue,
    /// CO2 concentration (ppm)
    pub co2: FloatValue,
    /// Relative humidity as a fraction
    pub humidity: FloatValue,
    /// Plants per m²
    pub plant_density: FloatValue,
}

/// Carbon related state variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonState {
    /// Structural dry mass (kg/m²)
    pub dry_mass: FloatValue,
    /// Non-structural carbon buffer (kg/m²)
    pub buffer: FloatValue,
    pub lai: FloatValue,
}

/// Rates of change of [`CarbonState`] (per second).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthRates {
    pub dry_mass: FloatValue,
    pub buffer: FloatValue,
    pub lai: FloatValue,
}

/// Source of unstressed growth rates.
pub trait GrowthModel {
    fn rates(&self, state: &CarbonState, drivers: &GrowthDrivers) -> GrowthRates;

    /// Carbon buffer capacity for a given dry mass (kg/m²).
    fn buffer_capacity(&self, dry_mass: FloatValue) -> FloatValue;

    /// Buffer level below which drawdown is throttled (kg/m²).
    fn buffer_floor(&self) -> FloatValue;
}

/// Canopy photosynthesis and carbon buffer model for lettuce.
#[derive(Debug, Clone, Default)]
pub struct SunGrowthModel {
    parameters: GrowthParameters,
}

impl SunGrowthModel {
    pub fn from_parameters(parameters: GrowthParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &GrowthParameters {
        &self.parameters
    }

    /// Fraction of dry mass allocated to roots.
    pub fn root_fraction(&self, dry_mass: FloatValue, plant_density: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let plant_dry_mass = dry_mass / plant_density;
        (p.root_fraction_slope * (plant_dry_mass + EPS).ln() + p.root_fraction_intercept)
            .clamp(p.root_fraction_min, p.root_fraction_max)
    }

    /// Maintenance respiration (kg/m²/s).
    pub fn respiration(&self, dry_mass: FloatValue, root_fraction: FloatValue, temperature: FloatValue) -> FloatValue {
        let p = &self.parameters;
        (p.shoot_respiration_25 * (1.0 - root_fraction) + p.root_respiration_25 * root_fraction)
            * dry_mass
            * p.q10_respiration.powf((temperature - 25.0) / 10.0)
    }

    /// Maximum relative growth rate (1/s).
    pub fn max_relative_growth_rate(&self, temperature: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let delta = if temperature <= p.rgr_peak_temperature {
            temperature - 20.0
        } else {
            -(temperature - 20.0)
        };
        p.rgr_max_20 * p.q10_growth.powf(delta / 10.0)
    }

    /// Light saturated leaf assimilation from the CO2 supply network, capped
    /// by electron transport (kg CO2/m² leaf/s).
    fn saturated_assimilation(
        &self,
        drivers: &GrowthDrivers,
        absorbed: FloatValue,
        lai: FloatValue,
        gamma: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        let tc = drivers.temperature;
        let tk = tc + T0_K;
        let co2 = drivers.co2;
        let irradiance = drivers.irradiance;

        let jmax = p.jmax_25
            * (p.jmax_activation_energy * (tk - T25_K) / (tk * R_GAS * T25_K)).exp()
            * (1.0 + ((p.jmax_entropy * T25_K - p.jmax_deactivation_energy) / (R_GAS * T25_K)).exp())
            / (1.0 + ((p.jmax_entropy * tk - p.jmax_deactivation_energy) / (R_GAS * tk)).exp() + EPS);
        let electron_limit = M_CO2 * jmax / 4.0 * 1e-6;

        let carboxylation = (p.carboxylation_c2 * tc * tc + p.carboxylation_c1 * tc + p.carboxylation_c0).max(10.0);
        let boundary = p.lewis_number.powf(0.67) * 1174.0 * p.leaf_dimension.sqrt()
            / ((207.0 * p.air_velocity * p.air_velocity).powf(0.25) + EPS);

        let saturation_pressure = 10f64.powf(2.7857 + 7.5 * tc / (237.3 + tc));
        let vapour_deficit = saturation_pressure * (1.0 - drivers.humidity);
        let f_humidity = 4.0 / ((1.0 + 255.0 * (-0.54e-2 * vapour_deficit).exp()).powf(0.25) + EPS);
        let f_co2 = match (irradiance > 3.0, co2 < 1100.0) {
            (true, true) => 1.0 + 6.1e-7 * (co2 - 200.0).powi(2),
            (true, false) => 1.5,
            (false, _) => 1.0,
        };
        let f_temperature = if irradiance <= 3.0 {
            1.0 + 0.5e-2 * (tc - 33.6).powi(2)
        } else {
            1.0 + 2.3e-2 * (tc - 24.5).powi(2)
        };
        let half_leaf_absorbed = absorbed / (2.0 * lai + EPS);
        let f_light = (half_leaf_absorbed + 4.3) / (half_leaf_absorbed + 0.54);
        let stomatal =
            p.stomatal_ratio * p.stomatal_resistance_min * f_light * f_temperature * f_co2 * f_humidity;
        let total_resistance = stomatal + boundary + carboxylation + p.turbulence_resistance;

        let co2_density = p.co2_density_0 * T0_K / (tk + EPS);
        let supply_limit = (co2_density * (co2 - gamma) / (total_resistance + EPS) * 1e-6).max(0.0);
        supply_limit.min(electron_limit)
    }

    /// Canopy gross assimilation (kg CO2/m² ground/s) by three-point Gaussian
    /// integration over canopy depth.
    pub fn canopy_assimilation(&self, state: &CarbonState, drivers: &GrowthDrivers) -> FloatValue {
        let p = &self.parameters;
        let lai = state.lai.max(EPS);
        let dry_mass = state.dry_mass.max(EPS);
        let tc = drivers.temperature;
        let irradiance = drivers.irradiance;

        let absorbed = (1.0 - p.reflection_global) * irradiance * (1.0 - (-p.extinction_global * lai).exp());
        let gamma = p.gamma_20 * p.q10_gamma.powf((tc - 20.0) / 10.0);
        let efficiency = p.light_use_efficiency * (drivers.co2 - gamma) / (drivers.co2 + 2.0 * gamma + EPS);

        let root_fraction = self.root_fraction(dry_mass, drivers.plant_density);
        let respiration = self.respiration(dry_mass, root_fraction, tc);
        let saturated = (self.saturated_assimilation(drivers, absorbed, lai, gamma)
            + (respiration / (lai + EPS)) / p.c_alpha)
            .max(0.0);

        let offset = 0.15f64.sqrt();
        let depths = [(0.5 - offset) * lai, 0.5 * lai, (0.5 + offset) * lai];
        let leaf = depths.map(|depth| {
            let par_absorbed = p.extinction_par
                * (1.0 - p.reflection_par)
                * irradiance
                * p.scattering_par
                * (-p.extinction_par * depth).exp();
            (saturated * (1.0 - (-efficiency * par_absorbed / (saturated + EPS)).exp())).max(0.0)
        });
        (leaf[0] + 1.6 * leaf[1] + leaf[2]) / 3.6 * lai
    }

    /// Specific leaf area (m²/kg).
    pub fn specific_leaf_area(&self, lai: FloatValue, drivers: &GrowthDrivers) -> FloatValue {
        let p = &self.parameters;
        let absorbed =
            (1.0 - p.reflection_global) * drivers.irradiance * (1.0 - (-p.extinction_global * lai).exp());
        let per_leaf = absorbed / (lai + EPS);
        let f_light = 1.0 / (1.0 + p.sla_light_sensitivity * (p.sla_light_ref - per_leaf));
        let f_humidity = 1.0 / (1.0 + p.sla_humidity_sensitivity * (p.sla_humidity_ref - drivers.humidity));
        p.sla_ref * f_light * f_humidity
    }
}

impl GrowthModel for SunGrowthModel {
    fn rates(&self, state: &CarbonState, drivers: &GrowthDrivers) -> GrowthRates {
        let p = &self.parameters;
        let dry_mass = state.dry_mass.max(EPS);
        let buffer = state.buffer.max(0.0);
        let lai = state.lai.max(EPS);
        let clamped = CarbonState {
            dry_mass,
            buffer,
            lai,
        };
        let tc = drivers.temperature;

        let root_fraction = self.root_fraction(dry_mass, drivers.plant_density);
        let sla = self.specific_leaf_area(lai, drivers);
        let gross = self.canopy_assimilation(&clamped, drivers);
        let respiration = self.respiration(dry_mass, root_fraction, tc);

        let capacity = self.buffer_capacity(dry_mass);
        let rgr = self.max_relative_growth_rate(tc);
        let downregulation = if buffer >= capacity {
            ((respiration + rgr * dry_mass / p.c_beta) / (p.c_alpha * gross + EPS)).min(1.0)
        } else {
            1.0
        };

        let net = p.c_alpha * gross * downregulation - respiration;
        let mut d_dry_mass = p.c_beta * net;
        let mut d_buffer = net - rgr * dry_mass / p.c_beta;
        let mut d_lai = d_dry_mass * (1.0 - root_fraction) * sla;

        if buffer <= p.buffer_floor && d_buffer < 0.0 {
            d_buffer *= if p.buffer_floor > 0.0 {
                (buffer / p.buffer_floor).max(0.0).powi(2)
            } else {
                0.0
            };
        }
        if buffer >= capacity && d_buffer > 0.0 {
            d_buffer = 0.0;
        }
        let min_dry_mass = p.min_plant_dry_mass / GRAMS_PER_KG * drivers.plant_density;
        if dry_mass < min_dry_mass && d_dry_mass < 0.0 {
            d_dry_mass = 0.0;
        }
        if lai < p.min_lai && d_lai < 0.0 {
            d_lai = 0.0;
        }

        GrowthRates {
            dry_mass: d_dry_mass,
            buffer: d_buffer,
            lai: d_lai,
        }
    }

    fn buffer_capacity(&self, dry_mass: FloatValue) -> FloatValue {
        self.parameters.buffer_capacity_fraction * dry_mass
    }

    fn buffer_floor(&self) -> FloatValue {
        self.parameters.buffer_floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seedling() -> CarbonState {
        // 10 g fresh weight at 5% dry matter, 36 plants/m²
        let dry_mass = 0.5 / 1000.0 * 36.0;
        CarbonState {
            dry_mass,
            buffer: 0.1 * dry_mass,
            lai: 2.0,
        }
    }

    fn drivers(irradiance: FloatValue, temperature: FloatValue) -> GrowthDrivers {
        GrowthDrivers {
            irradiance,
            temperature,
            co2: 1200.0,
            humidity: 0.7,
            plant_density: 36.0,
        }
    }

    #[test]
    fn test_light_drives_growth() {
        let model = SunGrowthModel::default();
        let rates = model.rates(&seedling(), &drivers(57.0, 25.0));
        assert!(rates.dry_mass > 0.0, "Expected growth in the light, got {}", rates.dry_mass);
        assert!(rates.lai > 0.0);
    }

    #[test]
    fn test_darkness_respires() {
        let model = SunGrowthModel::default();
        let state = seedling();
        let rates = model.rates(&state, &drivers(0.0, 18.0));
        assert_eq!(model.canopy_assimilation(&state, &drivers(0.0, 18.0)), 0.0);
        assert!(rates.dry_mass < 0.0, "Expected net loss in the dark, got {}", rates.dry_mass);
        assert!(rates.buffer < 0.0);
    }

    #[test]
    fn test_assimilation_increases_with_light() {
        let model = SunGrowthModel::default();
        let state = seedling();
        let low = model.canopy_assimilation(&state, &drivers(30.0, 25.0));
        let high = model.canopy_assimilation(&state, &drivers(60.0, 25.0));
        assert!(high > low, "Expected {} > {}", high, low);
    }

    #[test]
    fn test_empty_buffer_cannot_be_drawn_down() {
        let model = SunGrowthModel::default();
        let state = CarbonState {
            buffer: 0.0,
            ..seedling()
        };
        let rates = model.rates(&state, &drivers(0.0, 18.0));
        assert_eq!(rates.buffer, 0.0);
    }

    #[test]
    fn test_full_buffer_cannot_grow() {
        let model = SunGrowthModel::default();
        let mut state = seedling();
        state.buffer = model.buffer_capacity(state.dry_mass) * 1.01;
        let rates = model.rates(&state, &drivers(57.0, 25.0));
        assert!(rates.buffer <= 0.0);
    }

    #[test]
    fn test_root_fraction_is_bounded() {
        let model = SunGrowthModel::default();
        for dry_mass in [1e-9, 1e-4, 0.018, 1.0, 100.0] {
            let fraction = model.root_fraction(dry_mass, 36.0);
            assert!((0.05..=0.35).contains(&fraction));
        }
    }

    #[test]
    fn test_growth_rate_peaks_at_threshold() {
        let model = SunGrowthModel::default();
        let at_20 = model.max_relative_growth_rate(20.0);
        let at_25 = model.max_relative_growth_rate(25.0);
        let at_30 = model.max_relative_growth_rate(30.0);
        assert!((at_20 - 1.54e-6).abs() < 1e-15);
        assert!(at_25 > at_20);
        assert!(at_30 < at_20);
    }
}
