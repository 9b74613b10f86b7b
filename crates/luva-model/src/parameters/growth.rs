//! Base growth parameters
//!
//! Parameters of the photosynthesis and carbon allocation model that produces
//! the unstressed derivatives of dry biomass, carbon buffer and LAI.
//!
//! # Reference
//!
//! Follows the lettuce growth model of Van Henten (1994) as extended by Sun et
//! al. with a non-structural carbon buffer, three-point Gaussian canopy
//! integration and a resistance-based CO2 supply limit.

use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the base growth model.
///
/// Canopy gross assimilation is integrated over three Gaussian depths:
///
/// $$A_C = \frac{A(l_1) + 1.6 A(l_2) + A(l_3)}{3.6} \cdot LAI$$
///
/// and split between growth, respiration and the carbon buffer:
///
/// $$\frac{dX_d}{dt} = c_\beta (c_\alpha A_C h_{buf} - R_d)$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrowthParameters {
    /// Conversion of assimilated CO2 to carbohydrate
    /// unit: dimensionless
    /// default: 0.555
    pub c_alpha: FloatValue,

    /// Growth yield, carbohydrate to structural dry matter
    /// unit: dimensionless
    /// default: 0.8
    pub c_beta: FloatValue,

    /// Carbon buffer capacity as a fraction of structural dry mass
    /// unit: dimensionless
    /// default: 0.2
    pub buffer_capacity_fraction: FloatValue,

    /// Maximum relative growth rate at 20 °C
    /// unit: 1/s
    /// default: 1.54e-6
    pub rgr_max_20: FloatValue,

    /// Q10 of the relative growth rate
    /// default: 1.6
    pub q10_growth: FloatValue,

    /// Temperature above which the relative growth rate declines
    /// unit: °C
    /// default: 25
    pub rgr_peak_temperature: FloatValue,

    /// Shoot maintenance respiration at 25 °C
    /// unit: 1/s
    /// default: 3.47e-7
    pub shoot_respiration_25: FloatValue,

    /// Root maintenance respiration at 25 °C
    /// unit: 1/s
    /// default: 1.16e-7
    pub root_respiration_25: FloatValue,

    /// Q10 of maintenance respiration
    /// default: 2.0
    pub q10_respiration: FloatValue,

    /// Canopy reflection of global radiation
    /// default: 0.22
    pub reflection_global: FloatValue,

    /// Canopy reflection of PAR
    /// default: 0.07
    pub reflection_par: FloatValue,

    /// Extinction coefficient for global radiation
    /// default: 0.48
    pub extinction_global: FloatValue,

    /// Extinction coefficient for PAR
    /// default: 0.9
    pub extinction_par: FloatValue,

    /// Leaf scattering coefficient for PAR
    /// default: 0.5
    pub scattering_par: FloatValue,

    /// Reference specific leaf area
    /// unit: m²/kg
    /// default: 47.93
    pub sla_ref: FloatValue,

    /// Reference absorbed irradiance per unit leaf area
    /// unit: W/m²
    /// default: 50.3
    pub sla_light_ref: FloatValue,

    /// Reference relative humidity for SLA
    /// default: 0.75
    pub sla_humidity_ref: FloatValue,

    /// SLA sensitivity to absorbed irradiance
    /// unit: m²/W
    /// default: -4.74e-3
    pub sla_light_sensitivity: FloatValue,

    /// SLA sensitivity to relative humidity
    /// default: 0.912
    pub sla_humidity_sensitivity: FloatValue,

    /// Slope of root fraction against log plant dry mass
    /// default: -0.026
    pub root_fraction_slope: FloatValue,

    /// Intercept of root fraction against log plant dry mass
    /// default: -0.076
    pub root_fraction_intercept: FloatValue,

    /// default: 0.05
    pub root_fraction_min: FloatValue,

    /// default: 0.35
    pub root_fraction_max: FloatValue,

    /// Light use efficiency at high CO2
    /// unit: kg CO2/J
    /// default: 17e-9
    pub light_use_efficiency: FloatValue,

    /// CO2 compensation point at 20 °C
    /// unit: ppm
    /// default: 40
    pub gamma_20: FloatValue,

    /// Q10 of the CO2 compensation point
    /// default: 2.0
    pub q10_gamma: FloatValue,

    /// Maximum electron transport rate at 25 °C
    /// unit: µmol/m²/s
    /// default: 210.15
    pub jmax_25: FloatValue,

    /// Activation energy of Jmax
    /// unit: J/mol
    /// default: 3.7e4
    pub jmax_activation_energy: FloatValue,

    /// Deactivation energy of Jmax
    /// unit: J/mol
    /// default: 2.2e5
    pub jmax_deactivation_energy: FloatValue,

    /// Entropy term of Jmax
    /// unit: J/mol/K
    /// default: 710
    pub jmax_entropy: FloatValue,

    /// Ratio of CO2 to H2O stomatal resistance
    /// default: 1.6
    pub stomatal_ratio: FloatValue,

    /// Minimum stomatal resistance to H2O
    /// unit: s/m
    /// default: 82
    pub stomatal_resistance_min: FloatValue,

    /// Lewis number of the leaf boundary layer
    /// default: 1.47
    pub lewis_number: FloatValue,

    /// Characteristic leaf dimension
    /// unit: m
    /// default: 0.1
    pub leaf_dimension: FloatValue,

    /// Air velocity over the canopy
    /// unit: m/s
    /// default: 0.09
    pub air_velocity: FloatValue,

    /// Turbulence resistance
    /// unit: s/m
    /// default: 50
    pub turbulence_resistance: FloatValue,

    /// Quadratic coefficient of carboxylation resistance
    /// default: 0.315
    pub carboxylation_c2: FloatValue,

    /// Linear coefficient of carboxylation resistance
    /// default: -27.35
    pub carboxylation_c1: FloatValue,

    /// Constant coefficient of carboxylation resistance
    /// default: 790.7
    pub carboxylation_c0: FloatValue,

    /// CO2 density at 0 °C
    /// unit: kg/m³
    /// default: 1.98
    pub co2_density_0: FloatValue,

    /// Plant dry mass below which biomass may no longer decline
    /// unit: g/plant
    /// default: 0.03
    pub min_plant_dry_mass: FloatValue,

    /// Carbon buffer level below which buffer drawdown is throttled
    /// unit: kg/m²
    /// default: 1e-5
    pub buffer_floor: FloatValue,

    /// LAI below which leaf area may no longer decline
    /// default: 0.01
    pub min_lai: FloatValue,
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            c_alpha: 0.555,
            c_beta: 0.8,
            buffer_capacity_fraction: 0.2,
            rgr_max_20: 1.54e-6,
            q10_growth: 1.6,
            rgr_peak_temperature: 25.0,
            shoot_respiration_25: 3.47e-7,
            root_respiration_25: 1.16e-7,
            q10_respiration: 2.0,
            reflection_global: 0.22,
            reflection_par: 0.07,
            extinction_global: 0.48,
            extinction_par: 0.9,
            scattering_par: 0.5,
            sla_ref: 47.93,
            sla_light_ref: 50.3,
            sla_humidity_ref: 0.75,
            sla_light_sensitivity: -4.74e-3,
            sla_humidity_sensitivity: 0.912,
            root_fraction_slope: -0.026,
            root_fraction_intercept: -0.076,
            root_fraction_min: 0.05,
            root_fraction_max: 0.35,
            light_use_efficiency: 17e-9,
            gamma_20: 40.0,
            q10_gamma: 2.0,
            jmax_25: 210.15,
            jmax_activation_energy: 3.7e4,
            jmax_deactivation_energy: 2.2e5,
            jmax_entropy: 710.0,
            stomatal_ratio: 1.6,
            stomatal_resistance_min: 82.0,
            lewis_number: 1.47,
            leaf_dimension: 0.1,
            air_velocity: 0.09,
            turbulence_resistance: 50.0,
            carboxylation_c2: 0.315,
            carboxylation_c1: -27.35,
            carboxylation_c0: 790.7,
            co2_density_0: 1.98,
            min_plant_dry_mass: 0.03,
            buffer_floor: 1e-5,
            min_lai: 0.01,
        }
    }
}
