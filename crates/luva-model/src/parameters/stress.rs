//! Stress damage and repair parameters

use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters governing the Stress accumulator.
///
/// $$\frac{dS}{dt} = k_d I_{uva} V(LAI) F_{day} F_S F_{ROS} P_{circ} - k_r S C_{rep}(C_{buf})$$
///
/// with vulnerability
///
/// $$V(LAI) = \frac{cap \cdot (LAI_{ref}/LAI)^n}{cap + (LAI_{ref}/LAI)^n}$$
///
/// and carbon dependent repair capacity
///
/// $$C_{rep} = c_0 + c_b \frac{C_{buf}}{K_C + C_{buf}}$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StressParameters {
    /// Damage per unit UV-A irradiance
    /// unit: 1/(W/m²·s)
    /// default: 0.66e-6
    pub damage_coefficient: FloatValue,

    /// First order repair rate
    /// unit: 1/s
    /// default: 1e-5
    pub repair_coefficient: FloatValue,

    /// Strength of the Stress self-amplification
    /// default: 8.0
    pub feedback_coefficient: FloatValue,

    /// Stress at which self-amplification is half saturated
    /// default: 0.8
    pub feedback_half_saturation: FloatValue,

    /// LAI at which base vulnerability is 1
    /// default: 6.5
    pub vulnerability_lai_ref: FloatValue,

    /// Exponent of the LAI vulnerability curve
    /// default: 8
    pub vulnerability_exponent: FloatValue,

    /// Upper bound of vulnerability
    /// default: 100
    pub vulnerability_cap: FloatValue,

    /// Damage multiplier for UV-A delivered during the dark period
    /// default: 3.8
    pub night_uva_penalty: FloatValue,

    /// Maximum fractional inhibition of biomass growth
    /// default: 0.66
    pub photosynthesis_inhibition: FloatValue,

    /// Maximum fractional inhibition of leaf area growth
    /// default: 0.66
    pub lai_inhibition: FloatValue,

    /// Stress at which growth inhibition is half saturated
    /// default: 1.9
    pub inhibition_half_saturation: FloatValue,

    /// Repair capacity with an empty carbon buffer
    /// default: 0.5
    pub base_repair_capacity: FloatValue,

    /// Additional repair capacity with a full carbon buffer
    /// default: 0.5
    pub carbon_repair_bonus: FloatValue,

    /// Buffer level at which the repair bonus is half saturated
    /// unit: kg/m²
    /// default: 0.001
    pub repair_carbon_half_saturation: FloatValue,

    /// Carbon consumed per unit of repaired Stress
    /// unit: kg/m²
    /// default: 1e-6
    pub repair_carbon_cost: FloatValue,
}

impl Default for StressParameters {
    fn default() -> Self {
        Self {
            damage_coefficient: 0.66e-6,
            repair_coefficient: 1e-5,
            feedback_coefficient: 8.0,
            feedback_half_saturation: 0.8,
            vulnerability_lai_ref: 6.5,
            vulnerability_exponent: 8.0,
            vulnerability_cap: 100.0,
            night_uva_penalty: 3.8,
            photosynthesis_inhibition: 0.66,
            lai_inhibition: 0.66,
            inhibition_half_saturation: 1.9,
            base_repair_capacity: 0.5,
            carbon_repair_bonus: 0.5,
            repair_carbon_half_saturation: 0.001,
            repair_carbon_cost: 1e-6,
        }
    }
}
