//! Anthocyanin synthesis parameters

use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for anthocyanin synthesis and degradation.
///
/// Synthesis scales with fresh weight rather than LAI or dry mass:
///
/// $$\frac{dA}{dt} = FW \left(b_{light|dark} + V_{max} \frac{S^n}{K^n + S^n}\right) - k_{deg} A$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PigmentParameters {
    /// Baseline synthesis per unit fresh weight in the light
    /// unit: 1/s
    /// default: 2e-10
    pub base_rate_light: FloatValue,

    /// Baseline synthesis per unit fresh weight in the dark
    /// unit: 1/s
    /// default: 1e-10
    pub base_rate_dark: FloatValue,

    /// Maximum Stress induced synthesis per unit fresh weight
    /// unit: 1/s
    /// default: 2.35e-11
    pub induction_vmax: FloatValue,

    /// Stress at which induction is half saturated
    /// default: 0.30
    pub induction_half_saturation: FloatValue,

    /// Hill exponent of the induction curve
    /// default: 1.0
    pub induction_hill: FloatValue,

    /// First order degradation rate
    /// unit: 1/s
    /// default: 3.02e-6
    pub degradation_rate: FloatValue,

    /// Carbon drawn from the buffer per unit anthocyanin
    /// unit: kg/kg
    /// default: 0
    pub synthesis_carbon_cost: FloatValue,

    /// Anthocyanin concentration of the transplanted seedling
    /// unit: ppm
    /// default: 5
    pub initial_concentration: FloatValue,
}

impl Default for PigmentParameters {
    fn default() -> Self {
        Self {
            base_rate_light: 2.0e-10,
            base_rate_dark: 1.0e-10,
            induction_vmax: 2.35e-11,
            induction_half_saturation: 0.30,
            induction_hill: 1.0,
            degradation_rate: 3.02e-6,
            synthesis_carbon_cost: 0.0,
            initial_concentration: 5.0,
        }
    }
}
