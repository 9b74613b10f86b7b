//! Within-day exposure parameters
//!
//! Coefficients for the three interchangeable formulations of within-day
//! damage amplification. Only the coefficients of the selected
//! [`IntradayMechanism`](super::IntradayMechanism) are used.
//!
//! Anchor points at 11 W/m² with the defaults below:
//!
//! | hours | softplus energy | power law | Gompertz |
//! |-------|-----------------|-----------|----------|
//! | 6     | 1.01            | 1.97      | 1.02     |
//! | 12    | 3.88            | 250       | 157      |

use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntradayParameters {
    /// Daily UV-A dose at the softplus threshold
    /// unit: kJ/m²
    /// default: 475.2 (12 h at 11 W/m²)
    pub energy_threshold: FloatValue,

    /// Dose scale of the softplus transition
    /// unit: kJ/m²
    /// default: 237.6
    pub energy_scale: FloatValue,

    /// Gain applied to the softplus term
    /// default: 54
    pub depletion_gain: FloatValue,

    /// Power applied to the softplus term
    /// default: 2
    pub depletion_power: FloatValue,

    /// Sharpness of the softplus transition
    /// default: 3
    pub softplus_sharpness: FloatValue,

    /// Gain of the power law in exposure hours
    /// default: 5.8e-7
    pub power_law_gain: FloatValue,

    /// Exponent of the power law in exposure hours
    /// default: 8
    pub power_law_exponent: FloatValue,

    /// Upper bound on the power law factor
    /// default: 500
    pub power_law_max: FloatValue,

    /// Saturating amplification of the Gompertz curve
    /// default: 250
    pub gompertz_max: FloatValue,

    /// Exposure hours at the Gompertz inflection
    /// unit: h
    /// default: 10.5
    pub gompertz_threshold: FloatValue,

    /// Steepness of the Gompertz curve
    /// unit: 1/h
    /// default: 0.5
    pub gompertz_steepness: FloatValue,
}

impl Default for IntradayParameters {
    fn default() -> Self {
        Self {
            energy_threshold: 475.2,
            energy_scale: 237.6,
            depletion_gain: 54.0,
            depletion_power: 2.0,
            softplus_sharpness: 3.0,
            power_law_gain: 5.8e-7,
            power_law_exponent: 8.0,
            power_law_max: 500.0,
            gompertz_max: 250.0,
            gompertz_threshold: 10.5,
            gompertz_steepness: 0.5,
        }
    }
}
