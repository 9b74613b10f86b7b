//! Leaf dry matter content parameters

use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the Stress dependent dry to fresh weight ratio.
///
/// $$r = \min\left(r_0 \left(1 + s \frac{S}{K + S}\right), r_{max}\right)$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LdmcParameters {
    /// Dry to fresh weight ratio without Stress
    /// default: 0.05
    pub dw_fw_ratio_base: FloatValue,

    /// Relative increase of the ratio at saturating Stress
    /// default: 1.0
    pub ldmc_sensitivity: FloatValue,

    /// Stress at which the ratio shift is half saturated
    /// default: 50
    pub ldmc_half_saturation: FloatValue,

    /// Upper bound on the ratio
    /// default: 0.12
    pub dw_fw_ratio_max: FloatValue,
}

impl Default for LdmcParameters {
    fn default() -> Self {
        Self {
            dw_fw_ratio_base: 0.05,
            ldmc_sensitivity: 1.0,
            ldmc_half_saturation: 50.0,
            dw_fw_ratio_max: 0.12,
        }
    }
}
