//! Stress effects on growth and dry matter content

use crate::growth::GrowthRates;
use crate::parameters::{LdmcParameters, StressParameters};
use crate::stress::saturation;
use luva_core::FloatValue;

/// Scale a growth rate by `1 - reduction` only when it is positive.
///
/// Inhibition suppresses growth; it never accelerates decline.
pub fn inhibit(rate: FloatValue, reduction: FloatValue) -> FloatValue {
    if rate > 0.0 {
        rate * (1.0 - reduction)
    } else {
        rate
    }
}

#[derive(Debug, Clone)]
pub struct GrowthModulation {
    stress: StressParameters,
    ldmc: LdmcParameters,
}

impl GrowthModulation {
    pub fn new(stress: StressParameters, ldmc: LdmcParameters) -> Self {
        Self { stress, ldmc }
    }

    /// Saturating inhibition signal in `[0, 1)`.
    pub fn inhibition(&self, stress: FloatValue) -> FloatValue {
        saturation(stress.max(0.0), self.stress.inhibition_half_saturation)
    }

    /// Apply Stress inhibition to the unstressed growth rates.
    ///
    /// The carbon buffer rate is passed through; carbon costs of repair and
    /// pigment synthesis are charged separately.
    pub fn apply(&self, base: GrowthRates, stress: FloatValue) -> GrowthRates {
        let inhibition = self.inhibition(stress);
        GrowthRates {
            dry_mass: inhibit(base.dry_mass, self.stress.photosynthesis_inhibition * inhibition),
            buffer: base.buffer,
            lai: inhibit(base.lai, self.stress.lai_inhibition * inhibition),
        }
    }

    /// Dry to fresh weight ratio, rising with Stress up to a cap.
    pub fn dw_fw_ratio(&self, stress: FloatValue) -> FloatValue {
        let p = &self.ldmc;
        let shift = p.ldmc_sensitivity * saturation(stress.max(0.0), p.ldmc_half_saturation);
        (p.dw_fw_ratio_base * (1.0 + shift)).min(p.dw_fw_ratio_max)
    }
}
