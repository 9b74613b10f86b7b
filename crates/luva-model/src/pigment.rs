//! Anthocyanin synthesis and degradation
//!
//! Synthesis is proportional to fresh weight. Driving it with fresh weight
//! rather than LAI or dry mass keeps pigment concentration consistent when
//! leaf area and dry matter content move apart under Stress.

use crate::parameters::{PigmentInduction, PigmentParameters};
use luva_core::FloatValue;

/// Stress induced synthesis per unit fresh weight.
pub trait InductionResponse: Send + Sync {
    fn rate(&self, stress: FloatValue) -> FloatValue;
}

/// `V_max S^n / (K^n + S^n)`
#[derive(Debug, Clone)]
pub struct HillInduction {
    pub vmax: FloatValue,
    pub half_saturation: FloatValue,
    pub hill: FloatValue,
}

impl InductionResponse for HillInduction {
    fn rate(&self, stress: FloatValue) -> FloatValue {
        let stress = stress.max(0.0);
        let s_n = stress.powf(self.hill);
        let k_n = self.half_saturation.powf(self.hill);
        let fraction = s_n / (k_n + s_n + 1e-12);
        if fraction.is_finite() {
            self.vmax * fraction
        } else {
            // Both powers overflowed; Stress far above K saturates
            self.vmax
        }
    }
}

/// `V_max S / (K + S)`
#[derive(Debug, Clone)]
pub struct SaturatingInduction {
    pub vmax: FloatValue,
    pub half_saturation: FloatValue,
}

impl InductionResponse for SaturatingInduction {
    fn rate(&self, stress: FloatValue) -> FloatValue {
        let stress = stress.max(0.0);
        self.vmax * stress / (self.half_saturation + stress + 1e-12)
    }
}

impl PigmentInduction {
    pub fn build(&self, p: &PigmentParameters) -> Box<dyn InductionResponse> {
        match self {
            PigmentInduction::Hill => Box::new(HillInduction {
                vmax: p.induction_vmax,
                half_saturation: p.induction_half_saturation,
                hill: p.induction_hill,
            }),
            PigmentInduction::Saturating => Box::new(SaturatingInduction {
                vmax: p.induction_vmax,
                half_saturation: p.induction_half_saturation,
            }),
        }
    }
}

/// Pigment rates at one instant (kg/m²/s).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PigmentRates {
    pub synthesis: FloatValue,
    pub degradation: FloatValue,
    pub d_anthocyanin: FloatValue,
    /// Carbon drawn from the buffer by synthesis
    pub carbon_cost: FloatValue,
}

pub struct PigmentSynthesis {
    parameters: PigmentParameters,
    induction: Box<dyn InductionResponse>,
}

impl std::fmt::Debug for PigmentSynthesis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PigmentSynthesis")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl PigmentSynthesis {
    pub fn new(parameters: PigmentParameters, induction: PigmentInduction) -> Self {
        Self {
            induction: induction.build(&parameters),
            parameters,
        }
    }

    pub fn parameters(&self) -> &PigmentParameters {
        &self.parameters
    }

    fn base_rate(&self, is_day: bool) -> FloatValue {
        if is_day {
            self.parameters.base_rate_light
        } else {
            self.parameters.base_rate_dark
        }
    }

    /// # Arguments
    ///
    /// * `fresh_weight` - Canopy fresh weight (kg/m²)
    /// * `stress` - Current Stress
    /// * `anthocyanin` - Current anthocyanin (kg/m²)
    /// * `is_day` - Whether the chamber lights are on
    pub fn rates(
        &self,
        fresh_weight: FloatValue,
        stress: FloatValue,
        anthocyanin: FloatValue,
        is_day: bool,
    ) -> PigmentRates {
        let synthesis = fresh_weight * (self.base_rate(is_day) + self.induction.rate(stress));
        let degradation = self.parameters.degradation_rate * anthocyanin.max(0.0);
        PigmentRates {
            synthesis,
            degradation,
            d_anthocyanin: synthesis - degradation,
            carbon_cost: synthesis * self.parameters.synthesis_carbon_cost,
        }
    }

    /// Anthocyanin level at which baseline synthesis balances degradation
    /// for a fixed fresh weight and zero Stress (kg/m²).
    /// Unbounded when nothing degrades.
    pub fn steady_state(&self, fresh_weight: FloatValue, is_day: bool) -> FloatValue {
        if self.parameters.degradation_rate <= 0.0 {
            return FloatValue::INFINITY;
        }
        fresh_weight * self.base_rate(is_day) / self.parameters.degradation_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_baseline_synthesis_without_stress() {
        let pigment = PigmentSynthesis::new(PigmentParameters::default(), PigmentInduction::Hill);
        let day = pigment.rates(2.0, 0.0, 0.0, true);
        let night = pigment.rates(2.0, 0.0, 0.0, false);
        assert_relative_eq!(day.synthesis, 4.0e-10);
        assert_relative_eq!(night.synthesis, 2.0e-10);
        assert_eq!(day.carbon_cost, 0.0);
    }

    #[test]
    fn test_steady_state_balances() {
        let pigment = PigmentSynthesis::new(PigmentParameters::default(), PigmentInduction::Hill);
        let level = pigment.steady_state(3.0, true);
        let rates = pigment.rates(3.0, 0.0, level, true);
        assert_relative_eq!(rates.d_anthocyanin, 0.0, epsilon = 1e-20);
    }

    #[test]
    fn test_induction_saturates() {
        let p = PigmentParameters::default();
        let hill = HillInduction {
            vmax: p.induction_vmax,
            half_saturation: p.induction_half_saturation,
            hill: 3.0,
        };
        assert_eq!(hill.rate(0.0), 0.0);
        assert_relative_eq!(hill.rate(0.3), p.induction_vmax / 2.0, max_relative = 1e-6);
        assert!(hill.rate(100.0) <= p.induction_vmax);
        assert_relative_eq!(hill.rate(1e200), p.induction_vmax);

        let saturating = PigmentInduction::Saturating.build(&p);
        assert_relative_eq!(saturating.rate(0.3), p.induction_vmax / 2.0, max_relative = 1e-6);
    }

    #[test]
    fn test_carbon_cost() {
        let params = PigmentParameters {
            synthesis_carbon_cost: 0.5,
            ..PigmentParameters::default()
        };
        let pigment = PigmentSynthesis::new(params, PigmentInduction::Hill);
        let rates = pigment.rates(1.0, 1.0, 0.0, true);
        assert_relative_eq!(rates.carbon_cost, rates.synthesis * 0.5);
    }
}
