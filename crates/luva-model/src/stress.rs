//! Stress damage, repair and ROS dynamics
//!
//! `dStress/dt = damage - repair`, where damage is driven by UV-A irradiance
//! and amplified by several independent factors, and repair is first order in
//! Stress with a capacity that depends on available carbon.
//!
//! The within-day amplification and the Stress self-amplification are
//! strategies ([`IntradayResponse`], [`FeedbackResponse`]) selected from
//! [`Mechanisms`] when the model is built.

use crate::parameters::{
    IntradayMechanism, IntradayParameters, Mechanisms, RosParameters, StressFeedback, StressParameters,
};
use crate::treatment::UvaExposure;
use luva_core::FloatValue;

const EPS: FloatValue = 1e-9;

/// Largest exponent evaluated before saturating.
const MAX_EXPONENT: FloatValue = 500.0;

/// Smooth approximation of `max(0, x)` with tunable sharpness `k`.
///
/// The argument of the exponential is clipped so extreme inputs saturate
/// instead of overflowing.
pub fn softplus(x: FloatValue, k: FloatValue) -> FloatValue {
    (k * x).clamp(-MAX_EXPONENT, MAX_EXPONENT).exp().ln_1p() / k
}

/// Michaelis–Menten saturation `x / (k + x)` with a guarded denominator.
pub fn saturation(x: FloatValue, k: FloatValue) -> FloatValue {
    x / (k + x + EPS)
}

/// Within-day amplification of damage during long continuous exposure.
pub trait IntradayResponse: Send + Sync {
    fn factor(&self, exposure: &UvaExposure) -> FloatValue;
}

/// Softplus threshold on the dose delivered so far in the session.
///
/// $$F = 1 + g \cdot \mathrm{softplus}\left(\frac{E - E_{ref}}{E_{scale}}, s\right)^p$$
#[derive(Debug, Clone)]
pub struct SoftplusEnergy {
    pub threshold: FloatValue,
    pub scale: FloatValue,
    pub gain: FloatValue,
    pub power: FloatValue,
    pub sharpness: FloatValue,
}

impl IntradayResponse for SoftplusEnergy {
    fn factor(&self, exposure: &UvaExposure) -> FloatValue {
        let excess = softplus((exposure.energy - self.threshold) / self.scale, self.sharpness);
        let factor = 1.0 + self.gain * excess.powf(self.power);
        if factor.is_finite() {
            factor
        } else {
            FloatValue::MAX
        }
    }
}

/// Power law in hours of exposure, `1 + k h^n`, capped at `max`.
#[derive(Debug, Clone)]
pub struct PowerLawHours {
    pub gain: FloatValue,
    pub exponent: FloatValue,
    pub max: FloatValue,
}

impl IntradayResponse for PowerLawHours {
    fn factor(&self, exposure: &UvaExposure) -> FloatValue {
        let hours = exposure.hours_elapsed.max(0.0);
        // Evaluate in log space so large exponents saturate instead of overflowing
        let log_term = self.gain.max(EPS).ln() + self.exponent * (hours + EPS).ln();
        let term = if self.gain <= 0.0 {
            0.0
        } else {
            log_term.min(MAX_EXPONENT).exp()
        };
        (1.0 + term).min(self.max.max(1.0))
    }
}

/// Gompertz curve in hours of exposure.
///
/// $$F = 1 + F_{max} e^{-e^{-k (h - h_0)}}$$
#[derive(Debug, Clone)]
pub struct GompertzHours {
    pub max: FloatValue,
    pub threshold: FloatValue,
    pub steepness: FloatValue,
}

impl IntradayResponse for GompertzHours {
    fn factor(&self, exposure: &UvaExposure) -> FloatValue {
        let inner = (-self.steepness * (exposure.hours_elapsed - self.threshold)).clamp(-MAX_EXPONENT, MAX_EXPONENT);
        1.0 + self.max * (-inner.exp()).exp()
    }
}

impl IntradayMechanism {
    pub fn build(&self, p: &IntradayParameters) -> Box<dyn IntradayResponse> {
        match self {
            IntradayMechanism::SoftplusEnergy => Box::new(SoftplusEnergy {
                threshold: p.energy_threshold,
                scale: p.energy_scale,
                gain: p.depletion_gain,
                power: p.depletion_power,
                sharpness: p.softplus_sharpness,
            }),
            IntradayMechanism::PowerLawHours => Box::new(PowerLawHours {
                gain: p.power_law_gain,
                exponent: p.power_law_exponent,
                max: p.power_law_max,
            }),
            IntradayMechanism::GompertzHours => Box::new(GompertzHours {
                max: p.gompertz_max,
                threshold: p.gompertz_threshold,
                steepness: p.gompertz_steepness,
            }),
        }
    }
}

/// Amplification of damage by accumulated Stress.
pub trait FeedbackResponse: Send + Sync {
    fn factor(&self, stress: FloatValue) -> FloatValue;
}

/// `1 + c S / (K + S)`
#[derive(Debug, Clone)]
pub struct MichaelisMentenFeedback {
    pub coefficient: FloatValue,
    pub half_saturation: FloatValue,
}

impl FeedbackResponse for MichaelisMentenFeedback {
    fn factor(&self, stress: FloatValue) -> FloatValue {
        1.0 + self.coefficient * saturation(stress, self.half_saturation)
    }
}

#[derive(Debug, Clone)]
pub struct NoFeedback;

impl FeedbackResponse for NoFeedback {
    fn factor(&self, _stress: FloatValue) -> FloatValue {
        1.0
    }
}

impl StressFeedback {
    pub fn build(&self, p: &StressParameters) -> Box<dyn FeedbackResponse> {
        match self {
            StressFeedback::MichaelisMenten => Box::new(MichaelisMentenFeedback {
                coefficient: p.feedback_coefficient,
                half_saturation: p.feedback_half_saturation,
            }),
            StressFeedback::Disabled => Box::new(NoFeedback),
        }
    }
}

/// Inputs to the Stress and ROS rates at one instant.
#[derive(Debug, Clone, Copy)]
pub struct StressInputs {
    pub exposure: UvaExposure,
    pub night_uva: bool,
    pub lai: FloatValue,
    pub buffer: FloatValue,
    pub stress: FloatValue,
    pub ros: FloatValue,
}

/// Rates and the factors that produced them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressRates {
    pub vulnerability: FloatValue,
    pub intraday_factor: FloatValue,
    pub feedback_factor: FloatValue,
    pub ros_factor: FloatValue,
    pub circadian_factor: FloatValue,
    pub damage: FloatValue,
    pub repair_capacity: FloatValue,
    pub repair: FloatValue,
    pub d_stress: FloatValue,
    pub d_ros: FloatValue,
}

pub struct StressDynamics {
    stress: StressParameters,
    ros: RosParameters,
    ros_enabled: bool,
    intraday: Box<dyn IntradayResponse>,
    feedback: Box<dyn FeedbackResponse>,
}

impl std::fmt::Debug for StressDynamics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StressDynamics")
            .field("stress", &self.stress)
            .field("ros", &self.ros)
            .field("ros_enabled", &self.ros_enabled)
            .finish_non_exhaustive()
    }
}

impl StressDynamics {
    pub fn new(
        stress: StressParameters,
        intraday: &IntradayParameters,
        ros: RosParameters,
        mechanisms: &Mechanisms,
    ) -> Self {
        Self {
            intraday: mechanisms.intraday.build(intraday),
            feedback: mechanisms.stress_feedback.build(&stress),
            ros_enabled: mechanisms.ros_enabled,
            stress,
            ros,
        }
    }

    pub fn ros_enabled(&self) -> bool {
        self.ros_enabled
    }

    /// Carbon consumed per unit of repair (kg/m²).
    pub fn repair_carbon_cost(&self) -> FloatValue {
        self.stress.repair_carbon_cost
    }

    /// Susceptibility to damage as a function of LAI.
    ///
    /// High for young, low-LAI plants and bounded above by the cap.
    pub fn vulnerability(&self, lai: FloatValue) -> FloatValue {
        let p = &self.stress;
        let log_base = p.vulnerability_exponent * (p.vulnerability_lai_ref / lai.max(EPS)).ln();
        let base = log_base.min(MAX_EXPONENT).exp();
        // cap * base / (cap + base), arranged to stay finite as base grows
        p.vulnerability_cap / (p.vulnerability_cap / base + 1.0)
    }

    /// Carbon dependent repair capacity.
    pub fn repair_capacity(&self, buffer: FloatValue) -> FloatValue {
        let p = &self.stress;
        p.base_repair_capacity + p.carbon_repair_bonus * saturation(buffer.max(0.0), p.repair_carbon_half_saturation)
    }

    /// Multiplier on damage from the current ROS level.
    pub fn ros_factor(&self, ros: FloatValue) -> FloatValue {
        if !self.ros_enabled {
            return 1.0;
        }
        1.0 + self.ros.ros_damage_gain * saturation(ros.max(0.0), self.ros.ros_damage_half_saturation)
    }

    /// Net ROS production (mM/s).
    pub fn ros_rate(&self, uva_irradiance: FloatValue, ros: FloatValue) -> FloatValue {
        if !self.ros_enabled {
            return 0.0;
        }
        let p = &self.ros;
        let level = ros.max(0.0);
        let clearance = p.apx_vmax * saturation(level, p.apx_half_saturation)
            + p.cat_vmax * saturation(level, p.cat_half_saturation)
            + p.ros_passive_decay * level;
        let rate = p.ros_production * uva_irradiance - clearance;
        if ros <= 0.0 && rate < 0.0 {
            0.0
        } else {
            rate
        }
    }

    pub fn rates(&self, inputs: &StressInputs) -> StressRates {
        let p = &self.stress;
        let stress = inputs.stress.max(0.0);
        let irradiance = inputs.exposure.irradiance;

        let vulnerability = self.vulnerability(inputs.lai);
        let intraday_factor = self.intraday.factor(&inputs.exposure);
        let feedback_factor = self.feedback.factor(stress);
        let ros_factor = self.ros_factor(inputs.ros);
        let circadian_factor = if inputs.night_uva { p.night_uva_penalty } else { 1.0 };

        let damage = if irradiance > 0.0 {
            p.damage_coefficient
                * irradiance
                * vulnerability
                * intraday_factor
                * feedback_factor
                * ros_factor
                * circadian_factor
        } else {
            0.0
        };
        let repair_capacity = self.repair_capacity(inputs.buffer);
        let repair = p.repair_coefficient * stress * repair_capacity;

        let mut d_stress = damage - repair;
        if stress <= 0.0 && d_stress < 0.0 {
            d_stress = 0.0;
        }

        StressRates {
            vulnerability,
            intraday_factor,
            feedback_factor,
            ros_factor,
            circadian_factor,
            damage,
            repair_capacity,
            repair,
            d_stress,
            d_ros: self.ros_rate(irradiance, inputs.ros),
        }
    }
}
