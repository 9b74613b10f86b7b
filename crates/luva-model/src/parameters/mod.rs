//! Model parameters
//!
//! Parameters are grouped by mechanism, one struct per group, and collected
//! in [`ParameterSet`]. Every group provides defaults calibrated against the
//! reference experiment so a partial configuration only needs to name what it
//! changes.
//!
//! Calibration works with a flat `name -> value` view. Field names are unique
//! across groups, so a bare name such as `damage_coefficient` identifies one
//! parameter; the qualified form `stress.damage_coefficient` is also accepted.

mod growth;
mod intraday;
mod ldmc;
mod pigment;
mod ros;
mod stress;

pub use growth::GrowthParameters;
pub use intraday::IntradayParameters;
pub use ldmc::LdmcParameters;
pub use pigment::PigmentParameters;
pub use ros::RosParameters;
pub use stress::StressParameters;

use indexmap::IndexMap;
use luva_core::errors::{LuvaError, LuvaResult};
use luva_core::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Formulation of within-day damage amplification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntradayMechanism {
    /// Softplus threshold on cumulative daily UV-A dose
    #[default]
    SoftplusEnergy,
    /// Power law in hours of continuous exposure
    PowerLawHours,
    /// Gompertz curve in hours of continuous exposure
    GompertzHours,
}

/// Formulation of Stress self-amplification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressFeedback {
    #[default]
    MichaelisMenten,
    Disabled,
}

/// Formulation of Stress induced anthocyanin synthesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PigmentInduction {
    /// Hill curve with exponent `induction_hill`
    #[default]
    Hill,
    /// Michaelis–Menten curve, ignoring `induction_hill`
    Saturating,
}

/// Selection of swappable mechanisms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Mechanisms {
    pub intraday: IntradayMechanism,
    pub stress_feedback: StressFeedback,
    pub pigment_induction: PigmentInduction,
    /// Integrate the ROS state and let it amplify damage
    pub ros_enabled: bool,
}

/// Complete, immutable set of model coefficients for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterSet {
    pub growth: GrowthParameters,
    pub stress: StressParameters,
    pub intraday: IntradayParameters,
    pub ros: RosParameters,
    pub pigment: PigmentParameters,
    pub ldmc: LdmcParameters,
    pub mechanisms: Mechanisms,
}

/// Groups holding numeric coefficients, in lookup order.
const NUMERIC_GROUPS: [&str; 6] = ["growth", "stress", "intraday", "ros", "pigment", "ldmc"];

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mechanisms(mut self, mechanisms: Mechanisms) -> Self {
        self.mechanisms = mechanisms;
        self
    }

    fn to_table(&self) -> LuvaResult<toml::Table> {
        match toml::Value::try_from(self) {
            Ok(toml::Value::Table(table)) => Ok(table),
            Ok(_) => Err(LuvaError::Config(
                "parameters did not serialise to a table".to_string(),
            )),
            Err(e) => Err(LuvaError::Config(e.to_string())),
        }
    }

    /// Resolve a flat or qualified name to its `(group, field)` pair.
    fn locate(table: &toml::Table, name: &str) -> LuvaResult<(String, String)> {
        let unknown = || LuvaError::InvalidParameter(format!("unknown parameter '{}'", name));

        if let Some((group, field)) = name.split_once('.') {
            let found = NUMERIC_GROUPS.contains(&group)
                && table
                    .get(group)
                    .and_then(|g| g.as_table())
                    .is_some_and(|g| g.contains_key(field));
            return if found {
                Ok((group.to_string(), field.to_string()))
            } else {
                Err(unknown())
            };
        }

        NUMERIC_GROUPS
            .iter()
            .find(|group| {
                table
                    .get(**group)
                    .and_then(|g| g.as_table())
                    .is_some_and(|g| g.contains_key(name))
            })
            .map(|group| (group.to_string(), name.to_string()))
            .ok_or_else(unknown)
    }

    /// Return a copy with a subset of coefficients replaced.
    ///
    /// # Arguments
    ///
    /// * `overrides` - Flat `name -> value` mapping. Names may be bare field
    ///   names or qualified as `group.field`.
    ///
    /// # Errors
    ///
    /// Fails with [`LuvaError::InvalidParameter`] if a name does not match any
    /// coefficient or a value is not finite. `self` is never modified.
    pub fn with_overrides(&self, overrides: &IndexMap<String, FloatValue>) -> LuvaResult<Self> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }
        let mut table = self.to_table()?;

        for (name, &value) in overrides {
            if !value.is_finite() {
                return Err(LuvaError::InvalidParameter(format!(
                    "value for '{}' is not finite: {}",
                    name, value
                )));
            }
            let (group, field) = Self::locate(&table, name)?;
            let slot = table
                .get_mut(&group)
                .and_then(|g| g.as_table_mut())
                .and_then(|g| g.get_mut(&field))
                .ok_or_else(|| LuvaError::InvalidParameter(format!("unknown parameter '{}'", name)))?;
            *slot = toml::Value::Float(value);
        }

        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| LuvaError::Config(e.to_string()))
    }

    /// Current value of a named coefficient.
    pub fn get(&self, name: &str) -> LuvaResult<FloatValue> {
        let table = self.to_table()?;
        let (group, field) = Self::locate(&table, name)?;
        table
            .get(&group)
            .and_then(|g| g.get(&field))
            .and_then(|v| v.as_float())
            .ok_or_else(|| LuvaError::InvalidParameter(format!("'{}' is not numeric", name)))
    }

    /// Names of every numeric coefficient, grouped by mechanism.
    pub fn names(&self) -> LuvaResult<Vec<String>> {
        let table = self.to_table()?;
        Ok(NUMERIC_GROUPS
            .iter()
            .filter_map(|group| table.get(*group).and_then(|g| g.as_table()))
            .flat_map(|g| g.keys().cloned())
            .collect())
    }

    /// Check that coefficients are physically meaningful.
    ///
    /// Hard failures (negative rates, non-finite values, inverted bounds) are
    /// returned as errors. Values that are legal but outside the range the
    /// model was calibrated for are logged.
    pub fn validate(&self) -> LuvaResult<()> {
        let table = self.to_table()?;
        for group in NUMERIC_GROUPS {
            let Some(fields) = table.get(group).and_then(|g| g.as_table()) else {
                continue;
            };
            for (field, value) in fields {
                if let Some(v) = value.as_float() {
                    if !v.is_finite() {
                        return Err(LuvaError::InvalidParameter(format!(
                            "{}.{} is not finite",
                            group, field
                        )));
                    }
                }
            }
        }

        let non_negative = [
            ("damage_coefficient", self.stress.damage_coefficient),
            ("repair_coefficient", self.stress.repair_coefficient),
            ("feedback_coefficient", self.stress.feedback_coefficient),
            ("vulnerability_cap", self.stress.vulnerability_cap),
            ("night_uva_penalty", self.stress.night_uva_penalty),
            ("repair_carbon_cost", self.stress.repair_carbon_cost),
            ("ros_production", self.ros.ros_production),
            ("ros_passive_decay", self.ros.ros_passive_decay),
            ("apx_vmax", self.ros.apx_vmax),
            ("cat_vmax", self.ros.cat_vmax),
            ("base_rate_light", self.pigment.base_rate_light),
            ("base_rate_dark", self.pigment.base_rate_dark),
            ("induction_vmax", self.pigment.induction_vmax),
            ("synthesis_carbon_cost", self.pigment.synthesis_carbon_cost),
            ("initial_concentration", self.pigment.initial_concentration),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(LuvaError::InvalidParameter(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        let positive = [
            ("vulnerability_lai_ref", self.stress.vulnerability_lai_ref),
            ("feedback_half_saturation", self.stress.feedback_half_saturation),
            ("inhibition_half_saturation", self.stress.inhibition_half_saturation),
            ("energy_scale", self.intraday.energy_scale),
            ("softplus_sharpness", self.intraday.softplus_sharpness),
            ("induction_half_saturation", self.pigment.induction_half_saturation),
            ("dw_fw_ratio_base", self.ldmc.dw_fw_ratio_base),
            ("c_beta", self.growth.c_beta),
            ("buffer_floor", self.growth.buffer_floor),
            ("degradation_rate", self.pigment.degradation_rate),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(LuvaError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.ldmc.dw_fw_ratio_max < self.ldmc.dw_fw_ratio_base {
            return Err(LuvaError::InvalidParameter(format!(
                "dw_fw_ratio_max ({}) is below dw_fw_ratio_base ({})",
                self.ldmc.dw_fw_ratio_max, self.ldmc.dw_fw_ratio_base
            )));
        }
        if self.growth.root_fraction_min > self.growth.root_fraction_max {
            return Err(LuvaError::InvalidParameter(format!(
                "root_fraction_min ({}) exceeds root_fraction_max ({})",
                self.growth.root_fraction_min, self.growth.root_fraction_max
            )));
        }

        if !(0.5..=0.7).contains(&self.growth.c_alpha) {
            warn!(
                c_alpha = self.growth.c_alpha,
                "c_alpha is outside the calibrated range [0.5, 0.7]"
            );
        }
        if self.pigment.base_rate_light > 1e-9 {
            warn!(
                base_rate_light = self.pigment.base_rate_light,
                "Baseline anthocyanin synthesis may be unrealistically high"
            );
        }
        if self.pigment.synthesis_carbon_cost > 0.1 {
            warn!(
                synthesis_carbon_cost = self.pigment.synthesis_carbon_cost,
                "Anthocyanin carbon cost may severely suppress growth"
            );
        }
        Ok(())
    }
}
