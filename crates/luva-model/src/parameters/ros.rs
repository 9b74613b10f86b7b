//! Reactive oxygen species parameters
//!
//! ROS is produced in proportion to UV-A irradiance and cleared by two
//! saturating enzymatic pathways plus passive decay:
//!
//! $$\frac{dR}{dt} = p I_{uva} - \left(\frac{V_{apx} R}{K_{apx} + R} + \frac{V_{cat} R}{K_{cat} + R} + k R\right)$$

use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosParameters {
    /// ROS production per unit UV-A irradiance
    /// unit: mM/(W/m²·s)
    /// default: 1e-5
    pub ros_production: FloatValue,

    /// Passive first order ROS decay
    /// unit: 1/s
    /// default: 1e-4
    pub ros_passive_decay: FloatValue,

    /// Maximum ascorbate peroxidase clearance
    /// unit: mM/s
    /// default: 0.02
    pub apx_vmax: FloatValue,

    /// Ascorbate peroxidase half saturation
    /// unit: mM
    /// default: 0.074
    pub apx_half_saturation: FloatValue,

    /// Maximum catalase clearance
    /// unit: mM/s
    /// default: 0.05
    pub cat_vmax: FloatValue,

    /// Catalase half saturation
    /// unit: mM
    /// default: 50
    pub cat_half_saturation: FloatValue,

    /// Maximum extra damage from ROS
    /// default: 1.0
    pub ros_damage_gain: FloatValue,

    /// ROS level at which the extra damage is half saturated
    /// unit: mM
    /// default: 10
    pub ros_damage_half_saturation: FloatValue,
}

impl Default for RosParameters {
    fn default() -> Self {
        Self {
            ros_production: 1e-5,
            ros_passive_decay: 1e-4,
            apx_vmax: 0.02,
            apx_half_saturation: 0.074,
            cat_vmax: 0.05,
            cat_half_saturation: 50.0,
            ros_damage_gain: 1.0,
            ros_damage_half_saturation: 10.0,
        }
    }
}
