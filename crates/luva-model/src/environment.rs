//! Growth chamber environment
//!
//! The environment baseline fixes a photoperiod and a day and night value for
//! PAR irradiance, air temperature, CO2 and relative humidity. The
//! [`EnvironmentModel`] combines the baseline with a [`Treatment`] to resolve
//! everything the derivative function needs at a given time.

use crate::treatment::{Treatment, UvaExposure};
use luva_core::units::{hour_of_day, HOURS_PER_DAY};
use luva_core::{FloatValue, Time};
use serde::{Deserialize, Serialize};

/// Whether `hour` lies in `[on, off)`, wrapping past midnight when `off < on`.
pub fn hour_in_window(hour: FloatValue, on: FloatValue, off: FloatValue) -> bool {
    if on <= off {
        on <= hour && hour < off
    } else {
        hour >= on || hour < off
    }
}

/// Baseline chamber conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environment {
    /// Hour at which the lights switch on
    /// default: 6
    pub light_on_hour: FloatValue,

    /// Hour at which the lights switch off
    /// default: 22
    pub light_off_hour: FloatValue,

    /// PAR irradiance during the light period
    /// unit: W/m²
    /// default: 57
    pub par_day: FloatValue,

    /// unit: °C
    /// default: 25
    pub temperature_day: FloatValue,

    /// unit: °C
    /// default: 18
    pub temperature_night: FloatValue,

    /// unit: ppm
    /// default: 1200
    pub co2_day: FloatValue,

    /// unit: ppm
    /// default: 1200
    pub co2_night: FloatValue,

    /// Relative humidity as a fraction
    /// default: 0.70
    pub humidity_day: FloatValue,

    /// default: 0.85
    pub humidity_night: FloatValue,

    /// unit: plants/m²
    /// default: 36
    pub plant_density: FloatValue,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            light_on_hour: 6.0,
            light_off_hour: 22.0,
            par_day: 57.0,
            temperature_day: 25.0,
            temperature_night: 18.0,
            co2_day: 1200.0,
            co2_night: 1200.0,
            humidity_day: 0.70,
            humidity_night: 0.85,
            plant_density: 36.0,
        }
    }
}

/// Ambient conditions at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    pub is_day: bool,
    /// PAR irradiance before any UV-A contribution (W/m²)
    pub par: FloatValue,
    pub temperature: FloatValue,
    pub co2: FloatValue,
    pub humidity: FloatValue,
}

impl Environment {
    pub fn is_day(&self, t: Time) -> bool {
        hour_in_window(hour_of_day(t), self.light_on_hour, self.light_off_hour)
    }

    /// Length of the light period in hours.
    pub fn photoperiod_hours(&self) -> FloatValue {
        if self.light_on_hour <= self.light_off_hour {
            self.light_off_hour - self.light_on_hour
        } else {
            HOURS_PER_DAY - self.light_on_hour + self.light_off_hour
        }
    }

    pub fn climate(&self, t: Time) -> Climate {
        if self.is_day(t) {
            Climate {
                is_day: true,
                par: self.par_day,
                temperature: self.temperature_day,
                co2: self.co2_day,
                humidity: self.humidity_day,
            }
        } else {
            Climate {
                is_day: false,
                par: 0.0,
                temperature: self.temperature_night,
                co2: self.co2_night,
                humidity: self.humidity_night,
            }
        }
    }
}

/// Everything time-dependent the derivative function needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub climate: Climate,
    pub uva: UvaExposure,
    /// PAR plus weighted UV-A, the irradiance seen by photosynthesis (W/m²)
    pub effective_irradiance: FloatValue,
}

impl Conditions {
    /// UV-A delivered while the chamber lights are off.
    pub fn is_night_uva(&self) -> bool {
        self.uva.irradiance > 0.0 && !self.climate.is_day
    }
}

/// Resolves chamber conditions and UV-A state for a treatment.
#[derive(Debug, Clone)]
pub struct EnvironmentModel {
    environment: Environment,
    treatment: Treatment,
}

impl EnvironmentModel {
    pub fn new(environment: Environment, treatment: Treatment) -> Self {
        Self {
            environment,
            treatment,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn treatment(&self) -> &Treatment {
        &self.treatment
    }

    pub fn conditions(&self, t: Time) -> Conditions {
        let climate = self.environment.climate(t);
        let uva = self.treatment.exposure(t);
        Conditions {
            climate,
            uva,
            effective_irradiance: climate.par + uva.irradiance * self.treatment.par_conversion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luva_core::units::{SECONDS_PER_DAY, SECONDS_PER_HOUR};

    fn at(day: FloatValue, hour: FloatValue) -> Time {
        day * SECONDS_PER_DAY + hour * SECONDS_PER_HOUR
    }

    #[test]
    fn test_hour_in_window() {
        assert!(hour_in_window(6.0, 6.0, 22.0));
        assert!(!hour_in_window(22.0, 6.0, 22.0));
        assert!(hour_in_window(23.0, 22.0, 4.0));
        assert!(hour_in_window(0.0, 22.0, 4.0));
        assert!(!hour_in_window(4.0, 22.0, 4.0));
        assert!(!hour_in_window(12.0, 22.0, 4.0));
        assert!(!hour_in_window(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_day_and_night_branches() {
        let env = Environment::default();
        assert_eq!(env.photoperiod_hours(), 16.0);

        let day = env.climate(at(20.0, 12.0));
        assert!(day.is_day);
        assert_eq!(day.par, 57.0);
        assert_eq!(day.temperature, 25.0);
        assert_eq!(day.humidity, 0.70);

        let night = env.climate(at(20.0, 23.0));
        assert!(!night.is_day);
        assert_eq!(night.par, 0.0);
        assert_eq!(night.temperature, 18.0);
        assert_eq!(night.humidity, 0.85);
    }

    #[test]
    fn test_wrapping_photoperiod() {
        let env = Environment {
            light_on_hour: 20.0,
            light_off_hour: 12.0,
            ..Environment::default()
        };
        assert_eq!(env.photoperiod_hours(), 16.0);
        assert!(env.is_day(at(3.0, 2.0)));
        assert!(!env.is_day(at(3.0, 15.0)));
    }

    #[test]
    fn test_uva_adds_to_effective_irradiance() {
        let treatment = Treatment::new("L6D6", 11.0, 29, 35, 10.0, 16.0).with_par_conversion(0.5);
        let model = EnvironmentModel::new(Environment::default(), treatment);

        let before = model.conditions(at(29.0, 9.0));
        assert_eq!(before.effective_irradiance, 57.0);
        let during = model.conditions(at(29.0, 11.0));
        assert_eq!(during.effective_irradiance, 57.0 + 5.5);
        assert!(!during.is_night_uva());
    }

    #[test]
    fn test_night_uva_detection() {
        let treatment = Treatment::new("L6D6-N", 11.0, 29, 35, 22.0, 4.0);
        let model = EnvironmentModel::new(Environment::default(), treatment);

        let conditions = model.conditions(at(29.0, 23.0));
        assert!(conditions.is_night_uva());
        assert_eq!(conditions.effective_irradiance, 11.0);
    }
}
