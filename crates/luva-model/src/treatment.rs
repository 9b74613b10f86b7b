//! UV-A treatment schedules
//!
//! UV-A is on at time `t` when the day since sowing satisfies
//! `start_day <= day < end_day` and the hour of day lies inside the daily
//! window. The window runs from `hour_on` to `hour_off`, or, when
//! `hour_off < hour_on`, from `hour_on` to midnight and from midnight to
//! `hour_off`. Day and hour are checked independently, so a wrapping
//! treatment lights the early morning of `start_day` and nothing after
//! midnight of `end_day`, and every treatment day carries exactly one
//! session's worth of UV-A.
//!
//! Elapsed session time counts from the most recent `hour_on`, which for the
//! morning part of a wrapping window is the previous evening.

use luva_core::errors::{LuvaError, LuvaResult};
use luva_core::units::{
    radiant_exposure_kj, HOURS_PER_DAY, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};
use luva_core::{FloatValue, Time};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Shape of the irradiance delivered within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UvaMode {
    /// Constant irradiance for the whole session
    #[default]
    Constant,
    /// Half sine wave peaking mid-session at the treatment intensity
    Sinusoidal,
    /// Square wave starting with an on phase
    Intermittent {
        on_minutes: FloatValue,
        off_minutes: FloatValue,
    },
}

/// A named UV-A exposure regimen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Treatment {
    pub name: String,

    /// UV-A irradiance (peak irradiance for sinusoidal delivery)
    /// unit: W/m²
    pub intensity: FloatValue,

    /// First day (since sowing) on which a session opens
    #[serde(default)]
    pub start_day: u32,

    /// Day on which sessions stop opening
    #[serde(default)]
    pub end_day: u32,

    /// Hour of day at which each session opens
    #[serde(default)]
    pub hour_on: FloatValue,

    /// Hour of day at which each session closes
    #[serde(default)]
    pub hour_off: FloatValue,

    /// Weight of UV-A irradiance when added to photosynthetically active
    /// radiation
    #[serde(default = "default_par_conversion")]
    pub par_conversion: FloatValue,

    #[serde(default)]
    pub mode: UvaMode,
}

fn default_par_conversion() -> FloatValue {
    1.0
}

/// State of supplemental UV-A at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UvaExposure {
    /// Instantaneous UV-A irradiance (W/m²)
    pub irradiance: FloatValue,
    /// Hours since the current session opened, 0 outside a session
    pub hours_elapsed: FloatValue,
    /// UV-A dose delivered so far in the current session (kJ/m²)
    pub energy: FloatValue,
    /// Whether a session is open, regardless of the delivered irradiance
    pub in_session: bool,
}

impl Treatment {
    /// Constant irradiance treatment.
    pub fn new(
        name: impl Into<String>,
        intensity: FloatValue,
        start_day: u32,
        end_day: u32,
        hour_on: FloatValue,
        hour_off: FloatValue,
    ) -> Self {
        Self {
            name: name.into(),
            intensity,
            start_day,
            end_day,
            hour_on,
            hour_off,
            par_conversion: default_par_conversion(),
            mode: UvaMode::Constant,
        }
    }

    /// Treatment that never applies UV-A.
    pub fn control(name: impl Into<String>) -> Self {
        Self::new(name, 0.0, 0, 0, 0.0, 0.0)
    }

    pub fn with_mode(mut self, mode: UvaMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_par_conversion(mut self, factor: FloatValue) -> Self {
        self.par_conversion = factor;
        self
    }

    pub fn with_intensity(mut self, intensity: FloatValue) -> Self {
        self.intensity = intensity;
        self
    }

    /// Whether this treatment never delivers UV-A.
    pub fn is_control(&self) -> bool {
        self.intensity <= 0.0 || self.window_issue().is_some()
    }

    /// Length of each session in hours.
    pub fn session_hours(&self) -> FloatValue {
        if self.hour_off >= self.hour_on {
            self.hour_off - self.hour_on
        } else {
            HOURS_PER_DAY - self.hour_on + self.hour_off
        }
    }

    /// Whether sessions run past midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.hour_off < self.hour_on
    }

    /// Number of sessions opened over the whole treatment.
    pub fn session_count(&self) -> u32 {
        self.end_day.saturating_sub(self.start_day)
    }

    /// Reason the day/hour window can never open, if any.
    pub fn window_issue(&self) -> Option<String> {
        if self.start_day >= self.end_day {
            return Some(format!(
                "start_day ({}) must be before end_day ({})",
                self.start_day, self.end_day
            ));
        }
        if self.hour_on == self.hour_off {
            return Some(format!(
                "hour_on and hour_off are both {}, giving an empty session",
                self.hour_on
            ));
        }
        None
    }

    fn invalid(&self, reason: String) -> LuvaError {
        LuvaError::InvalidTreatment {
            name: self.name.clone(),
            reason,
        }
    }

    /// Validate the treatment.
    ///
    /// Controls (zero intensity) only need well-formed values. Any treatment
    /// with positive intensity must also have a window that can open.
    pub fn validate(&self) -> LuvaResult<()> {
        self.validate_values()?;
        if self.intensity > 0.0 {
            if let Some(reason) = self.window_issue() {
                return Err(self.invalid(reason));
            }
        }
        Ok(())
    }

    /// Validate intensities, hours and delivery mode, ignoring whether the
    /// day/hour window can open.
    pub fn validate_values(&self) -> LuvaResult<()> {
        let invalid = |reason: String| self.invalid(reason);

        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(invalid(format!(
                "intensity must be finite and non-negative, got {}",
                self.intensity
            )));
        }
        if !self.par_conversion.is_finite() || self.par_conversion < 0.0 {
            return Err(invalid(format!(
                "par_conversion must be finite and non-negative, got {}",
                self.par_conversion
            )));
        }
        for (label, hour) in [("hour_on", self.hour_on), ("hour_off", self.hour_off)] {
            if !(0.0..HOURS_PER_DAY).contains(&hour) {
                return Err(invalid(format!("{} must be in [0, 24), got {}", label, hour)));
            }
        }
        if let UvaMode::Intermittent {
            on_minutes,
            off_minutes,
        } = self.mode
        {
            if !(on_minutes > 0.0) || off_minutes < 0.0 {
                return Err(invalid(format!(
                    "intermittent phases must be on > 0 and off >= 0 minutes, got {} / {}",
                    on_minutes, off_minutes
                )));
            }
        }
        Ok(())
    }

    /// Start time (s) of the session covering `t`, if UV-A is on.
    pub fn session_start(&self, t: Time) -> Option<Time> {
        if self.is_control() {
            return None;
        }
        let day = (t / SECONDS_PER_DAY).floor();
        if day < self.start_day as FloatValue || day >= self.end_day as FloatValue {
            return None;
        }
        let hour = (t - day * SECONDS_PER_DAY) / SECONDS_PER_HOUR;
        let elapsed = if hour >= self.hour_on && (self.wraps_midnight() || hour < self.hour_off) {
            hour - self.hour_on
        } else if self.wraps_midnight() && hour < self.hour_off {
            HOURS_PER_DAY - self.hour_on + hour
        } else {
            return None;
        };
        Some(t - elapsed * SECONDS_PER_HOUR)
    }

    /// Resolve the UV-A irradiance and within-session exposure at `t`.
    pub fn exposure(&self, t: Time) -> UvaExposure {
        let Some(start) = self.session_start(t) else {
            return UvaExposure::default();
        };
        let hours = (t - start) / SECONDS_PER_HOUR;
        let duration = self.session_hours();

        let (irradiance, energy) = match self.mode {
            UvaMode::Constant => (self.intensity, radiant_exposure_kj(self.intensity, hours)),
            UvaMode::Sinusoidal => {
                let phase = PI * hours / duration;
                let irradiance = self.intensity * phase.sin();
                // Integral of I sin(pi h / D) dh from 0 to hours
                let equivalent_hours = duration / PI * (1.0 - phase.cos());
                (
                    irradiance.max(0.0),
                    radiant_exposure_kj(self.intensity, equivalent_hours),
                )
            }
            UvaMode::Intermittent {
                on_minutes,
                off_minutes,
            } => {
                let minutes = hours * 60.0;
                let period = on_minutes + off_minutes;
                let cycles = (minutes / period).floor();
                let phase = minutes - cycles * period;
                let on = phase < on_minutes;
                let lit_minutes = cycles * on_minutes + phase.min(on_minutes);
                (
                    if on { self.intensity } else { 0.0 },
                    radiant_exposure_kj(self.intensity, lit_minutes * SECONDS_PER_MINUTE / SECONDS_PER_HOUR),
                )
            }
        };

        UvaExposure {
            irradiance,
            hours_elapsed: hours,
            energy,
            in_session: true,
        }
    }

    /// Total UV-A dose over the whole treatment (kJ/m²).
    ///
    /// The evening and morning parts of a wrapping window add up to one full
    /// session, so every treatment day contributes the same dose.
    pub fn total_dose(&self) -> FloatValue {
        if self.is_control() {
            return 0.0;
        }
        let duration = self.session_hours();
        let per_session = match self.mode {
            UvaMode::Constant => radiant_exposure_kj(self.intensity, duration),
            UvaMode::Sinusoidal => radiant_exposure_kj(self.intensity, 2.0 * duration / PI),
            UvaMode::Intermittent {
                on_minutes,
                off_minutes,
            } => {
                let minutes = duration * 60.0;
                let period = on_minutes + off_minutes;
                let cycles = (minutes / period).floor();
                let lit = cycles * on_minutes + (minutes - cycles * period).min(on_minutes);
                radiant_exposure_kj(self.intensity, lit / 60.0)
            }
        };
        per_session * self.session_count() as FloatValue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(day: FloatValue, hour: FloatValue) -> Time {
        day * SECONDS_PER_DAY + hour * SECONDS_PER_HOUR
    }

    #[test]
    fn test_daytime_window() {
        let treatment = Treatment::new("L6D6", 11.0, 29, 35, 10.0, 16.0);
        assert_eq!(treatment.session_hours(), 6.0);
        assert!(!treatment.wraps_midnight());

        assert_eq!(treatment.exposure(at(29.0, 9.99)).irradiance, 0.0);
        let exposure = treatment.exposure(at(29.0, 10.0));
        assert_eq!(exposure.irradiance, 11.0);
        assert_eq!(exposure.hours_elapsed, 0.0);
        assert!(exposure.in_session);

        let exposure = treatment.exposure(at(30.0, 13.0));
        assert_relative_eq!(exposure.hours_elapsed, 3.0, epsilon = 1e-9);
        assert_relative_eq!(exposure.energy, 11.0 * 3.0 * 3.6, epsilon = 1e-9);

        // Session end is exclusive
        assert_eq!(treatment.exposure(at(30.0, 16.0)).irradiance, 0.0);
        // Before the first and on the end day
        assert_eq!(treatment.exposure(at(28.0, 12.0)).irradiance, 0.0);
        assert_eq!(treatment.exposure(at(35.0, 12.0)).irradiance, 0.0);
        assert_eq!(treatment.exposure(at(34.0, 12.0)).irradiance, 11.0);
    }

    #[test]
    fn test_window_wrapping_midnight() {
        let treatment = Treatment::new("L6D6-N", 11.0, 29, 35, 22.0, 4.0);
        assert!(treatment.wraps_midnight());
        assert_eq!(treatment.session_hours(), 6.0);

        // The morning part of the first treatment day is lit
        let first = treatment.exposure(at(29.0, 2.0));
        assert_eq!(first.irradiance, 11.0);
        assert_relative_eq!(first.hours_elapsed, 4.0, epsilon = 1e-9);
        assert_eq!(treatment.exposure(at(28.0, 23.0)).irradiance, 0.0);

        let evening = treatment.exposure(at(29.0, 23.0));
        assert_eq!(evening.irradiance, 11.0);
        assert_relative_eq!(evening.hours_elapsed, 1.0, epsilon = 1e-9);

        // After midnight the elapsed time continues from the evening
        let morning = treatment.exposure(at(30.0, 3.0));
        assert_eq!(morning.irradiance, 11.0);
        assert_relative_eq!(morning.hours_elapsed, 5.0, epsilon = 1e-9);
        assert_relative_eq!(morning.energy, 11.0 * 5.0 * 3.6, epsilon = 1e-9);

        assert_eq!(treatment.exposure(at(30.0, 4.0)).irradiance, 0.0);
        assert_eq!(treatment.exposure(at(30.0, 12.0)).irradiance, 0.0);

        // The last treatment day ends at midnight
        assert_eq!(treatment.exposure(at(34.0, 23.5)).irradiance, 11.0);
        assert_eq!(treatment.exposure(at(35.0, 1.0)).irradiance, 0.0);
    }

    fn delivered_dose(treatment: &Treatment, from_day: FloatValue, to_day: FloatValue) -> FloatValue {
        let step = 60.0;
        let steps = ((to_day - from_day) * SECONDS_PER_DAY / step).round() as usize;
        (0..steps)
            .map(|i| treatment.exposure(from_day * SECONDS_PER_DAY + i as FloatValue * step).irradiance * step)
            .sum::<FloatValue>()
            / 1000.0
    }

    #[test]
    fn test_delivered_dose_matches_total_dose() {
        let day = Treatment::new("day", 11.0, 29, 35, 10.0, 16.0);
        let night = Treatment::new("night", 11.0, 29, 35, 22.0, 4.0);
        let sinusoidal =
            Treatment::new("SIN", 22.0, 23, 35, 20.0, 8.0).with_mode(UvaMode::Sinusoidal);
        let intermittent = Treatment::new("INT", 22.0, 23, 35, 20.0, 8.0).with_mode(UvaMode::Intermittent {
            on_minutes: 30.0,
            off_minutes: 30.0,
        });
        for treatment in [day, night, sinusoidal, intermittent] {
            let delivered = delivered_dose(&treatment, 14.0, 35.0);
            assert_relative_eq!(delivered, treatment.total_dose(), max_relative = 1e-3);
        }
    }

    #[test]
    fn test_wrapping_and_plain_windows_deliver_same_dose() {
        let day = Treatment::new("day", 11.0, 29, 35, 10.0, 16.0);
        let night = Treatment::new("night", 11.0, 29, 35, 22.0, 4.0);
        assert_relative_eq!(day.total_dose(), night.total_dose());
        assert_relative_eq!(day.total_dose(), 6.0 * 6.0 * 11.0 * 3.6, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_windows_yield_no_uva() {
        let empty_hours = Treatment::new("bad", 11.0, 29, 35, 10.0, 10.0);
        assert!(empty_hours.window_issue().is_some());
        assert!(empty_hours.is_control());
        assert!(empty_hours.validate().is_err());
        assert_eq!(empty_hours.exposure(at(30.0, 10.0)).irradiance, 0.0);

        let inverted_days = Treatment::new("bad", 11.0, 35, 29, 10.0, 16.0);
        assert!(inverted_days.validate().is_err());
        assert_eq!(inverted_days.exposure(at(30.0, 12.0)).irradiance, 0.0);
    }

    #[test]
    fn test_control_is_valid() {
        let control = Treatment::control("CK");
        assert!(control.validate().is_ok());
        assert!(control.is_control());
        assert_eq!(control.total_dose(), 0.0);
        assert_eq!(control.exposure(at(30.0, 12.0)), UvaExposure::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_hour = Treatment::new("bad", 11.0, 29, 35, 10.0, 24.0);
        assert!(bad_hour.validate().is_err());
        let negative = Treatment::new("bad", -1.0, 29, 35, 10.0, 16.0);
        assert!(negative.validate().is_err());
        let bad_mode = Treatment::new("bad", 11.0, 29, 35, 10.0, 16.0).with_mode(UvaMode::Intermittent {
            on_minutes: 0.0,
            off_minutes: 30.0,
        });
        assert!(bad_mode.validate().is_err());
    }

    #[test]
    fn test_sinusoidal_delivery() {
        let treatment =
            Treatment::new("SIN", 22.0, 23, 35, 6.0, 18.0).with_mode(UvaMode::Sinusoidal);
        assert_relative_eq!(treatment.exposure(at(23.0, 12.0)).irradiance, 22.0, epsilon = 1e-9);
        assert_relative_eq!(treatment.exposure(at(23.0, 6.0)).irradiance, 0.0, epsilon = 1e-9);

        // Half the dose is delivered by mid-session
        let full = treatment.total_dose() / treatment.session_count() as FloatValue;
        let half = treatment.exposure(at(23.0, 12.0)).energy;
        assert_relative_eq!(half, full / 2.0, max_relative = 1e-9);
    }

    #[test]
    fn test_intermittent_delivery() {
        let treatment = Treatment::new("INT", 22.0, 23, 35, 6.0, 18.0).with_mode(UvaMode::Intermittent {
            on_minutes: 30.0,
            off_minutes: 30.0,
        });
        assert_eq!(treatment.exposure(at(23.0, 6.25)).irradiance, 22.0);
        let off = treatment.exposure(at(23.0, 6.75));
        assert_eq!(off.irradiance, 0.0);
        assert!(off.in_session);
        assert_relative_eq!(off.energy, 22.0 * 0.5 * 3.6, epsilon = 1e-9);

        // Half of the 12 h session is lit
        assert_relative_eq!(
            treatment.total_dose(),
            radiant_exposure_kj(22.0, 6.0) * 12.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_treatment_from_toml() {
        let treatment: Treatment = toml::from_str(
            r#"
            name = "INT"
            intensity = 22.0
            start_day = 23
            end_day = 35
            hour_on = 6.0
            hour_off = 18.0
            mode = { kind = "intermittent", on_minutes = 30.0, off_minutes = 30.0 }
            "#,
        )
        .unwrap();
        assert_eq!(
            treatment.mode,
            UvaMode::Intermittent {
                on_minutes: 30.0,
                off_minutes: 30.0
            }
        );
        assert_eq!(treatment.par_conversion, 1.0);
    }
}
