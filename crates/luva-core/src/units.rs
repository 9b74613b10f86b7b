//! Unit conversion constants.
//!
//! The model integrates in SI base units: seconds, kilograms per square metre
//! of ground and watts per square metre. Reported quantities are per plant in
//! grams and parts per million, so the conversions live here rather than being
//! scattered through the equations.

use crate::FloatValue;

pub const SECONDS_PER_MINUTE: FloatValue = 60.0;
pub const SECONDS_PER_HOUR: FloatValue = 3600.0;
pub const SECONDS_PER_DAY: FloatValue = 86_400.0;
pub const HOURS_PER_DAY: FloatValue = 24.0;

/// Grams per kilogram
pub const GRAMS_PER_KG: FloatValue = 1000.0;

/// Parts per million
pub const PPM: FloatValue = 1.0e6;

/// Joules per kilojoule
pub const J_PER_KJ: FloatValue = 1000.0;

/// Radiant exposure in kJ/m² delivered by `irradiance` W/m² over `hours`.
pub fn radiant_exposure_kj(irradiance: FloatValue, hours: FloatValue) -> FloatValue {
    irradiance * hours * SECONDS_PER_HOUR / J_PER_KJ
}

/// Hour of day in `[0, 24)` for a time in seconds.
pub fn hour_of_day(t: FloatValue) -> FloatValue {
    (t / SECONDS_PER_HOUR).rem_euclid(HOURS_PER_DAY)
}

/// Fractional day number for a time in seconds.
pub fn day_number(t: FloatValue) -> FloatValue {
    t / SECONDS_PER_DAY
}
