//! Reference treatments and observed targets
//!
//! Twelve treatments from the chamber experiment, split into a training and a
//! validation set, plus two dynamic-mode treatments without observations.
//! All UV-A is delivered at 11 W/m² unless noted.

use crate::treatment::{Treatment, UvaMode};
use luva_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Measured end-of-experiment values for one treatment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTarget {
    /// g/plant
    pub fresh_weight: FloatValue,
    /// ppm of fresh weight
    pub anthocyanin_ppm: FloatValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSplit {
    Training,
    Validation,
}

/// A treatment together with its observed outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTreatment {
    pub treatment: Treatment,
    pub target: ReferenceTarget,
    pub split: DatasetSplit,
}

/// UV-A intensity of the reference treatments (W/m²)
pub const REFERENCE_INTENSITY: FloatValue = 11.0;

/// Peak intensity of the dynamic-mode treatments (W/m²)
pub const DYNAMIC_INTENSITY: FloatValue = 22.0;

// name, start_day, end_day, hour_on, hour_off, fresh weight, ppm, split
const REFERENCE_TABLE: [(&str, u32, u32, FloatValue, FloatValue, FloatValue, FloatValue, DatasetSplit); 12] = [
    ("CK", 0, 0, 0.0, 0.0, 87.0, 433.0, DatasetSplit::Training),
    ("L6D6", 29, 35, 10.0, 16.0, 91.4, 494.0, DatasetSplit::Training),
    ("L6D6-N", 29, 35, 22.0, 4.0, 80.8, 493.0, DatasetSplit::Training),
    ("H12D3", 32, 35, 6.0, 18.0, 60.6, 651.0, DatasetSplit::Training),
    ("VL3D12", 23, 35, 10.0, 13.0, 67.0, 482.0, DatasetSplit::Training),
    ("L6D12", 23, 35, 10.0, 16.0, 60.4, 518.0, DatasetSplit::Training),
    ("CK_val", 0, 0, 0.0, 0.0, 85.2, 413.0, DatasetSplit::Validation),
    ("VL3D3", 32, 35, 10.0, 13.0, 89.0, 437.0, DatasetSplit::Validation),
    ("L6D3", 32, 35, 10.0, 16.0, 92.2, 468.0, DatasetSplit::Validation),
    ("M9D3", 32, 35, 7.0, 16.0, 83.8, 539.0, DatasetSplit::Validation),
    ("H12D3_val", 32, 35, 6.0, 18.0, 62.2, 657.0, DatasetSplit::Validation),
    ("VH15D3", 32, 35, 5.0, 20.0, 51.3, 578.0, DatasetSplit::Validation),
];

/// All twelve reference treatments in table order.
pub fn reference_treatments() -> Vec<ReferenceTreatment> {
    REFERENCE_TABLE
        .iter()
        .map(|&(name, start, end, on, off, fresh_weight, anthocyanin_ppm, split)| {
            let treatment = if name.starts_with("CK") {
                Treatment::control(name)
            } else {
                Treatment::new(name, REFERENCE_INTENSITY, start, end, on, off)
            };
            ReferenceTreatment {
                treatment,
                target: ReferenceTarget {
                    fresh_weight,
                    anthocyanin_ppm,
                },
                split,
            }
        })
        .collect()
}

pub fn split(split: DatasetSplit) -> Vec<ReferenceTreatment> {
    reference_treatments()
        .into_iter()
        .filter(|r| r.split == split)
        .collect()
}

pub fn training_set() -> Vec<ReferenceTreatment> {
    split(DatasetSplit::Training)
}

pub fn validation_set() -> Vec<ReferenceTreatment> {
    split(DatasetSplit::Validation)
}

pub fn find(name: &str) -> Option<ReferenceTreatment> {
    reference_treatments().into_iter().find(|r| r.treatment.name == name)
}

/// Half-sine daily profile peaking at 22 W/m², days 23 to 35, 06 to 18 h.
pub fn sinusoidal_treatment() -> Treatment {
    Treatment::new("SIN", DYNAMIC_INTENSITY, 23, 35, 6.0, 18.0).with_mode(UvaMode::Sinusoidal)
}

/// 30 minutes on, 30 minutes off at 22 W/m², days 23 to 35, 06 to 18 h.
pub fn intermittent_treatment() -> Treatment {
    Treatment::new("INT", DYNAMIC_INTENSITY, 23, 35, 6.0, 18.0).with_mode(UvaMode::Intermittent {
        on_minutes: 30.0,
        off_minutes: 30.0,
    })
}

pub fn dynamic_treatments() -> Vec<Treatment> {
    vec![sinusoidal_treatment(), intermittent_treatment()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimulationWindow;
    use is_close::is_close;

    #[test]
    fn test_split_sizes() {
        assert_eq!(reference_treatments().len(), 12);
        assert_eq!(training_set().len(), 6);
        assert_eq!(validation_set().len(), 6);
    }

    #[test]
    fn test_all_reference_treatments_are_valid() {
        for r in reference_treatments() {
            r.treatment.validate().unwrap();
        }
        for t in dynamic_treatments() {
            t.validate().unwrap();
        }
    }

    #[test]
    fn test_controls() {
        let controls: Vec<_> = reference_treatments()
            .into_iter()
            .filter(|r| r.treatment.is_control())
            .map(|r| r.treatment.name)
            .collect();
        assert_eq!(controls, vec!["CK", "CK_val"]);
    }

    #[test]
    fn test_night_treatment_wraps() {
        let night = find("L6D6-N").unwrap().treatment;
        assert!(night.wraps_midnight());
        assert_eq!(night.session_hours(), 6.0);
        let day = find("L6D6").unwrap().treatment;
        assert!(is_close!(night.total_dose(), day.total_dose()));

        // Both deliver six 6 h sessions inside the default simulation window
        let window = SimulationWindow::default();
        let lit_hours = |treatment: &Treatment| {
            let step = 60.0;
            let steps = ((window.t_end() - window.t_start()) / step).round() as usize;
            (0..steps)
                .filter(|&i| treatment.exposure(window.t_start() + i as FloatValue * step).irradiance > 0.0)
                .count() as FloatValue
                * step
                / 3600.0
        };
        assert!(is_close!(lit_hours(&night), 36.0));
        assert!(is_close!(lit_hours(&day), 36.0));
    }

    #[test]
    fn test_session_lengths() {
        for (name, hours) in [("VL3D3", 3.0), ("L6D3", 6.0), ("M9D3", 9.0), ("H12D3_val", 12.0), ("VH15D3", 15.0)] {
            assert_eq!(find(name).unwrap().treatment.session_hours(), hours, "{}", name);
        }
    }

    #[test]
    fn test_targets() {
        let h12 = find("H12D3").unwrap();
        assert_eq!(h12.target.fresh_weight, 60.6);
        assert_eq!(h12.target.anthocyanin_ppm, 651.0);
        assert_eq!(h12.split, DatasetSplit::Training);
        assert!(find("missing").is_none());
    }

    #[test]
    fn test_reference_serialises_to_json() {
        let reference = find("L6D6-N").unwrap();
        let json = serde_json::to_string(&reference).unwrap();
        assert!(json.contains(r#""split":"training""#));
        let parsed: ReferenceTreatment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reference);
    }
}
